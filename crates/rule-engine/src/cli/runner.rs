//! 命令执行器
//!
//! 读取输入文件、构建引擎并执行子命令，结果以 JSON 值返回，由调用方负责输出。

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use rules_shared::config::EngineConfig;

use super::commands::Commands;
use crate::engine::RuleEngine;
use crate::evaluator::type_name;
use crate::loader::RuleTableLoader;

/// 命令执行器
pub struct CommandRunner {
    config: EngineConfig,
}

impl CommandRunner {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// 执行子命令并返回输出
    pub fn run(&self, command: &Commands) -> Result<Value> {
        match command {
            Commands::Apply {
                rules,
                records,
                fallback,
            } => self.run_apply(rules, records, fallback.as_deref()),
            Commands::Match {
                rules,
                record,
                fallback,
            } => self.run_match(rules, record, fallback.as_deref()),
            Commands::Explain {
                rules,
                record,
                fallback,
            } => self.run_explain(rules, record, fallback.as_deref()),
            Commands::Rule { rules, name } => self.run_rule(rules, name),
        }
    }

    /// 执行 apply 命令
    pub fn run_apply(&self, rules: &Path, records: &Path, fallback: Option<&Path>) -> Result<Value> {
        let engine = self.engine(rules)?;
        let records = match read_json(records)? {
            Value::Array(items) => items,
            other => bail!("记录文件必须是 JSON 数组，实际为 {}", type_name(&other)),
        };
        let fallback = fallback.map(read_json).transpose()?;

        info!(records = records.len(), rules = engine.len(), "开始应用规则");
        let batch = engine.apply_rules(&records, fallback.as_ref())?;

        to_json(&batch)
    }

    /// 执行 match 命令
    pub fn run_match(&self, rules: &Path, record: &Path, fallback: Option<&Path>) -> Result<Value> {
        let engine = self.engine(rules)?;
        let record = read_json(record)?;
        let fallback = fallback.map(read_json).transpose()?;

        let matched = engine.check_for_matching_rules(&record, fallback.as_ref())?;
        to_json(&matched)
    }

    /// 执行 explain 命令
    pub fn run_explain(&self, rules: &Path, record: &Path, fallback: Option<&Path>) -> Result<Value> {
        let engine = self.engine(rules)?;
        let record = read_json(record)?;
        let fallback = fallback.map(read_json).transpose()?;

        let report = engine.explain(&record, fallback.as_ref())?;
        to_json(&report)
    }

    /// 执行 rule 命令
    pub fn run_rule(&self, rules: &Path, name: &str) -> Result<Value> {
        let engine = self.engine(rules)?;
        let rule = engine.get_rule(name)?;
        to_json(rule)
    }

    fn engine(&self, rules: &Path) -> Result<RuleEngine> {
        let table = RuleTableLoader::from_path(rules)
            .with_context(|| format!("加载规则表失败: {}", rules.display()))?;
        Ok(RuleEngine::with_config(table, self.config.clone()))
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("读取文件失败: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("解析 JSON 失败: {}", path.display()))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    struct Fixture {
        dir: PathBuf,
    }

    impl Fixture {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "rule-engine-cli-{}-{}",
                name,
                std::process::id()
            ));
            fs::create_dir_all(&dir).unwrap();
            Self { dir }
        }

        fn write(&self, file: &str, value: &Value) -> PathBuf {
            let path = self.dir.join(file);
            fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
            path
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            fs::remove_dir_all(&self.dir).ok();
        }
    }

    fn music_rules() -> Value {
        json!({
            "trackHasStrongLanguage": {
                "conditions": [
                    ["$.user.age", "lessThan", 13],
                    ["$.tags", "contains", "strong language"]
                ],
                "effect": {"action": "omit"}
            },
            "trackHasEmptyTitle": {
                "conditions": [["$.title", "equals", ""]],
                "effect": {"action": "omit"}
            }
        })
    }

    #[test]
    fn test_run_apply() {
        let fx = Fixture::new("apply");
        let rules = fx.write("rules.json", &music_rules());
        let records = fx.write(
            "tracks.json",
            &json!([
                {"title": "Heal the World", "tags": ["pop"]},
                {"title": "", "tags": ["country"]}
            ]),
        );
        let user = fx.write("user.json", &json!({"user": {"age": 12}}));

        let runner = CommandRunner::new(EngineConfig::default());
        let output = runner.run_apply(&rules, &records, Some(&user)).unwrap();

        assert_eq!(output["results"], json!([{"title": "Heal the World", "tags": ["pop"]}]));
        assert_eq!(output["omitted"][0][0]["tags"], json!(["country"]));
        assert_eq!(output["omitted"][0][1], Value::Null);
    }

    #[test]
    fn test_run_apply_rejects_non_array_records() {
        let fx = Fixture::new("apply-object");
        let rules = fx.write("rules.json", &music_rules());
        let records = fx.write("tracks.json", &json!({"title": ""}));

        let runner = CommandRunner::new(EngineConfig::default());
        assert!(runner.run_apply(&rules, &records, None).is_err());
    }

    #[test]
    fn test_run_match_and_rule() {
        let fx = Fixture::new("match");
        let rules = fx.write("rules.json", &music_rules());
        let record = fx.write(
            "track.json",
            &json!({"title": "", "tags": ["strong language"], "user": {"age": 9}}),
        );

        let runner = CommandRunner::new(EngineConfig::default());
        let command = Commands::Match {
            rules: rules.clone(),
            record,
            fallback: None,
        };
        assert_eq!(
            runner.run(&command).unwrap(),
            json!(["trackHasStrongLanguage", "trackHasEmptyTitle"])
        );

        let rule = runner.run_rule(&rules, "trackHasEmptyTitle").unwrap();
        assert_eq!(rule["effect"]["action"], "omit");
        assert!(runner.run_rule(&rules, "missing").is_err());
    }

    #[test]
    fn test_run_explain() {
        let fx = Fixture::new("explain");
        let rules = fx.write("rules.json", &music_rules());
        let record = fx.write("track.json", &json!({"title": "Song", "tags": []}));
        let user = fx.write("user.json", &json!({"user": {"age": 30}}));

        let runner = CommandRunner::new(EngineConfig::default());
        let report = runner.run_explain(&rules, &record, Some(&user)).unwrap();

        assert_eq!(report.as_array().unwrap().len(), 2);
        assert_eq!(report[0]["rule_name"], "trackHasStrongLanguage");
        assert_eq!(report[0]["matched"], false);
    }
}
