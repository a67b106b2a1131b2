//! CLI 命令定义

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// 规则引擎命令行工具
///
/// 输入均为 JSON 文件，结果以 JSON 输出到标准输出，日志输出到标准错误。
#[derive(Parser, Debug)]
#[command(name = "rule-engine")]
#[command(version, about = "记录规则引擎")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)，未指定时使用配置文件
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 对一批记录应用规则表，输出 results 与 omitted
    Apply {
        /// 规则表文件
        #[arg(short, long)]
        rules: PathBuf,

        /// 记录文件（JSON 数组）
        #[arg(long)]
        records: PathBuf,

        /// 回退记录文件
        #[arg(short, long)]
        fallback: Option<PathBuf>,
    },

    /// 列出单条记录命中的规则名
    Match {
        #[arg(short, long)]
        rules: PathBuf,

        /// 单条记录文件
        #[arg(long)]
        record: PathBuf,

        #[arg(short, long)]
        fallback: Option<PathBuf>,
    },

    /// 输出每条规则的评估追踪
    Explain {
        #[arg(short, long)]
        rules: PathBuf,

        #[arg(long)]
        record: PathBuf,

        #[arg(short, long)]
        fallback: Option<PathBuf>,
    },

    /// 查看单条规则定义
    Rule {
        #[arg(short, long)]
        rules: PathBuf,

        /// 规则名
        #[arg(short, long)]
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_apply() {
        let cli = Cli::parse_from([
            "rule-engine",
            "apply",
            "--rules",
            "rules.json",
            "--records",
            "tracks.json",
            "-f",
            "user.json",
        ]);

        assert!(cli.log_level.is_none());
        match cli.command {
            Commands::Apply {
                rules,
                records,
                fallback,
            } => {
                assert_eq!(rules, PathBuf::from("rules.json"));
                assert_eq!(records, PathBuf::from("tracks.json"));
                assert_eq!(fallback, Some(PathBuf::from("user.json")));
            }
            _ => panic!("预期 Apply 命令"),
        }
    }

    #[test]
    fn test_cli_parse_match_with_global_log_level() {
        let cli = Cli::parse_from([
            "rule-engine",
            "match",
            "-r",
            "rules.json",
            "--record",
            "track.json",
            "--log-level",
            "debug",
        ]);

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Commands::Match { fallback, .. } => assert!(fallback.is_none()),
            _ => panic!("预期 Match 命令"),
        }
    }

    #[test]
    fn test_cli_parse_rule() {
        let cli = Cli::parse_from(["rule-engine", "rule", "-r", "rules.json", "-n", "addTax"]);
        match cli.command {
            Commands::Rule { name, .. } => assert_eq!(name, "addTax"),
            _ => panic!("预期 Rule 命令"),
        }
    }

    #[test]
    fn test_cli_requires_rules() {
        assert!(Cli::try_parse_from(["rule-engine", "apply", "--records", "a.json"]).is_err());
    }
}
