//! 规则引擎
//!
//! 组合字段解析、条件评估、效果执行和规则匹配，对外提供单条与批量的规则应用接口。
//! 规则表在构造后只读，引擎可以跨线程共享或按工作线程克隆。

use crate::effect::EffectExecutor;
use crate::error::{Result, RuleError};
use crate::evaluator::ConditionEvaluator;
use crate::matcher::{RuleEvaluation, RuleMatcher};
use crate::models::{BatchResult, Effect, EffectOutcome, Record, Rule, RuleTable, SilentError};
use crate::operators::Operator;
use crate::resolver::FieldResolver;
use rules_shared::config::EngineConfig;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// 规则引擎
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Arc<RuleTable>,
    config: EngineConfig,
    resolver: FieldResolver,
    matcher: RuleMatcher,
    executor: EffectExecutor,
}

impl RuleEngine {
    /// 使用默认配置创建引擎，不校验规则表结构
    pub fn new(rules: RuleTable) -> Self {
        Self::with_config(rules, EngineConfig::default())
    }

    pub fn with_config(rules: RuleTable, config: EngineConfig) -> Self {
        let resolver = FieldResolver::new(config.path_marker.clone());

        Self {
            rules: Arc::new(rules),
            matcher: RuleMatcher::new(resolver.clone()),
            executor: EffectExecutor::new(resolver.clone()),
            resolver,
            config,
        }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rule_names(&self) -> Vec<String> {
        self.rules.names().map(str::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 按名称获取规则
    pub fn get_rule(&self, name: &str) -> Result<&Rule> {
        self.rules
            .get(name)
            .ok_or_else(|| RuleError::RuleNotFound(name.to_string()))
    }

    /// 字段引用求值：路径引用从记录（或回退记录）读取，字面量原样返回
    pub fn get_field_value<'a>(
        &self,
        field: &'a Value,
        record: &'a Value,
        fallback: Option<&'a Value>,
    ) -> Result<&'a Value> {
        self.resolver.value_or_literal(field, record, fallback)
    }

    /// 评估已解析的条件
    pub fn condition_is_truthy(&self, left: &Value, operator: Operator, right: &Value) -> Result<bool> {
        ConditionEvaluator::evaluate(left, operator, right)
    }

    /// 对目标执行效果，目标本身不会被修改
    pub fn run_effect(&self, target: &Value, effect: &Effect) -> Result<EffectOutcome> {
        self.executor.run(target, effect)
    }

    /// 返回记录命中的规则名，顺序与规则表一致
    #[instrument(skip_all, fields(rules = self.rules.len()))]
    pub fn check_for_matching_rules(
        &self,
        record: &Value,
        fallback: Option<&Value>,
    ) -> Result<Vec<String>> {
        self.matcher.matching_rules(&self.rules, record, fallback)
    }

    /// 逐条规则评估并返回追踪信息
    pub fn explain(&self, record: &Value, fallback: Option<&Value>) -> Result<Vec<RuleEvaluation>> {
        let matcher = self.matcher.clone().with_trace();

        self.rules
            .iter()
            .map(|(name, rule)| matcher.evaluate_rule(name, rule, record, fallback))
            .collect()
    }

    /// 对一批记录应用规则表
    ///
    /// - 未命中任何规则的记录原样进入 `results`
    /// - 命中的规则各自作用于原记录，效果不叠加；多个修改类效果以最后一个为准
    /// - 命中任一省略类规则的记录进入 `omitted`，不会出现在 `results` 中
    ///
    /// 任一错误都会中止整个批次。
    #[instrument(skip_all, fields(records = records.len(), rules = self.rules.len()))]
    pub fn apply_rules(&self, records: &[Record], fallback: Option<&Value>) -> Result<BatchResult> {
        let mut batch = BatchResult::default();

        for (index, record) in records.iter().enumerate() {
            let matched = self.check_for_matching_rules(record, fallback)?;

            if matched.is_empty() {
                batch.results.push(record.clone());
                continue;
            }

            let mut kept: Option<Record> = None;
            let mut omissions: Vec<Option<SilentError>> = Vec::new();

            for rule_name in &matched {
                let rule = self.get_rule(rule_name)?;

                match self.run_effect(record, &rule.effect)? {
                    EffectOutcome::Updated(updated) => kept = Some(updated),
                    EffectOutcome::Omit => omissions.push(None),
                    EffectOutcome::OmitWithSilentError(error) => omissions.push(Some(error)),
                }
                debug!(index, rule = %rule_name, action = %rule.effect.action, "effect applied");
            }

            if omissions.is_empty() {
                if let Some(updated) = kept {
                    batch.results.push(updated);
                }
            } else if self.config.dedupe_omissions {
                // 优先保留第一条携带的错误说明
                let error = omissions.into_iter().flatten().next();
                batch.omitted.push((record.clone(), error));
            } else {
                batch
                    .omitted
                    .extend(omissions.into_iter().map(|error| (record.clone(), error)));
            }
        }

        info!(
            kept = batch.results.len(),
            omitted = batch.omitted.len(),
            "rules applied"
        );

        Ok(batch)
    }
}
