//! 规则匹配器
//!
//! 按规则表顺序对单条记录求值，条件之间为 AND 关系并短路求值，
//! 返回全部条件成立的规则名。可选记录评估追踪，便于排查规则。

use crate::error::{Result, RuleError};
use crate::evaluator::{ConditionEvaluator, type_name};
use crate::models::{Condition, Rule, RuleTable};
use crate::operators::Operator;
use crate::resolver::FieldResolver;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// 单条规则的评估结果
#[derive(Debug, Clone, Serialize)]
pub struct RuleEvaluation {
    pub rule_name: String,
    pub matched: bool,
    pub matched_conditions: Vec<String>,
    pub evaluation_trace: Vec<String>,
}

impl RuleEvaluation {
    pub fn new(rule_name: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            matched: false,
            matched_conditions: Vec::new(),
            evaluation_trace: Vec::new(),
        }
    }
}

/// 规则匹配器
#[derive(Debug, Clone, Default)]
pub struct RuleMatcher {
    resolver: FieldResolver,
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl RuleMatcher {
    pub fn new(resolver: FieldResolver) -> Self {
        Self {
            resolver,
            trace_enabled: false,
        }
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    /// 返回命中的规则名，顺序与规则表一致
    pub fn matching_rules(
        &self,
        table: &RuleTable,
        record: &Value,
        fallback: Option<&Value>,
    ) -> Result<Vec<String>> {
        let mut matched = Vec::new();

        for (name, rule) in table.iter() {
            if self.evaluate_rule(name, rule, record, fallback)?.matched {
                debug!(rule = name, "rule matched");
                matched.push(name.to_string());
            }
        }

        Ok(matched)
    }

    /// 评估单条规则
    pub fn evaluate_rule(
        &self,
        name: &str,
        rule: &Rule,
        record: &Value,
        fallback: Option<&Value>,
    ) -> Result<RuleEvaluation> {
        let mut result = RuleEvaluation::new(name);

        // 没有条件的规则永远不匹配，避免空条件被当作恒真
        if rule.conditions.is_empty() {
            warn!(rule = name, "rule has no conditions and will never match");
            if self.trace_enabled {
                result.evaluation_trace.push(format!("{}: 无条件, 不匹配", name));
            }
            return Ok(result);
        }

        for (i, cond) in rule.conditions.iter().enumerate() {
            let path = format!("{}.conditions[{}]", name, i);

            if !self.evaluate_condition(cond, record, fallback, &mut result, &path)? {
                if self.trace_enabled {
                    result
                        .evaluation_trace
                        .push(format!("{}: AND 短路 - 条件 {} 不成立", name, i));
                }
                return Ok(result);
            }
        }

        result.matched = true;
        if self.trace_enabled {
            result.evaluation_trace.push(format!("{}: 全部条件成立", name));
        }

        Ok(result)
    }

    /// 评估单个条件
    fn evaluate_condition(
        &self,
        cond: &Condition,
        record: &Value,
        fallback: Option<&Value>,
        result: &mut RuleEvaluation,
        path: &str,
    ) -> Result<bool> {
        let left = self.resolver.value_or_literal(&cond.left, record, fallback)?;
        let right = self.resolver.value_or_literal(&cond.right, record, fallback)?;

        if !(right.is_string() || right.is_number()) {
            return Err(RuleError::InvalidOperandType {
                side: "right",
                expected: "string or number",
                actual: type_name(right).to_string(),
            });
        }

        if !(left.is_string() || left.is_number() || left.is_array()) {
            return Err(RuleError::InvalidOperandType {
                side: "left",
                expected: "string, number or array",
                actual: type_name(left).to_string(),
            });
        }

        let operator: Operator = cond.operator.parse()?;
        let matched = ConditionEvaluator::evaluate(left, operator, right)?;

        if self.trace_enabled {
            result.evaluation_trace.push(format!(
                "{}: {} ({}) {} {} ({}) => {}",
                path,
                cond.left,
                left,
                operator,
                cond.right,
                right,
                if matched { "MATCHED" } else { "NOT_MATCHED" }
            ));
        }

        if matched {
            result
                .matched_conditions
                .push(format!("{} {} {}", cond.left, operator, cond.right));
        }

        Ok(matched)
    }
}
