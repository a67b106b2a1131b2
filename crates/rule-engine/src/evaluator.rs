//! 条件评估器
//!
//! 对已解析的 `(left, operator, right)` 三元组求值。纯函数，无副作用。

use crate::error::{Result, RuleError};
use crate::operators::Operator;
use serde_json::{Number, Value};
use std::cmp::Ordering;

/// 条件评估器
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// 评估条件
    ///
    /// # Arguments
    /// * `left` - 左操作数（已完成字段解析）
    /// * `operator` - 操作符
    /// * `right` - 右操作数（已完成字段解析）
    pub fn evaluate(left: &Value, operator: Operator, right: &Value) -> Result<bool> {
        match operator {
            Operator::Equals => Ok(Self::equals(left, right)),
            Operator::Contains => Self::contains(left, right),
            ordering => Self::compare(left, right, ordering),
        }
    }

    /// 相等比较
    ///
    /// 字符串忽略大小写；数值按数值比较（100 与 100.0 相等）；其余类型做深度结构比较。
    fn equals(left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::String(a), Value::String(b)) => a.to_lowercase() == b.to_lowercase(),
            _ => Self::same_value(left, right),
        }
    }

    /// 数值比较
    fn compare(left: &Value, right: &Value, operator: Operator) -> Result<bool> {
        let left_num = Self::as_number(left, operator)?;
        let right_num = Self::as_number(right, operator)?;

        let Some(ordering) = compare_numbers(left_num, right_num) else {
            return Ok(false);
        };

        Ok(match operator {
            Operator::GreaterThan => ordering.is_gt(),
            Operator::GreaterThanOrEquals => ordering.is_ge(),
            Operator::LessThan => ordering.is_lt(),
            Operator::LessThanOrEquals => ordering.is_le(),
            Operator::Equals | Operator::Contains => ordering.is_eq(),
        })
    }

    /// 数组包含检查（精确匹配元素，不做子串匹配）
    fn contains(left: &Value, right: &Value) -> Result<bool> {
        let items = left.as_array().ok_or_else(|| RuleError::TypeMismatch {
            operator: Operator::Contains,
            expected: "array".to_string(),
            actual: type_name(left).to_string(),
        })?;

        if right.is_boolean() {
            return Err(RuleError::TypeMismatch {
                operator: Operator::Contains,
                expected: "non-boolean element".to_string(),
                actual: type_name(right).to_string(),
            });
        }

        Ok(items.iter().any(|item| Self::same_value(item, right)))
    }

    /// 严格相等，数值按 `compare_numbers` 比较，嵌套的数组和对象逐项比较
    fn same_value(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Number(x), Value::Number(y)) => compare_numbers(x, y).is_some_and(Ordering::is_eq),
            (Value::Array(xs), Value::Array(ys)) => {
                xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| Self::same_value(x, y))
            }
            (Value::Object(xm), Value::Object(ym)) => {
                xm.len() == ym.len()
                    && xm
                        .iter()
                        .all(|(k, x)| ym.get(k).is_some_and(|y| Self::same_value(x, y)))
            }
            _ => a == b,
        }
    }

    fn as_number(value: &Value, operator: Operator) -> Result<&Number> {
        match value {
            Value::Number(n) => Ok(n),
            other => Err(RuleError::TypeMismatch {
                operator,
                expected: "number".to_string(),
                actual: type_name(other).to_string(),
            }),
        }
    }
}

/// 数值比较：两边都是整数时精确比较，任一边为浮点数时按 f64 比较
fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    match (as_integer(a), as_integer(b)) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

fn as_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// 获取值的类型名称
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
