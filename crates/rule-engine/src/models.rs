//! 规则引擎领域模型

use crate::operators::{Action, Operator};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 待评估的记录（任意嵌套的 JSON 值）
pub type Record = Value;

/// 条件的序列化形式：`[left, operator, right]`
type ConditionTuple = (Value, String, Value);

/// 条件
///
/// `left` 与 `right` 是字段引用：字面量，或以路径前缀开头的字符串
/// （如 `"$.user.age"`）。操作符保存规则来源给出的原始名称，评估时才解析。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConditionTuple", into = "ConditionTuple")]
pub struct Condition {
    pub left: Value,
    pub operator: String,
    pub right: Value,
}

impl Condition {
    pub fn new(left: impl Into<Value>, operator: Operator, right: impl Into<Value>) -> Self {
        Self {
            left: left.into(),
            operator: operator.to_string(),
            right: right.into(),
        }
    }
}

impl From<ConditionTuple> for Condition {
    fn from((left, operator, right): ConditionTuple) -> Self {
        Self {
            left,
            operator,
            right,
        }
    }
}

impl From<Condition> for ConditionTuple {
    fn from(cond: Condition) -> Self {
        (cond.left, cond.operator, cond.right)
    }
}

/// 省略记录时附带的静默错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SilentError {
    pub message: String,
}

impl SilentError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 规则命中后执行的效果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SilentError>,
}

impl Effect {
    pub fn new(action: Action) -> Self {
        Self {
            action: action.to_string(),
            property: None,
            value: None,
            error: None,
        }
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(SilentError::new(message));
        self
    }
}

/// 规则定义：条件之间为 AND 关系
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub conditions: Vec<Condition>,
    pub effect: Effect,
}

impl Rule {
    pub fn new(conditions: Vec<Condition>, effect: Effect) -> Self {
        Self { conditions, effect }
    }
}

/// 规则表：规则名 -> 规则，遍历顺序即插入顺序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    rules: IndexMap<String, Rule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 构建时追加规则，同名规则会被覆盖但保留原位置
    pub fn with_rule(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.rules.insert(name.into(), rule);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, Rule)> for RuleTable {
    fn from_iter<I: IntoIterator<Item = (N, Rule)>>(iter: I) -> Self {
        Self {
            rules: iter
                .into_iter()
                .map(|(name, rule)| (name.into(), rule))
                .collect(),
        }
    }
}

/// 单条效果的执行结果
#[derive(Debug, Clone, PartialEq)]
pub enum EffectOutcome {
    /// 修改后的记录副本
    Updated(Record),
    /// 丢弃原记录
    Omit,
    /// 丢弃原记录并附带错误说明
    OmitWithSilentError(SilentError),
}

/// 批量应用结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub results: Vec<Record>,
    pub omitted: Vec<(Record, Option<SilentError>)>,
}

impl BatchResult {
    /// 输入记录在两个集合中的总条目数
    pub fn total(&self) -> usize {
        self.results.len() + self.omitted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_table_deserialization() {
        let json = r#"
        {
            "trackHasStrongLanguage": {
                "conditions": [
                    ["$.user.age", "lessThan", 13],
                    ["$.tags", "contains", "strong language"]
                ],
                "effect": { "action": "omit" }
            },
            "trackHasEmptyTitle": {
                "conditions": [["$.title", "equals", ""]],
                "effect": { "action": "omit" }
            }
        }
        "#;

        let table: RuleTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.names().collect::<Vec<_>>(),
            vec!["trackHasStrongLanguage", "trackHasEmptyTitle"]
        );

        let rule = table.get("trackHasStrongLanguage").unwrap();
        assert_eq!(
            rule.conditions[0],
            Condition::new("$.user.age", Operator::LessThan, 13)
        );
        assert_eq!(rule.effect, Effect::new(Action::Omit));
    }

    #[test]
    fn test_unknown_names_survive_deserialization() {
        // 规则表只做形状解析，未知操作符和动作在评估时才报错
        let json = r#"
        {
            "odd": {
                "conditions": [["$.a", "between", 1]],
                "effect": { "action": "explode" }
            }
        }
        "#;

        let table: RuleTable = serde_json::from_str(json).unwrap();
        let rule = table.get("odd").unwrap();
        assert_eq!(rule.conditions[0].operator, "between");
        assert_eq!(rule.effect.action, "explode");
    }

    #[test]
    fn test_condition_serializes_as_tuple() {
        let cond = Condition::new("$.price", Operator::GreaterThan, 120);
        assert_eq!(
            serde_json::to_value(&cond).unwrap(),
            json!(["$.price", "greaterThan", 120])
        );
    }

    #[test]
    fn test_effect_serialization_skips_empty_fields() {
        let effect = Effect::new(Action::OmitWithSilentError).with_error("blocked");
        assert_eq!(
            serde_json::to_value(&effect).unwrap(),
            json!({ "action": "omit_with_silent_error", "error": { "message": "blocked" } })
        );
    }

    #[test]
    fn test_rule_table_from_iter_keeps_order() {
        let omit = Rule::new(vec![], Effect::new(Action::Omit));
        let table: RuleTable = vec![("b", omit.clone()), ("a", omit.clone()), ("c", omit)]
            .into_iter()
            .collect();

        assert_eq!(table.names().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert!(table.contains("a"));
        assert!(!table.contains("d"));
    }

    #[test]
    fn test_batch_result_serialization() {
        let result = BatchResult {
            results: vec![json!({"id": 1})],
            omitted: vec![
                (json!({"id": 2}), None),
                (json!({"id": 3}), Some(SilentError::new("hidden"))),
            ],
        };

        assert_eq!(result.total(), 3);
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "results": [{"id": 1}],
                "omitted": [
                    [{"id": 2}, null],
                    [{"id": 3}, {"message": "hidden"}]
                ]
            })
        );
    }
}
