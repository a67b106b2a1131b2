//! 条件操作符与效果动作定义
//!
//! 两者都是封闭集合。规则表中以字符串形式保存，在评估时通过 `FromStr`
//! 转换，未知名称分别得到 `UnsupportedOperator` / `UnhandledAction`。

use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 条件操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equals,

    // 数值比较
    GreaterThan,
    GreaterThanOrEquals,
    LessThan,
    LessThanOrEquals,

    // 数组包含
    Contains,
}

impl Operator {
    pub const ALL: [Operator; 6] = [
        Self::Equals,
        Self::GreaterThan,
        Self::GreaterThanOrEquals,
        Self::LessThan,
        Self::LessThanOrEquals,
        Self::Contains,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::GreaterThan => "greaterThan",
            Self::GreaterThanOrEquals => "greaterThanOrEquals",
            Self::LessThan => "lessThan",
            Self::LessThanOrEquals => "lessThanOrEquals",
            Self::Contains => "contains",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| RuleError::UnsupportedOperator(s.to_string()))
    }
}

/// 效果动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Add,
    Increment,
    Decrement,
    Replace,
    Omit,
    OmitWithSilentError,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Self::Add,
        Self::Increment,
        Self::Decrement,
        Self::Replace,
        Self::Omit,
        Self::OmitWithSilentError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Increment => "increment",
            Self::Decrement => "decrement",
            Self::Replace => "replace",
            Self::Omit => "omit",
            Self::OmitWithSilentError => "omit_with_silent_error",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| RuleError::UnhandledAction(s.to_string()))
    }
}
