//! 规则引擎错误类型

use crate::operators::{Action, Operator};
use serde_json::Number;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    // ==================== 调用方输入错误 ====================
    #[error("规则未找到: {0}")]
    RuleNotFound(String),

    #[error("不支持的操作符: {0}")]
    UnsupportedOperator(String),

    #[error("无效的路径引用 '{path}': 必须以 '{marker}' 开头且路径段不能为空")]
    InvalidPathSyntax { path: String, marker: String },

    #[error("字段不存在: {0}")]
    FieldNotFound(String),

    #[error("数组下标越界 '{path}': {index} 超出可写入范围")]
    IndexOutOfRange { path: String, index: String },

    #[error("无法写入 '{path}': 路径段 '{segment}' 不是数组下标")]
    PathConflict { path: String, segment: String },

    // ==================== 规则定义错误 ====================
    #[error("类型不匹配: 操作符 {operator} 期望 {expected}, 实际 {actual}")]
    TypeMismatch {
        operator: Operator,
        expected: String,
        actual: String,
    },

    #[error("无效的操作数类型: {side} 操作数期望 {expected}, 实际 {actual}")]
    InvalidOperandType {
        side: &'static str,
        expected: &'static str,
        actual: String,
    },

    #[error("无法执行 {action}: {reason}")]
    ArithmeticTypeError { action: Action, reason: String },

    #[error("{action} 运算溢出: {current} 与 {operand}")]
    ArithmeticOverflow {
        action: Action,
        current: Number,
        operand: Number,
    },

    #[error("无法执行 {0}: effect.property 未定义或无效")]
    InvalidEffectProperty(Action),

    #[error("无法执行 {0}: effect.value 未定义")]
    MissingEffectValue(Action),

    #[error("omit_with_silent_error 需要 effect.error, 但未提供")]
    MissingEffectError,

    #[error("无法对 {actual} 执行 {action}: 目标必须是单条记录")]
    InvalidEffectTarget { action: Action, actual: String },

    #[error("{0} 不是算术动作")]
    InvalidEffectAction(Action),

    #[error("效果执行器未定义动作: {0}")]
    UnhandledAction(String),

    // ==================== 规则表加载错误 ====================
    #[error("规则解析失败: {0}")]
    ParseError(String),

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("读取规则文件失败: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RuleError>;
