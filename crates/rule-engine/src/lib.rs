//! 记录规则引擎
//!
//! 对 JSON 记录批量应用声明式规则表，支持：
//! - `$.` 路径引用解析，主记录缺失时回退到上下文记录
//! - 六种比较操作符，条件之间 AND 短路求值
//! - 修改类效果（add / replace / increment / decrement）与省略类效果
//! - 批量应用，结果分为保留与省略两组

pub mod cli;
pub mod effect;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod loader;
pub mod matcher;
pub mod models;
pub mod operators;
pub mod resolver;

pub use effect::EffectExecutor;
pub use engine::RuleEngine;
pub use error::{Result, RuleError};
pub use evaluator::ConditionEvaluator;
pub use loader::RuleTableLoader;
pub use matcher::{RuleEvaluation, RuleMatcher};
pub use models::{
    BatchResult, Condition, Effect, EffectOutcome, Record, Rule, RuleTable, SilentError,
};
pub use operators::{Action, Operator};
pub use resolver::FieldResolver;
