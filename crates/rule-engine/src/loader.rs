//! 规则表加载
//!
//! 从 JSON 文本、JSON 值或文件读取规则表。只做结构反序列化，
//! 操作符和动作名在评估时才校验。

use crate::error::{Result, RuleError};
use crate::evaluator::type_name;
use crate::models::RuleTable;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub struct RuleTableLoader;

impl RuleTableLoader {
    /// 从 JSON 字符串加载规则表
    pub fn from_json(json: &str) -> Result<RuleTable> {
        let table: RuleTable = serde_json::from_str(json)?;
        debug!(rules = table.len(), "rule table parsed");
        Ok(table)
    }

    pub fn from_value(value: Value) -> Result<RuleTable> {
        if !value.is_object() {
            return Err(RuleError::ParseError(format!(
                "规则表必须是 JSON 对象，实际为 {}",
                type_name(&value)
            )));
        }

        Ok(serde_json::from_value(value)?)
    }

    /// 从文件加载规则表
    pub fn from_path(path: impl AsRef<Path>) -> Result<RuleTable> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let table = Self::from_json(&content)?;

        info!(path = %path.display(), rules = table.len(), "Loaded rule table");
        Ok(table)
    }
}
