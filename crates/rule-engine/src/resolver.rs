//! 字段解析器
//!
//! 按点号分隔的路径读取或写入记录字段，如 `"$.user.profile.age"`。
//! 读取时支持回退记录：主记录上不存在的路径会在回退记录上再查一次。

use crate::error::{Result, RuleError};
use rules_shared::config::DEFAULT_PATH_MARKER;
use serde_json::{Map, Value};

/// 写入数组时允许越过末尾的最大位置数
pub const MAX_INDEX_GAP: usize = 1024;

/// 字段解析器
#[derive(Debug, Clone)]
pub struct FieldResolver {
    marker: String,
}

impl FieldResolver {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// 判断字段是否为路径引用（以前缀开头的字符串）
    pub fn is_path_ref(&self, field: &Value) -> bool {
        field
            .as_str()
            .is_some_and(|s| s.starts_with(self.marker.as_str()))
    }

    /// 解析路径引用；路径在主记录和回退记录上都不存在时返回 `FieldNotFound`
    pub fn resolve<'a>(
        &self,
        path_ref: &str,
        record: &'a Value,
        fallback: Option<&'a Value>,
    ) -> Result<&'a Value> {
        self.probe(path_ref, record, fallback)?
            .ok_or_else(|| RuleError::FieldNotFound(path_ref.to_string()))
    }

    /// 探测路径引用，不存在时返回 `None` 而不是报错
    ///
    /// 存在但为 `null`、`""`、`0`、`false` 的字段都视为存在。
    pub fn probe<'a>(
        &self,
        path_ref: &str,
        record: &'a Value,
        fallback: Option<&'a Value>,
    ) -> Result<Option<&'a Value>> {
        let segments = self.segments(path_ref)?;

        Ok(walk(record, &segments).or_else(|| fallback.and_then(|fb| walk(fb, &segments))))
    }

    /// 在路径上写入值并返回更新后的记录
    ///
    /// 中间层不存在时自动创建对象；数字路径段在数组上按下标写入，
    /// 最多越过数组末尾 `MAX_INDEX_GAP` 个位置，空位补 `null`。
    /// 记录按值传入，调用方负责在写入前克隆。
    pub fn write(&self, path_ref: &str, value: Value, mut record: Value) -> Result<Value> {
        let segments = self.segments(path_ref)?;
        set_path(&mut record, &segments, value, path_ref)?;
        Ok(record)
    }

    /// 字段引用求值：路径引用交给 `resolve`，字面量原样返回
    pub fn value_or_literal<'a>(
        &self,
        field: &'a Value,
        record: &'a Value,
        fallback: Option<&'a Value>,
    ) -> Result<&'a Value> {
        match field.as_str() {
            Some(path_ref) if self.is_path_ref(field) => self.resolve(path_ref, record, fallback),
            _ => Ok(field),
        }
    }

    /// 去掉前缀并拆分路径段
    fn segments<'p>(&self, path_ref: &'p str) -> Result<Vec<&'p str>> {
        let invalid = || RuleError::InvalidPathSyntax {
            path: path_ref.to_string(),
            marker: self.marker.clone(),
        };

        let path = path_ref
            .strip_prefix(self.marker.as_str())
            .ok_or_else(invalid)?;

        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid());
        }

        Ok(segments)
    }
}

impl Default for FieldResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PATH_MARKER)
    }
}

fn walk<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut current = root;

    for segment in segments {
        match current {
            Value::Object(map) => {
                current = map.get(*segment)?;
            }
            Value::Array(arr) => {
                // 支持数组索引访问，如 "items.0.name"
                let index: usize = segment.parse().ok()?;
                current = arr.get(index)?;
            }
            _ => return None,
        }
    }

    Some(current)
}

fn set_path(node: &mut Value, segments: &[&str], value: Value, path_ref: &str) -> Result<()> {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return Ok(());
    };

    if let Value::Array(items) = node {
        // 数组只接受下标写入，避免整个数组被对象替换
        if !head.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RuleError::PathConflict {
                path: path_ref.to_string(),
                segment: head.to_string(),
            });
        }

        let limit = items.len().saturating_add(MAX_INDEX_GAP);
        let index = head
            .parse::<usize>()
            .ok()
            .filter(|index| *index <= limit)
            .ok_or_else(|| RuleError::IndexOutOfRange {
                path: path_ref.to_string(),
                index: head.to_string(),
            })?;

        if index >= items.len() {
            items.resize(index + 1, Value::Null);
        }
        return set_path(&mut items[index], rest, value, path_ref);
    }

    // 路径中间遇到标量时替换为对象；缺失的中间层即使下一段是数字也创建对象
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }

    match node {
        Value::Object(map) => {
            let child = map.entry(head.to_string()).or_insert(Value::Null);
            set_path(child, rest, value, path_ref)
        }
        _ => Ok(()),
    }
}
