//! 统一可观测性模块
//!
//! 规则引擎是纯内存计算，只需要结构化日志；所有入口通过同一个函数初始化，
//! 保证日志格式和过滤规则一致。

pub mod tracing;

use crate::config::ObservabilityConfig;
use ::tracing::info;
use anyhow::Result;

/// 统一初始化可观测性
///
/// # Example
///
/// ```ignore
/// use rules_shared::config::AppConfig;
/// use rules_shared::observability;
///
/// fn main() -> anyhow::Result<()> {
///     let config = AppConfig::load("rule-engine")?;
///     observability::init(&config.service_name, &config.observability)?;
///     Ok(())
/// }
/// ```
pub fn init(service_name: &str, config: &ObservabilityConfig) -> Result<()> {
    tracing::init(config)?;

    info!(
        service = %service_name,
        log_level = %config.log_level,
        log_format = %config.log_format,
        "Observability initialized"
    );

    Ok(())
}
