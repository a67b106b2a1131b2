//! 规则引擎命令行入口

use anyhow::Result;
use clap::Parser;
use rule_engine::cli::{Cli, CommandRunner};
use rules_shared::config::AppConfig;
use rules_shared::observability;
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load("rule-engine").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig {
            service_name: "rule-engine".to_string(),
            ..AppConfig::default()
        }
    });

    // 命令行参数优先于配置文件
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }
    observability::init(&config.service_name, &config.observability)?;

    debug!(command = ?cli.command, "Running command");
    let runner = CommandRunner::new(config.engine.clone());
    let output = runner.run(&cli.command)?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
