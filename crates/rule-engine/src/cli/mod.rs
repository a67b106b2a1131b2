//! CLI 模块
//!
//! 提供命令行接口，支持以下功能：
//!
//! - `apply` - 对一批记录应用规则表
//! - `match` - 列出单条记录命中的规则
//! - `explain` - 输出每条规则的评估追踪
//! - `rule` - 查看单条规则定义
//!
//! # 使用示例
//!
//! ```bash
//! rule-engine apply --rules rules.json --records tracks.json --fallback user.json
//! rule-engine match --rules rules.json --record track.json
//! rule-engine rule --rules rules.json --name trackHasEmptyTitle
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands};
pub use runner::CommandRunner;
