//! Console Module - 文字介面
//!
//! 只讀取快照並呼叫 controller 的入口，不直接修改牌局。

pub mod commands;
pub mod render;
pub mod session;

pub use commands::{DiscardArg, ParsedCommand, parse_command};
pub use session::{ConsoleSession, Flow, console_notifier};
