//! 四人摸打牌局核心
//!
//! - game: 牌、牌山、玩家、牌局狀態
//! - ai: CPU 捨牌策略
//! - controller: 自動進行迴圈與玩家操作入口
//! - console: 文字介面

pub mod ai;
pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod game;
pub mod settings;
