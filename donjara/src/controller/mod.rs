//! Controller 模組 - 回合推進
//!
//! - driver: 背景自動進行迴圈與玩家操作入口
//! - journal: 牌局事件記錄

mod driver;
mod journal;

pub use driver::{
    GameController, GameStatus, LoopTiming, SharedGame, Step, UpdateCallback, lock_game, shared,
};
pub use journal::{EventType, Journal, LogEntry};
