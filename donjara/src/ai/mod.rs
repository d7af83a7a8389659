//! AI 模組 - CPU 對手
//!
//! - CpuPlayer: 座位 1-3 的 CPU 玩家
//! - Strategy: 可插拔的捨牌策略

mod player;
mod strategy;

pub use player::CpuPlayer;
pub use strategy::{Difficulty, DiscardPolicy, DiscardStrategy, find_isolated_tiles};
