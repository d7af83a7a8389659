//! CPU 捨牌策略
//!
//! 提供可插拔的捨牌策略系統

use crate::game::Tile;
use rand::{Rng, RngCore};
use std::fmt;
use std::str::FromStr;

/// 捨牌策略 trait
pub trait DiscardStrategy: Send + Sync {
    /// 選擇要捨出的手牌位置
    ///
    /// # Arguments
    /// * `hand` - CPU 的手牌 (唯讀)
    /// * `rng` - 亂數來源 (固定 seed 時結果可重現)
    ///
    /// # Returns
    /// 手牌索引；手牌為空時回傳 None
    fn choose_discard_index(&self, hand: &[Tile], rng: &mut dyn RngCore) -> Option<usize>;
}

/// 內建策略
///
/// ## 策略規則
///
/// ### Random
/// 手牌中均勻隨機選一張
///
/// ### Basic
/// 1. 有字牌時，捨出手牌順序中第一張字牌
/// 2. 否則從「孤立牌」中隨機選一張 (同花色沒有點數 ±1 的牌)
/// 3. 都沒有時，均勻隨機
///
/// ### Advanced
/// 目前與 Basic 相同，保留給更強的策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscardPolicy {
    Random,
    #[default]
    Basic,
    Advanced,
}

impl DiscardPolicy {
    pub fn choose<R: Rng + ?Sized>(&self, hand: &[Tile], rng: &mut R) -> Option<usize> {
        if hand.is_empty() {
            return None;
        }

        match self {
            DiscardPolicy::Random => Some(choose_random(hand, rng)),
            DiscardPolicy::Basic | DiscardPolicy::Advanced => Some(choose_basic(hand, rng)),
        }
    }
}

impl DiscardStrategy for DiscardPolicy {
    fn choose_discard_index(&self, hand: &[Tile], rng: &mut dyn RngCore) -> Option<usize> {
        self.choose(hand, rng)
    }
}

fn choose_random<R: Rng + ?Sized>(hand: &[Tile], rng: &mut R) -> usize {
    rng.random_range(0..hand.len())
}

fn choose_basic<R: Rng + ?Sized>(hand: &[Tile], rng: &mut R) -> usize {
    // 字牌優先
    if let Some(pos) = hand.iter().position(Tile::is_honor) {
        return pos;
    }

    let isolated = find_isolated_tiles(hand);
    if !isolated.is_empty() {
        return isolated[rng.random_range(0..isolated.len())];
    }

    choose_random(hand, rng)
}

/// 找出孤立數牌的索引
///
/// 「孤立」= 手中沒有同花色、點數差 1 的牌 (無法延伸成順子)。
pub fn find_isolated_tiles(hand: &[Tile]) -> Vec<usize> {
    hand.iter()
        .enumerate()
        .filter(|(_, tile)| !tile.is_honor())
        .filter(|(_, tile)| {
            let kind = tile.kind();
            !hand.iter().any(|other| kind.is_neighbor_of(&other.kind()))
        })
        .map(|(i, _)| i)
        .collect()
}

/// 難度設定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn policy(&self) -> DiscardPolicy {
        match self {
            Difficulty::Easy => DiscardPolicy::Random,
            Difficulty::Normal => DiscardPolicy::Basic,
            Difficulty::Hard => DiscardPolicy::Advanced,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "random" => Ok(Difficulty::Easy),
            "normal" | "basic" => Ok(Difficulty::Normal),
            "hard" | "advanced" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}
