//! CPU 玩家定義

use super::strategy::{DiscardPolicy, DiscardStrategy};
use crate::game::{HAND_SIZE, NUM_SEATS, SeatId, Tile};
use log::warn;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Mutex;

/// CPU 玩家
///
/// 每個 CPU 座位一個，持有自己的策略與亂數來源。
/// 牌局狀態不在這裡，每次決策時才借用手牌。
pub struct CpuPlayer {
    seat: SeatId,
    strategy: Box<dyn DiscardStrategy>,
    /// `choose_discard` 只拿 `&self`，亂數狀態需要 Mutex
    rng: Mutex<StdRng>,
}

impl CpuPlayer {
    /// 建立 CPU 玩家
    ///
    /// 指定 `seed` 時決策可重現。
    pub fn new(seat: SeatId, policy: DiscardPolicy, seed: Option<u64>) -> Self {
        Self::with_strategy(seat, Box::new(policy), seed)
    }

    /// 使用自訂策略
    pub fn with_strategy(
        seat: SeatId,
        strategy: Box<dyn DiscardStrategy>,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self {
            seat,
            strategy,
            rng: Mutex::new(rng),
        }
    }

    /// 建立座位 1-3 的 CPU
    ///
    /// 有 seed 時每個座位使用 `seed + seat`，避免三家做出相同的選擇。
    pub fn create_opponents(policy: DiscardPolicy, seed: Option<u64>) -> Vec<CpuPlayer> {
        (1..NUM_SEATS)
            .map(|seat| CpuPlayer::new(seat, policy, seed.map(|s| s.wrapping_add(seat as u64))))
            .collect()
    }

    pub fn seat(&self) -> SeatId {
        self.seat
    }

    /// 是否要摸牌：手牌 13 張且牌山還有牌
    pub fn should_draw(&self, hand_len: usize, deck_count: usize) -> bool {
        deck_count > 0 && hand_len == HAND_SIZE
    }

    /// 選擇要捨出的手牌索引
    ///
    /// 回傳值未經檢查，呼叫端需自行確認是否在手牌範圍內。
    pub fn choose_discard(&self, hand: &[Tile]) -> Option<usize> {
        let mut rng = match self.rng.lock() {
            Ok(rng) => rng,
            Err(poisoned) => {
                warn!("[CPU] Seat {} RNG lock poisoned, recovering", self.seat);
                poisoned.into_inner()
            }
        };
        self.strategy.choose_discard_index(hand, &mut *rng)
    }
}

impl std::fmt::Debug for CpuPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuPlayer").field("seat", &self.seat).finish()
    }
}
