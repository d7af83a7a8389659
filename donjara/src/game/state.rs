//! 四人牌局狀態
//!
//! `GameState` 本身不檢查輪次：任何座位都可以隨時摸牌、捨牌。
//! 輪次與「每回合只動作一次」的規矩全部由 controller 負責。

use super::deck::{Deck, TOTAL_TILES};
use super::player::{HAND_SIZE, Player, PlayerKind, SeatId};
use super::tile::{Tile, TileId, TileKind};
use crate::error::GameError;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

/// 座位數
pub const NUM_SEATS: usize = 4;

/// 玩家本人的座位
pub const HUMAN_SEAT: SeatId = 0;

const SEAT_NAMES: [&str; NUM_SEATS] = ["あなた", "CPU1", "CPU2", "CPU3"];

/// 捨牌目標
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardTarget {
    /// 手牌中的位置 (0-based)
    Index(usize),
    /// 第一張花色點數相同的牌
    Kind(TileKind),
    /// 指定的實體牌
    Tile(TileId),
}

/// 實體牌目前的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "zone", content = "seat", rename_all = "lowercase")]
pub enum TileLocation {
    Mountain,
    Hand(SeatId),
    Discards(SeatId),
}

/// 座位資訊 (唯讀)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatInfo {
    pub seat: SeatId,
    pub name: String,
    pub hand_count: usize,
    pub discard_count: usize,
    pub is_current: bool,
    pub kind: PlayerKind,
}

/// 單一座位的快照
#[derive(Debug, Clone, Serialize)]
pub struct SeatSnapshot {
    #[serde(flatten)]
    pub info: SeatInfo,
    pub hand: Vec<Tile>,
    pub discards: Vec<Tile>,
}

/// 整桌快照，供畫面層讀取
#[derive(Debug, Clone, Serialize)]
pub struct TableSnapshot {
    pub deck_count: usize,
    pub current_seat: SeatId,
    pub active: bool,
    pub seats: Vec<SeatSnapshot>,
}

impl TableSnapshot {
    pub fn seat(&self, seat: SeatId) -> Option<&SeatSnapshot> {
        self.seats.get(seat)
    }

    pub fn human(&self) -> &SeatSnapshot {
        &self.seats[HUMAN_SEAT]
    }

    pub fn current(&self) -> &SeatSnapshot {
        &self.seats[self.current_seat]
    }
}

/// 四人牌局
pub struct GameState {
    deck: Deck,
    players: Vec<Player>,
    current_seat: SeatId,
    active: bool,
    rng: StdRng,
}

impl GameState {
    /// 建立新牌局並立即發牌
    ///
    /// 指定 `seed` 時洗牌結果可重現。
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };

        let players = (0..NUM_SEATS)
            .map(|seat| {
                let kind = if seat == HUMAN_SEAT {
                    PlayerKind::Human
                } else {
                    PlayerKind::Cpu
                };
                Player::new(seat, kind, SEAT_NAMES[seat])
            })
            .collect();

        let mut state = Self {
            deck: Deck::empty(),
            players,
            current_seat: HUMAN_SEAT,
            active: false,
            rng,
        };
        state.deal_new_game();
        state
    }

    /// 重新洗牌並發牌
    ///
    /// 每人 13 張，依座位 0→1→2→3 輪流發，共 13 輪。
    pub fn deal_new_game(&mut self) {
        self.deck = Deck::shuffled(&mut self.rng);

        for player in &mut self.players {
            player.clear();
        }

        for _ in 0..HAND_SIZE {
            for player in &mut self.players {
                if let Some(tile) = self.deck.draw() {
                    player.add_to_hand(tile);
                }
            }
        }

        self.current_seat = HUMAN_SEAT;
        self.active = true;
        debug_assert_eq!(self.total_tiles(), TOTAL_TILES);

        info!(
            "[ENGINE] New game dealt, {} tiles left in the mountain",
            self.deck.len()
        );
    }

    /// 替指定座位摸牌
    ///
    /// 牌山已空或座位不存在時回傳 None。不檢查是否輪到該座位。
    pub fn draw_for_seat(&mut self, seat: SeatId) -> Option<Tile> {
        let player = match self.players.get_mut(seat) {
            Some(p) => p,
            None => {
                warn!("[ENGINE] Draw for invalid seat {}", seat);
                return None;
            }
        };

        let tile = self.deck.draw()?;
        player.add_to_hand(tile);
        debug!(
            "[ENGINE] Seat {} draws {} ({} left)",
            seat,
            tile,
            self.deck.len()
        );
        Some(tile)
    }

    /// 替指定座位捨牌，回傳被捨出的牌
    pub fn try_discard_for_seat(
        &mut self,
        seat: SeatId,
        target: DiscardTarget,
    ) -> Result<Tile, GameError> {
        let player = self
            .players
            .get_mut(seat)
            .ok_or(GameError::InvalidSeat(seat))?;

        match target {
            DiscardTarget::Index(index) => player.discard_by_index(index),
            DiscardTarget::Kind(kind) => {
                if player.discard_by_kind(kind) {
                    Ok(last_discard(player))
                } else {
                    Err(GameError::TileNotInHand)
                }
            }
            DiscardTarget::Tile(id) => {
                if player.discard_by_id(id) {
                    Ok(last_discard(player))
                } else {
                    Err(GameError::TileNotInHand)
                }
            }
        }
    }

    /// 替指定座位捨牌，失敗 (索引超出範圍、牌不在手中、座位不存在) 回傳 false
    pub fn discard_for_seat(&mut self, seat: SeatId, target: DiscardTarget) -> bool {
        match self.try_discard_for_seat(seat, target) {
            Ok(tile) => {
                debug!("[ENGINE] Seat {} discards {}", seat, tile);
                true
            }
            Err(e) => {
                warn!("[ENGINE] Seat {} discard {:?} failed: {}", seat, target, e);
                false
            }
        }
    }

    /// 輪到下一位 (無條件)
    pub fn advance_turn(&mut self) {
        self.current_seat = (self.current_seat + 1) % NUM_SEATS;
    }

    /// 牌山已空或牌局已停止
    pub fn is_over(&self) -> bool {
        self.deck.is_empty() || !self.active
    }

    /// 停止牌局 (直到下次發牌)
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn can_draw(&self) -> bool {
        !self.deck.is_empty() && self.active
    }

    pub fn current_seat(&self) -> SeatId {
        self.current_seat
    }

    pub fn current_player(&self) -> &Player {
        &self.players[self.current_seat]
    }

    pub fn human_player(&self) -> &Player {
        &self.players[HUMAN_SEAT]
    }

    pub fn player(&self, seat: SeatId) -> Option<&Player> {
        self.players.get(seat)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn deck_count(&self) -> usize {
        self.deck.len()
    }

    pub fn hand_count(&self, seat: SeatId) -> Option<usize> {
        self.player(seat).map(Player::hand_count)
    }

    pub fn discard_count(&self, seat: SeatId) -> Option<usize> {
        self.player(seat).map(Player::discard_count)
    }

    pub fn seat_info(&self, seat: SeatId) -> Option<SeatInfo> {
        let player = self.player(seat)?;
        Some(SeatInfo {
            seat,
            name: player.name().to_string(),
            hand_count: player.hand_count(),
            discard_count: player.discard_count(),
            is_current: seat == self.current_seat,
            kind: player.kind(),
        })
    }

    /// 牌山 + 所有手牌 + 所有捨牌，恆等於 136
    pub fn total_tiles(&self) -> usize {
        self.deck.len()
            + self
                .players
                .iter()
                .map(|p| p.hand_count() + p.discard_count())
                .sum::<usize>()
    }

    /// 找出實體牌目前的位置
    pub fn locate(&self, id: TileId) -> Option<TileLocation> {
        if self.deck.contains(id) {
            return Some(TileLocation::Mountain);
        }
        for player in &self.players {
            if player.hand().iter().any(|t| t.id == id) {
                return Some(TileLocation::Hand(player.seat()));
            }
            if player.discards().iter().any(|t| t.id == id) {
                return Some(TileLocation::Discards(player.seat()));
            }
        }
        None
    }

    /// 唯讀快照
    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            deck_count: self.deck.len(),
            current_seat: self.current_seat,
            active: self.active,
            seats: self
                .players
                .iter()
                .filter_map(|p| {
                    Some(SeatSnapshot {
                        info: self.seat_info(p.seat())?,
                        hand: p.hand().to_vec(),
                        discards: p.discards().to_vec(),
                    })
                })
                .collect(),
        }
    }
}

impl std::fmt::Debug for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameState")
            .field("deck_count", &self.deck.len())
            .field("current_seat", &self.current_seat)
            .field("active", &self.active)
            .finish()
    }
}

fn last_discard(player: &Player) -> Tile {
    // discard_by_* 回傳 true 時捨牌區必定非空
    player.discards()[player.discard_count() - 1]
}

/// 測試用：確認牌數守恆
#[cfg(test)]
pub(crate) fn assert_conserved(state: &GameState) {
    assert_eq!(state.total_tiles(), TOTAL_TILES);
}
