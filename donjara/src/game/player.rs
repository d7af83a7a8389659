use super::tile::{Tile, TileId, TileKind};
use crate::error::GameError;
use serde::Serialize;

/// 靜止時的手牌張數
pub const HAND_SIZE: usize = 13;

/// 座位編號 (0 = 玩家本人，1-3 = CPU)
pub type SeatId = usize;

/// 玩家類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    Human,
    Cpu,
}

impl PlayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerKind::Human => "human",
            PlayerKind::Cpu => "cpu",
        }
    }
}

/// 單一座位的玩家：手牌與捨牌
#[derive(Debug, Clone)]
pub struct Player {
    seat: SeatId,
    kind: PlayerKind,
    name: String,
    hand: Vec<Tile>,
    /// 捨牌依序附加，順序即捨出順序
    discards: Vec<Tile>,
}

impl Player {
    pub fn new(seat: SeatId, kind: PlayerKind, name: impl Into<String>) -> Self {
        Self {
            seat,
            kind,
            name: name.into(),
            hand: Vec::with_capacity(HAND_SIZE + 1),
            discards: Vec::new(),
        }
    }

    pub fn seat(&self) -> SeatId {
        self.seat
    }

    pub fn kind(&self) -> PlayerKind {
        self.kind
    }

    pub fn is_human(&self) -> bool {
        self.kind == PlayerKind::Human
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hand(&self) -> &[Tile] {
        &self.hand
    }

    pub fn discards(&self) -> &[Tile] {
        &self.discards
    }

    pub fn hand_count(&self) -> usize {
        self.hand.len()
    }

    pub fn discard_count(&self) -> usize {
        self.discards.len()
    }

    pub fn add_to_hand(&mut self, tile: Tile) {
        self.hand.push(tile);
    }

    /// 捨出手牌第 `index` 張
    pub fn discard_by_index(&mut self, index: usize) -> Result<Tile, GameError> {
        if index >= self.hand.len() {
            return Err(GameError::IndexOutOfRange {
                index,
                len: self.hand.len(),
            });
        }

        let tile = self.hand.remove(index);
        self.discards.push(tile);
        Ok(tile)
    }

    /// 捨出第一張花色點數相同的牌
    ///
    /// 手中有同種的多張實體牌時，被捨出的不一定是呼叫端看到的那一張；
    /// 需要指定實體牌時請用 [`Player::discard_by_id`]。
    pub fn discard_by_kind(&mut self, kind: TileKind) -> bool {
        match self.hand.iter().position(|t| t.kind() == kind) {
            Some(pos) => self.discard_at(pos),
            None => false,
        }
    }

    /// 捨出指定的實體牌
    pub fn discard_by_id(&mut self, id: TileId) -> bool {
        match self.hand.iter().position(|t| t.id == id) {
            Some(pos) => self.discard_at(pos),
            None => false,
        }
    }

    /// 已摸牌 (手牌超過 13 張) 才能捨牌
    pub fn can_discard(&self) -> bool {
        self.hand.len() > HAND_SIZE
    }

    /// 清空手牌與捨牌
    pub(crate) fn clear(&mut self) {
        self.hand.clear();
        self.discards.clear();
    }

    fn discard_at(&mut self, pos: usize) -> bool {
        let tile = self.hand.remove(pos);
        self.discards.push(tile);
        true
    }
}
