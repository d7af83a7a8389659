use super::tile::{Rank, Suit, Tile, TileId, TileKind};
use rand::Rng;
use rand::seq::SliceRandom;

/// 每種牌的張數
pub const COPIES_PER_KIND: usize = 4;

/// 全部牌數 (4×9 萬 + 4×9 筒 + 4×9 索 + 4×7 字)
pub const TOTAL_TILES: usize = 136;

/// 建立完整的 136 張牌 (未洗牌)
///
/// 依 萬→筒→索→字、點數由小到大排列，每種 4 張，編號 0..136。
pub fn build_full_deck() -> Vec<Tile> {
    let mut tiles = Vec::with_capacity(TOTAL_TILES);
    let mut next_id = 0u16;

    for suit in Suit::all() {
        for rank in 1..=suit.max_rank() {
            let kind = TileKind {
                suit,
                rank: Rank(rank),
            };
            for _ in 0..COPIES_PER_KIND {
                tiles.push(Tile::new(TileId(next_id), kind));
                next_id += 1;
            }
        }
    }

    tiles
}

/// 牌山
///
/// 從尾端摸牌；牌局中只會減少，不會增加。
#[derive(Debug, Clone)]
pub struct Deck {
    tiles: Vec<Tile>,
}

impl Deck {
    /// 完整牌山 (未洗牌)
    pub fn new() -> Self {
        Self {
            tiles: build_full_deck(),
        }
    }

    /// 完整牌山並以 `rng` 均勻洗牌
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::new();
        deck.tiles.shuffle(rng);
        deck
    }

    /// 空牌山
    pub fn empty() -> Self {
        Self { tiles: Vec::new() }
    }

    /// 摸一張牌，牌山已空時回傳 None
    pub fn draw(&mut self) -> Option<Tile> {
        self.tiles.pop()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// 剩餘的牌 (尾端為下一張)
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.tiles.iter().any(|t| t.id == id)
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}
