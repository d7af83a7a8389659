//! 牌的定義
//!
//! 每張實體牌都有唯一的 `TileId`，`TileKind` (花色 + 點數) 則是結構上的身分。

use serde::Serialize;
use std::fmt;

/// 花色
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Characters, // 萬子
    Circles,    // 筒子
    Bamboo,     // 索子
    Honors,     // 字牌
}

impl Suit {
    pub fn all() -> [Suit; 4] {
        [Suit::Characters, Suit::Circles, Suit::Bamboo, Suit::Honors]
    }

    /// 此花色的最大點數 (數牌 9，字牌 7)
    pub fn max_rank(&self) -> u8 {
        match self {
            Suit::Honors => 7,
            _ => 9,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Suit::Honors)
    }

    /// 記法字母 (e.g. 5m, 3p, 9s, 1z)
    pub fn symbol(&self) -> char {
        match self {
            Suit::Characters => 'm',
            Suit::Circles => 'p',
            Suit::Bamboo => 's',
            Suit::Honors => 'z',
        }
    }

    pub fn from_char(c: char) -> Option<Suit> {
        match c.to_ascii_lowercase() {
            'm' => Some(Suit::Characters),
            'p' => Some(Suit::Circles),
            's' => Some(Suit::Bamboo),
            'z' => Some(Suit::Honors),
            _ => None,
        }
    }

    /// 設定檔使用的 key
    pub fn key(&self) -> &'static str {
        match self {
            Suit::Characters => "manzu",
            Suit::Circles => "pinzu",
            Suit::Bamboo => "souzu",
            Suit::Honors => "jihai",
        }
    }

    /// 預設圖片資料夾
    pub fn asset_folder(&self) -> &'static str {
        match self {
            Suit::Characters => "wan",
            Suit::Circles => "pin",
            Suit::Bamboo => "sou",
            Suit::Honors => "honor",
        }
    }

    fn label(&self) -> char {
        match self {
            Suit::Characters => '萬',
            Suit::Circles => '筒',
            Suit::Bamboo => '索',
            Suit::Honors => '字',
        }
    }
}

/// 點數 (數牌 1-9，字牌 1-7: 東南西北白發中)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Rank(pub u8);

/// 結構上的牌種 (花色 + 點數)
///
/// 同一牌種有四張實體牌，彼此無法以 `TileKind` 區分。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TileKind {
    pub suit: Suit,
    pub rank: Rank,
}

impl TileKind {
    /// 建立牌種，點數超出該花色範圍時回傳 None
    pub fn new(suit: Suit, rank: u8) -> Option<Self> {
        if (1..=suit.max_rank()).contains(&rank) {
            Some(Self {
                suit,
                rank: Rank(rank),
            })
        } else {
            None
        }
    }

    /// 從記法解析 (e.g., "5m", "7Z")
    pub fn parse(s: &str) -> Option<TileKind> {
        let s = s.trim();
        let suit_char = s.chars().last()?;
        let rank_str = &s[..s.len() - suit_char.len_utf8()];

        let suit = Suit::from_char(suit_char)?;
        let rank: u8 = rank_str.parse().ok()?;

        TileKind::new(suit, rank)
    }

    /// 原版風格的顯示字串 (e.g., "5萬")
    pub fn label(&self) -> String {
        format!("{}{}", self.rank.0, self.suit.label())
    }

    /// 設定檔 key: "<suit>_<rank>"
    pub fn settings_key(&self) -> String {
        format!("{}_{}", self.suit.key(), self.rank.0)
    }

    /// 「相鄰」判定：同花色數牌且點數差 1
    pub fn is_neighbor_of(&self, other: &TileKind) -> bool {
        self.suit.is_numeric() && self.suit == other.suit && self.rank.0.abs_diff(other.rank.0) == 1
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.0, self.suit.symbol())
    }
}

/// 實體牌編號 (0..136，建立牌山時分配)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TileId(pub u16);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 實體牌
///
/// 相等性包含 `id`；只比較花色點數時使用 [`Tile::kind`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Tile {
    pub id: TileId,
    pub suit: Suit,
    pub rank: Rank,
}

impl Tile {
    pub fn new(id: TileId, kind: TileKind) -> Self {
        Self {
            id,
            suit: kind.suit,
            rank: kind.rank,
        }
    }

    pub fn kind(&self) -> TileKind {
        TileKind {
            suit: self.suit,
            rank: self.rank,
        }
    }

    pub fn is_honor(&self) -> bool {
        self.suit == Suit::Honors
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind().fmt(f)
    }
}
