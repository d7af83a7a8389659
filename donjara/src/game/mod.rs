pub mod deck;
pub mod player;
pub mod state;
pub mod tile;

pub use deck::{Deck, TOTAL_TILES, build_full_deck};
pub use player::{HAND_SIZE, Player, PlayerKind, SeatId};
pub use state::{
    DiscardTarget, GameState, HUMAN_SEAT, NUM_SEATS, SeatInfo, SeatSnapshot, TableSnapshot,
    TileLocation,
};
pub use tile::{Rank, Suit, Tile, TileId, TileKind};
