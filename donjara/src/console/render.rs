//! 牌桌的文字呈現

use crate::game::{SeatSnapshot, TableSnapshot, Tile};

fn tile_labels(tiles: &[Tile]) -> String {
    tiles
        .iter()
        .map(|t| t.kind().label())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 手牌，附 DISCARD 用的編號 (1 起算)
pub fn format_hand(seat: &SeatSnapshot) -> String {
    let mut output = format!("\n=== {} ({} tiles) ===\n", seat.info.name, seat.hand.len());

    for (i, tile) in seat.hand.iter().enumerate() {
        output.push_str(&format!("{:>2}:{} ", i + 1, tile.kind().label()));
        if (i + 1) % 7 == 0 {
            output.push('\n');
        }
    }
    if seat.hand.len() % 7 != 0 {
        output.push('\n');
    }
    output
}

/// 整桌：各座位張數與捨牌
///
/// CPU 的手牌只顯示張數。
pub fn format_table(table: &TableSnapshot) -> String {
    let mut output = format!("\n=== Table (mountain: {}) ===\n", table.deck_count);
    if !table.active {
        output.push_str("Game over\n");
    }

    for seat in &table.seats {
        let marker = if seat.info.is_current { ">" } else { " " };
        output.push_str(&format!(
            "{} {:<8} hand {:>2}  discards {:>2}\n",
            marker, seat.info.name, seat.info.hand_count, seat.info.discard_count
        ));
        if !seat.discards.is_empty() {
            output.push_str(&format!("    {}\n", tile_labels(&seat.discards)));
        }
    }
    output
}
