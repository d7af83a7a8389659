//! Console Commands - 文字介面指令
//!
//! 解析使用者輸入並格式化回應

use crate::controller::{EventType, GameStatus, Journal};
use crate::game::{DiscardTarget, Tile, TileKind};
use crate::settings::Settings;
use std::path::PathBuf;

const DEFAULT_LOG_COUNT: usize = 20;

/// DISCARD 的參數
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardArg {
    /// HAND 顯示的編號 (1 起算)
    Position(usize),
    /// 記法 (e.g. 5m)，對應手牌中第一張相同的牌
    Kind(TileKind),
}

impl DiscardArg {
    /// 轉成捨牌目標；記法會換成手牌中第一張相符實體牌的 id
    pub fn resolve(&self, hand: &[Tile]) -> Option<DiscardTarget> {
        match *self {
            DiscardArg::Position(pos) if pos >= 1 && pos <= hand.len() => {
                Some(DiscardTarget::Index(pos - 1))
            }
            DiscardArg::Position(_) => None,
            DiscardArg::Kind(kind) => hand
                .iter()
                .find(|t| t.kind() == kind)
                .map(|t| DiscardTarget::Tile(t.id)),
        }
    }
}

/// 指令解析結果
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedCommand {
    Help,
    Status,
    Table,
    Hand,
    Draw,
    Discard(DiscardArg),
    Auto,
    Delay(f64),
    New,
    Logs(usize, Option<EventType>),
    Images,
    ImageSet(TileKind, PathBuf),
    /// None = 全部清除
    ImageClear(Option<TileKind>),
    Quit,
    Unknown(String),
}

/// 解析指令
pub fn parse_command(input: &str) -> ParsedCommand {
    let input = input.trim();
    let parts: Vec<&str> = input.split_whitespace().collect();

    if parts.is_empty() {
        return ParsedCommand::Unknown(String::new());
    }

    let cmd = parts[0].to_uppercase();

    match cmd.as_str() {
        "HELP" | "?" => ParsedCommand::Help,
        "STATUS" => ParsedCommand::Status,
        "TABLE" => ParsedCommand::Table,
        "HAND" => ParsedCommand::Hand,
        "DRAW" => ParsedCommand::Draw,
        "DISCARD" => match parts.get(1) {
            None => ParsedCommand::Unknown("DISCARD requires a position or tile".to_string()),
            Some(arg) => parse_discard_arg(arg)
                .map(ParsedCommand::Discard)
                .unwrap_or_else(|| ParsedCommand::Unknown(format!("Invalid tile: {}", arg))),
        },
        "AUTO" => ParsedCommand::Auto,
        "DELAY" => match parts.get(1).and_then(|s| s.parse::<f64>().ok()) {
            Some(secs) if secs.is_finite() => ParsedCommand::Delay(secs),
            _ => ParsedCommand::Unknown("DELAY requires seconds (e.g. DELAY 0.5)".to_string()),
        },
        "NEW" => ParsedCommand::New,
        "LOGS" => {
            let count = parts
                .get(1)
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_LOG_COUNT);
            let event_type = parts.get(2).and_then(|s| EventType::parse(s));
            ParsedCommand::Logs(count, event_type)
        }
        "IMAGES" => ParsedCommand::Images,
        "IMAGE" => parse_image(&parts[1..]),
        "QUIT" | "EXIT" => ParsedCommand::Quit,
        _ => ParsedCommand::Unknown(format!("Unknown command: {}", cmd)),
    }
}

fn parse_discard_arg(arg: &str) -> Option<DiscardArg> {
    if let Ok(pos) = arg.parse::<usize>() {
        return Some(DiscardArg::Position(pos));
    }
    TileKind::parse(arg).map(DiscardArg::Kind)
}

fn parse_image(args: &[&str]) -> ParsedCommand {
    let sub = args.first().map(|s| s.to_uppercase());

    match sub.as_deref() {
        Some("SET") => match (args.get(1).and_then(|s| TileKind::parse(s)), args.get(2)) {
            (Some(kind), Some(_)) => {
                // 路徑可能含空白
                let path = args[2..].join(" ");
                ParsedCommand::ImageSet(kind, PathBuf::from(path))
            }
            _ => ParsedCommand::Unknown("IMAGE SET requires <tile> <path>".to_string()),
        },
        Some("CLEAR") => match args.get(1) {
            Some(arg) if arg.eq_ignore_ascii_case("ALL") => ParsedCommand::ImageClear(None),
            Some(arg) => match TileKind::parse(arg) {
                Some(kind) => ParsedCommand::ImageClear(Some(kind)),
                None => ParsedCommand::Unknown(format!("Invalid tile: {}", arg)),
            },
            None => ParsedCommand::Unknown("IMAGE CLEAR requires <tile> or ALL".to_string()),
        },
        _ => ParsedCommand::Unknown("IMAGE requires SET or CLEAR".to_string()),
    }
}

/// 產生 HELP 訊息
pub fn help_message() -> String {
    r#"
=== Donjara ===

Commands:
  HELP                   Show this help message
  STATUS                 Show game status
  TABLE                  Show all seats and discard piles
  HAND                   Show your hand
  DRAW                   Draw a tile (your turn, 13 tiles in hand)
  DISCARD <n|tile>       Discard by position shown in HAND, or by tile (e.g. 5m)
  AUTO                   Toggle CPU auto-play
  DELAY <secs>           Set CPU turn delay (0.1 to 60)
  NEW                    Deal a new game
  LOGS [n] [type]        Show recent n events (default: 20)
                         Types: GAME_START, DRAW, DISCARD, TURN, GAME_END, ERROR
  IMAGES                 List custom tile images
  IMAGE SET <tile> <path>
                         Use a custom image for a tile
  IMAGE CLEAR <tile|ALL> Remove custom images
  QUIT                   Leave the game

Tiles: 1m-9m, 1p-9p, 1s-9s, 1z-7z

Examples:
  DRAW
  DISCARD 14
  DISCARD 7z
  LOGS 10 DISCARD
"#
    .to_string()
}

/// 格式化狀態
pub fn format_status(status: &GameStatus, turn_delay_secs: f64) -> String {
    format!(
        r#"
=== Game Status ===
Mountain: {}
Turn: {} (seat {})
Your Turn: {}
Can Discard: {}
Game Active: {}
Auto-play: {} ({:.1}s per CPU turn)
"#,
        status.mountain_count,
        status.current_player_name,
        status.current_seat,
        yes_no(status.is_human_turn),
        yes_no(status.can_human_discard),
        yes_no(status.game_active),
        if status.auto_play_active { "On" } else { "Off" },
        turn_delay_secs
    )
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

/// 格式化日誌
pub fn format_logs(journal: &Journal, count: usize, event_type: Option<EventType>) -> String {
    let entries = match event_type {
        Some(et) => journal.get_recent_by_type(count, et),
        None => journal.get_recent(count),
    };

    if entries.is_empty() {
        return "No logs found.".to_string();
    }

    let mut output = String::from("\n=== Logs ===\n");
    for entry in entries {
        output.push_str(&entry.format());
        output.push('\n');
    }
    output
}

/// 格式化自訂牌圖列表
pub fn format_images(settings: &Settings) -> String {
    let images: Vec<_> = settings.all_custom_images().collect();
    if images.is_empty() {
        return "No custom images.".to_string();
    }

    let mut output = String::from("\n=== Custom Images ===\n");
    output.push_str(&format!("{:<10} {}\n", "Tile", "Path"));
    output.push_str(&"-".repeat(42));
    output.push('\n');

    for (key, path) in images {
        output.push_str(&format!("{:<10} {}\n", key, path.display()));
    }
    output
}
