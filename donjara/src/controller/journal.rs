//! Journal - 牌局事件記錄
//!
//! 每筆事件帶有遞增序號、座位與牌種，保留最近的 N 筆。
//! 畫面層以序號取得「上次之後的新事件」。

use crate::game::{SeatId, TileKind};
use log::warn;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

/// 預設保留的事件數量
const DEFAULT_CAPACITY: usize = 500;

/// 事件類型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    GameStart,
    Draw,
    Discard,
    Turn,
    GameEnd,
    Error,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::GameStart => "GAME_START",
            EventType::Draw => "DRAW",
            EventType::Discard => "DISCARD",
            EventType::Turn => "TURN",
            EventType::GameEnd => "GAME_END",
            EventType::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GAME_START" => Some(EventType::GameStart),
            "DRAW" => Some(EventType::Draw),
            "DISCARD" => Some(EventType::Discard),
            "TURN" => Some(EventType::Turn),
            "GAME_END" => Some(EventType::GameEnd),
            "ERROR" => Some(EventType::Error),
            _ => None,
        }
    }
}

/// 單筆牌局事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// 1 起算，清除後也不會重複
    pub seq: u64,
    pub timestamp: u64,
    pub event_type: EventType,
    pub seat: Option<SeatId>,
    pub tile: Option<TileKind>,
    pub message: String,
}

impl LogEntry {
    /// 格式化為顯示字串
    pub fn format(&self) -> String {
        format!(
            "[{}] {}: {}",
            format_time_of_day(self.timestamp),
            self.event_type.as_str(),
            self.message
        )
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// 時:分:秒 (UTC)
fn format_time_of_day(timestamp: u64) -> String {
    let secs = timestamp % 86400;
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

struct JournalInner {
    entries: VecDeque<LogEntry>,
    next_seq: u64,
}

/// 牌局事件記錄 (線程安全，clone 共用同一份)
#[derive(Clone)]
pub struct Journal {
    inner: Arc<Mutex<JournalInner>>,
    capacity: usize,
}

impl Journal {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(JournalInner {
                entries: VecDeque::with_capacity(capacity),
                next_seq: 1,
            })),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, JournalInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("[CONTROLLER] Journal lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// 記錄事件，回傳序號
    pub fn record(
        &self,
        event_type: EventType,
        seat: Option<SeatId>,
        tile: Option<TileKind>,
        message: impl Into<String>,
    ) -> u64 {
        let mut inner = self.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;

        if inner.entries.len() >= self.capacity {
            inner.entries.pop_front();
        }
        inner.entries.push_back(LogEntry {
            seq,
            timestamp: now_secs(),
            event_type,
            seat,
            tile,
            message: message.into(),
        });
        seq
    }

    /// 最近 n 筆符合條件的事件 (由舊到新)
    fn recent_matching<F>(&self, n: usize, pred: F) -> Vec<LogEntry>
    where
        F: Fn(&LogEntry) -> bool,
    {
        let inner = self.lock();
        let mut picked: Vec<LogEntry> = inner
            .entries
            .iter()
            .rev()
            .filter(|e| pred(e))
            .take(n)
            .cloned()
            .collect();
        picked.reverse();
        picked
    }

    pub fn get_recent(&self, n: usize) -> Vec<LogEntry> {
        self.recent_matching(n, |_| true)
    }

    pub fn get_recent_by_type(&self, n: usize, event_type: EventType) -> Vec<LogEntry> {
        self.recent_matching(n, |e| e.event_type == event_type)
    }

    pub fn get_recent_by_seat(&self, n: usize, seat: SeatId) -> Vec<LogEntry> {
        self.recent_matching(n, |e| e.seat == Some(seat))
    }

    /// 序號大於 `seq` 的事件 (仍在保留範圍內的部分)
    pub fn since(&self, seq: u64) -> Vec<LogEntry> {
        let inner = self.lock();
        inner
            .entries
            .iter()
            .filter(|e| e.seq > seq)
            .cloned()
            .collect()
    }

    /// 某座位目前保留的捨牌紀錄 (由舊到新)
    pub fn discards_of(&self, seat: SeatId) -> Vec<TileKind> {
        let inner = self.lock();
        inner
            .entries
            .iter()
            .filter(|e| e.event_type == EventType::Discard && e.seat == Some(seat))
            .filter_map(|e| e.tile)
            .collect()
    }

    pub fn latest(&self) -> Option<LogEntry> {
        self.lock().entries.back().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清除事件，序號繼續遞增
    pub fn clear(&self) {
        self.lock().entries.clear();
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}

// === 牌局事件 ===

impl Journal {
    pub fn game_start(&self, deck_count: usize) -> u64 {
        self.record(
            EventType::GameStart,
            None,
            None,
            format!("new game dealt ({} tiles in the mountain)", deck_count),
        )
    }

    pub fn draw(&self, seat: SeatId, name: &str, tile: TileKind, deck_count: usize) -> u64 {
        self.record(
            EventType::Draw,
            Some(seat),
            Some(tile),
            format!("{} draws {} ({} left)", name, tile.label(), deck_count),
        )
    }

    pub fn discard(&self, seat: SeatId, name: &str, tile: TileKind) -> u64 {
        self.record(
            EventType::Discard,
            Some(seat),
            Some(tile),
            format!("{} discards {}", name, tile.label()),
        )
    }

    pub fn turn(&self, seat: SeatId, name: &str) -> u64 {
        self.record(EventType::Turn, Some(seat), None, format!("{}'s turn", name))
    }

    pub fn game_end(&self, total_discards: usize) -> u64 {
        self.record(
            EventType::GameEnd,
            None,
            None,
            format!("mountain exhausted ({} tiles discarded)", total_discards),
        )
    }

    pub fn error(&self, message: &str) -> u64 {
        self.record(EventType::Error, None, None, message)
    }
}
