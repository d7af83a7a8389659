//! 錯誤型別

use std::path::PathBuf;
use thiserror::Error;

/// 牌局操作錯誤
///
/// 對外的牌局 API 依規則回傳 bool / Option，此型別用於內部傳遞與日誌。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("seat {0} does not exist")]
    InvalidSeat(usize),
    #[error("discard index {index} out of range (hand size {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("tile not in hand")]
    TileNotInHand,
}

/// 自動進行迴圈中單一回合的錯誤
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("no CPU player registered for seat {0}")]
    NoCpuForSeat(usize),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("turn panicked: {0}")]
    Panicked(String),
}

/// 設定 (環境變數) 錯誤
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// 設定檔錯誤
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("image file does not exist: {0}")]
    MissingImage(PathBuf),
}
