//! 應用程式設定 (環境變數)

use crate::ai::Difficulty;
use crate::error::ConfigError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// CPU 思考時間預設值 (秒)
pub const DEFAULT_TURN_DELAY_SECS: f64 = 1.5;

/// CPU 思考時間下限 (秒)
pub const MIN_TURN_DELAY_SECS: f64 = 0.1;

pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

const ENV_TURN_DELAY: &str = "DONJARA_TURN_DELAY";
const ENV_DIFFICULTY: &str = "DONJARA_DIFFICULTY";
const ENV_SEED: &str = "DONJARA_SEED";
const ENV_SETTINGS: &str = "DONJARA_SETTINGS";

/// CPU 思考時間上限 (秒)
pub const MAX_TURN_DELAY_SECS: f64 = 60.0;

/// 將秒數轉為 CPU 思考時間，限制在 [0.1, 60] 之間 (NaN 取下限)
pub fn clamp_turn_delay(secs: f64) -> Duration {
    let secs = if secs.is_nan() {
        MIN_TURN_DELAY_SECS
    } else {
        secs.clamp(MIN_TURN_DELAY_SECS, MAX_TURN_DELAY_SECS)
    };
    Duration::from_secs_f64(secs)
}

/// 應用程式設定
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// CPU 每回合之間的間隔
    pub turn_delay: Duration,
    /// CPU 難度
    pub difficulty: Difficulty,
    /// 洗牌與 CPU 決策的 seed (None = 系統亂數)
    pub seed: Option<u64>,
    /// 自訂牌圖設定檔
    pub settings_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            turn_delay: Duration::from_secs_f64(DEFAULT_TURN_DELAY_SECS),
            difficulty: Difficulty::default(),
            seed: None,
            settings_path: PathBuf::from(DEFAULT_SETTINGS_FILE),
        }
    }
}

impl AppConfig {
    /// 從環境變數讀取，未設定的項目使用預設值
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 從任意 key→value 來源讀取
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_TURN_DELAY) {
            let secs: f64 = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: ENV_TURN_DELAY,
                value: raw.clone(),
                reason: format!("{}", e),
            })?;
            if !secs.is_finite() || secs > MAX_TURN_DELAY_SECS {
                return Err(ConfigError::InvalidValue {
                    key: ENV_TURN_DELAY,
                    value: raw.clone(),
                    reason: format!("must be at most {} seconds", MAX_TURN_DELAY_SECS),
                });
            }
            config.turn_delay = clamp_turn_delay(secs);
        }

        if let Some(raw) = lookup(ENV_DIFFICULTY) {
            config.difficulty = raw.parse().map_err(|reason| ConfigError::InvalidValue {
                key: ENV_DIFFICULTY,
                value: raw.clone(),
                reason,
            })?;
        }

        if let Some(raw) = lookup(ENV_SEED) {
            let seed: u64 = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: ENV_SEED,
                value: raw.clone(),
                reason: format!("{}", e),
            })?;
            config.seed = Some(seed);
        }

        if let Some(raw) = lookup(ENV_SETTINGS) {
            if !raw.trim().is_empty() {
                config.settings_path = PathBuf::from(raw.trim());
            }
        }

        Ok(config)
    }
}
