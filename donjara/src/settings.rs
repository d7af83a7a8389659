//! 自訂牌圖設定 (JSON 檔)

use crate::error::SettingsError;
use crate::game::TileKind;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// 預設牌圖的根目錄
pub const ASSETS_DIR: &str = "assets";

/// 設定檔內容
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    custom_images: BTreeMap<String, PathBuf>,
}

/// 自訂牌圖設定
///
/// key 為 `<花色>_<點數>` (例如 `manzu_5`、`jihai_7`)。
/// 每次變更都立即寫回檔案。
#[derive(Debug, Clone)]
pub struct Settings {
    path: PathBuf,
    data: SettingsFile,
}

impl Settings {
    /// 讀取設定檔；檔案不存在或內容損壞時回傳空設定
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let data = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<SettingsFile>(&text) {
                Ok(data) => {
                    info!(
                        "[SETTINGS] Loaded {} custom images from {}",
                        data.custom_images.len(),
                        path.display()
                    );
                    data
                }
                Err(e) => {
                    warn!("[SETTINGS] Ignoring corrupt {}: {}", path.display(), e);
                    SettingsFile::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SettingsFile::default(),
            Err(e) => {
                warn!("[SETTINGS] Cannot read {}: {}", path.display(), e);
                SettingsFile::default()
            }
        };

        Self { path, data }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 寫回設定檔
    pub fn save(&self) -> Result<(), SettingsError> {
        let text = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, text).map_err(|source| SettingsError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// 設定自訂牌圖 (檔案必須存在)
    pub fn set_custom_image(
        &mut self,
        kind: TileKind,
        image: impl Into<PathBuf>,
    ) -> Result<(), SettingsError> {
        let image = image.into();
        if !image.is_file() {
            return Err(SettingsError::MissingImage(image));
        }

        info!("[SETTINGS] {} -> {}", kind.settings_key(), image.display());
        self.data.custom_images.insert(kind.settings_key(), image);
        self.save()
    }

    /// 移除自訂牌圖，回傳是否原本有設定
    pub fn remove_custom_image(&mut self, kind: TileKind) -> Result<bool, SettingsError> {
        if self.data.custom_images.remove(&kind.settings_key()).is_none() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    pub fn clear_all_custom_images(&mut self) -> Result<(), SettingsError> {
        self.data.custom_images.clear();
        self.save()
    }

    pub fn get_custom_image(&self, kind: TileKind) -> Option<&Path> {
        self.data
            .custom_images
            .get(&kind.settings_key())
            .map(PathBuf::as_path)
    }

    pub fn has_custom_image(&self, kind: TileKind) -> bool {
        self.data.custom_images.contains_key(&kind.settings_key())
    }

    /// 所有自訂牌圖 (依 key 排序)
    pub fn all_custom_images(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.data
            .custom_images
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_path()))
    }

    /// 牌圖路徑：自訂圖仍存在時用自訂圖，否則用預設圖
    pub fn image_path_for(&self, kind: TileKind) -> PathBuf {
        match self.get_custom_image(kind) {
            Some(custom) if custom.is_file() => custom.to_path_buf(),
            _ => default_image_path(kind),
        }
    }
}

/// 預設牌圖 `assets/<wan|pin|sou|honor>/<rank>.png`
pub fn default_image_path(kind: TileKind) -> PathBuf {
    Path::new(ASSETS_DIR)
        .join(kind.suit.asset_folder())
        .join(format!("{}.png", kind.rank.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn kind(s: &str) -> TileKind {
        TileKind::parse(s).unwrap()
    }

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().unwrap();
        let settings_path = dir.path().join("settings.json");
        let image = dir.path().join("five.png");
        fs::write(&image, b"png").unwrap();
        (dir, settings_path, image)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (_dir, path, _) = setup();
        let settings = Settings::load(&path);
        assert_eq!(settings.all_custom_images().count(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let (_dir, path, _) = setup();
        fs::write(&path, "{ not json").unwrap();

        let settings = Settings::load(&path);
        assert_eq!(settings.all_custom_images().count(), 0);
    }

    #[test]
    fn test_set_persists() {
        let (_dir, path, image) = setup();
        let mut settings = Settings::load(&path);
        settings.set_custom_image(kind("5m"), &image).unwrap();

        let reloaded = Settings::load(&path);
        assert!(reloaded.has_custom_image(kind("5m")));
        assert_eq!(reloaded.get_custom_image(kind("5m")), Some(image.as_path()));
        assert!(!reloaded.has_custom_image(kind("5p")));

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"custom_images\""));
        assert!(text.contains("\"manzu_5\""));
    }

    #[test]
    fn test_set_rejects_missing_image() {
        let (dir, path, _) = setup();
        let mut settings = Settings::load(&path);

        let err = settings
            .set_custom_image(kind("1z"), dir.path().join("nope.png"))
            .unwrap_err();
        assert!(matches!(err, SettingsError::MissingImage(_)));
        assert!(!settings.has_custom_image(kind("1z")));
    }

    #[test]
    fn test_remove_and_clear() {
        let (_dir, path, image) = setup();
        let mut settings = Settings::load(&path);
        settings.set_custom_image(kind("5m"), &image).unwrap();
        settings.set_custom_image(kind("7z"), &image).unwrap();

        assert!(settings.remove_custom_image(kind("5m")).unwrap());
        assert!(!settings.remove_custom_image(kind("5m")).unwrap());
        assert_eq!(Settings::load(&path).all_custom_images().count(), 1);

        settings.clear_all_custom_images().unwrap();
        assert_eq!(Settings::load(&path).all_custom_images().count(), 0);
    }

    #[test]
    fn test_image_path_fallback() {
        let (_dir, path, image) = setup();
        let mut settings = Settings::load(&path);

        assert_eq!(
            settings.image_path_for(kind("3s")),
            PathBuf::from("assets").join("sou").join("3.png")
        );
        assert_eq!(
            settings.image_path_for(kind("6z")),
            PathBuf::from("assets").join("honor").join("6.png")
        );

        settings.set_custom_image(kind("3s"), &image).unwrap();
        assert_eq!(settings.image_path_for(kind("3s")), image);

        // 自訂圖被刪掉後退回預設圖
        fs::remove_file(&image).unwrap();
        assert_eq!(
            settings.image_path_for(kind("3s")),
            PathBuf::from("assets").join("sou").join("3.png")
        );
    }
}
