use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

pub const MAX_RECENT_PATHS: usize = 5;

/// 可辨識的影片副檔名表（編譯時嵌入）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTypeTable {
    #[serde(rename = "VIDEO_FILE")]
    pub video_file: Vec<String>,
}

impl FileTypeTable {
    #[must_use]
    pub fn video_extensions_set(&self) -> HashSet<String> {
        self.video_file
            .iter()
            .map(|ext| ext.to_lowercase())
            .collect()
    }

    #[must_use]
    pub fn is_video_file(&self, path: &Path) -> bool {
        let video_extensions = self.video_extensions_set();
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| video_extensions.contains(&format!(".{}", ext.to_lowercase())))
    }
}

/// 介面語言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "zh-TW")]
    ZhTw,
}

impl Language {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::ZhTw => "zh-TW",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EnUs => "English",
            Self::ZhTw => "繁體中文",
        };
        f.write_str(name)
    }
}

/// 場景偵測設定
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DetectionSettings {
    /// 場景切換閾值（0-255 等效刻度），越低越敏感
    pub threshold: f64,
    /// 分析用縮小寬度（加速解碼）
    pub scale_width: u32,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            threshold: 30.0,
            scale_width: 320,
        }
    }
}

/// 縮圖設定
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThumbnailSettings {
    /// 代表畫面距場景起點的位移（秒），避開切點上的轉場幀
    pub offset_seconds: f64,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            offset_seconds: 0.3,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub detection: DetectionSettings,
    #[serde(default)]
    pub thumbnail: ThumbnailSettings,
    #[serde(default)]
    pub recent_paths: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub file_type_table: FileTypeTable,
    pub settings: UserSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FileTypeTable {
        FileTypeTable {
            video_file: vec![".mp4".to_string(), ".MKV".to_string()],
        }
    }

    #[test]
    fn test_is_video_file_case_insensitive() {
        let table = table();
        assert!(table.is_video_file(Path::new("/a/b/movie.MP4")));
        assert!(table.is_video_file(Path::new("clip.mkv")));
        assert!(!table.is_video_file(Path::new("notes.txt")));
        assert!(!table.is_video_file(Path::new("no_extension")));
    }

    #[test]
    fn test_default_settings() {
        let settings = UserSettings::default();
        assert!((settings.detection.threshold - 30.0).abs() < 1e-9);
        assert_eq!(settings.detection.scale_width, 320);
        assert!((settings.thumbnail.offset_seconds - 0.3).abs() < 1e-9);
        assert_eq!(settings.language, Language::EnUs);
    }

    #[test]
    fn test_settings_round_trip() {
        let mut settings = UserSettings::default();
        settings.language = Language::ZhTw;
        settings.detection.threshold = 22.5;

        let json = serde_json::to_string(&settings).unwrap();
        let parsed: UserSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.language, Language::ZhTw);
        assert!((parsed.detection.threshold - 22.5).abs() < 1e-9);
    }
}
