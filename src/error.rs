use std::path::PathBuf;
use thiserror::Error;

/// 錯誤分類，對應回應層的狀態碼分組
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// 使用者可自行修正的輸入問題
    Input,
    /// 影片容器或解碼層的問題
    Media,
    /// 磁碟、編碼、封裝等處理資源問題
    Resource,
    /// 查無對應的影片、縮圖或場景
    NotFound,
}

/// 場景切割流程的錯誤型別
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("輸入無效: {0}")]
    InvalidInput(String),

    #[error("無法解析影片 {path}: {reason}")]
    UnreadableMedia { path: PathBuf, reason: String },

    #[error("解碼失敗 ({timestamp:.3}s): {reason}")]
    FrameDecode { timestamp: f64, reason: String },

    #[error("時間點 {timestamp:.3}s 超出影片長度 {duration:.3}s")]
    OutOfRange { timestamp: f64, duration: f64 },

    #[error("重新編碼失敗: {0}")]
    Encode(String),

    #[error("封裝壓縮檔失敗: {0}")]
    Packaging(String),

    #[error("找不到資源: {0}")]
    NotFound(String),

    #[error("磁碟空間不足: 需要約 {required} bytes，僅剩 {available} bytes")]
    DiskSpace { required: u64, available: u64 },

    #[error("操作已取消")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SplitError {
    #[must_use]
    pub const fn category(&self) -> Category {
        match self {
            Self::InvalidInput(_) => Category::Input,
            Self::UnreadableMedia { .. } | Self::FrameDecode { .. } | Self::OutOfRange { .. } => {
                Category::Media
            }
            Self::Encode(_)
            | Self::Packaging(_)
            | Self::DiskSpace { .. }
            | Self::Cancelled
            | Self::Io(_) => Category::Resource,
            Self::NotFound(_) => Category::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_mapping() {
        assert_eq!(
            SplitError::InvalidInput("缺少影片".to_string()).category(),
            Category::Input
        );
        assert_eq!(
            SplitError::UnreadableMedia {
                path: PathBuf::from("/tmp/a.mp4"),
                reason: "bad header".to_string(),
            }
            .category(),
            Category::Media
        );
        assert_eq!(
            SplitError::Packaging("disk full".to_string()).category(),
            Category::Resource
        );
        assert_eq!(
            SplitError::NotFound("abc123".to_string()).category(),
            Category::NotFound
        );
    }

    #[test]
    fn test_out_of_range_display() {
        let err = SplitError::OutOfRange {
            timestamp: 12.5,
            duration: 10.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("12.5"));
        assert!(msg.contains("10.0"));
    }
}
