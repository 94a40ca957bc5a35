use crate::error::SplitError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 時間比較容差（秒），吸收畫格長度造成的捨入誤差
pub const TIME_EPSILON: f64 = 0.05;

/// 單一場景的時間區間（秒）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneInterval {
    pub start: f64,
    pub end: f64,
}

impl SceneInterval {
    #[must_use]
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// 一部影片的完整場景列表
///
/// 偵測成功後一次建立，之後不再修改；重新偵測會整份替換
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneIndex {
    intervals: Vec<SceneInterval>,
    duration: f64,
}

impl SceneIndex {
    #[must_use]
    pub fn new(intervals: Vec<SceneInterval>, duration: f64) -> Self {
        Self {
            intervals,
            duration,
        }
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SceneInterval> {
        self.intervals.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneInterval> {
        self.intervals.iter()
    }

    /// 驗證場景列表是否為 `[0, duration)` 的連續分割：
    /// 從 0 開始、相鄰場景首尾相接、結尾落在影片長度（皆在容差內）
    #[must_use]
    pub fn is_contiguous_partition(&self) -> bool {
        let Some(first) = self.intervals.first() else {
            return false;
        };
        if first.start.abs() > TIME_EPSILON {
            return false;
        }
        for pair in self.intervals.windows(2) {
            if (pair[0].end - pair[1].start).abs() > TIME_EPSILON {
                return false;
            }
            if pair[1].end < pair[1].start {
                return false;
            }
        }
        let last = self.intervals[self.intervals.len() - 1];
        (last.end - self.duration).abs() <= TIME_EPSILON
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), SplitError> {
        let content =
            serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, SplitError> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| std::io::Error::other(e).into())
    }
}
