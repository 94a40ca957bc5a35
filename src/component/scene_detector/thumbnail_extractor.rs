use crate::error::SplitError;
use crate::session::{SceneIndex, SceneInterval};
use log::{debug, error};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 縮圖尺寸設定
pub const THUMBNAIL_WIDTH: u32 = 320;
pub const THUMBNAIL_HEIGHT: u32 = 180;

/// 兩段式 seek 的前置緩衝時間（秒）
const SEEK_MARGIN: f64 = 2.0;

/// 代表畫面與場景結尾之間保留的間距（秒）
const BOUNDARY_BACKOFF: f64 = 0.01;

/// 預設代表畫面位移（秒），避開切點上的黑幀或轉場幀
pub const DEFAULT_THUMBNAIL_OFFSET: f64 = 0.3;

/// 縮圖擷取任務
#[derive(Debug, Clone)]
pub struct ThumbnailTask {
    pub video_path: PathBuf,
    pub timestamp: f64,
    /// 來源影片總長度，解碼前的範圍檢查用
    pub duration_seconds: f64,
    pub output_path: PathBuf,
    pub scene_index: usize,
}

/// 縮圖擷取結果
#[derive(Debug)]
pub struct ThumbnailResult {
    pub output_path: PathBuf,
    pub scene_index: usize,
    pub success: bool,
    pub error_message: Option<String>,
}

/// 計算場景的代表時間點
///
/// 取 `start + offset` 並夾限在 `[start, end)` 內；
/// 場景短於位移時退回場景內部，近零長度場景直接取起點，
/// 永遠不會落在影片範圍之外
#[must_use]
pub fn representative_timestamp(interval: &SceneInterval, offset: f64) -> f64 {
    let upper = interval.end - BOUNDARY_BACKOFF;
    (interval.start + offset.max(0.0)).min(upper).max(interval.start)
}

/// 依場景列表建立縮圖任務（快取已存在者略過）
#[must_use]
pub fn create_scene_thumbnail_tasks(
    video_path: &Path,
    scenes: &SceneIndex,
    offset: f64,
    output_dir: &Path,
) -> Vec<ThumbnailTask> {
    scenes
        .iter()
        .enumerate()
        .filter_map(|(scene_index, interval)| {
            let output_path = output_dir.join(format!("thumb_{scene_index:03}.jpg"));
            if output_path.exists() {
                // 已有快取，場景列表未被替換前不重新產生
                return None;
            }
            Some(ThumbnailTask {
                video_path: video_path.to_path_buf(),
                timestamp: representative_timestamp(interval, offset),
                duration_seconds: scenes.duration(),
                output_path,
                scene_index,
            })
        })
        .collect()
}

/// 擷取單一縮圖（使用兩段式 seek 加速）
///
/// 1. `-ss` 在 `-i` 前：快速跳轉到最近的關鍵幀
/// 2. `-ss` 在 `-i` 後：精準解碼到目標時間點
#[must_use]
pub fn extract_thumbnail(task: &ThumbnailTask) -> ThumbnailResult {
    match extract_thumbnail_inner(task) {
        Ok(()) => ThumbnailResult {
            output_path: task.output_path.clone(),
            scene_index: task.scene_index,
            success: true,
            error_message: None,
        },
        Err(e) => ThumbnailResult {
            output_path: task.output_path.clone(),
            scene_index: task.scene_index,
            success: false,
            error_message: Some(e.to_string()),
        },
    }
}

fn extract_thumbnail_inner(task: &ThumbnailTask) -> Result<(), SplitError> {
    if task.timestamp > task.duration_seconds {
        return Err(SplitError::OutOfRange {
            timestamp: task.timestamp,
            duration: task.duration_seconds,
        });
    }

    let t0 = (task.timestamp - SEEK_MARGIN).max(0.0);
    let delta = task.timestamp - t0;

    debug!(
        "擷取場景 {} 縮圖: timestamp={:.2}s, seek={:.2}s+{:.2}s",
        task.scene_index, task.timestamp, t0, delta
    );

    // 縮放並填充到固定比例（不足部分填黑）
    let filter = format!(
        "scale={THUMBNAIL_WIDTH}:{THUMBNAIL_HEIGHT}:force_original_aspect_ratio=decrease,pad={THUMBNAIL_WIDTH}:{THUMBNAIL_HEIGHT}:(ow-iw)/2:(oh-ih)/2:black"
    );

    let mut args = vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
    ];

    if t0 > 0.0 {
        args.push("-ss".to_string());
        args.push(format!("{t0:.3}"));
    }

    args.push("-i".to_string());
    args.push(task.video_path.to_string_lossy().to_string());

    if delta > 0.0 {
        args.push("-ss".to_string());
        args.push(format!("{delta:.3}"));
    }

    args.extend([
        "-frames:v".to_string(),
        "1".to_string(),
        "-an".to_string(),
        "-sn".to_string(),
        "-dn".to_string(),
        "-threads".to_string(),
        "1".to_string(),
        "-vf".to_string(),
        filter,
        "-q:v".to_string(),
        "2".to_string(),
        "-y".to_string(),
        task.output_path.to_string_lossy().to_string(),
    ]);

    let output = Command::new("ffmpeg")
        .args(&args)
        .output()
        .map_err(|e| SplitError::FrameDecode {
            timestamp: task.timestamp,
            reason: format!("無法執行 ffmpeg: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SplitError::FrameDecode {
            timestamp: task.timestamp,
            reason: stderr.trim().to_string(),
        });
    }

    if !task.output_path.exists() {
        return Err(SplitError::FrameDecode {
            timestamp: task.timestamp,
            reason: format!("縮圖檔案未建立: {}", task.output_path.display()),
        });
    }

    Ok(())
}

/// 平行擷取多個場景縮圖
///
/// rayon 平行處理，每個 ffmpeg 程序單執行緒以避免 CPU 過度訂閱；
/// 個別場景失敗只記錄結果，不中斷其餘場景
pub fn extract_thumbnails_parallel(
    tasks: Vec<ThumbnailTask>,
    shutdown_signal: &Arc<AtomicBool>,
) -> Vec<ThumbnailResult> {
    tasks
        .par_iter()
        .map(|task| {
            if shutdown_signal.load(Ordering::SeqCst) {
                return ThumbnailResult {
                    output_path: task.output_path.clone(),
                    scene_index: task.scene_index,
                    success: false,
                    error_message: Some("操作已取消".to_string()),
                };
            }

            let result = extract_thumbnail(task);

            if let Some(msg) = result.error_message.as_ref().filter(|_| !result.success) {
                error!("場景 {} 縮圖擷取失敗: {}", task.scene_index, msg);
            }

            result
        })
        .collect()
}
