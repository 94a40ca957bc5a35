use super::content_detector::{ContentDetector, DetectorConfig};
use super::frame_stream::FrameStream;
use super::thumbnail_extractor::{create_scene_thumbnail_tasks, extract_thumbnails_parallel};
use crate::config::Config;
use crate::error::SplitError;
use crate::session::{SessionStore, VideoId, VideoSession};
use crate::tools::{get_video_info, scan_video_files, validate_directory_exists};
use anyhow::Result;
use console::style;
use dialoguer::{Input, Select, theme::ColorfulTheme};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// 單一場景摘要（時間欄位四捨五入到小數兩位）
#[derive(Debug, Clone, Serialize)]
pub struct SceneSummary {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub thumbnail: String,
}

/// 偵測完成後回傳給呼叫端的結果
#[derive(Debug, Serialize)]
pub struct UploadSummary {
    pub video_id: String,
    pub scenes: Vec<SceneSummary>,
}

fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 對上傳的影片執行完整偵測流程
///
/// 複製來源到工作階段專屬的暫存目錄、鑄造識別碼、
/// 單趟掃描切出場景、寫入 `scenes.json`、批次擷取縮圖，
/// 最後以識別碼登錄到儲存。掃描途中任何媒體錯誤都會
/// 中止整個流程且不登錄任何結果；暫存目錄在失敗路徑上
/// 隨 `TempDir` 一併回收
pub fn analyze_video(
    store: &SessionStore,
    source: &Path,
    detector_config: &DetectorConfig,
    thumbnail_offset: f64,
    shutdown_signal: &Arc<AtomicBool>,
) -> Result<UploadSummary, SplitError> {
    if !source.is_file() {
        return Err(SplitError::InvalidInput(format!(
            "找不到上傳的影片檔案: {}",
            source.display()
        )));
    }
    let original_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| SplitError::InvalidInput("影片檔名無效".to_string()))?
        .to_string();

    let info = get_video_info(source)?;

    // 工作階段專屬暫存目錄，持有上傳複本與縮圖
    let workdir = tempfile::tempdir()?;
    let stored_path = workdir.path().join(&original_name);
    fs::copy(source, &stored_path)?;

    let id = VideoId::mint(&stored_path)?;
    info!(
        "開始偵測 [{}]: {} ({:.1}s, threshold={})",
        id, original_name, info.duration_seconds, detector_config.threshold
    );

    let index = detect_scene_index(&stored_path, &info, detector_config, shutdown_signal)?;
    index.save_to_file(&workdir.path().join("scenes.json"))?;

    let tasks =
        create_scene_thumbnail_tasks(&stored_path, &index, thumbnail_offset, workdir.path());
    let results = extract_thumbnails_parallel(tasks, shutdown_signal);
    for result in results.iter().filter(|r| !r.success) {
        // 縮圖失敗只跳過該場景，不影響偵測結果
        warn!(
            "場景 {} 縮圖無法產生: {}",
            result.scene_index,
            result.error_message.as_deref().unwrap_or("未知錯誤")
        );
    }

    let session = VideoSession::new(
        id.clone(),
        original_name,
        stored_path,
        info,
        detector_config.threshold,
        index,
        workdir,
    );
    let session = store.register(session);

    let scenes = session
        .scenes()
        .iter()
        .enumerate()
        .map(|(i, interval)| SceneSummary {
            index: i,
            start: round_2dp(interval.start),
            end: round_2dp(interval.end),
            thumbnail: format!("{id}/{i}"),
        })
        .collect();

    info!("偵測完成 [{}]: {} 個場景", id, session.scenes().len());

    Ok(UploadSummary {
        video_id: id.to_string(),
        scenes,
    })
}

/// 單趟掃描畫格串流，產出場景列表
fn detect_scene_index(
    path: &Path,
    info: &crate::tools::VideoInfo,
    detector_config: &DetectorConfig,
    shutdown_signal: &Arc<AtomicBool>,
) -> Result<crate::session::SceneIndex, SplitError> {
    let mut stream = FrameStream::open(
        path,
        info,
        detector_config.scale_width,
        Arc::clone(shutdown_signal),
    )?;
    let mut detector = ContentDetector::new(detector_config.threshold, stream.frame_rate());

    let estimated_frames = (info.duration_seconds * info.frame_rate).ceil().max(1.0) as u64;
    let pb = ProgressBar::new(estimated_frames);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {wide_bar} {pos}/{len} {msg}")
            .expect("progress template 無效"),
    );
    pb.set_message("掃描畫格");

    while let Some((timestamp, frame)) = stream.next_frame()? {
        detector.process(timestamp, &frame);
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(detector.finish())
}

/// 取得指定場景的縮圖 JPEG 內容
///
/// 未知識別碼、場景編號超出範圍、或該場景當初擷取失敗
/// 都回傳 `NotFound`
pub fn fetch_thumbnail(
    store: &SessionStore,
    id: &VideoId,
    scene_index: usize,
) -> Result<Vec<u8>, SplitError> {
    let session = store
        .get(id)
        .ok_or_else(|| SplitError::NotFound(format!("影片 {id}")))?;

    if scene_index >= session.scenes().len() {
        return Err(SplitError::NotFound(format!(
            "影片 {id} 的場景 {scene_index}"
        )));
    }

    let path = session.thumbnail_path(scene_index);
    if !path.exists() {
        return Err(SplitError::NotFound(format!(
            "影片 {id} 的場景 {scene_index} 縮圖"
        )));
    }
    Ok(fs::read(path)?)
}

/// 場景偵測元件
///
/// 互動流程：選擇影片 → 設定閾值 → 掃描切割 → 顯示場景表
pub struct SceneDetector {
    config: Config,
    store: Arc<SessionStore>,
    shutdown_signal: Arc<AtomicBool>,
}

impl SceneDetector {
    pub const fn new(
        config: Config,
        store: Arc<SessionStore>,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            store,
            shutdown_signal,
        }
    }

    pub fn run(&self) -> Result<()> {
        println!("{}", style("=== 場景偵測 ===").cyan().bold());

        let Some(video_path) = self.prompt_video_file()? else {
            println!("{}", style("找不到任何影片檔案").yellow());
            return Ok(());
        };

        let threshold: f64 = Input::new()
            .with_prompt("場景切換閾值")
            .default(self.config.settings.detection.threshold)
            .interact_text()?;

        let detector_config = DetectorConfig {
            threshold,
            scale_width: self.config.settings.detection.scale_width,
        };

        println!("{}", style("開始偵測場景...").cyan());
        let summary = analyze_video(
            &self.store,
            &video_path,
            &detector_config,
            self.config.settings.thumbnail.offset_seconds,
            &self.shutdown_signal,
        )?;

        self.print_summary(&summary);
        Ok(())
    }

    /// 詢問影片來源：輸入檔案路徑，或輸入資料夾後從掃描結果挑選
    fn prompt_video_file(&self) -> Result<Option<PathBuf>> {
        let mut prompt = Input::new().with_prompt("請輸入影片檔案或資料夾路徑");
        if let Some(recent) = self.config.settings.recent_paths.first() {
            prompt = prompt.default(recent.clone());
        }
        let input: String = prompt.interact_text()?;
        let path = PathBuf::from(input.trim());

        self.remember_path(input.trim());

        if path.is_file() {
            return Ok(Some(path));
        }

        validate_directory_exists(&path)?;
        println!("{}", style("掃描影片檔案中...").dim());
        let video_files = scan_video_files(&path, &self.config.file_type_table)?;

        if video_files.is_empty() {
            return Ok(None);
        }

        let items: Vec<String> = video_files
            .iter()
            .map(|file| {
                let size_mb = file.size as f64 / 1024.0 / 1024.0;
                format!(
                    "{} ({size_mb:.2} MB)",
                    file.path.file_name().unwrap_or_default().to_string_lossy()
                )
            })
            .collect();

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("請選擇影片")
            .items(&items)
            .default(0)
            .interact()?;

        Ok(Some(video_files[selection].path.clone()))
    }

    /// 記錄最近使用的路徑（寫入失敗只提醒，不中斷流程）
    fn remember_path(&self, path: &str) {
        let mut settings = self.config.settings.clone();
        crate::config::save::add_recent_path(&mut settings, path);
        if let Err(e) = crate::config::save::save_settings(&settings) {
            warn!("無法儲存最近使用的路徑: {e}");
        }
    }

    fn print_summary(&self, summary: &UploadSummary) {
        println!();
        println!("{}", style("=== 偵測結果 ===").cyan().bold());
        println!("  影片識別碼: {}", style(&summary.video_id).green());
        println!("  場景數: {}", summary.scenes.len());
        println!();

        for scene in &summary.scenes {
            println!(
                "  {:>3}. {:>8.2}s - {:>8.2}s  ({:.2}s)",
                scene.index + 1,
                scene.start,
                scene.end,
                scene.end - scene.start
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_2dp() {
        assert!((round_2dp(5.004) - 5.0).abs() < 1e-9);
        assert!((round_2dp(5.006) - 5.01).abs() < 1e-9);
        assert!((round_2dp(10.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_analyze_missing_file_is_input_error() {
        let store = SessionStore::new();
        let shutdown = Arc::new(AtomicBool::new(false));
        let err = analyze_video(
            &store,
            Path::new("/nonexistent/video.mp4"),
            &DetectorConfig::default(),
            0.3,
            &shutdown,
        )
        .unwrap_err();
        assert_eq!(err.category(), crate::error::Category::Input);
        assert!(store.is_empty());
    }

    #[test]
    fn test_fetch_thumbnail_unknown_video() {
        let store = SessionStore::new();
        let err = fetch_thumbnail(&store, &VideoId::from("deadbeef-missing"), 0).unwrap_err();
        assert_eq!(err.category(), crate::error::Category::NotFound);
    }
}
