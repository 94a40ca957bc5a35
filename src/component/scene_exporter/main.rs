use super::clip_command::ClipExportCommand;
use super::packager::package;
use crate::config::Config;
use crate::error::SplitError;
use crate::session::{SessionStore, VideoId, VideoSession};
use crate::tools::DiskMonitor;
use anyhow::Result;
use console::style;
use dialoguer::{Input, MultiSelect, Select, theme::ColorfulTheme};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 單一場景的匯出結果
#[derive(Debug)]
pub struct ClipResult {
    pub scene_index: usize,
    pub output_path: PathBuf,
    pub success: bool,
    pub error_message: Option<String>,
}

/// 一次匯出請求的整體結果
#[derive(Debug)]
pub struct ExportOutcome {
    pub requested: usize,
    pub skipped_invalid: Vec<usize>,
    pub exported: usize,
    pub failed: usize,
    pub archive_path: PathBuf,
}

/// 匯出選取的場景並打包成壓縮檔
///
/// 只讀取已登錄的場景列表，絕不重新偵測。超出範圍的場景編號
/// 靜默略過（容忍過期的前端選取），其餘照常匯出。
/// 個別場景的編碼失敗不會中斷其他場景（每場景一筆
/// `ClipResult`），封裝失敗則整體失敗且不留下殘缺壓縮檔。
/// 剪輯暫存目錄在所有結束路徑上自動回收
pub fn export_scenes(
    store: &SessionStore,
    id: &VideoId,
    indices: &[usize],
    archive_path: &Path,
    shutdown_signal: &Arc<AtomicBool>,
) -> Result<ExportOutcome, SplitError> {
    let session = store
        .get(id)
        .ok_or_else(|| SplitError::NotFound(format!("影片 {id}")))?;

    let scene_count = session.scenes().len();
    let (valid, skipped_invalid): (Vec<usize>, Vec<usize>) =
        indices.iter().copied().partition(|&i| i < scene_count);
    for &index in &skipped_invalid {
        warn!("略過超出範圍的場景編號 {index}（共 {scene_count} 個場景）");
    }

    ensure_disk_space(&session, archive_path)?;

    // 剪輯輸出到匯出專屬的暫存目錄，打包後隨 TempDir 回收
    let clip_dir = tempfile::tempdir()?;
    let results = export_clips(&session, &valid, clip_dir.path(), shutdown_signal)?;

    let clips: Vec<PathBuf> = results
        .iter()
        .filter(|r| r.success)
        .map(|r| r.output_path.clone())
        .collect();
    package(&clips, archive_path)?;

    let exported = clips.len();
    let failed = results.len() - exported;
    info!(
        "匯出完成 [{}]: {} 成功, {} 失敗, {} 略過",
        id,
        exported,
        failed,
        skipped_invalid.len()
    );

    Ok(ExportOutcome {
        requested: indices.len(),
        skipped_invalid,
        exported,
        failed,
        archive_path: archive_path.to_path_buf(),
    })
}

/// 逐場景重新編碼；單一場景失敗只記錄，不中斷批次
fn export_clips(
    session: &VideoSession,
    valid_indices: &[usize],
    clip_dir: &Path,
    shutdown_signal: &Arc<AtomicBool>,
) -> Result<Vec<ClipResult>, SplitError> {
    let pb = ProgressBar::new(valid_indices.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {wide_bar} {pos}/{len} {msg}")
            .expect("progress template 無效"),
    );
    pb.set_message("匯出場景");

    let mut results = Vec::with_capacity(valid_indices.len());
    for (position, &scene_index) in valid_indices.iter().enumerate() {
        if shutdown_signal.load(Ordering::SeqCst) {
            pb.abandon();
            return Err(SplitError::Cancelled);
        }

        let interval = *session
            .scenes()
            .get(scene_index)
            .expect("場景編號已事先驗證");
        let command =
            ClipExportCommand::new(session.source_path(), interval, clip_dir, position + 1);

        let result = match command.run() {
            Ok(()) => ClipResult {
                scene_index,
                output_path: command.output_path().to_path_buf(),
                success: true,
                error_message: None,
            },
            Err(e) => {
                error!("場景 {scene_index} 匯出失敗: {e}");
                ClipResult {
                    scene_index,
                    output_path: command.output_path().to_path_buf(),
                    success: false,
                    error_message: Some(e.to_string()),
                }
            }
        };
        results.push(result);
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(results)
}

/// 以來源檔大小估算輸出上限，預先檢查磁碟空間
fn ensure_disk_space(session: &VideoSession, archive_path: &Path) -> Result<(), SplitError> {
    let required = fs::metadata(session.source_path()).map(|m| m.len()).unwrap_or(0);
    let target_dir = archive_path.parent().unwrap_or(Path::new("."));

    let mut monitor = DiskMonitor::new();
    if !monitor.has_space_for(target_dir, required) {
        let available = monitor.available_space(target_dir).unwrap_or(0);
        return Err(SplitError::DiskSpace {
            required,
            available,
        });
    }
    Ok(())
}

/// 場景匯出元件
///
/// 互動流程：選擇已偵測的影片 → 勾選場景 → 重新編碼 → 打包下載
pub struct SceneExporter {
    #[allow(dead_code)]
    config: Config,
    store: Arc<SessionStore>,
    shutdown_signal: Arc<AtomicBool>,
}

impl SceneExporter {
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
        println!("{}", style("=== 場景匯出 ===").cyan().bold());

        let sessions = self.store.list();
        if sessions.is_empty() {
            println!("{}", style("尚未偵測任何影片，請先執行場景偵測").yellow());
            return Ok(());
        }

        let items: Vec<String> = sessions
            .iter()
            .map(|s| format!("{} ({} 個場景)", s.original_name(), s.scenes().len()))
            .collect();
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("請選擇影片")
            .items(&items)
            .default(0)
            .interact()?;
        let session = &sessions[selection];

        let scene_items: Vec<String> = session
            .scenes()
            .iter()
            .enumerate()
            .map(|(i, interval)| {
                format!(
                    "場景 {:>3}: {:>8.2}s - {:>8.2}s ({:.2}s)",
                    i + 1,
                    interval.start,
                    interval.end,
                    interval.duration()
                )
            })
            .collect();

        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt("請勾選要匯出的場景（空白鍵選取）")
            .items(&scene_items)
            .interact()?;

        let archive_input: String = Input::new()
            .with_prompt("壓縮檔輸出路徑")
            .default("scenes_export.zip".to_string())
            .interact_text()?;
        let archive_path = PathBuf::from(archive_input.trim());

        println!("{}", style("開始匯出...").cyan());
        let outcome = export_scenes(
            &self.store,
            session.id(),
            &selected,
            &archive_path,
            &self.shutdown_signal,
        )?;

        self.print_summary(&outcome);
        Ok(())
    }

    fn print_summary(&self, outcome: &ExportOutcome) {
        println!();
        println!("{}", style("=== 匯出摘要 ===").cyan().bold());
        println!("  選取: {} 個場景", outcome.requested);
        println!("  成功: {} 個", style(outcome.exported).green());
        if !outcome.skipped_invalid.is_empty() {
            println!(
                "  略過: {} 個（編號超出範圍）",
                style(outcome.skipped_invalid.len()).yellow()
            );
        }
        if outcome.failed > 0 {
            println!("  失敗: {} 個", style(outcome.failed).red());
        }
        println!("  壓縮檔: {}", outcome.archive_path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_unknown_video_not_found() {
        let store = SessionStore::new();
        let shutdown = Arc::new(AtomicBool::new(false));
        let dir = tempfile::tempdir().unwrap();

        let err = export_scenes(
            &store,
            &VideoId::from("deadbeef-missing"),
            &[0],
            &dir.path().join("out.zip"),
            &shutdown,
        )
        .unwrap_err();
        assert_eq!(err.category(), crate::error::Category::NotFound);
    }
}
