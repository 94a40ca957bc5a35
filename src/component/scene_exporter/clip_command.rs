use crate::error::SplitError;
use crate::session::SceneInterval;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 近零長度場景夾限後的最小輸出長度（秒）
pub const MIN_CLIP_SPAN: f64 = 0.1;

/// 單一場景的重新編碼命令
///
/// 固定輸出 H.264 + AAC 的 mp4（取相容性而非位元重現，
/// 轉檔有損是預期行為），保留來源解析度與音軌，
/// 絕不修改來源檔案
pub struct ClipExportCommand {
    source_path: PathBuf,
    interval: SceneInterval,
    output_path: PathBuf,
}

impl ClipExportCommand {
    /// `slot` 為選取清單中的 1-based 位置，決定輸出檔名
    #[must_use]
    pub fn new(source_path: &Path, interval: SceneInterval, output_dir: &Path, slot: usize) -> Self {
        Self {
            source_path: source_path.to_path_buf(),
            interval,
            output_path: output_dir.join(format!("scene_{slot}.mp4")),
        }
    }

    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// 實際輸出長度：近零長度的場景夾限到最小可播放範圍
    #[must_use]
    pub fn clamped_span(&self) -> f64 {
        self.interval.duration().max(MIN_CLIP_SPAN)
    }

    #[must_use]
    pub fn build_command(&self) -> Command {
        let mut cmd = Command::new("ffmpeg");

        cmd.args(["-hide_banner", "-nostdin", "-loglevel", "error"]);

        // 快速 seek 到場景起點（-ss 在 -i 前，重新編碼下仍為精準定位）
        if self.interval.start > 0.0 {
            cmd.args(["-ss", &format!("{:.3}", self.interval.start)]);
        }

        cmd.arg("-i");
        cmd.arg(&self.source_path);

        cmd.args([
            "-t", &format!("{:.3}", self.clamped_span()),
            "-map", "0:v:0",
            "-map", "0:a:0?",
            "-sn", "-dn",
            "-c:v", "libx264",
            "-preset", "veryfast",
            "-crf", "23",
            "-pix_fmt", "yuv420p",
            "-c:a", "aac",
            "-b:a", "128k",
            "-movflags", "+faststart",
            "-y",
        ]);
        cmd.arg(&self.output_path);

        cmd
    }

    /// 執行重新編碼；編碼器或容器失敗回傳 `Encode`
    pub fn run(&self) -> Result<(), SplitError> {
        let output = self
            .build_command()
            .output()
            .map_err(|e| SplitError::Encode(format!("無法執行 ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SplitError::Encode(stderr.trim().to_string()));
        }

        if !self.output_path.exists() {
            return Err(SplitError::Encode(format!(
                "輸出檔案未建立: {}",
                self.output_path.display()
            )));
        }

        Ok(())
    }
}
