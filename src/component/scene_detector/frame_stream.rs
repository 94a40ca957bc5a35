use crate::error::SplitError;
use crate::tools::VideoInfo;
use log::{debug, warn};
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 解碼後的單張畫格（RGB24，緊密排列）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// 循序畫格串流
///
/// 由 ffmpeg 以 rawvideo 管線輸出 RGB24 畫格，逐張讀取，
/// 記憶體用量與影片長度無關。單趟、不可重複迭代；
/// 重新掃描需重新開啟。縮小解析度只影響解碼成本，
/// 時間戳記一律以原始幀率計算（第 n 張為 n / fps）
pub struct FrameStream {
    child: Child,
    stdout: BufReader<ChildStdout>,
    frame_rate: f64,
    width: u32,
    height: u32,
    frame_index: u64,
    finished: bool,
    shutdown_signal: Arc<AtomicBool>,
}

/// 計算縮小後的輸出尺寸（維持長寬比、取偶數、不放大）
fn scaled_dimensions(src_width: u32, src_height: u32, scale_width: u32) -> (u32, u32) {
    let even = |v: u32| (v.max(2) / 2) * 2;
    if src_width <= scale_width {
        return (even(src_width), even(src_height));
    }
    let height = (f64::from(src_height) * f64::from(scale_width) / f64::from(src_width)).round();
    (even(scale_width), even(height as u32))
}

impl FrameStream {
    pub fn open(
        path: &Path,
        info: &VideoInfo,
        scale_width: u32,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Result<Self, SplitError> {
        let (width, height) = scaled_dimensions(info.width, info.height, scale_width);
        let filter = format!("scale={width}:{height}");

        debug!(
            "開啟畫格串流: {} ({}x{} -> {}x{}, {:.3} fps)",
            path.display(),
            info.width,
            info.height,
            width,
            height,
            info.frame_rate
        );

        let mut child = Command::new("ffmpeg")
            .args(["-hide_banner", "-nostdin", "-loglevel", "error", "-i"])
            .arg(path)
            .args([
                "-an", "-sn", "-dn", "-threads", "1", "-vf", &filter, "-pix_fmt", "rgb24", "-f",
                "rawvideo", "-",
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SplitError::UnreadableMedia {
                path: path.to_path_buf(),
                reason: format!("無法執行 ffmpeg: {e}"),
            })?;

        let stdout = child.stdout.take().ok_or_else(|| SplitError::UnreadableMedia {
            path: path.to_path_buf(),
            reason: "無法取得 ffmpeg 輸出管線".to_string(),
        })?;

        Ok(Self {
            child,
            stdout: BufReader::new(stdout),
            frame_rate: info.frame_rate,
            width,
            height,
            frame_index: 0,
            finished: false,
            shutdown_signal,
        })
    }

    #[must_use]
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// 已讀出的畫格數
    #[must_use]
    pub fn frames_read(&self) -> u64 {
        self.frame_index
    }

    fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// 讀取下一張畫格；串流結束回傳 `Ok(None)`
    pub fn next_frame(&mut self) -> Result<Option<(f64, Frame)>, SplitError> {
        if self.finished {
            return Ok(None);
        }
        if self.shutdown_signal.load(Ordering::SeqCst) {
            self.finished = true;
            return Err(SplitError::Cancelled);
        }

        let mut data = vec![0u8; self.frame_size()];
        match read_exact_or_eof(&mut self.stdout, &mut data)? {
            ReadOutcome::Full => {}
            ReadOutcome::CleanEof => {
                self.finished = true;
                self.reap_child()?;
                return Ok(None);
            }
            ReadOutcome::Truncated(read) => {
                self.finished = true;
                return Err(SplitError::FrameDecode {
                    timestamp: self.frame_index as f64 / self.frame_rate,
                    reason: format!("畫格資料不完整 ({read}/{} bytes)", self.frame_size()),
                });
            }
        }

        let timestamp = self.frame_index as f64 / self.frame_rate;
        self.frame_index += 1;

        Ok(Some((
            timestamp,
            Frame {
                width: self.width,
                height: self.height,
                data,
            },
        )))
    }

    /// 串流結束後回收子程序並檢查結束狀態
    fn reap_child(&mut self) -> Result<(), SplitError> {
        let status = self.child.wait()?;
        if !status.success() && self.frame_index == 0 {
            // 一張都沒解出來就結束，視為媒體本身無法解碼
            return Err(SplitError::FrameDecode {
                timestamp: 0.0,
                reason: format!("ffmpeg 異常結束 (結束碼 {:?})", status.code()),
            });
        }
        if !status.success() {
            warn!(
                "ffmpeg 於 {} 張畫格後以非零結束碼收尾 ({:?})",
                self.frame_index,
                status.code()
            );
        }
        Ok(())
    }
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        // 提前放棄迭代時不可留下殭屍 ffmpeg
        if !self.finished {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

enum ReadOutcome {
    Full,
    CleanEof,
    Truncated(usize),
}

/// 讀滿整個緩衝區；在畫格邊界遇到 EOF 視為正常結束
fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<ReadOutcome, SplitError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Ok(if filled == 0 {
                    ReadOutcome::CleanEof
                } else {
                    ReadOutcome::Truncated(filled)
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(SplitError::Io(e)),
        }
    }
    Ok(ReadOutcome::Full)
}
