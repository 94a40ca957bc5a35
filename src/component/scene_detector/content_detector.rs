use super::frame_stream::Frame;
use crate::session::{SceneIndex, SceneInterval};
use log::debug;

/// 預設切換閾值（0-255 等效刻度）
pub const DEFAULT_THRESHOLD: f64 = 30.0;

/// 偵測設定
#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    /// 場景切換閾值，越低越敏感
    pub threshold: f64,
    /// 分析時縮小到的寬度（加速解碼，不影響時間精度）
    pub scale_width: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            scale_width: 320,
        }
    }
}

/// 掃描狀態機
enum ScanState {
    /// 目前畫格仍屬於進行中的場景
    InsideScene,
    /// 分數已跨過閾值，待在本畫格切出邊界
    BoundaryPending,
}

/// 內容差異式場景偵測器
///
/// 對相鄰畫格計算 HSV 色彩空間的逐像素平均絕對差（各通道 0-255），
/// 單次跨過閾值即視為切換，不做平滑或最短場景限制；
/// 相同輸入與閾值必然產生相同結果。
/// 邊界時間戳記由前後兩個場景共用，場景列表因此是
/// `[0, duration)` 的連續分割
pub struct ContentDetector {
    threshold: f64,
    frame_rate: f64,
    state: ScanState,
    prev_hsv: Option<Vec<u8>>,
    cuts: Vec<f64>,
    frames_seen: u64,
}

impl ContentDetector {
    #[must_use]
    pub fn new(threshold: f64, frame_rate: f64) -> Self {
        Self {
            threshold,
            frame_rate,
            state: ScanState::InsideScene,
            prev_hsv: None,
            cuts: Vec::new(),
            frames_seen: 0,
        }
    }

    /// 餵入下一張畫格
    pub fn process(&mut self, timestamp: f64, frame: &Frame) {
        let hsv = to_hsv(frame);

        if let Some(prev) = &self.prev_hsv {
            if prev.len() == hsv.len() {
                let score = mean_abs_diff(prev, &hsv);
                if score > self.threshold {
                    self.state = ScanState::BoundaryPending;
                    debug!("場景切換 @ {timestamp:.3}s (score {score:.1})");
                }
            }
        }

        if matches!(self.state, ScanState::BoundaryPending) {
            // 前一個場景在此結束，新場景同時開始
            self.cuts.push(timestamp);
            self.state = ScanState::InsideScene;
        }

        self.prev_hsv = Some(hsv);
        self.frames_seen += 1;
    }

    /// 串流結束，產出場景列表
    ///
    /// 最後一個場景收在最末畫格的結束時間（幀數 / 幀率）；
    /// 完全沒有切換點時整部影片就是單一場景；
    /// 不足一對可解碼畫格時產出單一近零長度場景，由匯出端夾限
    #[must_use]
    pub fn finish(self) -> SceneIndex {
        let end = if self.frames_seen == 0 {
            0.0
        } else {
            self.frames_seen as f64 / self.frame_rate
        };

        let mut points = Vec::with_capacity(self.cuts.len() + 2);
        points.push(0.0);
        points.extend(self.cuts);
        points.push(end);

        let intervals: Vec<SceneInterval> = points
            .windows(2)
            .map(|pair| SceneInterval {
                start: pair[0],
                end: pair[1],
            })
            .collect();

        debug!(
            "掃描完成: {} 張畫格, {} 個場景",
            self.frames_seen,
            intervals.len()
        );

        SceneIndex::new(intervals, end)
    }
}

/// RGB24 畫格轉 HSV（三通道皆縮放到 0-255）
fn to_hsv(frame: &Frame) -> Vec<u8> {
    let mut hsv = Vec::with_capacity(frame.data.len());
    for rgb in frame.data.chunks_exact(3) {
        let [h, s, v] = rgb_to_hsv(rgb[0], rgb[1], rgb[2]);
        hsv.push(h);
        hsv.push(s);
        hsv.push(v);
    }
    hsv
}

fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue_degrees = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let h = (hue_degrees / 360.0 * 255.0).round();
    let s = if max == 0.0 {
        0.0
    } else {
        (delta / max * 255.0).round()
    };

    [h as u8, s as u8, max as u8]
}

/// 兩個同長度緩衝區的平均絕對差
fn mean_abs_diff(a: &[u8], b: &[u8]) -> f64 {
    if a.is_empty() {
        return 0.0;
    }
    let sum: u64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| u64::from(x.abs_diff(y)))
        .sum();
    sum as f64 / a.len() as f64
}
