//! 場景偵測元件
//!
//! 四階段流程：
//! A. 取得影片資訊（ffprobe）
//! B. 串流掃描畫格並計算相鄰差異分數
//! C. 依閾值切出場景邊界
//! D. 平行擷取各場景縮圖並登錄工作階段

mod content_detector;
mod frame_stream;
mod main;
mod thumbnail_extractor;

pub use content_detector::{ContentDetector, DEFAULT_THRESHOLD, DetectorConfig};
pub use frame_stream::{Frame, FrameStream};
pub use main::{SceneDetector, SceneSummary, UploadSummary, analyze_video, fetch_thumbnail};
pub use thumbnail_extractor::{
    DEFAULT_THUMBNAIL_OFFSET, THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH, ThumbnailResult, ThumbnailTask,
    create_scene_thumbnail_tasks, extract_thumbnail, extract_thumbnails_parallel,
    representative_timestamp,
};
