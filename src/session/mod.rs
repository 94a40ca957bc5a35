//! 影片工作階段模組
//!
//! 每次上傳對應一個 `VideoSession`：持有來源檔案、偵測結果與縮圖快取，
//! 並以 `VideoId` 作為跨請求查詢的唯一鍵

mod scene_index;
mod store;

pub use scene_index::{SceneIndex, SceneInterval, TIME_EPSILON};
pub use store::{SessionStore, VideoId, VideoSession};
