//! 場景匯出元件
//!
//! 依已登錄的場景列表逐段重新編碼，打包成單一壓縮檔

mod clip_command;
mod main;
mod packager;

pub use clip_command::{ClipExportCommand, MIN_CLIP_SPAN};
pub use main::{ClipResult, ExportOutcome, SceneExporter, export_scenes};
pub use packager::package;
