//! 功能元件模組
//!
//! 每個子模組實現一個獨立的功能，包含主要邏輯和專用工具

pub mod scene_detector;
pub mod scene_exporter;

pub use scene_detector::SceneDetector;
pub use scene_exporter::SceneExporter;
