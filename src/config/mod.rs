pub mod load;
pub mod save;
pub mod types;

pub use types::{
    Config, DetectionSettings, FileTypeTable, Language, MAX_RECENT_PATHS, ThumbnailSettings,
    UserSettings,
};
