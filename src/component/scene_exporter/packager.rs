use crate::error::SplitError;
use log::{info, warn};
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// 將剪輯檔打包成單一壓縮檔
///
/// 依清單順序命名為 `scene_1.mp4`、`scene_2.mp4`…，
/// 內容以串流方式寫入（不會把整段剪輯讀進記憶體）；
/// 影片本身已壓縮，條目一律以 Stored 存放。
/// 空清單產生零條目的合法壓縮檔。
/// 任何中途失敗都會移除寫到一半的壓縮檔，不回傳殘缺輸出
pub fn package(clip_paths: &[PathBuf], archive_path: &Path) -> Result<(), SplitError> {
    match package_inner(clip_paths, archive_path) {
        Ok(()) => {
            info!(
                "壓縮檔已建立: {} ({} 個條目)",
                archive_path.display(),
                clip_paths.len()
            );
            Ok(())
        }
        Err(e) => {
            if archive_path.exists() && fs::remove_file(archive_path).is_err() {
                warn!("無法清除殘缺的壓縮檔: {}", archive_path.display());
            }
            Err(e)
        }
    }
}

fn package_inner(clip_paths: &[PathBuf], archive_path: &Path) -> Result<(), SplitError> {
    let file = File::create(archive_path)
        .map_err(|e| SplitError::Packaging(format!("無法建立壓縮檔: {e}")))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .large_file(true);

    for (position, clip_path) in clip_paths.iter().enumerate() {
        let entry_name = format!("scene_{}.mp4", position + 1);
        zip.start_file(entry_name.as_str(), options)
            .map_err(|e| SplitError::Packaging(format!("無法建立條目 {entry_name}: {e}")))?;

        let mut reader = File::open(clip_path)
            .map_err(|e| SplitError::Packaging(format!("無法讀取剪輯 {}: {e}", clip_path.display())))?;
        io::copy(&mut reader, &mut zip)
            .map_err(|e| SplitError::Packaging(format!("寫入條目 {entry_name} 失敗: {e}")))?;
    }

    zip.finish()
        .map_err(|e| SplitError::Packaging(format!("無法完成壓縮檔: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use zip::ZipArchive;

    #[test]
    fn test_package_names_entries_by_position() {
        let dir = tempdir().unwrap();
        let clip_a = dir.path().join("scene_1.mp4");
        let clip_b = dir.path().join("scene_2.mp4");
        fs::write(&clip_a, b"clip a bytes").unwrap();
        fs::write(&clip_b, b"clip b longer bytes").unwrap();

        let archive_path = dir.path().join("export.zip");
        package(&[clip_a, clip_b], &archive_path).unwrap();

        let mut archive = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.by_index(0).unwrap().name(), "scene_1.mp4");
        assert_eq!(archive.by_index(1).unwrap().name(), "scene_2.mp4");
        assert_eq!(archive.by_index(0).unwrap().size(), 12);
    }

    #[test]
    fn test_package_empty_selection() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("empty.zip");
        package(&[], &archive_path).unwrap();

        let archive = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn test_package_missing_clip_discards_archive() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("broken.zip");
        let missing = dir.path().join("missing.mp4");

        let err = package(&[missing], &archive_path).unwrap_err();
        assert!(matches!(err, SplitError::Packaging(_)));
        // 殘缺的壓縮檔必須被清掉
        assert!(!archive_path.exists());
    }
}
