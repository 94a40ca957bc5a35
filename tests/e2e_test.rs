//! E2E 測試 - 上傳偵測到匯出打包的完整流程

use std::fs::File;
use std::io;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use scene_split::component::scene_detector::{DetectorConfig, analyze_video, fetch_thumbnail};
use scene_split::component::scene_exporter::export_scenes;
use scene_split::error::Category;
use scene_split::session::{SessionStore, VideoId};
use scene_split::tools::get_video_info;
use zip::ZipArchive;

fn ffmpeg_available() -> bool {
    Command::new("ffmpeg").arg("-version").output().is_ok()
        && Command::new("ffprobe").arg("-version").output().is_ok()
}

/// 產生前半黑、後半白的 10 秒測試影片（320x240, 25fps）
fn generate_two_tone_video(path: &Path) {
    let status = Command::new("ffmpeg")
        .args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "lavfi",
            "-i",
            "color=c=black:s=320x240:r=25:d=5",
            "-f",
            "lavfi",
            "-i",
            "color=c=white:s=320x240:r=25:d=5",
            "-filter_complex",
            "[0:v][1:v]concat=n=2:v=1:a=0",
            "-pix_fmt",
            "yuv420p",
            "-y",
        ])
        .arg(path)
        .status()
        .expect("無法執行 ffmpeg");
    assert!(status.success(), "測試影片生成失敗");
}

fn analyze_two_tone(store: &SessionStore, dir: &Path) -> (VideoId, usize) {
    let video_path = dir.join("two_tone.mp4");
    generate_two_tone_video(&video_path);

    let shutdown = Arc::new(AtomicBool::new(false));
    let summary = analyze_video(store, &video_path, &DetectorConfig::default(), 0.3, &shutdown)
        .unwrap();

    (VideoId::from(summary.video_id.as_str()), summary.scenes.len())
}

/// 測試 1: 完整流程 — 偵測、縮圖、匯出、打包
#[test]
fn test_full_pipeline() {
    if !ffmpeg_available() {
        println!("跳過測試：找不到 ffmpeg/ffprobe");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new();
    let video_path = dir.path().join("two_tone.mp4");
    generate_two_tone_video(&video_path);

    let shutdown = Arc::new(AtomicBool::new(false));
    let summary = analyze_video(&store, &video_path, &DetectorConfig::default(), 0.3, &shutdown)
        .unwrap();

    println!("偵測結果: {} 個場景", summary.scenes.len());
    assert_eq!(summary.scenes.len(), 2);

    // 回傳的時間已四捨五入到小數兩位
    let first = &summary.scenes[0];
    let second = &summary.scenes[1];
    assert!((first.start - 0.0).abs() < 1e-9);
    assert!((first.end - 5.0).abs() <= 0.2, "切點應該在 5 秒附近");
    assert!((second.start - first.end).abs() < 1e-9);
    assert!((second.end - 10.0).abs() <= 0.2);

    let id = VideoId::from(summary.video_id.as_str());

    // 每個場景都能取回 JPEG 縮圖
    for scene in &summary.scenes {
        let bytes = fetch_thumbnail(&store, &id, scene.index).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8], "縮圖應該是 JPEG");
    }

    // 匯出第一個場景
    let archive_path = dir.path().join("export.zip");
    let outcome = export_scenes(&store, &id, &[0], &archive_path, &shutdown).unwrap();
    assert_eq!(outcome.exported, 1);
    assert_eq!(outcome.failed, 0);
    assert!(outcome.skipped_invalid.is_empty());

    // 壓縮檔內恰好一個條目，名稱固定
    let mut archive = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
    assert_eq!(archive.len(), 1);
    assert_eq!(archive.by_index(0).unwrap().name(), "scene_1.mp4");

    // 取出剪輯驗證長度約 5 秒
    let clip_path = dir.path().join("clip_check.mp4");
    {
        let mut entry = archive.by_index(0).unwrap();
        let mut out = File::create(&clip_path).unwrap();
        io::copy(&mut entry, &mut out).unwrap();
    }
    let clip_info = get_video_info(&clip_path).unwrap();
    println!("剪輯長度: {:.2}s", clip_info.duration_seconds);
    assert!(
        (clip_info.duration_seconds - 5.0).abs() <= 0.2,
        "剪輯長度應該接近 5 秒"
    );
}

/// 測試 2: 空選取產生零條目的壓縮檔，不是錯誤
#[test]
fn test_export_empty_selection() {
    if !ffmpeg_available() {
        println!("跳過測試：找不到 ffmpeg/ffprobe");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new();
    let (id, _) = analyze_two_tone(&store, dir.path());

    let shutdown = Arc::new(AtomicBool::new(false));
    let archive_path = dir.path().join("empty.zip");
    let outcome = export_scenes(&store, &id, &[], &archive_path, &shutdown).unwrap();

    assert_eq!(outcome.exported, 0);
    let archive = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
    assert_eq!(archive.len(), 0);
}

/// 測試 3: 超出範圍的場景編號被略過，其餘照常匯出
#[test]
fn test_export_out_of_range_skipped() {
    if !ffmpeg_available() {
        println!("跳過測試：找不到 ffmpeg/ffprobe");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new();
    let (id, scene_count) = analyze_two_tone(&store, dir.path());
    assert_eq!(scene_count, 2);

    let shutdown = Arc::new(AtomicBool::new(false));
    let archive_path = dir.path().join("partial.zip");
    let outcome = export_scenes(&store, &id, &[7, 1], &archive_path, &shutdown).unwrap();

    assert_eq!(outcome.skipped_invalid, vec![7]);
    assert_eq!(outcome.exported, 1);

    let mut archive = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
    assert_eq!(archive.len(), 1);
    assert_eq!(archive.by_index(0).unwrap().name(), "scene_1.mp4");
}

/// 測試 4: 重複偵測同一部影片會取得不同識別碼
#[test]
fn test_reanalyze_mints_fresh_identity() {
    if !ffmpeg_available() {
        println!("跳過測試：找不到 ffmpeg/ffprobe");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new();

    let (id1, _) = analyze_two_tone(&store, dir.path());
    let (id2, _) = analyze_two_tone(&store, dir.path());

    assert_ne!(id1, id2, "兩次上傳不得共用識別碼");
    assert!(store.get(&id1).is_some());
    assert!(store.get(&id2).is_some());
}

/// 測試 5: 未知識別碼的查詢與匯出都回報 NotFound
#[test]
fn test_unknown_identity_not_found() {
    let store = SessionStore::new();
    let unknown = VideoId::from("deadbeefdeadbeef-unknown");

    let err = fetch_thumbnail(&store, &unknown, 0).unwrap_err();
    assert_eq!(err.category(), Category::NotFound);

    let dir = tempfile::tempdir().unwrap();
    let shutdown = Arc::new(AtomicBool::new(false));
    let err = export_scenes(
        &store,
        &unknown,
        &[0],
        &dir.path().join("out.zip"),
        &shutdown,
    )
    .unwrap_err();
    assert_eq!(err.category(), Category::NotFound);
}
