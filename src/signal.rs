use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 建立 Ctrl-C 中斷旗標
///
/// 畫格掃描、縮圖批次與匯出迴圈都會檢查這個旗標，
/// 收到中斷後盡快釋放 ffmpeg 子程序與暫存檔
#[must_use]
pub fn setup_shutdown_signal() -> Arc<AtomicBool> {
    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let signal_clone = Arc::clone(&shutdown_signal);

    ctrlc::set_handler(move || {
        signal_clone.store(true, Ordering::SeqCst);
        eprintln!("\n收到中斷信號，正在停止處理...");
    })
    .expect("無法設定 Ctrl-C 處理器");

    shutdown_signal
}
