use std::path::Path;
use sysinfo::Disks;

/// 匯出前的磁碟空間檢查
///
/// 以掛載點最長前綴比對找出路徑所在的磁碟
pub struct DiskMonitor {
    disks: Disks,
}

impl DiskMonitor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            disks: Disks::new_with_refreshed_list(),
        }
    }

    pub fn refresh(&mut self) {
        self.disks.refresh(true);
    }

    /// 回傳路徑所在磁碟的可用空間；找不到對應磁碟時回傳 `None`
    pub fn available_space(&mut self, path: &Path) -> Option<u64> {
        self.refresh();
        self.disks
            .iter()
            .filter(|disk| path.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .map(sysinfo::Disk::available_space)
    }

    /// 檢查是否有足夠空間容納約 `required` bytes 的輸出
    ///
    /// 查不到磁碟資訊時不阻擋操作
    pub fn has_space_for(&mut self, path: &Path, required: u64) -> bool {
        self.available_space(path)
            .is_none_or(|available| available >= required)
    }
}

impl Default for DiskMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_space_for_root() {
        let mut monitor = DiskMonitor::new();
        // 根目錄一定屬於某個磁碟（CI 環境亦然）
        if let Some(space) = monitor.available_space(Path::new("/")) {
            assert!(space > 0);
        }
    }

    #[test]
    fn test_zero_requirement_always_fits() {
        let mut monitor = DiskMonitor::new();
        assert!(monitor.has_space_for(Path::new("/"), 0));
    }
}
