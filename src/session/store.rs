use crate::error::SplitError;
use crate::session::SceneIndex;
use crate::tools::VideoInfo;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tempfile::TempDir;
use uuid::Uuid;

const HASH_BUFFER_SIZE: usize = 4 * 1024 * 1024; // 4MB buffer
const HASH_PREFIX_LEN: usize = 16;

/// 影片識別碼
///
/// 上傳時鑄造：`<內容雜湊前 16 碼>-<uuid v4>`。
/// 雜湊前綴方便在日誌中對照相同內容，uuid 確保即使
/// 重複上傳同一份檔案也不會共用識別碼
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct VideoId(String);

impl VideoId {
    /// 為已存入的影片檔案鑄造識別碼
    pub fn mint(path: &Path) -> Result<Self, SplitError> {
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(HASH_BUFFER_SIZE, file);
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; HASH_BUFFER_SIZE];

        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        let digest = hasher.finalize().to_hex();
        let prefix = &digest.as_str()[..HASH_PREFIX_LEN];
        Ok(Self(format!("{prefix}-{}", Uuid::new_v4())))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VideoId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// 一次上傳的完整工作階段
///
/// 獨占持有來源檔案複本、場景列表與縮圖快取；
/// `workdir` 被回收時所有暫存檔一併清除
pub struct VideoSession {
    id: VideoId,
    original_name: String,
    source_path: PathBuf,
    info: VideoInfo,
    threshold: f64,
    scenes: SceneIndex,
    workdir: TempDir,
}

impl VideoSession {
    #[must_use]
    pub fn new(
        id: VideoId,
        original_name: String,
        source_path: PathBuf,
        info: VideoInfo,
        threshold: f64,
        scenes: SceneIndex,
        workdir: TempDir,
    ) -> Self {
        Self {
            id,
            original_name,
            source_path,
            info,
            threshold,
            scenes,
            workdir,
        }
    }

    #[must_use]
    pub fn id(&self) -> &VideoId {
        &self.id
    }

    #[must_use]
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    #[must_use]
    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub fn scenes(&self) -> &SceneIndex {
        &self.scenes
    }

    #[must_use]
    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }

    /// 指定場景的縮圖快取路徑
    #[must_use]
    pub fn thumbnail_path(&self, scene_index: usize) -> PathBuf {
        self.workdir.path().join(format!("thumb_{scene_index:03}.jpg"))
    }
}

/// 以 `VideoId` 為鍵的工作階段儲存
///
/// 不同識別碼的請求互不阻塞；同一識別碼的覆寫採 last-write-wins
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<VideoId, Arc<VideoSession>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 登錄工作階段，覆寫同識別碼的舊紀錄（舊紀錄的暫存隨之回收）
    pub fn register(&self, session: VideoSession) -> Arc<VideoSession> {
        let session = Arc::new(session);
        let mut sessions = self.sessions.write().expect("session store lock poisoned");
        sessions.insert(session.id().clone(), Arc::clone(&session));
        session
    }

    #[must_use]
    pub fn get(&self, id: &VideoId) -> Option<Arc<VideoSession>> {
        let sessions = self.sessions.read().expect("session store lock poisoned");
        sessions.get(id).cloned()
    }

    pub fn remove(&self, id: &VideoId) -> Option<Arc<VideoSession>> {
        let mut sessions = self.sessions.write().expect("session store lock poisoned");
        sessions.remove(id)
    }

    /// 目前所有工作階段，依原始檔名排序（選單顯示用）
    #[must_use]
    pub fn list(&self) -> Vec<Arc<VideoSession>> {
        let sessions = self.sessions.read().expect("session store lock poisoned");
        let mut list: Vec<_> = sessions.values().cloned().collect();
        list.sort_by(|a, b| a.original_name().cmp(b.original_name()));
        list
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().expect("session store lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SceneInterval;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn dummy_info() -> VideoInfo {
        VideoInfo {
            duration_seconds: 10.0,
            width: 320,
            height: 240,
            frame_rate: 25.0,
        }
    }

    fn dummy_session(name: &str) -> VideoSession {
        let workdir = tempfile::tempdir().unwrap();
        let source = workdir.path().join(name);
        std::fs::write(&source, b"not a real video").unwrap();
        let id = VideoId::mint(&source).unwrap();
        let scenes = SceneIndex::new(
            vec![SceneInterval {
                start: 0.0,
                end: 10.0,
            }],
            10.0,
        );
        VideoSession::new(id, name.to_string(), source, dummy_info(), 30.0, scenes, workdir)
    }

    #[test]
    fn test_mint_unique_for_identical_content() {
        let mut file1 = NamedTempFile::new().unwrap();
        let mut file2 = NamedTempFile::new().unwrap();
        file1.write_all(b"identical content").unwrap();
        file2.write_all(b"identical content").unwrap();

        let id1 = VideoId::mint(file1.path()).unwrap();
        let id2 = VideoId::mint(file2.path()).unwrap();

        // 內容相同 -> 雜湊前綴相同，但識別碼必須不同
        assert_eq!(
            id1.as_str()[..HASH_PREFIX_LEN],
            id2.as_str()[..HASH_PREFIX_LEN]
        );
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_register_and_get() {
        let store = SessionStore::new();
        let session = dummy_session("a.mp4");
        let id = session.id().clone();

        store.register(session);
        assert_eq!(store.len(), 1);

        let fetched = store.get(&id).unwrap();
        assert_eq!(fetched.original_name(), "a.mp4");
        assert!(store.get(&VideoId::from("deadbeef-unknown")).is_none());
    }

    #[test]
    fn test_remove_reclaims_entry() {
        let store = SessionStore::new();
        let session = dummy_session("b.mp4");
        let id = session.id().clone();
        store.register(session);

        assert!(store.remove(&id).is_some());
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_concurrent_access_distinct_ids() {
        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();

        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                let session = dummy_session(&format!("video_{i}.mp4"));
                let id = session.id().clone();
                store.register(session);
                assert!(store.get(&id).is_some());
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn test_workdir_cleanup_on_drop() {
        let store = SessionStore::new();
        let session = dummy_session("c.mp4");
        let id = session.id().clone();
        let workdir = session.workdir().to_path_buf();
        store.register(session);
        assert!(workdir.exists());

        drop(store.remove(&id));
        assert!(!workdir.exists());
    }
}
