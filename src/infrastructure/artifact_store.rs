//! 生成产物目录 - 基础设施层
//!
//! 每次写入后在后台清理超出保留数量的旧文件，清理失败只记日志。

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, warn};

const FILE_PREFIX: &str = "speech_";

/// 产物目录
#[derive(Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
    retention: usize,
    extension: String,
    seq: AtomicU64,
}

impl ArtifactStore {
    /// 创建产物目录
    ///
    /// # 参数
    /// - `dir`: 目录
    /// - `retention`: 保留的文件数量，至少为 1
    /// - `extension`: 文件扩展名（不含点）
    pub fn new(dir: impl Into<PathBuf>, retention: usize, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            retention: retention.max(1),
            extension: extension.into(),
            seq: AtomicU64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// 写入一个新产物，并在后台清理旧文件
    pub async fn save(&self, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.write(bytes).await?;

        let dir = self.dir.clone();
        let retention = self.retention;
        tokio::spawn(async move {
            if let Err(e) = prune_dir(&dir, retention).await {
                warn!("清理产物目录失败 ({}): {}", dir.display(), e);
            }
        });

        Ok(path)
    }

    /// 只写入，不触发清理
    pub async fn write(&self, bytes: &[u8]) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(self.next_file_name());
        fs::write(&path, bytes).await?;
        debug!("已写入产物: {} ({} 字节)", path.display(), bytes.len());
        Ok(path)
    }

    /// 删除超出保留数量的最旧文件，返回删除的数量
    pub async fn prune(&self) -> io::Result<usize> {
        prune_dir(&self.dir, self.retention).await
    }

    fn next_file_name(&self) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}{}_{:06}.{}",
            FILE_PREFIX,
            chrono::Local::now().format("%Y%m%d_%H%M%S%3f"),
            seq,
            self.extension
        )
    }
}

/// 文件名内含时间戳和序号，按名字排序即按新旧排序
async fn prune_dir(dir: &Path, retention: usize) -> io::Result<usize> {
    let mut names = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(FILE_PREFIX) {
            names.push(name);
        }
    }

    if names.len() <= retention {
        return Ok(0);
    }

    names.sort_unstable_by(|a, b| b.cmp(a));
    let mut removed = 0;
    for name in &names[retention..] {
        let path = dir.join(name);
        match fs::remove_file(&path).await {
            Ok(()) => removed += 1,
            Err(e) => warn!("删除旧产物失败 ({}): {}", path.display(), e),
        }
    }
    debug!("产物目录清理完成: 删除 {} 个文件", removed);
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prune_keeps_newest_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), 2, "mp3");

        let mut paths = Vec::new();
        for i in 0..5u8 {
            paths.push(store.write(&[i]).await.unwrap());
        }
        // 不相关的文件不受影响
        std::fs::write(dir.path().join("notes.txt"), b"keep").unwrap();

        let removed = store.prune().await.unwrap();
        assert_eq!(removed, 3);

        for old in &paths[..3] {
            assert!(!old.exists());
        }
        for newest in &paths[3..] {
            assert!(newest.exists());
        }
        assert!(dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_save_returns_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("audio_files"), 10, "mp3");

        let path = store.save(b"ID3").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"ID3");
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("_000000.mp3"));
    }

    #[tokio::test]
    async fn test_prune_under_retention_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), 3, "mp3");
        store.write(b"a").await.unwrap();
        assert_eq!(store.prune().await.unwrap(), 0);
    }
}
