//! Blob storage seam: where uploads are read from and resized copies go.
//!
//! The handler never talks to a concrete storage service. It depends on two
//! small traits:
//!
//! * [`BlobSource`] — read an uploaded object by path, list a prefix
//! * [`BlobSink`]   — write a whole object at a computed path
//!
//! Two implementations ship with the crate: [`FsBlobStore`] maps object paths
//! onto a local directory tree, and [`MemoryBlobStore`] keeps everything in a
//! map for tests and embedding. A cloud adapter implements the same traits.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::UNIX_EPOCH;
use tracing::debug;

/// Name prefix of the temp files [`FsBlobStore`] writes before renaming.
pub const FS_TEMP_PREFIX: &str = ".medium-resize-partial-";

/// One object returned by [`BlobSource::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedObject {
    pub path: String,
    /// Opaque token that changes whenever the object's content is replaced.
    pub version: String,
}

/// Read side of a blob store.
#[async_trait]
pub trait BlobSource: Send + Sync {
    /// Full contents of the object at `path`, or `None` if it does not exist.
    async fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>>;

    /// Objects directly under `prefix`, sorted by path.
    async fn list(&self, prefix: &str) -> io::Result<Vec<ListedObject>>;
}

/// Write side of a blob store.
///
/// Implementations must make the write all-or-nothing: after an `Err`, no
/// partial object may be visible at `path`.
#[async_trait]
pub trait BlobSink: Send + Sync {
    async fn write(&self, path: &str, bytes: &[u8]) -> io::Result<()>;
}

// ── Local filesystem ─────────────────────────────────────────────────────

/// Object store backed by a directory. Object `a/b.png` lives at `root/a/b.png`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map an object path to a file path, refusing anything that would escape `root`.
    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let rel = Path::new(path.trim_start_matches('/'));
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("object path '{path}' escapes the store root"),
            ));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl BlobSource for FsBlobStore {
    async fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        let file = self.resolve(path)?;
        match tokio::fs::read(&file).await {
            Ok(bytes) => {
                debug!("Read {} bytes from {}", bytes.len(), file.display());
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list(&self, prefix: &str) -> io::Result<Vec<ListedObject>> {
        // `prefix` is a directory when it ends in '/', otherwise a directory
        // plus a leading file-name fragment.
        let (dir_part, name_part) = match prefix.rfind('/') {
            Some(i) => (&prefix[..=i], &prefix[i + 1..]),
            None => ("", prefix),
        };
        let dir = self.resolve(dir_part)?;

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut objects = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if file_name.starts_with(FS_TEMP_PREFIX) || !file_name.starts_with(name_part) {
                continue;
            }
            let meta = entry.metadata().await?;
            let modified = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_nanos())
                .unwrap_or_default();
            objects.push(ListedObject {
                path: format!("{dir_part}{file_name}"),
                version: format!("{}:{}", meta.len(), modified),
            });
        }
        objects.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(objects)
    }
}

#[async_trait]
impl BlobSink for FsBlobStore {
    /// Atomic write: temp file in the destination directory, then rename.
    async fn write(&self, path: &str, bytes: &[u8]) -> io::Result<()> {
        let file = self.resolve(path)?;
        let parent = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        tokio::fs::create_dir_all(&parent).await?;

        let bytes = bytes.to_vec();
        let target = file.clone();
        // tempfile is blocking; keep it off the async workers.
        tokio::task::spawn_blocking(move || -> io::Result<()> {
            use std::io::Write;
            let mut tmp = tempfile::Builder::new()
                .prefix(FS_TEMP_PREFIX)
                .tempfile_in(&parent)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| io::Error::other(format!("write task panicked: {e}")))??;

        debug!("Wrote {}", file.display());
        Ok(())
    }
}

// ── In-memory ────────────────────────────────────────────────────────────

#[derive(Debug)]
struct MemoryObject {
    bytes: Vec<u8>,
    version: u64,
}

/// Object store held in memory. Every insert gets a fresh version number.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<BTreeMap<String, MemoryObject>>,
    next_version: AtomicU64,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object.
    pub fn insert(&self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let version = self.next_version.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(
            path.into(),
            MemoryObject {
                bytes: bytes.into(),
                version,
            },
        );
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().get(path).map(|o| o.bytes.clone())
    }

    pub fn remove(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().remove(path).map(|o| o.bytes)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, MemoryObject>> {
        // A poisoned map is still structurally valid.
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl BlobSource for MemoryBlobStore {
    async fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.get(path))
    }

    async fn list(&self, prefix: &str) -> io::Result<Vec<ListedObject>> {
        Ok(self
            .lock()
            .iter()
            .filter(|(k, _)| k.starts_with(prefix) && !k[prefix.len()..].contains('/'))
            .map(|(k, o)| ListedObject {
                path: k.clone(),
                version: o.version.to_string(),
            })
            .collect())
    }
}

#[async_trait]
impl BlobSink for MemoryBlobStore {
    async fn write(&self, path: &str, bytes: &[u8]) -> io::Result<()> {
        self.insert(path, bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(objects: Vec<ListedObject>) -> Vec<String> {
        objects.into_iter().map(|o| o.path).collect()
    }

    #[tokio::test]
    async fn fs_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        store.write("out/deep/a.png", b"abc").await.unwrap();
        assert_eq!(store.read("out/deep/a.png").await.unwrap().as_deref(), Some(&b"abc"[..]));
        assert!(dir.path().join("out/deep/a.png").is_file());
    }

    #[tokio::test]
    async fn fs_missing_object_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        assert_eq!(store.read("nope.png").await.unwrap(), None);
    }

    #[tokio::test]
    async fn fs_write_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        store.write("a", b"first").await.unwrap();
        store.write("a", b"second").await.unwrap();
        assert_eq!(store.read("a").await.unwrap().unwrap(), b"second");
    }

    #[tokio::test]
    async fn fs_list_is_sorted_and_non_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        store.write("in/b.png", b"1").await.unwrap();
        store.write("in/a.png", b"2").await.unwrap();
        store.write("in/sub/c.png", b"3").await.unwrap();
        store.write("other/d.png", b"4").await.unwrap();
        assert_eq!(
            paths(store.list("in/").await.unwrap()),
            vec!["in/a.png".to_string(), "in/b.png".to_string()]
        );
        assert_eq!(paths(store.list("in/b").await.unwrap()), vec!["in/b.png".to_string()]);
        assert!(store.list("missing/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fs_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        let err = store.write("../evil.png", b"x").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(store.read("a/../../evil").await.is_err());
    }

    #[tokio::test]
    async fn memory_list_filters_prefix() {
        let store = MemoryBlobStore::new();
        store.insert("in/a", b"1".to_vec());
        store.insert("in/nested/b", b"2".to_vec());
        store.insert("out/c", b"3".to_vec());
        assert_eq!(paths(store.list("in/").await.unwrap()), vec!["in/a".to_string()]);
        store.write("out/d", b"4").await.unwrap();
        assert_eq!(store.len(), 4);
        assert_eq!(store.read("out/d").await.unwrap().unwrap(), b"4");
    }

    #[tokio::test]
    async fn fs_lists_dot_tmp_uploads_but_not_partial_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        store.write("in/.tmp-scan.png", b"1").await.unwrap();
        std::fs::write(dir.path().join(format!("in/{FS_TEMP_PREFIX}abc")), b"2").unwrap();
        assert_eq!(
            paths(store.list("in/").await.unwrap()),
            vec!["in/.tmp-scan.png".to_string()]
        );
    }

    #[tokio::test]
    async fn fs_version_changes_on_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        store.write("in/a", b"short").await.unwrap();
        let before = store.list("in/").await.unwrap();
        store.write("in/a", b"a longer body").await.unwrap();
        let after = store.list("in/").await.unwrap();
        assert_eq!(before[0].path, after[0].path);
        assert_ne!(before[0].version, after[0].version);
    }

    #[tokio::test]
    async fn memory_version_changes_on_overwrite() {
        let store = MemoryBlobStore::new();
        store.insert("in/a", b"1".to_vec());
        let before = store.list("in/").await.unwrap();
        store.insert("in/a", b"1".to_vec());
        let after = store.list("in/").await.unwrap();
        assert_ne!(before[0].version, after[0].version);
        assert_eq!(store.remove("in/a").as_deref(), Some(&b"1"[..]));
        assert!(store.list("in/").await.unwrap().is_empty());
    }
}
