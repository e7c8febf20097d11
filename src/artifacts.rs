//! Artifact storage.
//!
//! Artifacts are `<id>.zip` files in one directory. The configured id list is
//! the whole catalog; anything else is never looked up on disk.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

/// Boxed byte stream handed to the HTTP layer.
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// An opened artifact.
pub struct ArtifactBody {
    pub len: Option<u64>,
    pub stream: ByteStream,
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn exists(&self, id: &str) -> bool;

    async fn open(&self, id: &str) -> io::Result<ArtifactBody>;
}

/// File name for an artifact id.
pub fn file_name(id: &str) -> String {
    format!("{id}.zip")
}

/// Directory-backed artifact store.
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, id: &str) -> PathBuf {
        self.dir.join(file_name(id))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn exists(&self, id: &str) -> bool {
        match tokio::fs::metadata(self.path(id)).await {
            Ok(meta) => meta.is_file(),
            Err(_) => false,
        }
    }

    async fn open(&self, id: &str) -> io::Result<ArtifactBody> {
        let file = tokio::fs::File::open(self.path(id)).await?;
        let len = file.metadata().await.ok().map(|m| m.len());
        Ok(ArtifactBody {
            len,
            stream: Box::pin(ReaderStream::new(file)),
        })
    }
}

/// Create `<id>.zip` placeholders for configured artifacts that have no file.
///
/// Existing files are never touched. Returns how many were written.
pub async fn seed_placeholders(dir: &Path, ids: &[String]) -> io::Result<usize> {
    tokio::fs::create_dir_all(dir).await?;

    let mut written = 0;
    for id in ids {
        let path = dir.join(file_name(id));
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;
        match file {
            Ok(mut file) => {
                file.write_all(format!("Placeholder for {id}").as_bytes())
                    .await?;
                file.flush().await?;
                info!(artifact = %id, path = %path.display(), "Seeded placeholder artifact");
                written += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                warn!(artifact = %id, error = %e, "Failed to seed placeholder artifact");
                return Err(e);
            }
        }
    }
    Ok(written)
}

/// The fixed set of downloadable artifact ids.
#[derive(Debug, Clone)]
pub struct ArtifactCatalog {
    ids: Vec<String>,
    set: HashSet<String>,
}

impl ArtifactCatalog {
    pub fn new(ids: &[String]) -> Self {
        Self {
            ids: ids.to_vec(),
            set: ids.iter().cloned().collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.set.contains(id)
    }

    /// Ids in configuration order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}
