//! In-memory collaborators for unit tests.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::artifacts::{ArtifactBody, ArtifactStore};
use crate::db::{BannedFingerprint, BannedIdentity, MaintenanceConfig};
use crate::security::{BanKind, ChallengeVerifier};
use crate::storage::{BanList, Storage, StorageError};

#[derive(Default)]
struct MemoryState {
    identities: HashMap<String, i64>,
    fingerprints: HashMap<String, i64>,
    maintenance: MaintenanceConfig,
    counters: BTreeMap<String, i64>,
}

/// [`Storage`] double that counts every call and can be told to fail.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    ops: AtomicUsize,
    fail_counter_writes: AtomicBool,
    fail_all: AtomicBool,
}

impl MemoryStore {
    /// Number of storage calls made so far.
    pub fn ops(&self) -> usize {
        self.ops.load(Ordering::SeqCst)
    }

    pub fn fail_counter_writes(&self, fail: bool) {
        self.fail_counter_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn counter(&self, id: &str) -> Option<i64> {
        self.state.lock().counters.get(id).copied()
    }

    pub fn set_counter(&self, id: &str, value: i64) {
        self.state.lock().counters.insert(id.to_string(), value);
    }

    fn enter(&self) -> Result<(), StorageError> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

fn newest_first<T>(rows: &HashMap<String, i64>, build: impl Fn(String, i64) -> T) -> Vec<T> {
    let mut sorted: Vec<(&String, &i64)> = rows.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    sorted
        .into_iter()
        .map(|(k, v)| build(k.clone(), *v))
        .collect()
}

#[async_trait]
impl Storage for MemoryStore {
    async fn is_identity_banned(&self, id: &str) -> Result<bool, StorageError> {
        self.enter()?;
        Ok(self.state.lock().identities.contains_key(id))
    }

    async fn is_fingerprint_banned(&self, fp: &str) -> Result<bool, StorageError> {
        self.enter()?;
        Ok(self.state.lock().fingerprints.contains_key(fp))
    }

    async fn ban_identity(&self, id: &str, banned_at: i64) -> Result<bool, StorageError> {
        self.enter()?;
        let mut state = self.state.lock();
        if state.identities.contains_key(id) {
            return Ok(false);
        }
        state.identities.insert(id.to_string(), banned_at);
        Ok(true)
    }

    async fn ban_fingerprint(&self, fp: &str, banned_at: i64) -> Result<(), StorageError> {
        self.enter()?;
        self.state
            .lock()
            .fingerprints
            .insert(fp.to_string(), banned_at);
        Ok(())
    }

    async fn remove_ban(&self, kind: BanKind, value: &str) -> Result<u64, StorageError> {
        self.enter()?;
        let mut state = self.state.lock();
        let removed = match kind {
            BanKind::Identity => state.identities.remove(value),
            BanKind::Fingerprint => state.fingerprints.remove(value),
        };
        Ok(u64::from(removed.is_some()))
    }

    async fn remove_blank_identity_bans(&self) -> Result<u64, StorageError> {
        self.enter()?;
        let mut state = self.state.lock();
        let before = state.identities.len();
        state.identities.retain(|id, _| !id.trim().is_empty());
        Ok((before - state.identities.len()) as u64)
    }

    async fn list_bans(&self) -> Result<BanList, StorageError> {
        self.enter()?;
        let state = self.state.lock();
        Ok(BanList {
            identities: newest_first(&state.identities, |id, banned_at| BannedIdentity {
                id,
                banned_at,
            }),
            fingerprints: newest_first(&state.fingerprints, |fingerprint, banned_at| {
                BannedFingerprint {
                    fingerprint,
                    banned_at,
                }
            }),
        })
    }

    async fn maintenance(&self) -> Result<MaintenanceConfig, StorageError> {
        self.enter()?;
        Ok(self.state.lock().maintenance.clone())
    }

    async fn set_maintenance_enabled(&self, enabled: bool) -> Result<(), StorageError> {
        self.enter()?;
        self.state.lock().maintenance.enabled = enabled;
        Ok(())
    }

    async fn set_maintenance_html(&self, html: &str) -> Result<(), StorageError> {
        self.enter()?;
        self.state.lock().maintenance.page_html = html.to_string();
        Ok(())
    }

    async fn seed_counters(&self, ids: &[String]) -> Result<(), StorageError> {
        self.enter()?;
        let mut state = self.state.lock();
        for id in ids {
            state.counters.entry(id.clone()).or_insert(0);
        }
        Ok(())
    }

    async fn increment_downloads(&self, id: &str) -> Result<bool, StorageError> {
        self.enter()?;
        if self.fail_counter_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("counter write refused".to_string()));
        }
        match self.state.lock().counters.get_mut(id) {
            Some(count) => {
                *count += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn download_counts(&self) -> Result<Vec<(String, i64)>, StorageError> {
        self.enter()?;
        Ok(self
            .state
            .lock()
            .counters
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect())
    }
}

/// Challenge verifier with a fixed answer.
pub struct StubVerifier {
    answer: bool,
    calls: AtomicUsize,
}

impl StubVerifier {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChallengeVerifier for StubVerifier {
    async fn verify(&self, _token: &str, _remote: Option<IpAddr>) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

/// Artifact store backed by a map of byte blobs.
#[derive(Default)]
pub struct MemoryArtifacts {
    files: Mutex<HashMap<String, Bytes>>,
    opens: AtomicUsize,
    fail_opens: AtomicBool,
    fail_mid_stream: AtomicBool,
}

impl MemoryArtifacts {
    pub fn insert(&self, id: &str, data: &'static [u8]) {
        self.files
            .lock()
            .insert(id.to_string(), Bytes::from_static(data));
    }

    pub fn remove(&self, id: &str) {
        self.files.lock().remove(id);
    }

    pub fn fail_opens(&self, fail: bool) {
        self.fail_opens.store(fail, Ordering::SeqCst);
    }

    /// Yield the first half of each file, then an I/O error.
    pub fn fail_mid_stream(&self, fail: bool) {
        self.fail_mid_stream.store(fail, Ordering::SeqCst);
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifacts {
    async fn exists(&self, id: &str) -> bool {
        self.files.lock().contains_key(id)
    }

    async fn open(&self, id: &str) -> io::Result<ArtifactBody> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_opens.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "injected stream failure"));
        }
        let data = self
            .files
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        let len = Some(data.len() as u64);
        if self.fail_mid_stream.load(Ordering::SeqCst) {
            let head = data.slice(..data.len() / 2);
            let chunks = vec![
                Ok(head),
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "injected mid-stream failure")),
            ];
            return Ok(ArtifactBody {
                len,
                stream: Box::pin(futures_util::stream::iter(chunks)),
            });
        }
        Ok(ArtifactBody {
            len,
            stream: Box::pin(futures_util::stream::once(async move { Ok(data) })),
        })
    }
}
