use crate::error::Result;
use crate::models::{BasicInfo, YearResults};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedAthlete {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_info: Option<BasicInfo>,
    #[serde(default)]
    pub years: BTreeMap<i32, YearResults>,
}

/// Athlete id -> cached entry
pub type CacheSnapshot = HashMap<String, CachedAthlete>;

/// Durable storage for the athlete cache
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn load(&self) -> Result<CacheSnapshot>;
    async fn save(&self, snapshot: &CacheSnapshot) -> Result<()>;
}

/// JSON file on disk. A missing file loads as an empty cache.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CacheStore for JsonFileStore {
    async fn load(&self) -> Result<CacheSnapshot> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No cache file at {}, starting empty", self.path.display());
                Ok(CacheSnapshot::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, snapshot: &CacheSnapshot) -> Result<()> {
        let raw = serde_json::to_string(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, raw).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Process-local store, used when no cache file is configured
#[derive(Default)]
pub struct MemoryStore {
    snapshot: Mutex<CacheSnapshot>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn load(&self) -> Result<CacheSnapshot> {
        Ok(self.snapshot.lock().await.clone())
    }

    async fn save(&self, snapshot: &CacheSnapshot) -> Result<()> {
        *self.snapshot.lock().await = snapshot.clone();
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Read-through athlete cache shared by all requests.
///
/// Entries are never invalidated for the life of the process. Two requests
/// touching the same athlete for the first time may both fetch it; the first
/// write wins and both values are equivalent.
#[derive(Clone)]
pub struct AthleteCache {
    inner: Arc<RwLock<CacheSnapshot>>,
    store: Arc<dyn CacheStore>,
}

impl AthleteCache {
    pub async fn load(store: Arc<dyn CacheStore>) -> Result<Self> {
        let snapshot = store.load().await?;
        Ok(Self {
            inner: Arc::new(RwLock::new(snapshot)),
            store,
        })
    }

    pub async fn basic_info(&self, id: &str) -> Option<BasicInfo> {
        let cache = self.inner.read().await;
        cache.get(id).and_then(|a| a.basic_info.clone())
    }

    pub async fn insert_basic_info(&self, id: &str, info: BasicInfo) {
        let mut cache = self.inner.write().await;
        cache
            .entry(id.to_string())
            .or_default()
            .basic_info
            .get_or_insert(info);
    }

    /// Returns a copy; callers may merge into it freely.
    pub async fn year(&self, id: &str, year: i32) -> Option<YearResults> {
        let cache = self.inner.read().await;
        cache.get(id).and_then(|a| a.years.get(&year).cloned())
    }

    pub async fn insert_year(&self, id: &str, year: i32, results: YearResults) {
        let mut cache = self.inner.write().await;
        cache
            .entry(id.to_string())
            .or_default()
            .years
            .entry(year)
            .or_insert(results);
    }

    /// Writes the whole cache to the backing store. Concurrent calls are not
    /// coordinated; the last write wins.
    pub async fn persist(&self) -> Result<()> {
        let snapshot = self.inner.read().await.clone();
        self.store.save(&snapshot).await?;
        info!("Persisted athlete cache ({} entries)", snapshot.len());
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
