// src/store/file.rs
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::{fs, sync::Mutex};

use super::{SeenBackend, SeenRecord};

pub const DEFAULT_PATH: &str = "state/seen_listings.json";

type RecordMap = HashMap<String, SeenRecord>;

/// Seen-store kept in one JSON file (`{listing_id: record}`). Expired records
/// are dropped whenever the file is loaded or rewritten.
pub struct FileBackend {
    path: PathBuf,
    cache: Mutex<Option<RecordMap>>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<RecordMap> {
        let s = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(RecordMap::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()))
            }
        };
        if s.trim().is_empty() {
            return Ok(RecordMap::new());
        }
        let mut map: RecordMap = serde_json::from_str(&s)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        prune_expired(&mut map);
        Ok(map)
    }

    async fn write_file(&self, map: &RecordMap) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(map).context("serializing seen records")?;
        fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

fn prune_expired(map: &mut RecordMap) {
    let now = Utc::now();
    map.retain(|_, r| !r.is_expired(now));
}

#[async_trait::async_trait]
impl SeenBackend for FileBackend {
    async fn probe(&self) -> Result<()> {
        let map = self.read_file().await?;
        *self.cache.lock().await = Some(map);
        Ok(())
    }

    async fn get(&self, listing_id: &str) -> Result<Option<SeenRecord>> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.read_file().await?);
        }
        let now = Utc::now();
        Ok(cache
            .as_ref()
            .and_then(|m| m.get(listing_id))
            .filter(|r| !r.is_expired(now))
            .cloned())
    }

    async fn put(&self, record: &SeenRecord) -> Result<()> {
        let mut cache = self.cache.lock().await;
        let mut map = match cache.take() {
            Some(m) => m,
            None => self.read_file().await?,
        };
        map.insert(record.listing_id.clone(), record.clone());
        prune_expired(&mut map);
        let written = self.write_file(&map).await;
        if written.is_err() {
            map.remove(&record.listing_id);
        }
        *cache = Some(map);
        written
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
