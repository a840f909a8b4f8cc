// src/store/memory.rs
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use chrono::Utc;

use super::{SeenBackend, SeenRecord};

/// In-process seen-store. Keeps call counts and the write log so tests can
/// spy on what the pipeline did.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<HashMap<String, SeenRecord>>,
    writes: Mutex<Vec<String>>,
    unreachable: bool,
    failing_writes: bool,
    probes: AtomicUsize,
    gets: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call errors, including the probe.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Probe and reads succeed, writes error.
    pub fn failing_writes() -> Self {
        Self {
            failing_writes: true,
            ..Self::default()
        }
    }

    /// Pre-seed identifiers as already announced.
    pub fn with_seen<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        {
            let mut map = self.records.lock().expect("memory store mutex poisoned");
            let now = Utc::now();
            for id in ids {
                let id = id.as_ref();
                map.insert(
                    id.to_string(),
                    SeenRecord::new(id, now, chrono::Duration::days(super::DEFAULT_TTL_DAYS)),
                );
            }
        }
        self
    }

    pub fn probe_calls(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Identifiers passed to `put`, in call order (including failed writes).
    pub fn written_ids(&self) -> Vec<String> {
        self.writes.lock().expect("memory store mutex poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("memory store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl SeenBackend for MemoryBackend {
    async fn probe(&self) -> Result<()> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(anyhow!("memory store marked unreachable"));
        }
        Ok(())
    }

    async fn get(&self, listing_id: &str) -> Result<Option<SeenRecord>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(anyhow!("memory store marked unreachable"));
        }
        let map = self.records.lock().expect("memory store mutex poisoned");
        Ok(map.get(listing_id).cloned())
    }

    async fn put(&self, record: &SeenRecord) -> Result<()> {
        self.writes
            .lock()
            .expect("memory store mutex poisoned")
            .push(record.listing_id.clone());
        if self.unreachable || self.failing_writes {
            return Err(anyhow!("memory store rejected write"));
        }
        self.records
            .lock()
            .expect("memory store mutex poisoned")
            .insert(record.listing_id.clone(), record.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
