//! HashMap-backed CacheClient for tests. TTLs are ignored.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::services::cache::client::{CacheClient, CacheError, CacheResult};

#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, String>>>,
    // When set, every call fails like an unreachable backend.
    broken: bool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    fn check(&self) -> CacheResult<()> {
        if self.broken {
            return Err(CacheError::BackendConnection("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheClient for MemoryCache {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        self.check()?;
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set_with_ttl(&self, key: &str, value: &str, _ttl: Duration) -> CacheResult<()> {
        self.check()?;
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<u64> {
        self.check()?;
        Ok(self.entries.lock().unwrap().remove(key).map_or(0, |_| 1))
    }
}
