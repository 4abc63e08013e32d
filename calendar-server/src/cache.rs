use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

pub struct Config {
    pub enabled: bool,
    pub ttl: Duration,
}

/// Time-bounded map of shared values.
///
/// Expired entries are ignored on read and replaced on the next insert.
pub struct Cache<K, V> {
    enabled: bool,
    inner: RwLock<HashMap<K, (Instant, Arc<V>)>>,
    ttl: Duration,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash,
{
    pub fn new(config: Config) -> Self {
        Self {
            enabled: config.enabled,
            ttl: config.ttl,
            inner: Default::default(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Config {
            enabled: false,
            ttl: Duration::ZERO,
        })
    }

    pub async fn insert(&self, key: K, value: V) -> Arc<V> {
        let arcd = Arc::new(value);
        if !self.enabled {
            return arcd;
        }

        let mut inner = self.inner.write().await;
        inner.retain(|_, (stored, _)| stored.elapsed() < self.ttl);
        inner.insert(key, (Instant::now(), Arc::clone(&arcd)));

        arcd
    }

    pub async fn get(&self, key: &K) -> Option<Arc<V>> {
        if !self.enabled {
            return None;
        }

        self.inner
            .read()
            .await
            .get(key)
            .filter(|(stored, _)| stored.elapsed() < self.ttl)
            .map(|(_, value)| Arc::clone(value))
    }
}
