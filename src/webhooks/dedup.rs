use crate::gateways::ProviderId;
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::Mutex;

pub type DedupKey = (ProviderId, String);

#[async_trait]
pub trait DedupStore: Send + Sync {
    async fn try_mark(&self, key: &DedupKey) -> bool;

    async fn unmark(&self, key: &DedupKey);
}

pub struct InMemoryDedupStore {
    seen: Mutex<HashSet<DedupKey>>,
}

impl InMemoryDedupStore {
    pub fn new() -> Self {
        Self {
            seen: Mutex::new(HashSet::new()),
        }
    }
}

impl Default for InMemoryDedupStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DedupStore for InMemoryDedupStore {
    async fn try_mark(&self, key: &DedupKey) -> bool {
        self.seen.lock().await.insert(key.clone())
    }

    async fn unmark(&self, key: &DedupKey) {
        self.seen.lock().await.remove(key);
    }
}
