//! In-memory ordered store for tests and single-process embedding.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::RwLock;

use crate::kv::{KeyRange, KvResult, OrderedKv};

/// In-memory ordered key-value store.
///
/// The reference implementation of [`OrderedKv`]: a `BTreeMap` behind an
/// async lock, with snapshot-then-stream scans. Bindings to physical
/// engines live outside this workspace.
#[derive(Debug, Default, Clone)]
pub struct MemoryKv {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryKv {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    /// True when no keys are stored.
    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

#[async_trait]
impl OrderedKv for MemoryKv {
    async fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> KvResult<()> {
        self.data.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> KvResult<()> {
        self.data.write().await.remove(key);
        Ok(())
    }

    async fn delete_batch(&self, keys: &[String]) -> KvResult<()> {
        let mut data = self.data.write().await;
        for key in keys {
            data.remove(key);
        }
        Ok(())
    }

    fn scan(&self, range: KeyRange) -> BoxStream<'_, KvResult<(String, Vec<u8>)>> {
        let data = Arc::clone(&self.data);
        stream::once(async move {
            // Bounds are exclusive on both ends; an inverted or empty range
            // scans nothing rather than panicking in BTreeMap::range.
            let snapshot: Vec<(String, Vec<u8>)> = match range.lt {
                Some(ref lt) if *lt <= range.gt => Vec::new(),
                Some(lt) => data
                    .read()
                    .await
                    .range::<String, _>((Bound::Excluded(range.gt), Bound::Excluded(lt)))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
                None => data
                    .read()
                    .await
                    .range::<String, _>((Bound::Excluded(range.gt), Bound::Unbounded))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            };
            stream::iter(snapshot.into_iter().map(Ok))
        })
        .flatten()
        .boxed()
    }
}
