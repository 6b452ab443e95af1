//! In-process document store with optimistic version checks.
//!
//! Used by tests and by single-node deployments. Cloning a `MemoryStore`
//! yields another handle onto the same data.

use super::{
    CollectionSnapshot, Commit, DocKey, Document, DocumentStore, Precondition, StoreError,
    StoreResult, Version, Write,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    documents: BTreeMap<DocKey, (Version, serde_json::Value)>,
    collections: HashMap<String, Version>,
    clock: Version,
}

impl State {
    fn check(&self, precondition: &Precondition) -> StoreResult<()> {
        match precondition {
            Precondition::Document { key, version } => {
                let current = self.documents.get(key).map(|(v, _)| *v);
                if current != *version {
                    return Err(StoreError::Conflict(key.to_string()));
                }
            }
            Precondition::Collection {
                collection,
                version,
            } => {
                let current = self.collections.get(collection).copied().unwrap_or(0);
                if current != *version {
                    return Err(StoreError::Conflict(collection.clone()));
                }
            }
        }
        Ok(())
    }
}

/// In-memory [`DocumentStore`]
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored documents
    pub async fn document_count(&self) -> usize {
        self.state.read().await.documents.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &DocKey) -> StoreResult<Option<Document>> {
        let state = self.state.read().await;
        Ok(state.documents.get(key).map(|(version, body)| Document {
            key: key.clone(),
            version: *version,
            body: body.clone(),
        }))
    }

    async fn list(&self, collection: &str) -> StoreResult<CollectionSnapshot> {
        let state = self.state.read().await;
        let start = DocKey::new(collection, "");
        let documents = state
            .documents
            .range(start..)
            .take_while(|(key, _)| key.collection == collection)
            .map(|(key, (version, body))| Document {
                key: key.clone(),
                version: *version,
                body: body.clone(),
            })
            .collect();

        Ok(CollectionSnapshot {
            collection: collection.to_string(),
            version: state.collections.get(collection).copied().unwrap_or(0),
            documents,
        })
    }

    async fn commit(&self, commit: Commit) -> StoreResult<()> {
        let mut state = self.state.write().await;

        for precondition in &commit.preconditions {
            state.check(precondition)?;
        }

        if commit.writes.is_empty() {
            return Ok(());
        }

        state.clock += 1;
        let version = state.clock;

        for write in commit.writes {
            let collection = write.key().collection.clone();
            match write {
                Write::Set { key, body } => {
                    state.documents.insert(key, (version, body));
                }
                Write::Delete { key } => {
                    state.documents.remove(&key);
                }
            }
            state.collections.insert(collection, version);
        }

        Ok(())
    }
}
