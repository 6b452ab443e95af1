//! Optimistic transactions and atomic batches over a [`DocumentStore`].

use super::{
    Commit, DocKey, DocumentStore, Precondition, StoreError, StoreResult, Version, Write,
};
use futures_util::future::BoxFuture;
use log::{debug, warn};
use rand::Rng;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

/// Retry policy applied when a transaction loses a commit race
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubled for every further attempt
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
        }
    }

    /// Delay before retrying after `attempt` failed attempts, with jitter
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(10);
        let base = self.base_backoff.saturating_mul(1 << exponent);
        let jitter_ms = self.base_backoff.as_millis() as u64;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(8, Duration::from_millis(5))
    }
}

/// Unconditional atomic batch write.
///
/// Every write lands in one commit, or none does.
#[derive(Debug, Default)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a document write
    pub fn set<T: Serialize>(&mut self, key: DocKey, value: &T) -> StoreResult<&mut Self> {
        let body = serde_json::to_value(value)?;
        self.writes.push(Write::Set { key, body });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Apply every queued write atomically
    pub async fn commit(self, store: &dyn DocumentStore) -> StoreResult<()> {
        store
            .commit(Commit {
                preconditions: Vec::new(),
                writes: self.writes,
            })
            .await
    }
}

/// Read-modify-write unit of work.
///
/// Reads are recorded with the version they observed; writes are buffered
/// and only reach the store at commit, guarded by those versions. A
/// transaction sees its own buffered writes.
pub struct Transaction {
    store: Arc<dyn DocumentStore>,
    document_reads: BTreeMap<DocKey, Option<Version>>,
    collection_reads: BTreeMap<String, Version>,
    view: HashMap<DocKey, Option<serde_json::Value>>,
    writes: BTreeMap<DocKey, Write>,
}

impl Transaction {
    fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            document_reads: BTreeMap::new(),
            collection_reads: BTreeMap::new(),
            view: HashMap::new(),
            writes: BTreeMap::new(),
        }
    }

    /// Read a document, recording its version for the commit check
    pub async fn get<T: DeserializeOwned>(&mut self, key: &DocKey) -> StoreResult<Option<T>> {
        let body = match self.view.get(key) {
            Some(body) => body.clone(),
            None => {
                let doc = self.store.get(key).await?;
                self.document_reads
                    .insert(key.clone(), doc.as_ref().map(|d| d.version));
                let body = doc.map(|d| d.body);
                self.view.insert(key.clone(), body.clone());
                body
            }
        };

        Ok(body.map(serde_json::from_value).transpose()?)
    }

    /// Read a whole collection; any later write into it fails the commit.
    ///
    /// Documents come back ordered by id, with this transaction's own
    /// buffered writes applied.
    pub async fn list<T: DeserializeOwned>(&mut self, collection: &str) -> StoreResult<Vec<T>> {
        let snapshot = self.store.list(collection).await?;
        self.collection_reads
            .entry(collection.to_string())
            .or_insert(snapshot.version);

        let mut bodies: BTreeMap<String, serde_json::Value> = snapshot
            .documents
            .into_iter()
            .map(|doc| (doc.key.id, doc.body))
            .collect();

        for write in self.writes.values() {
            match write {
                Write::Set { key, body } if key.collection == collection => {
                    bodies.insert(key.id.clone(), body.clone());
                }
                _ => {}
            }
        }

        bodies
            .into_values()
            .map(|body| serde_json::from_value(body).map_err(StoreError::from))
            .collect()
    }

    /// Buffer a document write
    pub fn set<T: Serialize>(&mut self, key: DocKey, value: &T) -> StoreResult<()> {
        let body = serde_json::to_value(value)?;
        self.view.insert(key.clone(), Some(body.clone()));
        self.writes.insert(key.clone(), Write::Set { key, body });
        Ok(())
    }

    fn into_commit(self) -> Commit {
        let preconditions = self
            .document_reads
            .into_iter()
            .map(|(key, version)| Precondition::Document { key, version })
            .chain(
                self.collection_reads
                    .into_iter()
                    .map(|(collection, version)| Precondition::Collection {
                        collection,
                        version,
                    }),
            )
            .collect();

        Commit {
            preconditions,
            writes: self.writes.into_values().collect(),
        }
    }
}

/// Run `body` inside an optimistic transaction.
///
/// The body may run several times: whenever the commit loses a race with
/// another writer, the transaction is rebuilt from fresh reads after a
/// backoff. Errors returned by the body abort immediately and nothing is
/// written. Once `policy.max_attempts` commits have conflicted the call
/// fails with [`StoreError::Contention`].
pub async fn run_transaction<T, E, F>(
    store: &Arc<dyn DocumentStore>,
    policy: &RetryPolicy,
    mut body: F,
) -> Result<T, E>
where
    F: for<'t> FnMut(&'t mut Transaction) -> BoxFuture<'t, Result<T, E>>,
    E: From<StoreError>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let mut tx = Transaction::new(Arc::clone(store));
        let value = body(&mut tx).await?;

        match store.commit(tx.into_commit()).await {
            Ok(()) => {
                debug!("Transaction committed after {} attempt(s)", attempt);
                return Ok(value);
            }
            Err(StoreError::Conflict(key)) if attempt < policy.max_attempts => {
                warn!(
                    "Transaction conflict on {} (attempt {}/{}), retrying",
                    key, attempt, policy.max_attempts
                );
                tokio::time::sleep(policy.backoff(attempt)).await;
            }
            Err(StoreError::Conflict(_)) => return Err(StoreError::Contention(attempt).into()),
            Err(e) => return Err(e.into()),
        }
    }
}
