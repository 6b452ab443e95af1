//! Transactional document store contract.
//!
//! The tournament engine never talks to a database directly. It consumes a
//! [`DocumentStore`], a key/value document store with three primitives:
//!
//! - `get`: read one document together with its version
//! - `list`: read a whole collection together with the collection version
//! - `commit`: atomically verify a set of version preconditions and apply writes
//!
//! On top of those primitives this module provides [`WriteBatch`] (an
//! unconditional atomic batch) and [`run_transaction`] (optimistic
//! read-modify-write with transparent retry on contention).
//!
//! ## Example
//!
//! ```no_run
//! use tourney::store::{DocKey, DocumentStore, MemoryStore, RetryPolicy, run_transaction};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
//!     let key = DocKey::new("counters", "visits");
//!
//!     let visits: u64 = run_transaction(&store, &RetryPolicy::default(), |tx| {
//!         let key = key.clone();
//!         Box::pin(async move {
//!             let current = tx.get::<u64>(&key).await?.unwrap_or(0);
//!             tx.set(key, &(current + 1))?;
//!             Ok::<_, tourney::store::StoreError>(current + 1)
//!         })
//!     })
//!     .await?;
//!
//!     println!("visits: {visits}");
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use thiserror::Error;

pub mod config;
pub mod memory;
pub mod postgres;
pub mod transaction;

pub use config::DatabaseConfig;
pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;
pub use transaction::{RetryPolicy, Transaction, WriteBatch, run_transaction};

/// Monotonic document/collection version assigned by the store on commit.
pub type Version = u64;

/// Address of a single document: the collection path plus the document id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocKey {
    /// Collection path, e.g. `tournaments/t1/matches`
    pub collection: String,
    /// Document id within the collection
    pub id: String,
}

impl DocKey {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A stored document body and the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: DocKey,
    pub version: Version,
    pub body: serde_json::Value,
}

impl Document {
    /// Deserialize the document body into a typed value
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }
}

/// Every document of a collection, read at a single collection version.
#[derive(Debug, Clone, Default)]
pub struct CollectionSnapshot {
    pub collection: String,
    /// Version of the last write into the collection (0 if never written)
    pub version: Version,
    /// Documents ordered by id
    pub documents: Vec<Document>,
}

/// A single mutation applied by a commit
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Set { key: DocKey, body: serde_json::Value },
    Delete { key: DocKey },
}

impl Write {
    pub fn key(&self) -> &DocKey {
        match self {
            Write::Set { key, .. } | Write::Delete { key } => key,
        }
    }
}

/// Condition checked atomically at commit time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// The document is still at `version`; `None` means it must still be absent.
    Document {
        key: DocKey,
        version: Option<Version>,
    },
    /// No document in the collection was written since `version`.
    Collection { collection: String, version: Version },
}

/// Unit of atomic work handed to [`DocumentStore::commit`]
#[derive(Debug, Clone, Default)]
pub struct Commit {
    pub preconditions: Vec<Precondition>,
    pub writes: Vec<Write>,
}

impl Commit {
    /// Collections touched by either the preconditions or the writes, sorted
    pub fn collections(&self) -> Vec<&str> {
        let mut collections: Vec<&str> = self
            .preconditions
            .iter()
            .map(|p| match p {
                Precondition::Document { key, .. } => key.collection.as_str(),
                Precondition::Collection { collection, .. } => collection.as_str(),
            })
            .chain(self.writes.iter().map(|w| w.key().collection.as_str()))
            .collect();
        collections.sort_unstable();
        collections.dedup();
        collections
    }
}

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// A precondition no longer holds; the transaction should be retried
    #[error("Write conflict on {0}")]
    Conflict(String),

    /// Retries were exhausted while other writers kept winning
    #[error("Transaction aborted after {0} attempts due to contention")]
    Contention(u32),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Document body could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Transactional key/value document store.
///
/// Implementations must apply a [`Commit`] atomically: either every
/// precondition holds and every write lands under one new version, or
/// nothing changes and [`StoreError::Conflict`] is returned.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a single document
    async fn get(&self, key: &DocKey) -> StoreResult<Option<Document>>;

    /// Read every document of a collection
    async fn list(&self, collection: &str) -> StoreResult<CollectionSnapshot>;

    /// Verify preconditions and apply writes atomically
    async fn commit(&self, commit: Commit) -> StoreResult<()>;
}
