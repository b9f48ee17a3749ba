//! Event store clients.
//!
//! Two interchangeable backends implement [`EventStore`]: a remote HTTP API
//! ([`rest::HttpEventStore`]) and an embedded SQLite database
//! ([`sqlite::SqliteEventStore`]). Callers cannot tell them apart: same
//! operations, same [`StoreError`] taxonomy, no partial success.

pub mod rest;
pub mod sqlite;
pub mod wire;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::model::{Event, EventPatch};
use async_trait::async_trait;
use std::sync::Arc;

pub use self::rest::HttpEventStore;
pub use self::sqlite::SqliteEventStore;

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Event>>;
    async fn create(&self, event: &Event) -> StoreResult<Event>;
    async fn update(&self, id: &str, patch: &EventPatch) -> StoreResult<Event>;
    async fn delete(&self, id: &str) -> StoreResult<Event>;
}

/// Opens the backend selected by configuration.
pub fn connect(config: &StoreConfig) -> StoreResult<Arc<dyn EventStore>> {
    let store: Arc<dyn EventStore> = match config {
        StoreConfig::Http { base_url } => Arc::new(HttpEventStore::new(base_url)?),
        StoreConfig::Sqlite { path } => Arc::new(SqliteEventStore::open(path)?),
        StoreConfig::SqliteInMemory => Arc::new(SqliteEventStore::open_in_memory()?),
    };
    Ok(store)
}

pub(crate) fn join_error(err: tokio::task::JoinError) -> StoreError {
    StoreError::transport(format!("store task failed: {err}"))
}
