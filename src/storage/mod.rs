// Storage module: read access to the ecosystem records the analyzers consume.

pub mod memory;
pub mod sqlite;

pub use memory::MemorySource;
pub use sqlite::SqliteStorage;

use crate::model::{ContributorRecord, Project, Snapshot, StorageError};
use std::sync::Arc;
use tokio::sync::Mutex;

/// SQLite storage shared between concurrently running analyses.
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Read queries the analyzers depend on. Errors are passed through untouched.
#[async_trait::async_trait]
pub trait InsightsSource: Send + Sync {
    async fn active_projects(&self) -> Result<Vec<Project>, StorageError>;
    /// Any project by id, active or not.
    async fn project(&self, id: i64) -> Result<Option<Project>, StorageError>;
    async fn contributors(&self) -> Result<Vec<ContributorRecord>, StorageError>;
    async fn contributors_for_handle(&self, handle: &str) -> Result<Vec<ContributorRecord>, StorageError>;
    /// Snapshots of one project, newest first.
    async fn snapshots(&self, project_id: i64) -> Result<Vec<Snapshot>, StorageError>;
}

#[async_trait::async_trait]
impl InsightsSource for SharedStorage {
    async fn active_projects(&self) -> Result<Vec<Project>, StorageError> {
        self.lock().await.active_projects()
    }

    async fn project(&self, id: i64) -> Result<Option<Project>, StorageError> {
        self.lock().await.project(id)
    }

    async fn contributors(&self) -> Result<Vec<ContributorRecord>, StorageError> {
        self.lock().await.contributors()
    }

    async fn contributors_for_handle(&self, handle: &str) -> Result<Vec<ContributorRecord>, StorageError> {
        self.lock().await.contributors_for_handle(handle)
    }

    async fn snapshots(&self, project_id: i64) -> Result<Vec<Snapshot>, StorageError> {
        self.lock().await.snapshots(project_id)
    }
}
