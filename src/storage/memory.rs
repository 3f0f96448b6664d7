use crate::model::{ContributorRecord, Project, Snapshot, StorageError};
use crate::storage::InsightsSource;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A full ecosystem export held in memory, e.g. loaded from a JSON dump.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemorySource {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub contributors: Vec<ContributorRecord>,
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,
}

impl MemorySource {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait::async_trait]
impl InsightsSource for MemorySource {
    async fn active_projects(&self) -> Result<Vec<Project>, StorageError> {
        let mut projects: Vec<Project> = self.projects.iter().filter(|p| p.is_active).cloned().collect();
        projects.sort_by_key(|p| p.id);
        Ok(projects)
    }

    async fn project(&self, id: i64) -> Result<Option<Project>, StorageError> {
        Ok(self.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn contributors(&self) -> Result<Vec<ContributorRecord>, StorageError> {
        Ok(self.contributors.clone())
    }

    async fn contributors_for_handle(&self, handle: &str) -> Result<Vec<ContributorRecord>, StorageError> {
        Ok(self
            .contributors
            .iter()
            .filter(|c| c.github_handle == handle)
            .cloned()
            .collect())
    }

    async fn snapshots(&self, project_id: i64) -> Result<Vec<Snapshot>, StorageError> {
        let mut snapshots: Vec<Snapshot> = self
            .snapshots
            .iter()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect();
        snapshots.sort_by(|a, b| b.snapshot_at.cmp(&a.snapshot_at));
        Ok(snapshots)
    }
}
