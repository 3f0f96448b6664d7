use crate::analyzer::{corporate, influence, trend};
use crate::model::{
    CorporateLandscape, InfluenceType, InsightsError, KeyPerson, MomentumLevel, ProjectTrend,
};
use crate::storage::InsightsSource;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

/// All three bulk analyses taken at the same moment.
#[derive(Debug, Clone, Serialize)]
pub struct InsightsDigest {
    pub generated_at: DateTime<Utc>,
    pub trends: Vec<ProjectTrend>,
    pub people: Vec<KeyPerson>,
    pub corporate: Vec<CorporateLandscape>,
}

/// Runs the analyzers against a fresh read of `source` on every call.
pub struct InsightsService<S> {
    source: S,
    fixed_now: Option<DateTime<Utc>>,
}

impl<S: InsightsSource> InsightsService<S> {
    pub fn new(source: S) -> Self {
        Self { source, fixed_now: None }
    }

    /// Pins the clock used for rising-star checks.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    /// Trends of all active projects, by velocity score, optionally one momentum level only.
    pub async fn trends(&self, momentum: Option<MomentumLevel>) -> Result<Vec<ProjectTrend>, InsightsError> {
        let projects = self.source.active_projects().await?;
        let mut trends = Vec::with_capacity(projects.len());
        for project in &projects {
            let snapshots = self.source.snapshots(project.id).await?;
            trends.push(trend::analyze_project(project, &snapshots));
        }
        debug!("Computed {} project trends", trends.len());
        Ok(trend::rank_trends(trends, momentum))
    }

    pub async fn trend(&self, project_id: i64) -> Result<ProjectTrend, InsightsError> {
        let project = self
            .source
            .project(project_id)
            .await?
            .ok_or_else(|| InsightsError::NotFound(format!("project {}", project_id)))?;
        let snapshots = self.source.snapshots(project.id).await?;
        Ok(trend::analyze_project(&project, &snapshots))
    }

    /// Key people ranked by influence score.
    pub async fn people(
        &self,
        influence_type: Option<InfluenceType>,
        limit: usize,
    ) -> Result<Vec<KeyPerson>, InsightsError> {
        let records = self.source.contributors().await?;
        let people = influence::analyze(&records, influence_type, limit, self.now());
        debug!("Ranked {} key people from {} records", people.len(), records.len());
        Ok(people)
    }

    pub async fn person(&self, github_handle: &str) -> Result<KeyPerson, InsightsError> {
        let not_found = || InsightsError::NotFound(format!("contributor {}", github_handle));

        if self.source.contributors_for_handle(github_handle).await?.is_empty() {
            return Err(not_found());
        }
        let records = self.source.contributors().await?;
        influence::analyze_handle(&records, github_handle, self.now()).ok_or_else(not_found)
    }

    /// Companies present in at least `min_projects` projects, by strategic score.
    pub async fn corporate(
        &self,
        min_projects: usize,
        limit: usize,
    ) -> Result<Vec<CorporateLandscape>, InsightsError> {
        let projects = self.source.active_projects().await?;
        let records = self.source.contributors().await?;
        Ok(corporate::analyze(&projects, &records, min_projects, limit))
    }

    pub async fn company(&self, company: &str) -> Result<CorporateLandscape, InsightsError> {
        let projects = self.source.active_projects().await?;
        let records = self.source.contributors().await?;
        corporate::analyze_company(&projects, &records, company)
            .ok_or_else(|| InsightsError::NotFound(format!("company {}", company)))
    }

    /// Runs the three bulk analyses concurrently.
    pub async fn digest(
        &self,
        people_limit: usize,
        min_projects: usize,
        corporate_limit: usize,
    ) -> Result<InsightsDigest, InsightsError> {
        let generated_at = self.now();
        let (trends, people, corporate) = futures::join!(
            self.trends(None),
            self.people(None, people_limit),
            self.corporate(min_projects, corporate_limit),
        );
        let digest = InsightsDigest {
            generated_at,
            trends: trends?,
            people: people?,
            corporate: corporate?,
        };
        info!(
            "Digest ready: {} trends, {} people, {} companies",
            digest.trends.len(),
            digest.people.len(),
            digest.corporate.len()
        );
        Ok(digest)
    }
}
