// Core structs: ecosystem records read from storage, analyzer outputs, errors
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// One contributor on one project. The same `github_handle` can own many of these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContributorRecord {
    pub project_id: i64,
    pub github_handle: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Option<String>,
    pub commit_count_90d: Option<i64>,
    pub pr_count_90d: Option<i64>,
    pub review_count_90d: Option<i64>,
    pub company: Option<String>,
    pub location: Option<String>,
    #[serde(deserialize_with = "crate::utils::deserialize_utc_opt")]
    pub first_contributed_at: Option<DateTime<Utc>>,
    pub person_id: Option<i64>,
}

impl ContributorRecord {
    pub fn is_maintainer(&self) -> bool {
        self.role.as_deref() == Some("maintainer")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub project_id: i64,
    #[serde(deserialize_with = "crate::utils::deserialize_utc")]
    pub snapshot_at: DateTime<Utc>,
    #[serde(default)]
    pub stars: Option<i64>,
    #[serde(default)]
    pub forks: Option<i64>,
    #[serde(default)]
    pub open_issues: Option<i64>,
    #[serde(default)]
    pub open_prs: Option<i64>,
    #[serde(default)]
    pub commits_30d: Option<i64>,
    #[serde(default)]
    pub pr_merged_30d: Option<i64>,
    #[serde(default)]
    pub active_contributors_30d: Option<i64>,
    #[serde(default)]
    pub new_contributors_30d: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumLevel {
    Accelerating,
    Growing,
    Stable,
    Declining,
    #[serde(rename = "insufficient_data")]
    Insufficient,
}

impl MomentumLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MomentumLevel::Accelerating => "accelerating",
            MomentumLevel::Growing => "growing",
            MomentumLevel::Stable => "stable",
            MomentumLevel::Declining => "declining",
            MomentumLevel::Insufficient => "insufficient_data",
        }
    }
}

impl fmt::Display for MomentumLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MomentumLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accelerating" => Ok(MomentumLevel::Accelerating),
            "growing" => Ok(MomentumLevel::Growing),
            "stable" => Ok(MomentumLevel::Stable),
            "declining" => Ok(MomentumLevel::Declining),
            "insufficient_data" => Ok(MomentumLevel::Insufficient),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfluenceType {
    Maintainer,
    Bridge,
    RisingStar,
    Reviewer,
    Contributor,
}

impl InfluenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfluenceType::Maintainer => "maintainer",
            InfluenceType::Bridge => "bridge",
            InfluenceType::RisingStar => "rising_star",
            InfluenceType::Reviewer => "reviewer",
            InfluenceType::Contributor => "contributor",
        }
    }
}

impl fmt::Display for InfluenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InfluenceType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maintainer" => Ok(InfluenceType::Maintainer),
            "bridge" => Ok(InfluenceType::Bridge),
            "rising_star" => Ok(InfluenceType::RisingStar),
            "reviewer" => Ok(InfluenceType::Reviewer),
            "contributor" => Ok(InfluenceType::Contributor),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTrend {
    pub project_id: i64,
    pub project_name: String,
    pub momentum: MomentumLevel,
    /// 0–100, saturates outside a composite of ±0.5.
    pub velocity_score: f64,
    pub star_growth_30d: Option<i64>,
    pub contributor_growth_30d: Option<i64>,
    pub active_contributors_30d: Option<i64>,
    pub pr_merged_30d: Option<i64>,
    pub snapshot_count: usize,
    pub latest_snapshot_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPerson {
    pub github_handle: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub influence_types: Vec<InfluenceType>,
    pub influence_score: f64,
    pub cross_project_count: usize,
    pub commit_count_90d: Option<i64>,
    pub pr_count_90d: Option<i64>,
    pub review_count_90d: Option<i64>,
    pub company: Option<String>,
    pub person_profile_id: Option<i64>,
    pub project_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectPresence {
    pub project_id: i64,
    pub project_name: String,
    pub contributor_count: usize,
    pub has_maintainer: bool,
    /// Share of the project's total 90-day commits, 0–1.
    pub commit_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorporateLandscape {
    pub company: String,
    pub project_count: usize,
    pub strategic_score: f64,
    pub has_maintainer: bool,
    pub total_contributors: usize,
    pub projects: Vec<ProjectPresence>,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown value: {0}")]
pub struct UnknownVariant(pub String);

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("invalid timestamp in {column}: {value}")]
    InvalidTimestamp { column: &'static str, value: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("dataset parse error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum InsightsError {
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
