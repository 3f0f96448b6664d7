use crate::model::{MomentumLevel, Project, ProjectTrend, Snapshot};
use crate::utils::round_to;

const CONTRIBUTOR_WEIGHT: f64 = 0.35;
const PR_WEIGHT: f64 = 0.30;
const STAR_WEIGHT: f64 = 0.20;
const COMMIT_WEIGHT: f64 = 0.15;

/// Only the newest two snapshots take part, and `snapshot_count` never exceeds this.
const COMPARED_SNAPSHOTS: usize = 2;

/// Relative change of one metric between two snapshots.
/// Zero when either side is missing or the old value is zero.
pub fn metric_velocity(old: Option<i64>, new: Option<i64>) -> f64 {
    match (old, new) {
        (Some(old), Some(new)) if old != 0 => (new - old) as f64 / old as f64,
        _ => 0.0,
    }
}

/// Weighted composite growth rate from the newest (`new`) and prior (`old`) snapshots.
pub fn composite_velocity(old: &Snapshot, new: &Snapshot) -> f64 {
    let contributors = metric_velocity(old.active_contributors_30d, new.active_contributors_30d);
    let prs = metric_velocity(old.pr_merged_30d, new.pr_merged_30d);
    let stars = metric_velocity(old.stars, new.stars);
    let commits = metric_velocity(old.commits_30d, new.commits_30d);

    contributors * CONTRIBUTOR_WEIGHT + prs * PR_WEIGHT + stars * STAR_WEIGHT + commits * COMMIT_WEIGHT
}

/// Maps the composite onto 0–100. Anything beyond ±0.5 saturates at the bounds.
pub fn velocity_score(composite: f64) -> f64 {
    ((composite + 0.5) * 100.0).clamp(0.0, 100.0)
}

/// Buckets the unscaled composite. Lower bounds are inclusive.
pub fn classify_momentum(composite: f64) -> MomentumLevel {
    if composite >= 0.20 {
        MomentumLevel::Accelerating
    } else if composite >= 0.05 {
        MomentumLevel::Growing
    } else if composite >= -0.05 {
        MomentumLevel::Stable
    } else {
        MomentumLevel::Declining
    }
}

fn delta(old: Option<i64>, new: Option<i64>) -> Option<i64> {
    Some(new? - old?)
}

/// Computes the trend of one project. `snapshots` must be ordered newest first.
pub fn analyze_project(project: &Project, snapshots: &[Snapshot]) -> ProjectTrend {
    let (new, old) = match snapshots {
        [new, old, ..] => (new, old),
        _ => {
            let latest = snapshots.first();
            return ProjectTrend {
                project_id: project.id,
                project_name: project.name.clone(),
                momentum: MomentumLevel::Insufficient,
                velocity_score: 0.0,
                star_growth_30d: None,
                contributor_growth_30d: None,
                active_contributors_30d: latest.and_then(|s| s.active_contributors_30d),
                pr_merged_30d: latest.and_then(|s| s.pr_merged_30d),
                snapshot_count: snapshots.len().min(COMPARED_SNAPSHOTS),
                latest_snapshot_at: latest.map(|s| s.snapshot_at),
            };
        }
    };

    let composite = composite_velocity(old, new);

    ProjectTrend {
        project_id: project.id,
        project_name: project.name.clone(),
        momentum: classify_momentum(composite),
        velocity_score: round_to(velocity_score(composite), 1),
        star_growth_30d: delta(old.stars, new.stars),
        contributor_growth_30d: delta(old.active_contributors_30d, new.active_contributors_30d),
        active_contributors_30d: new.active_contributors_30d,
        pr_merged_30d: new.pr_merged_30d,
        snapshot_count: snapshots.len().min(COMPARED_SNAPSHOTS),
        latest_snapshot_at: Some(new.snapshot_at),
    }
}

/// Sorts trends by velocity score, highest first, and applies an optional momentum filter.
/// The sort is stable so equal scores keep their input order.
pub fn rank_trends(mut trends: Vec<ProjectTrend>, momentum: Option<MomentumLevel>) -> Vec<ProjectTrend> {
    trends.sort_by(|a, b| b.velocity_score.total_cmp(&a.velocity_score));
    if let Some(level) = momentum {
        trends.retain(|t| t.momentum == level);
    }
    trends
}
