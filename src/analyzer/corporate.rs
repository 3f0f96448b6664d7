use crate::model::{ContributorRecord, CorporateLandscape, Project, ProjectPresence};
use crate::utils::round_to;
use std::collections::{BTreeMap, HashMap};

/// Company → project id → member records.
type CompanyProjects<'a> = BTreeMap<&'a str, BTreeMap<i64, Vec<&'a ContributorRecord>>>;

fn company_of(record: &ContributorRecord) -> Option<&str> {
    record.company.as_deref().filter(|c| !c.is_empty())
}

/// Sum of 90-day commits per project over every contributor, with or without a company.
pub fn project_commit_totals(records: &[ContributorRecord]) -> HashMap<i64, i64> {
    let mut totals = HashMap::new();
    for record in records {
        *totals.entry(record.project_id).or_insert(0) += record.commit_count_90d.unwrap_or(0);
    }
    totals
}

fn group_by_company(records: &[ContributorRecord]) -> CompanyProjects<'_> {
    let mut grouped: CompanyProjects<'_> = BTreeMap::new();
    for record in records {
        if let Some(company) = company_of(record) {
            grouped
                .entry(company)
                .or_default()
                .entry(record.project_id)
                .or_default()
                .push(record);
        }
    }
    grouped
}

/// Fraction of a project's commits attributable to `company_commits`, 3 decimals.
pub fn commit_share(company_commits: i64, project_total: i64) -> f64 {
    if project_total > 0 {
        round_to(company_commits as f64 / project_total as f64, 3)
    } else {
        0.0
    }
}

/// Breadth of presence across the active project set, 1 decimal.
pub fn strategic_score(project_count: usize, active_projects: usize) -> f64 {
    round_to(project_count as f64 / active_projects as f64 * 100.0, 1)
}

fn build_landscape(
    company: &str,
    projects: &BTreeMap<i64, Vec<&ContributorRecord>>,
    names: &HashMap<i64, &str>,
    totals: &HashMap<i64, i64>,
    active_projects: usize,
) -> CorporateLandscape {
    let mut presences: Vec<ProjectPresence> = projects
        .iter()
        .map(|(&project_id, members)| {
            let company_commits: i64 = members.iter().map(|m| m.commit_count_90d.unwrap_or(0)).sum();
            let project_total = totals.get(&project_id).copied().unwrap_or(0);
            ProjectPresence {
                project_id,
                project_name: names
                    .get(&project_id)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| format!("project-{}", project_id)),
                contributor_count: members.len(),
                has_maintainer: members.iter().any(|m| m.is_maintainer()),
                commit_share: commit_share(company_commits, project_total),
            }
        })
        .collect();
    presences.sort_by(|a, b| b.contributor_count.cmp(&a.contributor_count));

    CorporateLandscape {
        company: company.to_string(),
        project_count: projects.len(),
        strategic_score: strategic_score(projects.len(), active_projects),
        has_maintainer: presences.iter().any(|p| p.has_maintainer),
        total_contributors: presences.iter().map(|p| p.contributor_count).sum(),
        projects: presences,
    }
}

/// Corporate landscape of every company present in at least `min_projects`
/// projects, ranked by strategic score and truncated to `limit`.
///
/// `active_projects` supplies both the score denominator and project names.
/// With no active projects the score is undefined and nothing is returned.
pub fn analyze(
    active_projects: &[Project],
    records: &[ContributorRecord],
    min_projects: usize,
    limit: usize,
) -> Vec<CorporateLandscape> {
    let active: Vec<&Project> = active_projects.iter().filter(|p| p.is_active).collect();
    if active.is_empty() {
        return Vec::new();
    }

    let by_company = group_by_company(records);
    if by_company.is_empty() {
        return Vec::new();
    }

    let names: HashMap<i64, &str> = active.iter().map(|p| (p.id, p.name.as_str())).collect();
    let totals = project_commit_totals(records);

    let mut landscapes: Vec<CorporateLandscape> = by_company
        .iter()
        .filter(|(_, projects)| projects.len() >= min_projects)
        .map(|(company, projects)| build_landscape(company, projects, &names, &totals, active.len()))
        .collect();

    landscapes.sort_by(|a, b| b.strategic_score.total_cmp(&a.strategic_score));
    landscapes.truncate(limit);
    landscapes
}

/// Case-insensitive lookup of one company over the unfiltered landscape.
pub fn analyze_company(
    active_projects: &[Project],
    records: &[ContributorRecord],
    company: &str,
) -> Option<CorporateLandscape> {
    let wanted = company.to_lowercase();
    analyze(active_projects, records, 1, usize::MAX)
        .into_iter()
        .find(|landscape| landscape.company.to_lowercase() == wanted)
}
