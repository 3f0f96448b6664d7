use crate::model::{ContributorRecord, InfluenceType, KeyPerson};
use crate::utils::round_to;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// How recent a first contribution must be to count as a rising star.
const RISING_STAR_DAYS: i64 = 90;
const RISING_STAR_MIN_COMMITS: i64 = 5;
const REVIEWER_MIN_REVIEWS: i64 = 5;
const BRIDGE_MIN_PROJECTS: usize = 2;

const COMMIT_CAP: i64 = 500;
const PR_CAP: i64 = 200;
const REVIEW_CAP: i64 = 200;
const CROSS_PROJECT_CAP: usize = 10;

/// Activity of one handle merged across every project it appears in.
#[derive(Debug, Clone)]
pub struct HandleActivity<'a> {
    pub handle: &'a str,
    pub records: Vec<&'a ContributorRecord>,
    pub total_commits: i64,
    pub total_prs: i64,
    pub total_reviews: i64,
    pub project_ids: BTreeSet<i64>,
}

impl<'a> HandleActivity<'a> {
    fn new(handle: &'a str) -> Self {
        Self {
            handle,
            records: Vec::new(),
            total_commits: 0,
            total_prs: 0,
            total_reviews: 0,
            project_ids: BTreeSet::new(),
        }
    }

    fn push(&mut self, record: &'a ContributorRecord) {
        self.total_commits += record.commit_count_90d.unwrap_or(0);
        self.total_prs += record.pr_count_90d.unwrap_or(0);
        self.total_reviews += record.review_count_90d.unwrap_or(0);
        self.project_ids.insert(record.project_id);
        self.records.push(record);
    }

    pub fn cross_project_count(&self) -> usize {
        self.project_ids.len()
    }

    /// Record with the most commits. Ties keep the first one seen.
    pub fn representative(&self) -> Option<&'a ContributorRecord> {
        self.records.iter().copied().fold(None, |best, record| match best {
            Some(b) if record.commit_count_90d.unwrap_or(0) <= b.commit_count_90d.unwrap_or(0) => Some(b),
            _ => Some(record),
        })
    }
}

/// Groups records by `github_handle`, in handle order.
pub fn group_by_handle(records: &[ContributorRecord]) -> BTreeMap<&str, HandleActivity<'_>> {
    let mut grouped: BTreeMap<&str, HandleActivity<'_>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.github_handle.as_str())
            .or_insert_with(|| HandleActivity::new(record.github_handle.as_str()))
            .push(record);
    }
    grouped
}

/// 0–100 influence score. Each component is capped before weighting.
pub fn influence_score(commits: i64, prs: i64, reviews: i64, cross_project_count: usize) -> f64 {
    let c = commits.clamp(0, COMMIT_CAP) as f64;
    let p = prs.clamp(0, PR_CAP) as f64;
    let r = reviews.clamp(0, REVIEW_CAP) as f64;
    let x = cross_project_count.min(CROSS_PROJECT_CAP) as f64;

    let score = c / COMMIT_CAP as f64 * 30.0
        + p / PR_CAP as f64 * 30.0
        + r / REVIEW_CAP as f64 * 20.0
        + x / CROSS_PROJECT_CAP as f64 * 20.0;
    round_to(score, 1)
}

/// Tags a handle. Checks are independent; `contributor` only when nothing else matched.
pub fn classify(
    representative: &ContributorRecord,
    cross_project_count: usize,
    total_commits: i64,
    total_reviews: i64,
    now: DateTime<Utc>,
) -> Vec<InfluenceType> {
    let mut types = Vec::new();

    if representative.is_maintainer() {
        types.push(InfluenceType::Maintainer);
    }

    if cross_project_count >= BRIDGE_MIN_PROJECTS {
        types.push(InfluenceType::Bridge);
    }

    let cutoff = now - Duration::days(RISING_STAR_DAYS);
    let recent = representative
        .first_contributed_at
        .is_some_and(|first| first >= cutoff);
    if recent && total_commits >= RISING_STAR_MIN_COMMITS {
        types.push(InfluenceType::RisingStar);
    }

    if total_reviews >= REVIEWER_MIN_REVIEWS {
        types.push(InfluenceType::Reviewer);
    }

    if types.is_empty() {
        types.push(InfluenceType::Contributor);
    }

    types
}

fn first_present<'a, T: ?Sized>(
    records: &[&'a ContributorRecord],
    field: impl Fn(&'a ContributorRecord) -> Option<&'a T>,
) -> Option<&'a T> {
    records.iter().find_map(|&r| field(r))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Builds the merged profile for one handle.
pub fn build_key_person(activity: &HandleActivity<'_>, now: DateTime<Utc>) -> Option<KeyPerson> {
    let representative = activity.representative()?;
    let records = &activity.records;

    // Profile fields come from the first row with a display name, then from any row.
    let primary = records
        .iter()
        .copied()
        .find(|r| non_empty(&r.display_name).is_some())
        .unwrap_or(records[0]);

    let display_name = non_empty(&primary.display_name)
        .or_else(|| first_present(records, |r| non_empty(&r.display_name)));
    let avatar_url = non_empty(&primary.avatar_url)
        .or_else(|| first_present(records, |r| non_empty(&r.avatar_url)));
    let company = non_empty(&primary.company).or_else(|| first_present(records, |r| non_empty(&r.company)));
    let person_profile_id = primary
        .person_id
        .or_else(|| records.iter().find_map(|r| r.person_id));

    let cross_project_count = activity.cross_project_count();

    Some(KeyPerson {
        github_handle: activity.handle.to_string(),
        display_name: display_name.map(str::to_string),
        avatar_url: avatar_url.map(str::to_string),
        influence_types: classify(
            representative,
            cross_project_count,
            activity.total_commits,
            activity.total_reviews,
            now,
        ),
        influence_score: influence_score(
            activity.total_commits,
            activity.total_prs,
            activity.total_reviews,
            cross_project_count,
        ),
        cross_project_count,
        commit_count_90d: nonzero(activity.total_commits),
        pr_count_90d: nonzero(activity.total_prs),
        review_count_90d: nonzero(activity.total_reviews),
        company: company.map(str::to_string),
        person_profile_id,
        project_ids: activity.project_ids.iter().copied().collect(),
    })
}

fn nonzero(total: i64) -> Option<i64> {
    (total != 0).then_some(total)
}

/// Merges every record into one `KeyPerson` per handle, ranks by score and
/// keeps at most `limit`, optionally only those carrying `filter`.
pub fn analyze(
    records: &[ContributorRecord],
    filter: Option<InfluenceType>,
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<KeyPerson> {
    let mut people: Vec<KeyPerson> = group_by_handle(records)
        .values()
        .filter_map(|activity| build_key_person(activity, now))
        .filter(|person| filter.is_none_or(|t| person.influence_types.contains(&t)))
        .collect();

    people.sort_by(|a, b| b.influence_score.total_cmp(&a.influence_score));
    people.truncate(limit);
    people
}

/// Merged profile of a single handle, or `None` when it has no records.
pub fn analyze_handle(records: &[ContributorRecord], handle: &str, now: DateTime<Utc>) -> Option<KeyPerson> {
    group_by_handle(records)
        .get(handle)
        .and_then(|activity| build_key_person(activity, now))
}
