use chrono::{DateTime, TimeZone, Utc};
use eco_insights::insights::InsightsService;
use eco_insights::model::{InfluenceType, InsightsError, MomentumLevel, StorageError};
use eco_insights::storage::{SharedStorage, SqliteStorage};
use rusqlite::Connection;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Mutex;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
}

// Tables as the collector creates them
const SCHEMA: &str = "
    CREATE TABLE ecosystem_projects (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1
    );
    CREATE TABLE ecosystem_contributors (
        id INTEGER PRIMARY KEY,
        project_id INTEGER NOT NULL REFERENCES ecosystem_projects(id),
        github_handle TEXT NOT NULL,
        display_name TEXT,
        avatar_url TEXT,
        role TEXT,
        commit_count_90d INTEGER,
        pr_count_90d INTEGER,
        review_count_90d INTEGER,
        company TEXT,
        location TEXT,
        first_contributed_at TEXT,
        person_id INTEGER
    );
    CREATE TABLE ecosystem_snapshots (
        id INTEGER PRIMARY KEY,
        project_id INTEGER NOT NULL REFERENCES ecosystem_projects(id),
        snapshot_at TEXT NOT NULL,
        stars INTEGER,
        forks INTEGER,
        open_issues INTEGER,
        open_prs INTEGER,
        commits_30d INTEGER,
        pr_merged_30d INTEGER,
        active_contributors_30d INTEGER,
        new_contributors_30d INTEGER
    );
";

const FIXTURE: &str = "
    INSERT INTO ecosystem_projects (id, name, is_active) VALUES
        (1, 'alpha', 1), (2, 'beta', 1), (3, 'gamma', 1), (4, 'legacy', 0);

    -- alpha: growing
    INSERT INTO ecosystem_snapshots (project_id, snapshot_at, stars, pr_merged_30d, active_contributors_30d, commits_30d) VALUES
        (1, '2026-04-01 00:00:00', 100, 10, 50, 200),
        (1, '2026-05-01 00:00:00', 120, 12, 45, 210);
    -- beta: accelerating
    INSERT INTO ecosystem_snapshots (project_id, snapshot_at, stars, pr_merged_30d, active_contributors_30d, commits_30d) VALUES
        (2, '2026-04-01T00:00:00+00:00', 100, 5, 5, 20),
        (2, '2026-05-01T00:00:00+00:00', 150, 10, 10, 40);
    -- gamma: a single snapshot only
    INSERT INTO ecosystem_snapshots (project_id, snapshot_at, active_contributors_30d, pr_merged_30d) VALUES
        (3, '2026-05-01 00:00:00', 7, 2);

    INSERT INTO ecosystem_contributors
        (project_id, github_handle, display_name, role, commit_count_90d, pr_count_90d, review_count_90d, company, first_contributed_at, person_id)
    VALUES
        (1, 'alice', 'Alice', 'maintainer', 30, 5, 12, 'Acme', '2025-01-01 00:00:00', 42),
        (2, 'alice', NULL, NULL, 15, 2, NULL, 'Acme', NULL, NULL),
        (1, 'bob', 'Bob', NULL, 70, 20, 0, NULL, '2026-05-10 09:30:00', NULL),
        (2, 'carol', 'Carol', 'member', 25, 3, 1, 'Globex', '2024-02-02T00:00:00Z', NULL),
        (1, 'dave', NULL, NULL, NULL, NULL, NULL, '', NULL, NULL);
";

fn collector_database(name: &str, batch: &str) -> (TempDir, String) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join(name);
    let conn = Connection::open(&path).expect("open raw");
    conn.execute_batch(batch).expect("seed database");
    let path = path.to_str().expect("utf-8 path").to_string();
    (dir, path)
}

fn seeded_storage() -> (TempDir, SharedStorage) {
    let (dir, path) = collector_database("ecosystem.db", &format!("{SCHEMA}{FIXTURE}"));
    let storage = SqliteStorage::new(&path).expect("open storage");
    (dir, Arc::new(Mutex::new(storage)))
}

fn column_names(path: &str, table: &str) -> Vec<String> {
    let conn = Connection::open(path).expect("open raw");
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})")).expect("pragma");
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .expect("columns")
        .collect::<Result<_, _>>()
        .expect("column names");
    names
}

#[tokio::test]
async fn trends_rank_active_projects() {
    let (_dir, storage) = seeded_storage();
    let service = InsightsService::new(storage).with_now(now());

    let trends = service.trends(None).await.expect("trends");
    let order: Vec<_> = trends.iter().map(|t| (t.project_name.as_str(), t.momentum)).collect();
    assert_eq!(
        order,
        vec![
            ("beta", MomentumLevel::Accelerating),
            ("alpha", MomentumLevel::Growing),
            ("gamma", MomentumLevel::Insufficient),
        ]
    );

    let gamma = &trends[2];
    assert_eq!(gamma.velocity_score, 0.0);
    assert_eq!(gamma.snapshot_count, 1);
    assert_eq!(gamma.active_contributors_30d, Some(7));
    assert!(gamma.star_growth_30d.is_none());

    let alpha = &trends[1];
    assert_eq!(alpha.star_growth_30d, Some(20));
    assert_eq!(alpha.contributor_growth_30d, Some(-5));
    assert_eq!(alpha.latest_snapshot_at, Some(Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap()));

    let growing = service.trends(Some(MomentumLevel::Growing)).await.expect("filtered");
    assert_eq!(growing.len(), 1);
    assert_eq!(growing[0].project_id, 1);
}

#[tokio::test]
async fn inactive_project_is_still_reachable_by_id() {
    let (_dir, storage) = seeded_storage();
    let service = InsightsService::new(storage).with_now(now());

    let legacy = service.trend(4).await.expect("legacy trend");
    assert_eq!(legacy.momentum, MomentumLevel::Insufficient);
    assert_eq!(legacy.snapshot_count, 0);

    assert!(matches!(service.trend(404).await, Err(InsightsError::NotFound(_))));
}

#[tokio::test]
async fn people_merge_across_projects() {
    let (_dir, storage) = seeded_storage();
    let service = InsightsService::new(storage).with_now(now());

    let alice = service.person("alice").await.expect("alice");
    assert_eq!(alice.display_name.as_deref(), Some("Alice"));
    assert_eq!(alice.commit_count_90d, Some(45));
    assert_eq!(alice.pr_count_90d, Some(7));
    assert_eq!(alice.review_count_90d, Some(12));
    assert_eq!(alice.cross_project_count, 2);
    assert_eq!(alice.project_ids, vec![1, 2]);
    assert_eq!(alice.company.as_deref(), Some("Acme"));
    assert_eq!(alice.person_profile_id, Some(42));
    assert_eq!(
        alice.influence_types,
        vec![InfluenceType::Maintainer, InfluenceType::Bridge, InfluenceType::Reviewer]
    );

    let bob = service.person("bob").await.expect("bob");
    assert_eq!(bob.influence_types, vec![InfluenceType::RisingStar]);
    assert!(bob.review_count_90d.is_none());

    let carol = service.person("carol").await.expect("carol");
    assert_eq!(carol.influence_types, vec![InfluenceType::Contributor]);

    let dave = service.person("dave").await.expect("dave");
    assert_eq!(dave.influence_types, vec![InfluenceType::Contributor]);
    assert_eq!(dave.influence_score, 2.0);
    assert!(dave.company.is_none());

    assert!(matches!(service.person("nonexistent").await, Err(InsightsError::NotFound(_))));
}

#[tokio::test]
async fn people_filter_and_limit() {
    let (_dir, storage) = seeded_storage();
    let service = InsightsService::new(storage).with_now(now());

    let everyone = service.people(None, 50).await.expect("people");
    assert_eq!(everyone.len(), 4);
    assert!(everyone.windows(2).all(|w| w[0].influence_score >= w[1].influence_score));

    let rising = service.people(Some(InfluenceType::RisingStar), 50).await.expect("rising");
    let handles: Vec<_> = rising.iter().map(|p| p.github_handle.as_str()).collect();
    assert_eq!(handles, vec!["bob"]);

    assert_eq!(service.people(None, 2).await.expect("top two").len(), 2);
}

#[tokio::test]
async fn corporate_landscape_from_company_rows() {
    let (_dir, storage) = seeded_storage();
    let service = InsightsService::new(storage).with_now(now());

    let landscape = service.corporate(1, 50).await.expect("corporate");
    let companies: Vec<_> = landscape.iter().map(|c| c.company.as_str()).collect();
    assert_eq!(companies, vec!["Acme", "Globex"]);

    let acme = &landscape[0];
    assert_eq!(acme.project_count, 2);
    assert_eq!(acme.strategic_score, 66.7);
    assert!(acme.has_maintainer);
    assert_eq!(acme.total_contributors, 2);
    // alpha: 30 of 100 commits (alice 30 + bob 70 + dave null)
    let alpha = acme.projects.iter().find(|p| p.project_id == 1).expect("alpha presence");
    assert_eq!(alpha.commit_share, 0.3);
    assert_eq!(alpha.project_name, "alpha");
    // beta: 15 of 40
    let beta = acme.projects.iter().find(|p| p.project_id == 2).expect("beta presence");
    assert_eq!(beta.commit_share, 0.375);
    assert!(!beta.has_maintainer);

    let broad = service.corporate(2, 50).await.expect("broad");
    assert_eq!(broad.len(), 1);
    assert_eq!(broad[0].company, "Acme");

    let globex = service.company("globex").await.expect("globex");
    assert_eq!(globex.strategic_score, 33.3);
    assert!(matches!(service.company("nonexistent").await, Err(InsightsError::NotFound(_))));
}

#[tokio::test]
async fn empty_database_degrades_gracefully() {
    let (_dir, path) = collector_database("empty.db", SCHEMA);
    let storage = SqliteStorage::new(&path).expect("open storage");
    let service = InsightsService::new(Arc::new(Mutex::new(storage))).with_now(now());

    assert!(service.trends(None).await.expect("trends").is_empty());
    assert!(service.people(None, 50).await.expect("people").is_empty());
    assert!(service.corporate(1, 50).await.expect("corporate").is_empty());
}

#[test]
fn missing_database_is_not_created() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("absent.db");
    let opened = SqliteStorage::new(path.to_str().expect("utf-8 path"));
    assert!(matches!(opened, Err(StorageError::Database(_))));
    assert!(!path.exists());
}

#[tokio::test]
async fn older_contributor_table_is_read_without_changes() {
    let (_dir, path) = collector_database(
        "old.db",
        "
        CREATE TABLE ecosystem_projects (id INTEGER PRIMARY KEY, name TEXT NOT NULL, is_active INTEGER NOT NULL DEFAULT 1);
        CREATE TABLE ecosystem_contributors (
            id INTEGER PRIMARY KEY, project_id INTEGER NOT NULL, github_handle TEXT NOT NULL,
            display_name TEXT, avatar_url TEXT, role TEXT,
            commit_count_90d INTEGER, pr_count_90d INTEGER, person_id INTEGER
        );
        INSERT INTO ecosystem_projects (id, name) VALUES (1, 'alpha');
        INSERT INTO ecosystem_contributors (project_id, github_handle, commit_count_90d) VALUES (1, 'old-timer', 9);
        ",
    );
    let before = column_names(&path, "ecosystem_contributors");

    let storage = SqliteStorage::new(&path).expect("open storage");
    let service = InsightsService::new(Arc::new(Mutex::new(storage))).with_now(now());
    let person = service.person("old-timer").await.expect("person");
    assert_eq!(person.commit_count_90d, Some(9));
    assert!(person.review_count_90d.is_none());
    assert!(service.corporate(1, 50).await.expect("corporate").is_empty());

    assert_eq!(column_names(&path, "ecosystem_contributors"), before);
    assert!(!before.iter().any(|c| c == "review_count_90d"));
}

#[tokio::test]
async fn concurrent_digests_match() {
    let (_dir, storage) = seeded_storage();

    let first = {
        let storage = storage.clone();
        tokio::spawn(async move {
            let service = InsightsService::new(storage).with_now(now());
            service.digest(50, 1, 50).await.map(|d| serde_json::to_string(&d))
        })
    };
    let second = {
        let storage = storage.clone();
        tokio::spawn(async move {
            let service = InsightsService::new(storage).with_now(now());
            service.digest(50, 1, 50).await.map(|d| serde_json::to_string(&d))
        })
    };

    let first = first.await.expect("join").expect("digest").expect("json");
    let second = second.await.expect("join").expect("digest").expect("json");
    assert_eq!(first, second);
}
