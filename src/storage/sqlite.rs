use crate::model::{ContributorRecord, Project, Snapshot, StorageError};
use crate::utils::parse_datetime;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OpenFlags, Row};
use tracing::debug;

const CONTRIBUTOR_COLUMNS: [&str; 12] = [
    "project_id",
    "github_handle",
    "display_name",
    "avatar_url",
    "role",
    "commit_count_90d",
    "pr_count_90d",
    "review_count_90d",
    "company",
    "location",
    "first_contributed_at",
    "person_id",
];

// Added to contributors after the first schema version
const LATE_CONTRIBUTOR_COLUMNS: [&str; 4] = ["review_count_90d", "company", "location", "first_contributed_at"];

const SNAPSHOT_COLUMNS: &str = "project_id, snapshot_at, stars, forks, open_issues, open_prs,
    commits_30d, pr_merged_30d, active_contributors_30d, new_contributors_30d";

/// Read-only view over the ecosystem tables written by the collector.
pub struct SqliteStorage {
    conn: Connection,
    contributor_select: String,
}

impl SqliteStorage {
    /// Opens an existing database read-only. Nothing in the file is changed.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        let contributor_select = Self::contributor_columns(&conn)?;
        Ok(Self { conn, contributor_select })
    }

    /// Column list for contributor reads. Late columns an older table lacks
    /// are selected as NULL.
    fn contributor_columns(conn: &Connection) -> Result<String, StorageError> {
        let mut stmt = conn.prepare("PRAGMA table_info(ecosystem_contributors)")?;
        let existing_columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;

        let columns: Vec<String> = CONTRIBUTOR_COLUMNS
            .iter()
            .map(|&column| {
                if LATE_CONTRIBUTOR_COLUMNS.contains(&column) && !existing_columns.iter().any(|c| c == column) {
                    debug!("ecosystem_contributors.{} missing, reading as NULL", column);
                    format!("NULL AS {}", column)
                } else {
                    column.to_string()
                }
            })
            .collect();
        Ok(columns.join(", "))
    }

    pub fn active_projects(&self) -> Result<Vec<Project>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, is_active FROM ecosystem_projects WHERE is_active = 1 ORDER BY id",
        )?;
        let projects = stmt
            .query_map([], Self::map_project)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    pub fn project(&self, id: i64) -> Result<Option<Project>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, is_active FROM ecosystem_projects WHERE id = ?1")?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(Some(Self::map_project(row)?)),
            None => Ok(None),
        }
    }

    /// Every contributor row, ordered by project then insertion.
    pub fn contributors(&self) -> Result<Vec<ContributorRecord>, StorageError> {
        let sql = format!(
            "SELECT {} FROM ecosystem_contributors ORDER BY project_id, id",
            self.contributor_select
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([], Self::map_contributor)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn contributors_for_handle(&self, handle: &str) -> Result<Vec<ContributorRecord>, StorageError> {
        let sql = format!(
            "SELECT {} FROM ecosystem_contributors WHERE github_handle = ?1 ORDER BY project_id, id",
            self.contributor_select
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![handle], Self::map_contributor)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Snapshot history of one project, newest first.
    pub fn snapshots(&self, project_id: i64) -> Result<Vec<Snapshot>, StorageError> {
        let sql = format!(
            "SELECT {} FROM ecosystem_snapshots WHERE project_id = ?1 ORDER BY snapshot_at DESC, id DESC",
            SNAPSHOT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut snapshots = stmt
            .query_map(params![project_id], Self::map_snapshot)?
            .collect::<Result<Vec<_>, _>>()?;
        // Text ordering breaks down when timestamp formats are mixed
        snapshots.sort_by(|a, b| b.snapshot_at.cmp(&a.snapshot_at));
        Ok(snapshots)
    }

    fn map_project(row: &Row) -> Result<Project, rusqlite::Error> {
        Ok(Project {
            id: row.get(0)?,
            name: row.get(1)?,
            is_active: row.get(2)?,
        })
    }

    fn map_contributor(row: &Row) -> Result<ContributorRecord, rusqlite::Error> {
        let first_contributed_at = match row.get::<_, Option<String>>(10)? {
            Some(raw) => Some(Self::parse_timestamp(10, "first_contributed_at", raw)?),
            None => None,
        };

        Ok(ContributorRecord {
            project_id: row.get(0)?,
            github_handle: row.get(1)?,
            display_name: row.get(2)?,
            avatar_url: row.get(3)?,
            role: row.get(4)?,
            commit_count_90d: row.get(5)?,
            pr_count_90d: row.get(6)?,
            review_count_90d: row.get(7)?,
            company: row.get(8)?,
            location: row.get(9)?,
            first_contributed_at,
            person_id: row.get(11)?,
        })
    }

    fn map_snapshot(row: &Row) -> Result<Snapshot, rusqlite::Error> {
        let raw: String = row.get(1)?;
        Ok(Snapshot {
            project_id: row.get(0)?,
            snapshot_at: Self::parse_timestamp(1, "snapshot_at", raw)?,
            stars: row.get(2)?,
            forks: row.get(3)?,
            open_issues: row.get(4)?,
            open_prs: row.get(5)?,
            commits_30d: row.get(6)?,
            pr_merged_30d: row.get(7)?,
            active_contributors_30d: row.get(8)?,
            new_contributors_30d: row.get(9)?,
        })
    }

    fn parse_timestamp(idx: usize, column: &'static str, raw: String) -> Result<DateTime<Utc>, rusqlite::Error> {
        parse_datetime(&raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Text,
                Box::new(StorageError::InvalidTimestamp { column, value: raw }),
            )
        })
    }
}
