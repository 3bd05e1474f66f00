use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[cfg(test)]
use mockall::automock;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::parser::types::Ecosystem;
use crate::version::error::CacheError;
use crate::version::types::{PackageResult, PackageVersions};

/// Default time-to-live of a cache entry
pub const DEFAULT_TTL_SECS: i64 = 1800;

/// Storage for resolved results and candidate version lists
///
/// Entries older than the configured TTL behave as if they were absent.
#[cfg_attr(test, automock)]
pub trait ResultStore: Send + Sync {
    fn get_result(
        &self,
        ecosystem: Ecosystem,
        package_name: &str,
        version: &str,
    ) -> Result<Option<PackageResult>, CacheError>;

    fn put_result(
        &self,
        ecosystem: Ecosystem,
        package_name: &str,
        version: &str,
        result: &PackageResult,
    ) -> Result<(), CacheError>;

    fn get_versions(
        &self,
        ecosystem: Ecosystem,
        package_name: &str,
    ) -> Result<Option<PackageVersions>, CacheError>;

    fn replace_versions(
        &self,
        ecosystem: Ecosystem,
        package_name: &str,
        versions: &PackageVersions,
    ) -> Result<(), CacheError>;

    /// Delete every expired entry, returning how many rows were removed
    fn purge_expired(&self) -> Result<usize, CacheError>;
}

/// Schema migrations
/// Each version contains a list of SQL statements to execute
const MIGRATIONS: &[&[&str]] = &[
    // v1: expiry scans
    &[
        "CREATE INDEX IF NOT EXISTS idx_results_stored_at ON results(stored_at)",
        "CREATE INDEX IF NOT EXISTS idx_packages_updated_at ON packages(updated_at)",
    ],
];

pub struct Cache {
    conn: Mutex<Connection>,
    ttl_ms: i64,
}

impl Cache {
    pub fn new(db_path: &Path, ttl_secs: i64) -> Result<Self, CacheError> {
        info!("Initializing cache database at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        debug!("Database connection established");

        let cache = Self {
            conn: Mutex::new(conn),
            ttl_ms: ttl_secs.saturating_mul(1000),
        };

        cache.create_schema()?;
        info!("Cache initialized successfully");

        Ok(cache)
    }

    /// Acquire database connection lock with proper error handling
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    fn current_timestamp_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Oldest `stored_at` that still counts as fresh
    fn freshness_threshold(&self) -> i64 {
        Self::current_timestamp_ms() - self.ttl_ms
    }

    fn create_schema(&self) -> Result<(), CacheError> {
        debug!("Creating database schema");

        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ecosystem TEXT NOT NULL,
                package_name TEXT NOT NULL,
                version TEXT NOT NULL,
                payload TEXT NOT NULL,
                stored_at INTEGER NOT NULL,
                UNIQUE(ecosystem, package_name, version)
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS packages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ecosystem TEXT NOT NULL,
                package_name TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE(ecosystem, package_name)
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                package_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                version TEXT NOT NULL,
                FOREIGN KEY (package_id) REFERENCES packages(id) ON DELETE CASCADE,
                UNIQUE(package_id, version)
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_package_id ON versions(package_id)",
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS dist_tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                package_id INTEGER NOT NULL,
                tag_name TEXT NOT NULL,
                version TEXT NOT NULL,
                FOREIGN KEY (package_id) REFERENCES packages(id) ON DELETE CASCADE,
                UNIQUE(package_id, tag_name)
            )
            "#,
            [],
        )?;

        Self::apply_migrations(&conn)?;

        debug!("Database schema created successfully");
        Ok(())
    }

    /// Apply pending migrations based on user_version pragma
    fn apply_migrations(conn: &Connection) -> Result<(), CacheError> {
        let current_version: i32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        for (i, statements) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                for sql in *statements {
                    conn.execute(sql, [])?;
                }
                debug!("Applied migration v{}", version);
            }
        }

        let target_version = MIGRATIONS.len() as i32;
        if target_version > current_version {
            conn.pragma_update(None, "user_version", target_version)?;
            debug!("Updated schema version to v{}", target_version);
        }

        Ok(())
    }

    fn fresh_package_id(
        conn: &Connection,
        ecosystem: &str,
        package_name: &str,
        threshold: i64,
    ) -> Result<Option<i64>, CacheError> {
        let id = conn
            .query_row(
                r#"
                SELECT id FROM packages
                WHERE ecosystem = ?1 AND package_name = ?2 AND updated_at > ?3
                "#,
                (ecosystem, package_name, threshold),
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }
}

impl ResultStore for Cache {
    fn get_result(
        &self,
        ecosystem: Ecosystem,
        package_name: &str,
        version: &str,
    ) -> Result<Option<PackageResult>, CacheError> {
        let threshold = self.freshness_threshold();
        let conn = self.lock_conn()?;
        let payload: Option<String> = conn
            .query_row(
                r#"
                SELECT payload FROM results
                WHERE ecosystem = ?1 AND package_name = ?2 AND version = ?3 AND stored_at > ?4
                "#,
                (ecosystem.as_str(), package_name, version, threshold),
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(payload) => {
                info!("Cache hit for {}/{}@{}", ecosystem, package_name, version);
                Ok(Some(serde_json::from_str(&payload)?))
            }
            None => Ok(None),
        }
    }

    fn put_result(
        &self,
        ecosystem: Ecosystem,
        package_name: &str,
        version: &str,
        result: &PackageResult,
    ) -> Result<(), CacheError> {
        let payload = serde_json::to_string(result)?;
        let now = Self::current_timestamp_ms();

        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO results (ecosystem, package_name, version, payload, stored_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(ecosystem, package_name, version)
            DO UPDATE SET payload = excluded.payload, stored_at = excluded.stored_at
            "#,
            (ecosystem.as_str(), package_name, version, payload, now),
        )?;

        info!("Saved result for {}/{}@{}", ecosystem, package_name, version);
        Ok(())
    }

    fn get_versions(
        &self,
        ecosystem: Ecosystem,
        package_name: &str,
    ) -> Result<Option<PackageVersions>, CacheError> {
        let threshold = self.freshness_threshold();
        let conn = self.lock_conn()?;

        let Some(package_id) =
            Self::fresh_package_id(&conn, ecosystem.as_str(), package_name, threshold)?
        else {
            return Ok(None);
        };

        let mut stmt =
            conn.prepare("SELECT version FROM versions WHERE package_id = ?1 ORDER BY position")?;
        let versions = stmt
            .query_map([package_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        let mut stmt = conn.prepare("SELECT tag_name, version FROM dist_tags WHERE package_id = ?1")?;
        let dist_tags = stmt
            .query_map([package_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<HashMap<String, String>, _>>()?;

        debug!(
            "Cache hit for {} versions of {}/{}",
            versions.len(),
            ecosystem,
            package_name
        );
        Ok(Some(PackageVersions::with_dist_tags(versions, dist_tags)))
    }

    fn replace_versions(
        &self,
        ecosystem: Ecosystem,
        package_name: &str,
        versions: &PackageVersions,
    ) -> Result<(), CacheError> {
        let ecosystem = ecosystem.as_str();
        debug!(
            "Saving {} versions for {}/{}",
            versions.versions.len(),
            ecosystem,
            package_name
        );

        let now = Self::current_timestamp_ms();

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO packages (ecosystem, package_name, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(ecosystem, package_name) DO UPDATE SET updated_at = excluded.updated_at
            "#,
            (ecosystem, package_name, now),
        )?;

        let package_id: i64 = tx.query_row(
            "SELECT id FROM packages WHERE ecosystem = ?1 AND package_name = ?2",
            (ecosystem, package_name),
            |row| row.get(0),
        )?;

        tx.execute("DELETE FROM versions WHERE package_id = ?1", [package_id])?;
        tx.execute("DELETE FROM dist_tags WHERE package_id = ?1", [package_id])?;

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO versions (package_id, position, version) VALUES (?1, ?2, ?3)",
            )?;
            for (position, version) in versions.versions.iter().enumerate() {
                stmt.execute((package_id, position as i64, version))?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO dist_tags (package_id, tag_name, version) VALUES (?1, ?2, ?3)",
            )?;
            for (tag_name, version) in &versions.dist_tags {
                stmt.execute((package_id, tag_name, version))?;
            }
        }

        tx.commit()?;

        debug!(
            "Successfully saved versions for {}/{}",
            ecosystem, package_name
        );
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize, CacheError> {
        let threshold = self.freshness_threshold();
        let conn = self.lock_conn()?;

        let results = conn.execute("DELETE FROM results WHERE stored_at <= ?1", [threshold])?;
        let packages = conn.execute("DELETE FROM packages WHERE updated_at <= ?1", [threshold])?;

        info!(
            "Purged {} expired results and {} expired version lists",
            results, packages
        );
        Ok(results + packages)
    }
}
