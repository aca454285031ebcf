//! Database connection manager backed by an r2d2 SQLite pool.

use std::path::{Path, PathBuf};

use chrono::Utc;
use fieldline_domain::Result;
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::info;

use crate::errors::{map_pool_error, map_sql_error};

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Pooled SQLite connection.
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database manager wrapping the connection pool.
pub struct DbManager {
    pool: r2d2::Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl DbManager {
    /// Create a new manager with the given pool size.
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        let manager = SqliteConnectionManager::file(&path).with_init(|conn| {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")
        });
        let pool = r2d2::Pool::builder()
            .max_size(pool_size.max(1))
            .build(manager)
            .map_err(map_pool_error)?;

        info!(
            db_path = %path.display(),
            max_connections = pool.max_size(),
            "sqlite pool initialised"
        );

        Ok(Self { pool, path })
    }

    /// Acquire a connection from the pool.
    pub fn get_connection(&self) -> Result<DbConnection> {
        self.pool.get().map_err(map_pool_error)
    }

    /// Ensure the full schema exists and the lookup seed rows are present.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(SCHEMA_SQL).map_err(map_sql_error)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, ?2)",
            params![SCHEMA_VERSION, Utc::now().timestamp()],
        )
        .map_err(map_sql_error)?;
        seed_lookups(&conn)?;
        Ok(())
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Perform a health check to verify database connectivity.
    pub fn health_check(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", params![], |row| row.get::<_, i32>(0))
            .map_err(map_sql_error)?;
        Ok(())
    }
}

/// Seed the closed lookup sets the process rules depend on.
fn seed_lookups(conn: &DbConnection) -> Result<()> {
    for name in ["Survey", "Install", "Remedial"] {
        conn.execute(
            "INSERT OR IGNORE INTO work_order_types (name) VALUES (?1)",
            params![name],
        )
        .map_err(map_sql_error)?;
    }

    for (name, requires_survey) in
        [("Auto Quote", false), ("Desktop", false), ("Site Survey", true)]
    {
        conn.execute(
            "INSERT OR IGNORE INTO assessment_paths (name, requires_survey) VALUES (?1, ?2)",
            params![name, requires_survey as i64],
        )
        .map_err(map_sql_error)?;
    }

    for name in ["Paying", "Grant"] {
        conn.execute("INSERT OR IGNORE INTO funding_types (name) VALUES (?1)", params![name])
            .map_err(map_sql_error)?;
    }

    for name in ["Web Form", "Social", "Phone", "Manual"] {
        conn.execute("INSERT OR IGNORE INTO lead_sources (name) VALUES (?1)", params![name])
            .map_err(map_sql_error)?;
    }

    for name in ["Photo", "Document", "Reading"] {
        conn.execute(
            "INSERT OR IGNORE INTO evidence_categories (name) VALUES (?1)",
            params![name],
        )
        .map_err(map_sql_error)?;
    }

    conn.execute(
        "INSERT OR IGNORE INTO product_offerings (name, technology_group) VALUES (?1, ?2)",
        params!["Gas Boiler", "Heating"],
    )
    .map_err(map_sql_error)?;

    Ok(())
}
