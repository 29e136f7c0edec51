pub mod entities;
pub mod keys;
pub mod kv;
pub mod migrator;
pub mod records;
pub mod repositories;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr};
use tracing::info;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://./booking.db?mode=rwc")
    pub url: String,
    /// Upper bound on pooled connections; `None` keeps the driver default.
    pub max_connections: Option<u32>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::sqlite("./rental.db")
    }
}

impl DatabaseConfig {
    /// Create config for a SQLite file, creating it when missing
    pub fn sqlite(path: &str) -> Self {
        Self {
            url: format!("sqlite://{}?mode=rwc", path),
            max_connections: None,
        }
    }

    /// Private in-memory database. Every pooled connection would get its own
    /// empty database, so the pool is pinned to a single connection.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: Some(1),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:")
    }
}

/// Initialize database connection
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    info!("Connecting to database: {}", config.url);

    let mut options = ConnectOptions::new(config.url.clone());
    options.sqlx_logging(false);
    if let Some(max) = config.max_connections {
        options.max_connections(max).min_connections(1);
    }

    let db = Database::connect(options).await?;

    if !config.is_in_memory() {
        // Readers keep their snapshot while a writer commits.
        db.execute_unprepared("PRAGMA journal_mode=WAL").await?;
    }

    info!("Database connected successfully");
    Ok(db)
}

/// Whether `err` means another transaction won a write race.
///
/// SQLite reports this as a busy/locked database (including a stale WAL
/// snapshot trying to write). A unique-key violation on insert means a
/// concurrent transaction committed the same key first.
pub fn is_write_conflict(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }
    let message = err.to_string();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("SQLITE_BUSY")
}
