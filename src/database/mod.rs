/// Database abstraction layer
///
/// Provides the persistence gateway the polling engine consumes: target
/// records and append-only poll results over LibSQL.

pub mod migrations;
pub mod models;
pub mod repository;

#[cfg(test)]
pub mod memory;

pub use repository::{Database, DatabaseImpl};

use anyhow::Result;

/// Initialize database with schema
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    migrations::run_migrations(conn).await
}
