use deadpool::managed::{self, Pool, RecycleError, RecycleResult};
use libsql::{Connection, Database, Error as LibsqlError};

/// Deadpool manager handing out libsql connections.
///
/// Each gateway operation takes its own pooled connection, so concurrent
/// poll tasks never share one.
pub struct DbManager {
    database: Database,
}

impl DbManager {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

impl managed::Manager for DbManager {
    type Type = Connection;
    type Error = LibsqlError;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        let conn = self.database.connect()?;
        // Cascading deletes (targets -> poll_results) depend on this pragma
        conn.execute("PRAGMA foreign_keys = ON", ()).await?;
        Ok(conn)
    }

    async fn recycle(
        &self,
        conn: &mut Self::Type,
        _: &managed::Metrics,
    ) -> RecycleResult<Self::Error> {
        // Liveness probe before the connection is reused
        conn.query("SELECT 1", ())
            .await
            .map_err(RecycleError::Backend)?
            .next()
            .await
            .map_err(RecycleError::Backend)?;
        Ok(())
    }
}

pub type DbPool = Pool<DbManager>;
