use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteConnectOptions};
use sqlx::{Transaction, Sqlite};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

pub use sqlx::Error;
pub use sqlx::Result;

static TEST_DB_COUNTER: AtomicU64 = AtomicU64::new(0);

// --- Driver Adapter Pattern ---
pub type Driver = Sqlite;
pub type Connection = sqlx::SqliteConnection;
pub type Pool = SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Infrastructure(#[from] sqlx::Error),
}

/// Handle to the local SQLite file backing the on-device store.
#[derive(Clone)]
pub struct Database {
    pub pool: Pool,
}

impl Database {
    pub async fn new(connection_string: &str) -> sqlx::Result<Self> {
        let options = SqliteConnectOptions::from_str(connection_string)?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), Box<dyn std::error::Error>> {
        tracing::info!("Running migrations...");
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await?;
        tracing::info!("Migrations complete.");
        Ok(())
    }

    pub async fn begin(&self) -> Result<UnitOfWork<'_>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(UnitOfWork { tx })
    }
}

pub struct UnitOfWork<'a> {
    tx: Transaction<'a, Driver>,
}

impl<'a> UnitOfWork<'a> {
    pub async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }

    pub fn connection(&mut self) -> &mut Connection {
        &mut *self.tx
    }
}

// do not add #[cfg(test)] here because it hides this method from libraries.
pub async fn get_test_db() -> Database {
    use std::time::{SystemTime, UNIX_EPOCH};

    // Unique file per test; the counter covers tests started within the same nanosecond.
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let seq = TEST_DB_COUNTER.fetch_add(1, Ordering::Relaxed);
    let db_path = std::env::temp_dir().join(format!("test_cards_{}_{}.db", now, seq));
    let connection_string = format!("sqlite:{}", db_path.display());

    let options = SqliteConnectOptions::from_str(&connection_string).unwrap()
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1) // Single connection is safer for SQLite tests
        .connect_with(options)
        .await
        .expect("Failed to create test database pool");

    let db = Database { pool };
    db.run_migrations().await.expect("Failed to run migrations");

    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_create_local_storage() {
        let db = get_test_db().await;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM local_storage")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_unit_of_work_commit_persists() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        sqlx::query("INSERT INTO local_storage (key, value) VALUES ($1, $2)")
            .bind("k")
            .bind("v")
            .execute(uow.connection())
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let value: String = sqlx::query_scalar("SELECT value FROM local_storage WHERE key = $1")
            .bind("k")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(value, "v");
    }

    #[tokio::test]
    async fn test_sql_failure_maps_to_infrastructure() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let err = sqlx::query("SELECT value FROM missing_table")
            .execute(uow.connection())
            .await
            .map_err(RepositoryError::from)
            .unwrap_err();
        assert!(err.to_string().starts_with("Database error:"));
    }
}
