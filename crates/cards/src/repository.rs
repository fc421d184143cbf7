use database::{self, RepositoryError};
use sqlx::FromRow;

#[derive(FromRow)]
struct EntryRecord {
    value: String,
}

/// Text entries keyed by name, the server-side stand-in for browser local storage.
pub(crate) struct LocalStorageRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> LocalStorageRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn get(&mut self, key: &str) -> Result<Option<String>, RepositoryError> {
        let record = sqlx::query_as::<_, EntryRecord>(
            "SELECT value FROM local_storage WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(record.map(|r| r.value))
    }

    pub async fn set(&mut self, key: &str, value: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO local_storage (key, value, updated_at)
            VALUES ($1, $2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::get_test_db;

    #[tokio::test]
    async fn test_get_missing_key() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = LocalStorageRepository::new(uow.connection());

        assert!(repo.get("nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = LocalStorageRepository::new(uow.connection());

        repo.set("kt_cards_data", "[]").await.unwrap();
        repo.set("kt_cards_data", "[1]").await.unwrap();

        assert_eq!(repo.get("kt_cards_data").await.unwrap().as_deref(), Some("[1]"));
    }
}
