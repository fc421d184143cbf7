use crate::gateway::GatewayError;
use crate::models::Card;
use crate::repository::LocalStorageRepository;
use database::{Database, RepositoryError};
use tracing::instrument;

/// Key under which the whole collection is stored as JSON text.
pub const LOCAL_STORAGE_KEY: &str = "kt_cards_data";

/// The on-device copy of the collection: one JSON entry in `local_storage`.
#[derive(Clone)]
pub struct LocalStore {
    db: Database,
}

impl LocalStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// `Ok(None)` when nothing has been stored yet. Unparseable text is
    /// reported as [`GatewayError::Corrupt`].
    #[instrument(skip(self))]
    pub async fn read(&self) -> Result<Option<Vec<Card>>, GatewayError> {
        let mut uow = self.db.begin().await?;
        let mut repo = LocalStorageRepository::new(uow.connection());

        let Some(raw) = repo.get(LOCAL_STORAGE_KEY).await? else {
            return Ok(None);
        };
        let cards = serde_json::from_str(&raw).map_err(GatewayError::Corrupt)?;
        Ok(Some(cards))
    }

    #[instrument(skip(self, cards), fields(count = cards.len()))]
    pub async fn write(&self, cards: &[Card]) -> Result<(), GatewayError> {
        let raw = serde_json::to_string(cards).map_err(GatewayError::Encoding)?;

        let mut uow = self.db.begin().await?;
        let mut repo = LocalStorageRepository::new(uow.connection());
        repo.set(LOCAL_STORAGE_KEY, &raw).await?;
        uow.commit().await.map_err(RepositoryError::from)?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn write_raw(&self, raw: &str) {
        let mut uow = self.db.begin().await.unwrap();
        LocalStorageRepository::new(uow.connection())
            .set(LOCAL_STORAGE_KEY, raw)
            .await
            .unwrap();
        uow.commit().await.unwrap();
    }
}
