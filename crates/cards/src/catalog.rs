use crate::editor::CollectionEditor;
use crate::gateway::CardGateway;
use crate::models::{Card, Direction, ImageUpload};
use crate::service::{CardError, CardService};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

/// Application state for the card list: the in-memory collection, the single
/// editing slot, and the gateway every change is persisted through.
///
/// Mutations hold the collection's write lock while persisting, so edits are
/// applied one at a time and readers only ever see a whole collection.
pub struct CardCatalog {
    gateway: Arc<dyn CardGateway>,
    cards: RwLock<Vec<Card>>,
    draft: Mutex<Option<Card>>,
    remote_in_sync: AtomicBool,
    pending_deletes: Mutex<Vec<String>>,
}

impl CardCatalog {
    pub async fn load(gateway: Arc<dyn CardGateway>) -> Self {
        let cards = CardService::load_collection(gateway.as_ref()).await;
        Self {
            gateway,
            cards: RwLock::new(cards),
            draft: Mutex::new(None),
            remote_in_sync: AtomicBool::new(true),
            pending_deletes: Mutex::new(Vec::new()),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.gateway.is_remote_configured()
    }

    /// False after a save or delete that reached local storage but not the
    /// remote backend.
    pub fn remote_in_sync(&self) -> bool {
        self.remote_in_sync.load(Ordering::Relaxed)
    }

    pub async fn cards(&self) -> Vec<Card> {
        self.cards.read().await.clone()
    }

    /// Persists `edit(current)` and swaps it in. An unchanged collection is
    /// only written again while the remote copy is behind.
    async fn commit<F>(&self, edit: F) -> Result<Vec<Card>, CardError>
    where
        F: FnOnce(&[Card]) -> Vec<Card>,
    {
        let mut cards = self.cards.write().await;
        let next = edit(cards.as_slice());
        if next == *cards && self.remote_in_sync() {
            return Ok(next);
        }

        let deletes_synced = self.retry_deletes().await;
        let saved = self.gateway.save(&next).await?;
        let synced = saved && deletes_synced;
        if !synced {
            tracing::warn!("Collection saved locally but not to the remote backend");
        }
        self.remote_in_sync.store(synced, Ordering::Relaxed);

        *cards = next.clone();
        Ok(next)
    }

    /// Replays remote deletes that failed earlier. Runs before the upsert so a
    /// card re-added under the same id is written back.
    async fn retry_deletes(&self) -> bool {
        let mut pending = self.pending_deletes.lock().await;
        let mut still_pending = Vec::new();
        for id in pending.drain(..) {
            if !self.gateway.delete(&id).await {
                still_pending.push(id);
            }
        }
        *pending = still_pending;
        pending.is_empty()
    }

    #[instrument(skip(self))]
    pub async fn create(&self) -> Result<Card, CardError> {
        let next = self.commit(CollectionEditor::create).await?;
        next.last().cloned().ok_or(CardError::NotFound)
    }

    #[instrument(skip(self, card), fields(id = %card.id))]
    pub async fn update(&self, card: Card) -> Result<(), CardError> {
        if card.id.trim().is_empty() {
            return Err(CardError::InvalidInput("Card id cannot be empty".into()));
        }
        self.commit(|cards| CollectionEditor::update(cards, card)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, id: &str) -> Result<(), CardError> {
        if !self.gateway.delete(id).await {
            tracing::warn!("Remote delete of card {} failed", id);
            self.pending_deletes.lock().await.push(id.to_string());
            self.remote_in_sync.store(false, Ordering::Relaxed);
        }
        self.commit(|cards| CollectionEditor::remove(cards, id)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn reorder(&self, index: usize, direction: Direction) -> Result<(), CardError> {
        self.commit(|cards| CollectionEditor::reorder(cards, index, direction)).await?;
        Ok(())
    }

    /// Fills the editing slot with a blank card that is not yet in the collection.
    pub async fn begin_new(&self) -> Card {
        let id = CollectionEditor::next_card_id(&self.cards.read().await);
        let card = Card::blank(id);
        *self.draft.lock().await = Some(card.clone());
        card
    }

    pub async fn begin_edit(&self, id: &str) -> Result<Card, CardError> {
        let card = self
            .cards
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(CardError::NotFound)?;
        *self.draft.lock().await = Some(card.clone());
        Ok(card)
    }

    pub async fn draft(&self) -> Option<Card> {
        self.draft.lock().await.clone()
    }

    pub async fn edit_draft<F>(&self, edit: F) -> Result<Card, CardError>
    where
        F: FnOnce(&Card) -> Card,
    {
        let mut slot = self.draft.lock().await;
        let current = slot.as_ref().ok_or(CardError::NoDraft)?;
        let next = edit(current);
        *slot = Some(next.clone());
        Ok(next)
    }

    pub async fn cancel_edit(&self) {
        *self.draft.lock().await = None;
    }

    /// Commits the draft with `update` and empties the slot. On failure the
    /// draft stays so the save can be retried.
    #[instrument(skip(self))]
    pub async fn save_draft(&self) -> Result<Card, CardError> {
        let card = self.draft().await.ok_or(CardError::NoDraft)?;
        self.update(card.clone()).await?;

        let mut slot = self.draft.lock().await;
        if slot.as_ref().is_some_and(|d| d.id == card.id) {
            *slot = None;
        }
        Ok(card)
    }

    /// Stores the image and points the draft at it. `Ok(None)` when the upload failed.
    #[instrument(skip(self, upload), fields(file_name = %upload.file_name))]
    pub async fn upload_image(&self, upload: ImageUpload) -> Result<Option<String>, CardError> {
        if self.draft().await.is_none() {
            return Err(CardError::NoDraft);
        }
        let Some(url) = self.gateway.upload_image(upload).await else {
            return Ok(None);
        };
        self.edit_draft(|card| Card {
            image_url: url.clone(),
            ..card.clone()
        })
        .await?;
        Ok(Some(url))
    }
}
