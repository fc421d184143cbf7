use crate::gateway::{CardGateway, GatewayError};
use crate::models::{Card, default_collection};
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum CardError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Storage error: {0}")]
    Infrastructure(String),
    #[error("Card not found")]
    NotFound,
    #[error("No card is being edited")]
    NoDraft,
}

impl From<GatewayError> for CardError {
    fn from(err: GatewayError) -> Self {
        CardError::Infrastructure(err.to_string())
    }
}

pub struct CardService;

impl CardService {
    /// Startup load: remote first, then the local copy, then the built-in sample.
    #[instrument(skip(gateway))]
    pub async fn load_collection(gateway: &dyn CardGateway) -> Vec<Card> {
        if gateway.is_remote_configured() {
            if let Some(cards) = gateway.load().await.filter(|c| !c.is_empty()) {
                tracing::info!("Loaded {} cards from remote backend", cards.len());
                return cards;
            }
        }

        match gateway.local().read().await {
            Ok(Some(cards)) => {
                tracing::info!("Loaded {} cards from local storage", cards.len());
                cards
            }
            Ok(None) => {
                tracing::info!("Local storage is empty, using default cards");
                default_collection()
            }
            Err(e) => {
                tracing::warn!("Local storage unusable ({}), using default cards", e);
                default_collection()
            }
        }
    }
}
