//! Persistence for the card collection.
//!
//! Two implementations of [`CardGateway`] exist and one is picked at startup:
//! [`LocalGateway`] keeps everything in the local store, [`RemoteGateway`]
//! additionally mirrors every write to the remote table and blob bucket.
//! Both write the local copy first; it is the only copy guaranteed to exist.

use crate::local::LocalStore;
use crate::models::{Card, ImageUpload};
use crate::remote::{RemoteClient, RemoteConfig};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use database::{Database, RepositoryError};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Local storage error: {0}")]
    Local(#[from] RepositoryError),
    #[error("Local storage holds unreadable data: {0}")]
    Corrupt(serde_json::Error),
    #[error("Failed to encode collection: {0}")]
    Encoding(serde_json::Error),
    #[error("Remote backend error: {0}")]
    Remote(#[from] reqwest::Error),
    #[error("Invalid remote credential: {0}")]
    InvalidCredential(String),
}

#[async_trait]
pub trait CardGateway: Send + Sync {
    fn is_remote_configured(&self) -> bool;

    fn local(&self) -> &LocalStore;

    /// The remote collection in persisted order, or `None` when there is no
    /// remote or it could not be read.
    async fn load(&self) -> Option<Vec<Card>>;

    /// Overwrites the local copy, then pushes to the remote if there is one.
    /// `Ok(false)` means the local write happened but the remote one did not.
    async fn save(&self, cards: &[Card]) -> Result<bool, GatewayError>;

    /// Removes a card remotely. The local copy is updated by the save that follows.
    async fn delete(&self, id: &str) -> bool;

    /// Returns the address the card should reference for this image.
    async fn upload_image(&self, upload: ImageUpload) -> Option<String>;
}

pub struct LocalGateway {
    store: LocalStore,
}

impl LocalGateway {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CardGateway for LocalGateway {
    fn is_remote_configured(&self) -> bool {
        false
    }

    fn local(&self) -> &LocalStore {
        &self.store
    }

    async fn load(&self) -> Option<Vec<Card>> {
        None
    }

    async fn save(&self, cards: &[Card]) -> Result<bool, GatewayError> {
        self.store.write(cards).await?;
        Ok(true)
    }

    async fn delete(&self, _id: &str) -> bool {
        true
    }

    async fn upload_image(&self, upload: ImageUpload) -> Option<String> {
        Some(data_url(&upload))
    }
}

pub struct RemoteGateway {
    store: LocalStore,
    client: RemoteClient,
}

impl RemoteGateway {
    pub fn new(store: LocalStore, client: RemoteClient) -> Self {
        Self { store, client }
    }
}

#[async_trait]
impl CardGateway for RemoteGateway {
    fn is_remote_configured(&self) -> bool {
        true
    }

    fn local(&self) -> &LocalStore {
        &self.store
    }

    async fn load(&self) -> Option<Vec<Card>> {
        match self.client.fetch_cards().await {
            Ok(cards) => Some(cards),
            Err(e) => {
                tracing::error!("Error fetching cards: {}", e);
                None
            }
        }
    }

    async fn save(&self, cards: &[Card]) -> Result<bool, GatewayError> {
        self.store.write(cards).await?;

        match self.client.upsert_cards(cards).await {
            Ok(()) => Ok(true),
            Err(e) => {
                tracing::error!("Error saving cards: {}", e);
                Ok(false)
            }
        }
    }

    async fn delete(&self, id: &str) -> bool {
        match self.client.delete_card(id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Error deleting card {}: {}", id, e);
                false
            }
        }
    }

    async fn upload_image(&self, upload: ImageUpload) -> Option<String> {
        match self.client.upload_image(upload).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::error!("Upload error: {}", e);
                None
            }
        }
    }
}

/// Inline `data:` URL for an image that has nowhere else to live.
pub fn data_url(upload: &ImageUpload) -> String {
    let mime = if upload.content_type.is_empty() {
        "application/octet-stream"
    } else {
        upload.content_type.as_str()
    };
    format!("data:{};base64,{}", mime, STANDARD.encode(&upload.bytes))
}

/// Picks the gateway once, based on whether remote settings are present.
pub fn select_gateway(db: Database, remote: Option<RemoteConfig>) -> Arc<dyn CardGateway> {
    let store = LocalStore::new(db);
    match remote {
        Some(config) => {
            tracing::info!("Remote backend configured at {}", config.url);
            Arc::new(RemoteGateway::new(store, RemoteClient::new(config)))
        }
        None => {
            tracing::info!("No remote backend configured, using local storage only");
            Arc::new(LocalGateway::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_collection;
    use crate::remote::{DEFAULT_BUCKET, DEFAULT_TABLE};
    use database::get_test_db;

    fn png(bytes: &[u8]) -> ImageUpload {
        ImageUpload {
            file_name: "card.png".into(),
            content_type: "image/png".into(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_data_url_encoding() {
        assert_eq!(data_url(&png(b"hi")), "data:image/png;base64,aGk=");

        let mut untyped = png(b"hi");
        untyped.content_type.clear();
        assert!(data_url(&untyped).starts_with("data:application/octet-stream;base64,"));
    }

    #[tokio::test]
    async fn test_select_gateway_by_config() {
        let db = get_test_db().await;
        assert!(!select_gateway(db.clone(), None).is_remote_configured());

        let remote = RemoteConfig::from_parts(Some("http://127.0.0.1:9"), Some("k"), DEFAULT_TABLE, DEFAULT_BUCKET);
        assert!(select_gateway(db, remote).is_remote_configured());
    }

    #[tokio::test]
    async fn test_local_gateway_save_writes_store() {
        let gateway = LocalGateway::new(LocalStore::new(get_test_db().await));
        let cards = default_collection();

        assert!(gateway.save(&cards).await.unwrap());
        assert!(gateway.load().await.is_none());
        assert_eq!(gateway.local().read().await.unwrap(), Some(cards));
    }

    #[tokio::test]
    async fn test_local_gateway_inlines_images() {
        let gateway = LocalGateway::new(LocalStore::new(get_test_db().await));
        let url = gateway.upload_image(png(b"\x89PNG")).await.unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        assert!(gateway.delete("anything").await);
    }

    #[tokio::test]
    async fn test_unreachable_remote_degrades() {
        let db = get_test_db().await;
        let config = RemoteConfig::from_parts(Some("http://127.0.0.1:9"), Some("k"), DEFAULT_TABLE, DEFAULT_BUCKET).unwrap();
        let gateway = RemoteGateway::new(LocalStore::new(db), RemoteClient::new(config));
        let cards = default_collection();

        assert!(gateway.load().await.is_none());
        assert!(!gateway.save(&cards).await.unwrap());
        assert_eq!(gateway.local().read().await.unwrap(), Some(cards));
        assert!(!gateway.delete("sample-1").await);
        assert!(gateway.upload_image(png(b"x")).await.is_none());
    }
}
