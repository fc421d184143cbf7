use crate::gateway::GatewayError;
use crate::models::{Card, ImageUpload};
use rand::Rng;
use rand::distributions::Alphanumeric;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::instrument;

pub const DEFAULT_TABLE: &str = "kt_cards";
pub const DEFAULT_BUCKET: &str = "card-images";

/// Folder inside the bucket that uploaded card images land in.
const IMAGE_FOLDER: &str = "card-images";

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub url: String,
    pub key: String,
    pub table: String,
    pub bucket: String,
}

impl RemoteConfig {
    /// Remote mode is on only when both the endpoint and the credential are non-empty.
    pub fn from_parts(
        url: Option<&str>,
        key: Option<&str>,
        table: &str,
        bucket: &str,
    ) -> Option<Self> {
        let url = url.map(str::trim).filter(|s| !s.is_empty())?;
        let key = key.map(str::trim).filter(|s| !s.is_empty())?;
        Some(Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            table: table.to_string(),
            bucket: bucket.to_string(),
        })
    }
}

/// A card as stored in the remote table: the card itself plus its position.
#[derive(Debug, Serialize, Deserialize)]
struct CardRow {
    #[serde(flatten)]
    card: Card,
    #[serde(default)]
    order_index: i64,
}

/// Thin client for a PostgREST table plus an object-storage bucket.
pub struct RemoteClient {
    config: RemoteConfig,
    http: reqwest::Client,
}

impl RemoteClient {
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url, self.config.table)
    }

    fn auth_headers(&self) -> Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.config.key)
            .map_err(|e| GatewayError::InvalidCredential(e.to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.config.key))
            .map_err(|e| GatewayError::InvalidCredential(e.to_string()))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }

    #[instrument(skip(self))]
    pub async fn fetch_cards(&self) -> Result<Vec<Card>, GatewayError> {
        let rows: Vec<CardRow> = self
            .http
            .get(self.table_url())
            .headers(self.auth_headers()?)
            .query(&[("select", "*"), ("order", "order_index.asc")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(rows.into_iter().map(|r| r.card).collect())
    }

    /// Upserts every card, stamping `order_index` with its position.
    #[instrument(skip(self, cards), fields(count = cards.len()))]
    pub async fn upsert_cards(&self, cards: &[Card]) -> Result<(), GatewayError> {
        let payload: Vec<CardRow> = cards
            .iter()
            .enumerate()
            .map(|(index, card)| CardRow {
                card: card.clone(),
                order_index: index as i64,
            })
            .collect();

        self.http
            .post(self.table_url())
            .headers(self.auth_headers()?)
            .header("Prefer", "resolution=merge-duplicates")
            .query(&[("on_conflict", "id")])
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_card(&self, id: &str) -> Result<(), GatewayError> {
        self.http
            .delete(self.table_url())
            .headers(self.auth_headers()?)
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Stores the image under a random name and returns its public address.
    #[instrument(skip(self, upload), fields(file_name = %upload.file_name, size = upload.bytes.len()))]
    pub async fn upload_image(&self, upload: ImageUpload) -> Result<String, GatewayError> {
        let path = format!("{}/{}.{}", IMAGE_FOLDER, random_file_stem(), upload.extension());
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.config.url, self.config.bucket, path
        );

        self.http
            .post(url)
            .headers(self.auth_headers()?)
            .header(CONTENT_TYPE, upload.content_type)
            .body(upload.bytes)
            .send()
            .await?
            .error_for_status()?;

        Ok(self.public_url(&path))
    }

    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.url, self.config.bucket, path
        )
    }
}

fn random_file_stem() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(11)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_requires_url_and_key() {
        assert!(RemoteConfig::from_parts(None, Some("k"), DEFAULT_TABLE, DEFAULT_BUCKET).is_none());
        assert!(RemoteConfig::from_parts(Some("https://x.supabase.co"), Some("  "), DEFAULT_TABLE, DEFAULT_BUCKET).is_none());
        assert!(RemoteConfig::from_parts(Some(""), Some("k"), DEFAULT_TABLE, DEFAULT_BUCKET).is_none());

        let config = RemoteConfig::from_parts(Some("https://x.supabase.co/"), Some("k"), DEFAULT_TABLE, DEFAULT_BUCKET).unwrap();
        assert_eq!(config.url, "https://x.supabase.co");
    }

    #[test]
    fn test_public_url_layout() {
        let config = RemoteConfig::from_parts(Some("https://x.supabase.co"), Some("k"), DEFAULT_TABLE, DEFAULT_BUCKET).unwrap();
        let client = RemoteClient::new(config);
        assert_eq!(
            client.public_url("card-images/abc.png"),
            "https://x.supabase.co/storage/v1/object/public/card-images/card-images/abc.png"
        );
    }

    #[test]
    fn test_random_file_stem_is_lowercase_alphanumeric() {
        let stem = random_file_stem();
        assert_eq!(stem.len(), 11);
        assert!(stem.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_card_row_carries_order_index() {
        let row = CardRow { card: Card::blank("a"), order_index: 3 };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["order_index"], 3);
        assert_eq!(value["id"], "a");
        assert!(value.get("card").is_none());
    }
}
