use cards::catalog::CardCatalog;
use cards::remote::{DEFAULT_BUCKET, DEFAULT_TABLE, RemoteConfig};
use clap::Parser;
use std::sync::Arc;

pub mod auth;

pub struct AppState {
    pub catalog: Arc<CardCatalog>,
    pub config: Config,
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// SQLite file holding the local copy of the card list.
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:cards.db")]
    pub database_url: String,

    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Shared admin password, compared as plain text.
    #[arg(long, env = "ADMIN_PASSWORD", default_value = auth::DEFAULT_ADMIN_PASSWORD)]
    pub admin_password: String,

    /// Base URL of the hosted table/blob backend.
    #[arg(long, env = "REMOTE_URL")]
    pub remote_url: Option<String>,

    /// Access key for the hosted backend.
    #[arg(long, env = "REMOTE_KEY", hide_env_values = true)]
    pub remote_key: Option<String>,

    #[arg(long, env = "REMOTE_TABLE", default_value = DEFAULT_TABLE)]
    pub remote_table: String,

    #[arg(long, env = "REMOTE_BUCKET", default_value = DEFAULT_BUCKET)]
    pub remote_bucket: String,
}

impl Config {
    /// `Some` only when both the backend URL and key are non-empty.
    pub fn remote(&self) -> Option<RemoteConfig> {
        RemoteConfig::from_parts(
            self.remote_url.as_deref(),
            self.remote_key.as_deref(),
            &self.remote_table,
            &self.remote_bucket,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_select_local_mode() {
        let config = Config::try_parse_from(["card-perks"]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.remote_table, "kt_cards");
        assert!(config.remote().is_none());
    }

    #[test]
    fn test_remote_needs_both_values() {
        let config = Config::try_parse_from(["card-perks", "--remote-url", "https://x.supabase.co"]).unwrap();
        assert!(config.remote().is_none());

        let config = Config::try_parse_from([
            "card-perks",
            "--remote-url",
            "https://x.supabase.co",
            "--remote-key",
            "anon",
        ])
        .unwrap();
        assert_eq!(config.remote().unwrap().url, "https://x.supabase.co");
    }
}
