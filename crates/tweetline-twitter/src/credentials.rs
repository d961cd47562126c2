//! Consumer key/secret loading

use std::path::Path;

use anyhow::Context;

pub const KEY_ENV: &str = "TWITTER_CONSUMER_KEY";
pub const SECRET_ENV: &str = "TWITTER_CONSUMER_SECRET";

/// Application credentials for app-only auth
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Parse a credentials file: key on the first line, secret on the second
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let mut lines = content.lines().map(str::trim);
        let consumer_key = lines.next().unwrap_or_default();
        let consumer_secret = lines.next().unwrap_or_default();
        anyhow::ensure!(!consumer_key.is_empty(), "consumer key missing (line 1)");
        anyhow::ensure!(
            !consumer_secret.is_empty(),
            "consumer secret missing (line 2)"
        );
        Ok(Self {
            consumer_key: consumer_key.to_string(),
            consumer_secret: consumer_secret.to_string(),
        })
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read credentials file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid credentials file {}", path.display()))
    }

    /// Pick the first complete source: explicit values, environment, then file
    pub fn resolve(
        consumer_key: Option<String>,
        consumer_secret: Option<String>,
        file: &Path,
    ) -> anyhow::Result<Self> {
        if let (Some(consumer_key), Some(consumer_secret)) = (consumer_key, consumer_secret) {
            log::debug!("Using credentials from configuration");
            return Ok(Self {
                consumer_key,
                consumer_secret,
            });
        }
        if let (Ok(consumer_key), Ok(consumer_secret)) =
            (std::env::var(KEY_ENV), std::env::var(SECRET_ENV))
        {
            log::debug!("Using credentials from {KEY_ENV}/{SECRET_ENV}");
            return Ok(Self {
                consumer_key,
                consumer_secret,
            });
        }
        log::info!("Using credentials in: {}", file.display());
        Self::from_file(file)
    }
}
