//! Configuration loading from TOML files, with CLI overrides

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;
use tweetline_twitter::ClientConfig;

/// Largest `count` the search API accepts per request
pub const MAX_BATCH: u32 = 100;

/// Global configuration for tweetline
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub output: OutputConfig,
    pub credentials: CredentialsConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub term: String,
    /// Unique records to collect
    pub count: usize,
    pub workers: usize,
    pub batch: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            term: "#IoT".to_string(),
            count: 2000,
            workers: 7,
            batch: MAX_BATCH,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("tweets.csv"),
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub file: PathBuf,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub consumer_key: Option<String>,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub consumer_secret: Option<String>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("CREDENTIALS.txt"),
            consumer_key: None,
            consumer_secret: None,
        }
    }
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("file", &self.file)
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &self.consumer_secret.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Timeouts in seconds
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout: u64,
    pub request_timeout: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: 30,
            request_timeout: 60,
        }
    }
}

/// Command-line values that take precedence over the config file
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Search term, e.g. a hashtag [default: #IoT]
    #[arg(short, long, visible_alias = "hash")]
    pub term: Option<String>,

    /// Output CSV file [default: tweets.csv]
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Number of unique records to collect [default: 2000]
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Number of concurrent search workers [default: 7]
    #[arg(short, long, visible_alias = "finder")]
    pub workers: Option<usize>,

    /// Records requested per API call, 1-100 [default: 100]
    #[arg(short, long)]
    pub batch: Option<u32>,

    /// Credentials file: consumer key, then secret [default: CREDENTIALS.txt]
    #[arg(long)]
    pub creds: Option<PathBuf>,
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./tweetline.toml (current directory)
    /// 2. ~/.config/tweetline/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("tweetline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "tweetline") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply CLI values on top of the file, then validate
    pub fn with_overrides(mut self, cli: Overrides) -> Result<Self> {
        if let Some(term) = cli.term {
            self.search.term = term;
        }
        if let Some(count) = cli.count {
            self.search.count = count;
        }
        if let Some(workers) = cli.workers {
            self.search.workers = workers;
        }
        if let Some(batch) = cli.batch {
            self.search.batch = batch;
        }
        if let Some(file) = cli.file {
            self.output.file = file;
        }
        if let Some(creds) = cli.creds {
            self.credentials.file = creds;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.search.term.trim().is_empty(), "search term is empty");
        anyhow::ensure!(self.search.workers >= 1, "workers must be at least 1");
        anyhow::ensure!(
            (1..=MAX_BATCH).contains(&self.search.batch),
            "batch must be between 1 and {MAX_BATCH}, got {}",
            self.search.batch
        );
        anyhow::ensure!(
            self.http.connect_timeout > 0 && self.http.request_timeout > 0,
            "http timeouts must be positive"
        );
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            connect_timeout: Duration::from_secs(self.http.connect_timeout),
            request_timeout: Duration::from_secs(self.http.request_timeout),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.search.term, "#IoT");
        assert_eq!(config.search.count, 2000);
        assert_eq!(config.search.workers, 7);
        assert_eq!(config.search.batch, 100);
        assert_eq!(config.output.file, PathBuf::from("tweets.csv"));
        assert_eq!(config.credentials.file, PathBuf::from("CREDENTIALS.txt"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn expand_env_var_simple() {
        std::env::set_var("TWEETLINE_TEST_VAR", "test_value");
        assert_eq!(
            expand_env_var("${TWEETLINE_TEST_VAR}"),
            Some("test_value".to_string())
        );
        std::env::remove_var("TWEETLINE_TEST_VAR");
    }

    #[test]
    fn expand_env_var_literal() {
        assert_eq!(expand_env_var("literal"), Some("literal".to_string()));
    }

    #[test]
    fn expand_env_var_missing() {
        assert_eq!(expand_env_var("${NONEXISTENT_VAR_12345}"), None);
    }

    #[test]
    fn parse_config_toml() {
        let toml = r##"
[search]
term = "#rust"
count = 500
workers = 3

[output]
file = "/tmp/out.csv"

[credentials]
consumer_key = "key"
consumer_secret = "${NONEXISTENT_VAR_12345}"

[http]
request_timeout = 10
"##;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.search.term, "#rust");
        assert_eq!(config.search.count, 500);
        assert_eq!(config.search.workers, 3);
        assert_eq!(config.search.batch, 100);
        assert_eq!(config.output.file, PathBuf::from("/tmp/out.csv"));
        assert_eq!(config.credentials.consumer_key.as_deref(), Some("key"));
        assert_eq!(config.credentials.consumer_secret, None);
        assert_eq!(config.http.connect_timeout, 30);
        assert_eq!(config.client_config().request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn cli_overrides_file() {
        let config: Config = toml::from_str("[search]\nworkers = 3\nbatch = 50\n").unwrap();
        let config = config
            .with_overrides(Overrides {
                workers: Some(9),
                file: Some("x.csv".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(config.search.workers, 9);
        assert_eq!(config.search.batch, 50);
        assert_eq!(config.output.file, PathBuf::from("x.csv"));
    }

    #[test]
    fn rejects_bad_values() {
        let zero_workers = Overrides {
            workers: Some(0),
            ..Default::default()
        };
        assert!(Config::default().with_overrides(zero_workers).is_err());

        for batch in [0, 101] {
            let bad = Overrides {
                batch: Some(batch),
                ..Default::default()
            };
            let err = Config::default().with_overrides(bad).unwrap_err();
            assert!(err.to_string().contains("batch"), "{err}");
        }
    }

    #[test]
    fn from_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tweetline.toml");
        std::fs::write(&path, "[search]\ncount = \"many\"\n").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("tweetline.toml"));

        std::fs::write(&path, "[search]\ncount = 42\n").unwrap();
        assert_eq!(Config::from_file(&path).unwrap().search.count, 42);
    }

    #[test]
    fn debug_hides_secret() {
        let config: Config =
            toml::from_str("[credentials]\nconsumer_secret = \"hunter2\"\n").unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
