use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;

/// Configuration for the application
#[derive(Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Postgres connection URL. Without one, clients live in memory.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Upper bound for the connection pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Log level for this crate, used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_connections() -> u32 {
    5
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self> {
        Self::from_pairs(std::env::vars())
    }

    /// Build a configuration from explicit key/value pairs
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(pairs)?;
        Ok(config)
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// Load `.env` if it exists, then read the configuration
pub fn init() -> Result<Config> {
    dotenv().ok();

    Config::load()
}
