use anyhow::{Context, Result};

/// Environment-driven configuration. Every credential is optional at load
/// time; each command demands only the keys it actually uses.
pub struct Config {
    polygon_api_key: Option<String>,
    sec_api_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            polygon_api_key: read("POLYGON_API_KEY"),
            sec_api_token: read("SEC_API_TOKEN"),
        }
    }

    pub fn polygon_api_key(&self) -> Result<&str> {
        self.polygon_api_key
            .as_deref()
            .context("POLYGON_API_KEY is not set")
    }

    pub fn sec_api_token(&self) -> Result<&str> {
        self.sec_api_token
            .as_deref()
            .context("SEC_API_TOKEN is not set")
    }
}

fn read(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
