//! Runtime configuration from the environment.

use std::net::SocketAddr;
use std::num::NonZeroUsize;

use anyhow::{Context, Result};

use crate::gemini::{GeminiClient, DEFAULT_BASE_URL, DEFAULT_MODEL};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Reads `.env` if present, then the process environment.
    ///
    /// `GEMINI_API_KEY` is deliberately absent: the client reads it per call.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:3000")?;

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(v) => v
                .parse::<NonZeroUsize>()
                .context("MAX_UPLOAD_BYTES must be a positive integer")?
                .get(),
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            bind_addr,
            gemini_base_url: lookup("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            gemini_model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_upload_bytes,
        })
    }

    pub fn gemini_client(&self) -> GeminiClient {
        GeminiClient::builder()
            .base_url(&self.gemini_base_url)
            .model(&self.gemini_model)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.gemini_model, DEFAULT_MODEL);
        assert_eq!(config.gemini_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("GEMINI_MODEL", "gemini-3-pro-image-preview"),
            ("MAX_UPLOAD_BYTES", "2048"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.gemini_model, "gemini-3-pro-image-preview");
        assert_eq!(config.max_upload_bytes, 2048);
        assert_eq!(config.gemini_client().model(), "gemini-3-pro-image-preview");
    }

    #[test]
    fn test_invalid_values() {
        assert!(config(&[("BIND_ADDR", "localhost")]).is_err());
        assert!(config(&[("MAX_UPLOAD_BYTES", "lots")]).is_err());
        assert!(config(&[("MAX_UPLOAD_BYTES", "0")]).is_err());
        assert!(config(&[("MAX_UPLOAD_BYTES", "-5")]).is_err());
    }
}
