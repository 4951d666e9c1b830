// File: monitor/src/http/token.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;

/// Source of the bearer credential used against the remote service.
///
/// Implementations may cache; callers ask for a fresh value every time they
/// need one.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn get_token(&self) -> Result<Option<String>>;

    async fn refresh_token(&self) -> Result<Option<String>>;
}

/// Token provider backed by the configuration.
///
/// Serves an inline token, or reads one from a file that an external OAuth
/// helper keeps up to date. Refreshing re-reads the file.
pub struct ConfiguredTokenProvider {
    token_file: Option<PathBuf>,
    cached: RwLock<Option<String>>,
}

impl ConfiguredTokenProvider {
    pub fn new(token: Option<String>, token_file: Option<PathBuf>) -> Self {
        Self {
            token_file,
            cached: RwLock::new(token.and_then(normalize)),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            config.api_token.clone(),
            config.token_file.as_ref().map(PathBuf::from),
        )
    }

    async fn read_token_file(&self) -> Result<Option<String>> {
        let Some(path) = &self.token_file else {
            return Ok(None);
        };

        match fs::read_to_string(path).await {
            Ok(content) => Ok(normalize(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Token file {} does not exist", path.display());
                Ok(None)
            }
            Err(e) => Err(anyhow!(
                "Failed to read token file {}: {}",
                path.display(),
                e
            )),
        }
    }
}

#[async_trait]
impl TokenProvider for ConfiguredTokenProvider {
    async fn get_token(&self) -> Result<Option<String>> {
        if let Some(token) = self.cached.read().await.clone() {
            return Ok(Some(token));
        }

        let token = self.read_token_file().await?;
        if token.is_some() {
            debug!("Loaded token from file");
            *self.cached.write().await = token.clone();
        }
        Ok(token)
    }

    async fn refresh_token(&self) -> Result<Option<String>> {
        if self.token_file.is_none() {
            // Inline tokens cannot be rotated from here
            return Ok(self.cached.read().await.clone());
        }

        let token = self.read_token_file().await?;
        let mut cached = self.cached.write().await;
        if token.is_some() && *cached != token {
            info!("Picked up rotated token from file");
        }
        *cached = token.clone();
        Ok(token)
    }
}

fn normalize(token: String) -> Option<String> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_inline_token() {
        let provider = ConfiguredTokenProvider::new(Some("  abc123\n".to_string()), None);
        assert_eq!(provider.get_token().await.unwrap().as_deref(), Some("abc123"));
        assert_eq!(
            provider.refresh_token().await.unwrap().as_deref(),
            Some("abc123")
        );
    }

    #[tokio::test]
    async fn test_missing_token() {
        let provider = ConfiguredTokenProvider::new(Some("   ".to_string()), None);
        assert!(provider.get_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_rereads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "first").unwrap();

        let provider = ConfiguredTokenProvider::new(None, Some(path.clone()));
        assert_eq!(provider.get_token().await.unwrap().as_deref(), Some("first"));

        std::fs::write(&path, "second\n").unwrap();
        // Cached until refreshed
        assert_eq!(provider.get_token().await.unwrap().as_deref(), Some("first"));
        assert_eq!(
            provider.refresh_token().await.unwrap().as_deref(),
            Some("second")
        );
        assert_eq!(provider.get_token().await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_missing_file_is_no_token() {
        let dir = TempDir::new().unwrap();
        let provider = ConfiguredTokenProvider::new(None, Some(dir.path().join("absent")));
        assert!(provider.get_token().await.unwrap().is_none());
        assert!(provider.refresh_token().await.unwrap().is_none());
    }
}
