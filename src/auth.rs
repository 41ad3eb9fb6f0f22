//! Credential boundary
//!
//! The session guard only needs one thing from the credential layer: a
//! usable bearer token, or an error. Acquiring, refreshing and rotating
//! tokens on disk is the credential provider's business and stays outside
//! this crate; `TokenFile` merely reads an already-stored token.

use std::path::PathBuf;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::drive::DriveError;

/// A bearer access token. Wrapped in [`SecretString`] so it never leaks
/// through `Debug` output or logs.
#[derive(Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(SecretString::from(raw.into()))
    }

    /// `Authorization` header value.
    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.0.expose_secret())
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Supplies a valid access token to the session guard on `begin()`.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn access_token(&self) -> Result<AccessToken, DriveError>;
}

/// A fixed token handed in directly (environment variable, test fixture).
pub struct StaticToken(AccessToken);

impl StaticToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(AccessToken::new(raw))
    }
}

#[async_trait]
impl CredentialSource for StaticToken {
    async fn access_token(&self) -> Result<AccessToken, DriveError> {
        Ok(self.0.clone())
    }
}

/// Reads a stored token file. Accepts the JSON shape written by the OAuth
/// tooling (an `access_token` or `token` field) or a bare token string.
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Conventional location: `<config dir>/drivesweep/token.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("drivesweep").join("token.json"))
    }
}

#[async_trait]
impl CredentialSource for TokenFile {
    async fn access_token(&self) -> Result<AccessToken, DriveError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            DriveError::Credentials(format!(
                "cannot read token file {}: {e}",
                self.path.display()
            ))
        })?;

        let token = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => value
                .get("access_token")
                .or_else(|| value.get("token"))
                .and_then(|v| v.as_str())
                .map(str::to_owned)
                .ok_or_else(|| {
                    DriveError::Credentials(format!(
                        "no access token field in {}",
                        self.path.display()
                    ))
                })?,
            Err(_) => raw.trim().to_string(),
        };

        if token.is_empty() {
            return Err(DriveError::Credentials("empty access token".to_string()));
        }
        Ok(AccessToken::new(token))
    }
}
