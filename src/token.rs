use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::SyncError;

/// Access/refresh token pair for the wearable service, kept on disk between runs.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenSet {
    /// Treats tokens expiring within a minute as already expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .map(|at| at - Duration::seconds(60) <= now)
            .unwrap_or(false)
    }
}

pub fn load_token(token_path: &str) -> Result<TokenSet, SyncError> {
    let path = Path::new(token_path);

    if !path.exists() {
        return Err(SyncError::Auth {
            service: "whoop",
            detail: format!("token file {token_path} not found, authenticate first"),
        });
    }

    debug!("Loading token from: {}", token_path);
    let content = fs::read_to_string(path)?;
    let token: TokenSet = serde_json::from_str(&content).map_err(|e| SyncError::Auth {
        service: "whoop",
        detail: format!("token file {token_path} is unreadable: {e}"),
    })?;

    info!(
        "Loaded whoop token (expires {})",
        token
            .expires_at
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "never".into())
    );
    Ok(token)
}

pub fn save_token(token_path: &str, token: &TokenSet) -> Result<(), SyncError> {
    debug!("Saving token to: {}", token_path);

    if let Some(parent) = Path::new(token_path).parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(token).map_err(|e| SyncError::Decode {
        what: "token",
        detail: e.to_string(),
    })?;
    fs::write(token_path, json)?;

    info!("Saved refreshed whoop token");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_has_a_margin() {
        let now: DateTime<Utc> = "2024-01-01T12:00:00Z".parse().unwrap();
        let token = |expires_at| TokenSet {
            access_token: "a".into(),
            refresh_token: None,
            expires_at,
        };
        assert!(!token(None).is_expired(now));
        assert!(token(Some(now)).is_expired(now));
        assert!(token(Some(now + Duration::seconds(30))).is_expired(now));
        assert!(!token(Some(now + Duration::hours(1))).is_expired(now));
    }

    #[test]
    fn missing_token_file_is_an_auth_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = load_token(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, SyncError::Auth { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn saved_token_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/token.json");
        let path = path.to_str().unwrap();
        let token = TokenSet {
            access_token: "access".into(),
            refresh_token: Some("refresh".into()),
            expires_at: Some("2024-01-01T12:00:00Z".parse().unwrap()),
        };
        save_token(path, &token).unwrap();
        let loaded = load_token(path).unwrap();
        assert_eq!(loaded.access_token, "access");
        assert_eq!(loaded.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(loaded.expires_at, token.expires_at);
    }
}
