//! reqwest implementation of [`WearableSource`] against the WHOOP developer API.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use super::{Cycle, Page, Recovery, SleepSession, WearableSource};
use crate::error::SyncError;
use crate::token::{load_token, save_token, TokenSet};

/// Includes the API version; collection paths are relative to it.
pub const DEFAULT_BASE_URL: &str = "https://api.prod.whoop.com/developer/v1";
pub const DEFAULT_TOKEN_URL: &str = "https://api.prod.whoop.com/oauth/oauth2/token";

const SERVICE: &str = "whoop";
const PAGE_LIMIT: &str = "25";

#[derive(Clone, Debug)]
pub struct ReqwestWhoopClient {
    base_url: String,
    access_token: SecretString,
    client: reqwest::Client,
}

impl ReqwestWhoopClient {
    pub fn new(base_url: &str, access_token: SecretString) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
            client,
        })
    }

    /// Fetches every page of a collection endpoint, keeping service order.
    async fn collection<T: DeserializeOwned>(
        &self,
        path: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<T>, SyncError> {
        let url = format!("{}{}", self.base_url, path);
        let start = start.to_rfc3339_opts(SecondsFormat::Millis, true);
        let end = end.to_rfc3339_opts(SecondsFormat::Millis, true);

        let mut records = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let mut request = self
                .client
                .get(&url)
                .bearer_auth(self.access_token.expose_secret())
                .query(&[
                    ("start", start.as_str()),
                    ("end", end.as_str()),
                    ("limit", PAGE_LIMIT),
                ]);
            if let Some(token) = &next_token {
                request = request.query(&[("nextToken", token.as_str())]);
            }

            let page: Page<T> = execute_json(request).await?;
            debug!("{} returned {} records", path, page.records.len());
            records.extend(page.records);

            match page.next_token.filter(|t| !t.is_empty()) {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl WearableSource for ReqwestWhoopClient {
    async fn sleep(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SleepSession>, SyncError> {
        self.collection("/activity/sleep", start, end).await
    }

    async fn recovery(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Recovery>, SyncError> {
        self.collection("/recovery", start, end).await
    }

    async fn cycles(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Cycle>, SyncError> {
        self.collection("/cycle", start, end).await
    }
}

async fn execute_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, SyncError> {
    let resp = request.send().await?;
    if !resp.status().is_success() {
        return Err(error_from_response(resp).await);
    }
    Ok(resp.json::<T>().await?)
}

async fn error_from_response(resp: reqwest::Response) -> SyncError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let body_snippet: String = body.chars().take(256).collect();

    match status {
        401 | 403 => SyncError::Auth {
            service: SERVICE,
            detail: body_snippet,
        },
        _ => SyncError::Status {
            service: SERVICE,
            status,
            body: body_snippet,
        },
    }
}

/// OAuth application credentials used to refresh an expired token.
#[derive(Clone, Debug)]
pub struct OAuthApp {
    pub client_id: String,
    pub client_secret: SecretString,
    pub token_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

pub async fn refresh_token(
    client: &reqwest::Client,
    app: &OAuthApp,
    refresh_token: &str,
) -> Result<TokenSet, SyncError> {
    info!("Refreshing whoop access token");
    let request = client.post(&app.token_url).form(&[
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", app.client_id.as_str()),
        ("client_secret", app.client_secret.expose_secret()),
        ("scope", "offline"),
    ]);
    let resp: TokenResponse = execute_json(request).await?;

    Ok(TokenSet {
        access_token: resp.access_token,
        refresh_token: resp.refresh_token.or_else(|| Some(refresh_token.to_string())),
        expires_at: resp
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs)),
    })
}

/// Loads the token file and refreshes it when expired. Without a usable refresh
/// path an expired token is an authentication failure.
pub async fn authorized_token(
    token_path: &str,
    app: Option<&OAuthApp>,
) -> Result<SecretString, SyncError> {
    let token = load_token(token_path)?;
    if !token.is_expired(Utc::now()) {
        return Ok(SecretString::from(token.access_token));
    }

    let (Some(app), Some(refresh)) = (app, token.refresh_token.as_deref()) else {
        return Err(SyncError::Auth {
            service: SERVICE,
            detail: "access token expired and no refresh credentials are configured".into(),
        });
    };

    let client = reqwest::Client::builder().build()?;
    let fresh = refresh_token(&client, app, refresh).await?;
    save_token(token_path, &fresh)?;
    Ok(SecretString::from(fresh.access_token))
}
