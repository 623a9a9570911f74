//! reqwest implementation of [`NutritionSource`] using a browser session cookie.
//!
//! Weight history has no JSON endpoint. The measurements page embeds its state as a
//! JSON fragment inside a script block, which [`MeasurementScanner`] pulls out. No
//! markup handling leaks past this module.

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use super::{DaySummary, Measurement, MeasurementPage, NutritionSource};
use crate::error::SyncError;

pub const DEFAULT_BASE_URL: &str = "https://www.myfitnesspal.com";

const SERVICE: &str = "mfp";
const LOGIN_PATH: &str = "/account/login";

/// Extracts measurement items from the embedded page state.
#[derive(Debug, Clone)]
pub struct MeasurementScanner {
    items: Regex,
    has_more: Regex,
}

impl MeasurementScanner {
    pub fn new() -> Result<Self, SyncError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| SyncError::Config(format!("measurement pattern: {e}")))
        };
        Ok(Self {
            items: compile(
                r#"\[\\"idm-user-with-consents\\"\]"\},\{"state":\{"data":\{"items":(.*?)\]"#,
            )?,
            has_more: compile(r#""has_more":(.*?),"#)?,
        })
    }

    pub fn scan(&self, page: &str) -> Result<MeasurementPage, SyncError> {
        let Some(captures) = self.items.captures(page) else {
            warn!("No measurement data found in page ({} bytes)", page.len());
            return Ok(MeasurementPage::default());
        };

        let fragment = format!("{}]", &captures[1]);
        let items: Vec<Measurement> =
            serde_json::from_str(&fragment).map_err(|e| SyncError::Decode {
                what: "measurement items",
                detail: e.to_string(),
            })?;

        let has_more = self
            .has_more
            .captures(page)
            .map(|c| c[1].trim() == "true")
            .unwrap_or(false);

        Ok(MeasurementPage { items, has_more })
    }
}

#[derive(Clone, Debug)]
pub struct ReqwestMfpClient {
    base_url: String,
    client: reqwest::Client,
    scanner: MeasurementScanner,
}

impl ReqwestMfpClient {
    pub fn new(base_url: &str, session_cookie: &SecretString) -> Result<Self, SyncError> {
        let mut cookie = HeaderValue::from_str(session_cookie.expose_secret())
            .map_err(|_| SyncError::Config("mfp.session_cookie is not a valid header".into()))?;
        cookie.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, cookie);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            scanner: MeasurementScanner::new()?,
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, SyncError> {
        let resp = request.send().await?;
        if resp.url().path().starts_with(LOGIN_PATH) {
            return Err(SyncError::Auth {
                service: SERVICE,
                detail: "session cookie was rejected".into(),
            });
        }

        let status = resp.status().as_u16();
        if resp.status().is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let body_snippet: String = body.chars().take(256).collect();
        Err(match status {
            401 | 403 => SyncError::Auth {
                service: SERVICE,
                detail: body_snippet,
            },
            _ => SyncError::Status {
                service: SERVICE,
                status,
                body: body_snippet,
            },
        })
    }
}

#[async_trait]
impl NutritionSource for ReqwestMfpClient {
    /// Unverified endpoint contract; see [`NutritionSource::day`].
    async fn day(&self, date: NaiveDate) -> Result<DaySummary, SyncError> {
        let url = format!("{}/api/services/diary/summary", self.base_url);
        let date = date.format("%Y-%m-%d").to_string();
        let resp = self
            .send(self.client.get(&url).query(&[("date", date.as_str())]))
            .await?;
        Ok(resp.json::<DaySummary>().await?)
    }

    async fn measurements(&self, kind: &str, page: u32) -> Result<MeasurementPage, SyncError> {
        let url = format!("{}/measurements/edit", self.base_url);
        let page_num = page.to_string();
        debug!("Fetching {} measurements page {}", kind, page);
        let resp = self
            .send(
                self.client
                    .get(&url)
                    .query(&[("type", kind), ("page", page_num.as_str())]),
            )
            .await?;
        let body = resp.text().await?;
        self.scanner.scan(&body)
    }
}
