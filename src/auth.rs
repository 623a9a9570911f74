use std::path::Path;

use google_sheets4::{hyper, hyper_rustls, oauth2, Sheets};
use tracing::info;

use crate::error::SyncError;
use crate::sheets::SheetsHub;

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Builds a Sheets hub authenticated with a service-account key file.
pub async fn create_sheets_hub(key_path: &str) -> Result<SheetsHub, SyncError> {
    info!("Initializing Google Sheets authentication");

    if !Path::new(key_path).exists() {
        return Err(SyncError::ConfigMissing(format!(
            "service account key {key_path} not found"
        )));
    }

    let key = oauth2::read_service_account_key(key_path)
        .await
        .map_err(|e| SyncError::Auth {
            service: "gsheet",
            detail: format!("unreadable service account key: {e}"),
        })?;
    let authenticator = oauth2::ServiceAccountAuthenticator::builder(key)
        .build()
        .await
        .map_err(|e| SyncError::Auth {
            service: "gsheet",
            detail: e.to_string(),
        })?;

    // Fail before any processing if the key cannot mint a token.
    authenticator
        .token(&[SHEETS_SCOPE])
        .await
        .map_err(|e| SyncError::Auth {
            service: "gsheet",
            detail: e.to_string(),
        })?;

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_native_roots()?
        .https_or_http()
        .enable_http1()
        .build();
    let client = hyper::Client::builder().build(https);

    Ok(Sheets::new(client, authenticator))
}
