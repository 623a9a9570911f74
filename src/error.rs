use thiserror::Error;

use crate::field_map::Source;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("authentication failed for {service}: {detail}")]
    Auth { service: &'static str, detail: String },

    #[error("configuration missing: {0}")]
    ConfigMissing(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("spreadsheet error: {0}")]
    Sheet(String),

    #[error("could not decode {what}: {detail}")]
    Decode { what: &'static str, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Fatal errors stop the run; everything else is absorbed per field or per week.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::Auth { .. } | SyncError::ConfigMissing(_) | SyncError::Config(_)
        )
    }
}

/// A metric with no configured coordinate for the given day.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("could not find coordinate for {metric} ({service}) on day {day}")]
pub struct MappingMiss {
    pub day: u8,
    pub service: Source,
    pub metric: String,
}
