use anyhow::Result;
use chrono::NaiveDate;
use chrono_tz::Tz;
use config::{Config, Environment, File, FileFormat};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::args::RunArgs;
use crate::cursor::DateCursor;
use crate::error::SyncError;
use crate::whoop::client::OAuthApp;
use crate::{mfp, whoop};

const CONFIG_TEMPLATE: &str = include_str!("../templates/health.toml");
const MAP_TEMPLATE: &str = include_str!("../templates/spreadsheet_map.json");
const DEFAULT_MAP_PATH: &str = "config/spreadsheet_map.json";
const ENV_PREFIX: &str = "HEALTH_SYNC";

#[derive(Debug, Deserialize, Default)]
struct CfgFile {
    #[serde(default)]
    general: GeneralSection,
    #[serde(default)]
    gsheet: GsheetSection,
    #[serde(default)]
    whoop: WhoopSection,
    #[serde(default)]
    mfp: MfpSection,
    #[serde(default)]
    output_csv: Option<OutputCsvConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct GeneralSection {
    start_date: Option<String>,
    start_week: Option<u32>,
    timezone: Option<String>,
    pacing_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct GsheetSection {
    url: Option<String>,
    creds: Option<String>,
    json: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct WhoopSection {
    #[serde(default)]
    enabled: bool,
    token_path: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    base_url: Option<String>,
    token_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct MfpSection {
    #[serde(default)]
    enabled: bool,
    session_cookie: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OutputCsvConfig {
    pub path: String,
    #[serde(default = "default_true")]
    pub ensure: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputCsvConfig {
    fn default() -> Self {
        Self {
            path: "output/cells.csv".to_string(),
            ensure: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WhoopCfg {
    pub token_path: String,
    pub base_url: String,
    pub oauth: Option<OAuthApp>,
}

#[derive(Debug, Clone)]
pub struct MfpCfg {
    pub base_url: String,
    pub session_cookie: SecretString,
}

/// Run configuration, built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct Cfg {
    pub start_date: NaiveDate,
    pub start_week: u32,
    pub timezone: Tz,
    pub pacing: Duration,
    pub spreadsheet: String,
    pub service_account_key: String,
    pub field_map_path: String,
    pub whoop: Option<WhoopCfg>,
    pub mfp: Option<MfpCfg>,
    pub output_csv: OutputCsvConfig,
    pub dry_run: bool,
}

fn missing(key: &str) -> SyncError {
    SyncError::ConfigMissing(format!("{key} must be set"))
}

fn required(value: Option<String>, key: &str) -> Result<String, SyncError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| missing(key))
}

impl Cfg {
    pub fn load(config_path: &str, run: &RunArgs) -> Result<Self> {
        info!("Loading configuration from: {}", config_path);

        if !Path::new(config_path).exists() {
            let missing = SyncError::ConfigMissing(format!("config file {config_path} not found"));
            return Err(missing.into());
        }

        let config = Config::builder()
            .add_source(File::with_name(config_path))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        Self::from_config(config, run)
    }

    pub fn from_toml_str(toml: &str, run: &RunArgs) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Self::from_config(config, run)
    }

    fn from_config(config: Config, run: &RunArgs) -> Result<Self> {
        let file: CfgFile = config
            .try_deserialize()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        let start_date = match run.start_date {
            Some(date) => {
                debug!("Overriding start_date from command line");
                date
            }
            None => {
                let raw = required(file.general.start_date, "general.start_date")?;
                NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                    SyncError::Config(format!("general.start_date '{raw}' is not YYYY-MM-DD"))
                })?
            }
        };

        let start_week = run.start_week.or(file.general.start_week).unwrap_or(1);

        let timezone_name = file
            .general
            .timezone
            .unwrap_or_else(|| "Europe/London".to_string());
        let timezone: Tz = timezone_name.parse().map_err(|_| {
            SyncError::Config(format!("general.timezone '{timezone_name}' is not a known timezone"))
        })?;

        let whoop = if file.whoop.enabled {
            let oauth = match (file.whoop.client_id, file.whoop.client_secret) {
                (Some(client_id), Some(secret)) if !client_id.is_empty() && !secret.is_empty() => {
                    Some(OAuthApp {
                        client_id,
                        client_secret: SecretString::from(secret),
                        token_url: file
                            .whoop
                            .token_url
                            .unwrap_or_else(|| whoop::client::DEFAULT_TOKEN_URL.to_string()),
                    })
                }
                _ => None,
            };
            Some(WhoopCfg {
                token_path: file
                    .whoop
                    .token_path
                    .unwrap_or_else(|| "whoop_token.json".to_string()),
                base_url: file
                    .whoop
                    .base_url
                    .unwrap_or_else(|| whoop::client::DEFAULT_BASE_URL.to_string()),
                oauth,
            })
        } else {
            None
        };

        let mfp = if file.mfp.enabled {
            Some(MfpCfg {
                base_url: file
                    .mfp
                    .base_url
                    .unwrap_or_else(|| mfp::client::DEFAULT_BASE_URL.to_string()),
                session_cookie: SecretString::from(required(
                    file.mfp.session_cookie,
                    "mfp.session_cookie",
                )?),
            })
        } else {
            None
        };

        let mut output_csv = file.output_csv.unwrap_or_default();
        if let Some(csv_path) = &run.csv_path {
            debug!("Overriding csv_path from command line");
            output_csv.path = csv_path.clone();
        }

        let cfg = Cfg {
            start_date,
            start_week,
            timezone,
            pacing: Duration::from_millis(file.general.pacing_ms.unwrap_or(750)),
            spreadsheet: required(file.gsheet.url, "gsheet.url")?,
            service_account_key: required(file.gsheet.creds, "gsheet.creds")?,
            field_map_path: file.gsheet.json.unwrap_or_else(|| DEFAULT_MAP_PATH.to_string()),
            whoop,
            mfp,
            output_csv,
            dry_run: run.dry_run,
        };
        cfg.validate()?;

        debug!("Final configuration: {:?}", cfg);
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if self.whoop.is_none() && self.mfp.is_none() {
            return Err(SyncError::ConfigMissing(
                "no services enabled in config file".into(),
            ));
        }

        if self.start_week == 0 {
            return Err(SyncError::Config("general.start_week must be >= 1".into()));
        }
        DateCursor::new(self.start_date)
            .fast_forward(self.start_week)
            .map_err(|_| {
                SyncError::Config(format!(
                    "general.start_week {} is out of range for start date {}",
                    self.start_week, self.start_date
                ))
            })?;

        if self.dry_run && self.output_csv.path.is_empty() {
            return Err(missing("output_csv.path"));
        }

        info!(
            "Configuration validation passed (whoop: {}, mfp: {})",
            self.whoop.is_some(),
            self.mfp.is_some()
        );
        Ok(())
    }
}

/// Writes the config and spreadsheet map templates where they do not exist yet.
/// Returns the paths that were created.
pub fn write_templates(config_path: &str) -> Result<Vec<PathBuf>, SyncError> {
    let mut created = Vec::new();
    for (path, content) in [(config_path, CONFIG_TEMPLATE), (DEFAULT_MAP_PATH, MAP_TEMPLATE)] {
        let path = Path::new(path);
        if path.exists() {
            debug!("{} already exists, leaving it alone", path.display());
            continue;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        info!("Created template {}", path.display());
        created.push(path.to_path_buf());
    }
    Ok(created)
}
