use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::{
    auth::create_sheets_hub,
    cfg::Cfg,
    csv_sink::CsvMirror,
    field_map::FieldMap,
    mfp::{client::ReqwestMfpClient, NutritionSource},
    sheets::{spreadsheet_id, GoogleSheet, Spreadsheet},
    walker::{Sources, WalkReport, WalkSettings, WeekWalker},
    whoop::{
        client::{authorized_token, ReqwestWhoopClient},
        WearableSource,
    },
};

pub async fn run_job(cfg: &Cfg) -> Result<WalkReport> {
    info!("Starting job execution");

    let field_map = FieldMap::load(&cfg.field_map_path)?;
    let sheet_id = spreadsheet_id(&cfg.spreadsheet)?;

    let whoop = match &cfg.whoop {
        Some(whoop) => {
            let token = authorized_token(&whoop.token_path, whoop.oauth.as_ref()).await?;
            Some(ReqwestWhoopClient::new(&whoop.base_url, token)?)
        }
        None => None,
    };
    let mfp = match &cfg.mfp {
        Some(mfp) => Some(ReqwestMfpClient::new(&mfp.base_url, &mfp.session_cookie)?),
        None => None,
    };

    let hub = create_sheets_hub(&cfg.service_account_key).await?;
    let google = GoogleSheet::new(hub, sheet_id);
    let sheet: Box<dyn Spreadsheet> = if cfg.dry_run {
        warn!(
            "Dry run: cell writes go to {} instead of the spreadsheet",
            cfg.output_csv.path
        );
        Box::new(CsvMirror::new(
            google,
            &cfg.output_csv.path,
            cfg.output_csv.ensure,
        ))
    } else {
        Box::new(google)
    };

    let settings = WalkSettings {
        start_date: cfg.start_date,
        start_week: cfg.start_week,
        timezone: cfg.timezone,
        pacing: cfg.pacing,
    };
    let sources = Sources {
        wearable: whoop.as_ref().map(|c| c as &dyn WearableSource),
        nutrition: mfp.as_ref().map(|c| c as &dyn NutritionSource),
    };
    let today = Utc::now().with_timezone(&cfg.timezone).date_naive();

    let report = WeekWalker::new(&settings, &field_map, sheet.as_ref(), sources, today)
        .run()
        .await?;

    info!(
        "Job completed: {} weeks written ({} cells), {} already complete, stopped at {} ({:?})",
        report.weeks_written,
        report.cells_written,
        report.weeks_skipped,
        report.cursor.date(),
        report.finish
    );
    Ok(report)
}
