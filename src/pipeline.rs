use crate::config::ConfigProvider;
use crate::locate;
use crate::report;
use crate::sheets::{
    SheetsClient, SpreadsheetPublisher, DRIVE_API_BASE, OAUTH_TOKEN_URL, SHEETS_API_BASE,
};
use crate::translate::{
    GoogleTranslateProvider, Translator, DEFAULT_MAX_IN_FLIGHT, DEFAULT_TRANSLATE_ENDPOINT,
};
use anyhow::{anyhow, Result};
use chrono::Local;
use std::path::PathBuf;
use tracing::info;

pub const SPREADSHEET_NAME: &str = "project_report";

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Folder scanned for `project_YYYY-MM-DD.csv` exports.
    pub extract_dir: PathBuf,
    pub spreadsheet_name: String,
    pub source_lang: String,
    pub target_lang: String,
    pub max_in_flight: usize,
    // Service endpoints, overridable for tests.
    pub translate_endpoint: String,
    pub token_url: String,
    pub sheets_api_base: String,
    pub drive_api_base: String,
}

impl PipelineOptions {
    pub fn new(extract_dir: impl Into<PathBuf>) -> Self {
        Self {
            extract_dir: extract_dir.into(),
            spreadsheet_name: SPREADSHEET_NAME.to_string(),
            source_lang: "en".to_string(),
            target_lang: "ja".to_string(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            translate_endpoint: DEFAULT_TRANSLATE_ENDPOINT.to_string(),
            token_url: OAUTH_TOKEN_URL.to_string(),
            sheets_api_base: SHEETS_API_BASE.to_string(),
            drive_api_base: DRIVE_API_BASE.to_string(),
        }
    }
}

/// Locate, load, translate, publish. Translation failures are absorbed per
/// cell; any other failure propagates and ends the run.
pub async fn run(options: &PipelineOptions, config: &mut dyn ConfigProvider) -> Result<()> {
    let csv_file = locate::latest_report_file(&options.extract_dir)?
        .ok_or_else(|| anyhow!("CSV file is required"))?;
    info!("Using export {}", csv_file.display());

    let credential_file = config.credential_path()?;
    let email = config.email()?;

    let rows = report::load_rows(&csv_file)?;
    info!("Loaded {} rows", rows.len());

    let translator = Translator::new(
        GoogleTranslateProvider::new(&options.translate_endpoint),
        options.max_in_flight,
    );
    let table = report::process(rows, &translator, &options.source_lang, &options.target_lang).await;
    info!("Translated {} unique texts", translator.cached_len().await);

    let client = SheetsClient::authenticate(
        &credential_file,
        &options.token_url,
        &options.sheets_api_base,
        &options.drive_api_base,
    )
    .await?;
    let publisher = SpreadsheetPublisher::new(client, options.spreadsheet_name.clone(), email);

    let worksheet = format!("project_{}", Local::now().format("%Y-%m-%d"));

    let mut values = vec![report::header()];
    values.extend(table.iter().map(|row| row.cells()));

    publisher
        .publish(&worksheet, values, &report::COLUMN_WIDTHS)
        .await?;

    info!(
        "Report published to '{}' worksheet '{}'",
        options.spreadsheet_name, worksheet
    );
    Ok(())
}
