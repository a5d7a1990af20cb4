use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Where the pipeline learns who to share the report with and which
/// service-account key file to authenticate with.
///
/// The live implementation prompts on stdin and persists answers; tests
/// substitute a fixed provider so the pipeline never touches the terminal.
pub trait ConfigProvider {
    fn email(&mut self) -> Result<String>;
    fn credential_path(&mut self) -> Result<PathBuf>;
}

/// On-disk record, a flat JSON object with `email` and `credential_file`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredConfig {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    credential_file: Option<String>,
}

/// File-backed [`ConfigProvider`]. Missing values are prompted for once and
/// written back; the whole record is rewritten on each save.
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    stored: StoredConfig,
}

impl FileConfigStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let stored = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Malformed config file {}", path.display()))?
        } else {
            StoredConfig::default()
        };
        Ok(Self { path, stored })
    }

    /// `REPORT_CONFIG_FILE` overrides the default `user_config.json` in the
    /// working directory.
    pub fn default_path() -> PathBuf {
        std::env::var("REPORT_CONFIG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("user_config.json"))
    }

    fn save(&self) -> Result<()> {
        let raw = serde_json::to_string_pretty(&self.stored)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write config file {}", self.path.display()))?;
        info!("Configuration saved successfully!");
        Ok(())
    }

    fn prompt(label: &str) -> Result<String> {
        print!("{}: ", label);
        std::io::stdout().flush().context("Failed to flush stdout")?;
        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        Ok(line.trim().to_string())
    }
}

impl ConfigProvider for FileConfigStore {
    fn email(&mut self) -> Result<String> {
        if let Some(email) = self.stored.email.as_deref() {
            if !email.is_empty() {
                return Ok(email.to_string());
            }
        }

        let email = Self::prompt("Please enter your email address")?;
        anyhow::ensure!(!email.is_empty(), "No email address provided");

        self.stored.email = Some(email.clone());
        self.save()?;
        Ok(email)
    }

    fn credential_path(&mut self) -> Result<PathBuf> {
        if let Some(stored) = self.stored.credential_file.as_deref() {
            let path = PathBuf::from(stored);
            if path.exists() {
                return Ok(path);
            }
            info!("Stored credential file is missing: {}", path.display());
        }

        let entered = Self::prompt("Please enter the path to the credential file")?;
        anyhow::ensure!(!entered.is_empty(), "No credential file selected");

        let path = PathBuf::from(entered);
        anyhow::ensure!(
            path.exists(),
            "Credential file not found: {}",
            path.display()
        );

        self.stored.credential_file = Some(path.to_string_lossy().into_owned());
        self.save()?;
        Ok(path)
    }
}
