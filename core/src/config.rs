use std::env;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::service::reconcile::ReconcilePolicy;

const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_API_BASE_URL: &str = "https://backend-xe17.onrender.com";
pub const ENV_API_URL: &str = "TASKDECK_API_URL";
pub const ENV_ROLLBACK_MOVES: &str = "TASKDECK_ROLLBACK_MOVES";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub api_base_url: String,
    /// Restore a card's previous column when its move is rejected.
    pub rollback_failed_moves: bool,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    #[serde(skip)]
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            rollback_failed_moves: false,
            log_filter: "taskdeck=info,taskdeck_core=info".to_string(),
            data_dir: PathBuf::new(),
        }
    }
}

impl AppConfig {
    /// Reads `config.json` from `base_dir` (default `~/.taskdeck`), writing a
    /// default file on first run, then applies environment overrides.
    pub fn load(base_dir: Option<PathBuf>) -> Result<Self> {
        let dir = match base_dir {
            Some(dir) => dir,
            None => {
                let home_dir = dirs::home_dir()
                    .ok_or_else(|| anyhow!("Could not determine home directory"))?;
                home_dir.join(".taskdeck")
            }
        };
        fs::create_dir_all(&dir)?;

        let path = dir.join(CONFIG_FILE_NAME);
        let mut config = if path.exists() {
            Self::read(&path)?
        } else {
            let config = Self::default();
            config.write(&path)?;
            config
        };
        config.data_dir = dir;
        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn write(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(flag) = lookup(ENV_ROLLBACK_MOVES) {
            match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.rollback_failed_moves = true,
                "0" | "false" | "no" | "off" => self.rollback_failed_moves = false,
                other => tracing::warn!(value = other, "ignoring {}", ENV_ROLLBACK_MOVES),
            }
        }
    }

    pub fn policy(&self) -> ReconcilePolicy {
        ReconcilePolicy {
            rollback_failed_moves: self.rollback_failed_moves,
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("taskdeck.log")
    }
}
