//! Dashboard configuration loaded from TOML.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::table::DEFAULT_PAGE_SIZE;

const CONFIG_DIR: &str = ".taskboard";
const CONFIG_FILE: &str = "config.toml";
const APP_DIR: &str = "taskboard";
const TASKS_FILE: &str = "tasks.json";

/// Dashboard configuration loaded from `.taskboard/config.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// Rows per table page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Directory holding persisted filter state.
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
    /// JSON file the task records are read from and written to.
    #[serde(default)]
    pub tasks_file: Option<PathBuf>,
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            storage_dir: None,
            tasks_file: None,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from `<workdir>/.taskboard/config.toml`, or defaults when absent.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read, parsed, or validated.
    pub fn from_workdir(workdir: impl AsRef<Path>) -> Result<Self> {
        let config_path = workdir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(&config_path)
    }

    /// Load configuration from an explicit file.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self =
            toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            bail!("page_size must be at least 1");
        }
        Ok(())
    }

    /// Filter-state directory: the configured one, else the platform data directory, else
    /// `.taskboard/state` under the working directory.
    #[must_use]
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(|| {
            dirs::data_dir().map_or_else(
                || PathBuf::from(CONFIG_DIR).join("state"),
                |dir| dir.join(APP_DIR),
            )
        })
    }

    /// Task file: the configured one, else `tasks.json` inside [`Self::storage_dir`].
    #[must_use]
    pub fn tasks_file(&self) -> PathBuf {
        self.tasks_file
            .clone()
            .unwrap_or_else(|| self.storage_dir().join(TASKS_FILE))
    }
}
