use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Pronunciation variant; each one maps to a fixed locator on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    #[default]
    Us,
    Uk,
    Ca,
}

impl std::fmt::Display for Accent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Accent::Us => "us",
            Accent::Uk => "uk",
            Accent::Ca => "ca",
        };
        f.write_str(s)
    }
}

/// CSS selectors for the audio button of each pronunciation variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorConfig {
    pub us: String,
    pub uk: String,
    pub ca: String,
}

const AUDIO_BUTTON_PREFIX: &str = "html > body > div:nth-of-type(4) > div > div > div > div > article \
     > div:nth-of-type(2) > div:nth-of-type(8) > div > div:nth-of-type(2) > div \
     > div:nth-of-type(2)";

fn audio_button(variant: usize) -> String {
    format!(
        "{} > div:nth-of-type({}) > div > button",
        AUDIO_BUTTON_PREFIX, variant
    )
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            us: audio_button(1),
            uk: audio_button(2),
            ca: audio_button(3),
        }
    }
}

/// Global configuration loaded from `~/.config/ncdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NcdlConfig {
    /// Number of concurrent workers.
    pub concurrency: usize,
    /// Directory downloaded assets are written to.
    pub output_dir: PathBuf,
    /// Upper bound for loading a page (navigation + transfer).
    pub page_load_timeout_secs: u64,
    /// Upper bound for the whole inspection as seen by a worker.
    pub element_wait_timeout_secs: u64,
    /// Upper bound for one asset transfer.
    pub download_timeout_secs: u64,
    /// Attribute on the located element that holds the asset URL.
    pub asset_attribute: String,
    /// Optional User-Agent for page and asset requests.
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub locators: LocatorConfig,
}

impl Default for NcdlConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            output_dir: PathBuf::from("./out"),
            page_load_timeout_secs: 30,
            element_wait_timeout_secs: 10,
            download_timeout_secs: 30,
            asset_attribute: "data-src".to_string(),
            user_agent: None,
            locators: LocatorConfig::default(),
        }
    }
}

impl NcdlConfig {
    /// Selector string for the given pronunciation variant.
    pub fn locator_for(&self, accent: Accent) -> &str {
        match accent {
            Accent::Us => &self.locators.us,
            Accent::Uk => &self.locators.uk,
            Accent::Ca => &self.locators.ca,
        }
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn element_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.element_wait_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be at least 1");
        }
        if self.page_load_timeout_secs == 0
            || self.element_wait_timeout_secs == 0
            || self.download_timeout_secs == 0
        {
            anyhow::bail!("timeouts must be greater than zero");
        }
        if self.asset_attribute.trim().is_empty() {
            anyhow::bail!("asset_attribute must not be empty");
        }
        if self.output_dir.as_os_str().is_empty() {
            anyhow::bail!("output_dir must not be empty");
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ncdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<NcdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = NcdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<NcdlConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: NcdlConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
