//! Configuration
//!
//! Resolution order:
//! 1. An explicit path (e.g. `--config`)
//! 2. `<data dir>/margin-lens/config.toml`
//! 3. Defaults embedded from `config/margin.toml`
//!
//! Keys missing from a file fall back to the embedded defaults. The
//! `MARGIN_SERVICE_URL` and `MARGIN_DATA_DIR` environment variables are
//! applied on top by [`MarginConfig::with_env_overrides`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::controller::{Tab, TabController};
use crate::error::{Error, Result};
use crate::export::ExportFormat;
use crate::source::{open_source, DatasetSource};
use crate::top_n::TopN;
use crate::view_mode::ViewMode;

const DEFAULT_CONFIG: &str = include_str!("../../../config/margin.toml");

/// Where datasets come from
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Directory of JSON datasets, preferred over `base_url` when set
    pub data_dir: Option<PathBuf>,
}

/// Initial controller selections
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultsConfig {
    pub view_mode: ViewMode,
    pub top_n: TopN,
    pub tab: Tab,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub dir: PathBuf,
    pub format: ExportFormat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarginConfig {
    pub service: ServiceConfig,
    pub defaults: DefaultsConfig,
    pub export: ExportConfig,
    /// File the config was read from, `None` for embedded defaults
    pub config_path: Option<PathBuf>,
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                base_url: "http://127.0.0.1:8080/api".to_string(),
                timeout: Duration::from_secs(crate::source::DEFAULT_TIMEOUT_SECS),
                data_dir: None,
            },
            defaults: DefaultsConfig {
                view_mode: ViewMode::Standard,
                top_n: TopN::All,
                tab: Tab::Summary,
            },
            export: ExportConfig {
                dir: PathBuf::from("exports"),
                format: ExportFormat::Csv,
            },
            config_path: None,
        }
    }
}

impl MarginConfig {
    /// Load from an explicit path, the data-dir override, or the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(default_path) if default_path.exists() => Self::from_file(&default_path),
            _ => Self::parse(DEFAULT_CONFIG),
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let mut config = Self::parse(&content)?;
        config.config_path = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse TOML on top of the embedded defaults
    pub fn parse(content: &str) -> Result<Self> {
        let defaults: RawConfig = toml::from_str(DEFAULT_CONFIG)?;
        let raw: RawConfig = toml::from_str(content)?;

        let mut config = Self::default();
        config.apply(defaults)?;
        config.apply(raw)?;
        Ok(config)
    }

    fn apply(&mut self, raw: RawConfig) -> Result<()> {
        if let Some(service) = raw.service {
            if let Some(url) = service.base_url {
                self.service.base_url = url;
            }
            if let Some(secs) = service.timeout_secs {
                self.service.timeout = Duration::from_secs(secs);
            }
            if let Some(dir) = service.data_dir {
                self.service.data_dir = Some(dir);
            }
        }

        if let Some(defaults) = raw.defaults {
            if let Some(mode) = defaults.view_mode {
                self.defaults.view_mode = mode.parse().map_err(Error::Config)?;
            }
            if let Some(n) = defaults.top_n {
                self.defaults.top_n = TopN::from_raw(n);
            }
            if let Some(tab) = defaults.tab {
                self.defaults.tab = tab.parse().map_err(Error::Config)?;
            }
        }

        if let Some(export) = raw.export {
            if let Some(dir) = export.dir {
                self.export.dir = dir;
            }
            if let Some(format) = export.format {
                self.export.format = format.parse().map_err(Error::Config)?;
            }
        }

        Ok(())
    }

    /// Apply `MARGIN_SERVICE_URL` and `MARGIN_DATA_DIR`
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("MARGIN_SERVICE_URL").filter(|v| !v.is_empty()) {
            self.service.base_url = url;
        }
        if let Some(dir) = lookup("MARGIN_DATA_DIR").filter(|v| !v.is_empty()) {
            self.service.data_dir = Some(PathBuf::from(dir));
        }
        self
    }

    /// Dataset location: the data directory if set, else the service URL
    pub fn source_location(&self) -> String {
        match &self.service.data_dir {
            Some(dir) => dir.display().to_string(),
            None => self.service.base_url.clone(),
        }
    }

    pub fn open_source(&self) -> Result<Box<dyn DatasetSource>> {
        open_source(&self.source_location(), self.service.timeout)
    }

    /// Controller initialized with the configured defaults
    pub fn controller(&self) -> TabController {
        TabController::with_defaults(
            self.defaults.tab,
            self.defaults.view_mode,
            self.defaults.top_n,
        )
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("margin-lens").join("config.toml"))
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    service: Option<RawService>,
    defaults: Option<RawDefaults>,
    export: Option<RawExport>,
}

#[derive(Debug, Deserialize)]
struct RawService {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawDefaults {
    view_mode: Option<String>,
    top_n: Option<i64>,
    tab: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawExport {
    dir: Option<PathBuf>,
    format: Option<String>,
}
