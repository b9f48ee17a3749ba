use crate::model::SortBy;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

pub const API_URL_ENV: &str = "CALBOARD_API_URL";
/// Points every config/data/cache path at one directory (tests, portable installs).
pub const BASE_DIR_ENV: &str = "CALBOARD_TEST_DIR";
pub const DEFAULT_API_URL: &str = "http://localhost:3001";
const DB_FILE_NAME: &str = "calboard.sqlite3";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no platform data directory available; set `db_path` explicitly")]
    NoDataDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Http,
    Sqlite,
}

/// Resolved store selection, handed to `store::connect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Http { base_url: String },
    Sqlite { path: PathBuf },
    SqliteInMemory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,
    pub api_url: String,
    pub db_path: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub log_level: String,
    pub sort_by: SortBy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Http,
            api_url: DEFAULT_API_URL.to_string(),
            db_path: None,
            cache_dir: None,
            log_level: crate::logging::default_log_level().to_string(),
            sort_by: SortBy::ByDate,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "calboard", "calboard")
}

fn base_dir_override() -> Option<PathBuf> {
    env::var_os(BASE_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

impl Config {
    pub fn get_path() -> Option<PathBuf> {
        if let Some(base) = base_dir_override() {
            return Some(base.join("config.toml"));
        }
        project_dirs().map(|p| p.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Option<PathBuf> {
        if let Some(base) = base_dir_override() {
            return Some(base.join("data"));
        }
        project_dirs().map(|p| p.data_dir().to_path_buf())
    }

    pub fn default_cache_dir() -> Option<PathBuf> {
        if let Some(base) = base_dir_override() {
            return Some(base.join("cache"));
        }
        project_dirs().map(|p| p.cache_dir().to_path_buf())
    }

    /// Loads the config file if there is one, then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::get_path() {
            Some(path) if path.exists() => {
                let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                Self::from_toml_str(&raw)?
            }
            _ => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var(API_URL_ENV)
            && !url.trim().is_empty()
        {
            self.api_url = url.trim().to_string();
        }
    }

    pub fn store_config(&self) -> Result<StoreConfig, ConfigError> {
        match self.backend {
            Backend::Http => Ok(StoreConfig::Http {
                base_url: self.api_url.clone(),
            }),
            Backend::Sqlite => {
                let path = match &self.db_path {
                    Some(p) => p.clone(),
                    None => Self::data_dir().ok_or(ConfigError::NoDataDir)?.join(DB_FILE_NAME),
                };
                Ok(StoreConfig::Sqlite { path })
            }
        }
    }

    pub fn resolved_cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir.clone().or_else(Self::default_cache_dir)
    }

    pub fn log_dir() -> Option<PathBuf> {
        Self::data_dir().map(|d| d.join("logs"))
    }
}
