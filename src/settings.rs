use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SettingsError;

pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const DEFAULT_API_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

const API_KEY_ENV: &str = "TMDB_API_KEY";
const LANGUAGE_ENV: &str = "TMDB_LANGUAGE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub include_adult: bool,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,
}

fn default_language() -> String {
    String::from(DEFAULT_LANGUAGE)
}

fn default_api_base_url() -> String {
    String::from(DEFAULT_API_BASE_URL)
}

fn default_image_base_url() -> String {
    String::from(DEFAULT_IMAGE_BASE_URL)
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: default_language(),
            include_adult: false,
            api_base_url: default_api_base_url(),
            image_base_url: default_image_base_url(),
        }
    }
}

impl AppSettings {
    pub fn config_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
            .or_else(|| {
                std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
            })?;
        Some(base.join("reelscout").join("config.json"))
    }

    /// Reads settings from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                debug!("loaded settings from {}", path.display());
                Ok(serde_json::from_str(&content)?)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Settings file (if any) with environment overrides applied on top.
    pub fn resolve(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match path {
            Some(path) => Self::load_from(path)?,
            None => match Self::config_path() {
                Some(path) => Self::load_from(&path)?,
                None => {
                    warn!("no configuration directory found, using defaults");
                    Self::default()
                }
            },
        };
        settings.apply_env(|name| std::env::var(name).ok());
        Ok(settings)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.api_key = key.trim().to_string();
        }
        if let Some(language) = lookup(LANGUAGE_ENV).filter(|l| !l.trim().is_empty()) {
            self.language = language.trim().to_string();
        }
    }

    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn masked_api_key(&self) -> String {
        let chars: Vec<char> = self.api_key.trim().chars().collect();
        let hidden = chars.len().saturating_sub(4);
        chars
            .iter()
            .enumerate()
            .map(|(i, c)| if i < hidden || chars.len() <= 4 { '*' } else { *c })
            .collect()
    }
}
