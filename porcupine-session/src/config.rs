/// Keyword spotter configuration
///
/// Loaded from a JSON file or from environment variables:
///
/// ```json
/// {
///   "modelFilePath": "models/porcupine_params.pv",
///   "keywords": [{ "filePath": "hey_aether.ppn", "sensitivity": 0.6 }, "stop.ppn"],
///   "chunkBytes": 4096
/// }
/// ```

use crate::error::SpotterError;
use crate::keyword::{validate_path, KeywordEntry, KeywordSet, Keywords};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const CONFIG_PATH_ENV: &str = "KEYWORD_SPOTTER_CONFIG";
pub const MODEL_PATH_ENV: &str = "PORCUPINE_MODEL_PATH";
pub const KEYWORDS_ENV: &str = "PORCUPINE_KEYWORDS";

/// Default bytes fed to the stream per write
pub const DEFAULT_CHUNK_BYTES: usize = 4096;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {1}", .0.display())]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] SpotterError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotterConfig {
    /// Porcupine model parameters (.pv)
    #[serde(alias = "moduleFilePath")]
    pub model_file_path: PathBuf,

    /// One keyword or a list of keywords
    pub keywords: Keywords,

    #[serde(default = "default_chunk_bytes")]
    pub chunk_bytes: usize,
}

fn default_chunk_bytes() -> usize {
    DEFAULT_CHUNK_BYTES
}

impl SpotterConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading config from {}", path.display());

        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_json_str(&json)
    }

    /// Load from `KEYWORD_SPOTTER_CONFIG`, else from
    /// `PORCUPINE_MODEL_PATH` and `PORCUPINE_KEYWORDS`
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::from_file(path);
        }

        let model = std::env::var(MODEL_PATH_ENV)
            .map_err(|_| ConfigError::MissingEnvVar(MODEL_PATH_ENV))?;
        let keywords = std::env::var(KEYWORDS_ENV)
            .map_err(|_| ConfigError::MissingEnvVar(KEYWORDS_ENV))?;

        let config = Self {
            model_file_path: PathBuf::from(model),
            keywords: parse_keyword_list(&keywords)?,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the model path, chunk size and every keyword
    pub fn validate(&self) -> Result<KeywordSet, ConfigError> {
        validate_path(&self.model_file_path, "model file path")?;

        if self.chunk_bytes == 0 {
            return Err(SpotterError::validation("chunkBytes must be greater than 0").into());
        }

        if !self.model_file_path.exists() {
            warn!("Model file not found: {}", self.model_file_path.display());
        }

        Ok(self.keywords.parse()?)
    }
}

/// Parse `path[:sensitivity]` entries separated by commas
///
/// The text after the last `:` is a sensitivity only when it is a number;
/// otherwise the whole item is the path, so drive letters and colons inside
/// paths are kept. More than one entry, or a trailing comma (`hey.ppn,`),
/// yields a keyword list.
pub fn parse_keyword_list(value: &str) -> Result<Keywords, SpotterError> {
    let trailing_comma = value.trim_end().ends_with(',');

    let mut entries: Vec<KeywordEntry> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|item| match item.rsplit_once(':') {
            Some((path, sensitivity)) if !path.is_empty() => {
                match sensitivity.trim().parse::<f64>() {
                    Ok(s) => KeywordEntry::with_sensitivity(path, s),
                    Err(_) => KeywordEntry::from(item),
                }
            }
            _ => KeywordEntry::from(item),
        })
        .collect();

    if entries.len() > 1 || (trailing_comma && !entries.is_empty()) {
        return Ok(Keywords::Many(entries));
    }

    entries
        .pop()
        .map(Keywords::One)
        .ok_or_else(|| SpotterError::validation("no keywords configured"))
}
