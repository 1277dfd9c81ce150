/// Keyword specification parsing
///
/// A keyword is given either as a bare path to a `.ppn` file or as an object
/// `{ "filePath": ..., "sensitivity": ... }`. A single keyword selects a
/// single-keyword session; a list (even of length one) selects a
/// multi-keyword session.

use crate::error::{Result, SpotterError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Sensitivity used when a keyword does not carry one
pub const DEFAULT_SENSITIVITY: f32 = 0.5;

/// Validated keyword: model file path plus sensitivity in [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordSpec {
    file_path: PathBuf,
    sensitivity: f32,
}

impl KeywordSpec {
    pub fn new(file_path: impl Into<PathBuf>, sensitivity: f32) -> Result<Self> {
        let file_path = file_path.into();
        validate_path(&file_path, "keyword file path")?;

        if !sensitivity.is_finite() || !(0.0..=1.0).contains(&sensitivity) {
            return Err(SpotterError::validation(format!(
                "sensitivity must be between 0.0 and 1.0, got {}",
                sensitivity
            )));
        }

        Ok(Self {
            file_path,
            sensitivity,
        })
    }

    /// Keyword with the default sensitivity
    pub fn with_default_sensitivity(file_path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(file_path, DEFAULT_SENSITIVITY)
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }
}

/// Reject empty paths and paths that cannot cross into C
pub(crate) fn validate_path(path: &Path, what: &str) -> Result<()> {
    let bytes = path.as_os_str().as_encoded_bytes();

    if bytes.is_empty() {
        return Err(SpotterError::validation(format!("{} must not be empty", what)));
    }

    if bytes.contains(&0) {
        return Err(SpotterError::validation(format!(
            "{} contains a NUL byte",
            what
        )));
    }

    Ok(())
}

/// Sensitivity as supplied: a number or a numeric string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SensitivityValue {
    Number(f64),
    Text(String),
}

impl SensitivityValue {
    fn to_f32(&self) -> Result<f32> {
        let value = match self {
            SensitivityValue::Number(n) => *n,
            SensitivityValue::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                SpotterError::validation(format!("sensitivity {:?} is not a number", s))
            })?,
        };
        Ok(value as f32)
    }
}

/// Object form of a keyword
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeywordOptions {
    #[serde(rename = "filePath")]
    pub file_path: PathBuf,

    #[serde(default)]
    pub sensitivity: Option<SensitivityValue>,
}

/// One keyword as supplied by the caller
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum KeywordEntry {
    Path(PathBuf),
    Options(KeywordOptions),
}

impl KeywordEntry {
    pub fn with_sensitivity(file_path: impl Into<PathBuf>, sensitivity: f64) -> Self {
        KeywordEntry::Options(KeywordOptions {
            file_path: file_path.into(),
            sensitivity: Some(SensitivityValue::Number(sensitivity)),
        })
    }

    /// Validate and normalize into a `KeywordSpec`
    pub fn to_spec(&self) -> Result<KeywordSpec> {
        match self {
            KeywordEntry::Path(path) => KeywordSpec::with_default_sensitivity(path.clone()),
            KeywordEntry::Options(options) => {
                let sensitivity = match &options.sensitivity {
                    Some(value) => value.to_f32()?,
                    None => DEFAULT_SENSITIVITY,
                };
                KeywordSpec::new(options.file_path.clone(), sensitivity)
            }
        }
    }
}

impl From<&str> for KeywordEntry {
    fn from(path: &str) -> Self {
        KeywordEntry::Path(PathBuf::from(path))
    }
}

impl From<String> for KeywordEntry {
    fn from(path: String) -> Self {
        KeywordEntry::Path(PathBuf::from(path))
    }
}

impl From<PathBuf> for KeywordEntry {
    fn from(path: PathBuf) -> Self {
        KeywordEntry::Path(path)
    }
}

impl From<KeywordSpec> for KeywordEntry {
    fn from(spec: KeywordSpec) -> Self {
        KeywordEntry::with_sensitivity(spec.file_path, spec.sensitivity as f64)
    }
}

/// A single keyword or a list of keywords
///
/// `Many` is listed first so that a JSON array is never read as a single
/// keyword object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Keywords {
    Many(Vec<KeywordEntry>),
    One(KeywordEntry),
}

impl Keywords {
    /// Interpret a dynamic JSON value (string, object or array)
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(|e| {
            SpotterError::validation(format!("invalid keyword specification: {}", e))
        })
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Keywords::Many(_))
    }

    /// Validate every entry; any failure fails the whole set
    pub fn parse(&self) -> Result<KeywordSet> {
        match self {
            Keywords::One(entry) => Ok(KeywordSet::Single(entry.to_spec()?)),
            Keywords::Many(entries) => {
                if entries.is_empty() {
                    return Err(SpotterError::validation("keyword list must not be empty"));
                }

                let specs = entries
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| {
                        entry.to_spec().map_err(|e| match e {
                            SpotterError::Validation(msg) => {
                                SpotterError::validation(format!("keyword {}: {}", i, msg))
                            }
                            other => other,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(KeywordSet::Multiple(specs))
            }
        }
    }
}

impl From<&str> for Keywords {
    fn from(path: &str) -> Self {
        Keywords::One(path.into())
    }
}

impl From<KeywordEntry> for Keywords {
    fn from(entry: KeywordEntry) -> Self {
        Keywords::One(entry)
    }
}

impl From<KeywordSpec> for Keywords {
    fn from(spec: KeywordSpec) -> Self {
        Keywords::One(spec.into())
    }
}

impl From<Vec<KeywordEntry>> for Keywords {
    fn from(entries: Vec<KeywordEntry>) -> Self {
        Keywords::Many(entries)
    }
}

impl From<Vec<KeywordSpec>> for Keywords {
    fn from(specs: Vec<KeywordSpec>) -> Self {
        Keywords::Many(specs.into_iter().map(KeywordEntry::from).collect())
    }
}

/// Normalized keywords, ready for engine initialization
#[derive(Debug, Clone, PartialEq)]
pub enum KeywordSet {
    Single(KeywordSpec),
    Multiple(Vec<KeywordSpec>),
}

impl KeywordSet {
    pub fn specs(&self) -> &[KeywordSpec] {
        match self {
            KeywordSet::Single(spec) => std::slice::from_ref(spec),
            KeywordSet::Multiple(specs) => specs,
        }
    }

    pub fn len(&self) -> usize {
        self.specs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs().is_empty()
    }
}
