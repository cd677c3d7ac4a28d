//! File configuration: data source, cache, scoring presets, validation.
//!
//! Every section has defaults, so an absent file or an empty one means
//! "use the defaults". Thresholds read from here are handed explicitly to
//! the scoring engine; nothing is kept in global state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use fiilab_core::data::fundamentus::{DEFAULT_URL, DEFAULT_USER_AGENT};
use fiilab_core::data::{FundamentusSettings, SnapshotCache};
use fiilab_core::domain::schema;
use fiilab_core::scoring::ScoringThresholds;
use fiilab_core::validation::{validate_thresholds, ThresholdError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("preset '{preset}': {source}")]
    Threshold {
        preset: PresetName,
        source: ThresholdError,
    },

    #[error("preset '{0}': min_score must be within 0..=5")]
    MinScore(PresetName),

    #[error("{0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FiiLabConfig {
    pub source: SourceConfig,
    pub cache: CacheConfig,
    pub presets: Presets,
    pub validation: ValidationConfig,
}

impl FiiLabConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load `path` if given, else the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in [PresetName::Beginner, PresetName::Advanced] {
            let preset = self.presets.get(name);
            validate_thresholds(&preset.thresholds()).map_err(|source| {
                ConfigError::Threshold {
                    preset: name,
                    source,
                }
            })?;
            if preset.min_score > 5 {
                return Err(ConfigError::MinScore(name));
            }
        }
        if self.source.url.trim().is_empty() {
            return Err(ConfigError::Invalid("source.url cannot be empty".into()));
        }
        if self.validation.required_columns.is_empty() {
            return Err(ConfigError::Invalid(
                "validation.required_columns cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Where and how the listing is downloaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl SourceConfig {
    pub fn settings(&self) -> FundamentusSettings {
        FundamentusSettings {
            url: self.url.clone(),
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_retries: 3,
            retry_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: PathBuf,
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn build(&self) -> SnapshotCache {
        SnapshotCache::new(&self.dir, Duration::from_secs(self.ttl_secs))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            ttl_secs: 3600,
        }
    }
}

/// Which preset to screen with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    Beginner,
    Advanced,
}

impl std::fmt::Display for PresetName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Beginner => write!(f, "beginner"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for PresetName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beginner" | "iniciante" => Ok(Self::Beginner),
            "advanced" | "avancado" => Ok(Self::Advanced),
            other => Err(format!(
                "unknown preset '{other}'. Valid: beginner, advanced"
            )),
        }
    }
}

/// One preset: the five scoring limits plus the score cut-off.
///
/// `min_dy` and `max_vac` are percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub min_dy: f64,
    pub max_pvp: f64,
    pub min_liq: f64,
    pub max_vac: f64,
    pub min_vm: f64,
    #[serde(default)]
    pub min_score: u8,
}

impl Preset {
    pub fn thresholds(&self) -> ScoringThresholds {
        ScoringThresholds {
            min_dividend_yield: self.min_dy,
            max_p_vp: self.max_pvp,
            min_liquidity: self.min_liq,
            max_vacancy: self.max_vac,
            min_market_value: self.min_vm,
        }
    }

    fn from_thresholds(t: ScoringThresholds) -> Self {
        Self {
            min_dy: t.min_dividend_yield,
            max_pvp: t.max_p_vp,
            min_liq: t.min_liquidity,
            max_vac: t.max_vacancy,
            min_vm: t.min_market_value,
            min_score: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Presets {
    pub beginner: Preset,
    pub advanced: Preset,
}

impl Presets {
    pub fn get(&self, name: PresetName) -> &Preset {
        match name {
            PresetName::Beginner => &self.beginner,
            PresetName::Advanced => &self.advanced,
        }
    }
}

impl Default for Presets {
    fn default() -> Self {
        Self {
            beginner: Preset::from_thresholds(ScoringThresholds::beginner()),
            advanced: Preset::from_thresholds(ScoringThresholds::advanced()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub required_columns: Vec<String>,
}

impl ValidationConfig {
    pub fn required(&self) -> Vec<&str> {
        self.required_columns.iter().map(String::as_str).collect()
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            required_columns: schema::DEFAULT_REQUIRED_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}
