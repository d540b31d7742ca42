//! Configuration management for doclens using the prefer crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::{BackendConfig, BackendKind};
use crate::cache::{DEFAULT_CAPACITY, DEFAULT_TTL};
use crate::models::{DEFAULT_SUMMARY_MAX_LENGTH, DEFAULT_SUMMARY_MIN_LENGTH, DEFAULT_TOP_N};
use crate::ocr::DEFAULT_LANGUAGE;

/// Environment variable overriding the cache TTL, in seconds.
pub const ENV_CACHE_TTL: &str = "DOCLENS_CACHE_TTL";
/// Environment variable overriding the cache capacity.
pub const ENV_CACHE_CAPACITY: &str = "DOCLENS_CACHE_CAPACITY";
/// Environment variable overriding the Tesseract language.
pub const ENV_OCR_LANGUAGE: &str = "DOCLENS_OCR_LANGUAGE";

/// Result cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry lifetime in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Maximum number of cached results.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL.as_secs()
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            capacity: default_capacity(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Tesseract language(s), e.g. "eng" or "deu+eng".
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,
    /// Detect orientation and script of images (one more Tesseract run).
    #[serde(default = "default_detect_script")]
    pub detect_script: bool,
}

fn default_detect_script() -> bool {
    true
}

fn default_ocr_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ocr_language: default_ocr_language(),
            detect_script: default_detect_script(),
        }
    }
}

/// Default analysis parameters used when a request doesn't set them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_max_length() -> usize {
    DEFAULT_SUMMARY_MAX_LENGTH
}

fn default_min_length() -> usize {
    DEFAULT_SUMMARY_MIN_LENGTH
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            min_length: default_min_length(),
            top_n: default_top_n(),
        }
    }
}

/// Per-kind backend settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendsConfig {
    #[serde(default)]
    pub sentiment: BackendConfig,
    #[serde(default)]
    pub summary: BackendConfig,
}

impl BackendsConfig {
    pub fn get(&self, kind: BackendKind) -> &BackendConfig {
        match kind {
            BackendKind::Sentiment => &self.sentiment,
            BackendKind::Summary => &self.summary,
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub backends: BackendsConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer for discovery.
    ///
    /// Falls back to defaults when no `doclens` config file is found or it
    /// can't be parsed. Environment overrides apply either way.
    pub async fn load() -> Self {
        match prefer::load("doclens").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => return config,
                        Err(e) => tracing::warn!("Ignoring config {}: {}", path.display(), e),
                    }
                }
                Self::default_with_env()
            }
            Err(_) => Self::default_with_env(),
        }
    }

    /// Defaults with environment overrides applied.
    pub fn default_with_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config
    }

    /// Load configuration from a specific file path.
    /// Format follows the extension: TOML, YAML, otherwise JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        let base_dir = config.base_dir().unwrap_or_else(|| PathBuf::from("."));
        config.resolve_paths(&base_dir);
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e)),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Directory of the config file, used for relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// Paths starting with ~ are expanded.
    pub fn resolve_path(path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        for backend in [&mut self.backends.sentiment, &mut self.backends.summary] {
            if let Some(lexicon) = backend.lexicon_path.take() {
                backend.lexicon_path =
                    Some(Self::resolve_path(&lexicon.to_string_lossy(), base_dir));
            }
        }
    }

    /// Apply `DOCLENS_*` overrides. Unparseable values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_CACHE_TTL) {
            match raw.trim().parse() {
                Ok(ttl) => self.cache.ttl_secs = ttl,
                Err(_) => tracing::warn!("Ignoring invalid {}={:?}", ENV_CACHE_TTL, raw),
            }
        }
        if let Some(raw) = lookup(ENV_CACHE_CAPACITY) {
            match raw.trim().parse() {
                Ok(capacity) => self.cache.capacity = capacity,
                Err(_) => tracing::warn!("Ignoring invalid {}={:?}", ENV_CACHE_CAPACITY, raw),
            }
        }
        if let Some(language) = lookup(ENV_OCR_LANGUAGE) {
            let language = language.trim();
            if !language.is_empty() {
                self.extraction.ocr_language = language.to_string();
            }
        }
    }
}
