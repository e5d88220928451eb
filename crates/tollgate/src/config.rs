//! Layered configuration for the request pipeline.
//!
//! Sources, later overriding earlier:
//! 1. Bundled defaults (`tollgate.toml` shipped with the library)
//! 2. `~/.config/tollgate/tollgate.toml`
//! 3. `./tollgate.toml`
//! 4. `TOLLGATE__<SECTION>__<KEY>` environment variables
//!    (e.g. `TOLLGATE__RATE_LIMIT__MAX_REQUESTS=120`)

use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tollgate_cache::CacheConfig;
use tollgate_error::{ConfigError, TollgateResult};
use tollgate_rate_limit::RateLimitConfig;
use tollgate_retry::RetryPolicy;
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../../../tollgate.toml");

/// Named presets spanning all three components.
///
/// A preset applies to every component that has a preset of that name and
/// leaves the others at their defaults.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PresetName {
    /// Tight rate limit
    Strict,
    /// Loose rate limit
    Lenient,
    /// Many retries and a large, long-lived cache
    Aggressive,
    /// Few retries and a small, short-lived cache
    Conservative,
    /// No rate limiting, retries or caching
    Disabled,
}

/// Settings for every pipeline component.
///
/// # Example
///
/// ```
/// use tollgate::{PresetName, TollgateConfig};
///
/// let config = TollgateConfig::preset(PresetName::Strict);
/// assert_eq!(*config.rate_limit().max_requests(), 30);
///
/// let parsed: PresetName = "conservative".parse().unwrap();
/// assert_eq!(*TollgateConfig::preset(parsed).retry().max_attempts(), 2);
/// ```
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct TollgateConfig {
    /// Admission control
    #[serde(default)]
    rate_limit: RateLimitConfig,

    /// Backoff and retryability
    #[serde(default)]
    retry: RetryPolicy,

    /// Response caching
    #[serde(default)]
    cache: CacheConfig,
}

impl TollgateConfig {
    /// Configuration for a named preset.
    pub fn preset(name: PresetName) -> Self {
        match name {
            PresetName::Strict => Self::default().with_rate_limit(RateLimitConfig::strict()),
            PresetName::Lenient => Self::default().with_rate_limit(RateLimitConfig::lenient()),
            PresetName::Aggressive => Self::default()
                .with_retry(RetryPolicy::aggressive())
                .with_cache(CacheConfig::aggressive()),
            PresetName::Conservative => Self::default()
                .with_retry(RetryPolicy::conservative())
                .with_cache(CacheConfig::conservative()),
            PresetName::Disabled => Self {
                rate_limit: RateLimitConfig::disabled(),
                retry: RetryPolicy::disabled(),
                cache: CacheConfig::disabled(),
            },
        }
    }

    /// Configuration for a preset given by name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if no preset has that name.
    pub fn preset_named(name: &str) -> Result<Self, ConfigError> {
        name.parse::<PresetName>()
            .map(Self::preset)
            .map_err(|_| ConfigError::new(format!("Unknown preset: {}", name)))
    }

    /// Check every component.
    ///
    /// # Errors
    ///
    /// Returns the first component error found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rate_limit.validate()?;
        if *self.retry.enabled() {
            self.retry.validate()?;
        }
        self.cache.validate()
    }

    /// Load a single configuration file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> TollgateResult<Self> {
        debug!("Loading configuration from file");
        let builder = Config::builder().add_source(File::from(path.as_ref()));
        Self::finish(builder)
    }

    /// Load configuration from all layers.
    ///
    /// User files are optional and skipped when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if a present source cannot be parsed or the merged
    /// result is invalid.
    #[instrument]
    pub fn load() -> TollgateResult<Self> {
        Self::load_with_env(None)
    }

    /// User-level file, then the working directory file, on top of the
    /// bundled defaults.
    fn user_files() -> Vec<PathBuf> {
        let mut files = Vec::new();
        if let Some(home) = dirs::home_dir() {
            files.push(home.join(".config/tollgate/tollgate.toml"));
        }
        files.push(PathBuf::from("tollgate.toml"));
        files
    }

    fn load_with_env(env: Option<config::Map<String, String>>) -> TollgateResult<Self> {
        Self::layered(&Self::user_files(), env)
    }

    /// Bundled defaults, then each optional file in order, then environment
    /// variables. `env` replaces the process environment when given.
    fn layered(
        files: &[PathBuf],
        env: Option<config::Map<String, String>>,
    ) -> TollgateResult<Self> {
        debug!(layers = files.len(), "Loading layered configuration");
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));
        for file in files {
            builder = builder.add_source(File::from(file.as_path()).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix("TOLLGATE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );
        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> TollgateResult<Self> {
        let config: Self = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        debug!(
            rate_limit_enabled = config.rate_limit.enabled(),
            retry_enabled = config.retry.enabled(),
            cache_enabled = config.cache.enabled(),
            "Configuration loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use strum::IntoEnumIterator;

    fn write_toml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_bundled_defaults_match_code_defaults() {
        let config = TollgateConfig::layered(&[], Some(config::Map::new())).unwrap();
        assert_eq!(config, TollgateConfig::default());
    }

    #[test]
    fn test_later_files_override_earlier() {
        let home = write_toml("[rate_limit]\nmax_requests = 10\nburst_size = 2\n");
        let local = write_toml("[rate_limit]\nburst_size = 4\n\n[cache]\nenabled = false\n");

        let config = TollgateConfig::layered(
            &[home.path().to_path_buf(), local.path().to_path_buf()],
            Some(config::Map::new()),
        )
        .unwrap();

        assert_eq!(*config.rate_limit().max_requests(), 10);
        assert_eq!(*config.rate_limit().burst_size(), 4);
        assert!(!*config.cache().enabled());
        assert_eq!(*config.retry().max_attempts(), 3);
    }

    #[test]
    fn test_missing_files_are_skipped() {
        let config = TollgateConfig::layered(
            &[PathBuf::from("/nonexistent/tollgate.toml")],
            Some(config::Map::new()),
        )
        .unwrap();
        assert_eq!(config, TollgateConfig::default());
    }

    #[test]
    fn test_load_searches_home_then_working_directory() {
        let files = TollgateConfig::user_files();
        assert_eq!(files.last(), Some(&PathBuf::from("tollgate.toml")));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(files[0], home.join(".config/tollgate/tollgate.toml"));
            assert_eq!(files.len(), 2);
        }
    }

    #[test]
    fn test_load_without_user_files_gives_defaults() {
        // The crate directory has no tollgate.toml; env is isolated.
        let config = TollgateConfig::load_with_env(Some(config::Map::new())).unwrap();
        assert!(config.validate().is_ok());

        let env = config::Map::from([(
            "TOLLGATE__RETRY__MAX_ATTEMPTS".to_string(),
            "4".to_string(),
        )]);
        let config = TollgateConfig::load_with_env(Some(env)).unwrap();
        assert_eq!(*config.retry().max_attempts(), 4);
    }

    #[test]
    fn test_environment_overrides_files() {
        let local = write_toml("[retry]\nmax_attempts = 1\n");
        let env = config::Map::from([
            ("TOLLGATE__RETRY__MAX_ATTEMPTS".to_string(), "6".to_string()),
            ("TOLLGATE__CACHE__MAX_SIZE".to_string(), "25".to_string()),
        ]);

        let config =
            TollgateConfig::layered(&[local.path().to_path_buf()], Some(env)).unwrap();

        assert_eq!(*config.retry().max_attempts(), 6);
        assert_eq!(*config.cache().max_size(), 25);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let local = write_toml("[retry]\nbackoff_multiplier = 0.5\n");
        let result = TollgateConfig::layered(&[local.path().to_path_buf()], Some(config::Map::new()));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file_fills_missing_sections() {
        let file = write_toml("[cache]\nmax_size = 7\n");
        let config = TollgateConfig::from_file(file.path()).unwrap();
        assert_eq!(*config.cache().max_size(), 7);
        assert_eq!(*config.rate_limit(), RateLimitConfig::default());
    }

    #[test]
    fn test_from_file_missing_is_error() {
        assert!(TollgateConfig::from_file("/nonexistent/tollgate.toml").is_err());
    }

    #[test]
    fn test_every_preset_is_valid() {
        for name in PresetName::iter() {
            let config = TollgateConfig::preset(name);
            assert!(config.validate().is_ok(), "{} preset invalid", name);
            assert_eq!(TollgateConfig::preset_named(&name.to_string()).unwrap(), config);
        }
        assert!(TollgateConfig::preset_named("STRICT").is_ok());
        assert!(TollgateConfig::preset_named("reckless").is_err());
    }

    #[test]
    fn test_disabled_preset_turns_everything_off() {
        let config = TollgateConfig::preset(PresetName::Disabled);
        assert!(!*config.rate_limit().enabled());
        assert!(!*config.retry().enabled());
        assert!(!*config.cache().enabled());
    }
}
