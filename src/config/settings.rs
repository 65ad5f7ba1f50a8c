//! Settings struct and layered loading.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::git::{StatusKind, StatusMap};

use super::{
    APP_DIR, DEFAULT_BASE_URL, DEFAULT_BRIEF_MAX_OUTPUT_TOKENS, DEFAULT_DETAILED_MAX_OUTPUT_TOKENS,
    DEFAULT_MAX_DIFF_LENGTH, DEFAULT_MODEL, DEFAULT_TEMPERATURE, GenerationConfig, GenerationMode,
    REPO_CONFIG_FILE,
};

pub const ENV_MODEL: &str = "COMMITWRIGHT_MODEL";
pub const ENV_TEMPERATURE: &str = "COMMITWRIGHT_TEMPERATURE";
pub const ENV_MAX_OUTPUT_TOKENS: &str = "COMMITWRIGHT_MAX_OUTPUT_TOKENS";
pub const ENV_MAX_DIFF_LENGTH: &str = "COMMITWRIGHT_MAX_DIFF_LENGTH";
pub const ENV_SHOW_TIMING_INFO: &str = "COMMITWRIGHT_SHOW_TIMING_INFO";
pub const ENV_TIMEOUT: &str = "COMMITWRIGHT_TIMEOUT";
pub const ENV_BASE_URL: &str = "COMMITWRIGHT_BASE_URL";

/// One layer of settings. Unset fields fall through to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    /// Applies to both modes when set; otherwise each mode has its own default.
    pub max_output_tokens: Option<u32>,
    pub max_diff_length: Option<usize>,
    pub show_timing_info: Option<bool>,
    /// Wrapping timeout for the model call, in seconds. None waits indefinitely.
    pub timeout_secs: Option<u64>,
    pub base_url: Option<String>,
    /// Raw status code (as a decimal string) to status kind.
    pub status_codes: BTreeMap<String, StatusKind>,
}

impl Settings {
    /// Parse one settings file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read overrides from `COMMITWRIGHT_*` variables.
    ///
    /// Values that fail to parse or are out of range are logged and ignored.
    pub fn from_env() -> Self {
        let temperature = env_parsed::<f32>(ENV_TEMPERATURE).filter(|t| {
            let ok = (0.0..=1.0).contains(t);
            if !ok {
                warn!("Invalid {} value '{}', must be within [0, 1]", ENV_TEMPERATURE, t);
            }
            ok
        });
        let max_output_tokens = env_parsed::<u32>(ENV_MAX_OUTPUT_TOKENS).filter(|n| {
            if *n == 0 {
                warn!("Invalid {} value '0', ignoring", ENV_MAX_OUTPUT_TOKENS);
            }
            *n > 0
        });
        let max_diff_length = env_parsed::<usize>(ENV_MAX_DIFF_LENGTH).filter(|n| {
            if *n == 0 {
                warn!("Invalid {} value '0', ignoring", ENV_MAX_DIFF_LENGTH);
            }
            *n > 0
        });

        Self {
            model: env_string(ENV_MODEL),
            temperature,
            max_output_tokens,
            max_diff_length,
            show_timing_info: env_bool(ENV_SHOW_TIMING_INFO),
            timeout_secs: env_parsed::<u64>(ENV_TIMEOUT),
            base_url: env_string(ENV_BASE_URL),
            status_codes: BTreeMap::new(),
        }
    }

    /// Overlay `other` on top of `self`; set fields in `other` win.
    pub fn merge(mut self, other: Settings) -> Self {
        if other.model.is_some() {
            self.model = other.model;
        }
        if other.temperature.is_some() {
            self.temperature = other.temperature;
        }
        if other.max_output_tokens.is_some() {
            self.max_output_tokens = other.max_output_tokens;
        }
        if other.max_diff_length.is_some() {
            self.max_diff_length = other.max_diff_length;
        }
        if other.show_timing_info.is_some() {
            self.show_timing_info = other.show_timing_info;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        self.status_codes.extend(other.status_codes);
        self
    }

    /// Snapshot the model parameters for one generation in `mode`.
    pub fn generation_config(&self, mode: GenerationMode) -> Result<GenerationConfig, ConfigError> {
        let max_output_tokens = self.max_output_tokens.unwrap_or(match mode {
            GenerationMode::Brief => DEFAULT_BRIEF_MAX_OUTPUT_TOKENS,
            GenerationMode::Detailed => DEFAULT_DETAILED_MAX_OUTPUT_TOKENS,
        });

        GenerationConfig::new(
            self.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_output_tokens,
            self.max_diff_length.unwrap_or(DEFAULT_MAX_DIFF_LENGTH),
        )
    }

    pub fn show_timing_info(&self) -> bool {
        self.show_timing_info.unwrap_or(false)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Status table with any `[status_codes]` overrides applied.
    pub fn status_map(&self) -> Result<StatusMap, ConfigError> {
        StatusMap::libgit2().with_overrides(&self.status_codes)
    }
}

/// Re-reads every settings layer on each [`load`](SettingsLoader::load),
/// so edits are picked up by the next invocation without a restart.
#[derive(Debug, Clone, Default)]
pub struct SettingsLoader {
    global_path: Option<PathBuf>,
    repo_root: Option<PathBuf>,
    overrides: Settings,
}

impl SettingsLoader {
    /// Loader using the platform global config path and no repository layer.
    pub fn new() -> Self {
        Self {
            global_path: global_config_path(),
            repo_root: None,
            overrides: Settings::default(),
        }
    }

    pub fn with_repo_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.repo_root = Some(root.into());
        self
    }

    pub fn with_global_path(mut self, path: Option<PathBuf>) -> Self {
        self.global_path = path;
        self
    }

    /// Highest-priority layer, typically built from CLI flags.
    pub fn with_overrides(mut self, overrides: Settings) -> Self {
        self.overrides = overrides;
        self
    }

    /// Build the effective settings from all layers.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let mut settings = Settings::default();

        if let Some(path) = self.global_path.as_deref().filter(|p| p.is_file()) {
            debug!("Loading global settings from {}", path.display());
            settings = settings.merge(Settings::from_file(path)?);
        }

        if let Some(root) = &self.repo_root {
            let path = root.join(REPO_CONFIG_FILE);
            if path.is_file() {
                debug!("Loading repository settings from {}", path.display());
                settings = settings.merge(Settings::from_file(&path)?);
            }
        }

        settings = settings.merge(Settings::from_env());
        Ok(settings.merge(self.overrides.clone()))
    }
}

/// `<config dir>/commitwright/config.toml`, if the platform has a config dir.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

fn env_string(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn env_parsed<T: FromStr>(key: &str) -> Option<T> {
    let raw = env_string(key)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Invalid {} value '{}', ignoring", key, raw);
            None
        }
    }
}

fn env_bool(key: &str) -> Option<bool> {
    let raw = env_string(key)?;
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            warn!("Invalid {} value '{}', ignoring", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL_VARS: [&str; 7] = [
        ENV_MODEL,
        ENV_TEMPERATURE,
        ENV_MAX_OUTPUT_TOKENS,
        ENV_MAX_DIFF_LENGTH,
        ENV_SHOW_TIMING_INFO,
        ENV_TIMEOUT,
        ENV_BASE_URL,
    ];

    fn without_env<R>(f: impl FnOnce() -> R) -> R {
        temp_env::with_vars_unset(ALL_VARS, f)
    }

    #[test]
    #[serial]
    fn test_defaults_per_mode() {
        without_env(|| {
            let settings = SettingsLoader::default().load().unwrap();

            let brief = settings.generation_config(GenerationMode::Brief).unwrap();
            assert_eq!(brief.model_name, DEFAULT_MODEL);
            assert_eq!(brief.temperature, 0.1);
            assert_eq!(brief.max_output_tokens, 300);
            assert_eq!(brief.max_diff_length, 8000);

            let detailed = settings.generation_config(GenerationMode::Detailed).unwrap();
            assert_eq!(detailed.max_output_tokens, 1000);

            assert!(!settings.show_timing_info());
            assert!(settings.timeout().is_none());
            assert_eq!(settings.base_url(), DEFAULT_BASE_URL);
        });
    }

    #[test]
    #[serial]
    fn test_explicit_max_output_tokens_applies_to_both_modes() {
        without_env(|| {
            let settings = Settings {
                max_output_tokens: Some(64),
                ..Default::default()
            };
            assert_eq!(
                settings.generation_config(GenerationMode::Brief).unwrap().max_output_tokens,
                64
            );
            assert_eq!(
                settings.generation_config(GenerationMode::Detailed).unwrap().max_output_tokens,
                64
            );
        });
    }

    #[test]
    #[serial]
    fn test_repo_file_overrides_global_file() {
        without_env(|| {
            let dir = tempfile::tempdir().unwrap();
            let global = dir.path().join("global.toml");
            std::fs::write(&global, "model = \"global-model\"\ntemperature = 0.5\n").unwrap();
            std::fs::write(
                dir.path().join(REPO_CONFIG_FILE),
                "model = \"repo-model\"\nshow_timing_info = true\n",
            )
            .unwrap();

            let settings = SettingsLoader::default()
                .with_global_path(Some(global))
                .with_repo_root(dir.path())
                .load()
                .unwrap();

            assert_eq!(settings.model.as_deref(), Some("repo-model"));
            assert_eq!(settings.temperature, Some(0.5));
            assert!(settings.show_timing_info());
        });
    }

    #[test]
    #[serial]
    fn test_env_overrides_files_and_flags_override_env() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(REPO_CONFIG_FILE), "model = \"repo-model\"\n").unwrap();

        temp_env::with_vars(
            [(ENV_MODEL, Some("env-model")), (ENV_MAX_DIFF_LENGTH, Some("1234"))],
            || {
                let loader = SettingsLoader::default().with_repo_root(dir.path());
                let settings = loader.load().unwrap();
                assert_eq!(settings.model.as_deref(), Some("env-model"));
                assert_eq!(settings.max_diff_length, Some(1234));

                let settings = loader
                    .with_overrides(Settings {
                        model: Some("flag-model".to_string()),
                        ..Default::default()
                    })
                    .load()
                    .unwrap();
                assert_eq!(settings.model.as_deref(), Some("flag-model"));
            },
        );
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_are_ignored() {
        temp_env::with_vars(
            [
                (ENV_TEMPERATURE, Some("hot")),
                (ENV_MAX_OUTPUT_TOKENS, Some("0")),
                (ENV_SHOW_TIMING_INFO, Some("maybe")),
                (ENV_TIMEOUT, Some("-5")),
            ],
            || {
                let settings = Settings::from_env();
                assert!(settings.temperature.is_none());
                assert!(settings.max_output_tokens.is_none());
                assert!(settings.show_timing_info.is_none());
                assert!(settings.timeout_secs.is_none());
            },
        );
    }

    #[test]
    #[serial]
    fn test_out_of_range_env_temperature_is_ignored() {
        temp_env::with_var(ENV_TEMPERATURE, Some("1.7"), || {
            assert!(Settings::from_env().temperature.is_none());
        });
    }

    #[test]
    #[serial]
    fn test_env_bool_accepts_common_spellings() {
        temp_env::with_var(ENV_SHOW_TIMING_INFO, Some("YES"), || {
            assert_eq!(Settings::from_env().show_timing_info, Some(true));
        });
        temp_env::with_var(ENV_SHOW_TIMING_INFO, Some("0"), || {
            assert_eq!(Settings::from_env().show_timing_info, Some(false));
        });
    }

    #[test]
    fn test_invalid_file_temperature_is_an_error() {
        let settings = Settings {
            temperature: Some(3.0),
            ..Default::default()
        };
        assert!(matches!(
            settings.generation_config(GenerationMode::Brief),
            Err(ConfigError::Invalid { key: "temperature", .. })
        ));
    }

    #[test]
    fn test_unparseable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "temperature = \"warm\"\n").unwrap();
        assert!(matches!(
            Settings::from_file(&path),
            Err(ConfigError::ParseFile { .. })
        ));
    }

    #[test]
    fn test_status_code_overrides_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes.toml");
        std::fs::write(&path, "[status_codes]\n\"42\" = \"copied\"\n\"3\" = \"added\"\n").unwrap();

        let map = Settings::from_file(&path).unwrap().status_map().unwrap();
        assert_eq!(map.classify(42), StatusKind::Copied);
        assert_eq!(map.classify(3), StatusKind::Added);
    }

    #[test]
    fn test_merge_keeps_lower_layer_when_unset() {
        let base = Settings {
            model: Some("a".to_string()),
            timeout_secs: Some(30),
            ..Default::default()
        };
        let merged = base.merge(Settings {
            temperature: Some(0.2),
            ..Default::default()
        });
        assert_eq!(merged.model.as_deref(), Some("a"));
        assert_eq!(merged.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(merged.temperature, Some(0.2));
    }
}
