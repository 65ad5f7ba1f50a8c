//! Layered settings and the per-invocation generation snapshot.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (`COMMITWRIGHT_*`)
//! 3. `.commitwright.toml` in the repository root
//! 4. `<config dir>/commitwright/config.toml`
//! 5. Built-in defaults

pub mod generation;
pub mod settings;

pub use generation::{GenerationConfig, GenerationMode};
pub use settings::{Settings, SettingsLoader};

/// Default Gemini model: fast and cheap enough for an interactive flow.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub const DEFAULT_TEMPERATURE: f32 = 0.1;

pub const DEFAULT_MAX_DIFF_LENGTH: usize = 8000;

/// Output budget for a single-line subject.
pub const DEFAULT_BRIEF_MAX_OUTPUT_TOKENS: u32 = 300;

/// Output budget for subject, body and footer.
pub const DEFAULT_DETAILED_MAX_OUTPUT_TOKENS: u32 = 1000;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Repo-local settings file name.
pub const REPO_CONFIG_FILE: &str = ".commitwright.toml";

/// Directory under the platform config dir holding global settings and credentials.
pub const APP_DIR: &str = "commitwright";
