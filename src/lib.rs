//! commitwright - writes commit messages for staged changes using Gemini.
//!
//! # Overview
//!
//! commitwright collects the staged diff of every file, renders it into a
//! brief or detailed conventional-commit prompt, asks a hosted Gemini model
//! for a message, validates the answer, and writes it to a message file in
//! the git dir (or a `prepare-commit-msg` hook's file) for `git commit -F`.

pub mod commit;
pub mod config;
pub mod credentials;
pub mod error;
pub mod git;
pub mod llm;

// Re-export commonly used types
pub use commit::{CommitWriter, DiffBundle, DiffEntry, GeneratedMessage, GenerationOutcome};
pub use config::{GenerationConfig, GenerationMode, Settings, SettingsLoader};
pub use error::{CommitError, ConfigError, CredentialError, GenerationError, GitError};
pub use git::{Git2Repository, RepositorySurface, StagedEntry, StatusKind, StatusMap};
pub use llm::{GeminiClient, GenerationClient, GenerationRequest};
