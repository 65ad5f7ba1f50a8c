//! Raw status code classification.
//!
//! The repository surface reports each staged entry with a raw numeric code
//! whose meaning depends on the host. The default table follows libgit2's
//! `git_delta_t`; a settings file can override individual codes.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Deserialize;

use crate::error::ConfigError;

/// Status of a staged file, reduced to a small closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
    Untracked,
    Other,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKind::Modified => write!(f, "Modified"),
            StatusKind::Added => write!(f, "Added"),
            StatusKind::Deleted => write!(f, "Deleted"),
            StatusKind::Renamed => write!(f, "Renamed"),
            StatusKind::Copied => write!(f, "Copied"),
            StatusKind::Untracked => write!(f, "Untracked"),
            StatusKind::Other => write!(f, "Other"),
        }
    }
}

/// libgit2 `git_delta_t` values.
pub mod delta_code {
    pub const UNMODIFIED: u32 = 0;
    pub const ADDED: u32 = 1;
    pub const DELETED: u32 = 2;
    pub const MODIFIED: u32 = 3;
    pub const RENAMED: u32 = 4;
    pub const COPIED: u32 = 5;
    pub const IGNORED: u32 = 6;
    pub const UNTRACKED: u32 = 7;
    pub const TYPECHANGE: u32 = 8;
    pub const UNREADABLE: u32 = 9;
    pub const CONFLICTED: u32 = 10;
}

/// Lookup table from raw status code to [`StatusKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMap {
    codes: HashMap<u32, StatusKind>,
}

impl StatusMap {
    /// Table for codes reported by the git2-backed repository surface.
    pub fn libgit2() -> Self {
        let codes = HashMap::from([
            (delta_code::ADDED, StatusKind::Added),
            (delta_code::DELETED, StatusKind::Deleted),
            (delta_code::MODIFIED, StatusKind::Modified),
            (delta_code::RENAMED, StatusKind::Renamed),
            (delta_code::COPIED, StatusKind::Copied),
            (delta_code::UNTRACKED, StatusKind::Untracked),
            (delta_code::TYPECHANGE, StatusKind::Modified),
        ]);
        Self { codes }
    }

    /// Start from an empty table; every code classifies as `Other`.
    pub fn empty() -> Self {
        Self {
            codes: HashMap::new(),
        }
    }

    /// Set or replace the classification of one code.
    pub fn insert(&mut self, code: u32, kind: StatusKind) {
        self.codes.insert(code, kind);
    }

    /// Apply overrides from a settings table whose keys are decimal codes.
    pub fn with_overrides(
        mut self,
        overrides: &BTreeMap<String, StatusKind>,
    ) -> Result<Self, ConfigError> {
        for (key, kind) in overrides {
            let code = key.trim().parse::<u32>().map_err(|_| ConfigError::Invalid {
                key: "status_codes",
                reason: format!("'{key}' is not a numeric status code"),
            })?;
            self.insert(code, *kind);
        }
        Ok(self)
    }

    /// Classify a raw code. Unknown codes are `Other`, never an error.
    pub fn classify(&self, code: u32) -> StatusKind {
        self.codes.get(&code).copied().unwrap_or(StatusKind::Other)
    }
}

impl Default for StatusMap {
    fn default() -> Self {
        Self::libgit2()
    }
}

/// Raw code for a git2 delta, as libgit2 numbers it.
pub fn delta_to_code(delta: git2::Delta) -> u32 {
    match delta {
        git2::Delta::Unmodified => delta_code::UNMODIFIED,
        git2::Delta::Added => delta_code::ADDED,
        git2::Delta::Deleted => delta_code::DELETED,
        git2::Delta::Modified => delta_code::MODIFIED,
        git2::Delta::Renamed => delta_code::RENAMED,
        git2::Delta::Copied => delta_code::COPIED,
        git2::Delta::Ignored => delta_code::IGNORED,
        git2::Delta::Untracked => delta_code::UNTRACKED,
        git2::Delta::Typechange => delta_code::TYPECHANGE,
        git2::Delta::Unreadable => delta_code::UNREADABLE,
        git2::Delta::Conflicted => delta_code::CONFLICTED,
    }
}
