//! Git repository surface and status classification.

pub mod repository;
pub mod status;

pub use repository::{Git2Repository, RepoLocation, RepositorySurface, StagedEntry};
pub use status::{StatusKind, StatusMap, delta_to_code};
