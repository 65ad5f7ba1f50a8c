//! Staged change collection: one diff per staged file, in listing order.

use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::GitError;
use crate::git::{RepositorySurface, StatusKind, StatusMap};

/// One staged file with its classified status and diff against HEAD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub path: String,
    pub status: StatusKind,
    pub diff_text: String,
}

impl DiffEntry {
    pub fn new(path: impl Into<String>, status: StatusKind, diff_text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status,
            diff_text: diff_text.into(),
        }
    }

    /// `"\nFile: {path}\nStatus: {status}\n{diff}\n"`
    pub fn render(&self) -> String {
        format!(
            "\nFile: {}\nStatus: {}\n{}\n",
            self.path, self.status, self.diff_text
        )
    }
}

/// All staged diffs, in the order the repository listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffBundle {
    entries: Vec<DiffEntry>,
}

impl DiffBundle {
    pub fn new(entries: Vec<DiffEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Concatenate every entry's rendering, with no separator.
    pub fn render(&self) -> String {
        self.entries.iter().map(DiffEntry::render).collect()
    }
}

/// Collect the diff of every staged entry.
///
/// The staged list is read once; the per-file diffs are then fetched
/// concurrently and all of them are awaited. The bundle keeps the listing
/// order no matter which fetch finishes first. A fetch that fails keeps its
/// entry with an empty diff so the file still appears in the prompt.
///
/// An empty staged list yields an empty bundle, not an error.
pub async fn collect_staged(
    repo: &dyn RepositorySurface,
    statuses: &StatusMap,
) -> Result<DiffBundle, GitError> {
    let staged = repo.list_staged_entries().await?;
    if staged.is_empty() {
        debug!("No staged entries");
        return Ok(DiffBundle::default());
    }

    let diffs = join_all(staged.iter().map(|entry| repo.diff_against_head(entry))).await;

    let entries = staged
        .into_iter()
        .zip(diffs)
        .map(|(entry, diff)| {
            let diff_text = diff.unwrap_or_else(|e| {
                warn!("Could not read staged diff for {}: {e}", entry.path);
                String::new()
            });
            DiffEntry {
                status: statuses.classify(entry.status_code),
                path: entry.path,
                diff_text,
            }
        })
        .collect::<Vec<_>>();

    debug!("Collected diffs for {} staged files", entries.len());
    Ok(DiffBundle::new(entries))
}
