//! Repository surface: staged entries, per-file diffs, and the commit message sink.
//!
//! The pipeline only ever sees [`StagedEntry`] values and diff strings, never
//! a git2 object, so tests can substitute an in-memory surface.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use git2::{Delta, DiffFindOptions, DiffFormat, DiffOptions, ErrorCode, Repository, Tree};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::GitError;

use super::status::delta_to_code;

/// File the generated message is written to, inside the git dir.
///
/// Not `COMMIT_EDITMSG`: git rewrites that file at the start of every commit.
pub const MESSAGE_FILE: &str = "COMMITWRIGHT_MSG";

/// One staged file as reported by the host, with its raw status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedEntry {
    pub path: String,
    pub status_code: u32,
    /// Source path for renames and copies.
    pub old_path: Option<String>,
}

impl StagedEntry {
    pub fn new(path: impl Into<String>, status_code: u32) -> Self {
        Self {
            path: path.into(),
            status_code,
            old_path: None,
        }
    }

    pub fn with_old_path(mut self, old_path: impl Into<String>) -> Self {
        self.old_path = Some(old_path.into());
        self
    }
}

/// The narrow slice of a source-control host the pipeline depends on.
#[async_trait]
pub trait RepositorySurface: Send + Sync {
    /// Staged entries in the host's listing order.
    async fn list_staged_entries(&self) -> Result<Vec<StagedEntry>, GitError>;

    /// Unified diff of the staged content of `entry` against HEAD.
    ///
    /// For a rename or copy the diff is taken against `entry.old_path`.
    async fn diff_against_head(&self, entry: &StagedEntry) -> Result<String, GitError>;

    /// Place `message` where the next commit will pick it up.
    async fn write_commit_message(&self, message: &str) -> Result<(), GitError>;
}

/// Where a discovered repository lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocation {
    pub git_dir: PathBuf,
    /// None for bare repositories.
    pub workdir: Option<PathBuf>,
}

/// git2-backed repository surface.
///
/// The repository is discovered on first use, not at construction, and the
/// location is cached for the lifetime of the value. Every blocking git2
/// call runs on tokio's blocking pool with its own `Repository` handle, so
/// per-file diffs can be fetched concurrently.
#[derive(Debug)]
pub struct Git2Repository {
    start_dir: PathBuf,
    message_file: Option<PathBuf>,
    location: OnceCell<RepoLocation>,
}

impl Git2Repository {
    /// Surface for the repository containing `start_dir`.
    pub fn discover(start_dir: impl Into<PathBuf>) -> Self {
        Self {
            start_dir: start_dir.into(),
            message_file: None,
            location: OnceCell::new(),
        }
    }

    /// Write generated messages to `path` instead of `<git dir>/COMMITWRIGHT_MSG`,
    /// e.g. the file a `prepare-commit-msg` hook receives.
    pub fn with_message_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.message_file = Some(path.into());
        self
    }

    /// Discover (once) and return the repository location.
    pub async fn location(&self) -> Result<&RepoLocation, GitError> {
        self.location
            .get_or_try_init(|| {
                let start_dir = self.start_dir.clone();
                run_blocking("discover", move || {
                    let repo = Repository::discover(&start_dir)
                        .map_err(|e| open_error(&start_dir, e))?;
                    let location = RepoLocation {
                        git_dir: repo.path().to_path_buf(),
                        workdir: repo.workdir().map(Path::to_path_buf),
                    };
                    debug!("Using repository at {}", location.git_dir.display());
                    Ok(location)
                })
            })
            .await
    }

    /// Path the commit message is written to.
    pub async fn message_path(&self) -> Result<PathBuf, GitError> {
        match &self.message_file {
            Some(path) => Ok(path.clone()),
            None => Ok(self.location().await?.git_dir.join(MESSAGE_FILE)),
        }
    }

    async fn git_dir(&self) -> Result<PathBuf, GitError> {
        Ok(self.location().await?.git_dir.clone())
    }
}

#[async_trait]
impl RepositorySurface for Git2Repository {
    async fn list_staged_entries(&self) -> Result<Vec<StagedEntry>, GitError> {
        let git_dir = self.git_dir().await?;
        run_blocking("list staged", move || {
            let repo = open(&git_dir)?;
            list_staged(&repo)
        })
        .await
    }

    async fn diff_against_head(&self, entry: &StagedEntry) -> Result<String, GitError> {
        let git_dir = self.git_dir().await?;
        let entry = entry.clone();
        let label = entry.path.clone();
        run_blocking(&label, move || {
            let repo = open(&git_dir)?;
            staged_patch(&repo, &entry.path, entry.old_path.as_deref())
        })
        .await
    }

    async fn write_commit_message(&self, message: &str) -> Result<(), GitError> {
        let path = self.message_path().await?;
        let mut content = message.to_string();
        if !content.ends_with('\n') {
            content.push('\n');
        }
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| GitError::WriteMessage { path, source })
    }
}

async fn run_blocking<T, F>(label: &str, f: F) -> Result<T, GitError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, GitError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|_| GitError::TaskFailed(label.to_string()))?
}

fn open(git_dir: &Path) -> Result<Repository, GitError> {
    Repository::open(git_dir).map_err(|e| open_error(git_dir, e))
}

/// Only a missing repository is `NoRepository`; anything else is a real failure.
fn open_error(path: &Path, err: git2::Error) -> GitError {
    if err.code() == ErrorCode::NotFound {
        GitError::NoRepository(path.to_path_buf())
    } else {
        GitError::Open {
            path: path.to_path_buf(),
            source: err,
        }
    }
}

fn find_renames_and_copies() -> DiffFindOptions {
    let mut find = DiffFindOptions::new();
    find.renames(true).copies(true);
    find
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits (unborn branch / not found),
/// so the index is diffed against the empty tree.
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, GitError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(GitError::ListStaged(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(GitError::ListStaged)?;
    Ok(Some(tree))
}

/// Staged deltas (HEAD tree vs index) with rename and copy detection.
pub(crate) fn list_staged(repo: &Repository) -> Result<Vec<StagedEntry>, GitError> {
    let head_tree = resolve_head_tree(repo)?;
    let index = repo.index().map_err(GitError::Index)?;

    let mut diff = repo
        .diff_tree_to_index(head_tree.as_ref(), Some(&index), None)
        .map_err(GitError::ListStaged)?;

    diff.find_similar(Some(&mut find_renames_and_copies()))
        .map_err(GitError::ListStaged)?;

    let entries = diff
        .deltas()
        .filter_map(|delta| {
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())?
                .to_string_lossy()
                .to_string();
            let entry = StagedEntry::new(path, delta_to_code(delta.status()));
            match delta.status() {
                Delta::Renamed | Delta::Copied => {
                    let old = delta.old_file().path()?.to_string_lossy().to_string();
                    Some(entry.with_old_path(old))
                }
                _ => Some(entry),
            }
        })
        .collect::<Vec<_>>();

    debug!("Found {} staged entries", entries.len());
    Ok(entries)
}

/// Unified patch text for one staged path.
///
/// With `old_path` set, both paths are diffed and paired up by similarity,
/// so a rename or copy shows only what changed relative to its source.
pub(crate) fn staged_patch(
    repo: &Repository,
    path: &str,
    old_path: Option<&str>,
) -> Result<String, GitError> {
    let diff_error = |source: git2::Error| GitError::Diff {
        path: path.to_string(),
        source,
    };
    let head_tree = resolve_head_tree(repo)?;
    let index = repo.index().map_err(GitError::Index)?;

    let mut opts = DiffOptions::new();
    opts.pathspec(path).disable_pathspec_match(true);
    if let Some(old) = old_path {
        opts.pathspec(old);
    }
    let mut diff = repo
        .diff_tree_to_index(head_tree.as_ref(), Some(&index), Some(&mut opts))
        .map_err(diff_error)?;
    if old_path.is_some() {
        diff.find_similar(Some(&mut find_renames_and_copies()))
            .map_err(diff_error)?;
    }

    let target = Path::new(path);
    let mut text = String::new();
    diff.print(DiffFormat::Patch, |delta, _hunk, line| {
        // A copy source that was itself modified shows up as its own delta.
        if delta.new_file().path() != Some(target) {
            return true;
        }
        let origin = line.origin();
        if origin == '+' || origin == '-' || origin == ' ' {
            text.push(origin);
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(diff_error)?;

    Ok(text)
}
