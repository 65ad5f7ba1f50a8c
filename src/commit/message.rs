//! Commit message generation via the model, response validation, and commit creation.

use std::time::{Duration, Instant};

use git2::{Oid, Repository};
use tracing::{debug, info};

use crate::commit::diff::collect_staged;
use crate::commit::prompt::build_commit_prompt;
use crate::config::{GenerationConfig, GenerationMode};
use crate::error::{CommitError, GenerationError};
use crate::git::{RepositorySurface, StatusMap};
use crate::llm::{GenerationClient, GenerationRequest};

/// A validated message plus how long the model took to produce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMessage {
    pub text: String,
    pub elapsed: Duration,
    pub file_count: usize,
}

/// Result of one invocation of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Generated(GeneratedMessage),
    /// Nothing staged; no model call was made.
    NoStagedChanges,
}

impl GenerationOutcome {
    pub fn message(&self) -> Option<&str> {
        match self {
            GenerationOutcome::Generated(m) => Some(&m.text),
            GenerationOutcome::NoStagedChanges => None,
        }
    }
}

/// Reject missing or blank model output; otherwise return it trimmed.
///
/// The text is not reformatted and is not checked against the template.
pub fn validate_response(raw: Option<&str>) -> Result<String, CommitError> {
    match raw.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(CommitError::EmptyResponse),
    }
}

/// Collect staged diffs, build the prompt, call the model once, validate.
///
/// An unconfigured client fails before the repository is read. An empty staged set short-circuits to [`GenerationOutcome::NoStagedChanges`]
/// before the model is touched.
pub async fn generate_commit_message(
    repo: &dyn RepositorySurface,
    client: &dyn GenerationClient,
    statuses: &StatusMap,
    config: &GenerationConfig,
    mode: GenerationMode,
) -> Result<GenerationOutcome, CommitError> {
    if !client.is_configured() {
        return Err(GenerationError::NotConfigured.into());
    }

    let bundle = collect_staged(repo, statuses).await?;
    if bundle.is_empty() {
        info!("No staged changes found");
        return Ok(GenerationOutcome::NoStagedChanges);
    }

    let prompt = build_commit_prompt(&bundle, mode, config.max_diff_length);
    debug!(
        "Commit prompt ({} mode): {} chars for {} files",
        mode,
        prompt.len(),
        bundle.len()
    );

    let request = GenerationRequest {
        prompt,
        config: config.clone(),
    };

    let started = Instant::now();
    let raw = client.generate(&request).await?;
    let elapsed = started.elapsed();

    let text = validate_response(raw.as_deref())?;
    Ok(GenerationOutcome::Generated(GeneratedMessage {
        text,
        elapsed,
        file_count: bundle.len(),
    }))
}

/// Create a commit from the current index with the given message.
///
/// Only what is already staged is committed. Works on an unborn branch,
/// where the new commit has no parent.
pub fn commit_staged(repo: &Repository, message: &str) -> Result<Oid, CommitError> {
    let mut index = repo.index().map_err(CommitError::CommitFailed)?;
    let tree_id = index.write_tree().map_err(CommitError::CommitFailed)?;
    let tree = repo.find_tree(tree_id).map_err(CommitError::CommitFailed)?;

    let sig = repo.signature().map_err(CommitError::SignatureMissing)?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit().map_err(CommitError::CommitFailed)?),
        Err(e)
            if e.code() == git2::ErrorCode::UnbornBranch
                || e.code() == git2::ErrorCode::NotFound =>
        {
            None
        }
        Err(e) => return Err(CommitError::CommitFailed(e)),
    };
    let parents = parent.iter().collect::<Vec<_>>();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .map_err(CommitError::CommitFailed)
}
