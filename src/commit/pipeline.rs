//! The single operation exposed to the invoking surface.

use crate::config::{GenerationMode, SettingsLoader};
use crate::error::CommitError;
use crate::git::RepositorySurface;
use crate::llm::GenerationClient;

use super::message::{GenerationOutcome, generate_commit_message};

/// Owns the repository surface, the model client and the settings loader.
///
/// Settings are reloaded on every call, so a changed setting takes effect
/// on the next generation. Callers must not run two generations at once;
/// `configure` takes `&mut self` and cannot overlap a `generate` anyway.
pub struct CommitWriter<R, C> {
    repo: R,
    client: C,
    settings: SettingsLoader,
}

impl<R, C> CommitWriter<R, C>
where
    R: RepositorySurface,
    C: GenerationClient,
{
    pub fn new(repo: R, client: C, settings: SettingsLoader) -> Self {
        Self {
            repo,
            client,
            settings,
        }
    }

    /// Set or rotate the API key without rebuilding the writer.
    pub fn configure(&mut self, api_key: &str) -> Result<(), CommitError> {
        self.client.configure(api_key).map_err(CommitError::from)
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Generate a message for the staged changes and hand it to the repository.
    ///
    /// Timing is left to the caller via [`GeneratedMessage::elapsed`](super::GeneratedMessage).
    /// With nothing staged this resolves to
    /// [`GenerationOutcome::NoStagedChanges`] and neither the model nor the
    /// repository's message sink is touched.
    pub async fn generate_commit_message(
        &self,
        mode: GenerationMode,
    ) -> Result<GenerationOutcome, CommitError> {
        let settings = self.settings.load()?;
        let config = settings.generation_config(mode)?;
        let statuses = settings.status_map()?;

        let outcome =
            generate_commit_message(&self.repo, &self.client, &statuses, &config, mode).await?;

        if let GenerationOutcome::Generated(message) = &outcome {
            self.repo.write_commit_message(&message.text).await?;
        }

        Ok(outcome)
    }
}
