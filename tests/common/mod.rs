//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use git2::{Oid, Repository, Signature};

use commitwright::error::{GenerationError, GitError};
use commitwright::git::{RepositorySurface, StagedEntry};
use commitwright::llm::{GenerationClient, GenerationRequest};

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file in the working tree without staging it.
    pub fn write(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(path, content).expect("Failed to write test file");
    }

    /// Write a file and add it to the index.
    pub fn stage(&self, name: &str, content: &str) {
        self.write(name, content);
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(name)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Commit whatever is in the index. Returns the commit OID.
    pub fn commit(&self, message: &str) -> Oid {
        let sig = Signature::now("Test User", "test@example.com").expect("Failed to create signature");
        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }
}

/// In-memory repository surface with per-file latency and failure injection.
#[derive(Default)]
pub struct FakeRepository {
    pub entries: Vec<StagedEntry>,
    pub diffs: HashMap<String, Result<String, String>>,
    pub delays: HashMap<String, Duration>,
    pub no_repository: bool,
    /// Paths in the order their diff fetch finished.
    pub completed: Mutex<Vec<String>>,
    pub written: Mutex<Option<String>>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_repository() -> Self {
        Self {
            no_repository: true,
            ..Default::default()
        }
    }

    pub fn with_entry(mut self, path: &str, status_code: u32, diff: &str) -> Self {
        self.entries.push(StagedEntry::new(path, status_code));
        self.diffs.insert(path.to_string(), Ok(diff.to_string()));
        self
    }

    pub fn with_failing_entry(mut self, path: &str, status_code: u32) -> Self {
        self.entries.push(StagedEntry::new(path, status_code));
        self.diffs
            .insert(path.to_string(), Err(format!("cannot read {path}")));
        self
    }

    pub fn with_delay(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(path.to_string(), delay);
        self
    }

    pub fn completion_order(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    pub fn written_message(&self) -> Option<String> {
        self.written.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepositorySurface for FakeRepository {
    async fn list_staged_entries(&self) -> Result<Vec<StagedEntry>, GitError> {
        if self.no_repository {
            return Err(GitError::NoRepository("/nowhere".into()));
        }
        Ok(self.entries.clone())
    }

    async fn diff_against_head(&self, entry: &StagedEntry) -> Result<String, GitError> {
        let path = entry.path.as_str();
        if let Some(delay) = self.delays.get(path) {
            tokio::time::sleep(*delay).await;
        }
        self.completed.lock().unwrap().push(path.to_string());
        match self.diffs.get(path) {
            Some(Ok(diff)) => Ok(diff.clone()),
            Some(Err(_)) | None => Err(GitError::TaskFailed(path.to_string())),
        }
    }

    async fn write_commit_message(&self, message: &str) -> Result<(), GitError> {
        *self.written.lock().unwrap() = Some(message.to_string());
        Ok(())
    }
}

/// Model client returning a canned answer and recording every request.
pub struct FakeClient {
    pub response: Result<Option<String>, GenerationError>,
    pub requests: Mutex<Vec<GenerationRequest>>,
    pub api_key: Option<String>,
}

impl FakeClient {
    pub fn answering(text: &str) -> Self {
        Self::with_response(Ok(Some(text.to_string())))
    }

    pub fn with_response(response: Result<Option<String>, GenerationError>) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
            api_key: Some("test-key".to_string()),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            api_key: None,
            ..Self::answering("unused")
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .map(|r| r.prompt.clone())
    }
}

#[async_trait]
impl GenerationClient for FakeClient {
    fn configure(&mut self, api_key: &str) -> Result<(), GenerationError> {
        self.api_key = Some(api_key.to_string());
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Option<String>, GenerationError> {
        if self.api_key.is_none() {
            return Err(GenerationError::NotConfigured);
        }
        self.requests.lock().unwrap().push(request.clone());
        self.response.clone()
    }
}

/// Text between the diff delimiters of a prompt.
pub fn embedded_diff(prompt: &str) -> &str {
    let start = prompt
        .find(commitwright::commit::DIFF_START)
        .expect("prompt has a start delimiter")
        + commitwright::commit::DIFF_START.len()
        + 1;
    let end = prompt
        .rfind(commitwright::commit::DIFF_END)
        .expect("prompt has an end delimiter")
        - 1;
    &prompt[start..end]
}
