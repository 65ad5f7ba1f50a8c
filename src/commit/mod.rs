//! AI-generated commit messages for staged changes.

pub mod diff;
pub mod message;
pub mod pipeline;
pub mod prompt;

pub use diff::{DiffBundle, DiffEntry, collect_staged};
pub use message::{
    GeneratedMessage, GenerationOutcome, commit_staged, generate_commit_message, validate_response,
};
pub use pipeline::CommitWriter;
pub use prompt::{DIFF_END, DIFF_START, TRUNCATION_MARKER, build_commit_prompt, truncate_diff};
