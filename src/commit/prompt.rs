//! Prompt construction for AI-generated commit messages.

use std::borrow::Cow;

use tracing::debug;

use crate::commit::diff::DiffBundle;
use crate::config::GenerationMode;

/// Appended after a diff that was cut to the configured length.
pub const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Opening delimiter around the embedded diff.
pub const DIFF_START: &str = "----- BEGIN STAGED DIFF -----";

/// Closing delimiter around the embedded diff.
pub const DIFF_END: &str = "----- END STAGED DIFF -----";

/// Conventional commit types the model may choose from.
pub const COMMIT_TYPES: [&str; 10] = [
    "feat", "fix", "docs", "style", "refactor", "perf", "test", "build", "ci", "chore",
];

/// Cut `text` to at most `max_chars` characters, appending [`TRUNCATION_MARKER`]
/// when anything was removed. Text already within the limit is returned as is.
pub fn truncate_diff(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        None => Cow::Borrowed(text),
        Some((cut, _)) => {
            let mut truncated = String::with_capacity(cut + TRUNCATION_MARKER.len());
            truncated.push_str(&text[..cut]);
            truncated.push_str(TRUNCATION_MARKER);
            Cow::Owned(truncated)
        }
    }
}

/// Build the model prompt for `bundle` in the given mode.
///
/// The bundle is rendered as a whole and then truncated, so files late in
/// the listing may be cut off entirely when the limit is small.
pub fn build_commit_prompt(bundle: &DiffBundle, mode: GenerationMode, max_diff_length: usize) -> String {
    let rendered = bundle.render();
    let diff = truncate_diff(&rendered, max_diff_length);
    if let Cow::Owned(_) = diff {
        debug!(
            "Diff truncated from {} to {} characters",
            rendered.chars().count(),
            max_diff_length
        );
    }

    match mode {
        GenerationMode::Brief => brief_prompt(&diff),
        GenerationMode::Detailed => detailed_prompt(&diff),
    }
}

fn brief_prompt(diff: &str) -> String {
    let types = COMMIT_TYPES.join(", ");
    format!(
        r#"Generate a conventional commit message for the following git diff.
Use the format: <type>(<scope>): <description>

Your response must contain ONLY the commit message text, with no preamble, explanation, or markdown formatting (no code block).

## Rules
- A single line only
- Type: one of {types}
- Scope: the module or area affected, optional
- Description: imperative mood, lowercase, specific to the changes
- No period at the end

## Git Diff
{DIFF_START}
{diff}
{DIFF_END}

Base the commit message solely on the changes between the diff markers above."#
    )
}

fn detailed_prompt(diff: &str) -> String {
    let types = COMMIT_TYPES.join(", ");
    format!(
        r#"Generate a detailed conventional commit message for the following git diff.

Your response must contain ONLY the commit message text, with no preamble, explanation, or markdown formatting (no code block).

## Structure
<type>(<scope>): <description>

<body>

<footer>

## Subject Line Rules
- Type: one of {types}
- Scope: the module or area affected, optional
- Description: imperative mood, lowercase, no period at the end

## Body Rules
- Separate the body from the subject with one blank line
- Explain what changed and why, not how
- Wrap lines at 72 characters

## Footer Rules
- Optional; omit it when there is nothing to say
- Reserved for `BREAKING CHANGE: <description>` and issue references such as `Closes #123`

## Git Diff
{DIFF_START}
{diff}
{DIFF_END}

Base the commit message solely on the changes between the diff markers above."#
    )
}
