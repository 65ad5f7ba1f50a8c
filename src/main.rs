//! commitwright - CLI entry point.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use dialoguer::{Confirm, Password};
use git2::Repository;
use tracing_subscriber::EnvFilter;

use commitwright::commit::{CommitWriter, GenerationOutcome, commit_staged};
use commitwright::config::{GenerationMode, Settings, SettingsLoader};
use commitwright::credentials::{CredentialStore, FileCredentialStore, resolve_api_key};
use commitwright::error::{CommitError, GenerationError};
use commitwright::git::Git2Repository;
use commitwright::llm::GeminiClient;

/// Write commit messages for staged changes using Gemini.
#[derive(Parser, Debug)]
#[command(name = "commitwright")]
#[command(about = "Write commit messages for staged changes using Gemini")]
#[command(version)]
struct Cli {
    /// Run as if started in this directory
    #[arg(short = 'C', long = "dir", global = true, default_value = ".")]
    dir: PathBuf,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a commit message for the staged changes
    Generate(GenerateArgs),

    /// Store the Gemini API key
    SetKey {
        /// API key; prompted for (hidden) when omitted
        key: Option<String>,
    },

    /// Remove the stored Gemini API key
    ClearKey {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Subject, body and footer instead of a single line
    #[arg(long)]
    detailed: bool,

    /// Gemini model id
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature in [0, 1]
    #[arg(long)]
    temperature: Option<f32>,

    /// Output token budget
    #[arg(long)]
    max_output_tokens: Option<u32>,

    /// Characters of rendered diff sent to the model before truncation
    #[arg(long)]
    max_diff_length: Option<usize>,

    /// Print how long the model took
    #[arg(long)]
    timing: bool,

    /// Give up waiting for the model after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Write the message here instead of .git/COMMITWRIGHT_MSG (e.g. the file passed to a prepare-commit-msg hook)
    #[arg(long)]
    message_file: Option<PathBuf>,

    /// Commit the staged changes with the generated message
    #[arg(long)]
    commit: bool,
}

impl GenerateArgs {
    fn mode(&self) -> GenerationMode {
        if self.detailed {
            GenerationMode::Detailed
        } else {
            GenerationMode::Brief
        }
    }

    fn overrides(&self) -> Settings {
        Settings {
            model: self.model.clone(),
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            max_diff_length: self.max_diff_length,
            show_timing_info: self.timing.then_some(true),
            timeout_secs: self.timeout,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Generate(args) => run_generate(&cli.dir, args).await,
        Command::SetKey { key } => set_key(key),
        Command::ClearKey { yes } => clear_key(yes),
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "commitwright=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_generate(dir: &Path, args: GenerateArgs) -> Result<()> {
    // Step 1: Locate the repository
    let mut repo = Git2Repository::discover(dir);
    if let Some(path) = &args.message_file {
        repo = repo.with_message_file(path);
    }
    let location = repo
        .location()
        .await
        .map_err(CommitError::from)?
        .clone();

    // Step 2: Settings snapshot for the boundary concerns (endpoint, timeout, timing)
    let mut loader = SettingsLoader::new().with_overrides(args.overrides());
    if let Some(root) = &location.workdir {
        loader = loader.with_repo_root(root);
    }
    let settings = loader.load().context("Failed to load settings")?;

    // Step 3: Credential
    let store = FileCredentialStore::default_location()?;
    let api_key = resolve_api_key(&store)?
        .ok_or(CommitError::NotConfigured(GenerationError::NotConfigured))?;

    let mut writer = CommitWriter::new(repo, GeminiClient::new(settings.base_url()), loader);
    writer.configure(&api_key)?;

    // Step 4: Generate
    eprintln!("Generating commit message...");
    let generation = writer.generate_commit_message(args.mode());
    let outcome = match settings.timeout() {
        Some(limit) => tokio::time::timeout(limit, generation)
            .await
            .map_err(|_| anyhow!("Timed out after {}s waiting for the model", limit.as_secs()))??,
        None => generation.await?,
    };

    let message = match outcome {
        GenerationOutcome::NoStagedChanges => {
            println!("No staged changes found.");
            return Ok(());
        }
        GenerationOutcome::Generated(message) => message,
    };

    println!("{}", message.text);
    if settings.show_timing_info() {
        eprintln!(
            "Generated from {} file(s) in {:.2}s",
            message.file_count,
            message.elapsed.as_secs_f64()
        );
    }

    // Step 5: Commit, or point at the written message
    if args.commit {
        let git = Repository::open(&location.git_dir).context("Failed to reopen repository")?;
        let oid = commit_staged(&git, &message.text)?;
        eprintln!("✓ Created commit {}", &oid.to_string()[..7]);
    } else {
        let path = writer.repository().message_path().await?;
        eprintln!("✓ Commit message written to {}", path.display());
        if args.message_file.is_none() {
            eprintln!("  Commit with: git commit -e -F {}", path.display());
        }
    }

    Ok(())
}

fn set_key(key: Option<String>) -> Result<()> {
    let key = match key {
        Some(key) => key,
        None => Password::new()
            .with_prompt("Enter your Gemini API key")
            .interact()
            .context("Failed to read API key")?,
    };

    if key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    let store = FileCredentialStore::default_location()?;
    store.store(&key)?;
    println!("✓ Gemini API key saved to {}", store.path().display());
    Ok(())
}

fn clear_key(yes: bool) -> Result<()> {
    let confirmed = yes
        || Confirm::new()
            .with_prompt("Are you sure you want to clear your Gemini API key?")
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;

    if !confirmed {
        println!("Kept the stored API key.");
        return Ok(());
    }

    let store = FileCredentialStore::default_location()?;
    store.delete()?;
    println!("✓ Gemini API key cleared.");
    Ok(())
}
