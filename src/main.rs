//! Reposum CLI - summarise a GitHub profile's repositories
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use clap::{Parser, ValueEnum};
use colored::Colorize;
use reposum::{output, pipeline, GithubClient, ReadmeMode, Settings, Summarizer, SummarizerKind};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reposum")]
#[command(author, version, about = "Summarise a GitHub profile's repositories", long_about = None)]
struct Cli {
    /// GitHub username (owner)
    username: String,
    /// Include languages and a README excerpt
    #[arg(long)]
    full: bool,
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
    /// Write to a file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
    /// Include forked repositories
    #[arg(long)]
    include_forks: bool,
    /// Include archived repositories
    #[arg(long)]
    include_archived: bool,
    /// How much README to include (defaults to excerpt with --full)
    #[arg(long, value_enum)]
    readme: Option<ReadmeArg>,
    /// Summary engine
    #[arg(long, value_enum)]
    summarizer: Option<SummarizerArg>,
    /// Model name for the generative backend (e.g. qwen2.5:7b-instruct)
    #[arg(long)]
    model: Option<String>,
    /// Request a validated structured summary (generative only)
    #[arg(long)]
    structured: bool,
    /// Path to reposum.toml
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Md,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReadmeArg {
    None,
    Excerpt,
    Full,
}

impl From<ReadmeArg> for ReadmeMode {
    fn from(arg: ReadmeArg) -> Self {
        match arg {
            ReadmeArg::None => ReadmeMode::None,
            ReadmeArg::Excerpt => ReadmeMode::Excerpt,
            ReadmeArg::Full => ReadmeMode::Full,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SummarizerArg {
    Extractive,
    Generative,
}

impl From<SummarizerArg> for SummarizerKind {
    fn from(arg: SummarizerArg) -> Self {
        match arg {
            SummarizerArg::Extractive => SummarizerKind::Extractive,
            SummarizerArg::Generative => SummarizerKind::Generative,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Effective settings: CLI flag > env var > config file > built-in default
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(kind) = cli.summarizer {
        settings.summarizer_kind = kind.into();
    }
    if let Some(model) = &cli.model {
        settings.model = model.clone();
    }
    if cli.include_forks {
        settings.include_forks = true;
    }
    if cli.include_archived {
        settings.include_archived = true;
    }

    let summarizer = Summarizer::from_settings(&settings)?;
    let client = GithubClient::new()?;

    let readme_mode = match cli.readme {
        Some(arg) => arg.into(),
        None if cli.full => ReadmeMode::Excerpt,
        None => ReadmeMode::None,
    };
    let opts = pipeline::SummarizeOptions {
        include_forks: settings.include_forks,
        include_archived: settings.include_archived,
        include_languages: cli.full,
        readme_mode,
        structured: cli.structured,
        ..Default::default()
    };

    eprintln!(
        "{} repositories for {}",
        "Fetching".green().bold(),
        cli.username
    );
    let items = pipeline::summarize_user(&client, &cli.username, &opts, &summarizer).await?;

    let payload = match cli.format {
        Format::Json => output::to_json(&items)?,
        Format::Md => output::to_markdown(&items),
    };
    match &cli.out {
        Some(path) => {
            output::write_payload(path, &payload)?;
            eprintln!(
                "{} {} ({} repos)",
                "Wrote".green().bold(),
                path.display(),
                items.len()
            );
        }
        None => println!("{}", payload),
    }

    Ok(())
}
