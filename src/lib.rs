//! # Reposum
//!
//! Summarise a GitHub profile's repositories for a personal site or resume.
//!
//! ## Features
//!
//! - **GitHub integration**: paginated repository listing with fork/archive
//!   filtering, language breakdowns and README retrieval
//! - **Deterministic baseline**: an extractive summariser that needs no LLM
//! - **Generative option**: structured or plain summaries via a local Ollama
//!   server, with a safe fallback when the backend misbehaves

pub mod config;
pub mod github;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod summarizer;

pub use config::Settings;
pub use github::GithubClient;
pub use pipeline::{ReadmeMode, RepoItem, SummarizeOptions};
pub use summarizer::{RepoSummary, Summarizer, SummarizerKind};
