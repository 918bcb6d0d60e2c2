//! Per-repository summarisation pipeline.
//!
//! Fetches what the requested detail level needs, normalises README text
//! and hands it to the active strategy. Fetching and assembly are split so
//! assembly stays testable without a network.

use crate::github::{GithubClient, GithubError, LanguageProfile, Repo};
use crate::normalize;
use crate::summarizer::{extractive_summary, RepoSummary, Summarizer, SummaryRequest};
use serde::Serialize;
use std::str::FromStr;

/// How many languages to keep per repository
pub const TOP_LANGUAGES: usize = 3;

/// How much README to fetch and include
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadmeMode {
    #[default]
    None,
    Excerpt,
    Full,
}

impl FromStr for ReadmeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "excerpt" => Ok(Self::Excerpt),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown readme mode: {}", other)),
        }
    }
}

/// Per-run options resolved from config and CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct SummarizeOptions {
    pub include_forks: bool,
    pub include_archived: bool,
    pub include_languages: bool,
    pub readme_mode: ReadmeMode,
    /// Request the structured record from a generative strategy
    pub structured: bool,
    /// Word cap for README excerpts
    pub excerpt_words: usize,
}

impl Default for SummarizeOptions {
    fn default() -> Self {
        Self {
            include_forks: false,
            include_archived: false,
            include_languages: false,
            readme_mode: ReadmeMode::None,
            structured: false,
            excerpt_words: normalize::DEFAULT_EXCERPT_WORDS,
        }
    }
}

/// Externally visible output for one repository. Built once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct RepoItem {
    pub name: String,
    pub url: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme_excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured: Option<RepoSummary>,
}

/// Top `k` languages by byte count. The sort is stable, so ties keep the
/// API's original ordering.
pub fn top_languages(profile: &LanguageProfile, k: usize) -> Vec<String> {
    let mut entries: Vec<&(String, u64)> = profile.0.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
        .into_iter()
        .take(k)
        .map(|(name, _)| name.clone())
        .collect()
}

/// Summarise every repository of `owner`, in the client's listing order.
///
/// Listing and metadata failures abort the run; per-repository
/// summarisation failures never do.
pub async fn summarize_user(
    client: &GithubClient,
    owner: &str,
    opts: &SummarizeOptions,
    summarizer: &Summarizer,
) -> Result<Vec<RepoItem>, GithubError> {
    let repos = client
        .list_repositories(owner, opts.include_forks, opts.include_archived)
        .await?;
    let mut items = Vec::with_capacity(repos.len());
    for repo in &repos {
        items.push(summarize_repo(client, owner, repo, opts, summarizer).await?);
    }
    Ok(items)
}

/// Fetch the auxiliary artifacts for one repository and assemble its item.
pub async fn summarize_repo(
    client: &GithubClient,
    owner: &str,
    repo: &Repo,
    opts: &SummarizeOptions,
    summarizer: &Summarizer,
) -> Result<RepoItem, GithubError> {
    let languages = if opts.include_languages {
        Some(client.get_languages(owner, &repo.name).await?)
    } else {
        None
    };
    let readme = if opts.readme_mode == ReadmeMode::None {
        None
    } else {
        client.get_readme(owner, &repo.name).await?
    };
    Ok(assemble_item(repo, languages, readme, opts, summarizer).await)
}

/// Assemble one [`RepoItem`] from pre-fetched data.
///
/// The base text for summarisation is the normalised README when it is
/// non-empty, otherwise the description. Generative failures collapse to
/// the extractive summary, or to the safe-default record in structured
/// mode.
pub async fn assemble_item(
    repo: &Repo,
    languages: Option<LanguageProfile>,
    readme: Option<String>,
    opts: &SummarizeOptions,
    summarizer: &Summarizer,
) -> RepoItem {
    let description = repo.description.clone().unwrap_or_default();
    let langs = languages
        .as_ref()
        .map(|profile| top_languages(profile, TOP_LANGUAGES));

    let normalized = readme.as_deref().map(|text| match opts.readme_mode {
        ReadmeMode::Full => normalize::clean_markdown(text),
        _ => normalize::excerpt(text, opts.excerpt_words),
    });
    let base_text = normalized
        .as_deref()
        .filter(|text| !text.is_empty())
        .unwrap_or(&description);

    let mut summary = None;
    let mut structured = None;
    if !base_text.trim().is_empty() {
        let hint = langs
            .as_ref()
            .map(|list| list.join(", "))
            .unwrap_or_default();
        let request = SummaryRequest {
            repo_name: &repo.name,
            base_text,
            description: &description,
            languages_hint: &hint,
        };
        if opts.structured {
            if let Summarizer::Ollama(ollama) = summarizer {
                let record = match ollama.summarize_structured(&request).await {
                    Ok(record) => record,
                    Err(err) => {
                        eprintln!("Warning: structured summary for {} failed: {}", repo.name, err);
                        RepoSummary::fallback(&repo.name, &description)
                    }
                };
                summary = Some(record.description.clone());
                structured = Some(record);
            } else {
                summary = Some(extractive_summary(&request));
            }
        } else {
            summary = Some(match summarizer.summarize(&request).await {
                Ok(text) => text,
                Err(err) => {
                    eprintln!("Warning: summary for {} failed: {}", repo.name, err);
                    extractive_summary(&request)
                }
            });
        }
    }

    let (readme_full, readme_excerpt) = match opts.readme_mode {
        ReadmeMode::Full => (normalized, None),
        ReadmeMode::Excerpt => (None, normalized),
        ReadmeMode::None => (None, None),
    };

    RepoItem {
        name: repo.name.clone(),
        url: repo.html_url.clone(),
        description,
        languages: langs,
        readme: readme_full,
        readme_excerpt,
        summary,
        structured,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str, description: Option<&str>) -> Repo {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "html_url": format!("https://github.com/user/{}", name),
            "description": description
        }))
        .unwrap()
    }

    #[test]
    fn top_languages_sorts_by_bytes_with_stable_ties() {
        let profile = LanguageProfile(vec![
            ("Shell".to_string(), 50),
            ("Rust".to_string(), 1000),
            ("C".to_string(), 1000),
            ("Make".to_string(), 10),
        ]);
        assert_eq!(
            top_languages(&profile, TOP_LANGUAGES),
            vec!["Rust", "C", "Shell"]
        );
    }

    #[test]
    fn top_languages_of_empty_profile_is_empty() {
        assert!(top_languages(&LanguageProfile::default(), TOP_LANGUAGES).is_empty());
    }

    #[test]
    fn readme_mode_parses_known_values_only() {
        assert_eq!("excerpt".parse::<ReadmeMode>().unwrap(), ReadmeMode::Excerpt);
        assert_eq!("Full".parse::<ReadmeMode>().unwrap(), ReadmeMode::Full);
        assert!("partial".parse::<ReadmeMode>().is_err());
    }

    #[tokio::test]
    async fn description_drives_summary_when_readme_is_absent() {
        let repo = repo("cli-tool", Some("A CLI tool"));
        let opts = SummarizeOptions {
            readme_mode: ReadmeMode::Excerpt,
            ..Default::default()
        };
        let item = assemble_item(&repo, None, None, &opts, &Summarizer::Extractive).await;

        assert!(item.readme_excerpt.is_none());
        assert!(item.readme.is_none());
        assert_eq!(item.summary.as_deref(), Some("A CLI tool"));
    }

    #[tokio::test]
    async fn readme_excerpt_feeds_the_summary() {
        let repo = repo("tool", Some("short description"));
        let readme = "![badge](x.png)\n\n# Title\nFirst paragraph text here.\n\nMore detail below.";
        let opts = SummarizeOptions {
            readme_mode: ReadmeMode::Excerpt,
            ..Default::default()
        };
        let item = assemble_item(
            &repo,
            None,
            Some(readme.to_string()),
            &opts,
            &Summarizer::Extractive,
        )
        .await;

        assert_eq!(
            item.readme_excerpt.as_deref(),
            Some("Title First paragraph text here.")
        );
        assert_eq!(
            item.summary.as_deref(),
            Some("Title First paragraph text here.")
        );
    }

    #[tokio::test]
    async fn full_mode_stores_cleaned_readme() {
        let repo = repo("tool", None);
        let readme = "# Tool\n\nDoes things.\n\n```sh\ncargo run\n```";
        let opts = SummarizeOptions {
            readme_mode: ReadmeMode::Full,
            ..Default::default()
        };
        let item = assemble_item(
            &repo,
            None,
            Some(readme.to_string()),
            &opts,
            &Summarizer::Extractive,
        )
        .await;

        let full = item.readme.as_deref().unwrap();
        assert!(full.contains("Does things."));
        assert!(!full.contains("```"));
        assert!(item.readme_excerpt.is_none());
    }

    #[tokio::test]
    async fn no_base_text_means_no_summary() {
        let repo = repo("silent", None);
        let opts = SummarizeOptions::default();
        let item = assemble_item(&repo, None, None, &opts, &Summarizer::Extractive).await;
        assert!(item.summary.is_none());
        assert!(item.structured.is_none());
    }

    #[tokio::test]
    async fn languages_are_reduced_to_top_three() {
        let repo = repo("poly", Some("many languages"));
        let profile = LanguageProfile(vec![
            ("Rust".to_string(), 900),
            ("Go".to_string(), 800),
            ("C".to_string(), 700),
            ("Lua".to_string(), 600),
        ]);
        let opts = SummarizeOptions {
            include_languages: true,
            ..Default::default()
        };
        let item = assemble_item(&repo, Some(profile), None, &opts, &Summarizer::Extractive).await;
        assert_eq!(
            item.languages,
            Some(vec!["Rust".to_string(), "Go".to_string(), "C".to_string()])
        );
    }

    #[tokio::test]
    async fn structured_mode_with_extractive_strategy_stays_plain() {
        let repo = repo("plain", Some("A tool"));
        let opts = SummarizeOptions {
            structured: true,
            ..Default::default()
        };
        let item = assemble_item(&repo, None, None, &opts, &Summarizer::Extractive).await;
        assert_eq!(item.summary.as_deref(), Some("A tool"));
        assert!(item.structured.is_none());
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let item = RepoItem {
            name: "tool".to_string(),
            url: "https://github.com/u/tool".to_string(),
            description: "A tool".to_string(),
            languages: None,
            readme: None,
            readme_excerpt: None,
            summary: Some("A tool".to_string()),
            structured: None,
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(!json.contains("readme_excerpt"));
        assert!(!json.contains("languages"));
        assert!(json.contains("\"summary\""));
    }
}
