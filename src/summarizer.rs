//! Summarisation strategies.
//!
//! Two variants behind one dispatch type: a deterministic extractive
//! summariser that never leaves the process, and a generative summariser
//! backed by a local Ollama server. Generative failures are reported as
//! `BackendError` values; the pipeline collapses them to a safe default so
//! one repository can never abort the whole run.

use crate::config::Settings;
use crate::normalize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Word cap applied by the extractive summariser
pub const EXTRACTIVE_WORD_CAP: usize = 90;

/// Hard cap on prompt text, to bound backend latency
const MAX_PROMPT_CHARS: usize = 12_000;

/// Marker appended when prompt text is cut at the cap
const TRUNCATION_SENTINEL: &str = "\n[...truncated...]";

/// Timeout for generation calls; text generation is latency-dominant
const GENERATE_TIMEOUT: Duration = Duration::from_secs(90);

/// Allowed values for [`RepoSummary::complexity`]
const COMPLEXITY_LEVELS: [&str; 3] = ["simple", "medium", "complex"];

/// Maximum number of entries in [`RepoSummary::technologies`]
const MAX_TECHNOLOGIES: usize = 5;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("generation request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("generation backend returned {0}")]
    Status(reqwest::StatusCode),
    #[error("no JSON object found in model response")]
    MissingJson,
    #[error("failed to parse structured summary: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid structured summary: {0}")]
    InvalidSummary(String),
}

/// Error for a summariser kind outside the known set, raised at
/// configuration time before any network call.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown summarizer kind: {0} (expected \"extractive\" or \"generative\")")]
pub struct UnknownKind(pub String);

/// Which summarisation strategy to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummarizerKind {
    #[default]
    Extractive,
    Generative,
}

impl FromStr for SummarizerKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "extractive" => Ok(Self::Extractive),
            "generative" => Ok(Self::Generative),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for SummarizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extractive => write!(f, "extractive"),
            Self::Generative => write!(f, "generative"),
        }
    }
}

/// Input handed to a strategy for one repository.
///
/// This is the stable contract between the pipeline and the strategies.
#[derive(Debug, Clone, Copy)]
pub struct SummaryRequest<'a> {
    pub repo_name: &'a str,
    /// Normalised README text, or the description when no README exists
    pub base_text: &'a str,
    pub description: &'a str,
    /// Comma-separated top languages, may be empty
    pub languages_hint: &'a str,
}

/// Validated structured summary of one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub description: String,
    pub purpose: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub complexity: String,
    pub target_audience: String,
}

impl RepoSummary {
    /// Normalise and validate a decoded summary.
    ///
    /// Technologies are lower-cased and deduplicated, complexity is matched
    /// case-insensitively against the allowed levels.
    pub fn validate(mut self) -> Result<Self, BackendError> {
        if self.technologies.len() > MAX_TECHNOLOGIES {
            return Err(BackendError::InvalidSummary(format!(
                "too many technologies: {} (max {})",
                self.technologies.len(),
                MAX_TECHNOLOGIES
            )));
        }
        let mut seen = Vec::with_capacity(self.technologies.len());
        for tech in self.technologies.drain(..) {
            let tech = tech.to_lowercase();
            if !seen.contains(&tech) {
                seen.push(tech);
            }
        }
        self.technologies = seen;

        self.complexity = self.complexity.to_lowercase();
        if !COMPLEXITY_LEVELS.contains(&self.complexity.as_str()) {
            return Err(BackendError::InvalidSummary(format!(
                "complexity must be one of simple/medium/complex, got {:?}",
                self.complexity
            )));
        }
        Ok(self)
    }

    /// The fixed safe default returned when structured generation fails.
    pub fn fallback(repo_name: &str, description: &str) -> Self {
        let description = if description.trim().is_empty() {
            format!("Repository {}", repo_name)
        } else {
            description.trim().to_string()
        };
        Self {
            description,
            purpose: "Not determined".to_string(),
            technologies: Vec::new(),
            complexity: "medium".to_string(),
            target_audience: "developers".to_string(),
        }
    }
}

/// Deterministic, non-generative summary: first useful paragraph of the
/// cleaned base text (else description, else the repository name), capped
/// at [`EXTRACTIVE_WORD_CAP`] words. Never empty.
pub fn extractive_summary(req: &SummaryRequest<'_>) -> String {
    let text = if !req.base_text.trim().is_empty() {
        req.base_text
    } else if !req.description.trim().is_empty() {
        req.description
    } else {
        req.repo_name
    };
    let cleaned = normalize::clean_markdown(text);
    let summary = normalize::excerpt(&cleaned, EXTRACTIVE_WORD_CAP);
    if summary.is_empty() {
        // All content was markup noise; the name is the last resort.
        req.repo_name.to_string()
    } else {
        summary
    }
}

/// Summariser backed by a local Ollama server's `/api/generate` endpoint.
///
/// Holds one HTTP client, constructed once and reused for every repository.
pub struct OllamaSummarizer {
    client: reqwest::Client,
    model: String,
    base_url: String,
    num_ctx: u32,
    prompt_template: Option<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaSummarizer {
    pub fn new(
        model: &str,
        base_url: &str,
        num_ctx: u32,
        prompt_template: Option<String>,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(GENERATE_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            num_ctx,
            prompt_template,
        })
    }

    /// Generate a plain-text summary.
    pub async fn summarize(&self, req: &SummaryRequest<'_>) -> Result<String, BackendError> {
        let prompt = self.render_prompt(req);
        self.generate(&prompt, false).await
    }

    /// Generate a structured summary matching the [`RepoSummary`] schema.
    pub async fn summarize_structured(
        &self,
        req: &SummaryRequest<'_>,
    ) -> Result<RepoSummary, BackendError> {
        let prompt = format!("{}\n\n{}", self.render_prompt(req), SCHEMA_INSTRUCTIONS);
        let response = self.generate(&prompt, true).await?;
        parse_structured_response(&response)
    }

    async fn generate(&self, prompt: &str, json_format: bool) -> Result<String, BackendError> {
        // Deterministic decoding: zero temperature, bounded context.
        let mut payload = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "num_ctx": self.num_ctx,
                "temperature": 0.0,
                "top_p": 0.9,
                "repeat_penalty": 1.1
            }
        });
        if json_format {
            payload["format"] = serde_json::json!("json");
        }

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status));
        }
        let body: GenerateResponse = response.json().await?;
        Ok(body.response.trim().to_string())
    }

    fn render_prompt(&self, req: &SummaryRequest<'_>) -> String {
        let cleaned = cap_prompt_text(&normalize::clean_markdown(req.base_text));
        match &self.prompt_template {
            Some(template) => template
                .replace("{repo_name}", req.repo_name)
                .replace("{description}", req.description)
                .replace("{languages_hint}", req.languages_hint)
                .replace("{text}", &cleaned),
            None => built_in_prompt(req, &cleaned),
        }
    }
}

const SCHEMA_INSTRUCTIONS: &str = r#"You MUST respond with valid JSON matching this exact schema:
{
  "description": "string - one to two sentence summary of the repository",
  "purpose": "string - the problem this repository solves",
  "technologies": ["array of up to 5 technology names, lowercase"],
  "complexity": "one of: simple, medium, complex",
  "target_audience": "string - who this project is for"
}

Do not include any markdown formatting, code blocks, or explanations. Only output the raw JSON object."#;

fn built_in_prompt(req: &SummaryRequest<'_>, cleaned: &str) -> String {
    format!(
        "You are a concise technical writer. Summarize this repository for a personal site / resume.\n\
         \n\
         Constraints:\n\
         - 3-5 lines (60-120 words total).\n\
         - Explain WHAT it does, HOW at a high level, and key TECH.\n\
         - Neutral technical tone. No hype/emojis/markdown.\n\
         \n\
         Repository name: {}\n\
         Existing one-line description (may be empty): {}\n\
         Languages (may be empty): {}\n\
         \n\
         Text:\n\
         {}",
        req.repo_name, req.description, req.languages_hint, cleaned
    )
}

/// Cap overly long prompt text, marking the cut with a sentinel.
fn cap_prompt_text(text: &str) -> String {
    match text.char_indices().nth(MAX_PROMPT_CHARS) {
        None => text.to_string(),
        Some((idx, _)) => format!("{}{}", &text[..idx], TRUNCATION_SENTINEL),
    }
}

/// Decode the first JSON object found in a model response.
///
/// Scans candidate `{...}` spans with a string-aware brace counter rather
/// than a bare index search, so prose containing braces before the real
/// object does not derail extraction.
pub fn parse_structured_response(text: &str) -> Result<RepoSummary, BackendError> {
    let mut last_parse_err = None;
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        let Some(candidate) = balanced_object(&text[start..]) else {
            break;
        };
        match serde_json::from_str::<RepoSummary>(candidate) {
            Ok(summary) => return summary.validate(),
            Err(err) => last_parse_err = Some(err),
        }
        search_from = start + 1;
    }
    match last_parse_err {
        Some(err) => Err(BackendError::Parse(err)),
        None => Err(BackendError::MissingJson),
    }
}

/// Return the balanced `{...}` span starting at the first byte of `text`,
/// if one closes. Tracks JSON string boundaries and escapes.
fn balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, byte) in text.bytes().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strategy dispatch, created once from settings and shared by the whole run.
pub enum Summarizer {
    Extractive,
    Ollama(OllamaSummarizer),
}

impl Summarizer {
    /// Factory keyed by the configured kind.
    pub fn from_settings(settings: &Settings) -> Result<Self, BackendError> {
        match settings.summarizer_kind {
            SummarizerKind::Extractive => Ok(Self::Extractive),
            SummarizerKind::Generative => Ok(Self::Ollama(OllamaSummarizer::new(
                &settings.model,
                &settings.base_url,
                settings.num_ctx,
                settings.prompt_template.clone(),
            )?)),
        }
    }

    pub async fn summarize(&self, req: &SummaryRequest<'_>) -> Result<String, BackendError> {
        match self {
            Self::Extractive => Ok(extractive_summary(req)),
            Self::Ollama(ollama) => ollama.summarize(req).await,
        }
    }
}
