//! Configuration loading and management for reposum.
//!
//! Settings come from `reposum.toml` with environment variable overrides;
//! CLI flags are merged on top by the binary. The GitHub token never lives
//! in the file, only in `GITHUB_TOKEN`.

use crate::summarizer::{SummarizerKind, UnknownKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    UnknownKind(#[from] UnknownKind),
    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    summarizer: SummarizerSection,
    #[serde(default)]
    prompt: PromptSection,
    #[serde(default)]
    github: GithubSection,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct SummarizerSection {
    kind: Option<String>,
    model: Option<String>,
    num_ctx: Option<u32>,
    base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct PromptSection {
    /// Path to a custom prompt template, read eagerly at load time
    template_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct GithubSection {
    include_forks: Option<bool>,
    include_archived: Option<bool>,
}

/// Resolved settings: built-in defaults, overlaid by the config file,
/// overlaid by environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    pub summarizer_kind: SummarizerKind,
    pub model: String,
    pub num_ctx: u32,
    pub base_url: String,
    pub prompt_template: Option<String>,
    pub include_forks: bool,
    pub include_archived: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            summarizer_kind: SummarizerKind::Extractive,
            model: "llama3.2:3b".to_string(),
            num_ctx: 8192,
            base_url: "http://localhost:11434".to_string(),
            prompt_template: None,
            include_forks: false,
            include_archived: false,
        }
    }
}

impl Settings {
    /// Load settings, from `path` when given, else from `reposum.toml` in
    /// the working directory or `~/.config/reposum/`. A missing default
    /// file is not an error; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let content = match path {
            Some(explicit) => Some(std::fs::read_to_string(explicit)?),
            None => match Self::find_config_file() {
                Some(found) => Some(std::fs::read_to_string(found)?),
                None => None,
            },
        };
        let file: ConfigFile = match content {
            Some(content) => toml::from_str(&content)?,
            None => ConfigFile::default(),
        };

        let mut settings = Settings::default();

        if let Some(kind) = file.summarizer.kind {
            settings.summarizer_kind = kind.parse()?;
        }
        if let Some(model) = file.summarizer.model {
            settings.model = model;
        }
        if let Some(num_ctx) = file.summarizer.num_ctx {
            settings.num_ctx = num_ctx;
        }
        if let Some(base_url) = file.summarizer.base_url {
            settings.base_url = base_url;
        }
        if let Some(template_file) = file.prompt.template_file {
            settings.prompt_template = Some(std::fs::read_to_string(template_file)?);
        }
        if let Some(include_forks) = file.github.include_forks {
            settings.include_forks = include_forks;
        }
        if let Some(include_archived) = file.github.include_archived {
            settings.include_archived = include_archived;
        }

        settings.apply_env()?;
        Ok(settings)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(kind) = std::env::var("SUMMARIZER") {
            self.summarizer_kind = kind.parse()?;
        }
        if let Ok(model) = std::env::var("SUMMARY_MODEL") {
            self.model = model;
        }
        if let Ok(num_ctx) = std::env::var("SUMMARY_NUM_CTX") {
            self.num_ctx = num_ctx.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "SUMMARY_NUM_CTX",
                value: num_ctx,
            })?;
        }
        if let Ok(base_url) = std::env::var("OLLAMA_BASE_URL") {
            self.base_url = base_url;
        }
        Ok(())
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let local = PathBuf::from("reposum.toml");
        if local.exists() {
            return Some(local);
        }
        dirs::home_dir()
            .map(|home| home.join(".config").join("reposum").join("reposum.toml"))
            .filter(|candidate| candidate.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_are_extractive_and_local() {
        let settings = Settings::default();
        assert_eq!(settings.summarizer_kind, SummarizerKind::Extractive);
        assert_eq!(settings.model, "llama3.2:3b");
        assert_eq!(settings.num_ctx, 8192);
        assert_eq!(settings.base_url, "http://localhost:11434");
        assert!(!settings.include_forks);
    }

    #[test]
    fn file_values_override_defaults() {
        let file = write_config(
            r#"
[summarizer]
kind = "generative"
model = "qwen2.5:7b-instruct"
num_ctx = 4096
base_url = "http://ollama.local:11434"

[github]
include_forks = true
"#,
        );
        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.summarizer_kind, SummarizerKind::Generative);
        assert_eq!(settings.model, "qwen2.5:7b-instruct");
        assert_eq!(settings.num_ctx, 4096);
        assert_eq!(settings.base_url, "http://ollama.local:11434");
        assert!(settings.include_forks);
        assert!(!settings.include_archived);
    }

    #[test]
    fn unknown_kind_fails_at_load_time() {
        let file = write_config("[summarizer]\nkind = \"chatgpt\"\n");
        let err = Settings::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKind(_)));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/reposum.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }

    #[test]
    fn prompt_template_is_read_from_file() {
        let template = write_config("Summarize {repo_name}: {text}");
        let config = write_config(&format!(
            "[prompt]\ntemplate_file = {:?}\n",
            template.path()
        ));
        let settings = Settings::load(Some(config.path())).unwrap();
        assert_eq!(
            settings.prompt_template.as_deref(),
            Some("Summarize {repo_name}: {text}")
        );
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let file = write_config("[summarizer\nkind=");
        let err = Settings::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
