//! Rendering of the per-repository items to JSON or Markdown.

use crate::pipeline::RepoItem;
use std::path::Path;

/// Pretty-printed JSON array of items
pub fn to_json(items: &[RepoItem]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(items)
}

/// One Markdown bullet per repository: link, italic languages, then the
/// README excerpt or the description.
pub fn to_markdown(items: &[RepoItem]) -> String {
    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let tech = match &item.languages {
            Some(languages) if !languages.is_empty() => {
                format!(" — _{}_", languages.join(", "))
            }
            _ => String::new(),
        };
        let desc = if let Some(excerpt) = item
            .readme_excerpt
            .as_deref()
            .filter(|text| !text.is_empty())
        {
            format!(": {}", excerpt)
        } else if !item.description.is_empty() {
            format!(": {}", item.description)
        } else {
            String::new()
        };
        lines.push(format!("- [{}]({}){}{}", item.name, item.url, tech, desc));
    }
    lines.join("\n")
}

/// Write the rendered payload to `path`, creating parent directories.
pub fn write_payload(path: &Path, payload: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str) -> RepoItem {
        RepoItem {
            name: name.to_string(),
            url: format!("https://github.com/u/{}", name),
            description: String::new(),
            languages: None,
            readme: None,
            readme_excerpt: None,
            summary: None,
            structured: None,
        }
    }

    #[test]
    fn markdown_bullet_with_languages_and_excerpt() {
        let mut one = item("tool");
        one.languages = Some(vec!["Rust".to_string(), "C".to_string()]);
        one.readme_excerpt = Some("Does things.".to_string());
        assert_eq!(
            to_markdown(&[one]),
            "- [tool](https://github.com/u/tool) — _Rust, C_: Does things."
        );
    }

    #[test]
    fn markdown_falls_back_to_description() {
        let mut one = item("tool");
        one.description = "A CLI tool".to_string();
        assert_eq!(
            to_markdown(&[one]),
            "- [tool](https://github.com/u/tool): A CLI tool"
        );
    }

    #[test]
    fn markdown_bare_bullet_without_text() {
        assert_eq!(to_markdown(&[item("x")]), "- [x](https://github.com/u/x)");
    }

    #[test]
    fn json_is_an_array_in_listing_order() {
        let items = vec![item("b"), item("a")];
        let json = to_json(&items).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let array = parsed.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["name"], "b");
        assert_eq!(array[1]["name"], "a");
    }

    #[test]
    fn payload_is_written_with_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out").join("repos.json");
        write_payload(&target, "[]").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "[]");
    }
}
