//! Content Provider: the single point of entry for generative-text backends.
//!
//! No other module talks to a provider API directly. The backend is picked once
//! at startup from `ProviderKind` and carried as `Arc<dyn ContentProvider>`;
//! call sites never branch on which backend is active.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{ContentKind, UserProfile};

pub mod gemini;

pub use gemini::GeminiProvider;

/// Everything a backend needs for one generation call.
/// The credential and model are read from the store per request, never cached.
#[derive(Debug, Clone, Copy)]
pub struct GenerateContent<'a> {
    pub prompt: &'a str,
    pub kind: ContentKind,
    pub profile: &'a UserProfile,
    pub credential: Option<&'a str>,
    pub model: &'a str,
}

#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &'static str;

    /// Sends the prompt and returns the generated markdown with fences stripped.
    ///
    /// Fails with `AppError::Configuration` when no credential is supplied (before
    /// any network call) and `AppError::Provider` for upstream failures.
    async fn generate_content(&self, request: GenerateContent<'_>) -> Result<String, AppError>;

    /// Checks a credential with a minimal request. An empty credential is "not
    /// configured" and reports `true`. Never fails: problems surface as `false`.
    async fn validate_key(&self, credential: &str) -> bool;
}

/// The closed set of supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Gemini => f.write_str("gemini"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(format!("unsupported provider '{other}' (supported: gemini)")),
        }
    }
}

/// Constructs the backend for `kind` against `base_url`.
pub fn build_provider(kind: ProviderKind, base_url: &str) -> Arc<dyn ContentProvider> {
    match kind {
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(base_url)),
    }
}

/// Strips a markdown code fence wrapping the answer.
///
/// The answer counts as wrapped when it opens with a fence line and the last
/// closing fence line ends it, or, for a `markdown`/`md` fence, when only
/// commentary follows that closing line (the commentary is dropped). An
/// answer that merely starts with an ordinary code block is returned as is.
/// An unterminated opening fence is removed. Whitespace is trimmed.
pub fn strip_markdown_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(after_ticks) = text.strip_prefix("```") else {
        return text;
    };
    let fence_len = text.len() - after_ticks.trim_start_matches('`').len();

    let Some((open_line, body)) = text.split_once('\n') else {
        // Everything on one line: "```markdown# Resume```".
        return text
            .trim_start_matches('`')
            .trim_start_matches(|c: char| c.is_ascii_alphanumeric())
            .trim_end_matches('`')
            .trim();
    };
    let tag = open_line.trim_start_matches('`').trim().to_ascii_lowercase();

    let is_closing = |line: &str| {
        let line = line.trim();
        line.len() >= fence_len && line.chars().all(|c| c == '`')
    };

    let mut offset = 0;
    let mut last_closing = None;
    for line in body.split_inclusive('\n') {
        if is_closing(line) {
            last_closing = Some((offset, offset + line.len()));
        }
        offset += line.len();
    }

    let Some((close_start, close_end)) = last_closing else {
        return body.trim();
    };
    let inner = body[..close_start].trim();
    let trailing = body[close_end..].trim();

    if trailing.is_empty() || matches!(tag.as_str(), "markdown" | "md") {
        inner
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_markdown_fences_with_tag() {
        assert_eq!(strip_markdown_fences("```markdown\n# Resume\n```"), "# Resume");
        assert_eq!(strip_markdown_fences("```md\n# Resume\n```\n"), "# Resume");
    }

    #[test]
    fn test_strip_markdown_fences_without_tag() {
        assert_eq!(
            strip_markdown_fences("  ```\n# Resume\n\n- item\n```  "),
            "# Resume\n\n- item"
        );
    }

    #[test]
    fn test_strip_markdown_fences_no_fences() {
        assert_eq!(strip_markdown_fences("\n# Resume\n"), "# Resume");
    }

    #[test]
    fn test_strip_markdown_fences_unterminated_and_inner() {
        assert_eq!(strip_markdown_fences("```markdown\n# Resume"), "# Resume");
        let inner = "# Resume\n```\ncode\n```\nafter";
        assert_eq!(strip_markdown_fences(inner), inner);
    }

    #[test]
    fn test_strip_markdown_fences_drops_trailing_commentary() {
        assert_eq!(
            strip_markdown_fences(
                "```markdown\n# Resume\n```\n\nLet me know if you need changes."
            ),
            "# Resume"
        );
    }

    #[test]
    fn test_leading_code_block_is_not_a_wrapper() {
        let answer = "```\nfn x()\n```\nText after";
        assert_eq!(strip_markdown_fences(answer), answer);
        let tagged = "```rust\nfn x()\n```\nText after";
        assert_eq!(strip_markdown_fences(tagged), tagged);
    }

    #[test]
    fn test_wrapper_keeps_inner_code_blocks() {
        assert_eq!(
            strip_markdown_fences("```markdown\n# Resume\n```\ncode\n```\nDone\n```"),
            "# Resume\n```\ncode\n```\nDone"
        );
    }

    #[test]
    fn test_strip_markdown_fences_single_line() {
        assert_eq!(strip_markdown_fences("```markdown# Resume```"), "# Resume");
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("Gemini".parse::<ProviderKind>(), Ok(ProviderKind::Gemini));
        assert!("openai".parse::<ProviderKind>().is_err());
        assert_eq!(ProviderKind::Gemini.to_string(), "gemini");
    }
}
