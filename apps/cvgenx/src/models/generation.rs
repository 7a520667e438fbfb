use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An atomic unit of generation. Stored as its wire name in `generations.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "camelCase")]
pub enum ContentKind {
    #[serde(rename = "resume")]
    Resume,
    #[serde(rename = "coverLetter")]
    CoverLetter,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Resume => "resume",
            ContentKind::CoverLetter => "coverLetter",
        }
    }

    /// Human label used in logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Resume => "resume",
            ContentKind::CoverLetter => "cover letter",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resume" => Ok(ContentKind::Resume),
            "coverLetter" | "cover-letter" | "cover_letter" => Ok(ContentKind::CoverLetter),
            other => Err(format!("unknown content kind '{other}'")),
        }
    }
}

/// What the user asked for. `Both` expands to one resume then one cover letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum ContentRequest {
    #[serde(rename = "resume")]
    #[value(name = "resume")]
    Resume,
    #[serde(rename = "coverLetter")]
    #[value(name = "coverLetter", alias = "cover-letter")]
    CoverLetter,
    #[serde(rename = "both")]
    #[value(name = "both")]
    Both,
}

impl ContentRequest {
    /// The atomic kinds to generate, in generation order.
    pub fn kinds(&self) -> &'static [ContentKind] {
        match self {
            ContentRequest::Resume => &[ContentKind::Resume],
            ContentRequest::CoverLetter => &[ContentKind::CoverLetter],
            ContentRequest::Both => &[ContentKind::Resume, ContentKind::CoverLetter],
        }
    }
}

/// A persisted generation: the job description that went in and the text
/// that came out. The prompt itself is never stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    pub id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub job_description: String,
    pub output: String,
    pub resume_id: Option<i64>,
    pub profile_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_expands_resume_first() {
        assert_eq!(
            ContentRequest::Both.kinds(),
            &[ContentKind::Resume, ContentKind::CoverLetter]
        );
        assert_eq!(ContentRequest::CoverLetter.kinds(), &[ContentKind::CoverLetter]);
    }

    #[test]
    fn test_content_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&ContentKind::CoverLetter).unwrap(),
            "\"coverLetter\""
        );
        let request: ContentRequest = serde_json::from_str("\"both\"").unwrap();
        assert_eq!(request, ContentRequest::Both);
        assert_eq!("cover-letter".parse::<ContentKind>(), Ok(ContentKind::CoverLetter));
        assert!("memo".parse::<ContentKind>().is_err());
    }
}
