//! Document Exporter: markdown in, PDF or DOCX bytes out.
//!
//! Output is a pure function of the input text. Nothing time- or
//! randomness-dependent ends up in the files.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod docx;
pub mod font_metrics;
pub mod handlers;
pub mod markdown;
pub mod pdf;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Markdown content is empty")]
    EmptyInput,

    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    #[error("DOCX packaging failed: {0}")]
    Docx(#[from] zip::result::ZipError),

    #[error("Failed to write document: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[serde(rename = "md", alias = "markdown")]
    #[value(name = "md", alias = "markdown")]
    Markdown,
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "text/markdown; charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" => Ok(ExportFormat::Docx),
            other => Err(format!("unsupported format '{other}' (expected md, pdf or docx)")),
        }
    }
}

/// Lowercase ASCII slug for file names: runs of anything outside `[a-z0-9]`
/// become a single `-`, with no leading or trailing dash.
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

fn ensure_content(markdown: &str) -> Result<(), ExportError> {
    if markdown.trim().is_empty() {
        return Err(ExportError::EmptyInput);
    }
    Ok(())
}

pub fn to_pdf(markdown: &str) -> Result<Vec<u8>, ExportError> {
    ensure_content(markdown)?;
    let blocks = markdown::parse_blocks(markdown);
    let bytes = pdf::render(&blocks)?;
    debug!("Rendered {} blocks into {} PDF bytes", blocks.len(), bytes.len());
    Ok(bytes)
}

pub fn to_docx(markdown: &str) -> Result<Vec<u8>, ExportError> {
    ensure_content(markdown)?;
    let html = markdown::to_html_document(markdown);
    let bytes = docx::package(&html)?;
    debug!("Packaged {} HTML bytes into {} DOCX bytes", html.len(), bytes.len());
    Ok(bytes)
}

/// Renders `markdown` in the requested format. Markdown is passed through.
pub fn render(format: ExportFormat, markdown: &str) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Markdown => {
            ensure_content(markdown)?;
            Ok(markdown.as_bytes().to_vec())
        }
        ExportFormat::Pdf => to_pdf(markdown),
        ExportFormat::Docx => to_docx(markdown),
    }
}

/// Renders and writes to `path`, replacing any existing file.
pub async fn export_to_file(
    format: ExportFormat,
    markdown: &str,
    path: &Path,
) -> Result<(), ExportError> {
    let bytes = render(format, markdown)?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    const JANE_RESUME: &str = "# Jane Doe\njane@x.com\n\n## Summary\nBackend engineer focused on **Go** and *Kubernetes*.\n\n## Education\n- BS CS\n\n[GitHub](https://github.com/jane)\n";

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(to_pdf(""), Err(ExportError::EmptyInput)));
        assert!(matches!(to_docx("   "), Err(ExportError::EmptyInput)));
        assert!(matches!(
            render(ExportFormat::Markdown, "\n\t"),
            Err(ExportError::EmptyInput)
        ));
    }

    #[test]
    fn test_pdf_and_docx_signatures() {
        let pdf = to_pdf(JANE_RESUME).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
        let docx = to_docx(JANE_RESUME).unwrap();
        assert!(docx.starts_with(b"PK"));
    }

    #[test]
    fn test_outputs_are_deterministic() {
        assert_eq!(to_pdf(JANE_RESUME).unwrap(), to_pdf(JANE_RESUME).unwrap());
        assert_eq!(to_docx(JANE_RESUME).unwrap(), to_docx(JANE_RESUME).unwrap());
    }

    #[test]
    fn test_docx_body_is_rendered_html() {
        let docx = to_docx(JANE_RESUME).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut mht = String::new();
        archive
            .by_name("word/afchunk.mht")
            .unwrap()
            .read_to_string(&mut mht)
            .unwrap();

        let html = markdown::to_html_document(JANE_RESUME);
        let encoded = {
            use base64::Engine;
            base64::engine::general_purpose::STANDARD.encode(html.as_bytes())
        };
        let flattened: String = mht.lines().map(str::trim_end).collect();
        assert!(flattened.contains(&encoded));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Jane Doe"), "jane-doe");
        assert_eq!(slugify("  Dr. Émile  O'Brien!! "), "dr-mile-o-brien");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn test_format_metadata() {
        assert_eq!("PDF".parse::<ExportFormat>(), Ok(ExportFormat::Pdf));
        assert_eq!("markdown".parse::<ExportFormat>(), Ok(ExportFormat::Markdown));
        assert!("rtf".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Docx.extension(), "docx");
        assert_eq!(ExportFormat::Pdf.content_type(), "application/pdf");
        assert_eq!(
            serde_json::from_str::<ExportFormat>("\"md\"").unwrap(),
            ExportFormat::Markdown
        );
        assert_eq!(serde_json::to_string(&ExportFormat::Docx).unwrap(), "\"docx\"");
    }

    #[tokio::test]
    async fn test_export_to_file_writes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jane-doe-resume.pdf");
        export_to_file(ExportFormat::Pdf, JANE_RESUME, &path)
            .await
            .unwrap();
        let written = tokio::fs::read(&path).await.unwrap();
        assert!(written.starts_with(b"%PDF-"));

        let missing = dir.path().join("nope.docx");
        assert!(export_to_file(ExportFormat::Docx, " ", &missing).await.is_err());
        assert!(!missing.exists());
    }
}
