//! Reference resumes: text extraction from uploads, normalization, and the
//! lookup order used when a generation request does not carry text itself.

use std::collections::HashSet;
use std::io::{Cursor, Read};

use tracing::{debug, warn};

use crate::errors::AppError;
use crate::models::ResumeRecord;
use crate::store::Store;

/// Normalized reference text is capped at this many characters.
pub const MAX_REFERENCE_CHARS: usize = 12_000;
/// The merged view over all stored resumes is capped at this many characters.
pub const MAX_MERGED_CHARS: usize = 4_000;

const PDF_MIME: &str = "application/pdf";
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Extracts plain text from an uploaded file, picked by MIME type or extension.
/// Anything that is neither PDF nor DOCX is read as UTF-8.
pub fn extract_text(filename: &str, mime: &str, data: &[u8]) -> Result<String, AppError> {
    let lower = filename.to_ascii_lowercase();

    let text = if mime == PDF_MIME || lower.ends_with(".pdf") {
        pdf_extract::extract_text_from_mem(data)
            .map_err(|e| AppError::Validation(format!("Could not read PDF '{filename}': {e}")))?
    } else if mime == DOCX_MIME || lower.ends_with(".docx") {
        docx_text(data)
            .map_err(|e| AppError::Validation(format!("Could not read DOCX '{filename}': {e}")))?
    } else {
        String::from_utf8_lossy(data).into_owned()
    };

    debug!("Extracted {} characters from {filename}", text.len());
    Ok(text.trim().to_string())
}

/// Text runs of `word/document.xml`, one line per paragraph.
fn docx_text(data: &[u8]) -> anyhow::Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
    let mut xml = String::new();
    archive.by_name("word/document.xml")?.read_to_string(&mut xml)?;

    let mut out = String::new();
    let mut rest = xml.as_str();
    while let Some(start) = rest.find('<') {
        let Some(end) = rest[start..].find('>') else {
            break;
        };
        let tag = &rest[start + 1..start + end];
        rest = &rest[start + end + 1..];

        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or_default();

        match name {
            "w:t" if !tag.starts_with('/') && !tag.ends_with('/') => {
                let close = rest.find("</w:t>").unwrap_or(rest.len());
                out.push_str(&decode_entities(&rest[..close]));
                rest = &rest[close..];
            }
            "w:tab" => out.push('\t'),
            "w:br" | "w:cr" => out.push('\n'),
            "w:p" if tag.starts_with('/') => out.push('\n'),
            _ => {}
        }
    }
    Ok(out)
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Drops carriage returns, trims every line, removes blank lines and caps the
/// result at `MAX_REFERENCE_CHARS`.
pub fn normalize(text: &str) -> String {
    let squeezed = text
        .replace('\r', "")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    truncate_chars(&squeezed, MAX_REFERENCE_CHARS)
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

/// Unique non-empty lines across resumes, in order, up to `MAX_MERGED_CHARS`.
pub fn merge_resume_text(resumes: &[ResumeRecord]) -> String {
    let mut seen = HashSet::new();
    let mut merged: Vec<&str> = Vec::new();
    let mut length = 0usize;

    let lines = resumes
        .iter()
        .flat_map(|r| r.content.lines())
        .map(str::trim)
        .filter(|line| !line.is_empty());

    for line in lines {
        if !seen.insert(line) {
            continue;
        }
        let separator = usize::from(!merged.is_empty());
        let line_len = line.chars().count();
        if length + separator + line_len > MAX_MERGED_CHARS {
            break;
        }
        length += separator + line_len;
        merged.push(line);
    }
    merged.join("\n")
}

/// Resolves the reference text for a generation: explicit text, then the
/// stored resume with `resume_id`, then the latest stored resume.
///
/// Returns the text (if any) and the id of the stored resume it came from.
pub async fn resolve_reference(
    store: &Store,
    explicit: Option<&str>,
    resume_id: Option<i64>,
) -> Result<(Option<String>, Option<i64>), AppError> {
    if let Some(text) = explicit.map(normalize).filter(|t| !t.is_empty()) {
        return Ok((Some(text), resume_id));
    }

    let stored = match resume_id {
        Some(id) => match store.get_resume(id).await {
            Ok(resume) => Some(resume),
            Err(AppError::NotFound(_)) => {
                warn!("Reference resume {id} not found; falling back to the latest upload");
                store.get_latest_resume().await?
            }
            Err(e) => return Err(e),
        },
        None => store.get_latest_resume().await?,
    };

    Ok(match stored {
        Some(resume) => {
            let text = normalize(&resume.content);
            if text.is_empty() {
                (None, Some(resume.id))
            } else {
                (Some(text), Some(resume.id))
            }
        }
        None => (None, None),
    })
}
