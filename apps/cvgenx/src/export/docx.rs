//! DOCX writer. The package body is a single `altChunk` pointing at an MHT
//! part that carries the styled HTML document; Word imports it on open.

use std::io::{Cursor, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::ExportError;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="mht" ContentType="message/rfc822"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>
"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>
"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="htmlChunk" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/aFChunk" Target="/word/afchunk.mht"/>
</Relationships>
"#;

/// US Letter (12240 x 15840 twips) with 1" (1440 twip) margins.
const DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <w:body>
    <w:altChunk r:id="htmlChunk"/>
    <w:sectPr>
      <w:pgSz w:w="12240" w:h="15840" w:orient="portrait"/>
      <w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/>
    </w:sectPr>
  </w:body>
</w:document>
"#;

const MHT_BOUNDARY: &str = "----=mhtDocumentPart";

/// Wraps the HTML document in a single-part MIME message, base64 encoded.
fn mht_part(html: &str) -> String {
    let encoded = STANDARD.encode(html.as_bytes());
    let mut body = String::with_capacity(encoded.len() + encoded.len() / 76 * 2 + 512);

    body.push_str("MIME-Version: 1.0\r\n");
    body.push_str(&format!(
        "Content-Type: multipart/related; type=\"text/html\"; boundary=\"{MHT_BOUNDARY}\"\r\n\r\n"
    ));
    body.push_str(&format!("--{MHT_BOUNDARY}\r\n"));
    body.push_str("Content-Type: text/html; charset=\"utf-8\"\r\n");
    body.push_str("Content-Transfer-Encoding: base64\r\n");
    body.push_str("Content-Location: file:///C:/cvgenx/document.html\r\n\r\n");

    // MIME caps base64 lines at 76 characters; the alphabet is ASCII so
    // byte chunks are char boundaries.
    for chunk in encoded.as_bytes().chunks(76) {
        body.push_str(&String::from_utf8_lossy(chunk));
        body.push_str("\r\n");
    }
    body.push_str(&format!("\r\n--{MHT_BOUNDARY}--\r\n"));
    body
}

/// Packages a complete HTML document as a `.docx` file.
pub fn package(html: &str) -> Result<Vec<u8>, ExportError> {
    // Fixed entry timestamps keep the archive byte-for-byte reproducible.
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("word/document.xml", DOCUMENT_XML.to_string()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
        ("word/afchunk.mht", mht_part(html)),
    ];
    for (name, content) in parts {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}
