//! Style reference documents: plain text, PDF and Word.

use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;

use crate::constants::MAX_DOCX_XML_BYTES;

/// MIME type of Word documents.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Document kinds we can read, keyed by declared MIME type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DocumentKind {
    /// `text/plain`
    PlainText,
    /// `application/pdf`
    Pdf,
    /// `.docx`
    Word,
}

impl DocumentKind {
    /// Picks a kind from a declared MIME type. Parameters such as
    /// `; charset=utf-8` are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or(mime)
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "text/plain" => Some(Self::PlainText),
            "application/pdf" => Some(Self::Pdf),
            DOCX_MIME => Some(Self::Word),
            _ => None,
        }
    }

    /// MIME type for a file extension, used when reading from disk.
    pub fn mime_for_path(path: &Path) -> Option<&'static str> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "txt" | "text" | "md" => Some("text/plain"),
            "pdf" => Some("application/pdf"),
            "docx" => Some(DOCX_MIME),
            _ => None,
        }
    }
}

/// An uploaded reference document.
#[derive(Clone, Debug)]
pub struct ReferenceDocument {
    /// File name as uploaded, for display.
    pub name: String,
    /// Declared MIME type.
    pub mime: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Why a reference document yielded no text.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    /// The MIME type isn't one we read.
    #[error("⚠️ Format file tidak didukung: {0}")]
    Unsupported(String),
    /// Extraction failed for a supported type.
    #[error("⚠️ Gagal membaca dokumen referensi: {0}")]
    Decode(String),
}

impl ReferenceDocument {
    /// Wraps uploaded bytes.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Reads a document from disk, inferring the MIME type from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let mime = DocumentKind::mime_for_path(path).unwrap_or("application/octet-stream");
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, mime, bytes))
    }

    /// Extracts the text, dispatching on the declared MIME type only.
    pub fn extract_text(&self) -> Result<String, ReferenceError> {
        let kind = DocumentKind::from_mime(&self.mime)
            .ok_or_else(|| ReferenceError::Unsupported(self.mime.clone()))?;
        debug!("Extracting {:?} reference {}", kind, self.name);
        match kind {
            DocumentKind::PlainText => plain_text(&self.bytes),
            DocumentKind::Pdf => pdf_text(&self.bytes),
            DocumentKind::Word => docx_text(&self.bytes),
        }
    }
}

fn plain_text(bytes: &[u8]) -> Result<String, ReferenceError> {
    String::from_utf8(bytes.to_vec()).map_err(|err| ReferenceError::Decode(err.to_string()))
}

fn pdf_text(bytes: &[u8]) -> Result<String, ReferenceError> {
    let document =
        lopdf::Document::load_mem(bytes).map_err(|err| ReferenceError::Decode(err.to_string()))?;
    let mut pages = Vec::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) if !text.trim().is_empty() => pages.push(text.trim().to_string()),
            Ok(_) => debug!("PDF page {} has no text", page_number),
            Err(err) => debug!("Skipping PDF page {}: {}", page_number, err),
        }
    }
    Ok(pages.join("\n"))
}

fn docx_text(bytes: &[u8]) -> Result<String, ReferenceError> {
    docx_text_capped(bytes, MAX_DOCX_XML_BYTES)
}

/// Reads at most `cap` bytes of `word/document.xml`; larger bodies fail.
fn docx_text_capped(bytes: &[u8], cap: usize) -> Result<String, ReferenceError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| ReferenceError::Decode(err.to_string()))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|err| ReferenceError::Decode(err.to_string()))?;
    let mut xml = String::new();
    entry
        .take(cap as u64 + 1)
        .read_to_string(&mut xml)
        .map_err(|err| ReferenceError::Decode(err.to_string()))?;
    if xml.len() > cap {
        return Err(ReferenceError::Decode(format!(
            "isi dokumen Word melebihi {cap} byte"
        )));
    }
    paragraphs(&xml).map(|paragraphs| paragraphs.join("\n"))
}

/// Non-blank `w:p` paragraphs of a WordprocessingML body.
fn paragraphs(xml: &str) -> Result<Vec<String>, ReferenceError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|err| ReferenceError::Decode(err.to_string()))?;
        match event {
            Event::Start(tag) => match tag.local_name().as_ref() {
                b"p" => current.clear(),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(tag) => match tag.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                _ => {}
            },
            Event::Text(text) if in_text => {
                let text = text
                    .unescape()
                    .map_err(|err| ReferenceError::Decode(err.to_string()))?;
                current.push_str(&text);
            }
            Event::End(tag) => match tag.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let paragraph = current.trim();
                    if !paragraph.is_empty() {
                        paragraphs.push(paragraph.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn docx(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(
                "word/document.xml",
                zip::write::SimpleFileOptions::default(),
            )
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn plain_text_round_trips() {
        let content = "Jakarta — Hujan deras sejak pagi.\nWarga mengungsi. ✓";
        let document = ReferenceDocument::new("a.txt", "text/plain; charset=utf-8", content.into());
        assert_eq!(document.extract_text().unwrap(), content);
    }

    #[test]
    fn invalid_utf8_is_a_decode_error() {
        let document = ReferenceDocument::new("a.txt", "text/plain", vec![0xff, 0xfe, 0x00]);
        assert!(matches!(
            document.extract_text(),
            Err(ReferenceError::Decode(_))
        ));
    }

    #[test]
    fn unknown_types_are_unsupported() {
        let document = ReferenceDocument::new("a.rtf", "application/rtf", b"{\\rtf1}".to_vec());
        assert!(matches!(
            document.extract_text(),
            Err(ReferenceError::Unsupported(mime)) if mime == "application/rtf"
        ));
    }

    #[test]
    fn word_paragraphs_skip_blanks() {
        let bytes = docx(
            r#"<w:p><w:r><w:t>Judul</w:t></w:r><w:r><w:t xml:space="preserve"> berita</w:t></w:r></w:p>
<w:p><w:r><w:t>   </w:t></w:r></w:p>
<w:p/>
<w:p><w:r><w:t>Kalimat &amp; kutipan</w:t><w:tab/><w:t>akhir</w:t></w:r></w:p>"#,
        );
        let document = ReferenceDocument::new("a.docx", DOCX_MIME, bytes);
        assert_eq!(
            document.extract_text().unwrap(),
            "Judul berita\nKalimat & kutipan\takhir"
        );
    }

    fn pdf(pages: &[&str]) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{Document, Object, Stream, dictionary};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let operations = if text.is_empty() {
                Vec::new()
            } else {
                vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ]
            };
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages.len() as i64,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn pdf_pages_are_joined_and_blank_pages_skipped() {
        let bytes = pdf(&["Halaman satu", "", "Halaman tiga"]);
        let document = ReferenceDocument::new("a.pdf", "application/pdf", bytes);
        assert_eq!(
            document.extract_text().unwrap(),
            "Halaman satu\nHalaman tiga"
        );
    }

    #[test]
    fn oversized_word_body_is_a_decode_error() {
        let bytes = docx(&"<w:p><w:r><w:t>kata</w:t></w:r></w:p>".repeat(200));
        assert!(matches!(
            docx_text_capped(&bytes, 1024),
            Err(ReferenceError::Decode(_))
        ));
        assert!(docx_text_capped(&bytes, 64 * 1024).is_ok());
    }

    #[test]
    fn broken_pdf_is_a_decode_error() {
        let document = ReferenceDocument::new("a.pdf", "application/pdf", b"this is not a pdf".to_vec());
        assert!(matches!(
            document.extract_text(),
            Err(ReferenceError::Decode(_))
        ));
    }

    #[test]
    fn extensions_map_to_mime_types() {
        assert_eq!(
            DocumentKind::mime_for_path(Path::new("notes.TXT")),
            Some("text/plain")
        );
        assert_eq!(
            DocumentKind::mime_for_path(Path::new("a/b.docx")),
            Some(DOCX_MIME)
        );
        assert_eq!(DocumentKind::mime_for_path(Path::new("image.png")), None);
    }
}
