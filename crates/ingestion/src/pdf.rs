//! PDF text extraction module
//!
//! Extracts text content from PDF files using lopdf. Strings are decoded
//! through the font selected by `Tf`: its ToUnicode map when present,
//! otherwise its base encoding.

use crate::cmap::ToUnicodeMap;
use crate::errors::ExtractionError;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Extract the text of every page, in page order, one page per line
pub fn extract_text_from_pdf(path: &Path) -> Result<String, ExtractionError> {
    let doc = Document::load(path)
        .map_err(|e| ExtractionError::Pdf(format!("Failed to load PDF: {}", e)))?;

    let pages = doc.get_pages();
    debug!(page_count = pages.len(), "Extracting text from PDF");

    // get_pages is keyed by page number
    let texts: Vec<String> = pages
        .iter()
        .map(|(page_num, page_id)| match extract_page_text(&doc, *page_id) {
            Ok(text) => text,
            Err(e) => {
                warn!(page = page_num, error = %e, "Failed to extract text from page, using empty text");
                String::new()
            }
        })
        .collect();

    let text = texts.join("\n");
    debug!(text_len = text.len(), "Text extraction complete");

    Ok(text)
}

/// Extract text from a single page
fn extract_page_text(doc: &Document, page_id: ObjectId) -> Result<String, String> {
    let content = doc.get_page_content(page_id).map_err(|e| e.to_string())?;
    if content.is_empty() {
        return Ok(String::new());
    }

    let fonts: BTreeMap<Vec<u8>, FontDecoder> = doc
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, FontDecoder::for_font(doc, font)))
        .collect();

    let content = Content::decode(&content).map_err(|e| e.to_string())?;
    Ok(text_from_operations(&content, &fonts))
}

/// How a font's string operands map to text
#[derive(Debug)]
enum FontDecoder {
    /// Font carries a ToUnicode CMap
    Unicode(ToUnicodeMap),
    /// Composite font without ToUnicode; codes read as UTF-16BE
    Composite,
    /// Simple font with a named base encoding
    Simple(String),
}

impl FontDecoder {
    fn for_font(doc: &Document, font: &Dictionary) -> Self {
        let composite = font.get(b"Subtype").and_then(Object::as_name_str).ok() == Some("Type0");

        if let Some(map) = to_unicode(doc, font, if composite { 2 } else { 1 }) {
            return FontDecoder::Unicode(map);
        }
        if composite {
            return FontDecoder::Composite;
        }
        FontDecoder::Simple(base_encoding(doc, font))
    }

    fn decode(&self, bytes: &[u8]) -> String {
        match self {
            FontDecoder::Unicode(map) => map.decode(bytes),
            FontDecoder::Composite => utf16be(bytes),
            FontDecoder::Simple(encoding) => Document::decode_text(Some(encoding.as_str()), bytes),
        }
    }
}

fn to_unicode(doc: &Document, font: &Dictionary, default_width: usize) -> Option<ToUnicodeMap> {
    let (_, object) = doc.dereference(font.get(b"ToUnicode").ok()?).ok()?;
    let stream = object.as_stream().ok()?;
    let program = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let map = ToUnicodeMap::parse(&program, default_width);
    (!map.is_empty()).then_some(map)
}

fn base_encoding(doc: &Document, font: &Dictionary) -> String {
    let encoding = font
        .get(b"Encoding")
        .ok()
        .and_then(|e| doc.dereference(e).ok())
        .map(|(_, e)| e);

    let name = match encoding {
        Some(Object::Name(name)) => Some(name.as_slice()),
        Some(Object::Dictionary(dict)) => dict.get(b"BaseEncoding").and_then(Object::as_name).ok(),
        _ => None,
    };

    name.map(|n| String::from_utf8_lossy(n).into_owned())
        .unwrap_or_else(|| "StandardEncoding".to_string())
}

/// Concatenate shown strings per `BT`..`ET` block; blocks are space separated.
///
/// Text shown outside a block, or in a block left open, is kept as its own block.
fn text_from_operations(content: &Content, fonts: &BTreeMap<Vec<u8>, FontDecoder>) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut font: Option<&FontDecoder> = None;

    for op in &content.operations {
        match op.operator.as_str() {
            "BT" | "ET" => {
                if !current.is_empty() {
                    blocks.push(std::mem::take(&mut current));
                }
            }
            "Tf" => {
                font = op
                    .operands
                    .first()
                    .and_then(|name| name.as_name().ok())
                    .and_then(|name| fonts.get(name));
            }
            "Tj" | "'" => {
                if let Some(operand) = op.operands.first() {
                    push_shown(&mut current, font, operand);
                }
            }
            "\"" => {
                if let Some(operand) = op.operands.last() {
                    push_shown(&mut current, font, operand);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    for item in items {
                        push_shown(&mut current, font, item);
                    }
                }
            }
            _ => {}
        }
    }

    if !current.is_empty() {
        blocks.push(current);
    }

    blocks.join(" ")
}

fn push_shown(out: &mut String, font: Option<&FontDecoder>, operand: &Object) {
    if let Object::String(bytes, _) = operand {
        match font {
            Some(font) => out.push_str(&font.decode(bytes)),
            None => out.push_str(&decode_pdf_string(bytes)),
        }
    }
}

/// Decode a string operand shown without a known font: UTF-16BE when
/// BOM-prefixed, otherwise one byte per char
fn decode_pdf_string(bytes: &[u8]) -> String {
    match bytes {
        [0xfe, 0xff, rest @ ..] => utf16be(rest),
        _ => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn utf16be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::StringFormat;

    fn ops(operations: Vec<Operation>) -> Content {
        Content { operations }
    }

    #[test]
    fn test_decode_pdf_string() {
        assert_eq!(decode_pdf_string(b"Hello"), "Hello");
        assert_eq!(decode_pdf_string(&[0xfe, 0xff, 0x00, 0x48, 0x00, 0x69]), "Hi");
        assert_eq!(decode_pdf_string(&[0x63, 0x61, 0x66, 0xe9]), "café");
    }

    #[test]
    fn test_blocks_joined_by_space() {
        let content = ops(vec![
            Operation::new("BT", vec![]),
            Operation::new("Tj", vec![Object::string_literal("Hello")]),
            Operation::new("'", vec![Object::string_literal(",")]),
            Operation::new("ET", vec![]),
            Operation::new("BT", vec![]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("Wor"),
                    Object::Integer(-120),
                    Object::string_literal("ld"),
                ])],
            ),
            Operation::new(
                "\"",
                vec![Object::Integer(0), Object::Integer(0), Object::string_literal("!")],
            ),
            Operation::new("ET", vec![]),
        ]);

        assert_eq!(text_from_operations(&content, &BTreeMap::new()), "Hello, World!");
    }

    #[test]
    fn test_operations_without_text() {
        let content = ops(vec![
            Operation::new("BT", vec![]),
            Operation::new("Td", vec![Object::Integer(10), Object::Integer(10)]),
            Operation::new("ET", vec![]),
        ]);
        assert_eq!(text_from_operations(&content, &BTreeMap::new()), "");
    }

    #[test]
    fn test_text_outside_blocks_is_kept() {
        let content = ops(vec![
            Operation::new("Tj", vec![Object::string_literal("Loose")]),
            Operation::new("BT", vec![]),
            Operation::new("Tj", vec![Object::string_literal("open")]),
            Operation::new("ET", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Tj", vec![Object::string_literal("unclosed")]),
        ]);
        assert_eq!(
            text_from_operations(&content, &BTreeMap::new()),
            "Loose open unclosed"
        );
    }

    #[test]
    fn test_strings_decoded_through_selected_font() {
        let mut fonts = BTreeMap::new();
        fonts.insert(b"F1".to_vec(), FontDecoder::Simple("WinAnsiEncoding".into()));
        fonts.insert(
            b"F2".to_vec(),
            FontDecoder::Unicode(ToUnicodeMap::parse(
                b"1 begincodespacerange <0000> <FFFF> endcodespacerange \
                  1 beginbfchar <0003> <0041> endbfchar",
                2,
            )),
        );
        fonts.insert(b"F3".to_vec(), FontDecoder::Composite);

        let content = ops(vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Tj", vec![Object::String(vec![0x80, b'5'], StringFormat::Literal)]),
            Operation::new("Tf", vec!["F2".into(), 12.into()]),
            Operation::new("Tj", vec![Object::String(vec![0x00, 0x03], StringFormat::Hexadecimal)]),
            Operation::new("Tf", vec!["F3".into(), 12.into()]),
            Operation::new("Tj", vec![Object::String(vec![0x00, 0x7a], StringFormat::Hexadecimal)]),
            Operation::new("ET", vec![]),
        ]);

        assert_eq!(text_from_operations(&content, &fonts), "\u{20ac}5Az");
    }

    #[test]
    fn test_unreadable_pdf_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"definitely not a pdf").unwrap();

        assert!(matches!(
            extract_text_from_pdf(&path),
            Err(ExtractionError::Pdf(_))
        ));
    }
}
