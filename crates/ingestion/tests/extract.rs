//! End-to-end extraction tests over generated fixture files.

use docqa_common::types::ExtractionResult;
use docqa_ingestion::{ExtractionError, Extractor, ImageTextExtractor, NullImageExtractor};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use serde_json::{json, Value};
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

// ============ Fixtures ============

fn scratch() -> (TempDir, Extractor) {
    let dir = tempfile::tempdir().unwrap();
    let extractor = Extractor::new(Some(dir.path().to_path_buf()), Arc::new(NullImageExtractor));
    (dir, extractor)
}

fn assert_scratch_empty(dir: &TempDir) {
    let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert!(leftovers.is_empty(), "staged files left behind: {:?}", leftovers);
}

fn cell_xml(reference: &str, value: &Value) -> String {
    match value {
        Value::Number(n) => format!(r#"<c r="{}"><v>{}</v></c>"#, reference, n),
        Value::String(s) => format!(
            r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
            reference, s
        ),
        // {"date": serial} is a number styled with the built-in date format
        Value::Object(map) => match map.get("date") {
            Some(serial) => format!(r#"<c r="{}" s="1"><v>{}</v></c>"#, reference, serial),
            None => String::new(),
        },
        _ => String::new(),
    }
}

fn date(serial: u32) -> Value {
    json!({ "date": serial })
}

/// Minimal single-sheet workbook; `None` rows are left out of the sheet
fn xlsx(rows: &[Option<Vec<Value>>]) -> Vec<u8> {
    let mut sheet_rows = String::new();
    for (i, row) in rows.iter().enumerate() {
        let Some(cells) = row else { continue };
        let number = i + 1;
        sheet_rows.push_str(&format!(r#"<row r="{}">"#, number));
        for (col, value) in cells.iter().enumerate() {
            let column = (b'A' + col as u8) as char;
            sheet_rows.push_str(&cell_xml(&format!("{}{}", column, number), value));
        }
        sheet_rows.push_str("</row>");
    }

    let files = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#
                .to_string(),
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
                .to_string(),
        ),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#
                .to_string(),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#
                .to_string(),
        ),
        (
            "xl/styles.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cellXfs count="2"><xf numFmtId="0"></xf><xf numFmtId="14" applyNumberFormat="1"></xf></cellXfs></styleSheet>"#
                .to_string(),
        ),
        (
            "xl/worksheets/sheet1.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
                sheet_rows
            ),
        ),
    ];

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in files {
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// PDF whose pages show the given strings; an empty slice makes a page with
/// no content stream
fn pdf(pages: &[&[&str]]) -> Vec<u8> {
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

    let mut kids = Vec::new();
    for blocks in pages {
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        };

        if !blocks.is_empty() {
            let mut operations = Vec::new();
            for text in blocks.iter() {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
                operations.push(Operation::new("Td", vec![72.into(), 720.into()]));
                operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
                operations.push(Operation::new("ET", vec![]));
            }
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            page.set("Contents", content_id);
        }

        kids.push(Object::from(doc.add_object(page)));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
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

/// One-page PDF whose text is shown as two-byte glyph ids through an
/// Identity-H font, readable only via its ToUnicode map
fn identity_h_pdf() -> Vec<u8> {
    let cmap = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
3 beginbfchar
<0024> <0054>
<0048> <0065>
<0051> <0078>
endbfchar
1 beginbfrange
<0056> <0058> <0073>
endbfrange
endcmap
end
end";

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, cmap.to_vec()));
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "NotoSans-Regular",
        "Encoding" => "Identity-H",
        "ToUnicode" => to_unicode_id,
    });

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    vec![0x00, 0x24, 0x00, 0x48, 0x00, 0x51, 0x00, 0x57],
                    StringFormat::Hexadecimal,
                )],
            ),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
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

fn rows(result: ExtractionResult) -> Value {
    match result {
        ExtractionResult::Tabular(rows) => serde_json::to_value(rows).unwrap(),
        other => panic!("expected rows, got {:?}", other),
    }
}

// ============ Spreadsheets ============

#[test]
fn test_xlsx_rows_keyed_by_header() {
    let (dir, extractor) = scratch();
    let bytes = xlsx(&[
        Some(vec![json!("name"), json!("age"), json!("score")]),
        Some(vec![json!("Ada"), json!(36), json!(9.5)]),
        None,
        Some(vec![json!("Lin"), json!(41), json!(7)]),
    ]);

    let result = extractor.extract(&bytes, "people.XLSX").unwrap();

    assert_eq!(
        rows(result),
        json!([
            {"name": "Ada", "age": 36, "score": 9.5},
            {"name": "Lin", "age": 41, "score": 7}
        ])
    );
    assert_scratch_empty(&dir);
}

#[test]
fn test_xlsx_and_csv_fallback_agree() {
    let (dir, extractor) = scratch();
    let workbook = xlsx(&[
        Some(vec![json!("region"), json!("units"), json!("price")]),
        Some(vec![json!("north"), json!(12), json!(3.25)]),
        Some(vec![json!("south"), json!(7), json!(4)]),
        None,
        Some(vec![json!("east"), json!(0), json!(10.5)]),
    ]);
    let csv = b"region,units,price\nnorth,12,3.25\nsouth,7,4\n,,\neast,0,10.5\n";

    let from_workbook = rows(extractor.extract(&workbook, "sales.xlsx").unwrap());
    let from_csv = rows(extractor.extract(csv, "sales.xls").unwrap());

    assert_eq!(from_workbook, from_csv);
    assert_eq!(from_workbook.as_array().unwrap().len(), 3);
    assert_scratch_empty(&dir);
}

#[test]
fn test_xlsx_date_cells_match_csv_text() {
    let (_dir, extractor) = scratch();
    let workbook = xlsx(&[
        Some(vec![json!("task"), json!("due")]),
        Some(vec![json!("audit"), date(45292)]),
        Some(vec![json!("renewal"), date(45366)]),
    ]);
    let csv = b"task,due\naudit,2024-01-01\nrenewal,2024-03-15\n";

    let from_workbook = rows(extractor.extract(&workbook, "plan.xlsx").unwrap());
    let from_csv = rows(extractor.extract(csv, "plan.xls").unwrap());

    assert_eq!(
        from_workbook,
        json!([
            {"task": "audit", "due": "2024-01-01"},
            {"task": "renewal", "due": "2024-03-15"}
        ])
    );
    assert_eq!(from_workbook, from_csv);
}

#[test]
fn test_unparseable_spreadsheet_fails_and_cleans_up() {
    let (dir, extractor) = scratch();

    let err = extractor
        .extract(&[0xff, 0xfe, 0x00, 0xc3], "broken.xlsx")
        .unwrap_err();

    assert!(matches!(err, ExtractionError::Spreadsheet { .. }));
    assert_scratch_empty(&dir);
}

// ============ PDF ============

#[test]
fn test_pdf_text_in_page_order() {
    let (dir, extractor) = scratch();
    let bytes = pdf(&[&["First page"], &["Second", "page"], &["Third page"]]);

    let result = extractor.extract(&bytes, "paper.pdf").unwrap();

    assert_eq!(
        result,
        ExtractionResult::Text("First page\nSecond page\nThird page".into())
    );
    assert_scratch_empty(&dir);
}

#[test]
fn test_pdf_page_without_text_is_empty() {
    let (_dir, extractor) = scratch();
    let bytes = pdf(&[&["Cover"], &[], &["Back"]]);

    let result = extractor.extract(&bytes, "scan.PDF").unwrap();

    assert_eq!(result, ExtractionResult::Text("Cover\n\nBack".into()));
}

#[test]
fn test_pdf_identity_h_font_uses_to_unicode_map() {
    let (_dir, extractor) = scratch();

    let result = extractor.extract(&identity_h_pdf(), "export.pdf").unwrap();

    assert_eq!(result, ExtractionResult::Text("Text".into()));
}

// ============ Images ============

struct FixedText(&'static str);

impl ImageTextExtractor for FixedText {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        assert!(path.exists(), "image must be staged while OCR runs");
        assert_eq!(path.extension().unwrap(), "jpeg");
        Ok(self.0.to_string())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

#[test]
fn test_image_goes_through_image_extractor() {
    let dir = tempfile::tempdir().unwrap();
    let extractor = Extractor::new(Some(dir.path().to_path_buf()), Arc::new(FixedText("INVOICE 7")));

    let result = extractor.extract(b"\xff\xd8\xff", "receipt.JPEG").unwrap();

    assert_eq!(result, ExtractionResult::Text("INVOICE 7".into()));
    assert_scratch_empty(&dir);
}

#[test]
fn test_default_image_extractor_yields_empty_text() {
    let (_dir, extractor) = scratch();
    let result = extractor.extract(b"GIF89a", "logo.gif").unwrap();
    assert_eq!(result, ExtractionResult::Text(String::new()));
}

#[test]
fn test_unsupported_suffix_rejected() {
    let (dir, extractor) = scratch();

    let err = extractor.extract(b"MZ\x90\x00", "installer.exe").unwrap_err();

    assert!(matches!(err, ExtractionError::UnsupportedFileType { ref filename } if filename == "installer.exe"));
    assert_scratch_empty(&dir);
}
