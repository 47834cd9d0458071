use std::io::{Cursor, Write};

use chrono::{FixedOffset, NaiveDate};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

use crate::error::ExportError;
use crate::models::Submission;
use crate::query::FilterState;
use crate::store::SubmissionStore;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const HEADERS: [&str; 7] = [
    "First Name",
    "Last Name",
    "Email",
    "Telegram",
    "Phone",
    "Feedback",
    "Submission Date",
];
const SHEET_NAME: &str = "Submissions";
const COLUMNS: [char; 7] = ['A', 'B', 'C', 'D', 'E', 'F', 'G'];

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

const SHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// A finished spreadsheet, ready to download.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub rows: usize,
}

pub fn file_name(today: NaiveDate) -> String {
    format!("submissions_{}.xlsx", today.format("%Y-%m-%d"))
}

/// One spreadsheet row per record, in `HEADERS` order.
pub fn to_row(s: &Submission, offset: FixedOffset) -> [String; 7] {
    [
        s.first_name.clone(),
        s.last_name.clone(),
        s.email.clone(),
        s.telegram.clone(),
        s.phone.clone(),
        s.feedback.clone().unwrap_or_default(),
        s.submitted_at
            .with_timezone(&offset)
            .format("%d.%m.%Y, %H:%M:%S")
            .to_string(),
    ]
}

/// Runs the unpaginated query for `filter` and renders it as a workbook.
pub async fn export(
    store: &dyn SubmissionStore,
    filter: &FilterState,
    offset: FixedOffset,
    today: NaiveDate,
) -> Result<ExportFile, ExportError> {
    let records = store.fetch_all(filter).await?;
    let rows: Vec<[String; 7]> = records.iter().map(|s| to_row(s, offset)).collect();
    let bytes = build_workbook(&rows)?;
    tracing::info!(rows = rows.len(), size = bytes.len(), "workbook built");
    Ok(ExportFile {
        file_name: file_name(today),
        bytes,
        rows: rows.len(),
    })
}

pub fn build_workbook(rows: &[[String; 7]]) -> Result<Vec<u8>, ExportError> {
    let sheet = sheet_xml(rows)?;
    let workbook = workbook_xml()?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let parts: [(&str, &[u8]); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", ROOT_RELS.as_bytes()),
        ("xl/workbook.xml", workbook.as_slice()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes()),
        ("xl/worksheets/sheet1.xml", sheet.as_slice()),
    ];
    for (name, body) in parts {
        zip.start_file(name, options)?;
        zip.write_all(body)?;
    }
    Ok(zip.finish()?.into_inner())
}

fn workbook_xml() -> Result<Vec<u8>, ExportError> {
    let mut w = Writer::new(Vec::new());
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    w.write_event(Event::Start(
        BytesStart::new("workbook").with_attributes([("xmlns", SHEET_NS), ("xmlns:r", REL_NS)]),
    ))?;
    w.write_event(Event::Start(BytesStart::new("sheets")))?;
    w.write_event(Event::Empty(BytesStart::new("sheet").with_attributes([
        ("name", SHEET_NAME),
        ("sheetId", "1"),
        ("r:id", "rId1"),
    ])))?;
    w.write_event(Event::End(BytesEnd::new("sheets")))?;
    w.write_event(Event::End(BytesEnd::new("workbook")))?;
    Ok(w.into_inner())
}

fn sheet_xml(rows: &[[String; 7]]) -> Result<Vec<u8>, ExportError> {
    let mut w = Writer::new(Vec::new());
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    w.write_event(Event::Start(
        BytesStart::new("worksheet").with_attributes([("xmlns", SHEET_NS)]),
    ))?;
    w.write_event(Event::Start(BytesStart::new("sheetData")))?;

    let header = HEADERS.map(String::from);
    for (i, cells) in std::iter::once(&header).chain(rows.iter()).enumerate() {
        let r = (i + 1).to_string();
        w.write_event(Event::Start(
            BytesStart::new("row").with_attributes([("r", r.as_str())]),
        ))?;
        for (col, value) in COLUMNS.iter().zip(cells.iter()) {
            write_cell(&mut w, &format!("{col}{r}"), value)?;
        }
        w.write_event(Event::End(BytesEnd::new("row")))?;
    }

    w.write_event(Event::End(BytesEnd::new("sheetData")))?;
    w.write_event(Event::End(BytesEnd::new("worksheet")))?;
    Ok(w.into_inner())
}

// inline strings, so no shared string table is needed
fn write_cell(w: &mut Writer<Vec<u8>>, cell_ref: &str, value: &str) -> Result<(), ExportError> {
    w.write_event(Event::Start(
        BytesStart::new("c").with_attributes([("r", cell_ref), ("t", "inlineStr")]),
    ))?;
    w.write_event(Event::Start(BytesStart::new("is")))?;
    w.write_event(Event::Start(
        BytesStart::new("t").with_attributes([("xml:space", "preserve")]),
    ))?;
    w.write_event(Event::Text(BytesText::new(value)))?;
    w.write_event(Event::End(BytesEnd::new("t")))?;
    w.write_event(Event::End(BytesEnd::new("is")))?;
    w.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}
