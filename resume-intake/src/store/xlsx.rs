//! Minimal single-sheet OOXML workbook I/O.
//!
//! Reading goes through calamine so files edited in Excel or LibreOffice
//! load fine. Writing emits the smallest package Excel accepts: one sheet,
//! a shared-string table, and numeric cells where requested.

use std::collections::HashMap;
use std::io::{Cursor, Write};

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{IntakeError, Result};

pub const DEFAULT_SHEET_NAME: &str = "Applicants";

/// First worksheet of a workbook, as text cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetData {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

/// Reads the first worksheet. Fully empty rows are dropped.
pub fn read_sheet(bytes: &[u8]) -> Result<SheetData> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| IntakeError::WorkbookCorrupt(format!("not a readable spreadsheet: {e}")))?;

    let mut sheets = workbook.worksheets();
    if sheets.is_empty() {
        return Err(IntakeError::WorkbookCorrupt(
            "workbook contains no worksheets".to_string(),
        ));
    }
    if sheets.len() > 1 {
        tracing::warn!(
            sheets = sheets.len(),
            "Workbook has several sheets; only the first is managed"
        );
    }

    let (name, range) = sheets.swap_remove(0);
    let rows = range
        .rows()
        .map(|row| row.iter().map(format_cell_value).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .collect();

    Ok(SheetData { name, rows })
}

fn format_cell_value(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            let s = format!("{f}");
            if s.contains('.') {
                s.trim_end_matches('0').trim_end_matches('.').to_string()
            } else {
                s
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(dt) => dt.clone(),
        Data::DurationIso(d) => d.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Excel's 1900 date system, counted from 1899-12-30.
pub fn excel_serial_to_datetime(serial: f64) -> Option<chrono::DateTime<Utc>> {
    if !serial.is_finite() || !(0.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let epoch: NaiveDateTime = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    let naive = epoch.checked_add_signed(Duration::seconds(seconds))?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Serializes a sheet into an `.xlsx` package. Cells in `numeric_columns`
/// that parse as numbers are written as numbers.
pub fn write_sheet(sheet_name: &str, rows: &[Vec<String>], numeric_columns: &[usize]) -> Result<Vec<u8>> {
    let mut strings = SharedStrings::default();
    let sheet_xml = sheet_xml(rows, numeric_columns, &mut strings);

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buffer);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        let parts: [(&str, String); 6] = [
            ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
            ("_rels/.rels", RELS_XML.to_string()),
            ("xl/workbook.xml", workbook_xml(sheet_name)),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.to_string()),
            ("xl/worksheets/sheet1.xml", sheet_xml),
            ("xl/sharedStrings.xml", strings.to_xml()),
        ];

        for (part, content) in parts {
            zip.start_file(part, options)
                .map_err(|e| IntakeError::WriteFailure(format!("cannot write {part}: {e}")))?;
            zip.write_all(content.as_bytes())
                .map_err(|e| IntakeError::WriteFailure(format!("cannot write {part}: {e}")))?;
        }

        zip.finish()
            .map_err(|e| IntakeError::WriteFailure(format!("cannot finish workbook: {e}")))?;
    }

    Ok(buffer.into_inner())
}

#[derive(Default)]
struct SharedStrings {
    index: HashMap<String, usize>,
    values: Vec<String>,
    count: usize,
}

impl SharedStrings {
    fn intern(&mut self, value: &str) -> usize {
        self.count += 1;
        if let Some(&i) = self.index.get(value) {
            return i;
        }
        let i = self.values.len();
        self.values.push(value.to_string());
        self.index.insert(value.to_string(), i);
        i
    }

    fn to_xml(&self) -> String {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            self.count,
            self.values.len()
        );
        for value in &self.values {
            xml.push_str(r#"<si><t xml:space="preserve">"#);
            xml.push_str(&escape(xml_safe(value).as_str()));
            xml.push_str("</t></si>");
        }
        xml.push_str("</sst>");
        xml
    }
}

fn sheet_xml(rows: &[Vec<String>], numeric_columns: &[usize], strings: &mut SharedStrings) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    for (r, row) in rows.iter().enumerate() {
        let row_number = r + 1;
        xml.push_str(&format!(r#"<row r="{row_number}">"#));
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let cell_ref = format!("{}{row_number}", column_letters(c));
            // Header row stays textual even in numeric columns.
            let numeric = r > 0 && numeric_columns.contains(&c) && value.parse::<f64>().is_ok();
            if numeric {
                xml.push_str(&format!(r#"<c r="{cell_ref}"><v>{value}</v></c>"#));
            } else {
                let i = strings.intern(value);
                xml.push_str(&format!(r#"<c r="{cell_ref}" t="s"><v>{i}</v></c>"#));
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

/// `0 -> A`, `25 -> Z`, `26 -> AA`.
fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Drops control characters XML 1.0 cannot carry.
fn xml_safe(value: &str) -> String {
    value
        .chars()
        .filter(|&c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        escape(xml_safe(sheet_name).as_str())
    )
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
    <Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
</Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>
</Relationships>"#;
