//! Column outline levels from the worksheet XML.
//!
//! calamine exposes values and merged cells but not column grouping, so the
//! `<cols><col min=".." max=".." outlineLevel=".."/></cols>` block is read
//! straight from the package. The worksheet part is found through
//! `xl/workbook.xml` and its relationships.

use crate::error::FlattenResult;
use crate::types::OutlineSpan;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

/// Outline spans of `sheet`; empty when the sheet has no column grouping.
pub fn read_column_outline(path: &Path, sheet: &str) -> FlattenResult<Vec<OutlineSpan>> {
    let file = File::open(path)?;
    let mut zip = ZipArchive::new(BufReader::new(file))?;

    let Some(part) = worksheet_part(&mut zip, sheet)? else {
        debug!(sheet, "no worksheet part found; assuming no column outline");
        return Ok(Vec::new());
    };
    match read_part(&mut zip, &part)? {
        Some(xml) => parse_column_outline(&xml),
        None => Ok(Vec::new()),
    }
}

/// Parse `<col>` outline entries from worksheet XML
pub fn parse_column_outline(xml: &str) -> FlattenResult<Vec<OutlineSpan>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut spans = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"col" => {
                    if let Some(span) = parse_col(&e)? {
                        spans.push(span);
                    }
                }
                // <cols> always precedes the cell data
                b"sheetData" => break,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(spans)
}

fn parse_col(e: &BytesStart<'_>) -> FlattenResult<Option<OutlineSpan>> {
    let mut min = None;
    let mut max = None;
    let mut level = 0u8;
    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.local_name().as_ref() {
            b"min" => min = parse_number(&attr.value),
            b"max" => max = parse_number(&attr.value),
            b"outlineLevel" => level = parse_number(&attr.value).unwrap_or(0),
            _ => {}
        }
    }
    match (min, max) {
        (Some(min), Some(max)) if level > 0 => Ok(Some(OutlineSpan::new(min, max, level))),
        _ => Ok(None),
    }
}

fn parse_number<T: std::str::FromStr>(value: &[u8]) -> Option<T> {
    std::str::from_utf8(value).ok()?.trim().parse().ok()
}

/// Zip path of the worksheet named `sheet`
fn worksheet_part<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    sheet: &str,
) -> FlattenResult<Option<String>> {
    let Some(rels_xml) = read_part(zip, WORKBOOK_RELS_PART)? else {
        return Ok(None);
    };
    let Some(workbook_xml) = read_part(zip, WORKBOOK_PART)? else {
        return Ok(None);
    };
    let relationships = parse_relationships(&rels_xml)?;
    let sheets = parse_sheet_ids(&workbook_xml)?;
    Ok(sheets
        .into_iter()
        .find(|(name, _)| name == sheet)
        .and_then(|(_, id)| relationships.get(&id).cloned()))
}

/// Relationship id → zip path
fn parse_relationships(xml: &str) -> FlattenResult<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut relationships = HashMap::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.local_name().as_ref() {
                        b"Id" => id = Some(attr.unescape_value()?.into_owned()),
                        b"Target" => target = Some(attr.unescape_value()?.into_owned()),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    relationships.insert(id, to_zip_path(&target));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(relationships)
}

/// `(sheet name, relationship id)` pairs in workbook order
fn parse_sheet_ids(xml: &str) -> FlattenResult<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut sheets = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut id = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.local_name().as_ref() {
                        b"name" => name = Some(attr.unescape_value()?.into_owned()),
                        b"id" => id = Some(attr.unescape_value()?.into_owned()),
                        _ => {}
                    }
                }
                if let (Some(name), Some(id)) = (name, id) {
                    sheets.push((name, id));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(sheets)
}

/// Relationship targets are relative to `xl/` unless absolute
fn to_zip_path(target: &str) -> String {
    let target = target.replace('\\', "/");
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    };
    let mut parts: Vec<&str> = Vec::new();
    for part in joined.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Read a package part by name, ignoring case; `None` if it does not exist
fn read_part<R: Read + Seek>(zip: &mut ZipArchive<R>, name: &str) -> FlattenResult<Option<String>> {
    let Some(actual) = zip
        .file_names()
        .find(|file_name| file_name.eq_ignore_ascii_case(name))
        .map(str::to_owned)
    else {
        return Ok(None);
    };
    let mut file = match zip.by_name(&actual) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(Some(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_column_outline() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <cols>
    <col min="1" max="1" width="30" customWidth="1"/>
    <col min="2" max="4" width="12" outlineLevel="1"/>
    <col min="5" max="5" width="12" outlineLevel="2" hidden="1"/>
  </cols>
  <sheetData><row r="1"><c r="A1"><v>1</v></c></row></sheetData>
</worksheet>"#;
        assert_eq!(
            parse_column_outline(xml).unwrap(),
            vec![OutlineSpan::new(2, 4, 1), OutlineSpan::new(5, 5, 2)]
        );
    }

    #[test]
    fn test_parse_column_outline_without_cols() {
        let xml = r#"<worksheet><sheetData/></worksheet>"#;
        assert!(parse_column_outline(xml).unwrap().is_empty());
    }

    #[test]
    fn test_parse_relationships_and_sheets() {
        let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet2.xml"/>
</Relationships>"#;
        let workbook = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Contents" sheetId="1" r:id="rId1"/>
    <sheet name="Table 1 &amp; 2" sheetId="2" r:id="rId2"/>
  </sheets>
</workbook>"#;
        let relationships = parse_relationships(rels).unwrap();
        assert_eq!(relationships["rId1"], "xl/worksheets/sheet1.xml");
        assert_eq!(relationships["rId2"], "xl/worksheets/sheet2.xml");
        assert_eq!(
            parse_sheet_ids(workbook).unwrap(),
            vec![
                ("Contents".to_string(), "rId1".to_string()),
                ("Table 1 & 2".to_string(), "rId2".to_string()),
            ]
        );
    }

    #[test]
    fn test_to_zip_path() {
        assert_eq!(to_zip_path("worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(to_zip_path("/xl/worksheets/sheet3.xml"), "xl/worksheets/sheet3.xml");
        assert_eq!(to_zip_path("../xl/worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
    }
}
