//! Minimal reader for OOXML spreadsheet workbooks (`.xlsx`).
//!
//! Only the first worksheet is read. Cell values come from the shared string table,
//! inline strings, or the raw `<v>` value for numbers and booleans. Formatting, formulas
//! and dates are not interpreted.
use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use lazy_static::lazy_static;
use regex::Regex;
use zip::ZipArchive;

use super::table::Table;
use crate::errors::{ChatError, ChatResult};

const SHARED_STRINGS_PATH: &str = "xl/sharedStrings.xml";
const MAX_COLUMNS: usize = 16_384;
const MAX_ROWS: usize = 1_048_576;
const MAX_CELLS: usize = 4_000_000;

lazy_static! {
    static ref SHEET_PATH: Regex = Regex::new(r"^xl/worksheets/sheet(\d+)\.xml$").unwrap();
    static ref SHARED_ITEM: Regex = Regex::new(r"(?s)<si(?:\s[^>]*)?>(.*?)</si>").unwrap();
    static ref TEXT_RUN: Regex = Regex::new(r"(?s)<t(?:\s[^>]*)?>(.*?)</t>").unwrap();
    static ref ROW: Regex = Regex::new(r"(?s)<row\b([^>]*?)(?:/>|>(.*?)</row>)").unwrap();
    static ref CELL: Regex = Regex::new(r"(?s)<c\b([^>]*?)(?:/>|>(.*?)</c>)").unwrap();
    static ref VALUE: Regex = Regex::new(r"(?s)<v(?:\s[^>]*)?>(.*?)</v>").unwrap();
    static ref ATTR_REF: Regex = Regex::new(r#"\br="([A-Z]*)(\d*)""#).unwrap();
    static ref ATTR_TYPE: Regex = Regex::new(r#"\bt="([A-Za-z]+)""#).unwrap();
}

pub fn parse(name: &str, bytes: &[u8]) -> ChatResult<Table> {
    let malformed = |reason: String| ChatError::MalformedAttachment {
        name: name.to_string(),
        reason,
    };

    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| malformed(format!("not a workbook archive: {}", e)))?;

    let names = (0..archive.len())
        .filter_map(|index| archive.by_index(index).ok().map(|entry| entry.name().to_string()))
        .collect::<Vec<_>>();

    let sheet = first_sheet(&names).ok_or_else(|| malformed("workbook has no worksheets".into()))?;

    let shared = if names.iter().any(|n| n == SHARED_STRINGS_PATH) {
        let xml = read_entry(&mut archive, SHARED_STRINGS_PATH).map_err(&malformed)?;
        shared_strings(&xml)
    } else {
        Vec::new()
    };

    let xml = read_entry(&mut archive, &sheet).map_err(&malformed)?;
    let records = sheet_records(&xml, &shared).map_err(&malformed)?;
    if records.is_empty() {
        return Err(malformed("first worksheet is empty".into()));
    }
    Ok(Table::from_records(records))
}

fn first_sheet(names: &[String]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| {
            let number = SHEET_PATH.captures(name)?.get(1)?.as_str().parse::<u32>().ok()?;
            Some((number, name))
        })
        .min_by_key(|(number, _)| *number)
        .map(|(_, name)| name.clone())
}

fn read_entry(archive: &mut ZipArchive<Cursor<&[u8]>>, path: &str) -> Result<String, String> {
    let mut entry = archive
        .by_name(path)
        .map_err(|e| format!("failed to open {}: {}", path, e))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| format!("failed to read {}: {}", path, e))?;
    Ok(xml)
}

fn shared_strings(xml: &str) -> Vec<String> {
    SHARED_ITEM
        .captures_iter(xml)
        .map(|item| joined_text(item.get(1).map_or("", |m| m.as_str())))
        .collect()
}

/// Concatenate every `<t>` run, which covers both plain and rich-text strings
fn joined_text(xml: &str) -> String {
    TEXT_RUN
        .captures_iter(xml)
        .filter_map(|run| run.get(1))
        .map(|m| decode_xml_entities(m.as_str()))
        .collect()
}

/// Rows are placed by their `r` attribute. Blank rows between the first and last
/// populated row are kept as empty rows so numbering matches the sheet.
fn sheet_records(xml: &str, shared: &[String]) -> Result<Vec<Vec<String>>, String> {
    let mut rows: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    let mut next_row = 1;
    let mut width = 0;

    for row in ROW.captures_iter(xml) {
        let attrs = row.get(1).map_or("", |m| m.as_str());
        let row_number = match ATTR_REF.captures(attrs).and_then(|c| c.get(2)) {
            Some(m) if !m.as_str().is_empty() => m
                .as_str()
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=MAX_ROWS).contains(n))
                .ok_or_else(|| format!("row {} is outside the sheet", m.as_str()))?,
            _ => next_row,
        };
        next_row = row_number + 1;

        let mut cells: Vec<String> = Vec::new();
        let body = row.get(2).map_or("", |m| m.as_str());
        for cell in CELL.captures_iter(body) {
            let attrs = cell.get(1).map_or("", |m| m.as_str());
            let column = match ATTR_REF.captures(attrs).and_then(|c| c.get(1)) {
                Some(m) if !m.as_str().is_empty() => column_index(m.as_str())
                    .ok_or_else(|| format!("column {} is outside the sheet", m.as_str()))?,
                _ => cells.len(),
            };
            if column >= MAX_COLUMNS {
                return Err(format!("row {} has more than {} columns", row_number, MAX_COLUMNS));
            }
            let value = cell_value(attrs, cell.get(2).map_or("", |m| m.as_str()), shared);

            if cells.len() <= column {
                cells.resize(column + 1, String::new());
            }
            cells[column] = value;
        }

        if cells.iter().any(|c| !c.is_empty()) {
            width = width.max(cells.len());
            rows.insert(row_number, cells);
        }
    }

    let (first, last) = match (rows.keys().next(), rows.keys().next_back()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Ok(Vec::new()),
    };
    let span = last - first + 1;
    if span.saturating_mul(width) > MAX_CELLS {
        return Err(format!(
            "first worksheet spans {} rows by {} columns, more than {} cells",
            span, width, MAX_CELLS
        ));
    }

    Ok((first..=last)
        .map(|number| rows.remove(&number).unwrap_or_default())
        .collect())
}

fn cell_value(attrs: &str, body: &str, shared: &[String]) -> String {
    let kind = ATTR_TYPE
        .captures(attrs)
        .and_then(|c| c.get(1))
        .map_or("n", |m| m.as_str());
    let raw = VALUE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| decode_xml_entities(m.as_str()));

    match kind {
        "s" => raw
            .and_then(|v| v.trim().parse::<usize>().ok())
            .and_then(|i| shared.get(i).cloned())
            .unwrap_or_default(),
        "inlineStr" => joined_text(body),
        "b" => match raw.as_deref().map(str::trim) {
            Some("1") => "TRUE".to_string(),
            Some("0") => "FALSE".to_string(),
            _ => String::new(),
        },
        _ => raw.unwrap_or_default(),
    }
}

/// `A` -> 0, `Z` -> 25, `AA` -> 26. `None` past `XFD`, the last column a sheet can have.
fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut index = 0usize;
    for ch in letters.chars() {
        if !ch.is_ascii_uppercase() {
            return None;
        }
        index = index
            .checked_mul(26)?
            .checked_add(ch as usize - 'A' as usize + 1)?;
    }
    Some(index - 1).filter(|&i| i < MAX_COLUMNS)
}

fn decode_xml_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
