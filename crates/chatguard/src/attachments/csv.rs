use super::table::Table;
use crate::errors::{ChatError, ChatResult};

pub fn parse(name: &str, bytes: &[u8]) -> ChatResult<Table> {
    let text = std::str::from_utf8(bytes).map_err(|e| ChatError::MalformedAttachment {
        name: name.to_string(),
        reason: format!("not valid UTF-8: {}", e),
    })?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let records = split_records(text);
    if records.is_empty() {
        return Err(ChatError::MalformedAttachment {
            name: name.to_string(),
            reason: "no columns to parse".to_string(),
        });
    }
    Ok(Table::from_records(records))
}

/// Quote-aware record splitter. Quoted fields may hold commas, doubled quotes and line
/// breaks; blank lines between records are dropped.
fn split_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => finish_record(&mut records, &mut record, &mut field),
            _ => field.push(c),
        }
    }
    finish_record(&mut records, &mut record, &mut field);
    records
}

fn finish_record(records: &mut Vec<Vec<String>>, record: &mut Vec<String>, field: &mut String) {
    record.push(std::mem::take(field));
    let line = std::mem::take(record);
    let blank = line.len() == 1 && line[0].trim().is_empty();
    if !blank {
        records.push(line);
    }
}
