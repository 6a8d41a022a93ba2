//! Turns uploaded tabular files into text the model can read.
//!
//! Two formats are understood, each identified by exactly one MIME type. Anything else
//! is skipped with a warning; it never aborts the rest of the upload.
pub mod csv;
pub mod table;
pub mod workbook;

use serde::{Deserialize, Serialize};

use crate::errors::{ChatError, ChatResult};
use table::Table;

pub const CSV_MIME_TYPE: &str = "text/csv";
pub const WORKBOOK_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentFormat {
    Csv,
    Workbook,
}

impl AttachmentFormat {
    pub fn from_mime(mime_type: &str) -> ChatResult<Self> {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        match essence.as_str() {
            CSV_MIME_TYPE => Ok(AttachmentFormat::Csv),
            WORKBOOK_MIME_TYPE => Ok(AttachmentFormat::Workbook),
            _ => Err(ChatError::UnsupportedFormat(mime_type.to_string())),
        }
    }
}

/// MIME type to declare for a file name, based on its extension
pub fn mime_type_for_name(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "csv" => CSV_MIME_TYPE,
        "xlsx" => WORKBOOK_MIME_TYPE,
        _ => UNKNOWN_MIME_TYPE,
    }
}

/// An uploaded file: raw bytes plus the MIME type the uploader declared
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new<N: Into<String>, M: Into<String>>(name: N, mime_type: M, bytes: Vec<u8>) -> Self {
        Attachment {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn format(&self) -> ChatResult<AttachmentFormat> {
        AttachmentFormat::from_mime(&self.mime_type)
    }

    pub fn to_table(&self) -> ChatResult<Table> {
        match self.format()? {
            AttachmentFormat::Csv => csv::parse(&self.name, &self.bytes),
            AttachmentFormat::Workbook => workbook::parse(&self.name, &self.bytes),
        }
    }

    pub fn flatten(&self) -> ChatResult<String> {
        Ok(self.to_table()?.render())
    }
}

/// Combined text of every readable attachment of one submission
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttachmentDigest {
    pub text: Option<String>,
    pub warnings: Vec<String>,
}

pub fn digest_attachments(attachments: &[Attachment]) -> AttachmentDigest {
    let mut parts = Vec::new();
    let mut warnings = Vec::new();

    for attachment in attachments {
        match attachment.flatten() {
            Ok(text) => parts.push(text),
            Err(e) => {
                tracing::warn!(file = %attachment.name, error = %e, "skipping attachment");
                warnings.push(e.to_string());
            }
        }
    }

    let text = if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    };
    AttachmentDigest { text, warnings }
}
