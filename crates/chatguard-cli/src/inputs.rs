use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chatguard::attachments::{mime_type_for_name, Attachment};

/// Read a file from disk, declaring its MIME type from the extension
pub fn load_attachment(path: &Path) -> Result<Attachment> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = mime_type_for_name(&name);
    Ok(Attachment::new(name, mime_type, bytes))
}

pub fn load_attachments(paths: &[PathBuf]) -> Result<Vec<Attachment>> {
    paths.iter().map(|p| load_attachment(p)).collect()
}
