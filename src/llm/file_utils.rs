use anyhow::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fs;
use std::path::Path;

/// Inline request payloads above this size are rejected by the Gemini API.
pub const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// A file read from disk, ready to become a material.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
}

/// Read a file for upload, inferring its MIME type from the extension.
pub fn read_upload(path: &Path) -> Result<Upload> {
    if !path.exists() {
        return Err(anyhow::anyhow!("File does not exist: {}", path.display()));
    }

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name"))?
        .to_string();

    let metadata = fs::metadata(path)?;
    if metadata.len() > MAX_UPLOAD_BYTES {
        return Err(anyhow::anyhow!("File too large: {} bytes", metadata.len()));
    }

    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    let mime_type = get_mime_type_from_extension(extension);

    Ok(Upload {
        file_name,
        mime_type,
        bytes: fs::read(path)?,
    })
}

pub fn to_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// The base64 payload of a data URI: everything after the first comma.
/// Strings without a comma are taken to be raw base64 already.
pub fn data_uri_payload(data: &str) -> &str {
    match data.split_once(',') {
        Some((_, payload)) => payload,
        None => data,
    }
}

/// Get MIME type from file extension
pub fn get_mime_type_from_extension(extension: &str) -> String {
    match extension.to_lowercase().as_str() {
        "txt" | "log" => "text/plain".to_string(),
        "md" => "text/markdown".to_string(),
        "json" => "application/json".to_string(),
        "xml" => "application/xml".to_string(),
        "csv" => "text/csv".to_string(),
        "yaml" | "yml" => "text/yaml".to_string(),
        "html" | "htm" => "text/html".to_string(),
        "jpg" | "jpeg" => "image/jpeg".to_string(),
        "png" => "image/png".to_string(),
        "gif" => "image/gif".to_string(),
        "bmp" => "image/bmp".to_string(),
        "webp" => "image/webp".to_string(),
        "svg" => "image/svg+xml".to_string(),
        "heic" => "image/heic".to_string(),
        "pdf" => "application/pdf".to_string(),
        "doc" => "application/msword".to_string(),
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document".to_string(),
        "xls" => "application/vnd.ms-excel".to_string(),
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
        "ppt" => "application/vnd.ms-powerpoint".to_string(),
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation".to_string(),
        _ => "application/octet-stream".to_string(),
    }
}
