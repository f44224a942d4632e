//! Checks an uploaded resume file before anything is stored.

use serde::{Deserialize, Serialize};

use crate::resumes::errors::ResumeError;

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
pub const MAX_FILENAME_LENGTH: usize = 255;
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "docx", "doc"];
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/msword",
];

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    /// Word documents, both `.docx` and legacy `.doc`.
    Docx,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCheck {
    pub original_filename: String,
    pub file_type: FileType,
    pub file_size: usize,
}

fn extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Maps a filename to its resume file type by extension.
pub fn detect_file_type(filename: &str) -> Result<FileType, ResumeError> {
    match extension(filename).as_deref() {
        Some("pdf") => Ok(FileType::Pdf),
        Some("docx") | Some("doc") => Ok(FileType::Docx),
        Some(other) => Err(ResumeError::file_processing(format!(
            "Unsupported file type '.{other}'. Please upload a PDF or DOCX file."
        ))),
        None => Err(ResumeError::file_processing(
            "File has no extension. Please upload a PDF or DOCX file.",
        )),
    }
}

fn signature_matches(filename: &str, bytes: &[u8]) -> bool {
    match extension(filename).as_deref() {
        Some("pdf") => bytes.starts_with(PDF_MAGIC),
        Some("docx") => bytes.starts_with(ZIP_MAGIC),
        Some("doc") => bytes.starts_with(OLE_MAGIC),
        _ => false,
    }
}

/// Validates name, size, declared content type and leading bytes.
pub fn validate_resume_file(
    filename: &str,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<FileCheck, ResumeError> {
    let filename = filename.trim();
    if filename.is_empty() {
        return Err(ResumeError::file_processing("No file name was provided."));
    }
    if filename.chars().count() > MAX_FILENAME_LENGTH {
        return Err(ResumeError::validation(format!(
            "File name must be at most {MAX_FILENAME_LENGTH} characters."
        )));
    }
    if bytes.is_empty() {
        return Err(ResumeError::file_processing("The submitted file is empty."));
    }
    if bytes.len() > MAX_FILE_SIZE {
        return Err(ResumeError::file_processing(
            "Invalid file. Please upload a PDF or DOCX file under 10MB.",
        ));
    }

    let file_type = detect_file_type(filename)?;

    if let Some(mime) = content_type {
        let mime = mime.split(';').next().unwrap_or_default().trim();
        if mime != "application/octet-stream" && !ALLOWED_MIME_TYPES.contains(&mime) {
            return Err(ResumeError::file_processing(format!(
                "Unsupported content type '{mime}'."
            )));
        }
    }

    if !signature_matches(filename, bytes) {
        return Err(ResumeError::file_processing(format!(
            "File content does not match a {} document.",
            file_type.as_str().to_uppercase()
        )));
    }

    Ok(FileCheck {
        original_filename: filename.to_string(),
        file_type,
        file_size: bytes.len(),
    })
}
