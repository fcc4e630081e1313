//! Error types for evidence parsing

use thiserror::Error;

/// Errors that can occur while building evidence for an order
#[derive(Error, Debug)]
pub enum EvidenceError {
    /// Failed to decode a raw email structure
    #[error("Failed to parse email structure: {0}")]
    Structure(String),

    /// An attachment could not be read or decoded
    #[error("{filename}: {reason}")]
    Attachment { filename: String, reason: String },

    /// Filesystem access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF structure could not be loaded
    #[error("Failed to load PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    /// PDF text extraction failed
    #[error("Failed to extract PDF text: {0}")]
    PdfText(String),

    /// Workbook could not be opened or a sheet could not be read
    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// The assembled evidence pack violates its shape
    #[error("Invalid evidence pack: {0}")]
    InvalidPack(String),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No extraction schema registered for the order type
    #[error("Unknown order type \"{requested}\". Available: {available}")]
    UnknownOrderType { requested: String, available: String },

    /// An extraction result does not satisfy its order type
    #[error("Invalid extraction result: {0}")]
    InvalidExtraction(String),

    /// Configuration could not be loaded
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl EvidenceError {
    /// Build an attachment-level error for `filename`
    pub fn attachment(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Attachment {
            filename: filename.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for evidence operations
pub type Result<T> = std::result::Result<T, EvidenceError>;
