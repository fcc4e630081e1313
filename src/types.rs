//! Core types for order evidence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Whether a body is HTML markup or plain text
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    Html,
    #[default]
    Text,
}

impl BodyType {
    /// Pick the body type from a MIME type such as `text/html`
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        if mime.to_lowercase().contains("html") {
            Self::Html
        } else {
            Self::Text
        }
    }
}

/// An email body as delivered by the mailbox collaborator
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawEmail {
    /// Raw body (HTML or text)
    pub body: String,

    /// How `body` is encoded
    pub body_type: BodyType,
}

impl RawEmail {
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            body_type: BodyType::Html,
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            body_type: BodyType::Text,
        }
    }
}

/// Kind of a contiguous email body span
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Plain,
    Quote,
    ForwardHeader,
    Signature,
    Greeting,
}

impl SegmentKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Quote => "quote",
            Self::ForwardHeader => "forward_header",
            Self::Signature => "signature",
            Self::Greeting => "greeting",
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed span of an email body, in reading order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailSegment {
    #[serde(rename = "type")]
    pub kind: SegmentKind,

    /// Trimmed segment text
    pub content: String,

    /// Sender named in a forwarded block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Date named in a forwarded block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl EmailSegment {
    pub fn new(kind: SegmentKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            from: None,
            date: None,
        }
    }
}

/// A header-keyed spreadsheet row; keys keep sheet column order
pub type Record = Map<String, Value>;

/// One table row, either positional cells or a header-keyed record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TableRow {
    Cells(Vec<String>),
    Record(Record),
}

impl TableRow {
    /// Render the row's values in header order when keyed, else positionally
    #[must_use]
    pub fn values(&self, headers: Option<&[String]>) -> Vec<String> {
        match (self, headers) {
            (Self::Cells(cells), _) => cells.clone(),
            (Self::Record(record), Some(headers)) => headers
                .iter()
                .map(|h| record.get(h).map(display_value).unwrap_or_default())
                .collect(),
            (Self::Record(record), None) => record.values().map(display_value).collect(),
        }
    }
}

/// Plain display of a cell value, without JSON string quoting
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A table found in a document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Table {
    /// Used range in A1 notation (spreadsheets only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,

    pub rows: Vec<TableRow>,
}

impl Table {
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Text and tables for one PDF page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PdfPageEvidence {
    /// 1-based page number
    pub page_number: u32,

    pub text: String,

    #[serde(default)]
    pub tables: Vec<Table>,

    /// True when `text` came from an even character split rather than
    /// real page boundaries
    #[serde(default)]
    pub approximate: bool,
}

/// All pages of one PDF attachment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PdfEvidence {
    pub attachment_id: Uuid,
    pub filename: String,
    pub pages: Vec<PdfPageEvidence>,
}

/// Detected shape of a sheet
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SheetLayout {
    #[default]
    Tabular,
    /// Two columns, labels in the first
    KeyValue,
}

/// Tables of one worksheet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExcelSheetEvidence {
    pub name: String,

    #[serde(default)]
    pub tables: Vec<Table>,

    /// First few records, for a quick overview
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cells_sample: Option<Vec<Record>>,

    #[serde(default)]
    pub layout: SheetLayout,
}

/// All sheets of one spreadsheet attachment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExcelEvidence {
    pub attachment_id: Uuid,
    pub filename: String,
    pub sheets: Vec<ExcelSheetEvidence>,
}

/// Segmented email body
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailEvidence {
    pub segments: Vec<EmailSegment>,
}

/// Summary of how cleanly a pack was parsed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParseQuality {
    /// 0.0 (unusable) to 1.0 (no errors)
    pub score: f64,

    #[serde(default)]
    pub errors: Vec<String>,
}

/// Canonical evidence for one order. Never mutated after assembly; a new
/// parse produces a new pack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvidencePack {
    pub id: Uuid,
    pub order_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub email: EmailEvidence,

    #[serde(default)]
    pub pdfs: Vec<PdfEvidence>,

    #[serde(default)]
    pub excels: Vec<ExcelEvidence>,

    pub parse_quality: ParseQuality,
}

/// Attachment metadata from the storage collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentMeta {
    pub id: Uuid,
    pub filename: String,
    pub mime_type: String,

    /// Where the bytes live, relative to the store root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,

    #[serde(default)]
    pub size_bytes: u64,
}

impl AttachmentMeta {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            mime_type: mime_type.into(),
            storage_path: None,
            size_bytes: 0,
        }
    }

    #[must_use]
    pub fn with_storage_path(mut self, path: impl Into<String>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Route the attachment by MIME type, falling back to the file extension
    #[must_use]
    pub fn kind(&self) -> AttachmentKind {
        AttachmentKind::detect(&self.filename, &self.mime_type)
    }
}

/// Parser an attachment is routed to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Pdf,
    Spreadsheet,
    Unsupported,
}

impl AttachmentKind {
    #[must_use]
    pub fn detect(filename: &str, mime_type: &str) -> Self {
        let mime = mime_type.to_lowercase();
        let name = filename.to_lowercase();

        if mime == "application/pdf" || name.ends_with(".pdf") {
            Self::Pdf
        } else if mime.contains("spreadsheet")
            || mime.contains("excel")
            || name.ends_with(".xlsx")
            || name.ends_with(".xls")
        {
            Self::Spreadsheet
        } else {
            Self::Unsupported
        }
    }
}

/// Outcome of parsing one attachment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParseState {
    Parsed,
    Error,
    Skipped,
}

/// Per-attachment parse report, for the storage collaborator to record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentStatus {
    pub attachment_id: Uuid,
    pub filename: String,
    pub state: ParseState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
