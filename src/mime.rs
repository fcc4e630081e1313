//! Raw RFC 5322 message decoding into an email record plus attachments

use crate::error::{EvidenceError, Result};
use crate::store::MemoryAttachmentStore;
use crate::types::{AttachmentMeta, BodyType, RawEmail};
use chrono::{DateTime, Utc};
use mailparse::{DispositionType, MailHeader, ParsedMail};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// A decoded inbound message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingEmail {
    /// Message-ID header, if any
    pub message_id: Option<String>,

    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub received_at: DateTime<Utc>,

    /// Preferred body: plain text when present, HTML otherwise
    pub body: RawEmail,

    pub attachments: Vec<IncomingAttachment>,

    /// Attachment parts that could not be decoded, as `"<filename>: <reason>"`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachment_errors: Vec<String>,

    /// SHA-256 of the Message-ID (or of the raw bytes without one), used as
    /// an idempotency key by the storage collaborator
    pub content_hash: String,
}

/// An attachment cut out of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingAttachment {
    pub filename: String,
    pub mime_type: String,

    #[serde(skip)]
    pub content: Vec<u8>,

    /// SHA-256 of `content`
    pub content_hash: String,
}

impl IncomingEmail {
    /// Attachment metadata in arrival order, with an in-memory store holding
    /// their bytes
    #[must_use]
    pub fn attachment_store(&self) -> (Vec<AttachmentMeta>, MemoryAttachmentStore) {
        let mut store = MemoryAttachmentStore::default();
        let metas = self
            .attachments
            .iter()
            .map(|attachment| {
                let mut meta = AttachmentMeta::new(&attachment.filename, &attachment.mime_type);
                meta.size_bytes = attachment.content.len() as u64;
                store.insert(meta.id, attachment.content.clone());
                meta
            })
            .collect();
        (metas, store)
    }
}

/// Lowercase hex SHA-256
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Parse raw message bytes
pub fn parse_raw_email(raw: &[u8]) -> Result<IncomingEmail> {
    let parsed = mailparse::parse_mail(raw).map_err(|e| EvidenceError::Structure(e.to_string()))?;

    let message_id = header_value(&parsed.headers, "message-id");
    let from = header_value(&parsed.headers, "from")
        .ok_or_else(|| EvidenceError::Structure("Missing required header: From".into()))?;
    let subject =
        header_value(&parsed.headers, "subject").unwrap_or_else(|| "(no subject)".to_string());
    let received_at = extract_date(&parsed.headers);

    let (text, html) = extract_body_parts(&parsed);
    let body = match html {
        Some(html) if text.trim().is_empty() => RawEmail::html(html),
        _ => RawEmail::text(text),
    };

    let mut attachments = Vec::new();
    let mut attachment_errors = Vec::new();
    collect_attachments(&parsed, &mut attachments, &mut attachment_errors);

    let content_hash = message_id
        .as_deref()
        .map_or_else(|| sha256_hex(raw), |id| sha256_hex(id.as_bytes()));

    debug!(
        %subject,
        %from,
        attachments = attachments.len(),
        "Decoded raw email"
    );

    Ok(IncomingEmail {
        message_id,
        to: extract_addresses(&parsed.headers, "to"),
        cc: extract_addresses(&parsed.headers, "cc"),
        from,
        subject,
        received_at,
        body,
        attachments,
        attachment_errors,
        content_hash,
    })
}

fn header_value(headers: &[MailHeader], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|h| h.get_key().eq_ignore_ascii_case(name))
        .map(MailHeader::get_value)
}

fn extract_addresses(headers: &[MailHeader], name: &str) -> Vec<String> {
    header_value(headers, name)
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|addr| !addr.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn extract_date(headers: &[MailHeader]) -> DateTime<Utc> {
    header_value(headers, "date")
        .and_then(|value| DateTime::parse_from_rfc2822(&value).ok())
        .map_or_else(Utc::now, |dt| dt.with_timezone(&Utc))
}

fn is_attachment(part: &ParsedMail) -> bool {
    let disposition = part.get_content_disposition();
    disposition.disposition == DispositionType::Attachment
        || (part.subparts.is_empty()
            && attachment_filename(part).is_some()
            && !part.ctype.mimetype.to_lowercase().starts_with("text/"))
}

fn attachment_filename(part: &ParsedMail) -> Option<String> {
    part.get_content_disposition()
        .params
        .get("filename")
        .or_else(|| part.ctype.params.get("name"))
        .cloned()
}

fn extract_body_parts(parsed: &ParsedMail) -> (String, Option<String>) {
    let mut text = String::new();
    let mut html: Option<String> = None;

    if parsed.subparts.is_empty() {
        // A single-part message may itself be the attachment
        if !is_attachment(parsed)
            && let Ok(body) = parsed.get_body()
        {
            match BodyType::from_mime(&parsed.ctype.mimetype) {
                BodyType::Html => html = Some(body),
                BodyType::Text => text = body,
            }
        }
    } else {
        extract_body_recursive(parsed, &mut text, &mut html);
    }

    (text, html)
}

fn extract_body_recursive(parsed: &ParsedMail, text: &mut String, html: &mut Option<String>) {
    for part in &parsed.subparts {
        if is_attachment(part) {
            continue;
        }

        if part.subparts.is_empty() {
            let content_type = part.ctype.mimetype.to_lowercase();
            if let Ok(body) = part.get_body() {
                if content_type.contains("text/plain") && text.is_empty() {
                    *text = body;
                } else if content_type.contains("text/html") && html.is_none() {
                    *html = Some(body);
                }
            }
        } else {
            extract_body_recursive(part, text, html);
        }
    }
}

fn collect_attachments(
    part: &ParsedMail,
    out: &mut Vec<IncomingAttachment>,
    errors: &mut Vec<String>,
) {
    if !part.subparts.is_empty() {
        for sub in &part.subparts {
            collect_attachments(sub, out, errors);
        }
        return;
    }
    if !is_attachment(part) {
        return;
    }

    let filename =
        attachment_filename(part).unwrap_or_else(|| format!("attachment-{}", out.len() + 1));
    match part.get_body_raw() {
        Ok(content) => out.push(IncomingAttachment {
            content_hash: sha256_hex(&content),
            mime_type: part.ctype.mimetype.to_lowercase(),
            filename,
            content,
        }),
        Err(e) => {
            warn!(%filename, error = %e, "Undecodable attachment part");
            errors.push(format!("{filename}: {e}"));
        }
    }
}
