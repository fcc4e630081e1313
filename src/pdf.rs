//! PDF text to per-page evidence

use crate::error::{EvidenceError, Result};
use crate::table::detect_tables;
use crate::types::{AttachmentMeta, PdfEvidence, PdfPageEvidence};
use lopdf::Document;
use std::iter;
use tracing::{debug, warn};

/// Text pulled out of a PDF by an extraction backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPdf {
    /// Whole-document text
    pub text: String,

    /// Page count reported by the backend
    pub page_count: u32,

    /// Per-page texts, when the backend knows real page boundaries
    pub page_texts: Option<Vec<String>>,
}

impl ExtractedPdf {
    /// Concatenated text only, no page boundaries
    pub fn concatenated(text: impl Into<String>, page_count: u32) -> Self {
        Self {
            text: text.into(),
            page_count,
            page_texts: None,
        }
    }
}

/// Backend that turns PDF bytes into text. The core never reads the PDF
/// format itself.
pub trait PdfTextSource {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedPdf>;
}

/// Default backend: `lopdf` for the page tree, `pdf-extract` for text
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfTextSource;

impl PdfTextSource for LopdfTextSource {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedPdf> {
        let document = Document::load_mem(bytes)?;
        let page_count = u32::try_from(document.get_pages().len()).unwrap_or(u32::MAX);

        let pieces = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| EvidenceError::PdfText(e.to_string()))?;

        // Per-page extraction stops at the first page it cannot read
        if pieces.len() == page_count as usize {
            return Ok(ExtractedPdf {
                text: pieces.concat(),
                page_count,
                page_texts: Some(pieces),
            });
        }

        debug!(
            page_count,
            readable = pieces.len(),
            "Per-page text incomplete, extracting whole document"
        );
        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| EvidenceError::PdfText(e.to_string()))?;

        Ok(ExtractedPdf::concatenated(text, page_count))
    }
}

/// Split concatenated text into `page_count` pages.
///
/// One page (or a reported count of zero) keeps the text whole. Otherwise the
/// text is cut into contiguous slices of `ceil(chars / page_count)`
/// characters, flagged `approximate`; the last slices may be empty. Slice
/// boundaries are not real page boundaries.
#[must_use]
pub fn split_pages(text: &str, page_count: u32) -> Vec<PdfPageEvidence> {
    if page_count <= 1 {
        return vec![page(1, text.to_string(), false)];
    }

    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(iter::once(text.len()))
        .collect();
    let char_count = offsets.len() - 1;
    let slice_len = char_count.div_ceil(page_count as usize);

    (1..=page_count)
        .zip(0_usize..)
        .map(|(number, index)| {
            let start = offsets[(index * slice_len).min(char_count)];
            let end = offsets[((index + 1) * slice_len).min(char_count)];
            page(number, text[start..end].to_string(), true)
        })
        .collect()
}

/// Pages for an extraction result, preferring real page boundaries
#[must_use]
pub fn pages_from_extraction(extracted: &ExtractedPdf) -> Vec<PdfPageEvidence> {
    match &extracted.page_texts {
        Some(texts) if texts.len() == extracted.page_count.max(1) as usize => (1..)
            .zip(texts)
            .map(|(number, text)| page(number, text.clone(), false))
            .collect(),
        Some(texts) => {
            warn!(
                reported = extracted.page_count,
                found = texts.len(),
                "Page texts do not match page count, splitting evenly"
            );
            split_pages(&extracted.text, extracted.page_count)
        }
        None => split_pages(&extracted.text, extracted.page_count),
    }
}

fn page(page_number: u32, text: String, approximate: bool) -> PdfPageEvidence {
    let tables = detect_tables(&text);
    PdfPageEvidence {
        page_number,
        text,
        tables,
        approximate,
    }
}

/// Parse one PDF attachment into evidence
pub fn parse_pdf(
    source: &dyn PdfTextSource,
    meta: &AttachmentMeta,
    bytes: &[u8],
) -> Result<PdfEvidence> {
    let extracted = source.extract(bytes)?;
    let pages = pages_from_extraction(&extracted);

    debug!(
        filename = %meta.filename,
        pages = pages.len(),
        tables = pages.iter().map(|p| p.tables.len()).sum::<usize>(),
        "Parsed PDF"
    );

    Ok(PdfEvidence {
        attachment_id: meta.id,
        filename: meta.filename.clone(),
        pages,
    })
}
