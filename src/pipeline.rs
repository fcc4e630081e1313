//! Per-order parse: email body plus attachments into one evidence pack

use crate::config::EvidenceConfig;
use crate::error::{EvidenceError, Result};
use crate::evidence::assemble;
use crate::pdf::{LopdfTextSource, PdfTextSource, parse_pdf};
use crate::render::render_evidence;
use crate::segment::segment_email;
use crate::spreadsheet::{CalamineDecoder, WorkbookDecoder, parse_spreadsheet};
use crate::store::AttachmentStore;
use crate::types::{
    AttachmentKind, AttachmentMeta, AttachmentStatus, EvidencePack, ExcelEvidence, ParseState,
    PdfEvidence, RawEmail,
};
use tracing::{info, warn};
use uuid::Uuid;

/// Result of parsing one order
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub pack: EvidencePack,

    /// One entry per input attachment, in input order
    pub attachments: Vec<AttachmentStatus>,
}

/// Evidence parsed out of one attachment
#[derive(Debug, Clone)]
pub enum ParsedAttachment {
    Pdf(PdfEvidence),
    Excel(ExcelEvidence),
    Skipped,
}

/// Parses orders with explicitly supplied backends.
///
/// Construct once and reuse; the parser holds no per-order state. Callers
/// must not run two parses for the same order at the same time.
pub struct EvidenceParser {
    config: EvidenceConfig,
    pdf_source: Box<dyn PdfTextSource>,
    workbook_decoder: Box<dyn WorkbookDecoder>,
}

impl Default for EvidenceParser {
    fn default() -> Self {
        Self::new(EvidenceConfig::default())
    }
}

impl EvidenceParser {
    /// Parser using the bundled `lopdf`/`pdf-extract` and `calamine` backends
    #[must_use]
    pub fn new(config: EvidenceConfig) -> Self {
        Self {
            config,
            pdf_source: Box::new(LopdfTextSource),
            workbook_decoder: Box::new(CalamineDecoder),
        }
    }

    #[must_use]
    pub fn with_pdf_source(mut self, source: impl PdfTextSource + 'static) -> Self {
        self.pdf_source = Box::new(source);
        self
    }

    #[must_use]
    pub fn with_workbook_decoder(mut self, decoder: impl WorkbookDecoder + 'static) -> Self {
        self.workbook_decoder = Box::new(decoder);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &EvidenceConfig {
        &self.config
    }

    /// Read and parse a single attachment. Unsupported types are skipped.
    pub fn parse_attachment(
        &self,
        meta: &AttachmentMeta,
        store: &dyn AttachmentStore,
    ) -> Result<ParsedAttachment> {
        let kind = meta.kind();
        if kind == AttachmentKind::Unsupported {
            info!(
                filename = %meta.filename,
                mime_type = %meta.mime_type,
                "Skipping unsupported attachment type"
            );
            return Ok(ParsedAttachment::Skipped);
        }

        let bytes = store.read(meta)?;
        match kind {
            AttachmentKind::Pdf => {
                parse_pdf(self.pdf_source.as_ref(), meta, &bytes).map(ParsedAttachment::Pdf)
            }
            AttachmentKind::Spreadsheet => parse_spreadsheet(
                self.workbook_decoder.as_ref(),
                meta,
                &bytes,
                self.config.cells_sample_rows,
            )
            .map(ParsedAttachment::Excel),
            AttachmentKind::Unsupported => Ok(ParsedAttachment::Skipped),
        }
    }

    /// Segment the body, parse every attachment in arrival order, and
    /// assemble the pack.
    ///
    /// An attachment that fails is recorded in the pack's error list and
    /// does not stop the others. Only an invalid assembled pack is an error.
    pub fn parse_order(
        &self,
        order_id: Uuid,
        email: &RawEmail,
        attachments: &[AttachmentMeta],
        store: &dyn AttachmentStore,
    ) -> Result<ParseOutcome> {
        info!(%order_id, attachments = attachments.len(), "Parsing order");

        let segments = segment_email(&email.body, email.body_type);

        let mut pdfs = Vec::new();
        let mut excels = Vec::new();
        let mut errors = Vec::new();
        let mut statuses = Vec::with_capacity(attachments.len());

        for meta in attachments {
            let mut status = AttachmentStatus {
                attachment_id: meta.id,
                filename: meta.filename.clone(),
                state: ParseState::Parsed,
                page_count: None,
                sheet_count: None,
                error: None,
            };

            match self.parse_attachment(meta, store) {
                Ok(ParsedAttachment::Pdf(pdf)) => {
                    status.page_count = u32::try_from(pdf.pages.len()).ok();
                    pdfs.push(pdf);
                }
                Ok(ParsedAttachment::Excel(excel)) => {
                    status.sheet_count = u32::try_from(excel.sheets.len()).ok();
                    excels.push(excel);
                }
                Ok(ParsedAttachment::Skipped) => status.state = ParseState::Skipped,
                Err(e) => {
                    let entry = error_entry(&meta.filename, &e);
                    warn!(
                        %order_id,
                        filename = %meta.filename,
                        error = %e,
                        "Attachment parse failed"
                    );
                    status.state = ParseState::Error;
                    status.error = Some(e.to_string());
                    errors.push(entry);
                }
            }

            statuses.push(status);
        }

        info!(
            %order_id,
            pdfs = pdfs.len(),
            excels = excels.len(),
            errors = errors.len(),
            "Attachments parsed"
        );

        let pack = assemble(order_id, segments, pdfs, excels, errors)?;
        Ok(ParseOutcome {
            pack,
            attachments: statuses,
        })
    }

    /// Render a pack with this parser's row limits
    #[must_use]
    pub fn render(&self, pack: &EvidencePack) -> String {
        render_evidence(pack, &self.config)
    }
}

/// `"<filename>: <reason>"`, without repeating a filename the error
/// already carries
fn error_entry(filename: &str, error: &EvidenceError) -> String {
    match error {
        EvidenceError::Attachment { .. } => error.to_string(),
        other => format!("{filename}: {other}"),
    }
}
