//! Evidence pack assembly and validation

use crate::error::{EvidenceError, Result};
use crate::types::{
    EmailEvidence, EmailSegment, EvidencePack, ExcelEvidence, ParseQuality, PdfEvidence, TableRow,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

/// Score lost per recorded parse error
pub const ERROR_PENALTY: f64 = 0.15;

/// `max(0, 1 - 0.15 * errors)`
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn quality_score(error_count: usize) -> f64 {
    (ERROR_PENALTY.mul_add(-(error_count as f64), 1.0)).max(0.0)
}

impl ParseQuality {
    #[must_use]
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            score: quality_score(errors.len()),
            errors,
        }
    }
}

/// Assemble and validate a new pack for `order_id`.
///
/// Fails without returning anything when the result would not be a
/// well-formed pack.
pub fn assemble(
    order_id: Uuid,
    segments: Vec<EmailSegment>,
    pdfs: Vec<PdfEvidence>,
    excels: Vec<ExcelEvidence>,
    errors: Vec<String>,
) -> Result<EvidencePack> {
    let pack = EvidencePack {
        id: Uuid::new_v4(),
        order_id,
        created_at: Utc::now(),
        email: EmailEvidence { segments },
        pdfs,
        excels,
        parse_quality: ParseQuality::from_errors(errors),
    };

    pack.validate()?;

    info!(
        pack_id = %pack.id,
        %order_id,
        quality = pack.parse_quality.score,
        segments = pack.email.segments.len(),
        pdfs = pack.pdfs.len(),
        excels = pack.excels.len(),
        "Evidence pack assembled"
    );

    Ok(pack)
}

impl EvidencePack {
    /// Check the pack's shape
    pub fn validate(&self) -> Result<()> {
        if self.id.is_nil() {
            return Err(invalid("pack id is nil"));
        }
        if self.order_id.is_nil() {
            return Err(invalid("order id is nil"));
        }

        let score = self.parse_quality.score;
        if !(0.0..=1.0).contains(&score) {
            return Err(invalid(format!("parse quality score {score} outside [0, 1]")));
        }

        if let Some(i) = self
            .email
            .segments
            .iter()
            .position(|s| s.content.trim().is_empty())
        {
            return Err(invalid(format!("email segment {i} is empty")));
        }

        for pdf in &self.pdfs {
            validate_pdf(pdf)?;
        }
        for excel in &self.excels {
            validate_excel(excel)?;
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize and validate a stored pack
    pub fn from_json(json: &str) -> Result<Self> {
        let pack: Self = serde_json::from_str(json)?;
        pack.validate()?;
        Ok(pack)
    }

    /// Whether any page text came from an even split instead of real
    /// page boundaries
    #[must_use]
    pub fn has_approximate_pages(&self) -> bool {
        self.pdfs
            .iter()
            .flat_map(|pdf| &pdf.pages)
            .any(|page| page.approximate)
    }
}

fn validate_pdf(pdf: &PdfEvidence) -> Result<()> {
    if pdf.filename.trim().is_empty() {
        return Err(invalid(format!("PDF {} has no filename", pdf.attachment_id)));
    }

    for (expected, page) in (1_u32..).zip(&pdf.pages) {
        if page.page_number != expected {
            return Err(invalid(format!(
                "{}: page {} found where page {expected} was expected",
                pdf.filename, page.page_number
            )));
        }
    }

    Ok(())
}

fn validate_excel(excel: &ExcelEvidence) -> Result<()> {
    if excel.filename.trim().is_empty() {
        return Err(invalid(format!(
            "spreadsheet {} has no filename",
            excel.attachment_id
        )));
    }

    for sheet in &excel.sheets {
        if sheet.name.trim().is_empty() {
            return Err(invalid(format!("{}: sheet without a name", excel.filename)));
        }

        for table in &sheet.tables {
            let headers = table.headers.as_deref().unwrap_or_default();
            for row in &table.rows {
                if let TableRow::Record(record) = row
                    && (record.len() != headers.len()
                        || !headers.iter().all(|h| record.contains_key(h)))
                {
                    return Err(invalid(format!(
                        "{}: sheet \"{}\" has a row not keyed by its headers",
                        excel.filename, sheet.name
                    )));
                }
            }
        }
    }

    Ok(())
}

fn invalid(reason: impl Into<String>) -> EvidenceError {
    EvidenceError::InvalidPack(reason.into())
}
