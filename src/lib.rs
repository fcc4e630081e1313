// Enforce at crate level
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
#![allow(clippy::significant_drop_tightening)]

//! Order Evidence Parser
//!
//! Turns an inbound order email and its attachments into a typed evidence
//! pack that an extraction model can read.
//!
//! # Features
//!
//! - HTML body normalization
//! - Email segmentation into greetings, plain text, quotes, forwarded
//!   headers and signatures
//! - Table detection in free text and PDF pages
//! - Spreadsheet sheets as header-keyed records
//! - Per-page PDF evidence, flagged when page boundaries are estimated
//! - Evidence pack assembly with a parse quality score
//! - Deterministic evidence text and extraction prompts
//!
//! # Example
//!
//! ```rust
//! use order_evidence::{EvidenceParser, MemoryAttachmentStore, RawEmail, render_evidence};
//! use uuid::Uuid;
//!
//! let parser = EvidenceParser::default();
//! let email = RawEmail::text("Hi team,\nPlease ship 10 units.\n--\nJane");
//! let outcome = parser
//!     .parse_order(Uuid::new_v4(), &email, &[], &MemoryAttachmentStore::default())
//!     .unwrap();
//!
//! assert_eq!(outcome.pack.email.segments.len(), 3);
//! println!("{}", render_evidence(&outcome.pack, parser.config()));
//! ```

mod config;
mod error;
mod evidence;
mod extraction;
mod mime;
mod normalize;
mod pdf;
mod pipeline;
mod render;
mod segment;
mod spreadsheet;
mod store;
mod table;
mod types;

pub use config::*;
pub use error::{EvidenceError, Result};
pub use evidence::{ERROR_PENALTY, assemble, quality_score};
pub use extraction::*;
pub use mime::{IncomingAttachment, IncomingEmail, parse_raw_email, sha256_hex};
pub use normalize::{html_to_text, normalize_body};
pub use pdf::*;
pub use pipeline::{EvidenceParser, ParseOutcome, ParsedAttachment};
pub use render::render_evidence;
pub use segment::{FORWARD_LOOKAHEAD, RULES, Rule, classify_line, segment_email};
pub use spreadsheet::*;
pub use store::*;
pub use table::{MIN_CELLS, MIN_ROWS, detect_tables, split_cells};
pub use types::*;
