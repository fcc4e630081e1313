//! Email body segmentation
//!
//! A single left-to-right pass over the body's lines. The segmenter holds the
//! kind of the segment being built plus a line buffer, and each line is
//! classified by the first matching entry of [`RULES`]. Flushing closes the
//! buffer into a segment when it holds any non-whitespace text.

use crate::normalize::normalize_body;
use crate::types::{BodyType, EmailSegment, SegmentKind};
use regex::Regex;
use tracing::debug;

/// Lines after a forward marker that may hold `From:`/`Date:`/... headers
pub const FORWARD_LOOKAHEAD: usize = 5;

static FORWARD_MARKER: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:-{3,}\s*forwarded message\s*-{3,}",
        r"|begin forwarded message",
        r"|-{3,}\s*original message\s*-{3,})",
    ))
    .unwrap()
});

static FORWARD_FIELD: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"(?i)^(from|date|to|subject|cc):\s*(.*)$").unwrap()
});

static SIGNATURE_MARKER: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:--\s*$|_{3,}$",
        r"|regards|best regards|kind regards|thanks|cheers|sincerely|sent from my)",
    ))
    .unwrap()
});

static GREETING: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"(?i)^(?:hi|hello|hey|dear|good morning|good afternoon|good evening)\b").unwrap()
});

/// Line classification, listed in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    ForwardHeader,
    Signature,
    Quote,
    Greeting,
    Plain,
}

/// Rules evaluated per line; the first match wins
pub const RULES: [Rule; 5] = [
    Rule::ForwardHeader,
    Rule::Signature,
    Rule::Quote,
    Rule::Greeting,
    Rule::Plain,
];

impl Rule {
    /// Whether this rule fires for a trimmed line. `at_start` is true while
    /// nothing has been emitted or buffered yet.
    #[must_use]
    pub fn matches(self, trimmed: &str, at_start: bool) -> bool {
        match self {
            Self::ForwardHeader => FORWARD_MARKER.is_match(trimmed),
            Self::Signature => SIGNATURE_MARKER.is_match(trimmed),
            Self::Quote => trimmed.starts_with('>'),
            Self::Greeting => at_start && GREETING.is_match(trimmed),
            Self::Plain => true,
        }
    }
}

/// Classify a single line against [`RULES`]
#[must_use]
pub fn classify_line(line: &str, at_start: bool) -> Rule {
    let trimmed = line.trim();
    RULES
        .into_iter()
        .find(|rule| rule.matches(trimmed, at_start))
        .unwrap_or(Rule::Plain)
}

/// Segment an email body, normalizing HTML first
#[must_use]
pub fn segment_email(body: &str, body_type: BodyType) -> Vec<EmailSegment> {
    let text = normalize_body(body, body_type);
    let segments = Segmenter::new(&text).run();

    debug!(
        count = segments.len(),
        kinds = %segments.iter().map(|s| s.kind.as_str()).collect::<Vec<_>>().join(", "),
        "Segmented email body"
    );

    segments
}

struct Segmenter<'a> {
    lines: Vec<&'a str>,
    cursor: usize,
    kind: SegmentKind,
    buffer: Vec<&'a str>,
    forward_from: Option<String>,
    forward_date: Option<String>,
    segments: Vec<EmailSegment>,
}

impl<'a> Segmenter<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.split('\n').collect(),
            cursor: 0,
            kind: SegmentKind::Plain,
            buffer: Vec::new(),
            forward_from: None,
            forward_date: None,
            segments: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<EmailSegment> {
        while self.cursor < self.lines.len() {
            let line = self.lines[self.cursor];

            match classify_line(line, self.at_start()) {
                Rule::ForwardHeader => self.forward_block(line),
                Rule::Signature => {
                    self.signature_block();
                    break;
                }
                Rule::Quote => {
                    self.switch_to(SegmentKind::Quote);
                    self.buffer.push(strip_quote_prefix(line));
                }
                Rule::Greeting => {
                    self.flush();
                    self.kind = SegmentKind::Greeting;
                    self.buffer.push(line);
                    self.flush();
                    self.kind = SegmentKind::Plain;
                }
                Rule::Plain => {
                    self.switch_to(SegmentKind::Plain);
                    self.buffer.push(line);
                }
            }

            self.cursor += 1;
        }

        self.flush();
        self.segments
    }

    fn at_start(&self) -> bool {
        self.segments.is_empty() && self.buffer.iter().all(|l| l.trim().is_empty())
    }

    fn switch_to(&mut self, kind: SegmentKind) {
        if self.kind != kind {
            self.flush();
            self.kind = kind;
        }
    }

    /// Marker line plus up to [`FORWARD_LOOKAHEAD`] header lines, always
    /// emitted as a segment of its own
    fn forward_block(&mut self, marker: &'a str) {
        self.flush();
        self.kind = SegmentKind::ForwardHeader;
        self.buffer.push(marker);

        let end = (self.cursor + 1 + FORWARD_LOOKAHEAD).min(self.lines.len());
        for next in self.cursor + 1..end {
            let line = self.lines[next];
            let trimmed = line.trim();

            if trimmed.is_empty() {
                self.cursor = next;
                break;
            }

            let Some(caps) = FORWARD_FIELD.captures(trimmed) else {
                break;
            };

            let value = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
            match caps[1].to_lowercase().as_str() {
                "from" => self.forward_from = Some(value),
                "date" => self.forward_date = Some(value),
                _ => {}
            }
            self.buffer.push(line);
            self.cursor = next;
        }

        self.flush();
        self.kind = SegmentKind::Plain;
    }

    /// Everything from the marker to the end of the body
    fn signature_block(&mut self) {
        self.flush();
        self.kind = SegmentKind::Signature;
        self.buffer.extend_from_slice(&self.lines[self.cursor..]);
        self.flush();
        self.cursor = self.lines.len();
    }

    fn flush(&mut self) {
        let content = self.buffer.join("\n");
        let content = content.trim();

        if !content.is_empty() {
            let mut segment = EmailSegment::new(self.kind, content);
            if self.kind == SegmentKind::ForwardHeader {
                segment.from = self.forward_from.take();
                segment.date = self.forward_date.take();
            }
            self.segments.push(segment);
        }

        self.buffer.clear();
        self.forward_from = None;
        self.forward_date = None;
    }
}

/// Drop the leading `>` and one following space
fn strip_quote_prefix(line: &str) -> &str {
    let rest = line.trim_start();
    let rest = rest.strip_prefix('>').unwrap_or(rest);
    rest.strip_prefix(' ').unwrap_or(rest)
}
