use order_evidence::*;
use serde_json::json;
use uuid::Uuid;

struct FixedText(&'static str, u32);

impl PdfTextSource for FixedText {
    fn extract(&self, _bytes: &[u8]) -> Result<ExtractedPdf> {
        Ok(ExtractedPdf::concatenated(self.0, self.1))
    }
}

struct FixedWorkbook;

impl WorkbookDecoder for FixedWorkbook {
    fn decode(&self, _bytes: &[u8]) -> Result<Vec<SheetGrid>> {
        Ok(vec![
            SheetGrid::new(
                "Order",
                vec![vec![json!("SKU"), json!("Qty")], vec![json!("A-1"), json!(2)]],
            ),
            SheetGrid::new("Notes", Vec::new()),
        ])
    }
}

fn parser() -> EvidenceParser {
    EvidenceParser::default()
        .with_pdf_source(FixedText("Purchase order 7781\nSKU    Qty\nA-1    2", 1))
        .with_workbook_decoder(FixedWorkbook)
}

fn stored(store: &mut MemoryAttachmentStore, filename: &str, mime: &str) -> AttachmentMeta {
    let meta = AttachmentMeta::new(filename, mime);
    store.insert(meta.id, b"bytes".to_vec());
    meta
}

#[test]
fn test_parse_order_collects_all_evidence() {
    let mut store = MemoryAttachmentStore::default();
    let attachments = vec![
        stored(&mut store, "po.pdf", "application/pdf"),
        stored(&mut store, "lines.xlsx", "application/octet-stream"),
    ];
    let email = RawEmail::text("Hi team,\nPlease ship the attached order.\n--\nAnna");
    let order_id = Uuid::new_v4();

    let outcome = parser()
        .parse_order(order_id, &email, &attachments, &store)
        .unwrap();
    let pack = &outcome.pack;

    assert_eq!(pack.order_id, order_id);
    assert_eq!(pack.email.segments.len(), 3);
    assert_eq!(pack.pdfs.len(), 1);
    assert_eq!(pack.pdfs[0].attachment_id, attachments[0].id);
    assert_eq!(pack.pdfs[0].pages[0].tables.len(), 1);
    assert_eq!(pack.excels.len(), 1);
    assert_eq!(pack.excels[0].sheets.len(), 2);
    assert!((pack.parse_quality.score - 1.0).abs() < 1e-9);
    assert!(pack.parse_quality.errors.is_empty());

    assert_eq!(outcome.attachments[0].state, ParseState::Parsed);
    assert_eq!(outcome.attachments[0].page_count, Some(1));
    assert_eq!(outcome.attachments[1].sheet_count, Some(2));
}

#[test]
fn test_failed_attachment_does_not_stop_others() {
    let mut store = MemoryAttachmentStore::default();
    let attachments = vec![
        AttachmentMeta::new("missing.pdf", "application/pdf"),
        stored(&mut store, "po.pdf", "application/pdf"),
    ];

    let outcome = parser()
        .parse_order(Uuid::new_v4(), &RawEmail::text("See attached"), &attachments, &store)
        .unwrap();

    assert_eq!(outcome.pack.pdfs.len(), 1);
    assert_eq!(outcome.pack.pdfs[0].filename, "po.pdf");
    assert_eq!(
        outcome.pack.parse_quality.errors,
        vec!["missing.pdf: Attachment not found".to_string()]
    );
    assert!((outcome.pack.parse_quality.score - 0.85).abs() < 1e-9);
    assert_eq!(outcome.attachments[0].state, ParseState::Error);
    assert!(outcome.attachments[0].error.is_some());
    assert_eq!(outcome.attachments[1].state, ParseState::Parsed);
}

#[test]
fn test_decoder_failure_prefixed_with_filename() {
    let mut store = MemoryAttachmentStore::default();
    let attachments = vec![stored(&mut store, "broken.pdf", "application/pdf")];

    let outcome = EvidenceParser::default()
        .parse_order(Uuid::new_v4(), &RawEmail::text("Order"), &attachments, &store)
        .unwrap();

    assert!(outcome.pack.pdfs.is_empty());
    assert_eq!(outcome.pack.parse_quality.errors.len(), 1);
    assert!(outcome.pack.parse_quality.errors[0].starts_with("broken.pdf: "));
}

#[test]
fn test_unsupported_attachments_skipped_silently() {
    let mut store = MemoryAttachmentStore::default();
    let attachments = vec![
        stored(&mut store, "photo.png", "image/png"),
        stored(&mut store, "notes.docx", "application/msword"),
    ];

    let outcome = parser()
        .parse_order(Uuid::new_v4(), &RawEmail::text("Photos"), &attachments, &store)
        .unwrap();

    assert!(outcome.pack.pdfs.is_empty());
    assert!(outcome.pack.excels.is_empty());
    assert!(outcome.pack.parse_quality.errors.is_empty());
    assert!(
        outcome
            .attachments
            .iter()
            .all(|s| s.state == ParseState::Skipped)
    );
}

#[test]
fn test_evidence_keeps_arrival_order() {
    let mut store = MemoryAttachmentStore::default();
    let names = ["c.pdf", "a.pdf", "b.pdf"];
    let attachments: Vec<AttachmentMeta> = names
        .iter()
        .map(|name| stored(&mut store, name, "application/pdf"))
        .collect();

    let outcome = parser()
        .parse_order(Uuid::new_v4(), &RawEmail::text("Three"), &attachments, &store)
        .unwrap();

    let filenames: Vec<&str> = outcome.pack.pdfs.iter().map(|p| p.filename.as_str()).collect();
    assert_eq!(filenames, names);
}

#[test]
fn test_html_email_segmented() {
    let email = RawEmail::html("<p>Hello Bo,</p><p>Ship 3 boxes.</p>");
    let outcome = parser()
        .parse_order(Uuid::new_v4(), &email, &[], &MemoryAttachmentStore::default())
        .unwrap();

    let kinds: Vec<SegmentKind> = outcome.pack.email.segments.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![SegmentKind::Greeting, SegmentKind::Plain]);
}

#[test]
fn test_attachment_kind_detection() {
    assert_eq!(AttachmentKind::detect("x.bin", "application/pdf"), AttachmentKind::Pdf);
    assert_eq!(AttachmentKind::detect("PO.PDF", "application/octet-stream"), AttachmentKind::Pdf);
    assert_eq!(
        AttachmentKind::detect("x", "application/vnd.ms-excel"),
        AttachmentKind::Spreadsheet
    );
    assert_eq!(AttachmentKind::detect("old.xls", ""), AttachmentKind::Spreadsheet);
    assert_eq!(AttachmentKind::detect("a.csv", "text/csv"), AttachmentKind::Unsupported);
}

#[test]
fn test_fs_store_reads_relative_path() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("orders")).unwrap();
    std::fs::write(dir.path().join("orders/po.pdf"), b"%PDF-1.4").unwrap();

    let store = FsAttachmentStore::new(dir.path());
    let meta = AttachmentMeta::new("po.pdf", "application/pdf").with_storage_path("orders/po.pdf");

    assert_eq!(store.read(&meta).unwrap(), b"%PDF-1.4");
}

#[test]
fn test_fs_store_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsAttachmentStore::new(dir.path());

    let meta = AttachmentMeta::new("gone.pdf", "application/pdf").with_storage_path("gone.pdf");
    let err = store.read(&meta).unwrap_err().to_string();
    assert!(err.starts_with("gone.pdf: Attachment file not found on disk"));

    let meta = AttachmentMeta::new("nopath.pdf", "application/pdf");
    let err = store.read(&meta).unwrap_err().to_string();
    assert_eq!(err, "nopath.pdf: No storage path recorded");
}

#[test]
fn test_fs_store_through_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("po.pdf"), b"%PDF-1.4").unwrap();
    let store = FsAttachmentStore::new(dir.path());

    let attachments = vec![
        AttachmentMeta::new("po.pdf", "application/pdf").with_storage_path("po.pdf"),
        AttachmentMeta::new("lost.pdf", "application/pdf").with_storage_path("lost.pdf"),
    ];
    let outcome = parser()
        .parse_order(Uuid::new_v4(), &RawEmail::text("Two files"), &attachments, &store)
        .unwrap();

    assert_eq!(outcome.pack.pdfs.len(), 1);
    assert_eq!(outcome.pack.parse_quality.errors.len(), 1);
    assert!(outcome.pack.parse_quality.errors[0].starts_with("lost.pdf: "));
}

#[test]
fn test_fs_store_rejects_paths_outside_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("store")).unwrap();
    std::fs::write(dir.path().join("secret.pdf"), b"%PDF-1.4").unwrap();
    let store = FsAttachmentStore::new(dir.path().join("store"));

    let escaping = [
        "../secret.pdf".to_string(),
        "nested/../../secret.pdf".to_string(),
        dir.path().join("secret.pdf").display().to_string(),
    ];
    for path in escaping {
        let meta = AttachmentMeta::new("secret.pdf", "application/pdf").with_storage_path(path);
        let err = store.read(&meta).unwrap_err().to_string();
        assert!(err.starts_with("secret.pdf: Storage path escapes the store root"));
    }
}
