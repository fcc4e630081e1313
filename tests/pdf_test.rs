use order_evidence::*;

mod common;

struct FixedText(ExtractedPdf);

impl PdfTextSource for FixedText {
    fn extract(&self, _bytes: &[u8]) -> Result<ExtractedPdf> {
        Ok(self.0.clone())
    }
}

#[test]
fn test_single_page_keeps_text() {
    let text = "Invoice 42\nSKU    Qty\nA      1\n";
    let pages = split_pages(text, 1);

    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].page_number, 1);
    assert_eq!(pages[0].text, text);
    assert!(!pages[0].approximate);
    assert_eq!(pages[0].tables.len(), 1);
}

#[test]
fn test_zero_page_count_treated_as_one() {
    let pages = split_pages("abc", 0);
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].text, "abc");
}

#[test]
fn test_even_split_is_contiguous() {
    let text = "0123456789";
    let pages = split_pages(text, 3);

    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0].text, "0123");
    assert_eq!(pages[1].text, "4567");
    assert_eq!(pages[2].text, "89");
    assert!(pages.iter().all(|p| p.approximate));

    let joined: String = pages.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(joined, text);
}

#[test]
fn test_split_lengths_sum_to_input() {
    let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit.";
    for n in 2..=9 {
        let pages = split_pages(text, n);
        assert_eq!(pages.len(), n as usize);

        let total: usize = pages.iter().map(|p| p.text.chars().count()).sum();
        assert_eq!(total, text.chars().count());

        let numbers: Vec<u32> = pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, (1..=n).collect::<Vec<_>>());
    }
}

#[test]
fn test_split_counts_characters_not_bytes() {
    let text = "ÄÖÜäöü";
    let pages = split_pages(text, 2);

    assert_eq!(pages[0].text, "ÄÖÜ");
    assert_eq!(pages[1].text, "äöü");
}

#[test]
fn test_more_pages_than_characters() {
    let pages = split_pages("ab", 4);

    assert_eq!(pages.len(), 4);
    assert_eq!(pages[0].text, "a");
    assert_eq!(pages[1].text, "b");
    assert_eq!(pages[2].text, "");
    assert_eq!(pages[3].text, "");
}

#[test]
fn test_each_slice_scanned_for_tables() {
    let text = "A\tB\n1\t2\nC\tD\n3\t4\n";
    let pages = split_pages(text, 2);

    assert_eq!(pages[0].text, "A\tB\n1\t2\n");
    assert_eq!(pages[0].tables.len(), 1);
    assert_eq!(pages[1].tables.len(), 1);
}

#[test]
fn test_real_page_texts_preferred() {
    let extracted = ExtractedPdf {
        text: "first\u{000C}second".into(),
        page_count: 2,
        page_texts: Some(vec!["first".into(), "second".into()]),
    };
    let pages = pages_from_extraction(&extracted);

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[1].text, "second");
    assert!(pages.iter().all(|p| !p.approximate));
}

#[test]
fn test_mismatched_page_texts_fall_back_to_split() {
    let extracted = ExtractedPdf {
        text: "abcdef".into(),
        page_count: 3,
        page_texts: Some(vec!["abcdef".into()]),
    };
    let pages = pages_from_extraction(&extracted);

    assert_eq!(pages.len(), 3);
    assert!(pages.iter().all(|p| p.approximate));
    assert_eq!(pages[2].text, "ef");
}

#[test]
fn test_parse_pdf_uses_source() {
    let source = FixedText(ExtractedPdf::concatenated("Page one text. Page two text.", 2));
    let meta = AttachmentMeta::new("po.pdf", "application/pdf");
    let pdf = parse_pdf(&source, &meta, b"%PDF-1.4").unwrap();

    assert_eq!(pdf.attachment_id, meta.id);
    assert_eq!(pdf.filename, "po.pdf");
    assert_eq!(pdf.pages.len(), 2);
    assert!(pdf.pages[0].approximate);
}

#[test]
fn test_lopdf_source_rejects_garbage() {
    let result = LopdfTextSource.extract(b"definitely not a pdf");
    assert!(result.is_err());
}

#[test]
fn test_lopdf_source_reads_real_pages() {
    let bytes = common::pdf_with_pages(&[
        &["Alpha order", "SKU  Qty"],
        &["Bravo delivery"],
    ]);
    let extracted = LopdfTextSource.extract(&bytes).unwrap();

    assert_eq!(extracted.page_count, 2);
    let page_texts = extracted.page_texts.as_ref().unwrap();
    assert_eq!(page_texts.len(), 2);
    assert!(page_texts[0].contains("Alpha"));
    assert!(page_texts[1].contains("Bravo"));
    assert!(!page_texts[0].contains("Bravo"));
    assert!(extracted.text.contains("Alpha") && extracted.text.contains("Bravo"));

    let pages = pages_from_extraction(&extracted);
    assert_eq!(pages.len(), 2);
    assert!(pages.iter().all(|p| !p.approximate));
}

#[test]
fn test_parse_pdf_with_bundled_source() {
    let bytes = common::pdf_with_pages(&[&["Only page"]]);
    let meta = AttachmentMeta::new("single.pdf", "application/pdf");
    let pdf = parse_pdf(&LopdfTextSource, &meta, &bytes).unwrap();

    assert_eq!(pdf.pages.len(), 1);
    assert_eq!(pdf.pages[0].page_number, 1);
    assert!(pdf.pages[0].text.contains("Only"));
}
