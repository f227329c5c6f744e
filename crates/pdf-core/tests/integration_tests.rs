//! Integration tests for pdf-core
//!
//! These tests verify end-to-end functionality with real PDF operations.

use lopdf::{dictionary, Object};
use pdf_core::{Color, FieldKind, PdfDocument, PdfError};
use pretty_assertions::assert_eq;

/// Create a minimal valid PDF for testing
///
/// This creates a simple one-page PDF with A4 dimensions.
fn create_test_pdf() -> Vec<u8> {
    let mut doc = lopdf::Document::new();

    // Create pages dictionary
    let pages_id = doc.add_object(lopdf::Object::Dictionary(lopdf::dictionary! {
        "Type" => "Pages",
        "Count" => 1,
        "Kids" => vec![], // Will be updated below
    }));

    // Create Contents stream as a separate object
    let contents_id = doc.add_object(lopdf::Object::Stream(lopdf::Stream::new(
        lopdf::dictionary! {},
        b"0.5 g\n0 0 100 100 re\nf\n".to_vec(),
    )));

    // Create page dictionary
    let page_id = doc.add_object(lopdf::Object::Dictionary(lopdf::dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.28.into(), 841.89.into()],
        "Resources" => lopdf::dictionary! {},
        "Contents" => contents_id,
    }));

    // Update pages dictionary to include the page
    let mut pages_dict = doc.get_object(pages_id).unwrap().as_dict().unwrap().clone();
    pages_dict.set("Kids", lopdf::Object::Array(vec![page_id.into()]));
    doc.objects.insert(pages_id, pages_dict.into());

    // Create catalog dictionary
    let catalog_id = doc.add_object(lopdf::Object::Dictionary(lopdf::dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    }));

    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Create a one-page PDF with a text field and a checkbox
///
/// The checkbox appearance states are "Yes" and "Off"; the text field has
/// no appearance until a value is written.
fn create_form_pdf() -> Vec<u8> {
    let mut doc = lopdf::Document::new();
    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();

    let text_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Tx",
        "T" => Object::string_literal("PolicyNumber"),
        "Rect" => vec![200.into(), 650.into(), 400.into(), 668.into()],
        "DA" => Object::string_literal("/Helv 9 Tf 0 g"),
    });

    let yes_id = doc.add_object(lopdf::Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 12.into(), 12.into()],
        },
        b"q 0 g 2 2 8 8 re f Q".to_vec(),
    ));
    let off_id = doc.add_object(lopdf::Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 12.into(), 12.into()],
        },
        Vec::new(),
    ));
    let check_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Btn",
        "T" => Object::string_literal("Check Box 22"),
        "Rect" => vec![504.into(), 381.into(), 516.into(), 393.into()],
        "AP" => dictionary! { "N" => dictionary! { "Yes" => yes_id, "Off" => off_id } },
        "AS" => "Off",
    });
    let link_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![0.into(), 0.into(), 10.into(), 10.into()],
    });

    let contents_id = doc.add_object(lopdf::Stream::new(dictionary! {}, Vec::new()));
    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! {},
            "Contents" => contents_id,
            "Annots" => vec![text_id.into(), check_id.into(), link_id.into()],
        }),
    );
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let form_id = doc.add_object(dictionary! {
        "Fields" => vec![text_id.into(), check_id.into()],
        "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => form_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Create a minimal JPEG image for testing
fn create_test_jpeg() -> Vec<u8> {
    // Minimal JPEG with SOI, SOF0, and EOI markers
    vec![
        0xFF, 0xD8, // SOI marker
        0xFF, 0xC0, // SOF0 marker (baseline DCT)
        0x00, 0x11, // Length (17 bytes)
        0x08, // Precision (8 bits)
        0x00, 0x10, // Height (16 pixels)
        0x00, 0x20, // Width (32 pixels)
        0x03, // Number of components (RGB)
        0x01, 0x22, 0x00, // Component 1 (Y, subsampling 2x2)
        0x02, 0x11, 0x01, // Component 2 (Cb, subsampling 2x1)
        0x03, 0x11, 0x01, // Component 3 (Cr, subsampling 2x1)
        0xFF, 0xD9, // EOI marker
    ]
}

/// Create a 500x150 transparent PNG with a black stroke, like a saved
/// signature pad
fn create_signature_png() -> Vec<u8> {
    use image::{ImageBuffer, Rgba};

    let mut img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::new(500, 150);
    for x in 100..400 {
        img.put_pixel(x, 75, Rgba([0, 0, 0, 255]));
    }

    let mut buffer = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut buffer),
        image::ImageFormat::Png,
    )
    .expect("Failed to create PNG");
    buffer
}

/// Decompressed content of a saved page
fn saved_page_content(data: &[u8], page: u32) -> String {
    let doc = lopdf::Document::load_mem(data).expect("Failed to reload PDF");
    let page_id = doc.get_pages()[&page];
    String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
}

#[test]
fn test_open_save_roundtrip() {
    let pdf_data = create_test_pdf();

    let mut doc = PdfDocument::open_from_bytes(&pdf_data).expect("Failed to open PDF");
    assert_eq!(doc.page_count(), 1);

    let saved_data = doc.to_bytes().expect("Failed to save PDF");

    let doc2 = PdfDocument::open_from_bytes(&saved_data).expect("Failed to re-open PDF");
    assert_eq!(doc2.page_count(), 1);
}

#[test]
fn test_open_invalid_bytes() {
    let result = PdfDocument::open_from_bytes(b"not a pdf");
    assert!(matches!(result, Err(PdfError::OpenError(_))));
}

#[test]
fn test_insert_text_wraps_existing_content() {
    let pdf_data = create_test_pdf();

    let mut doc = PdfDocument::open_from_bytes(&pdf_data).expect("Failed to open PDF");
    let replaced = doc
        .insert_text("Claim Details:", 1, 50.0, 750.0, 14.0)
        .expect("Failed to insert text");
    assert_eq!(replaced, 0);

    let saved_data = doc.to_bytes().expect("Failed to save PDF");
    let content = saved_page_content(&saved_data, 1);

    // Graphics state of the original content is isolated
    assert!(content.starts_with("q\n0.5 g\n0 0 100 100 re\nf\n"));
    assert!(content.contains("/Helv1 14 Tf"));
    assert!(content.contains("50 750 Td"));
    assert!(content.contains("(Claim Details:) Tj"));
}

#[test]
fn test_insert_text_reports_replacements() {
    let pdf_data = create_test_pdf();

    let mut doc = PdfDocument::open_from_bytes(&pdf_data).expect("Failed to open PDF");
    let replaced = doc
        .insert_text("Filename: 報告.pdf", 1, 50.0, 730.0, 10.0)
        .expect("Failed to insert text");
    assert_eq!(replaced, 2);
}

#[test]
fn test_insert_image_jpeg() {
    let pdf_data = create_test_pdf();
    let jpeg_data = create_test_jpeg();

    let mut doc = PdfDocument::open_from_bytes(&pdf_data).expect("Failed to open PDF");
    let size = doc
        .insert_image(&jpeg_data, 1, 170.0, 30.0, 0.5)
        .expect("Failed to insert JPEG image");
    assert_eq!(size, (16.0, 8.0));

    let saved_data = doc.to_bytes().expect("Failed to save PDF");
    assert!(saved_page_content(&saved_data, 1).contains("q\n16 0 0 8 170 30 cm\n/Im1 Do\nQ\n"));
}

#[test]
fn test_insert_transparent_png_adds_soft_mask() {
    let pdf_data = create_test_pdf();
    let png_data = create_signature_png();

    let mut doc = PdfDocument::open_from_bytes(&pdf_data).expect("Failed to open PDF");
    let size = doc
        .insert_image(&png_data, 1, 150.0, 42.0, 0.2)
        .expect("Failed to insert PNG image");
    assert_eq!(size, (100.0, 30.0));

    let saved_data = doc.to_bytes().expect("Failed to save PDF");
    let saved = lopdf::Document::load_mem(&saved_data).unwrap();
    let has_soft_masked_image = saved.objects.values().any(|object| match object {
        Object::Stream(stream) => {
            stream.dict.get(b"Subtype").and_then(Object::as_name).ok() == Some(b"Image".as_slice())
                && stream.dict.has(b"SMask")
        }
        _ => false,
    });
    assert!(has_soft_masked_image);
}

#[test]
fn test_insert_image_unknown_format() {
    let pdf_data = create_test_pdf();

    let mut doc = PdfDocument::open_from_bytes(&pdf_data).expect("Failed to open PDF");
    let result = doc.insert_image(b"GIF89a\x01\x00\x01\x00", 1, 0.0, 0.0, 1.0);
    assert!(matches!(result, Err(PdfError::ImageError(_))));
}

#[test]
fn test_draw_line() {
    let pdf_data = create_test_pdf();

    let mut doc = PdfDocument::open_from_bytes(&pdf_data).expect("Failed to open PDF");
    doc.draw_line(1, (203.0, 429.5), (211.0, 421.5), 2.0, Color::black())
        .expect("Failed to draw line");

    let saved_data = doc.to_bytes().expect("Failed to save PDF");
    let content = saved_page_content(&saved_data, 1);
    assert!(content.contains("0 0 0 RG\n2 w\n203 429.5 m\n211 421.5 l\nS\n"));
}

#[test]
fn test_add_blank_page() {
    let pdf_data = create_test_pdf();

    let mut doc = PdfDocument::open_from_bytes(&pdf_data).expect("Failed to open PDF");
    assert_eq!(doc.add_blank_page().expect("Failed to add page"), 2);
    assert_eq!(doc.add_blank_page().expect("Failed to add page"), 3);

    doc.insert_text("Attached File Notice:", 3, 50.0, 750.0, 14.0)
        .expect("Failed to insert text on new page");

    let saved_data = doc.to_bytes().expect("Failed to save PDF");
    let saved = PdfDocument::open_from_bytes(&saved_data).expect("Failed to re-open PDF");
    assert_eq!(saved.page_count(), 3);
    assert!(saved_page_content(&saved_data, 3).contains("(Attached File Notice:) Tj"));
    assert!(!saved_page_content(&saved_data, 2).contains("Tj"));
}

#[test]
fn test_invalid_page_number() {
    let pdf_data = create_test_pdf();

    let mut doc = PdfDocument::open_from_bytes(&pdf_data).expect("Failed to open PDF");

    let result = doc.insert_text("Test", 999, 100.0, 700.0, 12.0);
    match result {
        Err(PdfError::InvalidPage(page, total)) => {
            assert_eq!(page, 999);
            assert_eq!(total, 1);
        }
        _ => panic!("Expected InvalidPage error"),
    }

    let result = doc.draw_line(0, (0.0, 0.0), (1.0, 1.0), 1.0, Color::black());
    assert!(matches!(result, Err(PdfError::InvalidPage(0, 1))));
}

#[test]
fn test_document_without_form() {
    let pdf_data = create_test_pdf();

    let mut doc = PdfDocument::open_from_bytes(&pdf_data).expect("Failed to open PDF");
    assert!(!doc.has_form());
    assert!(matches!(
        doc.set_text_field("CompanyName", "Acme"),
        Err(PdfError::NoForm)
    ));
    assert_eq!(doc.flatten_form().unwrap(), 0);
}

#[test]
fn test_fill_and_flatten_roundtrip() {
    let pdf_data = create_form_pdf();

    let mut doc = PdfDocument::open_from_bytes(&pdf_data).expect("Failed to open PDF");
    let kinds: Vec<FieldKind> = doc.form_fields().unwrap().iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![FieldKind::Text, FieldKind::CheckBox]);

    doc.set_text_field("PolicyNumber", "CFC-2024-0042").unwrap();
    doc.set_check_box("Check Box 22", true).unwrap();
    assert_eq!(doc.flatten_form().unwrap(), 2);

    let saved_data = doc.to_bytes().expect("Failed to save PDF");
    let saved = lopdf::Document::load_mem(&saved_data).unwrap();

    // No interactive form remains
    let catalog = saved.catalog().unwrap();
    assert!(catalog.get(b"AcroForm").is_err());
    let reopened = PdfDocument::open_from_bytes(&saved_data).unwrap();
    assert!(matches!(reopened.form_fields(), Err(PdfError::NoForm)));

    // Only the link annotation is left on the page
    let page_id = saved.get_pages()[&1];
    let page = saved.get_object(page_id).unwrap().as_dict().unwrap();
    assert_eq!(page.get(b"Annots").unwrap().as_array().unwrap().len(), 1);

    // The page draws both baked appearances
    let content = saved_page_content(&saved_data, 1);
    assert!(content.contains("1 0 0 1 200 650 cm\n/FlatWidget1 Do"));
    assert!(content.contains("1 0 0 1 504 381 cm\n/FlatWidget2 Do"));

    // The written value is part of the baked text appearance
    let xobjects = page
        .get(b"Resources")
        .unwrap()
        .as_dict()
        .unwrap()
        .get(b"XObject")
        .unwrap()
        .as_dict()
        .unwrap();
    let text_appearance = xobjects.get(b"FlatWidget1").unwrap().as_reference().unwrap();
    let stream = saved.get_object(text_appearance).unwrap().as_stream().unwrap();
    let appearance = String::from_utf8_lossy(&stream.content);
    assert!(appearance.contains("/Helv 9 Tf"));
    assert!(appearance.contains("(CFC-2024-0042) Tj"));

    let check_appearance = xobjects.get(b"FlatWidget2").unwrap().as_reference().unwrap();
    let stream = saved.get_object(check_appearance).unwrap().as_stream().unwrap();
    assert_eq!(stream.content, b"q 0 g 2 2 8 8 re f Q".to_vec());
}

#[test]
fn test_unchecked_box_bakes_off_appearance() {
    let pdf_data = create_form_pdf();

    let mut doc = PdfDocument::open_from_bytes(&pdf_data).expect("Failed to open PDF");
    doc.set_check_box("Check Box 22", false).unwrap();
    assert_eq!(doc.field_value("Check Box 22").unwrap(), Some("Off".to_string()));

    // The text field never received a value, so only the checkbox is drawn
    assert_eq!(doc.flatten_form().unwrap(), 1);
}

#[test]
fn test_inner_document_access() {
    let pdf_data = create_test_pdf();

    let mut doc = PdfDocument::open_from_bytes(&pdf_data).expect("Failed to open PDF");

    let inner = doc.inner();
    assert_eq!(inner.get_pages().len(), 1);

    let inner_mut = doc.inner_mut();
    assert_eq!(inner_mut.get_pages().len(), 1);
}
