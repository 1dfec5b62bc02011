//! Integration tests for the Folio invoice pipeline.
//!
//! These drive the public API from order to PDF bytes. Assets come from an
//! in-memory fetcher, so nothing touches the network. They verify:
//! - page counts and item slices for small and large orders
//! - totals and footer placement
//! - PDF output is structurally valid and deterministic
//! - data and asset policies

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use chrono::{TimeZone, Utc};
use folio::adapter::{AdapterDefaults, SaleorOrder};
use folio::assets::AssetFetcher;
use folio::config::{AssetPolicy, AssetSource, DataPolicy, InvoiceConfig, LabeledValue};
use folio::error::FolioError;
use folio::layout::page_break::FooterPlacement;
use folio::model::*;
use folio::{InvoiceEngine, RenderedDocument};

// ─── Helpers ────────────────────────────────────────────────────

struct StubFetcher {
    assets: HashMap<String, Vec<u8>>,
}

impl StubFetcher {
    fn empty() -> Self {
        Self {
            assets: HashMap::new(),
        }
    }

    fn with_logo(url: &str) -> Self {
        let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([35, 38, 62, 255]));
        let mut png = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut png);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 4, 2, image::ColorType::Rgba8)
            .unwrap();
        Self::empty().with(url, png)
    }

    fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.assets.insert(url.to_string(), bytes);
        self
    }
}

impl AssetFetcher for StubFetcher {
    fn fetch(&self, source: &AssetSource) -> Result<Vec<u8>, FolioError> {
        let key = String::from(source.clone());
        self.assets.get(&key).cloned().ok_or(FolioError::AssetFetch {
            asset: key,
            reason: "404 Not Found".to_string(),
        })
    }
}

fn make_item(i: usize) -> LineItem {
    LineItem {
        sku: Some(format!("SKU-{:03}", i)),
        description: format!("Bordeaux blend lot {}", i),
        quantity: 1 + (i as u32 % 3),
        unit_price: Some(Money::new(480.0, "HKD")),
        subtotal: Some(Money::new(480.0, "HKD")),
        attributes: vec![Attribute::new("Vintage", "2016"), Attribute::new("Size", "750ml")],
    }
}

fn make_order(items: usize) -> OrderDocument {
    OrderDocument {
        order_number: "1042".to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap(),
        customer: Customer {
            name: Some("Ada Wong".to_string()),
            email: Some("ada@example.com".to_string()),
            ..Default::default()
        },
        shipping_method_name: Some("Courier".to_string()),
        payment_status_label: Some("Fully paid".to_string()),
        line_items: (0..items).map(make_item).collect(),
        shipping_cost: Some(Money::new(200.0, "HKD")),
        totals: Some(Totals {
            net: Money::new(1640.0, "HKD"),
            tax: Money::new(0.0, "HKD"),
            gross: Money::new(1640.0, "HKD"),
        }),
    }
}

fn engine(config: InvoiceConfig) -> InvoiceEngine {
    InvoiceEngine::with_fetcher(config, Box::new(StubFetcher::empty())).unwrap()
}

fn render(order: &OrderDocument) -> RenderedDocument {
    engine(InvoiceConfig::default()).generate(order).unwrap()
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 50, "PDF too small to be valid");
    assert!(bytes.starts_with(b"%PDF-1.7"), "Missing PDF header");
    assert!(bytes.windows(5).any(|w| w == b"%%EOF"), "Missing %%EOF marker");
    assert!(bytes.windows(4).any(|w| w == b"xref"), "Missing xref table");
    assert!(bytes.windows(7).any(|w| w == b"trailer"), "Missing trailer");
}

fn page_count(bytes: &[u8]) -> usize {
    String::from_utf8_lossy(bytes).matches("/Type /Page ").count()
}

// ─── Pagination ─────────────────────────────────────────────────

#[test]
fn test_three_items_one_page() {
    let rendered = render(&make_order(3));
    assert_valid_pdf(&rendered.bytes);
    let summary = &rendered.summary;
    assert_eq!(summary.table_pages, 1);
    assert_eq!(summary.total_pages, 1);
    // header row, 3 items, shipping row
    assert_eq!(summary.totals_row, 1 + 3 + 1 + 1);
    assert_eq!(summary.totals_offset, 600.0 + 6.0 * 50.0);
    assert_eq!(page_count(&rendered.bytes), 1);
}

#[test]
fn test_forty_items_two_pages_no_gap() {
    let rendered = render(&make_order(40));
    let summary = &rendered.summary;
    assert_eq!(summary.table_pages, 2);
    assert_eq!(summary.page_items, vec![(0, 15), (15, 40)]);
}

#[test]
fn test_every_item_printed_once() {
    for n in [0, 1, 14, 15, 16, 25, 40, 41, 50, 51, 100] {
        let rendered = render(&make_order(n));
        let covered: usize = rendered.summary.page_items.iter().map(|(s, e)| e - s).sum();
        assert_eq!(covered, n, "items lost or duplicated for n = {}", n);
        for pair in rendered.summary.page_items.windows(2) {
            assert_eq!(pair[0].1, pair[1].0, "gap between pages for n = {}", n);
        }
    }
}

#[test]
fn test_fifty_items_need_three_pages() {
    let rendered = render(&make_order(50));
    assert_eq!(rendered.summary.table_pages, 3);
    assert_eq!(rendered.summary.page_items, vec![(0, 15), (15, 40), (40, 50)]);
}

#[test]
fn test_empty_order_still_renders_table() {
    let rendered = render(&make_order(0));
    assert_valid_pdf(&rendered.bytes);
    assert_eq!(rendered.summary.table_pages, 1);
    assert_eq!(rendered.summary.page_items, vec![(0, 0)]);
}

#[test]
fn test_equal_capacities_give_plain_slicing() {
    let mut config = InvoiceConfig::default();
    config.layout.pagination.first_page_capacity = 25;
    let rendered = engine(config).generate(&make_order(60)).unwrap();
    assert_eq!(rendered.summary.page_items, vec![(0, 25), (25, 50), (50, 60)]);
}

// ─── Footer ─────────────────────────────────────────────────────

#[test]
fn test_footer_overflow_adds_page() {
    let crowded = render(&make_order(10));
    assert_eq!(crowded.summary.footer, FooterPlacement::NewPageOverflow);
    assert_eq!(crowded.summary.total_pages, crowded.summary.table_pages + 1);
    assert_eq!(page_count(&crowded.bytes), 2);

    let mut config = InvoiceConfig::default();
    config.layout.footer_overflow_page = false;
    let inline = engine(config).generate(&make_order(10)).unwrap();
    assert_eq!(inline.summary.footer, FooterPlacement::SameFlow);
    assert_eq!(inline.summary.total_pages, inline.summary.table_pages);
}

#[test]
fn test_continuation_page_footer_limit() {
    // 15 on page one, 12 on page two: still below the limit of 13.
    let fits = render(&make_order(27));
    assert_eq!(fits.summary.footer, FooterPlacement::SameFlow);

    let crowded = render(&make_order(28));
    assert_eq!(crowded.summary.footer, FooterPlacement::NewPageOverflow);
}

// ─── Output ─────────────────────────────────────────────────────

#[test]
fn test_output_is_deterministic() {
    let order = make_order(30);
    let first = render(&order);
    let second = render(&order);
    assert_eq!(first.bytes, second.bytes);
    assert_eq!(first.data_uri, second.data_uri);
}

#[test]
fn test_data_uri_and_title() {
    let rendered = render(&make_order(2));
    assert!(rendered
        .data_uri
        .starts_with("data:application/pdf;base64,JVBERi0xLjc"));
    assert_eq!(rendered.invoice_number, "INV2026-1019-1042");
    let text = String::from_utf8_lossy(&rendered.bytes);
    assert!(text.contains("/Title (Invoice INV2026-1019-1042)"));
}

#[test]
fn test_generate_from_json() {
    let json = r#"{
        "orderNumber": "77",
        "createdAt": "2026-02-03T10:00:00Z",
        "lineItems": [ { "description": "Riesling", "quantity": 6 } ]
    }"#;
    let rendered = engine(InvoiceConfig::default()).generate_json(json).unwrap();
    assert_valid_pdf(&rendered.bytes);
    assert_eq!(rendered.invoice_number, "INV2026-0203-77");
}

#[test]
fn test_engine_shared_across_threads() {
    let engine = Arc::new(engine(InvoiceConfig::default()));
    let handles: Vec<_> = (1..=4)
        .map(|n| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.generate(&make_order(n * 10)).unwrap().summary)
        })
        .collect();
    for (n, handle) in (1..=4).zip(handles) {
        let summary = handle.join().unwrap();
        let covered: usize = summary.page_items.iter().map(|(s, e)| e - s).sum();
        assert_eq!(covered, n * 10);
    }
}

// ─── Policies ───────────────────────────────────────────────────

#[test]
fn test_strict_policy_rejects_missing_subtotal() {
    let mut config = InvoiceConfig::default();
    config.data_policy = DataPolicy::Strict;
    let mut order = make_order(3);
    order.line_items[1].subtotal = None;
    let err = engine(config).generate(&order).unwrap_err();
    assert!(matches!(err, FolioError::MalformedOrder { ref field } if field == "lineItems[1].subtotal"));
}

#[test]
fn test_lenient_policy_renders_sparse_order() {
    let mut order = make_order(3);
    order.customer = Customer::default();
    order.totals = None;
    order.shipping_cost = None;
    let rendered = render(&order);
    assert_valid_pdf(&rendered.bytes);
}

#[test]
fn test_required_logo_failure_is_fatal() {
    let mut config = InvoiceConfig::default();
    config.asset_policy = AssetPolicy::Required;
    config.assets.logo = Some(AssetSource::from("https://cdn.example.com/logo.png"));
    let err = engine(config).generate(&make_order(1)).unwrap_err();
    assert!(err.is_asset_failure());
}

#[test]
fn test_fallback_logo_failure_renders() {
    let mut config = InvoiceConfig::default();
    config.assets.logo = Some(AssetSource::from("https://cdn.example.com/logo.png"));
    config.assets.localized_font = Some(AssetSource::from("https://cdn.example.com/font.ttf"));
    let rendered = engine(config).generate(&make_order(1)).unwrap();
    assert_valid_pdf(&rendered.bytes);
    let text = String::from_utf8_lossy(&rendered.bytes);
    assert!(!text.contains("CIDFontType2"));
}

#[test]
fn test_logo_embedded_when_available() {
    let url = "https://cdn.example.com/logo.png";
    let mut config = InvoiceConfig::default();
    config.asset_policy = AssetPolicy::Required;
    config.assets.logo = Some(AssetSource::from(url));
    let engine = InvoiceEngine::with_fetcher(config, Box::new(StubFetcher::with_logo(url))).unwrap();
    let rendered = engine.generate(&make_order(1)).unwrap();
    let text = String::from_utf8_lossy(&rendered.bytes);
    assert!(text.contains("/Subtype /Image"));
    assert!(text.contains("/XObject << /Im0"));
}

// ─── Localized font ─────────────────────────────────────────────

/// A system TTF to embed, or None when the machine has none of these.
fn load_test_font() -> Option<Vec<u8>> {
    let paths = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
        "/System/Library/Fonts/Supplemental/Verdana.ttf",
    ];
    for path in &paths {
        if let Ok(data) = std::fs::read(path) {
            if ttf_parser::Face::parse(&data, 0).is_ok() {
                return Some(data);
            }
        }
    }
    None
}

#[test]
fn test_localized_font_embedded_for_customer_block() {
    let font_data = match load_test_font() {
        Some(data) => data,
        None => {
            eprintln!("Skipping: no test TTF font found");
            return;
        }
    };

    let url = "https://cdn.example.com/localized.ttf";
    let mut config = InvoiceConfig::default();
    config.asset_policy = AssetPolicy::Required;
    config.assets.localized_font = Some(AssetSource::from(url));
    let fetcher = StubFetcher::empty().with(url, font_data);
    let engine = InvoiceEngine::with_fetcher(config, Box::new(fetcher)).unwrap();

    let mut order = make_order(2);
    order.customer.name = Some("陳大文 Chan Tai Man".to_string());
    let rendered = engine.generate(&order).unwrap();
    assert_valid_pdf(&rendered.bytes);

    let text = String::from_utf8_lossy(&rendered.bytes);
    assert!(text.contains("/Subtype /Type0"), "Should contain Type0 font dictionary");
    assert!(text.contains("CIDFontType2"), "Should contain CIDFontType2 subtype");
    assert!(text.contains("/Identity-H"), "Should use Identity-H encoding");
    assert!(text.contains("/FontFile2"), "Should embed the font program");
    assert!(text.contains("/W ["), "Should carry glyph widths");
    assert!(text.contains("/ToUnicode"), "Should map glyphs back to text");
}

// ─── Saleor ─────────────────────────────────────────────────────

#[test]
fn test_saleor_payload_end_to_end() {
    let json = r#"{ "data": { "order": {
        "number": "2001",
        "created": "2026-05-06T07:08:09Z",
        "userEmail": "buyer@example.com",
        "paymentStatusDisplay": "Not charged",
        "shippingMethodName": "Pickup",
        "shippingPrice": { "gross": { "amount": 0, "currency": "HKD" } },
        "shippingAddress": { "firstName": "Lee", "lastName": "Chan", "city": "Kowloon" },
        "lines": [
            { "productName": "Barolo", "quantity": 3,
              "variant": { "sku": "BAR-19", "product": { "attributes": [] } },
              "totalPrice": { "gross": { "amount": 1500, "currency": "HKD" } } }
        ],
        "total": {
            "net": { "amount": 1500, "currency": "HKD" },
            "tax": { "amount": 0, "currency": "HKD" },
            "gross": { "amount": 1500, "currency": "HKD" }
        }
    } } }"#;
    let order = SaleorOrder::from_json(json)
        .unwrap()
        .into_document(&AdapterDefaults::default())
        .unwrap();
    let mut config = InvoiceConfig::default();
    config.invoice_number_prefix = "LC".to_string();
    config.payment_details = vec![LabeledValue::new("Bank:", "Example Bank")];
    let rendered = engine(config).generate(&order).unwrap();
    assert_eq!(rendered.invoice_number, "LC2026-0506-2001");
    // free shipping adds no row: header row + 1 item + totals
    assert_eq!(rendered.summary.totals_row, 3);
}
