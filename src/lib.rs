//! # Folio
//!
//! A paginated invoice PDF engine for Saleor orders.
//!
//! An invoice here is not a flowing document. Every block sits at fixed
//! coordinates on a 1000×1500 page; the only things that move are the row
//! cursor inside the itemized table and the page it is on. Folio keeps that
//! model and makes it explicit: cells are addressed by `(row, column)`,
//! line items are split across pages by a checked plan, and the footer
//! either follows the totals or moves to a page of its own.
//!
//! ## Architecture
//!
//! ```text
//! Order JSON / Saleor payload
//!       ↓
//!   [model] [adapter]  - normalized OrderDocument
//!       ↓
//!   [assets]           - logo + localized font, via AssetFetcher
//!       ↓
//!   [layout]           - geometry, wrap, page_break, composer
//!       ↓
//!   [pdf]              - serialize to PDF bytes
//! ```

pub mod adapter;
pub mod assets;
pub mod config;
pub mod error;
pub mod font;
pub mod format;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod style;

use base64::Engine;
use log::{debug, info};

use assets::{resolve_assets, AssetFetcher, DefaultAssetFetcher};
use config::InvoiceConfig;
use error::FolioError;
use font::FontSet;
use layout::composer::{compose, LayoutSummary};
use model::OrderDocument;
use pdf::{DocumentInfo, PdfWriter};

/// A finished invoice.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    /// `data:application/pdf;base64,...`
    pub data_uri: String,
    pub invoice_number: String,
    pub summary: LayoutSummary,
}

/// Generates invoices for one shop configuration.
///
/// The engine holds no per-document state, so one instance can be shared
/// across threads and each [`generate`](InvoiceEngine::generate) call is
/// independent.
pub struct InvoiceEngine {
    config: InvoiceConfig,
    fetcher: Box<dyn AssetFetcher>,
}

impl InvoiceEngine {
    /// An engine that fetches assets over HTTP, from disk or from data URIs.
    pub fn new(config: InvoiceConfig) -> Result<Self, FolioError> {
        Self::with_fetcher(config, Box::new(DefaultAssetFetcher))
    }

    pub fn with_fetcher(
        config: InvoiceConfig,
        fetcher: Box<dyn AssetFetcher>,
    ) -> Result<Self, FolioError> {
        config.validate()?;
        Ok(Self { config, fetcher })
    }

    pub fn config(&self) -> &InvoiceConfig {
        &self.config
    }

    /// Render `order` to PDF.
    pub fn generate(&self, order: &OrderDocument) -> Result<RenderedDocument, FolioError> {
        let assets = resolve_assets(
            &self.config.assets,
            self.config.asset_policy,
            self.fetcher.as_ref(),
        )?;
        let fonts = FontSet::new(assets.localized_font);
        if !fonts.has_localized() {
            debug!("no localized font loaded, customer block uses Helvetica");
        }

        let composed = compose(order, &self.config, &assets.logo)?;
        debug!("layout summary: {:?}", composed.summary);

        let info = DocumentInfo {
            title: Some(format!("Invoice {}", composed.invoice_number)),
            author: Some(self.config.seller.company_name.clone()).filter(|a| !a.is_empty()),
        };
        let bytes = PdfWriter::new().write(&composed.pages, &info, &fonts)?;
        info!(
            "rendered invoice {} ({} pages, {} bytes)",
            composed.invoice_number,
            composed.pages.len(),
            bytes.len()
        );

        Ok(RenderedDocument {
            data_uri: pdf_data_uri(&bytes),
            bytes,
            invoice_number: composed.invoice_number,
            summary: composed.summary,
        })
    }

    /// Parse an order from JSON and render it.
    pub fn generate_json(&self, json: &str) -> Result<RenderedDocument, FolioError> {
        let order = OrderDocument::from_json(json)?;
        self.generate(&order)
    }
}

/// Base64 data URI for a PDF byte buffer.
pub fn pdf_data_uri(bytes: &[u8]) -> String {
    format!(
        "data:application/pdf;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Render one order with the default asset fetcher.
pub fn render(order: &OrderDocument, config: &InvoiceConfig) -> Result<RenderedDocument, FolioError> {
    InvoiceEngine::new(config.clone())?.generate(order)
}

/// Render an order given as JSON with the default asset fetcher.
pub fn render_json(json: &str, config: &InvoiceConfig) -> Result<RenderedDocument, FolioError> {
    InvoiceEngine::new(config.clone())?.generate_json(json)
}
