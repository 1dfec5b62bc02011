//! # Invoice Configuration
//!
//! Everything the shop decides rather than the order: seller address, bank
//! details, legal text, asset locations and the layout constants. All fields
//! have defaults, so a config file only needs to name what differs.
//!
//! ```json
//! {
//!   "seller": { "companyName": "Acme Wines Ltd", "city": "Hong Kong" },
//!   "invoiceNumberPrefix": "AW",
//!   "assets": { "logo": "https://example.com/logo.png" },
//!   "dataPolicy": "strict"
//! }
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FolioError;
use crate::layout::page_break::PaginationOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceConfig {
    pub seller: SellerAddress,
    /// Prepended to `{YYYY}-{MM}{DD}-{orderNumber}`.
    pub invoice_number_prefix: String,
    /// Lines printed under the shipping method name.
    pub shipping_note: Vec<String>,
    pub payment_details: Vec<LabeledValue>,
    pub terms: Vec<String>,
    pub footer: FooterContact,
    pub attribute_columns: AttributeColumns,
    pub assets: AssetConfig,
    pub asset_policy: AssetPolicy,
    pub data_policy: DataPolicy,
    pub layout: LayoutOptions,
}

impl Default for InvoiceConfig {
    fn default() -> Self {
        Self {
            seller: SellerAddress::default(),
            invoice_number_prefix: "INV".to_string(),
            shipping_note: Vec::new(),
            payment_details: Vec::new(),
            terms: Vec::new(),
            footer: FooterContact::default(),
            attribute_columns: AttributeColumns::default(),
            assets: AssetConfig::default(),
            asset_policy: AssetPolicy::default(),
            data_policy: DataPolicy::default(),
            layout: LayoutOptions::default(),
        }
    }
}

impl InvoiceConfig {
    pub fn from_json(json: &str) -> Result<Self, FolioError> {
        let config: InvoiceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, FolioError> {
        let json = std::fs::read_to_string(path).map_err(|source| FolioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Reject layout constants the composer cannot work with.
    pub fn validate(&self) -> Result<(), FolioError> {
        let layout = &self.layout;
        if layout.pagination.first_page_capacity == 0 || layout.pagination.page_capacity == 0 {
            return Err(FolioError::Config(
                "page capacities must be at least one row".to_string(),
            ));
        }
        if layout.row_height <= 0.0 {
            return Err(FolioError::Config("rowHeight must be positive".to_string()));
        }
        if layout.description_chars == 0 {
            return Err(FolioError::Config(
                "descriptionChars must be at least one character".to_string(),
            ));
        }
        if layout.page_width <= 2.0 * layout.margin || layout.page_height <= layout.table_offset {
            return Err(FolioError::Config(format!(
                "page {}x{} is too small for margin {} and table offset {}",
                layout.page_width, layout.page_height, layout.margin, layout.table_offset
            )));
        }
        Ok(())
    }
}

/// The seller's postal address, printed in the header band.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SellerAddress {
    pub company_name: String,
    pub street_lines: Vec<String>,
    pub postal_code: String,
    pub city: String,
    pub country: String,
}

impl SellerAddress {
    /// Printable lines, skipping anything left blank.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.company_name.clone()];
        lines.extend(self.street_lines.iter().cloned());
        lines.push(
            [self.postal_code.as_str(), self.city.as_str()]
                .iter()
                .filter(|part| !part.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" "),
        );
        lines.push(self.country.clone());
        lines.retain(|line| !line.trim().is_empty());
        lines
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabeledValue {
    pub label: String,
    pub value: String,
}

impl LabeledValue {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// The three text columns at the very bottom of the footer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FooterContact {
    pub left: Vec<String>,
    pub center: Vec<String>,
    pub right: Vec<String>,
}

/// Product attribute names read into the Vintage and Format columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeColumns {
    pub vintage: String,
    pub format: String,
}

impl Default for AttributeColumns {
    fn default() -> Self {
        Self {
            vintage: "Vintage".to_string(),
            format: "Size".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetConfig {
    pub logo: Option<AssetSource>,
    pub localized_font: Option<AssetSource>,
    /// Family name recorded in the PDF for the localized font.
    pub localized_font_family: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            logo: None,
            localized_font: None,
            localized_font_family: "NotoSansSC".to_string(),
        }
    }
}

/// Where an asset's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssetSource {
    /// `http://` or `https://`
    Url(String),
    /// `data:<mime>;base64,<payload>`
    DataUri(String),
    Path(String),
}

impl From<String> for AssetSource {
    fn from(source: String) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            AssetSource::Url(source)
        } else if source.starts_with("data:") {
            AssetSource::DataUri(source)
        } else {
            AssetSource::Path(source)
        }
    }
}

impl From<&str> for AssetSource {
    fn from(source: &str) -> Self {
        AssetSource::from(source.to_string())
    }
}

impl From<AssetSource> for String {
    fn from(source: AssetSource) -> Self {
        match source {
            AssetSource::Url(s) | AssetSource::DataUri(s) | AssetSource::Path(s) => s,
        }
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetSource::Url(url) => write!(f, "{}", url),
            AssetSource::Path(path) => write!(f, "{}", path),
            // Payloads can be megabytes; show only the media type.
            AssetSource::DataUri(uri) => {
                let head = uri.split(',').next().unwrap_or("data:");
                write!(f, "{},…", head)
            }
        }
    }
}

/// What to do when the logo or localized font cannot be loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetPolicy {
    /// Draw a placeholder box for the logo and use Helvetica for localized text.
    #[default]
    Fallback,
    /// Abort generation with [`FolioError::AssetFetch`].
    Required,
}

/// What to do when an order lacks fields the invoice prints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataPolicy {
    /// Render missing values as blank (or `-` in table cells).
    #[default]
    Lenient,
    /// Fail with [`FolioError::MalformedOrder`].
    Strict,
}

/// Page geometry and the thresholds that drive page breaks.
///
/// Units are PDF points; vertical offsets are measured down from the top
/// edge of the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutOptions {
    pub page_width: f64,
    pub page_height: f64,
    /// Left edge of every block and of the table.
    pub margin: f64,
    pub table_width: f64,
    /// Section offset of the table on the first page.
    pub table_offset: f64,
    /// Section offset of the table on continuation pages.
    pub continuation_table_offset: f64,
    pub row_height: f64,
    /// Characters per wrapped description line.
    pub description_chars: usize,
    pub pagination: PaginationOptions,
    /// Move the footer to a new page when it would collide with the totals.
    /// When false the footer always follows the totals.
    pub footer_overflow_page: bool,
    /// Footer moves off the first page once it carries this many items.
    pub first_page_footer_limit: usize,
    /// Footer moves off a continuation page once it carries this many items.
    pub page_footer_limit: usize,
    /// Minimum gap kept between the footer and the bottom edge.
    pub bottom_margin: f64,
    /// Redraw the table header row on continuation pages.
    pub repeat_table_header: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            page_width: 1000.0,
            page_height: 1500.0,
            margin: 50.0,
            table_width: 900.0,
            table_offset: 600.0,
            continuation_table_offset: 0.0,
            row_height: 50.0,
            description_chars: 70,
            pagination: PaginationOptions::default(),
            footer_overflow_page: true,
            first_page_footer_limit: 5,
            page_footer_limit: 13,
            bottom_margin: 50.0,
            repeat_table_header: false,
        }
    }
}
