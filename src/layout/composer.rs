//! # Invoice Composer
//!
//! Walks one order through a fixed sequence of sections and emits draw
//! commands onto pages:
//!
//! ```text
//! Initializing → HeaderDrawn → CustomerBlockDrawn → TableHeaderDrawn
//!   → EmittingRows(page 1..N) → TotalsDrawn
//!   → Footer(SameFlow | NewPageOverflow) → Finalized
//! ```
//!
//! Drawing is append-only: once an element lands on a page it is never
//! moved or removed. The only mutable state is the [`LayoutContext`], which
//! lives for a single call to [`compose`].

use log::{debug, trace};
use serde::Serialize;

use crate::assets::LogoAsset;
use crate::config::{DataPolicy, InvoiceConfig};
use crate::error::FolioError;
use crate::font::FontId;
use crate::format::{format_amount, format_datetime, invoice_number};
use crate::model::{LineItem, OrderDocument};
use crate::style::{Color, FontScale};

use super::geometry::{CellAddress, Column, TableGeometry};
use super::page_break::{decide_footer, plan_pages, verify_plan, FooterFit, FooterPlacement, PageSlice};
use super::wrap::{chunk_text, clamp_lines};
use super::{DrawCommand, LayoutElement, LayoutPage};

// Fixed block positions, measured down from the top edge of the page.
const HEADER_BAND_TOP: f64 = 50.0;
const HEADER_BAND_HEIGHT: f64 = 100.0;
const LOGO_TOP: f64 = 65.0;
const LOGO_WIDTH: f64 = 210.0;
const LOGO_HEIGHT: f64 = 70.0;
const SELLER_FIRST_LINE: f64 = 75.0;
const SELLER_LINE_STEP: f64 = 15.0;
const SELLER_MAX_LINES: usize = 5;
const TITLE_TOP: f64 = 250.0;
const DETAIL_STEP: f64 = 20.0;
const CUSTOMER_TITLE_TOP: f64 = 380.0;
const CUSTOMER_FIRST_ROW: f64 = 410.0;
const SHIPPING_NOTE_STEP: f64 = 14.0;
/// Offset of the value column from the left margin.
const VALUE_COLUMN: f64 = 150.0;
/// Offset of the right-hand side block from the left margin.
const SIDE_COLUMN: f64 = 500.0;
/// Offset of the seller lines inside the header band.
const SELLER_COLUMN: f64 = 550.0;
/// Offsets of the centre and right contact columns.
const CONTACT_CENTER: f64 = 380.0;
const CONTACT_RIGHT: f64 = 710.0;
/// Footer start on a page of its own.
const OVERFLOW_FOOTER_TOP: f64 = 100.0;
/// Gap between the totals row and the payment heading, in rows.
const FOOTER_GAP_ROWS: f64 = 1.0;
const TERMS_MIN_BLOCK: f64 = 200.0;
const CONTACT_LINE_STEP: f64 = 30.0;
const CONTACT_BASELINE_DROP: f64 = 45.0;
const RULE_HEIGHT: f64 = 1.0;
const PLACEHOLDER: &str = "-";

/// Where the composer is in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ComposerState {
    Initializing,
    HeaderDrawn,
    CustomerBlockDrawn,
    TableHeaderDrawn,
    EmittingRows { page: usize },
    TotalsDrawn,
    Footer(FooterPlacement),
    Finalized,
}

impl ComposerState {
    fn rank(self) -> usize {
        match self {
            ComposerState::Initializing => 0,
            ComposerState::HeaderDrawn => 1,
            ComposerState::CustomerBlockDrawn => 2,
            ComposerState::TableHeaderDrawn => 3,
            ComposerState::EmittingRows { .. } => 4,
            ComposerState::TotalsDrawn => 5,
            ComposerState::Footer(_) => 6,
            ComposerState::Finalized => 7,
        }
    }

    fn can_advance_to(self, next: ComposerState) -> bool {
        match (self, next) {
            (ComposerState::EmittingRows { page }, ComposerState::EmittingRows { page: next_page }) => {
                next_page == page + 1
            }
            _ => next.rank() == self.rank() + 1,
        }
    }
}

/// What the composer decided, for callers and tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSummary {
    pub table_pages: usize,
    pub total_pages: usize,
    /// Item index range per table page. A page holding only the shipping
    /// and totals rows has an empty range.
    pub page_items: Vec<(usize, usize)>,
    /// Row index of the totals bar on the last table page.
    pub totals_row: usize,
    /// Baseline of the totals row.
    pub totals_offset: f64,
    pub footer: FooterPlacement,
}

#[derive(Debug, Clone)]
pub struct ComposedInvoice {
    pub pages: Vec<LayoutPage>,
    pub summary: LayoutSummary,
    pub invoice_number: String,
}

/// Cursor state for one generation call.
struct LayoutContext {
    pages: Vec<LayoutPage>,
    page_width: f64,
    page_height: f64,
    /// Next free row in the current table section.
    row: usize,
    section_offset: f64,
}

impl LayoutContext {
    fn new(page_width: f64, page_height: f64) -> Self {
        Self {
            pages: Vec::new(),
            page_width,
            page_height,
            row: 0,
            section_offset: 0.0,
        }
    }

    fn add_page(&mut self) {
        self.pages.push(LayoutPage::new(self.page_width, self.page_height));
    }

    fn push(&mut self, element: LayoutElement) {
        if self.pages.is_empty() {
            self.add_page();
        }
        let last = self.pages.len() - 1;
        self.pages[last].elements.push(element);
    }

    fn page_index(&self) -> usize {
        self.pages.len().saturating_sub(1)
    }
}

/// Lay out `order` as an invoice.
pub fn compose(
    order: &OrderDocument,
    config: &InvoiceConfig,
    logo: &LogoAsset,
) -> Result<ComposedInvoice, FolioError> {
    Composer::new(order, config, logo).run()
}

struct Composer<'a> {
    order: &'a OrderDocument,
    config: &'a InvoiceConfig,
    logo: &'a LogoAsset,
    geometry: TableGeometry,
    state: ComposerState,
    ctx: LayoutContext,
}

impl<'a> Composer<'a> {
    fn new(order: &'a OrderDocument, config: &'a InvoiceConfig, logo: &'a LogoAsset) -> Self {
        let layout = &config.layout;
        Self {
            order,
            config,
            logo,
            geometry: TableGeometry::new(layout),
            state: ComposerState::Initializing,
            ctx: LayoutContext::new(layout.page_width, layout.page_height),
        }
    }

    fn advance(&mut self, next: ComposerState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "composer cannot go from {:?} to {:?}",
            self.state,
            next
        );
        trace!("composer {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn run(mut self) -> Result<ComposedInvoice, FolioError> {
        self.check_required_fields()?;

        let item_count = self.order.line_items.len();
        let plan = plan_pages(item_count, &self.config.layout.pagination);
        verify_plan(&plan, item_count)?;
        debug!(
            "order {}: {} line items over {} table page(s)",
            self.order.order_number,
            item_count,
            plan.len()
        );

        self.ctx.add_page();
        let number = invoice_number(
            &self.config.invoice_number_prefix,
            &self.order.created_at,
            &self.order.order_number,
        );
        self.draw_header(&number);
        self.advance(ComposerState::HeaderDrawn);

        self.draw_customer_block();
        self.advance(ComposerState::CustomerBlockDrawn);

        self.ctx.section_offset = self.config.layout.table_offset;
        self.draw_table_header();
        self.advance(ComposerState::TableHeaderDrawn);

        for slice in &plan {
            self.emit_page(slice)?;
        }

        let mut page_items: Vec<(usize, usize)> =
            plan.iter().map(|s| (s.items.start, s.items.end)).collect();
        // The plan always has at least one page.
        let mut last_items = plan.last().map(PageSlice::len).unwrap_or(0);

        if self.trailing_rows_overflow() {
            debug!(
                "shipping and totals rows moved past item {} to a new page",
                item_count
            );
            self.start_continuation_page();
            self.ctx.row = 2;
            page_items.push((item_count, item_count));
            last_items = 0;
        }

        let (totals_row, totals_offset) = self.draw_shipping_and_totals();
        self.advance(ComposerState::TotalsDrawn);

        let table_pages = self.ctx.pages.len();
        let placement = self.place_footer(last_items);
        self.advance(ComposerState::Footer(placement));

        self.advance(ComposerState::Finalized);

        let summary = LayoutSummary {
            table_pages,
            total_pages: self.ctx.pages.len(),
            page_items,
            totals_row,
            totals_offset,
            footer: placement,
        };
        Ok(ComposedInvoice {
            pages: self.ctx.pages,
            summary,
            invoice_number: number,
        })
    }

    /// Under the strict policy, refuse orders missing printed fields.
    fn check_required_fields(&self) -> Result<(), FolioError> {
        if self.config.data_policy != DataPolicy::Strict {
            return Ok(());
        }
        let order = self.order;
        if order.totals.is_none() {
            return Err(FolioError::missing("totals"));
        }
        if order.customer.name.as_deref().map_or(true, str::is_empty) {
            return Err(FolioError::missing("customer.name"));
        }
        if order.shipping_method_name.is_some() && order.shipping_cost.is_none() {
            return Err(FolioError::missing("shippingCost"));
        }
        if let Some(index) = order.line_items.iter().position(|item| item.subtotal.is_none()) {
            return Err(FolioError::missing(format!("lineItems[{}].subtotal", index)));
        }
        Ok(())
    }

    // ── Primitives ──────────────────────────────────────────────

    fn text(&mut self, x: f64, y: f64, content: impl Into<String>, font_size: f64, color: Color) {
        self.text_in(x, y, 0.0, content, FontId::Regular, font_size, color);
    }

    /// Section titles and labels set in bold.
    fn heading(&mut self, x: f64, y: f64, content: &str, font_size: f64, color: Color) {
        self.text_in(x, y, 0.0, content, FontId::Bold, font_size, color);
    }

    #[allow(clippy::too_many_arguments)]
    fn text_in(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        content: impl Into<String>,
        font: FontId,
        font_size: f64,
        color: Color,
    ) {
        let content = content.into();
        if content.is_empty() {
            return;
        }
        self.ctx.push(LayoutElement {
            x,
            y,
            width,
            height: font_size,
            draw: DrawCommand::Text {
                content,
                font,
                font_size,
                color,
            },
        });
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: Color) {
        self.ctx.push(LayoutElement {
            x,
            y,
            width,
            height,
            draw: DrawCommand::Rect { fill },
        });
    }

    fn cell(&mut self, row: usize, column: Column, content: impl Into<String>, size: f64, color: Color) {
        let pos = self
            .geometry
            .cell(CellAddress::new(row, column, self.ctx.section_offset), size);
        self.text_in(pos.x, pos.y, pos.width, content, FontId::Regular, pos.font_size, color);
    }

    /// Full-width band covering `row`, used for the table header and totals.
    fn band(&mut self, row: usize) {
        let bottom = self.geometry.row_bottom(row, self.ctx.section_offset);
        let height = self.geometry.row_height();
        self.rect(
            self.geometry.left(),
            bottom - height,
            self.geometry.table_width(),
            height,
            Color::BRAND,
        );
    }

    /// Thin rule along the bottom edge of `row`.
    fn rule(&mut self, row: usize) {
        let bottom = self.geometry.row_bottom(row, self.ctx.section_offset);
        self.rect(
            self.geometry.left(),
            bottom - RULE_HEIGHT,
            self.geometry.table_width(),
            RULE_HEIGHT,
            Color::BRAND,
        );
    }

    // ── Sections ────────────────────────────────────────────────

    fn draw_header(&mut self, number: &str) {
        let left = self.config.layout.margin;
        let width = self.config.layout.table_width;
        self.rect(left, HEADER_BAND_TOP, width, HEADER_BAND_HEIGHT, Color::BRAND);

        match self.logo {
            LogoAsset::None => {}
            LogoAsset::Loaded(image) => self.ctx.push(LayoutElement {
                x: left,
                y: LOGO_TOP,
                width: LOGO_WIDTH,
                height: LOGO_HEIGHT,
                draw: DrawCommand::Image {
                    image: image.clone(),
                },
            }),
            LogoAsset::Placeholder => self.ctx.push(LayoutElement {
                x: left,
                y: LOGO_TOP,
                width: LOGO_WIDTH,
                height: LOGO_HEIGHT,
                draw: DrawCommand::ImagePlaceholder,
            }),
        }

        let seller_x = left + SELLER_COLUMN;
        for (i, line) in self
            .config
            .seller
            .lines()
            .into_iter()
            .take(SELLER_MAX_LINES)
            .enumerate()
        {
            let y = SELLER_FIRST_LINE + i as f64 * SELLER_LINE_STEP;
            self.text(seller_x, y, line, FontScale::SM, Color::WHITE);
        }

        let value_x = left + VALUE_COLUMN;
        self.heading(left, TITLE_TOP, "INVOICE", FontScale::MD, Color::BLACK);
        self.text(value_x, TITLE_TOP, number, FontScale::MD, Color::BLACK);

        let details = [
            ("Order:", self.order.order_number.clone()),
            ("Date:", format_datetime(&self.order.created_at)),
        ];
        for (i, (label, value)) in details.into_iter().enumerate() {
            let y = TITLE_TOP + DETAIL_STEP * (i + 1) as f64;
            self.text(left, y, label, FontScale::BASE, Color::BLACK);
            self.text(value_x, y, value, FontScale::BASE, Color::BLACK);
        }

        let side_x = left + SIDE_COLUMN;
        self.heading(side_x, TITLE_TOP, "SHIPPING METHOD", FontScale::MD, Color::BLACK);
        let mut y = TITLE_TOP + DETAIL_STEP;
        if let Some(method) = self.order.shipping_method_name.clone() {
            self.text(side_x, y, method, FontScale::BASE, Color::BLACK);
            y += SHIPPING_NOTE_STEP;
        }
        for line in self.config.shipping_note.clone() {
            self.text(side_x, y, line, FontScale::BASE, Color::BLACK);
            y += SHIPPING_NOTE_STEP;
        }

        self.heading(side_x, CUSTOMER_TITLE_TOP, "PAYMENT STATUS", FontScale::MD, Color::BLACK);
        let status = self.order.payment_status_label.clone().unwrap_or_default();
        self.text(
            side_x,
            CUSTOMER_TITLE_TOP + DETAIL_STEP,
            status,
            FontScale::BASE,
            Color::BLACK,
        );
    }

    fn draw_customer_block(&mut self) {
        let left = self.config.layout.margin;
        let customer = &self.order.customer;
        let address = &customer.address;
        let rows = [
            ("Name:", customer.name.clone()),
            ("Email:", customer.email.clone()),
            ("Company Name:", customer.company_name.clone()),
            ("Phone:", customer.phone.clone()),
            ("Address:", Some(address.street())),
            ("Post Code:", address.postal_code.clone()),
            ("City:", address.city.clone()),
            ("Country/Area:", address.country.clone()),
        ];

        self.heading(left, CUSTOMER_TITLE_TOP, "CUSTOMER", FontScale::LG, Color::BLACK);
        for (i, (label, value)) in rows.into_iter().enumerate() {
            let y = CUSTOMER_FIRST_ROW + i as f64 * DETAIL_STEP;
            self.text(left, y, label, FontScale::BASE, Color::BLACK);
            self.text_in(
                left + VALUE_COLUMN,
                y,
                0.0,
                value.unwrap_or_default(),
                FontId::Localized,
                FontScale::BASE,
                Color::BLACK,
            );
        }
    }

    fn draw_table_header(&mut self) {
        self.band(1);
        for column in Column::ALL {
            self.cell(1, column, column.header(), FontScale::MD, Color::WHITE);
        }
    }

    fn start_continuation_page(&mut self) {
        self.ctx.add_page();
        self.ctx.section_offset = self.config.layout.continuation_table_offset;
        if self.config.layout.repeat_table_header {
            self.draw_table_header();
        }
    }

    fn emit_page(&mut self, slice: &PageSlice) -> Result<(), FolioError> {
        if slice.page_index > 0 {
            self.start_continuation_page();
        }
        self.advance(ComposerState::EmittingRows {
            page: slice.page_index + 1,
        });

        let order = self.order;
        let items = order.line_items.get(slice.items.clone()).ok_or_else(|| {
            FolioError::PaginationOverflow(format!(
                "page {} asks for items {:?} of {}",
                slice.page_index + 1,
                slice.items,
                order.line_items.len()
            ))
        })?;

        self.ctx.row = 2;
        for item in items {
            let row = self.ctx.row;
            self.draw_item_row(row, item);
            self.ctx.row += 1;
        }
        Ok(())
    }

    fn draw_item_row(&mut self, row: usize, item: &LineItem) {
        let attributes = &self.config.attribute_columns;
        let cells = [
            (Column::ItemCode, item.sku.clone().filter(|s| !s.is_empty()).unwrap_or_else(|| PLACEHOLDER.to_string())),
            (Column::Quantity, item.quantity.to_string()),
            (Column::Vintage, item.attribute(&attributes.vintage).to_string()),
            (Column::Format, item.attribute(&attributes.format).to_string()),
            (
                Column::UnitPrice,
                item.unit_price
                    .as_ref()
                    .map(|price| format_amount(price.amount))
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
            ),
            (
                Column::Total,
                item.subtotal
                    .as_ref()
                    .map(|total| format_amount(total.amount))
                    .unwrap_or_default(),
            ),
        ];
        for (column, content) in cells {
            self.cell(row, column, content, FontScale::BASE, Color::BLACK);
        }

        self.draw_description(row, &item.description);
        self.rule(row);
    }

    fn draw_description(&mut self, row: usize, description: &str) {
        let max_chars = self.config.layout.description_chars;
        let chunks = clamp_lines(
            chunk_text(description, max_chars),
            self.geometry.wrapped_line_capacity(),
            max_chars,
        );
        let wrapped = chunks.len() > 1;
        for (index, chunk) in chunks.into_iter().enumerate() {
            let address =
                CellAddress::new(row, Column::Description, self.ctx.section_offset).line(index, wrapped);
            let pos = self.geometry.cell(address, FontScale::XS);
            self.text_in(pos.x, pos.y, pos.width, chunk, FontId::Regular, pos.font_size, Color::BLACK);
        }
    }

    fn shipping_charge(&self) -> Option<(String, f64)> {
        match (&self.order.shipping_method_name, &self.order.shipping_cost) {
            (Some(method), Some(cost)) if cost.amount != 0.0 => Some((method.clone(), cost.amount)),
            _ => None,
        }
    }

    /// Whether the shipping and totals rows would cross the bottom margin.
    fn trailing_rows_overflow(&self) -> bool {
        let trailing = usize::from(self.shipping_charge().is_some()) + 1;
        let last_row = self.ctx.row + trailing - 1;
        let layout = &self.config.layout;
        self.geometry.row_bottom(last_row, self.ctx.section_offset)
            > layout.page_height - layout.bottom_margin
    }

    /// Shipping row (when charged) and the totals bar, after the last item.
    fn draw_shipping_and_totals(&mut self) -> (usize, f64) {
        let shipping = self.shipping_charge();
        if let Some((method, amount)) = shipping {
            let row = self.ctx.row;
            self.cell(row, Column::ItemCode, method, FontScale::BASE, Color::BLACK);
            for column in [
                Column::Quantity,
                Column::Description,
                Column::Vintage,
                Column::Format,
                Column::UnitPrice,
            ] {
                self.cell(row, column, PLACEHOLDER, FontScale::BASE, Color::BLACK);
            }
            self.cell(row, Column::Total, format_amount(amount), FontScale::BASE, Color::BLACK);
            self.ctx.row += 1;
        }

        let totals_row = self.ctx.row;
        self.band(totals_row);
        if let Some(totals) = self.order.totals.clone() {
            self.cell(totals_row, Column::ItemCode, "GRAND TOTAL", FontScale::BASE, Color::WHITE);
            let amount = format!("{} {}", totals.gross.currency, format_amount(totals.gross.amount));
            self.cell(totals_row, Column::Total, amount, FontScale::BASE, Color::WHITE);
        }
        self.ctx.row += 1;

        (
            totals_row,
            self.geometry.row_baseline(totals_row, self.ctx.section_offset),
        )
    }

    /// Height from the payment heading down to the lowest contact line.
    fn footer_height(&self) -> f64 {
        self.payment_block_height() + self.terms_block_height() + CONTACT_BASELINE_DROP
    }

    fn payment_block_height(&self) -> f64 {
        50.0 + self.config.payment_details.len() as f64 * DETAIL_STEP
    }

    fn terms_block_height(&self) -> f64 {
        let needed = (self.config.terms.len() as f64 + 1.0) * DETAIL_STEP + 80.0;
        needed.max(TERMS_MIN_BLOCK)
    }

    fn place_footer(&mut self, items_on_last_page: usize) -> FooterPlacement {
        let layout = &self.config.layout;
        let footer_top = self.ctx.section_offset
            + self.ctx.row as f64 * self.geometry.row_height()
            + self.geometry.row_height() * FOOTER_GAP_ROWS;

        let placement = if layout.footer_overflow_page {
            let item_limit = if self.ctx.page_index() == 0 {
                layout.first_page_footer_limit
            } else {
                layout.page_footer_limit
            };
            decide_footer(&FooterFit {
                items_on_page: items_on_last_page,
                item_limit,
                footer_top,
                footer_height: self.footer_height(),
                floor: layout.page_height - layout.bottom_margin,
            })
        } else {
            FooterPlacement::SameFlow
        };

        match placement {
            FooterPlacement::SameFlow => self.draw_footer(footer_top),
            FooterPlacement::NewPageOverflow => {
                debug!(
                    "footer moved to a new page ({} items on the last table page)",
                    items_on_last_page
                );
                self.ctx.add_page();
                self.draw_footer(OVERFLOW_FOOTER_TOP);
            }
        }
        placement
    }

    fn draw_footer(&mut self, top: f64) {
        let left = self.config.layout.margin;
        let value_x = left + VALUE_COLUMN;

        self.heading(left, top, "PAYMENT", FontScale::LG, Color::BLACK);
        for (i, detail) in self.config.payment_details.clone().into_iter().enumerate() {
            let y = top + DETAIL_STEP * (i + 1) as f64;
            self.text(left, y, detail.label, FontScale::BASE, Color::BLACK);
            self.text(value_x, y, detail.value, FontScale::BASE, Color::BLACK);
        }

        let terms_top = top + self.payment_block_height();
        self.heading(left, terms_top, "TERMS AND CONDITIONS", FontScale::MD, Color::BLACK);
        for (i, line) in self.config.terms.clone().into_iter().enumerate() {
            let y = terms_top + DETAIL_STEP * (i + 1) as f64;
            self.text(left, y, line, FontScale::BASE, Color::BLACK);
        }

        // Contact columns are bottom-aligned on a shared last baseline.
        let last_baseline = terms_top + self.terms_block_height() + CONTACT_BASELINE_DROP;
        let footer = self.config.footer.clone();
        let columns = [
            (left, footer.left),
            (left + CONTACT_CENTER, footer.center),
            (left + CONTACT_RIGHT, footer.right),
        ];
        for (x, lines) in columns {
            let count = lines.len();
            for (i, line) in lines.into_iter().enumerate() {
                let y = last_baseline - (count - 1 - i) as f64 * CONTACT_LINE_STEP;
                self.text(x, y, line, FontScale::BASE, Color::BLACK);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LabeledValue;
    use crate::model::{Attribute, Customer, Money, Totals};
    use chrono::{TimeZone, Utc};

    fn item(i: usize) -> LineItem {
        LineItem {
            sku: Some(format!("SKU-{i:03}")),
            description: format!("Wine {i}"),
            quantity: 1,
            unit_price: Some(Money::new(100.0, "HKD")),
            subtotal: Some(Money::new(100.0, "HKD")),
            attributes: vec![Attribute::new("Vintage", "2015"), Attribute::new("Size", "750ml")],
        }
    }

    fn order(items: usize) -> OrderDocument {
        OrderDocument {
            order_number: "1042".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap(),
            customer: Customer {
                name: Some("Ada Wong".to_string()),
                ..Default::default()
            },
            shipping_method_name: Some("Courier".to_string()),
            payment_status_label: Some("Fully paid".to_string()),
            line_items: (0..items).map(item).collect(),
            shipping_cost: Some(Money::new(200.0, "HKD")),
            totals: Some(Totals {
                net: Money::new(100.0, "HKD"),
                tax: Money::new(0.0, "HKD"),
                gross: Money::new(1234.5, "HKD"),
            }),
        }
    }

    fn compose_default(order: &OrderDocument) -> ComposedInvoice {
        compose(order, &InvoiceConfig::default(), &LogoAsset::None).unwrap()
    }

    fn texts(page: &LayoutPage) -> Vec<String> {
        page.text_content().into_iter().map(str::to_string).collect()
    }

    #[test]
    fn test_three_items_fit_one_page() {
        let composed = compose_default(&order(3));
        let summary = &composed.summary;
        assert_eq!(summary.table_pages, 1);
        assert_eq!(summary.total_pages, 1);
        // header row + 3 items + shipping row
        assert_eq!(summary.totals_row, 6);
        assert_eq!(summary.totals_offset, 600.0 + 6.0 * 50.0);
        assert_eq!(summary.footer, FooterPlacement::SameFlow);

        let text = texts(&composed.pages[0]);
        assert!(text.contains(&"GRAND TOTAL".to_string()));
        assert!(text.contains(&"HKD 1,234.5".to_string()));
        assert!(text.contains(&"INV2026-1019-1042".to_string()));
        assert!(text.contains(&"PAYMENT".to_string()));
    }

    #[test]
    fn test_rows_keep_order() {
        let composed = compose_default(&order(20));
        let skus: Vec<String> = composed
            .pages
            .iter()
            .flat_map(texts)
            .filter(|t| t.starts_with("SKU-"))
            .collect();
        let expected: Vec<String> = (0..20).map(|i| format!("SKU-{i:03}")).collect();
        assert_eq!(skus, expected);
    }

    #[test]
    fn test_totals_land_on_last_table_page() {
        let composed = compose_default(&order(20));
        assert_eq!(composed.summary.table_pages, 2);
        let second = texts(&composed.pages[1]);
        assert!(second.contains(&"GRAND TOTAL".to_string()));
        assert!(!texts(&composed.pages[0]).contains(&"GRAND TOTAL".to_string()));
    }

    #[test]
    fn test_elements_stay_on_the_page() {
        for n in [14, 15, 39, 40] {
            let composed = compose_default(&order(n));
            for (index, page) in composed.pages.iter().enumerate() {
                for element in &page.elements {
                    assert!(
                        element.y + element.height <= page.height,
                        "n = {}, page {}: {:?} ends at {}",
                        n,
                        index,
                        element.draw,
                        element.y + element.height
                    );
                }
            }
        }
    }

    #[test]
    fn test_full_first_page_carries_totals_over() {
        let composed = compose_default(&order(15));
        let summary = &composed.summary;
        assert_eq!(summary.table_pages, 2);
        assert_eq!(summary.page_items, vec![(0, 15), (15, 15)]);
        assert_eq!(summary.totals_row, 3);
        assert_eq!(summary.totals_offset, 150.0);
        assert!(!texts(&composed.pages[0]).contains(&"GRAND TOTAL".to_string()));
        assert!(texts(&composed.pages[1]).contains(&"Courier".to_string()));
        assert!(texts(&composed.pages[1]).contains(&"GRAND TOTAL".to_string()));

        let mut no_shipping = order(14);
        no_shipping.shipping_cost = None;
        assert_eq!(compose_default(&no_shipping).summary.table_pages, 1);
    }

    #[test]
    fn test_footer_overflows_at_first_page_limit() {
        let fits = compose_default(&order(4));
        assert_eq!(fits.summary.footer, FooterPlacement::SameFlow);

        let crowded = compose_default(&order(5));
        assert_eq!(crowded.summary.footer, FooterPlacement::NewPageOverflow);
        assert_eq!(crowded.summary.total_pages, crowded.summary.table_pages + 1);
        assert!(texts(crowded.pages.last().unwrap()).contains(&"PAYMENT".to_string()));
    }

    #[test]
    fn test_footer_overflow_can_be_disabled() {
        let mut config = InvoiceConfig::default();
        config.layout.footer_overflow_page = false;
        let composed = compose(&order(5), &config, &LogoAsset::None).unwrap();
        assert_eq!(composed.summary.footer, FooterPlacement::SameFlow);
        assert_eq!(composed.summary.total_pages, 1);
    }

    #[test]
    fn test_footer_overflows_when_out_of_room() {
        let mut config = InvoiceConfig::default();
        config.terms = (0..30).map(|i| format!("Term {i}")).collect();
        let composed = compose(&order(1), &config, &LogoAsset::None).unwrap();
        assert_eq!(composed.summary.footer, FooterPlacement::NewPageOverflow);
    }

    #[test]
    fn test_long_description_wraps_and_clamps() {
        let mut o = order(1);
        o.line_items[0].description = "x".repeat(500);
        let composed = compose_default(&o);
        let wrapped: Vec<&LayoutElement> = composed.pages[0]
            .elements
            .iter()
            .filter(|e| matches!(&e.draw, DrawCommand::Text { content, .. } if content.starts_with('x')))
            .collect();
        assert_eq!(wrapped.len(), 3);
        assert!(wrapped
            .iter()
            .all(|e| matches!(e.draw, DrawCommand::Text { font_size, .. } if font_size == 8.0)));
        assert!(matches!(&wrapped[2].draw, DrawCommand::Text { content, .. } if content.ends_with("...")));
    }

    #[test]
    fn test_strict_policy_rejects_missing_totals() {
        let mut config = InvoiceConfig::default();
        config.data_policy = DataPolicy::Strict;
        let mut o = order(2);
        o.totals = None;
        let err = compose(&o, &config, &LogoAsset::None).unwrap_err();
        assert!(matches!(err, FolioError::MalformedOrder { ref field } if field == "totals"));
    }

    #[test]
    fn test_lenient_policy_renders_blank() {
        let mut o = order(2);
        o.totals = None;
        o.customer = Customer::default();
        o.line_items[0].sku = None;
        let composed = compose_default(&o);
        let text = texts(&composed.pages[0]);
        assert!(!text.contains(&"GRAND TOTAL".to_string()));
        assert!(text.contains(&"-".to_string()));
        assert_eq!(composed.summary.totals_row, 5);
    }

    #[test]
    fn test_free_shipping_has_no_row() {
        let mut o = order(3);
        o.shipping_cost = Some(Money::new(0.0, "HKD"));
        let composed = compose_default(&o);
        assert_eq!(composed.summary.totals_row, 5);
    }

    #[test]
    fn test_repeat_table_header() {
        let mut config = InvoiceConfig::default();
        config.layout.repeat_table_header = true;
        let composed = compose(&order(20), &config, &LogoAsset::None).unwrap();
        assert!(texts(&composed.pages[1]).contains(&"Item Code".to_string()));

        let plain = compose_default(&order(20));
        assert!(!texts(&plain.pages[1]).contains(&"Item Code".to_string()));
    }

    #[test]
    fn test_payment_details_and_contact_block() {
        let mut config = InvoiceConfig::default();
        config.payment_details = vec![LabeledValue::new("SWIFT code:", "ABCDHKHH")];
        config.footer.right = vec!["Email: hello@example.com".to_string(), "Tel: 555".to_string()];
        let composed = compose(&order(1), &config, &LogoAsset::None).unwrap();
        let page = &composed.pages[0];
        let tel = page
            .elements
            .iter()
            .find(|e| matches!(&e.draw, DrawCommand::Text { content, .. } if content == "Tel: 555"))
            .unwrap();
        let email = page
            .elements
            .iter()
            .find(|e| matches!(&e.draw, DrawCommand::Text { content, .. } if content.starts_with("Email: hello")))
            .unwrap();
        assert_eq!(tel.y - email.y, CONTACT_LINE_STEP);
        assert!(tel.y < page.height);
    }

    #[test]
    fn test_fonts_by_block() {
        let composed = compose_default(&order(1));
        let font_of = |wanted: &str| {
            composed.pages[0].elements.iter().find_map(|e| match &e.draw {
                DrawCommand::Text { content, font, .. } if content == wanted => Some(*font),
                _ => None,
            })
        };
        assert_eq!(font_of("INVOICE"), Some(FontId::Bold));
        assert_eq!(font_of("Ada Wong"), Some(FontId::Localized));
        assert_eq!(font_of("Name:"), Some(FontId::Regular));
    }

    #[test]
    fn test_placeholder_logo() {
        let composed = compose(&order(1), &InvoiceConfig::default(), &LogoAsset::Placeholder).unwrap();
        assert!(composed.pages[0]
            .elements
            .iter()
            .any(|e| matches!(e.draw, DrawCommand::ImagePlaceholder)));
    }

    #[test]
    fn test_state_order() {
        let s = ComposerState::Initializing;
        assert!(s.can_advance_to(ComposerState::HeaderDrawn));
        assert!(!s.can_advance_to(ComposerState::TotalsDrawn));
        assert!(ComposerState::TableHeaderDrawn.can_advance_to(ComposerState::EmittingRows { page: 1 }));
        assert!(ComposerState::EmittingRows { page: 1 }
            .can_advance_to(ComposerState::EmittingRows { page: 2 }));
        assert!(!ComposerState::EmittingRows { page: 1 }
            .can_advance_to(ComposerState::EmittingRows { page: 3 }));
        assert!(ComposerState::EmittingRows { page: 4 }.can_advance_to(ComposerState::TotalsDrawn));
    }
}
