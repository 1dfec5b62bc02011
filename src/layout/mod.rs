//! # Coordinate Layout
//!
//! The invoice is laid out with fixed coordinates, not a box model. Every
//! block knows its own offsets; the only moving parts are the row cursor
//! inside the itemized table and the section offset of the table on the
//! current page.
//!
//! ```text
//! geometry   - (row, column) → absolute cell position
//! wrap       - long descriptions → fixed-width chunks
//! page_break - line items → per-page slices
//! composer   - header, customer, table, totals, footer → LayoutPages
//! ```
//!
//! The output is a list of [`LayoutPage`]s holding plain draw commands that
//! the PDF writer serializes. All `y` values are measured down from the top
//! edge of the page; for text `y` is the baseline.

pub mod composer;
pub mod geometry;
pub mod page_break;
pub mod wrap;

use crate::font::FontId;
use crate::assets::LogoImage;
use crate::style::Color;

/// One finished page.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<LayoutElement>,
}

impl LayoutPage {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            elements: Vec::new(),
        }
    }

    /// Concatenated text of every text element, in draw order.
    pub fn text_content(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|element| match &element.draw {
                DrawCommand::Text { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// A positioned draw command.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub draw: DrawCommand,
}

#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Filled rectangle; `y` is the top edge.
    Rect { fill: Color },
    /// Single line of text; `y` is the baseline.
    Text {
        content: String,
        font: FontId,
        font_size: f64,
        color: Color,
    },
    /// Raster image scaled into the element box; `y` is the top edge.
    Image { image: LogoImage },
    /// Grey box standing in for an image that could not be loaded.
    ImagePlaceholder,
}
