//! Cell addressing for the itemized table.
//!
//! Rows are counted from the top of the table section: row 1 is the dark
//! header band, line items start at row 2. A row's text baseline sits at
//! `section_offset + row * row_height`; its bottom rule and band edge sit
//! [`ROW_DROP`] below the baseline.

use serde::Serialize;

use crate::config::LayoutOptions;
use crate::style::FontScale;

/// Distance from a row's baseline to its bottom edge.
pub const ROW_DROP: f64 = 20.0;
/// Vertical step between wrapped description lines.
pub const WRAP_STEP: f64 = 13.0;
/// How far a wrapped description block is lifted above the row baseline.
pub const WRAP_LIFT: f64 = 17.0;
/// Font size of wrapped description lines.
pub const WRAPPED_FONT_SIZE: f64 = FontScale::XS;

/// The seven table columns, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Column {
    ItemCode,
    Quantity,
    Description,
    Vintage,
    Format,
    UnitPrice,
    Total,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::ItemCode,
        Column::Quantity,
        Column::Description,
        Column::Vintage,
        Column::Format,
        Column::UnitPrice,
        Column::Total,
    ];

    /// Zero-based column lookup; `None` past the last column.
    pub fn from_index(index: usize) -> Option<Column> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn header(self) -> &'static str {
        match self {
            Column::ItemCode => "Item Code",
            Column::Quantity => "Quantity",
            Column::Description => "Description",
            Column::Vintage => "Vintage",
            Column::Format => "Format",
            Column::UnitPrice => "Unit Price",
            Column::Total => "Total",
        }
    }

    /// Left boundary relative to the table's left edge.
    fn boundary(self) -> f64 {
        match self {
            Column::ItemCode => 10.0,
            Column::Quantity => 150.0,
            Column::Description => 210.0,
            Column::Vintage => 560.0,
            Column::Format => 640.0,
            Column::UnitPrice => 720.0,
            Column::Total => 800.0,
        }
    }
}

/// Which wrapped line of a multi-line cell is being placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubLine {
    pub index: usize,
    /// Whether the cell wraps onto more than one line.
    pub wrapped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellAddress {
    pub row: usize,
    pub column: Column,
    pub section_offset: f64,
    pub sub_line: Option<SubLine>,
}

impl CellAddress {
    pub fn new(row: usize, column: Column, section_offset: f64) -> Self {
        Self {
            row,
            column,
            section_offset,
            sub_line: None,
        }
    }

    pub fn line(mut self, index: usize, wrapped: bool) -> Self {
        self.sub_line = Some(SubLine { index, wrapped });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellPosition {
    pub x: f64,
    /// Baseline, measured down from the top of the page.
    pub y: f64,
    pub width: f64,
    pub font_size: f64,
}

/// Fixed column boundaries and row spacing for one document.
#[derive(Debug, Clone, Copy)]
pub struct TableGeometry {
    left: f64,
    table_width: f64,
    row_height: f64,
}

impl TableGeometry {
    pub fn new(options: &LayoutOptions) -> Self {
        Self {
            left: options.margin,
            table_width: options.table_width,
            row_height: options.row_height,
        }
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn table_width(&self) -> f64 {
        self.table_width
    }

    pub fn row_height(&self) -> f64 {
        self.row_height
    }

    /// Width between this column's boundary and the next one (or the table edge).
    pub fn column_width(&self, column: Column) -> f64 {
        let end = Column::from_index(column.index() + 1)
            .map(Column::boundary)
            .unwrap_or(self.table_width);
        (end - column.boundary()).max(0.0)
    }

    /// Baseline of `row` within a table section.
    pub fn row_baseline(&self, row: usize, section_offset: f64) -> f64 {
        section_offset + row as f64 * self.row_height
    }

    /// Bottom edge of `row`, where its rule and band end.
    pub fn row_bottom(&self, row: usize, section_offset: f64) -> f64 {
        self.row_baseline(row, section_offset) + ROW_DROP
    }

    /// Position a cell. Wrapped lines are lifted above the baseline, step
    /// down by [`WRAP_STEP`] and use [`WRAPPED_FONT_SIZE`].
    pub fn cell(&self, address: CellAddress, font_size: f64) -> CellPosition {
        let mut y = self.row_baseline(address.row, address.section_offset);
        let mut size = font_size;
        if let Some(sub_line) = address.sub_line {
            y += sub_line.index as f64 * WRAP_STEP;
            if sub_line.wrapped {
                y -= WRAP_LIFT;
                size = WRAPPED_FONT_SIZE;
            }
        }
        CellPosition {
            x: self.left + address.column.boundary(),
            y,
            width: self.column_width(address.column),
            font_size: size,
        }
    }

    /// How many wrapped lines fit inside one row without reaching its rule.
    pub fn wrapped_line_capacity(&self) -> usize {
        let room = ROW_DROP + WRAP_LIFT - 2.0;
        (room / WRAP_STEP).floor().max(0.0) as usize + 1
    }
}
