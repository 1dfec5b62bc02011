//! # Style Primitives
//!
//! Colors and the fixed type scale used by the invoice layout. There is no
//! cascade here: every draw call names its size and color explicitly.

use serde::{Deserialize, Serialize};

/// An RGB color with alpha, each channel in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    #[serde(default = "opaque")]
    pub a: f64,
}

fn opaque() -> f64 {
    1.0
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    /// Dark navy used for the header band, table header and totals bar.
    pub const BRAND: Color = Color {
        r: 35.0 / 255.0,
        g: 38.0 / 255.0,
        b: 62.0 / 255.0,
        a: 1.0,
    };
    /// Fill for a logo that could not be loaded.
    pub const PLACEHOLDER: Color = Color {
        r: 0.9,
        g: 0.9,
        b: 0.9,
        a: 1.0,
    };
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// The type scale, in points.
pub struct FontScale;

impl FontScale {
    pub const XS: f64 = 8.0;
    pub const SM: f64 = 10.0;
    pub const BASE: f64 = 10.0;
    pub const MD: f64 = 12.0;
    pub const LG: f64 = 14.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_defaults_to_opaque() {
        let color: Color = serde_json::from_str(r#"{ "r": 1.0, "g": 1.0, "b": 1.0 }"#).unwrap();
        assert_eq!(color, Color::WHITE);
    }

    #[test]
    fn test_default_is_black() {
        assert_eq!(Color::default(), Color::BLACK);
    }
}
