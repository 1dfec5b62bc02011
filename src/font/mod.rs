//! # Font Management
//!
//! The invoice uses two faces: standard Helvetica for everything Latin, and
//! an embedded TrueType font for customer-supplied text that may be
//! non-Latin (names and addresses). When no TrueType font is available the
//! localized face falls back to Helvetica.

use std::collections::HashMap;

use crate::error::FolioError;

/// The face a text element asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontId {
    Regular,
    Bold,
    Localized,
}

/// Standard PDF fonts used by the layout. No embedding needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }
}

/// A TrueType font that gets embedded whole.
#[derive(Debug, Clone)]
pub struct EmbeddedFont {
    pub family: String,
    pub data: Vec<u8>,
}

impl EmbeddedFont {
    /// Validate `data` as a TrueType/OpenType face.
    pub fn from_bytes(family: &str, data: Vec<u8>) -> Result<Self, FolioError> {
        ttf_parser::Face::parse(&data, 0)
            .map_err(|e| FolioError::Font(format!("Failed to parse font '{}': {}", family, e)))?;
        Ok(Self {
            family: family.to_string(),
            data,
        })
    }

    /// Glyph IDs for each of `chars` the face covers.
    pub fn glyph_ids<'t>(
        &self,
        chars: impl IntoIterator<Item = &'t char>,
    ) -> Result<HashMap<char, u16>, FolioError> {
        let face = ttf_parser::Face::parse(&self.data, 0).map_err(|e| {
            FolioError::Font(format!("Failed to parse font '{}': {}", self.family, e))
        })?;
        Ok(chars
            .into_iter()
            .filter_map(|&ch| face.glyph_index(ch).map(|gid| (ch, gid.0)))
            .collect())
    }
}

#[derive(Debug, Clone)]
pub enum ResolvedFont<'a> {
    Standard(StandardFont),
    Embedded(&'a EmbeddedFont),
}

/// The faces available to one document.
#[derive(Debug, Clone, Default)]
pub struct FontSet {
    localized: Option<EmbeddedFont>,
}

impl FontSet {
    pub fn new(localized: Option<EmbeddedFont>) -> Self {
        Self { localized }
    }

    pub fn has_localized(&self) -> bool {
        self.localized.is_some()
    }

    pub fn resolve(&self, id: FontId) -> ResolvedFont<'_> {
        match id {
            FontId::Regular => ResolvedFont::Standard(StandardFont::Helvetica),
            FontId::Bold => ResolvedFont::Standard(StandardFont::HelveticaBold),
            FontId::Localized => match &self.localized {
                Some(font) => ResolvedFont::Embedded(font),
                None => ResolvedFont::Standard(StandardFont::Helvetica),
            },
        }
    }
}
