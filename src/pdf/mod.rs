//! # PDF Serializer
//!
//! Takes the composed invoice pages and writes a PDF 1.7 file by hand.
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, images, pages, streams
//! ...
//! xref                <- byte offsets of each object
//! trailer             <- root and info references
//! %%EOF
//! ```
//!
//! Latin text uses the standard Type1 Helvetica faces with WinAnsiEncoding.
//! The localized face, when one was loaded, is embedded whole as a
//! CIDFontType2 with Identity-H encoding: FontFile2, FontDescriptor,
//! CIDFont, ToUnicode CMap and the root Type0 dictionary.
//!
//! Output is byte-for-byte deterministic for the same pages and fonts:
//! every map that feeds the file is ordered, and no timestamps are written.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::FolioError;
use crate::font::{EmbeddedFont, FontSet, ResolvedFont, StandardFont};
use crate::assets::{LogoEncoding, LogoImage};
use crate::layout::{DrawCommand, LayoutElement, LayoutPage};
use crate::style::Color;

const COMPRESSION_LEVEL: u8 = 6;

/// Document information dictionary entries.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
}

pub struct PdfWriter;

/// A distinct font object in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum FontSlot {
    Helvetica,
    HelveticaBold,
    Embedded,
}

impl FontSlot {
    fn for_font(font: &ResolvedFont<'_>) -> Self {
        match font {
            ResolvedFont::Standard(StandardFont::Helvetica) => FontSlot::Helvetica,
            ResolvedFont::Standard(StandardFont::HelveticaBold) => FontSlot::HelveticaBold,
            ResolvedFont::Embedded(_) => FontSlot::Embedded,
        }
    }
}

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Font slot -> (resource index, object id), in resource order.
    font_objects: Vec<(FontSlot, usize)>,
    /// Character -> glyph ID for the embedded face.
    embedded_gids: BTreeMap<char, u16>,
    /// XObject ids, referenced as /Im0, /Im1, ...
    image_objects: Vec<usize>,
    /// (page index, image position on page) -> index into `image_objects`.
    image_index_map: BTreeMap<(usize, usize), usize>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    fn new() -> Self {
        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        Self {
            objects: (0..3).map(|_| PdfObject { data: Vec::new() }).collect(),
            font_objects: Vec::new(),
            embedded_gids: BTreeMap::new(),
            image_objects: Vec::new(),
            image_index_map: BTreeMap::new(),
        }
    }

    fn push(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }

    fn push_stream(&mut self, dict_entries: &str, body: &[u8]) -> usize {
        let mut data: Vec<u8> = Vec::new();
        let _ = write!(
            data,
            "<< /Length {}{} >>\nstream\n",
            body.len(),
            dict_entries
        );
        data.extend_from_slice(body);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }

    fn font_resource(&self, slot: FontSlot) -> usize {
        self.font_objects
            .iter()
            .position(|(s, _)| *s == slot)
            .unwrap_or(0)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write composed pages to a PDF byte vector.
    pub fn write(
        &self,
        pages: &[LayoutPage],
        info: &DocumentInfo,
        fonts: &FontSet,
    ) -> Result<Vec<u8>, FolioError> {
        let mut builder = PdfBuilder::new();

        self.register_fonts(&mut builder, pages, fonts)?;
        self.register_images(&mut builder, pages);

        let mut page_obj_ids: Vec<usize> = Vec::new();
        for (page_idx, page) in pages.iter().enumerate() {
            let content = self.build_content_stream(page, page_idx, &builder, fonts);
            let compressed = compress_to_vec_zlib(content.as_bytes(), COMPRESSION_LEVEL);
            let content_obj_id = builder.push_stream(" /Filter /FlateDecode", &compressed);

            let font_resources = self.build_font_resource_dict(&builder);
            let xobject_resources = self.build_xobject_resource_dict(page_idx, &builder);
            let resources = if xobject_resources.is_empty() {
                format!("/Font << {} >>", font_resources)
            } else {
                format!(
                    "/Font << {} >> /XObject << {} >>",
                    font_resources, xobject_resources
                )
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page.width, page.height, content_obj_id, resources
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let mut info_dict = String::from("<< ");
        if let Some(title) = &info.title {
            let _ = write!(info_dict, "/Title ({}) ", Self::escape_pdf_string(title));
        }
        if let Some(author) = &info.author {
            let _ = write!(info_dict, "/Author ({}) ", Self::escape_pdf_string(author));
        }
        info_dict.push_str("/Producer (Folio) /Creator (Folio) >>");
        let info_obj_id = builder.push(info_dict.into_bytes());

        Ok(self.serialize(&builder, info_obj_id))
    }

    fn build_content_stream(
        &self,
        page: &LayoutPage,
        page_idx: usize,
        builder: &PdfBuilder,
        fonts: &FontSet,
    ) -> String {
        let mut stream = String::new();
        let mut image_counter = 0usize;
        for element in &page.elements {
            self.write_element(
                &mut stream,
                element,
                page.height,
                builder,
                fonts,
                page_idx,
                &mut image_counter,
            );
        }
        stream
    }

    /// Write a single layout element as PDF operators. Layout `y` grows
    /// downward; PDF `y` grows upward from the bottom edge.
    #[allow(clippy::too_many_arguments)]
    fn write_element(
        &self,
        stream: &mut String,
        element: &LayoutElement,
        page_height: f64,
        builder: &PdfBuilder,
        fonts: &FontSet,
        page_idx: usize,
        image_counter: &mut usize,
    ) {
        match &element.draw {
            DrawCommand::Rect { fill } => {
                if fill.a > 0.0 {
                    let y = page_height - element.y - element.height;
                    Self::write_filled_rect(stream, fill, element.x, y, element.width, element.height);
                }
            }

            DrawCommand::Text {
                content,
                font,
                font_size,
                color,
            } => {
                let resolved = fonts.resolve(*font);
                let slot = FontSlot::for_font(&resolved);
                let font_idx = builder.font_resource(slot);
                let pdf_y = page_height - element.y;

                let _ = write!(
                    stream,
                    "BT\n{:.3} {:.3} {:.3} rg\n/F{} {:.1} Tf\n{:.2} {:.2} Td\n",
                    color.r, color.g, color.b, font_idx, font_size, element.x, pdf_y
                );

                match slot {
                    FontSlot::Embedded => {
                        let mut hex = String::new();
                        for ch in content.chars() {
                            let gid = builder.embedded_gids.get(&ch).copied().unwrap_or(0);
                            let _ = write!(hex, "{:04X}", gid);
                        }
                        let _ = writeln!(stream, "<{}> Tj", hex);
                    }
                    FontSlot::Helvetica | FontSlot::HelveticaBold => {
                        let _ = writeln!(stream, "({}) Tj", Self::encode_winansi(content));
                    }
                }
                stream.push_str("ET\n");
            }

            DrawCommand::Image { .. } => {
                let position = *image_counter;
                *image_counter += 1;
                let y = page_height - element.y - element.height;
                match builder.image_index_map.get(&(page_idx, position)) {
                    Some(&img_idx) => {
                        let _ = write!(
                            stream,
                            "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                            element.width, element.height, element.x, y, img_idx
                        );
                    }
                    None => Self::write_filled_rect(
                        stream,
                        &Color::PLACEHOLDER,
                        element.x,
                        y,
                        element.width,
                        element.height,
                    ),
                }
            }

            DrawCommand::ImagePlaceholder => {
                let y = page_height - element.y - element.height;
                Self::write_filled_rect(
                    stream,
                    &Color::PLACEHOLDER,
                    element.x,
                    y,
                    element.width,
                    element.height,
                );
            }
        }
    }

    fn write_filled_rect(stream: &mut String, fill: &Color, x: f64, y: f64, w: f64, h: f64) {
        let _ = write!(
            stream,
            "q\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
            fill.r, fill.g, fill.b, x, y, w, h
        );
    }

    /// Register one font object per distinct face used across all pages.
    fn register_fonts(
        &self,
        builder: &mut PdfBuilder,
        pages: &[LayoutPage],
        fonts: &FontSet,
    ) -> Result<(), FolioError> {
        let mut used: BTreeMap<FontSlot, BTreeSet<char>> = BTreeMap::new();
        let mut embedded: Option<&EmbeddedFont> = None;

        for element in pages.iter().flat_map(|page| &page.elements) {
            if let DrawCommand::Text { content, font, .. } = &element.draw {
                let resolved = fonts.resolve(*font);
                if let ResolvedFont::Embedded(face) = resolved {
                    embedded = Some(face);
                }
                used.entry(FontSlot::for_font(&resolved))
                    .or_default()
                    .extend(content.chars());
            }
        }

        // Always have at least Helvetica
        if used.is_empty() {
            used.insert(FontSlot::Helvetica, BTreeSet::new());
        }

        for (slot, chars) in &used {
            let obj_id = match slot {
                FontSlot::Helvetica => Self::write_standard_font(builder, StandardFont::Helvetica),
                FontSlot::HelveticaBold => {
                    Self::write_standard_font(builder, StandardFont::HelveticaBold)
                }
                FontSlot::Embedded => match embedded {
                    Some(face) => Self::write_embedded_font_objects(builder, face, chars)?,
                    None => Self::write_standard_font(builder, StandardFont::Helvetica),
                },
            };
            builder.font_objects.push((*slot, obj_id));
        }
        Ok(())
    }

    fn write_standard_font(builder: &mut PdfBuilder, font: StandardFont) -> usize {
        let font_dict = format!(
            "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
            font.pdf_name()
        );
        builder.push(font_dict.into_bytes())
    }

    /// Walk all pages, create XObjects for each image and remember which
    /// `/ImN` each one becomes.
    fn register_images(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        for (page_idx, page) in pages.iter().enumerate() {
            let images = page.elements.iter().filter_map(|element| match &element.draw {
                DrawCommand::Image { image } => Some(image),
                _ => None,
            });
            for (position, image) in images.enumerate() {
                let img_idx = builder.image_objects.len();
                let xobj_id = Self::write_image_xobject(builder, image);
                builder.image_objects.push(xobj_id);
                builder.image_index_map.insert((page_idx, position), img_idx);
            }
        }
    }

    /// Write an image as one XObject, plus an SMask when it has alpha.
    /// Returns the main XObject ID.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LogoImage) -> usize {
        let size = format!(
            " /Type /XObject /Subtype /Image /Width {} /Height {} /BitsPerComponent 8",
            image.width, image.height
        );
        match &image.encoding {
            LogoEncoding::Dct { bytes, grayscale } => {
                let color_space = if *grayscale { "/DeviceGray" } else { "/DeviceRGB" };
                builder.push_stream(
                    &format!("{} /ColorSpace {} /Filter /DCTDecode", size, color_space),
                    bytes,
                )
            }
            LogoEncoding::Flate { rgb, alpha } => {
                let smask_ref = alpha
                    .as_ref()
                    .map(|alpha| {
                        let compressed = compress_to_vec_zlib(alpha, COMPRESSION_LEVEL);
                        let id = builder.push_stream(
                            &format!("{} /ColorSpace /DeviceGray /Filter /FlateDecode", size),
                            &compressed,
                        );
                        format!(" /SMask {} 0 R", id)
                    })
                    .unwrap_or_default();

                let compressed = compress_to_vec_zlib(rgb, COMPRESSION_LEVEL);
                builder.push_stream(
                    &format!(
                        "{} /ColorSpace /DeviceRGB /Filter /FlateDecode{}",
                        size, smask_ref
                    ),
                    &compressed,
                )
            }
        }
    }

    fn build_xobject_resource_dict(&self, page_idx: usize, builder: &PdfBuilder) -> String {
        builder
            .image_index_map
            .range((page_idx, 0)..(page_idx + 1, 0))
            .map(|(_, &img_idx)| format!("/Im{} {} 0 R", img_idx, builder.image_objects[img_idx]))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Write the five CIDFont objects for the embedded face.
    /// Returns the object ID of the Type0 root font dictionary.
    fn write_embedded_font_objects(
        builder: &mut PdfBuilder,
        font: &EmbeddedFont,
        used_chars: &BTreeSet<char>,
    ) -> Result<usize, FolioError> {
        let face = ttf_parser::Face::parse(&font.data, 0).map_err(|e| {
            FolioError::Font(format!("Failed to parse TTF data for font '{}': {}", font.family, e))
        })?;

        let char_to_gid: BTreeMap<char, u16> = font.glyph_ids(used_chars)?.into_iter().collect();
        let pdf_font_name = Self::sanitize_font_name(&font.family);
        let units_per_em = face.units_per_em();
        let scale = 1000.0 / units_per_em as f64;

        // 1. FontFile2: the whole face, compressed
        let compressed_ttf = compress_to_vec_zlib(&font.data, COMPRESSION_LEVEL);
        let fontfile2_id = builder.push_stream(
            &format!(" /Length1 {} /Filter /FlateDecode", font.data.len()),
            &compressed_ttf,
        );

        // 2. FontDescriptor
        let bbox = face.global_bounding_box();
        let ascender = face.ascender();
        let cap_height = face.capital_height().unwrap_or(ascender) as f64 * scale;
        let font_descriptor = format!(
            "<< /Type /FontDescriptor /FontName /{} /Flags 4 \
             /FontBBox [{} {} {} {}] /ItalicAngle 0 \
             /Ascent {} /Descent {} /CapHeight {} /StemV 80 \
             /FontFile2 {} 0 R >>",
            pdf_font_name,
            (bbox.x_min as f64 * scale) as i32,
            (bbox.y_min as f64 * scale) as i32,
            (bbox.x_max as f64 * scale) as i32,
            (bbox.y_max as f64 * scale) as i32,
            (ascender as f64 * scale) as i32,
            (face.descender() as f64 * scale) as i32,
            cap_height as i32,
            fontfile2_id,
        );
        let font_descriptor_id = builder.push(font_descriptor.into_bytes());

        // 3. CIDFont (DescendantFont)
        let default_width = face
            .glyph_hor_advance(ttf_parser::GlyphId(0))
            .map(|adv| (adv as f64 * scale) as u32)
            .unwrap_or(1000);
        let cidfont = format!(
            "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{} \
             /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
             /FontDescriptor {} 0 R /DW {} /W {} /CIDToGIDMap /Identity >>",
            pdf_font_name,
            font_descriptor_id,
            default_width,
            Self::build_w_array(&char_to_gid, &face),
        );
        let cidfont_id = builder.push(cidfont.into_bytes());

        // 4. ToUnicode CMap
        let cmap = Self::build_tounicode_cmap(&char_to_gid, &pdf_font_name);
        let compressed_cmap = compress_to_vec_zlib(cmap.as_bytes(), COMPRESSION_LEVEL);
        let tounicode_id = builder.push_stream(" /Filter /FlateDecode", &compressed_cmap);

        // 5. Type0 root
        let type0 = format!(
            "<< /Type /Font /Subtype /Type0 /BaseFont /{} /Encoding /Identity-H \
             /DescendantFonts [{} 0 R] /ToUnicode {} 0 R >>",
            pdf_font_name, cidfont_id, tounicode_id,
        );
        let type0_id = builder.push(type0.into_bytes());

        builder.embedded_gids = char_to_gid;
        Ok(type0_id)
    }

    /// `/W` array: `[gid [width] gid [width] ...]`, sorted by glyph ID.
    fn build_w_array(char_to_gid: &BTreeMap<char, u16>, face: &ttf_parser::Face) -> String {
        let scale = 1000.0 / face.units_per_em() as f64;
        let gids: BTreeSet<u16> = char_to_gid.values().copied().collect();

        let mut result = String::from("[");
        for gid in gids {
            let advance = face.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0);
            let _ = write!(result, " {} [{}]", gid, (advance as f64 * scale) as u32);
        }
        result.push_str(" ]");
        result
    }

    /// ToUnicode CMap so text in the localized face can be copied back out.
    fn build_tounicode_cmap(char_to_gid: &BTreeMap<char, u16>, font_name: &str) -> String {
        let mut gid_to_unicode: Vec<(u16, char)> =
            char_to_gid.iter().map(|(&ch, &gid)| (gid, ch)).collect();
        gid_to_unicode.sort();
        gid_to_unicode.dedup_by_key(|(gid, _)| *gid);

        let mut cmap = String::new();
        cmap.push_str("/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n");
        cmap.push_str("/CIDSystemInfo\n<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        let _ = writeln!(cmap, "/CMapName /{}-UTF16 def", font_name);
        cmap.push_str("/CMapType 2 def\n1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

        // At most 100 entries per beginbfchar block
        for chunk in gid_to_unicode.chunks(100) {
            let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
            for &(gid, ch) in chunk {
                let mut utf16 = [0u16; 2];
                let units: String = ch
                    .encode_utf16(&mut utf16)
                    .iter()
                    .map(|unit| format!("{:04X}", unit))
                    .collect();
                let _ = writeln!(cmap, "<{:04X}> <{}>", gid, units);
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
        cmap
    }

    /// Strip everything a PDF name object cannot carry.
    fn sanitize_font_name(family: &str) -> String {
        let name: String = family
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        if name.is_empty() {
            "LocalizedFont".to_string()
        } else {
            name
        }
    }

    fn build_font_resource_dict(&self, builder: &PdfBuilder) -> String {
        builder
            .font_objects
            .iter()
            .enumerate()
            .map(|(i, (_, obj_id))| format!("/F{} {} 0 R", i, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn escape_pdf_string(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)")
    }

    /// Encode text for a WinAnsi string literal. Unmappable characters
    /// become `?`; bytes outside printable ASCII are octal-escaped.
    fn encode_winansi(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            let b = Self::unicode_to_winansi(ch).unwrap_or(b'?');
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Map a Unicode codepoint to a WinAnsiEncoding (Windows-1252) byte.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        match cp {
            0x20AC => Some(0x80), // Euro sign
            0x201A => Some(0x82),
            0x0192 => Some(0x83),
            0x201E => Some(0x84),
            0x2026 => Some(0x85), // Horizontal ellipsis
            0x2020 => Some(0x86),
            0x2021 => Some(0x87),
            0x02C6 => Some(0x88),
            0x2030 => Some(0x89),
            0x0160 => Some(0x8A),
            0x2039 => Some(0x8B),
            0x0152 => Some(0x8C),
            0x017D => Some(0x8E),
            0x2018 => Some(0x91),
            0x2019 => Some(0x92),
            0x201C => Some(0x93),
            0x201D => Some(0x94),
            0x2022 => Some(0x95), // Bullet
            0x2013 => Some(0x96),
            0x2014 => Some(0x97),
            0x02DC => Some(0x98),
            0x2122 => Some(0x99),
            0x0161 => Some(0x9A),
            0x203A => Some(0x9B),
            0x0153 => Some(0x9C),
            0x017E => Some(0x9E),
            0x0178 => Some(0x9F),
            _ => None,
        }
    }

    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        output.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );
        output
    }
}
