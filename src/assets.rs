//! # Asset Fetching
//!
//! The logo and the localized font are fetched before any layout happens.
//! [`AssetFetcher`] is the seam: the default implementation reads `http(s)`
//! URLs with `ureq`, local paths from disk, and `data:` URIs inline. Tests
//! and batch jobs can plug in their own.
//!
//! Whether a failure aborts the invoice is decided here, by
//! [`AssetPolicy`](crate::config::AssetPolicy).
//!
//! Logos are decoded here too. JPEG stays compressed and is embedded with
//! `/DCTDecode`; PNG is expanded to RGB samples plus a soft mask when any
//! pixel is translucent.

use std::io::{Cursor, Read};

use base64::Engine;
use image::codecs::jpeg::JpegDecoder;
use image::{ColorType, ImageDecoder, ImageFormat};
use log::{debug, warn};

use crate::config::{AssetConfig, AssetPolicy, AssetSource};
use crate::error::FolioError;
use crate::font::EmbeddedFont;

/// Upper bound on a single asset download.
const MAX_ASSET_BYTES: u64 = 32 * 1024 * 1024;

/// Retrieves raw asset bytes.
pub trait AssetFetcher: Send + Sync {
    fn fetch(&self, source: &AssetSource) -> Result<Vec<u8>, FolioError>;
}

/// HTTP via `ureq`, files via `std::fs`, data URIs via base64.
#[derive(Debug, Clone, Default)]
pub struct DefaultAssetFetcher;

impl AssetFetcher for DefaultAssetFetcher {
    fn fetch(&self, source: &AssetSource) -> Result<Vec<u8>, FolioError> {
        match source {
            AssetSource::Url(url) => fetch_url(url),
            AssetSource::DataUri(uri) => decode_data_uri(uri),
            AssetSource::Path(path) => std::fs::read(path).map_err(|e| FolioError::AssetFetch {
                asset: path.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

fn fetch_url(url: &str) -> Result<Vec<u8>, FolioError> {
    debug!("fetching asset {}", url);
    let fail = |reason: String| FolioError::AssetFetch {
        asset: url.to_string(),
        reason,
    };

    // Non-2xx statuses come back as ureq::Error::Status.
    let response = ureq::get(url)
        .call()
        .map_err(|e| fail(format!("HTTP request failed: {}", e)))?;

    read_capped(response.into_reader(), MAX_ASSET_BYTES).map_err(fail)
}

/// Read everything from `reader`, refusing bodies longer than `limit`.
fn read_capped(reader: impl Read, limit: u64) -> Result<Vec<u8>, String> {
    let mut bytes = Vec::new();
    reader
        .take(limit + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| format!("Failed to read response: {}", e))?;
    if bytes.len() as u64 > limit {
        return Err(format!("asset exceeds {} MiB", limit / (1024 * 1024)));
    }
    Ok(bytes)
}

/// Decode the payload of a `data:<mime>;base64,<payload>` URI.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, FolioError> {
    let fail = |reason: String| FolioError::AssetFetch {
        asset: AssetSource::DataUri(uri.to_string()).to_string(),
        reason,
    };
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| fail("Invalid data URI: missing comma".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(fail("Only base64 data URIs are supported".to_string()));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| fail(format!("Base64 decode error: {}", e)))
}

/// A decoded logo, ready to become an image XObject.
#[derive(Debug, Clone)]
pub struct LogoImage {
    pub width: u32,
    pub height: u32,
    pub encoding: LogoEncoding,
}

#[derive(Debug, Clone)]
pub enum LogoEncoding {
    /// The original JPEG stream.
    Dct { bytes: Vec<u8>, grayscale: bool },
    /// 8-bit RGB samples, with one alpha byte per pixel when not opaque.
    Flate { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

/// Decode fetched logo bytes. Only JPEG and PNG are accepted.
pub fn decode_logo(bytes: &[u8]) -> Result<LogoImage, FolioError> {
    let format = image::guess_format(bytes)
        .map_err(|e| FolioError::Image(format!("Unrecognized logo data: {}", e)))?;
    match format {
        ImageFormat::Jpeg => {
            let decoder = JpegDecoder::new(Cursor::new(bytes))
                .map_err(|e| FolioError::Image(format!("Invalid JPEG: {}", e)))?;
            let (width, height) = decoder.dimensions();
            Ok(LogoImage {
                width,
                height,
                encoding: LogoEncoding::Dct {
                    bytes: bytes.to_vec(),
                    grayscale: decoder.color_type() == ColorType::L8,
                },
            })
        }
        ImageFormat::Png => {
            let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)
                .map_err(|e| FolioError::Image(format!("Invalid PNG: {}", e)))?;
            let alpha = decoded
                .color()
                .has_alpha()
                .then(|| decoded.to_rgba8().pixels().map(|p| p[3]).collect::<Vec<u8>>())
                .filter(|alpha| alpha.iter().any(|&a| a != u8::MAX));
            let rgb = decoded.to_rgb8();
            let (width, height) = rgb.dimensions();
            Ok(LogoImage {
                width,
                height,
                encoding: LogoEncoding::Flate {
                    rgb: rgb.into_raw(),
                    alpha,
                },
            })
        }
        other => Err(FolioError::Image(format!(
            "Unsupported logo format {:?} (expected JPEG or PNG)",
            other
        ))),
    }
}

/// How the logo ended up.
#[derive(Debug, Clone)]
pub enum LogoAsset {
    /// No logo configured; nothing is drawn.
    None,
    Loaded(LogoImage),
    /// Configured but unavailable; a placeholder box is drawn.
    Placeholder,
}

/// Assets resolved for one document.
#[derive(Debug, Clone)]
pub struct ResolvedAssets {
    pub logo: LogoAsset,
    pub localized_font: Option<EmbeddedFont>,
}

/// Fetch and decode the configured assets, applying `policy` to failures.
pub fn resolve_assets(
    config: &AssetConfig,
    policy: AssetPolicy,
    fetcher: &dyn AssetFetcher,
) -> Result<ResolvedAssets, FolioError> {
    let logo = match &config.logo {
        None => LogoAsset::None,
        Some(source) => {
            match fetcher
                .fetch(source)
                .and_then(|bytes| decode_logo(&bytes))
            {
                Ok(image) => LogoAsset::Loaded(image),
                Err(e) => {
                    tolerate(policy, "logo", source, e)?;
                    LogoAsset::Placeholder
                }
            }
        }
    };

    let localized_font = match &config.localized_font {
        None => None,
        Some(source) => match fetcher
            .fetch(source)
            .and_then(|bytes| EmbeddedFont::from_bytes(&config.localized_font_family, bytes))
        {
            Ok(font) => Some(font),
            Err(e) => {
                tolerate(policy, "localized font", source, e)?;
                None
            }
        },
    };

    Ok(ResolvedAssets {
        logo,
        localized_font,
    })
}

/// Under `Required` every asset failure is an [`FolioError::AssetFetch`];
/// under `Fallback` it is logged and swallowed.
fn tolerate(
    policy: AssetPolicy,
    what: &str,
    source: &AssetSource,
    error: FolioError,
) -> Result<(), FolioError> {
    match policy {
        AssetPolicy::Required => Err(match error {
            FolioError::AssetFetch { .. } => error,
            other => FolioError::AssetFetch {
                asset: source.to_string(),
                reason: other.to_string(),
            },
        }),
        AssetPolicy::Fallback => {
            warn!("{} unavailable, using fallback: {}", what, error);
            Ok(())
        }
    }
}
