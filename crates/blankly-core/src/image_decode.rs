//! Decode-on-load for image sources.
//!
//! Persisted scenes and relayed snapshots only carry an image's `src`
//! reference. Before an image can be displayed its pixels are decoded again;
//! images whose source fails to decode are dropped from the restored scene
//! while the rest proceed.

use crate::shapes::{DrawableId, ImageItem};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::sync::Arc;
use thiserror::Error;

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Reasons an image source could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not a data URL")]
    NotDataUrl,
    #[error("data URL is not base64 encoded")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Turns an image source reference into pixels.
pub trait ImageDecoder {
    fn decode(&self, src: &str) -> Result<DecodedImage, DecodeError>;
}

/// Decoder for `data:<mime>;base64,<payload>` sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUrlDecoder;

impl DataUrlDecoder {
    /// Extract the raw bytes from a base64 data URL.
    pub fn payload(src: &str) -> Result<Vec<u8>, DecodeError> {
        let rest = src.trim().strip_prefix("data:").ok_or(DecodeError::NotDataUrl)?;
        let (meta, data) = rest.split_once(',').ok_or(DecodeError::NotDataUrl)?;
        if !meta.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
            return Err(DecodeError::NotBase64);
        }
        Ok(STANDARD.decode(data.trim())?)
    }
}

impl ImageDecoder for DataUrlDecoder {
    fn decode(&self, src: &str) -> Result<DecodedImage, DecodeError> {
        let bytes = Self::payload(src)?;
        let rgba = image::load_from_memory(&bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(DecodedImage {
            width,
            height,
            rgba: rgba.into_vec(),
        })
    }
}

/// Result of decoding one image.
#[derive(Debug)]
pub enum DecodeOutcome {
    Loaded(ImageItem),
    Failed { id: DrawableId, error: DecodeError },
}

/// Decode a single image, attaching its pixels on success.
pub fn decode_item(mut item: ImageItem, decoder: &dyn ImageDecoder) -> DecodeOutcome {
    match decoder.decode(&item.src) {
        Ok(pixels) => {
            item.pixels = Some(Arc::new(pixels));
            DecodeOutcome::Loaded(item)
        }
        Err(error) => DecodeOutcome::Failed { id: item.id, error },
    }
}

/// Decode every image, keeping the ones that load and logging the rest.
pub fn rehydrate(images: Vec<ImageItem>, decoder: &dyn ImageDecoder) -> Vec<ImageItem> {
    images
        .into_iter()
        .filter_map(|item| match decode_item(item, decoder) {
            DecodeOutcome::Loaded(item) => Some(item),
            DecodeOutcome::Failed { id, error } => {
                log::warn!("Dropping image {}: {}", id, error);
                None
            }
        })
        .collect()
}
