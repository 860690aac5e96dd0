//! Base64 helpers for images coming back from the engine worker

use base64::{engine::general_purpose::STANDARD, Engine};
use image::DynamicImage;

use crate::error::{AppError, Result};

/// Decode base64 string to binary data
///
/// Accepts a bare payload or a data URL (`data:image/png;base64,...`).
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(strip_data_url(encoded).trim())
        .map_err(|e| AppError::GenerationFailure(format!("Invalid base64 image data: {}", e)))
}

/// Decode a base64 payload straight into an image, sniffing its format
pub fn decode_image(encoded: &str) -> Result<DynamicImage> {
    let bytes = decode(encoded)?;
    Ok(image::load_from_memory(&bytes)?)
}

fn strip_data_url(encoded: &str) -> &str {
    match encoded.split_once(',') {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        _ => encoded,
    }
}
