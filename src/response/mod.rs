//! Response encoding - PNG output and base64 helpers

pub mod base64;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use std::borrow::Cow;
use std::io::Cursor;

use crate::error::Result;

/// Format every generated image is returned in
pub const IMAGE_FORMAT: ImageFormat = ImageFormat::Png;

/// Content type matching [`IMAGE_FORMAT`]
pub const MEDIA_TYPE: &str = "image/png";

/// Encode an image as PNG into an in-memory buffer.
///
/// Float images are narrowed to 8-bit RGBA first since PNG has no float
/// sample type.
pub fn encode_png(image: &DynamicImage) -> Result<Bytes> {
    let image = match image {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8()))
        }
        _ => Cow::Borrowed(image),
    };

    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, IMAGE_FORMAT)?;
    buffer.set_position(0);

    Ok(Bytes::from(buffer.into_inner()))
}
