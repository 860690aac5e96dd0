//! Unit tests for response encoding

use ::base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use image_tier_gateway::response::{base64, encode_png, MEDIA_TYPE};

#[test]
fn test_media_type() {
    assert_eq!(MEDIA_TYPE, "image/png");
}

#[test]
fn test_png_round_trip_rgba() {
    let mut original = RgbaImage::new(17, 9);
    for (x, y, pixel) in original.enumerate_pixels_mut() {
        *pixel = Rgba([x as u8 * 13, y as u8 * 27, 200, (x + y) as u8 * 9]);
    }
    let original = DynamicImage::ImageRgba8(original);

    let bytes = encode_png(&original).unwrap();
    let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();

    assert_eq!(decoded.to_rgba8(), original.to_rgba8());
}

#[test]
fn test_engine_payload_as_data_url() {
    let bytes = encode_png(&DynamicImage::new_rgb8(8, 8)).unwrap();
    let data_url = format!("data:image/png;base64,{}", STANDARD.encode(&bytes));

    let image = base64::decode_image(&data_url).unwrap();
    assert_eq!((image.width(), image.height()), (8, 8));
}

#[test]
fn test_non_image_payload_rejected() {
    let payload = STANDARD.encode(b"definitely not an image");
    assert!(base64::decode_image(&payload).is_err());
}
