//! Image validation for generated images.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use super::ImageError;

/// Formats accepted from the image model.
pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Maximum size of one generated image (10MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Check that `data` is an allowed image and return its content type.
///
/// Image endpoints answer errors with JSON bodies and a 200 now and then,
/// so every response goes through here before upload.
pub fn validate_image(data: &[u8]) -> Result<&'static str, ImageError> {
    if data.is_empty() {
        return Err(ImageError::InvalidImage("empty image body".to_string()));
    }
    if data.len() > MAX_FILE_SIZE {
        return Err(ImageError::InvalidImage(format!(
            "Image too large: {} bytes (max {})",
            data.len(),
            MAX_FILE_SIZE
        )));
    }

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::InvalidImage(format!("Failed to read image: {}", e)))?;

    let format = reader
        .format()
        .ok_or_else(|| ImageError::InvalidImage("Could not detect image format".to_string()))?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(ImageError::InvalidImage(format!(
            "Unsupported image format: {:?}. Allowed: JPEG, PNG, GIF, WebP",
            format
        )));
    }

    Ok(format.to_mime_type())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::fake::placeholder_png;

    #[test]
    fn accepts_png() {
        let png = placeholder_png("soup").unwrap();
        assert_eq!(validate_image(&png).unwrap(), "image/png");
    }

    #[test]
    fn rejects_json_error_body() {
        let body = br#"{"error":"Model is currently loading"}"#;
        assert!(validate_image(body).is_err());
    }

    #[test]
    fn rejects_empty() {
        assert!(validate_image(&[]).is_err());
    }
}
