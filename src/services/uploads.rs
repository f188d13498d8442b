//! Upload sniffing shared by book and profile images

use image::ImageFormat;

use crate::domain::DomainError;

const INVALID_IMAGE: &str = "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// File extension for an uploaded picture, judged from its magic bytes
pub fn image_extension(bytes: &[u8]) -> Result<&'static str, DomainError> {
    if bytes.is_empty() {
        return Err(DomainError::validation("image", "The submitted file is empty."));
    }

    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => Ok("png"),
        Ok(ImageFormat::Jpeg) => Ok("jpg"),
        _ => Err(DomainError::validation("image", INVALID_IMAGE)),
    }
}

#[cfg(test)]
pub(crate) const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_png_and_jpeg() {
        assert_eq!(image_extension(PNG_BYTES).unwrap(), "png");
        assert_eq!(image_extension(b"\xff\xd8\xff\xe0rest").unwrap(), "jpg");
    }

    #[test]
    fn rejects_other_payloads() {
        assert!(matches!(
            image_extension(b"just some text"),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(image_extension(b""), Err(DomainError::Validation(_))));
    }
}
