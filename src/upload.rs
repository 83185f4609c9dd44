//! Uploaded images: size checks, decoding and preview thumbnails.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::constants::{MAX_IMAGE_BYTES, THUMBNAIL_EDGE};

/// Raw bytes of an uploaded image plus its declared MIME type.
#[derive(Clone, Debug)]
pub struct UploadedImage {
    /// Encoded image bytes as uploaded.
    pub bytes: Vec<u8>,
    /// MIME type declared by the client, if any.
    pub mime: Option<String>,
}

/// An image that decoded cleanly, ready for the captioner.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    rgb: DynamicImage,
    jpeg: Vec<u8>,
}

/// Why an upload couldn't be turned into a [`DecodedImage`].
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// Larger than [`MAX_IMAGE_BYTES`].
    #[error("⚠️ File terlalu besar! Maksimal ukuran file adalah 10 MB.")]
    TooLarge {
        /// Size of the upload in bytes.
        size: usize,
    },
    /// Declared as something other than JPEG or PNG.
    #[error("⚠️ Format gambar tidak didukung ({0}). Gunakan JPG atau PNG.")]
    UnsupportedType(String),
    /// The bytes aren't a readable image.
    #[error("⚠️ Gambar tidak dapat dibaca: {0}")]
    Undecodable(String),
    /// Re-encoding for the captioner failed.
    #[error("Gagal menyiapkan gambar: {0}")]
    Encode(String),
}

const ACCEPTED_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

impl UploadedImage {
    /// Wraps uploaded bytes.
    pub fn new(bytes: Vec<u8>, mime: Option<String>) -> Self {
        Self { bytes, mime }
    }

    /// Size of the upload in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for an empty upload.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Checks the size cap and declared type without decoding anything.
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.len() > MAX_IMAGE_BYTES {
            return Err(ImageError::TooLarge { size: self.len() });
        }
        if let Some(mime) = self.mime.as_deref() {
            let mime = mime.trim().to_ascii_lowercase();
            if mime != "application/octet-stream" && !ACCEPTED_TYPES.contains(&mime.as_str()) {
                return Err(ImageError::UnsupportedType(mime));
            }
        }
        Ok(())
    }

    /// Validates, decodes and converts the image to RGB.
    pub fn decode(&self) -> Result<DecodedImage, ImageError> {
        self.validate()?;
        if self.bytes.len() < 4 {
            debug!("Image is too short");
            return Err(ImageError::Undecodable("file kosong".to_string()));
        }

        let reader = image::ImageReader::new(Cursor::new(&self.bytes))
            .with_guessed_format()
            .map_err(|err| {
                debug!("Failed to guess image format: {}", err);
                ImageError::Undecodable(err.to_string())
            })?;
        let format = reader.format();
        let image = reader.decode().map_err(|err| {
            debug!("Failed to decode image: {}", err);
            ImageError::Undecodable(err.to_string())
        })?;

        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let jpeg = if format == Some(ImageFormat::Jpeg) && image.color() == rgb.color() {
            self.bytes.clone()
        } else {
            encode(&rgb, ImageFormat::Jpeg)?
        };
        Ok(DecodedImage { rgb, jpeg })
    }
}

impl DecodedImage {
    /// JPEG bytes of the RGB image.
    pub fn jpeg(&self) -> &[u8] {
        &self.jpeg
    }

    /// Pixel dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.rgb.width(), self.rgb.height())
    }

    /// A small JPEG preview as a `data:` URI.
    pub fn thumbnail_data_uri(&self) -> Result<String, ImageError> {
        let thumbnail = self.rgb.thumbnail(THUMBNAIL_EDGE, THUMBNAIL_EDGE);
        let bytes = encode(&thumbnail, ImageFormat::Jpeg)?;
        Ok(format!(
            "data:image/jpeg;base64,{}",
            general_purpose::STANDARD.encode(bytes)
        ))
    }
}

fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, ImageError> {
    let mut output = Cursor::new(Vec::new());
    image
        .write_to(&mut output, format)
        .map_err(|err| ImageError::Encode(err.to_string()))?;
    Ok(output.into_inner())
}
