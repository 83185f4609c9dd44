//! Image captioning.

use crate::inference::{InferenceClient, InferenceError, first_text};
use crate::metadata::ExifRecord;
use crate::upload::DecodedImage;

/// Something that can describe an image in a short sentence.
///
/// Implementations block until the description is ready and make a single
/// attempt.
pub trait Captioner: Send + Sync {
    /// Describes `image`; a successful caption is never empty.
    fn caption(&self, image: &DecodedImage) -> Result<String, InferenceError>;
}

/// Captioner backed by a hosted image-to-text model (BLIP by default).
#[derive(Clone, Debug)]
pub struct HostedCaptioner {
    client: InferenceClient,
    model: String,
}

impl HostedCaptioner {
    /// Uses `model` through `client`.
    pub fn new(client: InferenceClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

impl Captioner for HostedCaptioner {
    fn caption(&self, image: &DecodedImage) -> Result<String, InferenceError> {
        let outputs = self
            .client
            .post_bytes(&self.model, "image/jpeg", image.jpeg())?;
        first_text(&self.model, outputs)
    }
}

/// Captions `image` once, appending the metadata block when a non-empty
/// record is given.
pub fn produce_caption(
    captioner: &dyn Captioner,
    image: &DecodedImage,
    metadata: Option<&ExifRecord>,
) -> Result<String, InferenceError> {
    let caption = captioner.caption(image)?;
    if caption.trim().is_empty() {
        return Err(InferenceError::EmptyOutput("captioner".to_string()));
    }
    Ok(with_metadata(caption, metadata))
}

/// Appends the rendered metadata block after a blank line.
pub fn with_metadata(caption: String, metadata: Option<&ExifRecord>) -> String {
    match metadata.and_then(ExifRecord::render_block) {
        Some(block) => format!("{caption}\n\n{block}"),
        None => caption,
    }
}
