//! Request-to-article orchestration.
//!
//! ```text
//! image ──► decode ──► metadata ──► caption ─┐
//! reference ──► extract text ────────────────┤
//! instruction ───────────────────────────────┴─► plan ─► prompt ─► generate ─► history
//! ```
//!
//! Input problems come back as warnings and the affected step is skipped.
//! Collaborator failures are returned as errors and nothing is recorded.

use chrono::Utc;
use tracing::{info, warn};

use crate::caption::{Captioner, produce_caption};
use crate::generator::ArticleGenerator;
use crate::history::ArticleRecord;
use crate::inference::InferenceError;
use crate::language::Language;
use crate::metadata::{ExifRecord, read_metadata};
use crate::planner::{PlannerResult, plan};
use crate::prompt::{Prompt, build_prompt};
use crate::reference::{ReferenceDocument, ReferenceError};
use crate::upload::{ImageError, UploadedImage};

/// A caption plus what was learnt about the image along the way.
#[derive(Clone, Debug)]
pub struct ImageAnalysis {
    /// Caption, with the metadata block appended if requested.
    pub caption: String,
    /// Metadata read from the upload.
    pub metadata: ExifRecord,
    /// Small preview as a `data:` URI, if one could be made.
    pub thumbnail: Option<String>,
}

/// Result of analysing an uploaded image.
#[derive(Debug)]
pub enum ImageOutcome {
    /// The image was captioned.
    Described(ImageAnalysis),
    /// The upload was rejected; nothing was captioned.
    Rejected(ImageError),
}

/// Validates, decodes and captions an upload.
///
/// Oversized or unreadable images are rejected without calling the
/// captioner. A captioner failure is an error.
pub fn analyze_image(
    upload: &UploadedImage,
    captioner: &dyn Captioner,
    include_metadata: bool,
) -> Result<ImageOutcome, InferenceError> {
    let decoded = match upload.decode() {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!("Rejected image upload ({} bytes): {}", upload.len(), err);
            return Ok(ImageOutcome::Rejected(err));
        }
    };

    let metadata = read_metadata(&upload.bytes);
    let caption = produce_caption(
        captioner,
        &decoded,
        include_metadata.then_some(&metadata),
    )?;
    let thumbnail = match decoded.thumbnail_data_uri() {
        Ok(uri) => Some(uri),
        Err(err) => {
            warn!("Couldn't build thumbnail: {}", err);
            None
        }
    };
    info!(
        "Captioned {}x{} image",
        decoded.dimensions().0,
        decoded.dimensions().1
    );

    Ok(ImageOutcome::Described(ImageAnalysis {
        caption,
        metadata,
        thumbnail,
    }))
}

/// Reads the text of a reference document, logging failures.
pub fn load_reference(document: &ReferenceDocument) -> Result<String, ReferenceError> {
    document.extract_text().inspect_err(|err| {
        warn!("Reference {} ({}) unusable: {}", document.name, document.mime, err);
    })
}

/// Everything needed to write one article.
#[derive(Clone, Copy, Debug)]
pub struct ArticleRequest<'a> {
    /// Caption of the current image, if one was produced.
    pub caption: Option<&'a str>,
    /// What the user asked for.
    pub instruction: &'a str,
    /// Output language.
    pub language: Language,
    /// Style reference text, if the user chose to use one.
    pub reference: Option<&'a str>,
}

impl ArticleRequest<'_> {
    /// Caption text as used downstream: the caption, or the language's
    /// "no image" placeholder.
    pub fn caption_text(&self) -> &str {
        self.caption
            .filter(|caption| !caption.trim().is_empty())
            .unwrap_or_else(|| self.language.no_image_caption())
    }
}

/// Planner annotations and the rendered prompt for a request.
#[derive(Clone, Debug)]
pub struct ArticleDraft {
    /// Goals, steps and questions.
    pub plan: PlannerResult,
    /// Prompt for the generator.
    pub prompt: Prompt,
    /// Caption text the prompt embeds.
    pub caption: String,
}

/// Plans the request and renders its prompt. Never fails.
pub fn prepare_article(request: &ArticleRequest<'_>) -> ArticleDraft {
    let caption = request.caption_text();
    let plan = plan(caption, request.instruction);
    let prompt = build_prompt(
        caption,
        request.instruction,
        request.language,
        request.reference,
    );
    ArticleDraft {
        plan,
        prompt,
        caption: caption.to_string(),
    }
}

/// Generates the article for a prepared draft.
pub fn write_article(
    request: &ArticleRequest<'_>,
    draft: &ArticleDraft,
    generator: &ArticleGenerator,
) -> Result<ArticleRecord, InferenceError> {
    let result = generator.generate(&draft.prompt, request.language)?;
    info!(
        "Generated {} word article in {}",
        result.split_whitespace().count(),
        request.language.label()
    );
    Ok(ArticleRecord {
        instruction: request.instruction.to_string(),
        caption: draft.caption.clone(),
        result,
        language: request.language,
        created_at: Utc::now(),
    })
}
