//! Shared constants/setters for things
//!

/// Largest accepted image upload, in bytes.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Largest accepted request body; bigger than [`MAX_IMAGE_BYTES`] so oversized
/// images reach the handler and get a friendly warning.
pub const MAX_REQUEST_BYTES: usize = 32 * 1024 * 1024;

/// Number of reference characters embedded in a prompt.
pub const REFERENCE_CHAR_CAP: usize = 2000;

/// Largest uncompressed Word document body we read.
pub const MAX_DOCX_XML_BYTES: usize = 32 * 1024 * 1024;

/// Longest edge of the preview thumbnail, in pixels.
pub const THUMBNAIL_EDGE: u32 = 320;

/// Default Hugging Face inference endpoint.
pub const DEFAULT_INFERENCE_BASE: &str = "https://api-inference.huggingface.co/";

/// Default captioning model.
pub const DEFAULT_CAPTION_MODEL: &str = "Salesforce/blip-image-captioning-base";

/// Default text generation model.
pub const DEFAULT_TEXT_MODEL: &str = "meta-llama/Llama-2-7b-chat-hf";

/// Default token budget for a generated article.
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 2048;

/// Prefix of the exported history file name.
pub const EXPORT_FILE_PREFIX: &str = "riwayat_artikel";

/// Length of CSRF session tokens
pub const CSRF_TOKEN_LENGTH: usize = 32;

/// Idle time before a desk session is dropped, in minutes.
pub const SESSION_IDLE_MINUTES: i64 = 120;
