//! Target languages for generated articles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Language an article is written in.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// Bahasa Indonesia, the primary language.
    #[default]
    #[serde(rename = "id")]
    Indonesian,
    /// English.
    #[serde(rename = "en")]
    English,
}

/// Returned when a language code isn't one we write in.
#[derive(Debug, thiserror::Error)]
#[error("unsupported language code: {0}")]
pub struct UnknownLanguage(pub String);

impl Language {
    /// Every supported language, primary first.
    pub const ALL: [Language; 2] = [Language::Indonesian, Language::English];

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Language::Indonesian => "id",
            Language::English => "en",
        }
    }

    /// Human-readable label, used in history and exports.
    pub fn label(self) -> &'static str {
        match self {
            Language::Indonesian => "Bahasa Indonesia",
            Language::English => "English",
        }
    }

    /// Caption text used when no image was analysed.
    pub fn no_image_caption(self) -> &'static str {
        match self {
            Language::Indonesian => "Tidak ada gambar.",
            Language::English => "No image.",
        }
    }

    /// System-role instruction given to the generation model.
    pub fn default_system_prompt(self) -> &'static str {
        match self {
            Language::Indonesian => {
                "Kamu adalah AI Assistant yang membantu dalam jurnalisme dan penulisan berita."
            }
            Language::English => {
                "You are an AI assistant helping with journalism and news writing."
            }
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" | "indonesia" | "indonesian" => Ok(Language::Indonesian),
            "en" | "english" => Ok(Language::English),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}
