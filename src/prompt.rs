//! Prompt rendering for the article generator.
//!
//! Rendering is pure and total: any caption, instruction or reference text
//! produces a prompt. The only transformation applied to the inputs is the
//! reference cap, see [`trim_reference`].

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::REFERENCE_CHAR_CAP;
use crate::language::Language;

/// A fully rendered instruction for the generation model.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Prompt(String);

impl Prompt {
    /// The rendered text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Marker appended to a reference cut at [`REFERENCE_CHAR_CAP`].
pub fn truncation_marker(language: Language) -> &'static str {
    match language {
        Language::Indonesian => "[referensi dipotong]",
        Language::English => "[reference truncated]",
    }
}

/// Caps `reference` at [`REFERENCE_CHAR_CAP`] characters, appending the
/// truncation marker on its own line when anything was cut.
pub fn trim_reference(reference: &str, language: Language) -> Cow<'_, str> {
    match reference.char_indices().nth(REFERENCE_CHAR_CAP) {
        None => Cow::Borrowed(reference),
        Some((cut, _)) => Cow::Owned(format!(
            "{}\n{}",
            &reference[..cut],
            truncation_marker(language)
        )),
    }
}

/// Renders the article prompt.
///
/// A `reference` that is absent or blank produces no reference block.
pub fn build_prompt(
    caption: &str,
    instruction: &str,
    language: Language,
    reference: Option<&str>,
) -> Prompt {
    let reference_block = reference
        .filter(|text| !text.trim().is_empty())
        .map(|text| render_reference_block(&trim_reference(text, language), language))
        .unwrap_or_default();

    let rendered = match language {
        Language::Indonesian => format!(
            r#"
Kamu adalah seorang jurnalis profesional yang mahir dalam menulis berita berkualitas tinggi dalam Bahasa Indonesia.

Berikut adalah deskripsi visual dari gambar yang disediakan:
"{caption}"

Dan berikut permintaan dari pengguna:
"{instruction}"
{reference_block}
Tugasmu:
- Tulis artikel berita panjang berdasarkan permintaan pengguna.
- Gunakan gaya bahasa jurnalistik Indonesia yang alami.

---

**🕴️ Judul:**
Tulis judul yang singkat, jelas, dan menarik.

**📌 Pembuka (Lead):**
Tuliskan paragraf pembuka yang menjawab 5W+1H secara padat.

**📖 Isi Berita (minimal 1000 kata):**
Rinci kronologi, penyebab, dampak, kutipan, dan respons terkait.

**🗾 Penutup:**
Simpulkan peristiwa secara ringkas.

"#
        ),
        Language::English => format!(
            r#"
You are a professional journalist skilled at writing high-quality news in English.

Here is a visual description of the provided image:
"{caption}"

And here is the user's request:
"{instruction}"
{reference_block}
Your task:
- Write a long news article based on the user's request.
- Use a natural English journalistic style.

---

**🕴️ Headline:**
Write a short, clear and compelling headline.

**📌 Lead:**
Write an opening paragraph that answers the 5W+1H concisely.

**📖 Body (at least 1000 words):**
Detail the chronology, causes, impact, quotes and official responses.

**🗾 Closing:**
Summarise the event briefly.

"#
        ),
    };

    Prompt(rendered)
}

fn render_reference_block(reference: &str, language: Language) -> String {
    match language {
        Language::Indonesian => format!(
            r#"
Berikut adalah teks referensi. Gunakan HANYA sebagai panduan gaya penulisan, BUKAN sebagai sumber fakta, dan jangan menyalin kalimatnya secara langsung:
<<<REFERENSI
{reference}
REFERENSI>>>
"#
        ),
        Language::English => format!(
            r#"
Here is a reference text. Use it ONLY as guidance for writing style, NEVER as a source of facts, and do not copy its sentences verbatim:
<<<REFERENCE
{reference}
REFERENCE>>>
"#
        ),
    }
}
