use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::DeskError;

const FLASH_KEY: &str = "flash_notices";

/// Warning shown when the article form is submitted without an instruction.
pub(crate) const EMPTY_INSTRUCTION: &str = "Tolong masukkan perintah atau pertanyaan.";
/// Warning shown when the image form is submitted without a file.
pub(crate) const MISSING_IMAGE: &str = "Pilih gambar terlebih dahulu.";
/// Warning shown when the reference form is submitted without a file.
pub(crate) const MISSING_REFERENCE: &str = "Pilih dokumen referensi terlebih dahulu.";
/// Warning shown when a reference document has no text at all.
pub(crate) const EMPTY_REFERENCE: &str = "⚠️ Dokumen referensi tidak berisi teks.";

/// A one-shot message shown on the next page render.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub(crate) struct Notice {
    pub(crate) text: String,
    pub(crate) class: String,
}

impl Notice {
    pub(crate) fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            class: "success".to_string(),
        }
    }

    pub(crate) fn warning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            class: "warning".to_string(),
        }
    }
}

pub(crate) async fn push_notice(session: &Session, notice: Notice) -> Result<(), DeskError> {
    let mut notices = session
        .get::<Vec<Notice>>(FLASH_KEY)
        .await?
        .unwrap_or_default();
    notices.push(notice);
    session.insert(FLASH_KEY, notices).await?;
    Ok(())
}

pub(crate) async fn take_notices(session: &Session) -> Result<Vec<Notice>, DeskError> {
    Ok(session
        .remove::<Vec<Notice>>(FLASH_KEY)
        .await?
        .unwrap_or_default())
}
