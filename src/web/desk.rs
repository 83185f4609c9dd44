//! Per-visitor desk state kept in the session store.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::DeskError;
use crate::history::{ArticleRecord, HistoryLog};
use crate::metadata::ExifRecord;
use crate::pipeline::ImageAnalysis;
use crate::planner::PlannerResult;

const DESK_KEY: &str = "desk";

/// Text extracted from the visitor's reference document.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub(crate) struct ReferenceState {
    pub(crate) name: String,
    pub(crate) text: String,
}

impl ReferenceState {
    pub(crate) fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Everything one visitor has on their desk. Loaded at the start of a
/// handler and saved back before it returns.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub(crate) struct DeskSession {
    pub(crate) caption: Option<String>,
    pub(crate) thumbnail: Option<String>,
    pub(crate) metadata: Option<ExifRecord>,
    pub(crate) reference: Option<ReferenceState>,
    pub(crate) last_plan: Option<PlannerResult>,
    pub(crate) history: HistoryLog,
}

impl DeskSession {
    /// Loads the desk, starting an empty one on first visit.
    pub(crate) async fn load(session: &Session) -> Result<Self, DeskError> {
        Ok(session
            .get::<DeskSession>(DESK_KEY)
            .await?
            .unwrap_or_default())
    }

    pub(crate) async fn save(&self, session: &Session) -> Result<(), DeskError> {
        session.insert(DESK_KEY, self).await?;
        Ok(())
    }

    pub(crate) fn set_image(&mut self, analysis: ImageAnalysis) {
        self.caption = Some(analysis.caption);
        self.thumbnail = analysis.thumbnail;
        self.metadata = Some(analysis.metadata);
    }

    /// Forgets the current image, so prompts fall back to the placeholder.
    pub(crate) fn reset_image(&mut self) {
        self.caption = None;
        self.thumbnail = None;
        self.metadata = None;
    }

    pub(crate) fn set_reference(&mut self, name: String, text: String) {
        self.reference = Some(ReferenceState { name, text });
    }

    pub(crate) fn reset_reference(&mut self) {
        self.reference = None;
    }

    pub(crate) fn record_article(&mut self, record: ArticleRecord) {
        self.history.append(record);
    }

    pub(crate) fn clear_history(&mut self) {
        self.history.clear();
        self.last_plan = None;
    }
}
