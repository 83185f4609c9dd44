//! Session history of written articles.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::EXPORT_FILE_PREFIX;
use crate::language::Language;

/// One generated article and what it was generated from.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// The user's instruction.
    pub instruction: String,
    /// Caption text the prompt was built from.
    pub caption: String,
    /// Generated article.
    pub result: String,
    /// Language the article was requested in.
    pub language: Language,
    /// When the article was written.
    pub created_at: DateTime<Utc>,
}

impl ArticleRecord {
    /// Export block with the literal field markers.
    pub fn export_block(&self) -> String {
        format!(
            "Pengguna: {}\nBahasa: {}\nCaption: {}\nHasil:\n{}",
            self.instruction,
            self.language.label(),
            self.caption,
            self.result
        )
    }
}

/// Append-only, ordered log of [`ArticleRecord`]s.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct HistoryLog {
    records: Vec<ArticleRecord>,
}

impl HistoryLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record at the end.
    pub fn append(&mut self, record: ArticleRecord) {
        self.records.push(record);
    }

    /// Drops every record. Only used when a session is reset.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records, most recent first.
    pub fn newest_first(&self) -> impl Iterator<Item = &ArticleRecord> {
        self.records.iter().rev()
    }

    /// Most recent record.
    pub fn latest(&self) -> Option<&ArticleRecord> {
        self.records.last()
    }

    /// All records in insertion order, separated by blank lines.
    pub fn export(&self) -> String {
        let mut blocks: Vec<String> = self
            .records
            .iter()
            .map(ArticleRecord::export_block)
            .collect();
        if !blocks.is_empty() {
            blocks.push(String::new());
        }
        blocks.join("\n\n")
    }
}

/// File name for an export made on `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("{}_{}.txt", EXPORT_FILE_PREFIX, date.format("%Y%m%d"))
}
