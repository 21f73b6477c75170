//! Fixed FAQ knowledge base and the TF-IDF index fitted over its questions.
//!
//! The knowledge base is immutable once built: entries are never added, removed,
//! or re-scored at runtime. Alternate knowledge bases can be injected for tests
//! or deployments via [`KnowledgeBase::new`] or [`KnowledgeBase::from_json_path`].

mod index;
mod stop_words;

pub use index::SimilarityIndex;
pub use stop_words::is_stop_word;

use crate::error::KnowledgeError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Example prompts offered by the chat widget.
pub const SUGGESTED_PROMPTS: [&str; 4] = [
    "What does EVA do?",
    "Tell me about Thoughtful AI's agents",
    "How does payment posting work?",
    "What are the benefits of using your agents?",
];

/// One FAQ question and its canned answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub question: String,
    pub answer: String,
}

impl KnowledgeEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Immutable, ordered collection of [`KnowledgeEntry`] values.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeBase {
    /// Builds a knowledge base from `entries`. Order is preserved and used for tie-breaking.
    /// Blank answers are rejected so a match always carries text.
    pub fn new(entries: Vec<KnowledgeEntry>) -> Result<Self, KnowledgeError> {
        if entries.is_empty() {
            return Err(KnowledgeError::Empty);
        }
        if let Some(index) = entries.iter().position(|e| e.answer.trim().is_empty()) {
            return Err(KnowledgeError::BlankAnswer { index });
        }
        Ok(Self { entries })
    }

    /// The five built-in Thoughtful AI entries.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                KnowledgeEntry::new(
                    "What does the eligibility verification agent (EVA) do?",
                    "EVA automates the process of verifying a patient's eligibility and benefits information in real-time, eliminating manual data entry errors and reducing claim rejections.",
                ),
                KnowledgeEntry::new(
                    "What does the claims processing agent (CAM) do?",
                    "CAM streamlines the submission and management of claims, improving accuracy, reducing manual intervention, and accelerating reimbursements.",
                ),
                KnowledgeEntry::new(
                    "How does the payment posting agent (PHIL) work?",
                    "PHIL automates the posting of payments to patient accounts, ensuring fast, accurate reconciliation of payments and reducing administrative burden.",
                ),
                KnowledgeEntry::new(
                    "Tell me about Thoughtful AI's Agents.",
                    "Thoughtful AI provides a suite of AI-powered automation agents designed to streamline healthcare processes. These include Eligibility Verification (EVA), Claims Processing (CAM), and Payment Posting (PHIL), among others.",
                ),
                KnowledgeEntry::new(
                    "What are the benefits of using Thoughtful AI's agents?",
                    "Using Thoughtful AI's Agents can significantly reduce administrative costs, improve operational efficiency, and reduce errors in critical processes like claims management and payment posting.",
                ),
            ],
        }
    }

    /// Loads a JSON array of `{ "question", "answer" }` objects.
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, KnowledgeError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| KnowledgeError::Io {
            path: display.clone(),
            source,
        })?;
        let entries: Vec<KnowledgeEntry> =
            serde_json::from_str(&raw).map_err(|source| KnowledgeError::Parse {
                path: display,
                source,
            })?;
        Self::new(entries)
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn questions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.question.as_str())
    }

    pub fn answer(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|e| e.answer.as_str())
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}
