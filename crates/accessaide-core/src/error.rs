// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Access Aide.

use thiserror::Error;

/// Top-level error type for all Access Aide operations.
#[derive(Debug, Error)]
pub enum AccessAideError {
    // -- Fatal preconditions (the book is left untouched) --
    #[error("audio or video resources are not supported: {}", .0.join(", "))]
    AudioVideoPresent(Vec<String>),

    #[error("no dc:language is declared in the package metadata")]
    MissingLanguage,

    #[error("no manifest item carries the nav property")]
    MissingNavigation,

    #[error("MathML content is present ({0}); accessibility metadata cannot describe it")]
    MathMlPresent(String),

    #[error("scripted content is present ({0}); ARIA roles cannot be set reliably")]
    ScriptedContent(String),

    // -- Markup --
    #[error("malformed markup at byte {offset}: {detail}")]
    Markup { offset: usize, detail: String },

    #[error("failed to process {document}: {source}")]
    InDocument {
        document: String,
        #[source]
        source: Box<AccessAideError>,
    },

    // -- Package / host --
    #[error("invalid package: {0}")]
    Package(String),

    #[error("resource not found: {0}")]
    MissingResource(String),

    // -- Review --
    #[error("review returned {actual} entries for {expected} images")]
    ReviewMismatch { expected: usize, actual: usize },

    #[error("alt text review failed: {0}")]
    Review(String),

    // -- Media --
    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AccessAideError {
    /// Wrap an error with the manifest id or path of the document it came from.
    pub fn in_document(self, document: impl Into<String>) -> Self {
        Self::InDocument {
            document: document.into(),
            source: Box::new(self),
        }
    }

    /// Process exit code reported by the CLI. Each precondition has its own
    /// code; everything else is a generic failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AudioVideoPresent(_) => 2,
            Self::MissingLanguage => 3,
            Self::MissingNavigation => 4,
            Self::MathMlPresent(_) => 5,
            Self::ScriptedContent(_) => 6,
            Self::InDocument { source, .. } => source.exit_code(),
            _ => 1,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AccessAideError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preconditions_have_distinct_exit_codes() {
        let codes = [
            AccessAideError::AudioVideoPresent(vec!["a.mp3".into()]).exit_code(),
            AccessAideError::MissingLanguage.exit_code(),
            AccessAideError::MissingNavigation.exit_code(),
            AccessAideError::MathMlPresent("m".into()).exit_code(),
            AccessAideError::ScriptedContent("s".into()).exit_code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            assert_ne!(*a, 0);
            assert_ne!(*a, 1);
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn document_context_keeps_exit_code() {
        let err = AccessAideError::Markup {
            offset: 12,
            detail: "unterminated comment".into(),
        }
        .in_document("ch1");
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("ch1"));
    }
}
