// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run report: what a pipeline run changed, with SHA-256 fingerprints of
// every content document before and after.

use std::path::Path;

use accessaide_core::error::Result;
use accessaide_core::types::FormatGeneration;
use accessaide_markup::RewriteStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `data`.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub id: String,
    pub path: String,
    pub sha256_before: String,
    pub sha256_after: String,
    pub stats: RewriteStats,
    /// Images found in the document.
    pub images: usize,
    /// Alt attributes replaced from the review.
    pub alt_updated: usize,
}

impl DocumentReport {
    pub fn changed(&self) -> bool {
        self.sha256_before != self.sha256_after
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub generation: FormatGeneration,
    pub primary_language: String,
    pub metadata_injected: bool,
    pub dry_run: bool,
    pub documents: Vec<DocumentReport>,
    /// Images handed to the reviewer.
    pub images_reviewed: usize,
    /// SVG images shown as a generated placeholder.
    pub placeholders: usize,
    pub review_cancelled: bool,
    /// Ordinals the review addressed that no longer existed, as
    /// `document#ordinal`.
    pub unmatched_images: Vec<String>,
}

impl RunReport {
    pub fn documents_changed(&self) -> usize {
        self.documents.iter().filter(|d| d.changed()).count()
    }

    pub fn alt_updates(&self) -> usize {
        self.documents.iter().map(|d| d.alt_updated).sum()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SHA-256 of the empty byte slice (well-known constant).
    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn hash_empty_input() {
        assert_eq!(hash_bytes(b""), EMPTY_SHA256);
    }

    fn document(before: &str, after: &str, alt_updated: usize) -> DocumentReport {
        DocumentReport {
            id: "c1".into(),
            path: "c1.xhtml".into(),
            sha256_before: hash_bytes(before.as_bytes()),
            sha256_after: hash_bytes(after.as_bytes()),
            stats: RewriteStats::default(),
            images: alt_updated,
            alt_updated,
        }
    }

    #[test]
    fn totals_and_json() {
        let now = Utc::now();
        let report = RunReport {
            started_at: now,
            finished_at: now,
            generation: FormatGeneration::Modern,
            primary_language: "en".into(),
            metadata_injected: true,
            dry_run: false,
            documents: vec![document("a", "a", 0), document("a", "b", 2)],
            images_reviewed: 2,
            placeholders: 0,
            review_cancelled: false,
            unmatched_images: Vec::new(),
        };
        assert_eq!(report.documents_changed(), 1);
        assert_eq!(report.alt_updates(), 2);

        let json = report.to_json().unwrap();
        assert!(json.contains("\"generation\": \"modern\""));
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
