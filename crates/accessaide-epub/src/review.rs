// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Alt text review surface.
//
// The pipeline hands the reviewer one item per discovered image, in document
// order, and expects the same list back with possibly edited alt text.

use std::path::{Path, PathBuf};

use accessaide_core::error::{AccessAideError, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// One image to review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewItem {
    /// Book-relative path of the document containing the image.
    pub document: String,
    /// Position of the image in its document, from 1.
    pub ordinal: usize,
    /// `src` as written in the document.
    pub source: String,
    /// Viewable copy of the image.
    pub path: PathBuf,
    /// Plain (decoded) alt text.
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// One item per input item, same order.
    Updated(Vec<ReviewItem>),
    /// Leave every alt attribute as it is.
    Cancelled,
}

pub trait AltTextReview {
    fn review(&mut self, items: &[ReviewItem]) -> Result<ReviewOutcome>;
}

/// Accepts every alt text unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepExisting;

impl AltTextReview for KeepExisting {
    fn review(&mut self, items: &[ReviewItem]) -> Result<ReviewOutcome> {
        Ok(ReviewOutcome::Updated(items.to_vec()))
    }
}

/// Review through a JSON file edited outside the tool.
///
/// When the file does not exist the items are written to it and the review
/// is cancelled, so a first run only produces the file. When it exists its
/// entries are matched to the images by document and ordinal; images without
/// an entry keep their alt text.
#[derive(Debug, Clone)]
pub struct JsonExchange {
    path: PathBuf,
}

impl JsonExchange {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AltTextReview for JsonExchange {
    #[instrument(skip_all, fields(file = %self.path.display(), images = items.len()))]
    fn review(&mut self, items: &[ReviewItem]) -> Result<ReviewOutcome> {
        if !self.path.exists() {
            let json = serde_json::to_string_pretty(items)?;
            std::fs::write(&self.path, json)?;
            info!("review file written; edit the alt values and run again");
            return Ok(ReviewOutcome::Cancelled);
        }

        let data = std::fs::read_to_string(&self.path)?;
        let entries: Vec<ReviewItem> = serde_json::from_str(&data).map_err(|err| {
            AccessAideError::Review(format!("{}: {err}", self.path.display()))
        })?;

        let mut matched = 0usize;
        let updated = items
            .iter()
            .map(|item| {
                let entry = entries
                    .iter()
                    .find(|e| e.document == item.document && e.ordinal == item.ordinal);
                let mut out = item.clone();
                if let Some(entry) = entry {
                    matched += 1;
                    out.alt = entry.alt.clone();
                }
                out
            })
            .collect::<Vec<_>>();

        if matched < entries.len() {
            warn!(
                unmatched = entries.len() - matched,
                "review file has entries for images no longer in the book"
            );
        }
        info!(matched, "review file applied");
        Ok(ReviewOutcome::Updated(updated))
    }
}
