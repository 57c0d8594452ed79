// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Access Aide annotation pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// EPUB generation of the book being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatGeneration {
    /// EPUB 3: nav document, `property` metadata, ARIA roles.
    Modern,
    /// EPUB 2: NCX table of contents, `name`/`content` metadata.
    Legacy,
}

impl FormatGeneration {
    /// Infer the generation from the OPF `package/@version` attribute.
    pub fn from_package_version(version: &str) -> Self {
        if version.trim().starts_with('3') {
            Self::Modern
        } else {
            Self::Legacy
        }
    }

    pub fn is_modern(&self) -> bool {
        matches!(self, Self::Modern)
    }
}

impl std::fmt::Display for FormatGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Modern => write!(f, "EPUB 3"),
            Self::Legacy => write!(f, "EPUB 2"),
        }
    }
}

/// One entry of the package manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestItem {
    /// Manifest id (`item/@id`).
    pub id: String,
    /// Book-relative path, already resolved against the package document.
    pub path: String,
    /// Declared media type.
    pub media_type: String,
    /// Space-separated `item/@properties`, split.
    pub properties: Vec<String>,
}

impl ManifestItem {
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p == name)
    }

    pub fn is_audio_or_video(&self) -> bool {
        self.media_type.starts_with("audio") || self.media_type.starts_with("video")
    }

    pub fn is_xhtml(&self) -> bool {
        self.media_type == "application/xhtml+xml"
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    pub fn is_svg(&self) -> bool {
        self.media_type == "image/svg+xml"
    }
}

/// Where inside a document a landmark points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locator {
    /// The element whose `id` equals the fragment.
    Fragment(String),
    /// The whole document (applied to `body`, only when enabled).
    Document,
}

/// A landmark taken from the nav document's landmarks list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkRecord {
    pub locator: Locator,
    /// The `epub:type` value of the landmark entry (may be several values).
    pub semantic_type: String,
}

impl LandmarkRecord {
    pub fn fragment(&self) -> Option<&str> {
        match &self.locator {
            Locator::Fragment(id) => Some(id),
            Locator::Document => None,
        }
    }
}

/// Book-relative document path → title text.
pub type TitleMap = BTreeMap<String, String>;

/// Book-relative document path → landmarks pointing into that document.
pub type LandmarkMap = BTreeMap<String, Vec<LandmarkRecord>>;

/// One `<img>` occurrence found while rewriting a document.
///
/// The ordinal is the only key used to find the tag again, so it must be
/// derived with exactly the same counting rule by every pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Manifest id of the owning document.
    pub document_id: String,
    /// Book-relative path of the owning document.
    pub document_path: String,
    /// 1-based position of the tag within the document.
    pub ordinal: usize,
    /// Raw `src` attribute value.
    pub source: String,
    /// Raw (entity-encoded) `alt` value at discovery time.
    pub alt: String,
}
