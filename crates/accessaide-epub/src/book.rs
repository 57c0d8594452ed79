// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Book host abstraction.
//
// The pipeline reaches the book only through `BookHost`: manifest and spine
// lookups, the package metadata fragment, and reads and writes by manifest
// id. `DirBook` serves an unpacked EPUB directory; `MemoryBook` keeps
// everything in memory for tests and embedding.

use std::collections::BTreeMap;

use accessaide_core::error::{AccessAideError, Result};
use accessaide_core::types::{FormatGeneration, ManifestItem};

/// Media type of an EPUB 2 table of contents.
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

/// Storage and package access for one book.
pub trait BookHost {
    fn generation(&self) -> FormatGeneration;

    /// Manifest items in package order.
    fn manifest(&self) -> &[ManifestItem];

    /// Spine idrefs in reading order.
    fn spine(&self) -> &[String];

    /// Spine `toc` attribute.
    fn toc_id(&self) -> Option<&str>;

    /// The package `<metadata>` element.
    fn metadata_xml(&self) -> &str;

    fn set_metadata_xml(&mut self, metadata: String);

    fn read_bytes(&self, id: &str) -> Result<Vec<u8>>;

    fn write_text(&mut self, id: &str, content: &str) -> Result<()>;

    /// Persist the package document.
    fn flush(&mut self) -> Result<()>;

    fn read_text(&self, id: &str) -> Result<String> {
        let bytes = self.read_bytes(id)?;
        String::from_utf8(bytes).map_err(|err| {
            AccessAideError::Package(format!("manifest item {id} is not valid UTF-8: {err}"))
        })
    }

    fn item(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest().iter().find(|item| item.id == id)
    }

    /// The EPUB 3 navigation document.
    fn nav_item(&self) -> Option<&ManifestItem> {
        self.manifest().iter().find(|item| item.has_property("nav"))
    }

    /// The NCX named by the spine `toc` attribute.
    fn ncx_item(&self) -> Option<&ManifestItem> {
        self.toc_id().and_then(|id| self.item(id))
    }

    /// XHTML content documents, spine order first, then the rest of the
    /// manifest in package order.
    fn content_documents(&self) -> Vec<&ManifestItem> {
        let mut documents: Vec<&ManifestItem> = self
            .spine()
            .iter()
            .filter_map(|idref| self.item(idref))
            .filter(|item| item.is_xhtml())
            .collect();
        for item in self.manifest().iter().filter(|item| item.is_xhtml()) {
            if !documents.iter().any(|doc| doc.id == item.id) {
                documents.push(item);
            }
        }
        documents
    }
}

/// A book held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryBook {
    generation: FormatGeneration,
    manifest: Vec<ManifestItem>,
    spine: Vec<String>,
    toc: Option<String>,
    metadata: String,
    files: BTreeMap<String, Vec<u8>>,
    writes: usize,
    flushes: usize,
}

impl MemoryBook {
    pub fn new(generation: FormatGeneration, metadata: impl Into<String>) -> Self {
        Self {
            generation,
            manifest: Vec::new(),
            spine: Vec::new(),
            toc: None,
            metadata: metadata.into(),
            files: BTreeMap::new(),
            writes: 0,
            flushes: 0,
        }
    }

    /// Add a manifest item and its content. `properties` is space separated.
    pub fn with_item(
        mut self,
        id: &str,
        path: &str,
        media_type: &str,
        properties: &str,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        self.manifest.push(ManifestItem {
            id: id.to_owned(),
            path: path.to_owned(),
            media_type: media_type.to_owned(),
            properties: properties.split_whitespace().map(str::to_owned).collect(),
        });
        self.files.insert(id.to_owned(), content.into());
        self
    }

    pub fn with_spine<'s>(mut self, idrefs: impl IntoIterator<Item = &'s str>) -> Self {
        self.spine = idrefs.into_iter().map(str::to_owned).collect();
        self
    }

    pub fn with_toc(mut self, id: &str) -> Self {
        self.toc = Some(id.to_owned());
        self
    }

    /// Current text of a manifest item.
    pub fn text(&self, id: &str) -> Option<&str> {
        self.files
            .get(id)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Number of `write_text` calls made.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl BookHost for MemoryBook {
    fn generation(&self) -> FormatGeneration {
        self.generation
    }

    fn manifest(&self) -> &[ManifestItem] {
        &self.manifest
    }

    fn spine(&self) -> &[String] {
        &self.spine
    }

    fn toc_id(&self) -> Option<&str> {
        self.toc.as_deref()
    }

    fn metadata_xml(&self) -> &str {
        &self.metadata
    }

    fn set_metadata_xml(&mut self, metadata: String) {
        self.metadata = metadata;
    }

    fn read_bytes(&self, id: &str) -> Result<Vec<u8>> {
        self.files
            .get(id)
            .cloned()
            .ok_or_else(|| AccessAideError::MissingResource(id.to_owned()))
    }

    fn write_text(&mut self, id: &str, content: &str) -> Result<()> {
        let slot = self
            .files
            .get_mut(id)
            .ok_or_else(|| AccessAideError::MissingResource(id.to_owned()))?;
        *slot = content.as_bytes().to_vec();
        self.writes += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}
