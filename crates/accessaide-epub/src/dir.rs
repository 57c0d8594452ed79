// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Book host over an unpacked EPUB directory.
//
// `META-INF/container.xml` names the package document; manifest paths are
// resolved against it. Content documents are written in place; the package
// document is rewritten on `flush` when its metadata changed.

use std::path::{Component, Path, PathBuf};

use accessaide_core::error::{AccessAideError, Result};
use accessaide_core::types::{FormatGeneration, ManifestItem};
use accessaide_markup::tokenizer::{Event, Tokenizer};
use tracing::{debug, info, instrument};

use crate::book::BookHost;
use crate::opf::Package;

const CONTAINER_PATH: &str = "META-INF/container.xml";

#[derive(Debug)]
pub struct DirBook {
    root: PathBuf,
    package: Package,
    /// Package document as read from disk.
    opf_source: String,
    metadata: String,
    metadata_dirty: bool,
}

impl DirBook {
    /// Open the unpacked EPUB rooted at `root`.
    #[instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let container_file = root.join(CONTAINER_PATH);
        let container = std::fs::read_to_string(&container_file).map_err(|err| {
            AccessAideError::Package(format!("cannot read {}: {err}", container_file.display()))
        })?;
        let opf_path = rootfile_path(&container)?;

        let opf_source = std::fs::read_to_string(book_file(&root, &opf_path)?)?;
        let package = Package::parse(&opf_path, &opf_source)?;
        let metadata = package.metadata(&opf_source)?.to_owned();

        info!(
            package = %opf_path,
            generation = %package.generation,
            items = package.manifest.len(),
            "book opened"
        );
        Ok(Self {
            root,
            package,
            opf_source,
            metadata,
            metadata_dirty: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    fn item_file(&self, id: &str) -> Result<PathBuf> {
        let item = self
            .item(id)
            .ok_or_else(|| AccessAideError::MissingResource(format!("manifest id {id}")))?;
        book_file(&self.root, &item.path)
    }
}

impl BookHost for DirBook {
    fn generation(&self) -> FormatGeneration {
        self.package.generation
    }

    fn manifest(&self) -> &[ManifestItem] {
        &self.package.manifest
    }

    fn spine(&self) -> &[String] {
        &self.package.spine
    }

    fn toc_id(&self) -> Option<&str> {
        self.package.toc.as_deref()
    }

    fn metadata_xml(&self) -> &str {
        &self.metadata
    }

    fn set_metadata_xml(&mut self, metadata: String) {
        self.metadata_dirty |= metadata != self.metadata;
        self.metadata = metadata;
    }

    fn read_bytes(&self, id: &str) -> Result<Vec<u8>> {
        let file = self.item_file(id)?;
        std::fs::read(&file).map_err(|err| {
            AccessAideError::MissingResource(format!("{}: {err}", file.display()))
        })
    }

    fn write_text(&mut self, id: &str, content: &str) -> Result<()> {
        let file = self.item_file(id)?;
        std::fs::write(&file, content)?;
        debug!(file = %file.display(), bytes = content.len(), "document written");
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.metadata_dirty {
            return Ok(());
        }
        let updated = self.package.replace_metadata(&self.opf_source, &self.metadata)?;
        let file = book_file(&self.root, &self.package.path)?;
        std::fs::write(&file, &updated)?;

        // Re-parse so spans match the new source.
        self.package = Package::parse(&self.package.path, &updated)?;
        self.opf_source = updated;
        self.metadata_dirty = false;
        info!(file = %file.display(), "package document written");
        Ok(())
    }
}

/// `full-path` of the first `rootfile` in `container.xml`.
fn rootfile_path(container: &str) -> Result<String> {
    for event in Tokenizer::new(container) {
        if let Event::Tag(tag) = event? {
            if tag.is_open() && tag.local_name() == "rootfile" {
                if let Some(path) = tag.attrs.get("full-path") {
                    return Ok(path.trim().to_owned());
                }
            }
        }
    }
    Err(AccessAideError::Package(format!(
        "{CONTAINER_PATH} names no package document"
    )))
}

/// Filesystem location of a book-relative path, refusing anything that
/// would leave the book directory.
fn book_file(root: &Path, book_path: &str) -> Result<PathBuf> {
    let mut file = root.to_path_buf();
    for component in Path::new(book_path).components() {
        match component {
            Component::Normal(part) => file.push(part),
            Component::CurDir => {}
            _ => {
                return Err(AccessAideError::Package(format!(
                    "path leaves the book: {book_path}"
                )));
            }
        }
    }
    Ok(file)
}
