// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scoped export of book images for review.
//
// Images are written under a temporary directory at their book-relative
// paths. The directory and everything in it is removed when the
// `ImageExport` is dropped, on success and error paths alike.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use accessaide_core::error::{AccessAideError, Result};
use accessaide_core::types::ManifestItem;
use tempfile::TempDir;
use tracing::{debug, instrument, warn};

use crate::convert::{RasterConverter, png_path_for};
use crate::placeholder::placeholder_png;

/// File name of the shared stand-in for images that are not in the book.
const MISSING_NAME: &str = ".accessaide-missing.png";

/// How the reviewable file for an image was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// Raster image copied unchanged.
    Copied,
    /// SVG rasterised by the external converter.
    Converted,
    /// Generated placeholder standing in for the image.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub book_path: String,
    /// File to show the reviewer.
    pub path: PathBuf,
    pub kind: ExportKind,
}

pub struct ImageExport {
    dir: TempDir,
    converter: Option<RasterConverter>,
    placeholder_size: u32,
    images: BTreeMap<String, ExportedImage>,
    missing: Option<PathBuf>,
}

impl ImageExport {
    pub fn new(converter: Option<RasterConverter>, placeholder_size: u32) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("accessaide-").tempdir()?;
        debug!(dir = %dir.path().display(), "image export directory created");
        Ok(Self {
            dir,
            converter,
            placeholder_size,
            images: BTreeMap::new(),
            missing: None,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write one manifest image at its book-relative path. Items declared as
    /// `image/svg+xml` are rasterised; any failure there falls back to a
    /// placeholder PNG.
    #[instrument(skip_all, fields(path = %item.path, len = bytes.len()))]
    pub fn add(&mut self, item: &ManifestItem, bytes: &[u8]) -> Result<&ExportedImage> {
        let book_path = item.path.as_str();
        let target = self.dir.path().join(relative_path(book_path)?);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, bytes)?;

        let exported = if item.is_svg() {
            self.rasterise(book_path, &target)?
        } else {
            ExportedImage {
                book_path: book_path.to_owned(),
                path: target,
                kind: ExportKind::Copied,
            }
        };

        self.images.insert(book_path.to_owned(), exported);
        self.images
            .get(book_path)
            .ok_or_else(|| AccessAideError::MissingResource(book_path.to_owned()))
    }

    fn rasterise(&self, book_path: &str, svg: &Path) -> Result<ExportedImage> {
        if let Some(converter) = &self.converter {
            match converter.convert(svg) {
                Ok(png) => {
                    return Ok(ExportedImage {
                        book_path: book_path.to_owned(),
                        path: png,
                        kind: ExportKind::Converted,
                    });
                }
                Err(err) => warn!(%err, book_path, "svg conversion failed, using placeholder"),
            }
        }

        let png = png_path_for(svg);
        std::fs::write(&png, placeholder_png(self.placeholder_size)?)?;
        Ok(ExportedImage {
            book_path: book_path.to_owned(),
            path: png,
            kind: ExportKind::Placeholder,
        })
    }

    pub fn get(&self, book_path: &str) -> Option<&ExportedImage> {
        self.images.get(book_path)
    }

    /// The file to show for an image the book does not contain, written on
    /// first use.
    pub fn missing_image(&mut self) -> Result<PathBuf> {
        if let Some(path) = &self.missing {
            return Ok(path.clone());
        }
        let path = self.dir.path().join(MISSING_NAME);
        std::fs::write(&path, placeholder_png(self.placeholder_size)?)?;
        self.missing = Some(path.clone());
        Ok(path)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn placeholders(&self) -> usize {
        self.images
            .values()
            .filter(|image| image.kind == ExportKind::Placeholder)
            .count()
    }
}

impl Drop for ImageExport {
    fn drop(&mut self) {
        debug!(images = self.images.len(), "removing image export directory");
    }
}

/// Book-relative path as a relative filesystem path. Anything that could
/// escape the export directory is refused.
fn relative_path(book_path: &str) -> Result<PathBuf> {
    let mut out = PathBuf::new();
    for component in Path::new(book_path).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => {
                return Err(AccessAideError::Package(format!(
                    "image path leaves the book: {book_path}"
                )));
            }
        }
    }
    if out.as_os_str().is_empty() {
        return Err(AccessAideError::Package(format!("empty image path: {book_path:?}")));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_STUB: &[u8] = b"\x89PNG not really";

    fn item(path: &str, media_type: &str) -> ManifestItem {
        ManifestItem {
            id: "img".into(),
            path: path.into(),
            media_type: media_type.into(),
            properties: Vec::new(),
        }
    }

    #[test]
    fn raster_images_mirror_book_paths() {
        let mut export = ImageExport::new(None, 32).unwrap();
        let image = export.add(&item("OEBPS/Images/a.png", "image/png"), PNG_STUB).unwrap().clone();
        assert_eq!(image.kind, ExportKind::Copied);
        assert_eq!(image.path, export.root().join("OEBPS/Images/a.png"));
        assert_eq!(std::fs::read(&image.path).unwrap(), PNG_STUB);
        assert_eq!(export.get("OEBPS/Images/a.png"), Some(&image));
    }

    #[test]
    fn svg_without_converter_gets_placeholder() {
        let mut export = ImageExport::new(None, 32).unwrap();
        let image = export.add(&item("OEBPS/Images/fig.SVG", "image/svg+xml"), b"<svg/>").unwrap().clone();
        assert_eq!(image.kind, ExportKind::Placeholder);
        assert_eq!(image.path, export.root().join("OEBPS/Images/fig.SVG.png"));
        let decoded = image::open(&image.path).unwrap();
        assert_eq!(decoded.width(), 32);
        assert_eq!(export.placeholders(), 1);
    }

    #[test]
    fn svg_is_detected_by_media_type() {
        let mut export = ImageExport::new(None, 16).unwrap();
        let image = export.add(&item("OEBPS/Images/fig", "image/svg+xml"), b"<svg/>").unwrap();
        assert_eq!(image.kind, ExportKind::Placeholder);
        assert!(image.path.ends_with("OEBPS/Images/fig.png"));

        let raster = export.add(&item("OEBPS/Images/logo.svg", "image/png"), PNG_STUB).unwrap();
        assert_eq!(raster.kind, ExportKind::Copied);
        assert_eq!(export.placeholders(), 1);
    }

    #[test]
    fn failing_converter_falls_back() {
        let converter = RasterConverter::new("/nonexistent/accessaide-converter");
        let mut export = ImageExport::new(Some(converter), 16).unwrap();
        let image = export.add(&item("fig.svg", "image/svg+xml"), b"<svg/>").unwrap();
        assert_eq!(image.kind, ExportKind::Placeholder);
    }

    #[test]
    fn escaping_paths_are_refused() {
        let mut export = ImageExport::new(None, 16).unwrap();
        assert!(export.add(&item("../outside.png", "image/png"), PNG_STUB).is_err());
        assert!(export.add(&item("/etc/passwd", "image/png"), PNG_STUB).is_err());
    }

    #[test]
    fn missing_image_is_shared() {
        let mut export = ImageExport::new(None, 16).unwrap();
        let first = export.missing_image().unwrap();
        let second = export.missing_image().unwrap();
        assert_eq!(first, second);
        assert!(first.exists());
    }

    #[test]
    fn directory_removed_on_drop() {
        let export = ImageExport::new(None, 16).unwrap();
        let root = export.root().to_path_buf();
        assert!(root.exists());
        drop(export);
        assert!(!root.exists());
    }
}
