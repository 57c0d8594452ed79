// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OPF package document parsing.
//
// Extracts the package version, manifest, spine and the byte span of the
// `<metadata>` element so the metadata can be replaced without touching the
// rest of the package document.

use std::ops::Range;

use accessaide_core::error::{AccessAideError, Result};
use accessaide_core::types::{FormatGeneration, ManifestItem};
use accessaide_markup::href::resolve_href;
use accessaide_markup::tokenizer::{Event, TagKind, Tokenizer};
use tracing::{debug, instrument, warn};

/// The parts of a package document the pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Book-relative path of the package document.
    pub path: String,
    pub version: String,
    pub generation: FormatGeneration,
    pub manifest: Vec<ManifestItem>,
    /// Spine `itemref/@idref` values in reading order.
    pub spine: Vec<String>,
    /// Spine `toc` attribute (NCX manifest id).
    pub toc: Option<String>,
    metadata_span: Range<usize>,
}

impl Package {
    #[instrument(skip(content), fields(len = content.len()))]
    pub fn parse(path: &str, content: &str) -> Result<Self> {
        let mut version = None;
        let mut manifest = Vec::new();
        let mut spine = Vec::new();
        let mut toc = None;
        let mut metadata_start = None;
        let mut metadata_span = None;

        let mut tokens = Tokenizer::new(content);
        loop {
            let before = tokens.offset();
            let Some(event) = tokens.next() else { break };
            let Event::Tag(tag) = event? else { continue };

            match (tag.local_name(), tag.kind) {
                ("package", TagKind::Begin) => {
                    version = tag.attrs.get("version").map(str::to_owned);
                }
                ("metadata", TagKind::Begin) if metadata_start.is_none() => {
                    metadata_start = Some(before);
                }
                ("metadata", TagKind::Single) if metadata_span.is_none() => {
                    metadata_span = Some(before..tokens.offset());
                }
                ("metadata", TagKind::End) if metadata_span.is_none() => {
                    if let Some(start) = metadata_start {
                        metadata_span = Some(start..tokens.offset());
                    }
                }
                ("item", kind) if kind.is_open() => {
                    let (Some(id), Some(href)) = (tag.attrs.get("id"), tag.attrs.get("href")) else {
                        warn!(tag = tag.raw(), "manifest item without id or href");
                        continue;
                    };
                    let Some(target) = resolve_href(path, href) else {
                        warn!(id, href, "manifest item outside the book");
                        continue;
                    };
                    manifest.push(ManifestItem {
                        id: id.to_owned(),
                        path: target.path,
                        media_type: tag.attrs.get("media-type").unwrap_or("").trim().to_owned(),
                        properties: tag
                            .attrs
                            .get("properties")
                            .unwrap_or("")
                            .split_whitespace()
                            .map(str::to_owned)
                            .collect(),
                    });
                }
                ("spine", kind) if kind.is_open() => {
                    toc = tag.attrs.get("toc").map(str::to_owned);
                }
                ("itemref", kind) if kind.is_open() => {
                    if let Some(idref) = tag.attrs.get("idref") {
                        spine.push(idref.to_owned());
                    }
                }
                _ => {}
            }
        }

        let version =
            version.ok_or_else(|| AccessAideError::Package(format!("{path}: no package version")))?;
        let metadata_span = metadata_span
            .ok_or_else(|| AccessAideError::Package(format!("{path}: no metadata element")))?;

        debug!(
            version = %version,
            items = manifest.len(),
            spine = spine.len(),
            "package parsed"
        );
        Ok(Self {
            path: path.to_owned(),
            generation: FormatGeneration::from_package_version(&version),
            version,
            manifest,
            spine,
            toc,
            metadata_span,
        })
    }

    /// The `<metadata>` element as written in `content`, the package
    /// document this was parsed from.
    pub fn metadata<'a>(&self, content: &'a str) -> Result<&'a str> {
        content
            .get(self.metadata_span.clone())
            .ok_or_else(|| AccessAideError::Package(format!("{}: metadata span out of range", self.path)))
    }

    /// `content` with the `<metadata>` element replaced by `metadata`.
    pub fn replace_metadata(&self, content: &str, metadata: &str) -> Result<String> {
        let (Some(head), Some(tail)) = (
            content.get(..self.metadata_span.start),
            content.get(self.metadata_span.end..),
        ) else {
            return Err(AccessAideError::Package(format!(
                "{}: metadata span out of range",
                self.path
            )));
        };
        Ok(format!("{head}{metadata}{tail}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:uuid:1</dc:identifier>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="ch1" href="Text/ch%201.xhtml" media-type="application/xhtml+xml"/>
    <item id="img" href="Images/a.png" media-type="image/png" properties="cover-image"/>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="ch1"/>
    <itemref idref="nav" linear="no"/>
  </spine>
</package>"#;

    #[test]
    fn parses_manifest_and_spine() {
        let package = Package::parse("OEBPS/content.opf", OPF).unwrap();
        assert_eq!(package.generation, FormatGeneration::Modern);
        assert_eq!(package.version, "3.0");
        assert_eq!(package.manifest.len(), 4);
        assert_eq!(package.manifest[1].path, "OEBPS/Text/ch 1.xhtml");
        assert!(package.manifest[0].has_property("nav"));
        assert_eq!(package.manifest[2].properties, vec!["cover-image"]);
        assert_eq!(package.spine, vec!["ch1", "nav"]);
        assert_eq!(package.toc.as_deref(), Some("ncx"));
    }

    #[test]
    fn metadata_span_covers_element() {
        let package = Package::parse("content.opf", OPF).unwrap();
        let metadata = package.metadata(OPF).unwrap();
        assert!(metadata.starts_with("<metadata xmlns:dc="));
        assert!(metadata.ends_with("</metadata>"));
    }

    #[test]
    fn replace_metadata_keeps_rest() {
        let package = Package::parse("content.opf", OPF).unwrap();
        let replaced = package.replace_metadata(OPF, "<metadata/>").unwrap();
        assert!(replaced.contains("unique-identifier=\"uid\">\n  <metadata/>\n  <manifest>"));
        assert_eq!(
            replaced.len(),
            OPF.len() - package.metadata(OPF).unwrap().len() + "<metadata/>".len()
        );
    }

    #[test]
    fn legacy_version() {
        let opf = OPF.replace("version=\"3.0\"", "version=\"2.0\"");
        let package = Package::parse("content.opf", &opf).unwrap();
        assert_eq!(package.generation, FormatGeneration::Legacy);
    }

    #[test]
    fn missing_metadata_is_an_error() {
        let err = Package::parse("content.opf", "<package version=\"3.0\"><manifest/></package>")
            .unwrap_err();
        assert!(matches!(err, AccessAideError::Package(_)));
    }
}
