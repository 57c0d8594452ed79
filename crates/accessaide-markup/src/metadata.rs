// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Package metadata annotation.
//
// Reads the primary language from the first `dc:language` and, unless the
// package already declares schema.org accessibility properties, appends the
// accessibility metadata block before `</metadata>`.

use accessaide_core::error::Result;
use accessaide_core::types::FormatGeneration;
use tracing::{debug, instrument};

use crate::tokenizer::{Event, Tag, TagKind, Tokenizer};

/// Conformance statement written as `schema:accessibilitySummary`.
pub const ACCESSIBILITY_SUMMARY: &str = "This publication conforms to WCAG 2.0 AA.";

const ACCESS_PREFIX: &str = "schema:access";

/// (property, value) pairs of the EPUB 3 block.
const MODERN_BLOCK: &[(&str, &str)] = &[
    ("schema:accessibilitySummary", ACCESSIBILITY_SUMMARY),
    ("schema:accessMode", "textual"),
    ("schema:accessMode", "visual"),
    ("schema:accessModeSufficient", "textual"),
    ("schema:accessibilityFeature", "structuralNavigation"),
    ("schema:accessibilityHazard", "none"),
];

/// (name, content) pairs of the EPUB 2 block.
const LEGACY_BLOCK: &[(&str, &str)] = &[
    ("schema:accessibilitySummary", ACCESSIBILITY_SUMMARY),
    ("schema:accessMode", "textual"),
    ("schema:accessModeSufficient", "textual"),
    ("schema:accessibilityFeature", "structuralNavigation"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataOutcome {
    /// The rewritten metadata fragment.
    pub metadata: String,
    /// Primary subtag of the first declared language.
    pub primary_language: Option<String>,
    /// Whether the accessibility block was added.
    pub injected: bool,
}

/// Annotate a package `<metadata>` fragment.
#[instrument(skip(content), fields(len = content.len()))]
pub fn annotate_metadata(content: &str, generation: FormatGeneration) -> Result<MetadataOutcome> {
    let mut out = String::with_capacity(content.len() + 512);
    let mut primary_language = None;
    let mut has_access_meta = false;
    let mut injected = false;

    for event in Tokenizer::new(content) {
        let event = event?;
        match &event {
            Event::Text(text)
                if primary_language.is_none()
                    && !text.is_blank()
                    && text.path.ends_with("dc:language") =>
            {
                primary_language = Some(primary_subtag(text.content));
            }
            Event::Tag(tag) if tag.is_open() && tag.local_name() == "meta" => {
                if declares_accessibility(tag) {
                    has_access_meta = true;
                }
            }
            Event::Tag(tag) if tag.kind == TagKind::End && tag.local_name() == "metadata" => {
                if !has_access_meta && !injected {
                    write_block(&mut out, generation);
                    injected = true;
                }
            }
            _ => {}
        }
        event.write_markup(&mut out);
    }

    debug!(?primary_language, injected, "metadata annotated");
    Ok(MetadataOutcome {
        metadata: out,
        primary_language,
        injected,
    })
}

fn declares_accessibility(tag: &Tag<'_>) -> bool {
    ["property", "name"].iter().any(|attr| {
        tag.attrs
            .get(attr)
            .is_some_and(|v| v.trim_start().starts_with(ACCESS_PREFIX))
    })
}

/// `en-US` → `en`.
fn primary_subtag(language: &str) -> String {
    let language = language.trim();
    language
        .split(['-', '_'])
        .next()
        .unwrap_or(language)
        .to_owned()
}

fn write_block(out: &mut String, generation: FormatGeneration) {
    match generation {
        FormatGeneration::Modern => {
            for (property, value) in MODERN_BLOCK {
                out.push_str(&format!("<meta property=\"{property}\">{value}</meta>\n"));
            }
        }
        FormatGeneration::Legacy => {
            for (name, value) in LEGACY_BLOCK {
                out.push_str(&format!("<meta name=\"{name}\" content=\"{value}\"/>\n"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METADATA: &str = r#"<metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:title>Book</dc:title>
    <dc:language> en-US </dc:language>
    <dc:language>fr</dc:language>
    <meta property="dcterms:modified">2024-01-01T00:00:00Z</meta>
  </metadata>"#;

    #[test]
    fn modern_block_injected_before_close() {
        let outcome = annotate_metadata(METADATA, FormatGeneration::Modern).unwrap();
        assert_eq!(outcome.primary_language.as_deref(), Some("en"));
        assert!(outcome.injected);
        let expected_tail = concat!(
            "<meta property=\"schema:accessibilitySummary\">This publication conforms to WCAG 2.0 AA.</meta>\n",
            "<meta property=\"schema:accessMode\">textual</meta>\n",
            "<meta property=\"schema:accessMode\">visual</meta>\n",
            "<meta property=\"schema:accessModeSufficient\">textual</meta>\n",
            "<meta property=\"schema:accessibilityFeature\">structuralNavigation</meta>\n",
            "<meta property=\"schema:accessibilityHazard\">none</meta>\n",
            "</metadata>"
        );
        assert!(outcome.metadata.ends_with(expected_tail), "{}", outcome.metadata);
        assert!(outcome.metadata.starts_with(&METADATA[..METADATA.len() - "</metadata>".len()]));
    }

    #[test]
    fn legacy_block_uses_name_content() {
        let outcome = annotate_metadata(METADATA, FormatGeneration::Legacy).unwrap();
        assert!(outcome.metadata.contains(
            "<meta name=\"schema:accessModeSufficient\" content=\"textual\"/>\n</metadata>"
        ));
        assert!(!outcome.metadata.contains("visual"));
    }

    #[test]
    fn existing_declaration_blocks_injection() {
        let existing = r#"<metadata><dc:language>de</dc:language><meta name="schema:accessMode" content="textual"/></metadata>"#;
        let outcome = annotate_metadata(existing, FormatGeneration::Legacy).unwrap();
        assert!(!outcome.injected);
        assert_eq!(outcome.metadata, existing);
        assert_eq!(outcome.primary_language.as_deref(), Some("de"));
    }

    #[test]
    fn annotation_is_idempotent() {
        let once = annotate_metadata(METADATA, FormatGeneration::Modern).unwrap();
        let twice = annotate_metadata(&once.metadata, FormatGeneration::Modern).unwrap();
        assert!(!twice.injected);
        assert_eq!(twice.metadata, once.metadata);
    }

    #[test]
    fn missing_language_is_none() {
        let outcome = annotate_metadata("<metadata><dc:title>x</dc:title></metadata>", FormatGeneration::Modern)
            .unwrap();
        assert_eq!(outcome.primary_language, None);
    }
}
