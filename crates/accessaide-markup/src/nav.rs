// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Navigation map builder.
//
// One pass over the EPUB 3 nav document collects the title of every content
// document (first toc label pointing at it) and the landmarks pointing into
// documents. For EPUB 2 the NCX provides titles only.

use std::collections::HashSet;

use accessaide_core::error::Result;
use accessaide_core::types::{LandmarkMap, LandmarkRecord, Locator, TitleMap};
use tracing::{debug, instrument};

use crate::href::resolve_href;
use crate::tokenizer::{Event, TagKind, Tokenizer};

/// Options for the nav pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct NavOptions {
    /// Keep landmarks that point at a whole document (no fragment).
    pub keep_document_landmarks: bool,
}

/// Result of the nav pass. Built once, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationMaps {
    pub titles: TitleMap,
    pub landmarks: LandmarkMap,
}

/// The nav section the parser is currently inside. Only the most recent `nav`
/// counts; nested nav sections are not tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    Toc,
    Landmarks,
}

/// Parse an EPUB 3 navigation document located at `nav_path`.
#[instrument(skip(content, options), fields(len = content.len()))]
pub fn parse_nav(content: &str, nav_path: &str, options: NavOptions) -> Result<NavigationMaps> {
    let mut maps = NavigationMaps::default();
    let mut section = Section::Other;
    // Target document of the toc entry whose label is awaited.
    let mut pending_label: Option<String> = None;
    let mut awaiting_label = false;
    let mut seen_targets: HashSet<String> = HashSet::new();
    let mut nav_title_found = false;

    for event in Tokenizer::new(content) {
        match event? {
            Event::Tag(tag) if tag.kind == TagKind::Begin => match tag.local_name() {
                "nav" => {
                    section = match tag.attrs.get("epub:type").map(str::trim) {
                        Some("toc") => Section::Toc,
                        Some("landmarks") => Section::Landmarks,
                        _ => Section::Other,
                    };
                }
                "a" if section == Section::Toc => {
                    if let Some(href) = tag.attrs.get("href") {
                        pending_label = resolve_href(nav_path, href).map(|t| t.path);
                        awaiting_label = true;
                    }
                }
                "a" if section == Section::Landmarks => {
                    let (Some(href), Some(semantic_type)) =
                        (tag.attrs.get("href"), tag.attrs.get("epub:type"))
                    else {
                        continue;
                    };
                    let Some(target) = resolve_href(nav_path, href) else {
                        continue;
                    };
                    let locator = match target.fragment {
                        Some(id) => Locator::Fragment(id),
                        None if options.keep_document_landmarks => Locator::Document,
                        None => {
                            debug!(href, "skipping whole-document landmark");
                            continue;
                        }
                    };
                    let record = LandmarkRecord {
                        locator,
                        semantic_type: semantic_type.trim().to_owned(),
                    };
                    let entries = maps.landmarks.entry(target.path).or_default();
                    if !entries.contains(&record) {
                        entries.push(record);
                    }
                }
                _ => {}
            },
            Event::Text(text) if !text.is_blank() => {
                let label = text.content.trim();

                if !nav_title_found && text.path.split('.').any(|part| part == "h1") {
                    nav_title_found = true;
                    maps.titles
                        .entry(nav_path.to_owned())
                        .or_insert_with(|| label.to_owned());
                }

                if section == Section::Toc && awaiting_label {
                    awaiting_label = false;
                    if let Some(target) = pending_label.take() {
                        if seen_targets.insert(target.clone()) {
                            maps.titles.insert(target, label.to_owned());
                        }
                    }
                }
            }
            _ => {}
        }
    }

    debug!(
        titles = maps.titles.len(),
        landmarks = maps.landmarks.values().map(Vec::len).sum::<usize>(),
        "nav parsed"
    );
    Ok(maps)
}

/// Parse an EPUB 2 NCX located at `ncx_path` into a title map.
#[instrument(skip(content), fields(len = content.len()))]
pub fn parse_ncx(content: &str, ncx_path: &str) -> Result<TitleMap> {
    let mut titles = TitleMap::new();
    let mut label: Option<String> = None;
    let mut seen_targets: HashSet<String> = HashSet::new();

    for event in Tokenizer::new(content) {
        match event? {
            Event::Text(text) if text.path.ends_with("navpoint.navlabel.text") => {
                let trimmed = text.content.trim();
                if !trimmed.is_empty() {
                    label = Some(trimmed.to_owned());
                }
            }
            Event::Tag(tag)
                if tag.is_open()
                    && tag.local_name() == "content"
                    && tag.path.ends_with("navpoint") =>
            {
                let Some(target) = tag
                    .attrs
                    .get("src")
                    .and_then(|src| resolve_href(ncx_path, src))
                else {
                    continue;
                };
                if let Some(text) = label.take() {
                    if seen_targets.insert(target.path.clone()) {
                        titles.insert(target.path, text);
                    }
                }
            }
            _ => {}
        }
    }

    debug!(titles = titles.len(), "ncx parsed");
    Ok(titles)
}
