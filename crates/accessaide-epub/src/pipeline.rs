// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The annotation pipeline.
//
// Stages, in order: media precondition, metadata annotation, EPUB 3
// preconditions, navigation maps, document rewrite, image export, alt text
// review, alt merge, persist. Every change is staged in memory and written
// through the host only in the last stage, so a failed precondition leaves
// the book untouched.

use std::collections::BTreeMap;

use accessaide_core::config::AppConfig;
use accessaide_core::error::{AccessAideError, Result};
use accessaide_core::types::{FormatGeneration, ImageRecord, ManifestItem};
use accessaide_markup::escape::{decode, encode};
use accessaide_markup::{
    DocumentContext, NavOptions, NavigationMaps, RewriteOptions, RewriteStats, apply_alt_updates,
    annotate_metadata, parse_nav, parse_ncx, resolve_href, rewrite_document,
};
use accessaide_media::{ImageExport, RasterConverter};
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::book::BookHost;
use crate::report::{DocumentReport, RunReport, hash_bytes};
use crate::review::{AltTextReview, ReviewItem, ReviewOutcome};

/// A rewritten document waiting to be persisted.
#[derive(Debug)]
struct StagedDocument {
    id: String,
    path: String,
    original: String,
    content: String,
    stats: RewriteStats,
    images: usize,
    alt_updated: usize,
}

impl StagedDocument {
    fn report(&self) -> DocumentReport {
        DocumentReport {
            id: self.id.clone(),
            path: self.path.clone(),
            sha256_before: hash_bytes(self.original.as_bytes()),
            sha256_after: hash_bytes(self.content.as_bytes()),
            stats: self.stats.clone(),
            images: self.images,
            alt_updated: self.alt_updated,
        }
    }
}

/// What the review stage produced.
#[derive(Debug, Default)]
struct ReviewResult {
    reviewed: usize,
    placeholders: usize,
    cancelled: bool,
    /// document id → (ordinal, encoded alt)
    updates: BTreeMap<String, Vec<(usize, String)>>,
}

pub struct Pipeline {
    config: AppConfig,
    dry_run: bool,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            dry_run: false,
        }
    }

    /// Run every stage but the final write.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Annotate the book held by `host`, asking `reviewer` for alt text.
    #[instrument(skip_all, fields(dry_run = self.dry_run))]
    pub fn run<H, R>(&self, host: &mut H, reviewer: &mut R) -> Result<RunReport>
    where
        H: BookHost + ?Sized,
        R: AltTextReview + ?Sized,
    {
        let started_at = Utc::now();
        let generation = host.generation();
        info!(%generation, items = host.manifest().len(), "annotating book");

        check_media(host.manifest())?;

        let metadata = annotate_metadata(host.metadata_xml(), generation)
            .map_err(|err| err.in_document("package metadata"))?;
        let language = metadata
            .primary_language
            .clone()
            .ok_or(AccessAideError::MissingLanguage)?;
        info!(language = %language, injected = metadata.injected, "metadata annotated");

        if generation.is_modern() {
            check_modern(host.manifest())?;
        }

        let maps = self.build_maps(&*host, generation)?;
        let (mut staged, images) = self.rewrite_documents(&*host, generation, &language, &maps)?;

        let review = if images.is_empty() {
            debug!("no images, review skipped");
            ReviewResult::default()
        } else {
            self.review_images(&*host, &images, reviewer)?
        };

        let mut unmatched_images = Vec::new();
        for document in &mut staged {
            let Some(updates) = review.updates.get(&document.id) else {
                continue;
            };
            let (content, missing) = apply_alt_updates(&document.content, updates)
                .map_err(|err| err.in_document(document.path.as_str()))?;
            document.content = content;
            document.alt_updated = updates.len() - missing.len();
            unmatched_images.extend(
                missing
                    .into_iter()
                    .map(|ordinal| format!("{}#{ordinal}", document.path)),
            );
        }

        if self.dry_run {
            info!("dry run, nothing written");
        } else {
            persist(host, metadata.metadata, &staged)?;
        }

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            generation,
            primary_language: language,
            metadata_injected: metadata.injected,
            dry_run: self.dry_run,
            documents: staged.iter().map(StagedDocument::report).collect(),
            images_reviewed: review.reviewed,
            placeholders: review.placeholders,
            review_cancelled: review.cancelled,
            unmatched_images,
        };
        info!(
            documents = report.documents.len(),
            changed = report.documents_changed(),
            alt_updates = report.alt_updates(),
            "annotation finished"
        );
        Ok(report)
    }

    fn build_maps<H: BookHost + ?Sized>(
        &self,
        host: &H,
        generation: FormatGeneration,
    ) -> Result<NavigationMaps> {
        match generation {
            FormatGeneration::Modern => {
                let nav = host.nav_item().ok_or(AccessAideError::MissingNavigation)?;
                let content = host.read_text(&nav.id)?;
                let options = NavOptions {
                    keep_document_landmarks: self.config.apply_document_landmarks,
                };
                parse_nav(&content, &nav.path, options)
                    .map_err(|err| err.in_document(nav.path.as_str()))
            }
            FormatGeneration::Legacy => {
                let Some(ncx) = host.ncx_item() else {
                    warn!("no NCX named by the spine, titles cannot be filled");
                    return Ok(NavigationMaps::default());
                };
                let content = host.read_text(&ncx.id)?;
                let titles = parse_ncx(&content, &ncx.path)
                    .map_err(|err| err.in_document(ncx.path.as_str()))?;
                Ok(NavigationMaps {
                    titles,
                    landmarks: Default::default(),
                })
            }
        }
    }

    fn rewrite_documents<H: BookHost + ?Sized>(
        &self,
        host: &H,
        generation: FormatGeneration,
        language: &str,
        maps: &NavigationMaps,
    ) -> Result<(Vec<StagedDocument>, Vec<ImageRecord>)> {
        let options = RewriteOptions {
            aria_roles: generation.is_modern(),
            apply_document_landmarks: self.config.apply_document_landmarks,
        };
        let mut staged = Vec::new();
        let mut images = Vec::new();

        for item in host.content_documents() {
            let original = host.read_text(&item.id)?;
            let ctx = DocumentContext {
                id: &item.id,
                path: &item.path,
                language,
                titles: &maps.titles,
                landmarks: &maps.landmarks,
                options,
            };
            let outcome = rewrite_document(&original, &ctx)
                .map_err(|err| err.in_document(item.path.as_str()))?;

            staged.push(StagedDocument {
                id: item.id.clone(),
                path: item.path.clone(),
                original,
                content: outcome.content,
                stats: outcome.stats,
                images: outcome.images.len(),
                alt_updated: 0,
            });
            images.extend(outcome.images);
        }

        info!(documents = staged.len(), images = images.len(), "documents rewritten");
        Ok((staged, images))
    }

    fn review_images<H, R>(
        &self,
        host: &H,
        images: &[ImageRecord],
        reviewer: &mut R,
    ) -> Result<ReviewResult>
    where
        H: BookHost + ?Sized,
        R: AltTextReview + ?Sized,
    {
        // Dropped, and its directory removed, when this returns.
        let mut export = self.export_images(host)?;

        let mut items = Vec::with_capacity(images.len());
        for record in images {
            let exported = resolve_href(&record.document_path, &record.source)
                .and_then(|target| export.get(&target.path))
                .map(|image| image.path.clone());
            let path = match exported {
                Some(path) => path,
                None => {
                    warn!(
                        document = %record.document_path,
                        src = %record.source,
                        "image not found in the manifest"
                    );
                    export.missing_image()?
                }
            };
            items.push(ReviewItem {
                document: record.document_path.clone(),
                ordinal: record.ordinal,
                source: record.source.clone(),
                path,
                alt: decode(&record.alt),
            });
        }

        let mut result = ReviewResult {
            reviewed: items.len(),
            placeholders: export.placeholders(),
            ..ReviewResult::default()
        };

        match reviewer.review(&items)? {
            ReviewOutcome::Cancelled => {
                info!("review cancelled, alt text unchanged");
                result.cancelled = true;
            }
            ReviewOutcome::Updated(reviewed) => {
                if reviewed.len() != items.len() {
                    return Err(AccessAideError::ReviewMismatch {
                        expected: items.len(),
                        actual: reviewed.len(),
                    });
                }
                for ((record, before), after) in images.iter().zip(&items).zip(&reviewed) {
                    if after.alt != before.alt {
                        debug!(
                            document = %record.document_path,
                            ordinal = record.ordinal,
                            "alt text changed"
                        );
                        result
                            .updates
                            .entry(record.document_id.clone())
                            .or_default()
                            .push((record.ordinal, encode(&after.alt)));
                    }
                }
            }
        }
        Ok(result)
    }

    fn export_images<H: BookHost + ?Sized>(&self, host: &H) -> Result<ImageExport> {
        let converter = self.config.converter.as_ref().map(|program| {
            RasterConverter::new(program).with_args(&self.config.converter_args)
        });
        let mut export = ImageExport::new(converter, self.config.placeholder_size)?;

        for item in host.manifest().iter().filter(|item| item.is_image()) {
            match host.read_bytes(&item.id) {
                Ok(bytes) => {
                    export.add(item, &bytes)?;
                }
                Err(err) => warn!(%err, id = %item.id, "image could not be read"),
            }
        }
        info!(
            images = export.len(),
            placeholders = export.placeholders(),
            dir = %export.root().display(),
            "images exported"
        );
        Ok(export)
    }
}

fn check_media(manifest: &[ManifestItem]) -> Result<()> {
    let media: Vec<String> = manifest
        .iter()
        .filter(|item| item.is_audio_or_video())
        .map(|item| item.path.clone())
        .collect();
    if media.is_empty() {
        Ok(())
    } else {
        Err(AccessAideError::AudioVideoPresent(media))
    }
}

fn check_modern(manifest: &[ManifestItem]) -> Result<()> {
    if let Some(item) = manifest.iter().find(|item| item.has_property("mathml")) {
        return Err(AccessAideError::MathMlPresent(item.path.clone()));
    }
    if let Some(item) = manifest.iter().find(|item| item.has_property("scripted")) {
        return Err(AccessAideError::ScriptedContent(item.path.clone()));
    }
    if !manifest.iter().any(|item| item.has_property("nav")) {
        return Err(AccessAideError::MissingNavigation);
    }
    Ok(())
}

/// Write the staged metadata and every document that changed.
fn persist<H: BookHost + ?Sized>(
    host: &mut H,
    metadata: String,
    staged: &[StagedDocument],
) -> Result<()> {
    host.set_metadata_xml(metadata);
    let mut written = 0usize;
    for document in staged.iter().filter(|d| d.content != d.original) {
        host.write_text(&document.id, &document.content)?;
        written += 1;
    }
    host.flush()?;
    info!(written, "book updated");
    Ok(())
}
