// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-document accessibility rewrite.
//
// A single streaming pass over one XHTML content document that:
//   - merges nav landmarks into `epub:type` on the element they point at
//   - sets `lang` / `xml:lang` on the root element
//   - forces an `alt` attribute on every image and records it for review
//   - derives ARIA `role` values from `epub:type`
//   - fills an empty `<head><title>` from the table of contents
//
// Everything else is written back byte for byte.

use accessaide_core::error::Result;
use accessaide_core::types::{ImageRecord, LandmarkMap, LandmarkRecord, Locator, TitleMap};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::attrs::{ValueSet, merge_tokens};
use crate::roles::infer_role;
use crate::tokenizer::{Event, Tag, TagKind, Tokenizer, serialize_tag};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Derive `role` from `epub:type` (EPUB 3 only).
    pub aria_roles: bool,
    /// Merge whole-document landmarks into `<body epub:type>`.
    pub apply_document_landmarks: bool,
}

/// Everything the rewrite needs to know about one document.
#[derive(Debug, Clone, Copy)]
pub struct DocumentContext<'a> {
    pub id: &'a str,
    pub path: &'a str,
    pub language: &'a str,
    pub titles: &'a TitleMap,
    pub landmarks: &'a LandmarkMap,
    pub options: RewriteOptions,
}

/// Counts of what the rewrite changed, reported per document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteStats {
    /// `epub:type` tokens added from landmarks.
    pub landmarks_applied: usize,
    /// `role` tokens added.
    pub roles_added: usize,
    /// A missing head title was filled with a non-empty value.
    pub title_filled: bool,
    /// The root element's language attributes changed.
    pub language_set: bool,
    /// Images that had no `alt` attribute.
    pub alt_added: usize,
}

impl RewriteStats {
    pub fn is_unchanged(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    pub content: String,
    pub images: Vec<ImageRecord>,
    pub stats: RewriteStats,
}

/// The image counting rule. Discovery and the alt merge must agree on it.
pub fn is_image_tag(tag: &Tag<'_>) -> bool {
    tag.is_open() && tag.local_name().eq_ignore_ascii_case("img")
}

/// Whether a path lies inside the document head.
fn in_head(path: &str) -> bool {
    path.split('.').any(|segment| segment == "head")
}

/// Rewrite one content document.
#[instrument(skip_all, fields(document = ctx.path, len = content.len()))]
pub fn rewrite_document(content: &str, ctx: &DocumentContext<'_>) -> Result<RewriteOutcome> {
    let landmarks: &[LandmarkRecord] = ctx
        .landmarks
        .get(ctx.path)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let title = ctx.titles.get(ctx.path).map_or("", String::as_str);

    let mut out = String::with_capacity(content.len() + 256);
    let mut images = Vec::new();
    let mut stats = RewriteStats::default();
    let mut ordinal = 0usize;
    let mut head_title_found = false;

    for event in Tokenizer::new(content) {
        match event? {
            Event::Text(text) => {
                if !head_title_found
                    && !text.is_blank()
                    && text.path.rsplit('.').next() == Some("title")
                    && in_head(&text.path)
                {
                    head_title_found = true;
                }
                out.push_str(text.content);
            }
            Event::Tag(mut tag) if tag.is_open() => {
                let name = tag.local_name().to_ascii_lowercase();

                stats.landmarks_applied += apply_landmarks(&mut tag, &name, landmarks, ctx.options);

                if name == "html" && tag.kind == TagKind::Begin {
                    let lang = tag.attrs.set("lang", ctx.language);
                    let xml_lang = tag.attrs.set("xml:lang", ctx.language);
                    stats.language_set |= lang || xml_lang;
                }

                if is_image_tag(&tag) {
                    ordinal += 1;
                    let alt = tag.attrs.get("alt").unwrap_or("").to_owned();
                    if tag.attrs.set("alt", alt.as_str()) {
                        stats.alt_added += 1;
                    }
                    images.push(ImageRecord {
                        document_id: ctx.id.to_owned(),
                        document_path: ctx.path.to_owned(),
                        ordinal,
                        source: tag.attrs.get("src").unwrap_or("").to_owned(),
                        alt,
                    });
                }

                if ctx.options.aria_roles {
                    stats.roles_added += apply_roles(&mut tag, &name);
                }

                if name == "title" && tag.kind == TagKind::Single && in_head(&tag.path) {
                    // <title/> becomes <title>…</title>
                    out.push_str(&serialize_tag(&tag.name, TagKind::Begin, &tag.attrs));
                    if !head_title_found {
                        head_title_found = true;
                        out.push_str(title);
                        stats.title_filled = !title.is_empty();
                    }
                    out.push_str(&serialize_tag(&tag.name, TagKind::End, &tag.attrs));
                    continue;
                }

                tag.write_markup(&mut out);
            }
            Event::Tag(tag) => {
                if tag.kind == TagKind::End
                    && !head_title_found
                    && tag.local_name().eq_ignore_ascii_case("title")
                    && in_head(&tag.path)
                {
                    head_title_found = true;
                    out.push_str(title);
                    stats.title_filled = !title.is_empty();
                }
                tag.write_markup(&mut out);
            }
            Event::Special(special) => out.push_str(special.raw),
        }
    }

    debug!(images = images.len(), ?stats, "document rewritten");
    Ok(RewriteOutcome {
        content: out,
        images,
        stats,
    })
}

/// Merge the landmark types that target this tag into its `epub:type`.
fn apply_landmarks(
    tag: &mut Tag<'_>,
    name: &str,
    landmarks: &[LandmarkRecord],
    options: RewriteOptions,
) -> usize {
    if landmarks.is_empty() {
        return 0;
    }
    let id = tag.attrs.get("id").map(str::to_owned);
    let is_body = name == "body" && tag.kind == TagKind::Begin;

    let types = landmarks.iter().filter(|record| match &record.locator {
        Locator::Fragment(fragment) => id.as_deref() == Some(fragment.as_str()),
        Locator::Document => options.apply_document_landmarks && is_body,
    });
    merge_tokens(
        &mut tag.attrs,
        "epub:type",
        types.map(|record| record.semantic_type.as_str()),
    )
}

/// Add every role licensed by the tag's `epub:type` values.
fn apply_roles(tag: &mut Tag<'_>, name: &str) -> usize {
    let Some(epub_type) = tag.attrs.get("epub:type") else {
        return 0;
    };
    let has_href = tag.attrs.contains("href");
    let has_alt = tag.attrs.get("alt").is_some_and(|alt| !alt.trim().is_empty());

    let roles: Vec<&'static str> = ValueSet::parse(epub_type)
        .iter()
        .filter_map(|semantic| infer_role(semantic, name, has_href, has_alt))
        .collect();
    if roles.is_empty() {
        return 0;
    }
    merge_tokens(&mut tag.attrs, "role", roles)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        titles: TitleMap,
        landmarks: LandmarkMap,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                titles: TitleMap::new(),
                landmarks: LandmarkMap::new(),
            }
        }

        fn ctx<'a>(&'a self, path: &'a str) -> DocumentContext<'a> {
            DocumentContext {
                id: "doc",
                path,
                language: "en",
                titles: &self.titles,
                landmarks: &self.landmarks,
                options: RewriteOptions {
                    aria_roles: true,
                    apply_document_landmarks: false,
                },
            }
        }
    }

    fn landmark(fragment: &str, semantic_type: &str) -> LandmarkRecord {
        LandmarkRecord {
            locator: Locator::Fragment(fragment.to_owned()),
            semantic_type: semantic_type.to_owned(),
        }
    }

    const PLAIN: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
        <!DOCTYPE html>\n\
        <html xmlns=\"http://www.w3.org/1999/xhtml\" lang='en' xml:lang=\"en\">\n\
        <head>\n  <title>Kept</title>\n  <!-- note -->\n</head>\n\
        <body>\n  <p class=\"x\"  >Hello &amp; welcome</p>\n</body>\n</html>\n";

    #[test]
    fn untouched_document_is_byte_identical() {
        let fx = Fixture::new();
        let outcome = rewrite_document(PLAIN, &fx.ctx("Text/a.xhtml")).unwrap();
        assert_eq!(outcome.content, PLAIN);
        assert!(outcome.images.is_empty());
        assert!(outcome.stats.is_unchanged());
    }

    #[test]
    fn language_set_on_html() {
        let fx = Fixture::new();
        let src = "<html><head><title>T</title></head><body/></html>";
        let outcome = rewrite_document(src, &fx.ctx("a.xhtml")).unwrap();
        assert_eq!(
            outcome.content,
            "<html lang=\"en\" xml:lang=\"en\"><head><title>T</title></head><body/></html>"
        );
        assert!(outcome.stats.language_set);
    }

    #[test]
    fn language_is_overwritten() {
        let fx = Fixture::new();
        let src = "<html lang=\"fr\"><head><title>T</title></head></html>";
        let outcome = rewrite_document(src, &fx.ctx("a.xhtml")).unwrap();
        assert!(outcome.content.starts_with("<html lang=\"en\" xml:lang=\"en\">"));
    }

    #[test]
    fn empty_title_is_backfilled() {
        let mut fx = Fixture::new();
        fx.titles.insert("doc2.xhtml".into(), "Chapter Two".into());
        let src = "<html lang=\"en\" xml:lang=\"en\"><head><title>  </title></head><body></body></html>";
        let outcome = rewrite_document(src, &fx.ctx("doc2.xhtml")).unwrap();
        assert!(outcome.content.contains("<title>  Chapter Two</title>"));
        assert!(outcome.stats.title_filled);
    }

    #[test]
    fn existing_title_is_kept() {
        let mut fx = Fixture::new();
        fx.titles.insert("doc2.xhtml".into(), "Chapter Two".into());
        let src = "<html lang=\"en\" xml:lang=\"en\"><head><title>Mine</title></head></html>";
        let outcome = rewrite_document(src, &fx.ctx("doc2.xhtml")).unwrap();
        assert_eq!(outcome.content, src);
        assert!(!outcome.stats.title_filled);
    }

    #[test]
    fn self_closed_title_is_expanded() {
        let mut fx = Fixture::new();
        fx.titles.insert("doc2.xhtml".into(), "Chapter Two".into());
        let src = "<html lang=\"en\" xml:lang=\"en\"><head><title id=\"t\"/></head></html>";
        let outcome = rewrite_document(src, &fx.ctx("doc2.xhtml")).unwrap();
        assert!(outcome.content.contains("<head><title id=\"t\">Chapter Two</title></head>"));
    }

    #[test]
    fn title_outside_head_is_ignored() {
        let mut fx = Fixture::new();
        fx.titles.insert("a.xhtml".into(), "X".into());
        let src = "<html lang=\"en\" xml:lang=\"en\"><body><svg><title></title></svg></body></html>";
        let outcome = rewrite_document(src, &fx.ctx("a.xhtml")).unwrap();
        assert_eq!(outcome.content, src);
    }

    #[test]
    fn images_are_counted_and_given_alt() {
        let fx = Fixture::new();
        let src = "<html lang=\"en\" xml:lang=\"en\"><body>\
            <img src=\"a.png\"/><p><img src=\"b.png\" alt=\"Bee &amp; co\"/></p>\
            <img src=\"c.png\" alt=\"\"></img></body></html>";
        let outcome = rewrite_document(src, &fx.ctx("a.xhtml")).unwrap();
        let ordinals: Vec<_> = outcome.images.iter().map(|i| i.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
        assert_eq!(outcome.images[1].source, "b.png");
        assert_eq!(outcome.images[1].alt, "Bee &amp; co");
        assert_eq!(outcome.images[0].alt, "");
        assert!(outcome.content.contains("<img src=\"a.png\" alt=\"\"/>"));
        assert!(outcome.content.contains("<img src=\"b.png\" alt=\"Bee &amp; co\"/>"));
        assert_eq!(outcome.stats.alt_added, 1);
    }

    #[test]
    fn fragment_landmark_adds_type_and_role() {
        let mut fx = Fixture::new();
        fx.landmarks
            .insert("b.xhtml".into(), vec![landmark("s1", "chapter")]);
        let src = "<html lang=\"en\" xml:lang=\"en\"><body><section id=\"s1\"><p>x</p></section></body></html>";
        let outcome = rewrite_document(src, &fx.ctx("b.xhtml")).unwrap();
        assert!(
            outcome
                .content
                .contains("<section id=\"s1\" epub:type=\"chapter\" role=\"doc-chapter\">")
        );
        assert_eq!(outcome.stats.landmarks_applied, 1);
        assert_eq!(outcome.stats.roles_added, 1);
    }

    #[test]
    fn several_landmarks_in_one_document() {
        let mut fx = Fixture::new();
        fx.landmarks.insert(
            "b.xhtml".into(),
            vec![landmark("s1", "chapter"), landmark("n1", "footnote")],
        );
        let src = "<body><section id=\"s1\"></section><aside id=\"n1\"></aside></body>";
        let outcome = rewrite_document(src, &fx.ctx("b.xhtml")).unwrap();
        assert!(outcome.content.contains("<aside id=\"n1\" epub:type=\"footnote\" role=\"doc-footnote\">"));
        assert_eq!(outcome.stats.landmarks_applied, 2);
    }

    #[test]
    fn landmark_merges_with_existing_type() {
        let mut fx = Fixture::new();
        fx.landmarks
            .insert("b.xhtml".into(), vec![landmark("s1", "chapter")]);
        let src = "<section id=\"s1\" epub:type=\"bodymatter\"></section>";
        let outcome = rewrite_document(src, &fx.ctx("b.xhtml")).unwrap();
        assert!(outcome.content.contains("epub:type=\"bodymatter chapter\""));
    }

    #[test]
    fn document_landmark_goes_to_body_when_enabled() {
        let mut fx = Fixture::new();
        fx.landmarks.insert(
            "b.xhtml".into(),
            vec![LandmarkRecord {
                locator: Locator::Document,
                semantic_type: "bodymatter".into(),
            }],
        );
        let src = "<html><body><p>x</p></body></html>";

        let off = rewrite_document(src, &fx.ctx("b.xhtml")).unwrap();
        assert!(off.content.contains("<body>"));

        let mut ctx = fx.ctx("b.xhtml");
        ctx.options.apply_document_landmarks = true;
        let on = rewrite_document(src, &ctx).unwrap();
        assert!(on.content.contains("<body epub:type=\"bodymatter\">"));
    }

    #[test]
    fn unlicensed_role_is_not_added() {
        let fx = Fixture::new();
        let src = "<p>See<span epub:type=\"footnote\">1</span></p>";
        let outcome = rewrite_document(src, &fx.ctx("a.xhtml")).unwrap();
        assert_eq!(outcome.content, src);
    }

    #[test]
    fn roles_follow_every_type_value() {
        let fx = Fixture::new();
        let src = "<div epub:type=\"footnote tip\" role=\"note\"></div>";
        let outcome = rewrite_document(src, &fx.ctx("a.xhtml")).unwrap();
        assert!(outcome.content.contains("role=\"note doc-footnote doc-tip\""));
        assert_eq!(outcome.stats.roles_added, 2);
    }

    #[test]
    fn roles_disabled_for_legacy() {
        let fx = Fixture::new();
        let mut ctx = fx.ctx("a.xhtml");
        ctx.options.aria_roles = false;
        let src = "<section epub:type=\"chapter\"></section>";
        let outcome = rewrite_document(src, &ctx).unwrap();
        assert_eq!(outcome.content, src);
    }

    #[test]
    fn rewrite_is_idempotent() {
        let mut fx = Fixture::new();
        fx.titles.insert("b.xhtml".into(), "Bee".into());
        fx.landmarks
            .insert("b.xhtml".into(), vec![landmark("s1", "chapter")]);
        let src = "<html><head><title></title></head><body>\
            <section id=\"s1\"><img src=\"x.png\"/><img src=\"y.png\" alt=\"y\"/></section>\
            </body></html>";
        let first = rewrite_document(src, &fx.ctx("b.xhtml")).unwrap();
        let second = rewrite_document(&first.content, &fx.ctx("b.xhtml")).unwrap();
        assert_eq!(second.content, first.content);
        assert!(second.stats.is_unchanged());
        let ordinals = |o: &RewriteOutcome| o.images.iter().map(|i| i.ordinal).collect::<Vec<_>>();
        assert_eq!(ordinals(&first), ordinals(&second));
    }
}
