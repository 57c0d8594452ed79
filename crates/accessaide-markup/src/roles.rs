// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Role inference: `epub:type` semantic → ARIA role, licensed by host tag.
//
// A role is added only when the host element may carry it. Two routes license
// a role: the general allowance (tags that accept any role, with conditions on
// `href` and `alt`) and a per-role list of specific host tags.

/// `epub:type` value → ARIA role (DPUB-ARIA and core ARIA).
const SEMANTIC_ROLES: &[(&str, &str)] = &[
    ("abstract", "doc-abstract"),
    ("acknowledgments", "doc-acknowledgments"),
    ("afterword", "doc-afterword"),
    ("appendix", "doc-appendix"),
    ("biblioentry", "doc-biblioentry"),
    ("bibliography", "doc-bibliography"),
    ("biblioref", "doc-biblioref"),
    ("chapter", "doc-chapter"),
    ("colophon", "doc-colophon"),
    ("conclusion", "doc-conclusion"),
    ("cover", "doc-cover"),
    ("credit", "doc-credit"),
    ("credits", "doc-credits"),
    ("dedication", "doc-dedication"),
    ("endnote", "doc-endnote"),
    ("endnotes", "doc-endnotes"),
    ("epigraph", "doc-epigraph"),
    ("epilogue", "doc-epilogue"),
    ("errata", "doc-errata"),
    ("figure", "figure"),
    ("footnote", "doc-footnote"),
    ("foreword", "doc-foreword"),
    ("glossary", "doc-glossary"),
    ("glossdef", "definition"),
    ("glossref", "doc-glossref"),
    ("glossterm", "term"),
    ("index", "doc-index"),
    ("introduction", "doc-introduction"),
    ("landmarks", "directory"),
    ("list", "list"),
    ("list-item", "listitem"),
    ("noteref", "doc-noteref"),
    ("notice", "doc-notice"),
    ("page-list", "doc-pagelist"),
    ("pagebreak", "doc-pagebreak"),
    ("part", "doc-part"),
    ("preface", "doc-preface"),
    ("prologue", "doc-prologue"),
    ("pullquote", "doc-pullquote"),
    ("qna", "doc-qna"),
    ("referrer", "doc-backlink"),
    ("subtitle", "doc-subtitle"),
    ("table", "table"),
    ("table-cell", "cell"),
    ("table-row", "row"),
    ("tip", "doc-tip"),
    ("toc", "doc-toc"),
];

/// Conditions under which a tag accepts any role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagCapability {
    /// The tag keeps the allowance when it has an `href`.
    pub href_allowed: bool,
    /// The tag only has the allowance with a non-empty `alt`.
    pub alt_required: bool,
}

const ANY: TagCapability = TagCapability {
    href_allowed: true,
    alt_required: false,
};

/// Tags licensed for any role under the general allowance.
const TAG_CAPABILITIES: &[(&str, TagCapability)] = &[
    (
        "a",
        TagCapability {
            href_allowed: false,
            alt_required: false,
        },
    ),
    ("address", ANY),
    ("blockquote", ANY),
    ("div", ANY),
    (
        "img",
        TagCapability {
            href_allowed: true,
            alt_required: true,
        },
    ),
    ("p", ANY),
    ("pre", ANY),
    ("table", ANY),
    ("tbody", ANY),
    ("td", ANY),
    ("tfoot", ANY),
    ("th", ANY),
    ("thead", ANY),
    ("tr", ANY),
];

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Role → host tags that accept it outside the general allowance.
const ROLE_TAGS: &[(&str, &[&str])] = &[
    ("definition", &["dd"]),
    ("directory", &["ol", "ul"]),
    ("doc-abstract", &["section"]),
    ("doc-acknowledgments", &["section"]),
    ("doc-afterword", &["section"]),
    ("doc-appendix", &["section"]),
    ("doc-backlink", &["a"]),
    ("doc-biblioentry", &["li"]),
    ("doc-bibliography", &["section"]),
    ("doc-biblioref", &["a"]),
    ("doc-chapter", &["section"]),
    ("doc-colophon", &["section"]),
    ("doc-conclusion", &["section"]),
    ("doc-cover", &["img"]),
    ("doc-credit", &["section"]),
    ("doc-credits", &["section"]),
    ("doc-dedication", &["section"]),
    ("doc-endnote", &["li"]),
    ("doc-endnotes", &["section"]),
    ("doc-epigraph", &["section"]),
    ("doc-epilogue", &["section"]),
    ("doc-errata", &["section"]),
    ("doc-footnote", &["aside", "footer", "header"]),
    ("doc-foreword", &["section"]),
    ("doc-glossary", &["section"]),
    ("doc-glossref", &["a"]),
    ("doc-index", &["nav", "section"]),
    ("doc-introduction", &["section"]),
    ("doc-noteref", &["a"]),
    ("doc-notice", &["section"]),
    ("doc-pagebreak", &["hr"]),
    ("doc-pagelist", &["nav", "section"]),
    ("doc-part", &["section"]),
    ("doc-preface", &["section"]),
    ("doc-prologue", &["section"]),
    ("doc-pullquote", &["aside", "section"]),
    ("doc-qna", &["section"]),
    ("doc-subtitle", HEADINGS),
    ("doc-tip", &["aside"]),
    ("doc-toc", &["nav", "section"]),
    ("term", &["dfn", "dt"]),
];

/// ARIA role for a semantic type, ignoring host licensing.
pub fn role_for_type(semantic_type: &str) -> Option<&'static str> {
    SEMANTIC_ROLES
        .iter()
        .find(|(ty, _)| *ty == semantic_type)
        .map(|(_, role)| *role)
}

pub fn tag_capability(host_tag: &str) -> Option<TagCapability> {
    TAG_CAPABILITIES
        .iter()
        .find(|(tag, _)| *tag == host_tag)
        .map(|(_, cap)| *cap)
}

fn specifically_allowed(role: &str, host_tag: &str) -> bool {
    ROLE_TAGS
        .iter()
        .find(|(r, _)| *r == role)
        .is_some_and(|(_, tags)| tags.contains(&host_tag))
}

/// Role to add for `semantic_type` on `host_tag`, or `None` when the type is
/// unknown or the host may not carry the role.
pub fn infer_role(
    semantic_type: &str,
    host_tag: &str,
    has_href: bool,
    has_alt: bool,
) -> Option<&'static str> {
    let role = role_for_type(semantic_type)?;

    let general = tag_capability(host_tag).is_some_and(|cap| {
        (cap.href_allowed || !has_href) && (!cap.alt_required || has_alt)
    });
    if general || specifically_allowed(role, host_tag) {
        Some(role)
    } else {
        None
    }
}
