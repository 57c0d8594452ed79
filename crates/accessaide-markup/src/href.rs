// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Resolution of in-book hrefs to book-relative paths.
//
// Relative references are resolved with the `url` crate against a synthetic
// base URL so that `..`, `./`, queries and fragments follow RFC 3986 exactly.
// Paths come back percent-decoded, matching the manifest's decoded paths.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use url::Url;

const BOOK_ROOT: &str = "https://book.invalid/";

/// Where an href points inside the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HrefTarget {
    /// Book-relative path, decoded (`OEBPS/Text/ch 1.xhtml`).
    pub path: String,
    /// Decoded fragment identifier, if any.
    pub fragment: Option<String>,
}

/// Resolve `href` as written in the document at book-relative `base_path`.
///
/// Returns `None` for references that leave the book (`http:`, `mailto:`, …)
/// or cannot be parsed.
pub fn resolve_href(base_path: &str, href: &str) -> Option<HrefTarget> {
    let root = Url::parse(BOOK_ROOT).ok()?;
    let base = root.join(&encode_path(base_path)).ok()?;
    let target = base.join(href.trim()).ok()?;

    if target.scheme() != root.scheme() || target.host_str() != root.host_str() {
        return None;
    }

    let path = percent_decode(target.path().trim_start_matches('/'));
    let fragment = target
        .fragment()
        .map(percent_decode)
        .filter(|f| !f.is_empty());
    Some(HrefTarget { path, fragment })
}

/// Characters of a decoded path that would otherwise be read as URL syntax.
const PATH_RESERVED: &AsciiSet = &CONTROLS.add(b' ').add(b'%').add(b'#').add(b'?');

fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_RESERVED).to_string()
}

/// Decode `%XX` escapes; invalid UTF-8 is replaced.
fn percent_decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}
