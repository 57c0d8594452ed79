// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ordinal-addressed alt text merge.
//
// Images are located by position only: the n-th image tag of a document,
// counted with the same rule the rewrite used when it discovered them.

use accessaide_core::error::Result;
use tracing::{debug, instrument, warn};

use crate::rewrite::is_image_tag;
use crate::tokenizer::{Event, Tokenizer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub content: String,
    /// The target ordinal existed in the document.
    pub found: bool,
}

/// Replace the `alt` of image number `ordinal` (1-based) with `encoded_alt`,
/// which must already be entity-encoded.
#[instrument(skip(content, encoded_alt), fields(len = content.len()))]
pub fn merge_alt_text(content: &str, ordinal: usize, encoded_alt: &str) -> Result<MergeOutcome> {
    let mut out = String::with_capacity(content.len() + encoded_alt.len());
    let mut count = 0usize;
    let mut found = false;

    for event in Tokenizer::new(content) {
        match event? {
            Event::Tag(mut tag) if is_image_tag(&tag) => {
                count += 1;
                if count == ordinal {
                    found = true;
                    tag.attrs.set("alt", encoded_alt);
                }
                tag.write_markup(&mut out);
            }
            other => other.write_markup(&mut out),
        }
    }

    if !found {
        debug!(ordinal, images = count, "ordinal not present");
    }
    Ok(MergeOutcome {
        content: out,
        found,
    })
}

/// Apply several `(ordinal, encoded_alt)` updates to one document in
/// ascending ordinal order. Returns the new content and the ordinals that did
/// not exist.
pub fn apply_alt_updates(
    content: &str,
    updates: &[(usize, String)],
) -> Result<(String, Vec<usize>)> {
    let mut ordered: Vec<&(usize, String)> = updates.iter().collect();
    ordered.sort_by_key(|(ordinal, _)| *ordinal);

    let mut current = content.to_owned();
    let mut missing = Vec::new();
    for (ordinal, alt) in ordered {
        let outcome = merge_alt_text(&current, *ordinal, alt)?;
        if !outcome.found {
            warn!(ordinal, "image ordinal out of range, alt text not merged");
            missing.push(*ordinal);
        }
        current = outcome.content;
    }
    Ok((current, missing))
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE: &str = "<body><img src=\"a.png\" alt=\"\"/>\
        <p><img src=\"b.png\" alt=\"\"/></p><img src=\"c.png\" alt=\"c\"/></body>";

    #[test]
    fn only_target_ordinal_changes() {
        let outcome = merge_alt_text(THREE, 2, "a tree").unwrap();
        assert!(outcome.found);
        assert_eq!(
            outcome.content,
            "<body><img src=\"a.png\" alt=\"\"/>\
             <p><img src=\"b.png\" alt=\"a tree\"/></p><img src=\"c.png\" alt=\"c\"/></body>"
        );
    }

    #[test]
    fn ordinal_beyond_count_leaves_document() {
        let outcome = merge_alt_text(THREE, 4, "nope").unwrap();
        assert!(!outcome.found);
        assert_eq!(outcome.content, THREE);
    }

    #[test]
    fn encoded_text_is_written_as_is() {
        let outcome = merge_alt_text(THREE, 1, "Tom &amp; &quot;Jerry&quot;").unwrap();
        assert!(outcome.content.contains("alt=\"Tom &amp; &quot;Jerry&quot;\""));
    }

    #[test]
    fn updates_apply_in_order() {
        let updates = vec![(3, "third".to_owned()), (1, "first".to_owned()), (9, "x".to_owned())];
        let (content, missing) = apply_alt_updates(THREE, &updates).unwrap();
        assert!(content.contains("<img src=\"a.png\" alt=\"first\"/>"));
        assert!(content.contains("<img src=\"b.png\" alt=\"\"/>"));
        assert!(content.contains("<img src=\"c.png\" alt=\"third\"/>"));
        assert_eq!(missing, vec![9]);
    }
}
