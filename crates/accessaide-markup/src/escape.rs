// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion between plain text and the entity-encoded form used inside
// attribute values and character data.

use quick_xml::escape::{escape, unescape};
use tracing::debug;

/// Encode the markup's reserved characters.
pub fn encode(text: &str) -> String {
    escape(text).into_owned()
}

/// Decode predefined and numeric character references.
///
/// Text holding a reference quick-xml cannot resolve (a DTD entity such as
/// `&nbsp;`) is returned as written.
pub fn decode(text: &str) -> String {
    match unescape(text) {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => {
            debug!(%err, "text kept encoded");
            text.to_owned()
        }
    }
}
