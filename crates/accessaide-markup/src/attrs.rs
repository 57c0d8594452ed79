// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Space-delimited multi-valued attributes (`epub:type`, `role`).

use crate::tokenizer::Attributes;

/// Order-preserving, append-only, deduplicating set of attribute tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueSet {
    values: Vec<String>,
}

impl ValueSet {
    /// Split an attribute value on whitespace, dropping repeats.
    pub fn parse(value: &str) -> Self {
        let mut set = Self::default();
        for token in value.split_whitespace() {
            set.insert(token);
        }
        set
    }

    /// Append `value` unless already present. Returns `true` when added.
    pub fn insert(&mut self, value: &str) -> bool {
        if value.is_empty() || self.contains(value) {
            return false;
        }
        self.values.push(value.to_owned());
        true
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Display for ValueSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.values.join(" "))
    }
}

/// Merge every token of `values` into attribute `name`.
///
/// The attribute is only rewritten when at least one token is new, so an
/// existing value keeps its original spacing. Returns the number of tokens
/// added.
pub fn merge_tokens<'v>(
    attrs: &mut Attributes,
    name: &str,
    values: impl IntoIterator<Item = &'v str>,
) -> usize {
    let mut set = ValueSet::parse(attrs.get(name).unwrap_or(""));
    let added = values
        .into_iter()
        .flat_map(str::split_whitespace)
        .filter(|token| set.insert(token))
        .count();
    if added > 0 {
        attrs.set(name, set.to_string());
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dedups_and_keeps_order() {
        let set = ValueSet::parse("  chapter  bodymatter chapter ");
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["chapter", "bodymatter"]);
        assert_eq!(set.to_string(), "chapter bodymatter");
    }

    #[test]
    fn merge_appends_missing() {
        let mut attrs: Attributes = [("epub:type", "bodymatter")].into_iter().collect();
        assert_eq!(merge_tokens(&mut attrs, "epub:type", ["chapter"]), 1);
        assert_eq!(attrs.get("epub:type"), Some("bodymatter chapter"));
    }

    #[test]
    fn merge_creates_absent_attribute() {
        let mut attrs = Attributes::new();
        assert_eq!(merge_tokens(&mut attrs, "role", ["doc-chapter"]), 1);
        assert_eq!(attrs.get("role"), Some("doc-chapter"));
    }

    #[test]
    fn merge_present_value_leaves_spacing() {
        let mut attrs: Attributes = [("role", "doc-chapter   region")].into_iter().collect();
        assert_eq!(merge_tokens(&mut attrs, "role", ["region", "doc-chapter"]), 0);
        assert_eq!(attrs.get("role"), Some("doc-chapter   region"));
        assert!(!attrs.is_modified());
    }

    #[test]
    fn merge_splits_multi_token_values() {
        let mut attrs = Attributes::new();
        assert_eq!(merge_tokens(&mut attrs, "epub:type", ["chapter frontmatter", "chapter"]), 2);
        assert_eq!(attrs.get("epub:type"), Some("chapter frontmatter"));
    }
}
