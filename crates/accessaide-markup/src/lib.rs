// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// accessaide-markup: Streaming markup passes for Access Aide.
//
// Provides a lossless event tokenizer for XHTML, OPF and NCX documents and the
// passes built on it: navigation map building, package metadata annotation,
// the per-document accessibility rewrite, and ordinal-addressed alt text merge.
// Every pass is a small state machine over the flat event stream; nothing
// builds a tree.

pub mod alt_merge;
pub mod attrs;
pub mod escape;
pub mod href;
pub mod metadata;
pub mod nav;
pub mod rewrite;
pub mod roles;
pub mod tokenizer;

pub use alt_merge::{apply_alt_updates, merge_alt_text};
pub use attrs::ValueSet;
pub use href::{HrefTarget, resolve_href};
pub use metadata::{MetadataOutcome, annotate_metadata};
pub use nav::{NavOptions, NavigationMaps, parse_nav, parse_ncx};
pub use rewrite::{DocumentContext, RewriteOptions, RewriteOutcome, RewriteStats, rewrite_document};
pub use roles::infer_role;
pub use tokenizer::{Attributes, Event, Special, SpecialKind, Tag, TagKind, Text, Tokenizer};
