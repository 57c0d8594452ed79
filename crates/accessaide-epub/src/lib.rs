// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// accessaide-epub: Book hosts and the annotation pipeline for Access Aide.
//
// Provides the `BookHost` abstraction over an EPUB package (an unpacked
// directory or an in-memory book), the OPF package parser, the alt text
// review surface, and the `Pipeline` that sequences every pass and
// persists the result.

pub mod book;
pub mod dir;
pub mod opf;
pub mod pipeline;
pub mod report;
pub mod review;

pub use book::{BookHost, MemoryBook};
pub use dir::DirBook;
pub use opf::Package;
pub use pipeline::Pipeline;
pub use report::{DocumentReport, RunReport};
pub use review::{AltTextReview, JsonExchange, KeepExisting, ReviewItem, ReviewOutcome};
