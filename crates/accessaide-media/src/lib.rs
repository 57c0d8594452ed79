// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// accessaide-media: Image materialisation for Access Aide.
//
// Copies the book's images into a scoped temporary directory so a reviewer
// can look at them, rasterising SVG through an external converter and
// substituting a generated placeholder when conversion is not possible.

pub mod convert;
pub mod export;
pub mod placeholder;

pub use convert::RasterConverter;
pub use export::{ExportKind, ExportedImage, ImageExport};
pub use placeholder::placeholder_png;
