// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Placeholder image shown in place of a picture that could not be rendered.

use accessaide_core::error::{AccessAideError, Result};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tracing::{debug, instrument};

const MIN_SIZE: u32 = 16;
const BACKGROUND: Rgba<u8> = Rgba([236, 236, 236, 255]);
const INK: Rgba<u8> = Rgba([96, 96, 96, 255]);

/// A square "missing picture" PNG: light frame with crossed diagonals.
#[instrument]
pub fn placeholder_png(size: u32) -> Result<Vec<u8>> {
    let size = size.max(MIN_SIZE);
    let border = (size / 32).max(1);
    let last = size - 1;

    let canvas = RgbaImage::from_fn(size, size, |x, y| {
        let on_border = x < border || y < border || x > last - border || y > last - border;
        let on_diagonal = x.abs_diff(y) < border || (x + y).abs_diff(last) < border;
        if on_border || on_diagonal {
            INK
        } else {
            BACKGROUND
        }
    });

    let bytes = encode_png(&DynamicImage::ImageRgba8(canvas))?;
    debug!(size, bytes = bytes.len(), "placeholder generated");
    Ok(bytes)
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|err| AccessAideError::ImageError(format!("PNG encoding failed: {err}")))?;
    Ok(buffer)
}
