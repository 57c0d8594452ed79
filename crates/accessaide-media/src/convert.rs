// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SVG rasterisation through an external program.
//
// The converter is invoked as `<program> <file.svg>` and must leave a PNG at
// `<file.svg>.png`. Its output is decoded before it is accepted.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use accessaide_core::error::{AccessAideError, Result};
use image::ImageFormat;
use tracing::{debug, instrument};

/// An external SVG → PNG converter, configured explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterConverter {
    program: PathBuf,
    /// Arguments placed before the SVG path.
    args: Vec<OsString>,
}

impl RasterConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Rasterise `svg`, returning the path of the produced PNG.
    #[instrument(skip(self), fields(program = %self.program.display(), svg = %svg.display()))]
    pub fn convert(&self, svg: &Path) -> Result<PathBuf> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(svg)
            .output()
            .map_err(|err| {
                AccessAideError::ImageError(format!(
                    "failed to run converter {}: {err}",
                    self.program.display()
                ))
            })?;

        if !output.status.success() {
            return Err(AccessAideError::ImageError(format!(
                "converter {} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let png = png_path_for(svg);
        let bytes = std::fs::read(&png).map_err(|err| {
            AccessAideError::ImageError(format!(
                "converter produced no output at {}: {err}",
                png.display()
            ))
        })?;
        image::load_from_memory_with_format(&bytes, ImageFormat::Png).map_err(|err| {
            AccessAideError::ImageError(format!(
                "converter output {} is not a PNG: {err}",
                png.display()
            ))
        })?;

        debug!(png = %png.display(), "svg rasterised");
        Ok(png)
    }
}

/// `images/x.svg` → `images/x.svg.png`.
pub fn png_path_for(svg: &Path) -> PathBuf {
    let mut name = OsString::from(svg.as_os_str());
    name.push(".png");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_path_appends_extension() {
        assert_eq!(
            png_path_for(Path::new("/tmp/x/Images/fig.svg")),
            PathBuf::from("/tmp/x/Images/fig.svg.png")
        );
    }

    #[test]
    fn missing_program_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let svg = dir.path().join("a.svg");
        std::fs::write(&svg, "<svg xmlns=\"http://www.w3.org/2000/svg\"/>").unwrap();
        let converter = RasterConverter::new(dir.path().join("no-such-converter"));
        let err = converter.convert(&svg).unwrap_err();
        assert!(matches!(err, AccessAideError::ImageError(_)));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;

        use crate::placeholder::placeholder_png;

        /// A converter running `body` through `sh`; `$1` is the SVG path.
        fn script(dir: &Path, name: &str, body: &str) -> RasterConverter {
            let path = dir.join(name);
            std::fs::write(&path, format!("{body}\n")).unwrap();
            RasterConverter::new("sh").with_args([path])
        }

        #[test]
        fn successful_conversion() {
            let dir = tempfile::tempdir().unwrap();
            let fixture = dir.path().join("fixture.png");
            std::fs::write(&fixture, placeholder_png(16).unwrap()).unwrap();
            let converter = script(
                dir.path(),
                "conv.sh",
                &format!("cp '{}' \"$1.png\"", fixture.display()),
            );

            let svg = dir.path().join("b.svg");
            std::fs::write(&svg, "<svg/>").unwrap();
            let png = converter.convert(&svg).unwrap();
            assert_eq!(png, dir.path().join("b.svg.png"));
        }

        #[test]
        fn non_zero_exit_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            let converter = script(dir.path(), "fail.sh", "echo broken >&2\nexit 3");
            let svg = dir.path().join("c.svg");
            std::fs::write(&svg, "<svg/>").unwrap();
            let err = converter.convert(&svg).unwrap_err();
            assert!(err.to_string().contains("broken"));
        }

        #[test]
        fn garbage_output_is_rejected() {
            let dir = tempfile::tempdir().unwrap();
            let converter = script(dir.path(), "junk.sh", "echo nope > \"$1.png\"");
            let svg = dir.path().join("d.svg");
            std::fs::write(&svg, "<svg/>").unwrap();
            assert!(converter.convert(&svg).is_err());
        }
    }
}
