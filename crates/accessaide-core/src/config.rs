// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run configuration. Resolved once at startup and handed to the pipeline;
// the library crates never read environment or process state themselves.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AccessAideError, Result};

/// How image alt text is reviewed after the structural pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewMode {
    /// Ask for every image on the terminal.
    Prompt,
    /// Leave alt text as discovered.
    Skip,
}

/// Persistent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// External SVG → PNG converter, invoked as `<program> <file.svg>` and
    /// expected to write `<file.svg>.png`. `None` always uses the placeholder.
    pub converter: Option<PathBuf>,
    /// Extra arguments passed to the converter before the SVG path.
    pub converter_args: Vec<String>,
    /// Apply fragment-less landmarks to the `body` tag of their document.
    pub apply_document_landmarks: bool,
    /// Review front end used by the CLI.
    pub review: ReviewMode,
    /// Edge length in pixels of the generated placeholder image.
    pub placeholder_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            converter: None,
            converter_args: Vec::new(),
            apply_document_landmarks: false,
            review: ReviewMode::Prompt,
            placeholder_size: 128,
        }
    }
}

impl AppConfig {
    /// Load a JSON config file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|err| {
            AccessAideError::Config(format!("{}: {}", path.display(), err))
        })
    }
}
