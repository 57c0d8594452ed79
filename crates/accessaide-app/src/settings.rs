// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Configuration resolution: explicit `--config` file, then the per-user
// config file, then defaults. Command-line flags are applied on top.

use std::path::{Path, PathBuf};

use accessaide_core::config::{AppConfig, ReviewMode};
use anyhow::Context;
use tracing::debug;

/// Settings given on the command line that override the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub converter: Option<PathBuf>,
    pub review: Option<ReviewMode>,
    pub document_landmarks: bool,
}

/// `<config dir>/accessaide/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("accessaide").join("config.json"))
}

pub fn resolve(explicit: Option<&Path>, overrides: Overrides) -> anyhow::Result<AppConfig> {
    let mut config = load(explicit, default_config_path().as_deref())?;

    if let Some(converter) = overrides.converter {
        config.converter = Some(converter);
    }
    if let Some(review) = overrides.review {
        config.review = review;
    }
    config.apply_document_landmarks |= overrides.document_landmarks;
    Ok(config)
}

fn load(explicit: Option<&Path>, user_default: Option<&Path>) -> anyhow::Result<AppConfig> {
    if let Some(path) = explicit {
        return AppConfig::load(path)
            .with_context(|| format!("loading config file {}", path.display()));
    }
    match user_default {
        Some(path) if path.exists() => {
            debug!(path = %path.display(), "using user config");
            AppConfig::load(path).with_context(|| format!("loading config file {}", path.display()))
        }
        _ => Ok(AppConfig::default()),
    }
}
