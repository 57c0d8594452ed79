// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Terminal alt text review. Each image is shown by its exported path and
// the alt text is edited in place; a final confirmation applies the batch.

use accessaide_core::error::{AccessAideError, Result};
use accessaide_epub::{AltTextReview, ReviewItem, ReviewOutcome};
use dialoguer::{Confirm, Input};

/// Typed at any prompt to abandon the review and keep every alt text.
pub const CANCEL_INPUT: &str = ":q";

#[derive(Debug, Default)]
pub struct TerminalReview;

impl AltTextReview for TerminalReview {
    fn review(&mut self, items: &[ReviewItem]) -> Result<ReviewOutcome> {
        eprintln!(
            "Reviewing {} image(s). Enter keeps the text shown, {CANCEL_INPUT} cancels.",
            items.len()
        );

        let mut updated = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            eprintln!();
            eprintln!("[{}/{}] {}", index + 1, items.len(), heading(item));
            eprintln!("  open: {}", item.path.display());

            let answer: String = Input::new()
                .with_prompt("alt")
                .with_initial_text(item.alt.clone())
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_error)?;

            if answer.trim() == CANCEL_INPUT {
                return Ok(ReviewOutcome::Cancelled);
            }
            let mut item = item.clone();
            item.alt = answer;
            updated.push(item);
        }

        let changes = changed_count(items, &updated);
        if changes == 0 {
            return Ok(ReviewOutcome::Updated(updated));
        }
        let apply = Confirm::new()
            .with_prompt(format!("Apply {changes} alt text change(s)?"))
            .default(true)
            .interact()
            .map_err(prompt_error)?;

        Ok(if apply {
            ReviewOutcome::Updated(updated)
        } else {
            ReviewOutcome::Cancelled
        })
    }
}

fn prompt_error(err: dialoguer::Error) -> AccessAideError {
    AccessAideError::Review(format!("terminal prompt failed: {err}"))
}

fn heading(item: &ReviewItem) -> String {
    format!("{} image {} ({})", item.document, item.ordinal, item.source)
}

fn changed_count(before: &[ReviewItem], after: &[ReviewItem]) -> usize {
    before
        .iter()
        .zip(after)
        .filter(|(b, a)| b.alt != a.alt)
        .count()
}
