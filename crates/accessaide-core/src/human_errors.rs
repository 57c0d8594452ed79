// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for book producers.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how the CLI presents the failure.

use crate::error::AccessAideError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The book contains something this tool refuses to annotate.
    Precondition,
    /// The user must fix the book or the configuration and run again.
    ActionRequired,
    /// Something went wrong inside the tool or the filesystem.
    Internal,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Severity level.
    pub severity: Severity,
}

/// Convert an `AccessAideError` into a `HumanError`.
pub fn humanize_error(err: &AccessAideError) -> HumanError {
    match err {
        // -- Preconditions --
        AccessAideError::AudioVideoPresent(items) => HumanError {
            message: "This book contains audio or video.".into(),
            suggestion: format!(
                "Media overlays and embedded media need hand-written accessibility metadata. \
                 Remove or describe them manually. ({})",
                items.join(", ")
            ),
            severity: Severity::Precondition,
        },

        AccessAideError::MissingLanguage => HumanError {
            message: "The book does not declare a language.".into(),
            suggestion: "Add a <dc:language> element (for example <dc:language>en</dc:language>) \
                         to the package metadata, then run again."
                .into(),
            severity: Severity::ActionRequired,
        },

        AccessAideError::MissingNavigation => HumanError {
            message: "The EPUB 3 navigation document is missing.".into(),
            suggestion: "Mark the navigation document in the manifest with properties=\"nav\"."
                .into(),
            severity: Severity::ActionRequired,
        },

        AccessAideError::MathMlPresent(item) => HumanError {
            message: "This book contains MathML.".into(),
            suggestion: format!(
                "The standard accessibility block does not describe MathML. \
                 Annotate this book by hand. (Item: {item})"
            ),
            severity: Severity::Precondition,
        },

        AccessAideError::ScriptedContent(item) => HumanError {
            message: "This book contains scripted content.".into(),
            suggestion: format!(
                "Scripts can change the document structure, so roles cannot be inferred safely. \
                 (Item: {item})"
            ),
            severity: Severity::Precondition,
        },

        // -- Markup --
        AccessAideError::Markup { offset, detail } => HumanError {
            message: "A document could not be read.".into(),
            suggestion: format!(
                "Fix the markup near byte {offset} ({detail}) and run again. \
                 An XHTML validator will point at the exact spot."
            ),
            severity: Severity::ActionRequired,
        },

        AccessAideError::InDocument { document, source } => {
            let inner = humanize_error(source);
            HumanError {
                message: format!("{} ({document})", inner.message),
                ..inner
            }
        }

        // -- Package --
        AccessAideError::Package(detail) => HumanError {
            message: "The package document could not be understood.".into(),
            suggestion: format!(
                "Check META-INF/container.xml and the OPF file. ({detail})"
            ),
            severity: Severity::ActionRequired,
        },

        AccessAideError::MissingResource(what) => HumanError {
            message: "A file listed in the manifest is missing.".into(),
            suggestion: format!("Restore the file or remove it from the manifest. ({what})"),
            severity: Severity::ActionRequired,
        },

        // -- Review --
        AccessAideError::ReviewMismatch { .. } | AccessAideError::Review(_) => HumanError {
            message: "The alt text review did not complete.".into(),
            suggestion: "The book was left unchanged. Run again to review the images.".into(),
            severity: Severity::Internal,
        },

        AccessAideError::ImageError(_) => HumanError {
            message: "An image could not be prepared for review.".into(),
            suggestion: "The image may be damaged. Try re-exporting it from its source.".into(),
            severity: Severity::Internal,
        },

        // -- Configuration / persistence --
        AccessAideError::Config(detail) => HumanError {
            message: "The configuration file is not valid.".into(),
            suggestion: format!("Fix or delete the file. ({detail})"),
            severity: Severity::ActionRequired,
        },

        AccessAideError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "A file couldn't be found.".into(),
                    suggestion: "Check that the path points at an unpacked EPUB directory.".into(),
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Access Aide doesn't have permission to change the book.".into(),
                    suggestion: "Check the file permissions of the book directory.".into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    severity: Severity::Internal,
                }
            }
        }

        AccessAideError::Serialization(_) => HumanError {
            message: "Access Aide had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            severity: Severity::Internal,
        },
    }
}
