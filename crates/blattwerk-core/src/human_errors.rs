// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every error kind maps to exactly one fixed message, shown verbatim by the UI.
// A suggestion and severity ride along to drive presentation.

use crate::error::{BlattwerkError, ErrorKind};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user must do something (enter a password, pick other pages).
    ActionRequired,
    /// Retrying with the same file will not help.
    Permanent,
    /// Might work on a second attempt.
    Transient,
}

/// A human-readable error with a plain English message and a suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Fixed message for the error kind (shown as a heading).
    pub message: &'static str,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether the same action may succeed if repeated.
    pub retriable: bool,
    /// Drives icon/colour in the UI.
    pub severity: Severity,
}

/// The fixed friendly message for an error kind.
pub fn friendly_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::PasswordRequired => "This PDF is password protected.",
        ErrorKind::PasswordIncorrect => "That password didn't work.",
        ErrorKind::Corrupt => "This file looks damaged or isn't a valid PDF.",
        ErrorKind::MissingData => "This file seems to be incomplete.",
        ErrorKind::NotFound => "Part of this document could not be found.",
        ErrorKind::Unsupported => "That request isn't possible with this document.",
        ErrorKind::UnsupportedImageType => "This image format isn't supported.",
        ErrorKind::Unknown => "We could not process this file.",
    }
}

/// Convert a `BlattwerkError` into a `HumanError` for display.
pub fn humanize_error(err: &BlattwerkError) -> HumanError {
    let kind = err.kind();
    let message = friendly_message(kind);

    match err {
        BlattwerkError::PasswordRequired => HumanError {
            message,
            suggestion: "Enter the document password to continue.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        BlattwerkError::PasswordIncorrect => HumanError {
            message,
            suggestion: "Check the password (it is case sensitive) and try again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        BlattwerkError::Corrupt(_) | BlattwerkError::MissingData(_) => HumanError {
            message,
            suggestion: "Try opening the file in another viewer, or download it again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        BlattwerkError::NotFound(_) => HumanError {
            message,
            suggestion: "The document references content it doesn't contain. Try re-saving it from its original application.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // The detail of a contract violation is already user-facing.
        BlattwerkError::Unsupported(detail) => HumanError {
            message,
            suggestion: detail.clone(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        BlattwerkError::UnsupportedImageType(detail) => HumanError {
            message,
            suggestion: format!("Convert the image to PNG or JPEG first. (Type: {detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        BlattwerkError::Unknown(_) | BlattwerkError::Io(_) | BlattwerkError::Serialization(_) => {
            HumanError {
                message,
                suggestion: "Try again. If this keeps happening, try a different file.".into(),
                retriable: true,
                severity: Severity::Transient,
            }
        }
    }
}
