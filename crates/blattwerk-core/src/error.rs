// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Blattwerk.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for all Blattwerk operations.
#[derive(Debug, Error)]
pub enum BlattwerkError {
    // -- Loader errors --
    #[error("the document is password protected")]
    PasswordRequired,

    #[error("the supplied password is incorrect")]
    PasswordIncorrect,

    #[error("document is corrupt: {0}")]
    Corrupt(String),

    #[error("document data is incomplete: {0}")]
    MissingData(String),

    #[error("referenced object not found: {0}")]
    NotFound(String),

    // -- Contract violations, detected before touching the document --
    #[error("unsupported request: {0}")]
    Unsupported(String),

    #[error("unsupported image type: {0}")]
    UnsupportedImageType(String),

    // -- Everything the taxonomy does not name --
    #[error("operation failed: {0}")]
    Unknown(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The closed set of error categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    PasswordRequired,
    PasswordIncorrect,
    Corrupt,
    MissingData,
    NotFound,
    Unsupported,
    UnsupportedImageType,
    Unknown,
}

impl BlattwerkError {
    /// Category of this error within the closed taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PasswordRequired => ErrorKind::PasswordRequired,
            Self::PasswordIncorrect => ErrorKind::PasswordIncorrect,
            Self::Corrupt(_) => ErrorKind::Corrupt,
            Self::MissingData(_) => ErrorKind::MissingData,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unsupported(_) => ErrorKind::Unsupported,
            Self::UnsupportedImageType(_) => ErrorKind::UnsupportedImageType,
            Self::Unknown(_) | Self::Io(_) | Self::Serialization(_) => ErrorKind::Unknown,
        }
    }

    /// Wrap any displayable failure from a copy/serialize step as `Unknown`.
    pub fn unknown(err: impl std::fmt::Display) -> Self {
        Self::Unknown(err.to_string())
    }

    /// True for the two password-related kinds.
    pub fn is_password(&self) -> bool {
        matches!(self, Self::PasswordRequired | Self::PasswordIncorrect)
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BlattwerkError>;
