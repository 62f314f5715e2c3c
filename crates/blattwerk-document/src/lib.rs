// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// blattwerk-document — Document processing for Blattwerk.
//
// Loads PDFs (with password retry), merges, splits and edits them page by
// page, assembles images into new documents, and rebuilds documents from
// re-encoded page rasters to shrink them.

pub mod compress;
pub mod image;
pub mod pdf;
pub mod source;
pub mod toolkit;

#[cfg(test)]
mod fixtures;

// Re-export the main entry points so callers can use `blattwerk_document::Toolkit` etc.
pub use compress::{CompressionOutcome, Compressor, PageRenderer};
pub use crate::image::ImageProcessor;
pub use pdf::{DocumentLoader, EditSession, LoadedDocument, PasswordPrompt, PasswordReason};
pub use toolkit::{ActivitySink, Toolkit};
