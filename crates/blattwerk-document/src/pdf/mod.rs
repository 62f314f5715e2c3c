// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — loading, page copying, merge, split, page edits and
// image-to-PDF assembly.

pub mod copy;
pub mod edit;
pub mod loader;
pub mod merge;
pub mod metadata;
pub mod pages;
pub mod split;
pub mod writer;

pub use edit::EditSession;
pub use loader::{DocumentLoader, LoadedDocument, PasswordPrompt, PasswordReason};
pub use merge::merge;
pub use split::{Chunk, chunk, extract, parse_page_selection};
pub use writer::images_to_pdf;
