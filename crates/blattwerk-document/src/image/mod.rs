// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — PNG integrity checks, upload repair, placement geometry and
// the decode/encode helpers shared with the compression engine.

pub mod ingest;
pub mod layout;
pub mod png;
pub mod processor;

pub use ingest::ingest_image;
pub use layout::{PageBox, Placement, place};
pub use png::{has_png_signature, is_complete_png};
pub use processor::ImageProcessor;
