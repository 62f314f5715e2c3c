// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compression module — raster re-encoding of whole documents.

pub mod engine;
pub mod renderer;

pub use engine::{CompressionOutcome, Compressor, raster_scale};
pub use renderer::{PageRef, PageRenderer};
