// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compression presets — a fixed, ordered table from least to most aggressive.

use serde::Serialize;

use crate::error::{BlattwerkError, Result};

/// Estimates never go below this many bytes.
pub const MIN_ESTIMATE_BYTES: u64 = 512;

/// Returned when the original size is not a usable input.
pub const INVALID_SIZE_FLOOR_BYTES: u64 = 1024;

/// A named compression configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompressionPreset {
    pub id: &'static str,
    pub label: &'static str,
    /// Expected output/input size ratio, used only for pre-run estimates.
    pub target_ratio: f64,
    /// Longest raster edge in pixels.
    pub max_dimension: u32,
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
}

/// `high` > `balanced` > `smallest`.
pub const PRESETS: [CompressionPreset; 3] = [
    CompressionPreset {
        id: "high",
        label: "High quality",
        target_ratio: 0.85,
        max_dimension: 2400,
        jpeg_quality: 85,
    },
    CompressionPreset {
        id: "balanced",
        label: "Balanced",
        target_ratio: 0.70,
        max_dimension: 1800,
        jpeg_quality: 72,
    },
    CompressionPreset {
        id: "smallest",
        label: "Smallest file",
        target_ratio: 0.50,
        max_dimension: 1200,
        jpeg_quality: 55,
    },
];

impl CompressionPreset {
    /// Look up a preset by id.
    pub fn by_id(id: &str) -> Result<&'static CompressionPreset> {
        PRESETS
            .iter()
            .find(|preset| preset.id == id)
            .ok_or_else(|| BlattwerkError::Unsupported(format!("unknown compression preset '{id}'")))
    }

    pub fn all() -> &'static [CompressionPreset] {
        &PRESETS
    }
}

/// Projected output size shown before compression runs.
///
/// This is a static-ratio heuristic for display; it is never reconciled with
/// the measured result.
pub fn estimate_compressed_size(original_size: u64, preset_id: &str) -> Result<u64> {
    let preset = CompressionPreset::by_id(preset_id)?;
    if original_size == 0 {
        return Ok(INVALID_SIZE_FLOOR_BYTES);
    }
    let projected = (original_size as f64 * preset.target_ratio).round() as u64;
    Ok(projected.max(MIN_ESTIMATE_BYTES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_estimate() {
        assert_eq!(estimate_compressed_size(1_000_000, "balanced").unwrap(), 700_000);
    }

    #[test]
    fn zero_size_uses_floor() {
        assert_eq!(estimate_compressed_size(0, "balanced").unwrap(), 1024);
    }

    #[test]
    fn tiny_inputs_never_go_below_minimum() {
        assert_eq!(estimate_compressed_size(10, "smallest").unwrap(), 512);
    }

    #[test]
    fn unknown_preset_is_unsupported() {
        let err = estimate_compressed_size(100, "lossless").unwrap_err();
        assert!(matches!(err, BlattwerkError::Unsupported(_)));
    }

    #[test]
    fn table_is_ordered_by_aggressiveness() {
        let ratios: Vec<f64> = PRESETS.iter().map(|p| p.target_ratio).collect();
        assert!(ratios.windows(2).all(|w| w[0] > w[1]));
        let dims: Vec<u32> = PRESETS.iter().map(|p| p.max_dimension).collect();
        assert!(dims.windows(2).all(|w| w[0] > w[1]));
    }
}
