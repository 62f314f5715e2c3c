// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Toolkit configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::ImageLayout;

/// Host-supplied toolkit settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    /// Largest accepted input buffer, in bytes.
    pub max_file_bytes: u64,
    /// Largest accepted page count per document.
    pub max_pages: usize,
    /// Number of undo snapshots kept by an edit session.
    pub undo_capacity: usize,
    /// Preset used when the caller does not pick one.
    pub default_preset: String,
    /// Default layout for image-to-PDF assembly.
    pub image_layout: ImageLayout,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 200 * 1024 * 1024,
            max_pages: 2000,
            undo_capacity: 20,
            default_preset: "balanced".to_string(),
            image_layout: ImageLayout::default(),
        }
    }
}

impl ToolkitConfig {
    /// Parse a (possibly partial) JSON configuration; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FitMode;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ToolkitConfig::from_json(r#"{"undo_capacity": 5}"#).unwrap();
        assert_eq!(config.undo_capacity, 5);
        assert_eq!(config.max_pages, 2000);
        assert_eq!(config.default_preset, "balanced");
        assert_eq!(config.image_layout.fit, FitMode::Fit);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(ToolkitConfig::from_json("{undo").is_err());
    }
}
