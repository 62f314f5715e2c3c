// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Source ingestion — turn a raw byte buffer into an immutable `Source`.

use std::sync::Arc;

use blattwerk_core::config::ToolkitConfig;
use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::types::{Source, SourceId, SourceOrigin};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

/// Compute the SHA-256 hash of `data` as a lowercase hex string.
pub fn fingerprint(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Ingest an uploaded buffer, enforcing the configured size guardrail.
#[instrument(skip(bytes, config), fields(bytes_len = bytes.len()))]
pub fn ingest(
    name: &str,
    bytes: Vec<u8>,
    last_modified: Option<DateTime<Utc>>,
    config: &ToolkitConfig,
) -> Result<Source> {
    build_source(name, bytes, last_modified, SourceOrigin::Upload, config)
}

/// Wrap the output of a previous operation so it can be loaded again.
pub fn ingest_generated(name: &str, bytes: Vec<u8>, config: &ToolkitConfig) -> Result<Source> {
    build_source(name, bytes, Some(Utc::now()), SourceOrigin::Generated, config)
}

fn build_source(
    name: &str,
    bytes: Vec<u8>,
    last_modified: Option<DateTime<Utc>>,
    origin: SourceOrigin,
    config: &ToolkitConfig,
) -> Result<Source> {
    if bytes.is_empty() {
        return Err(BlattwerkError::Unsupported(format!("'{name}' is empty")));
    }
    let size = bytes.len() as u64;
    if size > config.max_file_bytes {
        return Err(BlattwerkError::Unsupported(format!(
            "'{name}' is {size} bytes; the limit is {} bytes",
            config.max_file_bytes
        )));
    }

    let fingerprint = fingerprint(&bytes);
    debug!(size, %fingerprint, "Source ingested");

    Ok(Source {
        id: SourceId::new(),
        origin,
        name: name.to_string(),
        size,
        last_modified,
        fingerprint,
        bytes: Arc::from(bytes),
        password: None,
    })
}
