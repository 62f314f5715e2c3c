// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Download file names: `{sanitized}.{operation}.{timestamp}.{ext}`.

use chrono::{DateTime, Utc};

/// Strip the extension, keep ASCII alphanumerics, collapse every other run of
/// characters into a single `-`.
pub fn sanitize_base_name(name: &str) -> String {
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    };

    let mut out = String::with_capacity(stem.len());
    let mut pending_dash = false;
    for ch in stem.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }

    if out.is_empty() {
        "document".to_string()
    } else {
        out
    }
}

/// Build a download name for an operation's output.
pub fn download_name(base: &str, operation: &str, at: DateTime<Utc>, ext: &str) -> String {
    format!(
        "{}.{}.{}.{}",
        sanitize_base_name(base),
        operation,
        at.format("%Y%m%d-%H%M%S"),
        ext.trim_start_matches('.')
    )
}
