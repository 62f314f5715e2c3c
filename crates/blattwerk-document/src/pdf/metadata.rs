// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Best-effort metadata extraction. Each field is read on its own; a failure
// is logged and leaves that field empty without failing the load.

use blattwerk_core::types::{DocumentMetadata, PageDimensions, Permissions};
use lopdf::{Dictionary, Document, Object};
use tracing::{debug, warn};

use super::pages;

/// Read title/author/dates, permissions, and first-page dimensions.
pub fn read_metadata(doc: &Document) -> DocumentMetadata {
    let info = info_dictionary(doc);
    let text = |key: &[u8], label: &str| match &info {
        Some(dict) => best_effort(label, info_string(doc, dict, key)),
        None => None,
    };

    let metadata = DocumentMetadata {
        title: text(b"Title", "title"),
        author: text(b"Author", "author"),
        subject: text(b"Subject", "subject"),
        producer: text(b"Producer", "producer"),
        created: text(b"CreationDate", "creation date"),
        modified: text(b"ModDate", "modification date"),
        permissions: best_effort("permissions", read_permissions(doc)),
        first_page: best_effort("first page size", first_page_dimensions(doc)),
    };

    debug!(?metadata, "Metadata read");
    metadata
}

fn best_effort<T>(label: &str, result: Result<Option<T>, String>) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!(field = label, %err, "Could not read document metadata field");
            None
        }
    }
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    let info = doc.trailer.get(b"Info").ok()?;
    pages::resolve(doc, info).as_dict().ok()
}

fn info_string(doc: &Document, dict: &Dictionary, key: &[u8]) -> Result<Option<String>, String> {
    let Ok(value) = dict.get(key) else {
        return Ok(None);
    };
    match pages::resolve(doc, value) {
        Object::String(bytes, _) => Ok(Some(decode_text_string(bytes))),
        Object::Null => Ok(None),
        other => Err(format!("expected a string, found {other:?}")),
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, UTF-8 with BOM, otherwise
/// treated as Latin-1.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    bytes.iter().map(|&b| b as char).collect()
}

fn read_permissions(doc: &Document) -> Result<Option<Permissions>, String> {
    // Decryption removes `/Encrypt` from the trailer; the flags survive on the state.
    if let Some(state) = &doc.encryption_state {
        return Ok(Some(Permissions::from_bits(state.permissions().bits() as i64)));
    }
    let Ok(encrypt) = doc.trailer.get(b"Encrypt") else {
        // Unencrypted documents carry no restrictions.
        return Ok(Some(Permissions::default()));
    };
    let dict = pages::resolve(doc, encrypt)
        .as_dict()
        .map_err(|err| format!("/Encrypt is not a dictionary: {err}"))?;
    let bits = dict
        .get(b"P")
        .and_then(Object::as_i64)
        .map_err(|err| format!("/P flag unreadable: {err}"))?;
    Ok(Some(Permissions::from_bits(bits)))
}

fn first_page_dimensions(doc: &Document) -> Result<Option<PageDimensions>, String> {
    let Some(first) = doc.get_pages().values().next().copied() else {
        return Ok(None);
    };
    pages::media_box(doc, first)
        .map(Some)
        .ok_or_else(|| "first page has no usable /MediaBox".to_string())
}
