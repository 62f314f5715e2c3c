// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Split — pull selected pages into a new document, or cut a document into
// fixed-size chunks.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use blattwerk_core::error::{BlattwerkError, Result};
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::copy::{OutputDocument, PageCopier};
use super::loader::LoadedDocument;

/// One window produced by [`chunk`]. Page numbers are one-based and inclusive.
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    pub index: usize,
    pub start_page: usize,
    pub end_page: usize,
    /// Time spent writing this chunk alone.
    #[serde(skip)]
    pub elapsed: Duration,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Result of [`extract`]: the normalized selection that was copied, and the
/// new PDF.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub pages: Vec<usize>,
    pub bytes: Vec<u8>,
}

// -- Selection ---------------------------------------------------------------

/// Turn caller-supplied page numbers into a sorted, de-duplicated list of
/// valid one-based pages. Fractions truncate; out-of-range and non-finite
/// values are dropped.
pub fn normalize_selection(page_numbers: &[f64], page_count: usize) -> Vec<usize> {
    let pages: BTreeSet<usize> = page_numbers
        .iter()
        .filter(|n| n.is_finite())
        .map(|n| n.trunc())
        .filter(|n| *n >= 1.0 && *n <= page_count as f64)
        .map(|n| n as usize)
        .collect();
    pages.into_iter().collect()
}

/// Parse selection text such as `"1-3, 5, 8-10"` into sorted unique page
/// numbers. Empty segments are ignored.
pub fn parse_page_selection(input: &str) -> Result<Vec<usize>> {
    let mut pages = BTreeSet::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let start = parse_page_number(start)?;
            let end = parse_page_number(end)?;
            if start > end {
                return Err(BlattwerkError::Unsupported(format!(
                    "page range {start}-{end} runs backwards"
                )));
            }
            pages.extend(start..=end);
        } else {
            pages.insert(parse_page_number(part)?);
        }
    }

    Ok(pages.into_iter().collect())
}

fn parse_page_number(text: &str) -> Result<usize> {
    let text = text.trim();
    match text.parse::<usize>() {
        Ok(0) => Err(BlattwerkError::Unsupported(
            "page numbers start at 1".to_string(),
        )),
        Ok(page) => Ok(page),
        Err(_) => Err(BlattwerkError::Unsupported(format!(
            "'{text}' is not a page number"
        ))),
    }
}

// -- Extract -----------------------------------------------------------------

/// Copy the selected pages (see [`normalize_selection`]) into a new PDF in
/// ascending page order.
#[instrument(skip(document, page_numbers), fields(document = %document.id, requested = page_numbers.len()))]
pub fn extract(document: &LoadedDocument, page_numbers: &[f64]) -> Result<Extraction> {
    let selection = normalize_selection(page_numbers, document.page_count);
    if selection.is_empty() {
        return Err(BlattwerkError::Unsupported(format!(
            "no valid pages selected from a {} page document",
            document.page_count
        )));
    }

    info!(pages = ?selection, "Extracting pages");
    let bytes = copy_pages(document, selection.iter().copied())?;
    debug!(output_bytes = bytes.len(), "Extraction complete");
    Ok(Extraction {
        pages: selection,
        bytes,
    })
}

// -- Chunk -------------------------------------------------------------------

/// Cut the document into consecutive windows of `size` pages; the last window
/// holds whatever remains.
#[instrument(skip(document), fields(document = %document.id, page_count = document.page_count))]
pub fn chunk(document: &LoadedDocument, size: i64) -> Result<Vec<Chunk>> {
    if size < 1 {
        return Err(BlattwerkError::Unsupported(format!(
            "chunk size must be at least 1, got {size}"
        )));
    }
    let size = usize::try_from(size).unwrap_or(usize::MAX);
    let total = document.page_count;

    let mut chunks = Vec::with_capacity(total.div_ceil(size));
    let mut start = 0;
    while start < total {
        let end = total.min(start.saturating_add(size));
        let started = Instant::now();
        let bytes = copy_pages(document, start + 1..=end)?;
        debug!(index = chunks.len(), start_page = start + 1, end_page = end, "Chunk written");
        chunks.push(Chunk {
            index: chunks.len(),
            start_page: start + 1,
            end_page: end,
            elapsed: started.elapsed(),
            bytes,
        });
        start = end;
    }

    info!(chunks = chunks.len(), "Chunking complete");
    Ok(chunks)
}

/// Copy one-based `pages` of `document` into a fresh PDF.
fn copy_pages(document: &LoadedDocument, pages: impl IntoIterator<Item = usize>) -> Result<Vec<u8>> {
    let page_ids = document.page_ids();
    let mut output = OutputDocument::new();
    let mut copier = PageCopier::new(document.document());
    for page in pages {
        let page_id = page
            .checked_sub(1)
            .and_then(|index| page_ids.get(index))
            .ok_or_else(|| BlattwerkError::Unknown(format!("page {page} vanished from the document")))?;
        copier.copy_page(&mut output, *page_id)?;
    }
    output.finish()
}
