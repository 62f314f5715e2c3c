// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page editing — reorder, rotate and delete pages against a list of
// descriptors, then materialise the result as a new PDF.

use std::collections::{HashSet, VecDeque};

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::types::{EditablePage, normalize_rotation};
use tracing::{debug, info, instrument};

use super::copy::{OutputDocument, PageCopier};
use super::loader::LoadedDocument;

/// One identity descriptor per page of `document`.
pub fn build_descriptors(document: &LoadedDocument) -> Vec<EditablePage> {
    (0..document.page_count).map(EditablePage::identity).collect()
}

/// Produce a PDF with the non-deleted `pages` in the order given.
///
/// A kept page whose normalized rotation is 0 keeps whatever `/Rotate` it
/// had; any other value replaces it.
#[instrument(skip_all, fields(document = %document.id, descriptors = pages.len()))]
pub fn apply(document: &LoadedDocument, pages: &[EditablePage]) -> Result<Vec<u8>> {
    let kept: Vec<&EditablePage> = pages.iter().filter(|page| !page.is_deleted).collect();
    if kept.is_empty() {
        return Err(BlattwerkError::Unsupported(
            "every page is deleted; nothing to export".to_string(),
        ));
    }

    info!(kept = kept.len(), "Applying page edits");

    let page_ids = document.page_ids();
    let mut output = OutputDocument::new();
    let mut copier = PageCopier::new(document.document());

    for page in kept {
        let source_id = page_ids.get(page.original_index).ok_or_else(|| {
            BlattwerkError::Unknown(format!(
                "page index {} is outside a {} page document",
                page.original_index,
                page_ids.len()
            ))
        })?;
        let new_id = copier.copy_page(&mut output, *source_id)?;

        let rotation = page.normalized_rotation();
        if rotation != 0 {
            output.set_rotation(new_id, rotation)?;
        }
        debug!(page = page.id, original_index = page.original_index, rotation, "Page placed");
    }

    output.finish()
}

// -- Session -----------------------------------------------------------------

/// Mutable edit state with bounded undo.
///
/// Every mutation that actually changes the page list first pushes a snapshot
/// of the previous list. Once `capacity` snapshots are held the oldest is
/// discarded.
#[derive(Debug, Clone)]
pub struct EditSession {
    pages: Vec<EditablePage>,
    history: VecDeque<Vec<EditablePage>>,
    capacity: usize,
    page_count: usize,
}

impl EditSession {
    pub fn new(document: &LoadedDocument, capacity: usize) -> Self {
        Self::from_pages(build_descriptors(document), capacity)
    }

    pub fn from_pages(pages: Vec<EditablePage>, capacity: usize) -> Self {
        Self {
            page_count: pages.len(),
            pages,
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn pages(&self) -> &[EditablePage] {
        &self.pages
    }

    pub fn page(&self, page_id: usize) -> Option<&EditablePage> {
        self.pages.iter().find(|page| page.id == page_id)
    }

    /// Rotation of `page_id` as it should be previewed, in `[0, 360)`.
    pub fn display_rotation(&self, page_id: usize) -> Option<i32> {
        self.page(page_id).map(EditablePage::normalized_rotation)
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    /// Add `delta` degrees to one page. Returns whether anything changed.
    pub fn rotate(&mut self, page_id: usize, delta: i32) -> bool {
        if delta == 0 || self.page(page_id).is_none() {
            return false;
        }
        self.mutate(|pages| {
            for page in pages.iter_mut().filter(|page| page.id == page_id) {
                page.rotation = page.rotation.wrapping_add(delta);
            }
        })
    }

    /// Add `delta` degrees to every page still in the document.
    pub fn rotate_all(&mut self, delta: i32) -> bool {
        if delta == 0 || self.pages.iter().all(|page| page.is_deleted) {
            return false;
        }
        self.mutate(|pages| {
            for page in pages.iter_mut().filter(|page| !page.is_deleted) {
                page.rotation = page.rotation.wrapping_add(delta);
            }
        })
    }

    pub fn set_deleted(&mut self, page_id: usize, deleted: bool) -> bool {
        match self.page(page_id) {
            Some(page) if page.is_deleted != deleted => self.mutate(|pages| {
                for page in pages.iter_mut().filter(|page| page.id == page_id) {
                    page.is_deleted = deleted;
                }
            }),
            _ => false,
        }
    }

    pub fn toggle_deleted(&mut self, page_id: usize) -> bool {
        match self.page(page_id) {
            Some(page) => {
                let deleted = !page.is_deleted;
                self.set_deleted(page_id, deleted)
            }
            None => false,
        }
    }

    /// Move the page at list position `from` to position `to`.
    pub fn move_page(&mut self, from: usize, to: usize) -> bool {
        let len = self.pages.len();
        if from == to || from >= len || to >= len {
            return false;
        }
        self.mutate(|pages| {
            let page = pages.remove(from);
            pages.insert(to, page);
        })
    }

    /// Rearrange the list to follow `order`, which must name every page id
    /// exactly once.
    pub fn reorder(&mut self, order: &[usize]) -> Result<bool> {
        let known: HashSet<usize> = self.pages.iter().map(|page| page.id).collect();
        let requested: HashSet<usize> = order.iter().copied().collect();
        if order.len() != self.pages.len() || requested != known {
            return Err(BlattwerkError::Unsupported(format!(
                "reorder must list each of the {} pages exactly once",
                self.pages.len()
            )));
        }

        let current: Vec<usize> = self.pages.iter().map(|page| page.id).collect();
        if current == order {
            return Ok(false);
        }

        Ok(self.mutate(|pages| {
            pages.sort_by_key(|page| order.iter().position(|id| *id == page.id));
        }))
    }

    /// Back to one identity descriptor per original page.
    pub fn reset(&mut self) -> bool {
        let fresh: Vec<EditablePage> = (0..self.page_count).map(EditablePage::identity).collect();
        if self.pages == fresh {
            return false;
        }
        self.mutate(|pages| *pages = fresh)
    }

    /// Restore the most recent snapshot.
    pub fn undo(&mut self) -> bool {
        match self.history.pop_back() {
            Some(previous) => {
                self.pages = previous;
                debug!(remaining = self.history.len(), "Edit undone");
                true
            }
            None => false,
        }
    }

    /// Export the current list.
    pub fn apply(&self, document: &LoadedDocument) -> Result<Vec<u8>> {
        apply(document, &self.pages)
    }

    fn mutate(&mut self, change: impl FnOnce(&mut Vec<EditablePage>)) -> bool {
        let mut next = self.pages.clone();
        change(&mut next);
        if next == self.pages {
            return false;
        }

        if self.capacity > 0 {
            if self.history.len() == self.capacity {
                self.history.pop_front();
            }
            self.history.push_back(std::mem::replace(&mut self.pages, next));
        } else {
            self.pages = next;
        }
        true
    }
}

/// Display-only rotation helper for hosts that keep their own lists.
pub fn display_rotation(page: &EditablePage) -> i32 {
    normalize_rotation(page.rotation)
}
