// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rasterization port. Blattwerk does not paint PDF content itself; the host
// plugs in whatever renderer it has (a browser canvas, pdfium, ...).

use blattwerk_core::error::Result;
use blattwerk_core::types::PageDimensions;
use image::DynamicImage;
use lopdf::{Document, ObjectId};

use crate::pdf::pages;

/// Identifies a page to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRef {
    /// Zero-based position in the document.
    pub index: usize,
    pub id: ObjectId,
}

impl PageRef {
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

pub trait PageRenderer {
    /// Natural size of the page in points, rotation applied.
    fn viewport(&mut self, document: &Document, page: PageRef) -> Result<PageDimensions> {
        Ok(pages::viewport(document, page.id))
    }

    /// Paint the page at `scale` (1.0 = one pixel per point).
    fn render(&mut self, document: &Document, page: PageRef, scale: f32) -> Result<DynamicImage>;
}

impl<R: PageRenderer + ?Sized> PageRenderer for &mut R {
    fn viewport(&mut self, document: &Document, page: PageRef) -> Result<PageDimensions> {
        (**self).viewport(document, page)
    }

    fn render(&mut self, document: &Document, page: PageRef, scale: f32) -> Result<DynamicImage> {
        (**self).render(document, page, scale)
    }
}
