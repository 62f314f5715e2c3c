// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compression engine — rasterize every page at a reduced resolution, re-encode
// it as JPEG and rebuild the document from those images.
//
// Pages are processed strictly in order. A page that fails to render or
// encode is skipped with a warning; only a run where no page survives fails.

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::presets::CompressionPreset;
use blattwerk_core::types::PageDimensions;
use lopdf::content::{Content, Operation};
use lopdf::{Object, Stream, dictionary};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::renderer::{PageRef, PageRenderer};
use crate::image::processor::ImageProcessor;
use crate::pdf::copy::OutputDocument;
use crate::pdf::loader::LoadedDocument;

/// Result of a compression run.
#[derive(Debug, Clone, Serialize)]
pub struct CompressionOutcome {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// One entry per skipped page, naming the one-based page number.
    pub warnings: Vec<String>,
    pub original_size: u64,
    pub compressed_size: u64,
    pub pages_compressed: usize,
}

impl CompressionOutcome {
    /// Bytes saved; zero when the output grew.
    pub fn savings(&self) -> u64 {
        self.original_size.saturating_sub(self.compressed_size)
    }

    /// Savings as a percentage of the original size, 0.0 when unknown.
    pub fn savings_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        self.savings() as f64 / self.original_size as f64 * 100.0
    }
}

/// Scale factor that brings the longer side of `viewport` down to
/// `max_dimension`. Never above 1.
pub fn raster_scale(viewport: PageDimensions, max_dimension: u32) -> f32 {
    let longest = viewport.width.max(viewport.height);
    if longest <= 0.0 || longest <= max_dimension as f32 {
        1.0
    } else {
        max_dimension as f32 / longest
    }
}

/// Drives a [`PageRenderer`] over a document.
pub struct Compressor<R> {
    renderer: R,
}

impl<R: PageRenderer> Compressor<R> {
    pub fn new(renderer: R) -> Self {
        Self { renderer }
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Compress `document` using the preset named `preset_id`.
    #[instrument(skip(self, document), fields(document = %document.id, page_count = document.page_count))]
    pub fn compress(&mut self, document: &LoadedDocument, preset_id: &str) -> Result<CompressionOutcome> {
        let preset = CompressionPreset::by_id(preset_id)?;
        info!(
            max_dimension = preset.max_dimension,
            quality = preset.jpeg_quality,
            "Compressing PDF"
        );

        let mut output = OutputDocument::new();
        let mut warnings = Vec::new();

        for (index, id) in document.page_ids().into_iter().enumerate() {
            let page = PageRef { index, id };
            match self.compress_page(document, page, preset) {
                Ok((viewport, jpeg, width_px, height_px)) => {
                    embed_jpeg_page(&mut output, viewport, jpeg, width_px, height_px)?;
                }
                Err(err) => {
                    warn!(page = page.number(), %err, "Page skipped during compression");
                    warnings.push(format!("Page {} could not be compressed: {err}", page.number()));
                }
            }
        }

        let pages_compressed = output.page_count();
        if pages_compressed == 0 {
            return Err(BlattwerkError::Unknown(format!(
                "no page of {} could be compressed",
                document.name
            )));
        }

        let bytes = output.finish()?;
        let outcome = CompressionOutcome {
            original_size: document.size,
            compressed_size: bytes.len() as u64,
            bytes,
            warnings,
            pages_compressed,
        };
        info!(
            original = outcome.original_size,
            compressed = outcome.compressed_size,
            skipped = outcome.warnings.len(),
            "Compression complete"
        );
        Ok(outcome)
    }

    /// Render and encode one page: returns its viewport, the JPEG and the
    /// raster size in pixels.
    fn compress_page(
        &mut self,
        document: &LoadedDocument,
        page: PageRef,
        preset: &CompressionPreset,
    ) -> Result<(PageDimensions, Vec<u8>, u32, u32)> {
        let viewport = self.renderer.viewport(document.document(), page)?;
        let scale = raster_scale(viewport, preset.max_dimension);
        let raster = self.renderer.render(document.document(), page, scale)?;
        if raster.width() == 0 || raster.height() == 0 {
            return Err(BlattwerkError::Unknown("renderer produced an empty image".to_string()));
        }

        let processor = ImageProcessor::from_dynamic(raster);
        let jpeg = processor.to_jpeg_bytes(preset.jpeg_quality)?;
        debug!(
            page = page.number(),
            scale,
            width_px = processor.width(),
            height_px = processor.height(),
            jpeg_bytes = jpeg.len(),
            "Page rasterized"
        );
        Ok((viewport, jpeg, processor.width(), processor.height()))
    }
}

/// Append a page of `viewport` size whose only content is the JPEG drawn
/// edge to edge.
fn embed_jpeg_page(
    output: &mut OutputDocument,
    viewport: PageDimensions,
    jpeg: Vec<u8>,
    width_px: u32,
    height_px: u32,
) -> Result<()> {
    let image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width_px as i64,
            "Height" => height_px as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
            "Filter" => "DCTDecode",
        },
        jpeg,
    )
    .with_compression(false);
    let image_id = output.add_object(image);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(viewport.width),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(viewport.height),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_bytes = content
        .encode()
        .map_err(|err| BlattwerkError::Unknown(format!("failed to encode page content: {err}")))?;
    let content_id = output.add_object(Stream::new(lopdf::Dictionary::new(), content_bytes));

    output.push_page(dictionary! {
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(viewport.width),
            Object::Real(viewport.height),
        ],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use blattwerk_core::error::ErrorKind;
    use image::{DynamicImage, RgbImage};
    use lopdf::Document;

    /// Paints a flat grey raster; fails on the listed zero-based pages.
    #[derive(Default)]
    struct FakeRenderer {
        fail_on: Vec<usize>,
        scales: Vec<f32>,
    }

    impl PageRenderer for FakeRenderer {
        fn render(&mut self, document: &Document, page: PageRef, scale: f32) -> Result<DynamicImage> {
            self.scales.push(scale);
            if self.fail_on.contains(&page.index) {
                return Err(BlattwerkError::Unknown("canvas unavailable".to_string()));
            }
            let view = crate::pdf::pages::viewport(document, page.id);
            let w = ((view.width * scale).round() as u32).max(1);
            let h = ((view.height * scale).round() as u32).max(1);
            Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, image::Rgb([200, 200, 200]))))
        }
    }

    #[test]
    fn every_page_failing_is_fatal() {
        let doc = fixtures::loaded("doc.pdf", fixtures::pdf(3));
        let mut compressor = Compressor::new(FakeRenderer {
            fail_on: vec![0, 1, 2],
            ..Default::default()
        });
        let err = compressor.compress(&doc, "balanced").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn one_failing_page_becomes_a_warning() {
        let doc = fixtures::loaded("doc.pdf", fixtures::pdf(5));
        let mut compressor = Compressor::new(FakeRenderer {
            fail_on: vec![2],
            ..Default::default()
        });
        let outcome = compressor.compress(&doc, "balanced").unwrap();
        assert_eq!(outcome.pages_compressed, 4);
        assert_eq!(fixtures::page_count(&outcome.bytes), 4);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].starts_with("Page 3"));
    }

    #[test]
    fn output_pages_keep_viewport_size() {
        let doc = fixtures::loaded("doc.pdf", fixtures::sized_pdf(&[(300, 400), (612, 792)]));
        let outcome = Compressor::new(FakeRenderer::default())
            .compress(&doc, "smallest")
            .unwrap();
        assert_eq!(fixtures::page_sizes(&outcome.bytes), vec![(300.0, 400.0), (612.0, 792.0)]);
        assert_eq!(outcome.compressed_size, outcome.bytes.len() as u64);
        assert_eq!(outcome.original_size, doc.size);
    }

    #[test]
    fn large_pages_are_scaled_down_to_the_preset_cap() {
        let doc = fixtures::loaded("poster.pdf", fixtures::sized_pdf(&[(3600, 1800), (600, 800)]));
        let mut compressor = Compressor::new(FakeRenderer::default());
        compressor.compress(&doc, "balanced").unwrap();
        let renderer = compressor.into_renderer();
        assert_eq!(renderer.scales, vec![0.5, 1.0]);
    }

    #[test]
    fn unknown_preset_is_unsupported() {
        let doc = fixtures::loaded("doc.pdf", fixtures::pdf(1));
        let err = Compressor::new(FakeRenderer::default())
            .compress(&doc, "extreme")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn raster_scale_clamps_the_longer_side() {
        let landscape = PageDimensions {
            width: 2400.0,
            height: 1200.0,
        };
        assert_eq!(raster_scale(landscape, 1200), 0.5);
        assert_eq!(raster_scale(landscape, 4000), 1.0);
    }

    #[test]
    fn savings_saturate_and_report_percent() {
        let outcome = CompressionOutcome {
            bytes: Vec::new(),
            warnings: Vec::new(),
            original_size: 1000,
            compressed_size: 250,
            pages_compressed: 1,
        };
        assert_eq!(outcome.savings(), 750);
        assert_eq!(outcome.savings_percent(), 75.0);

        let grew = CompressionOutcome {
            compressed_size: 2000,
            ..outcome
        };
        assert_eq!(grew.savings(), 0);
    }
}
