// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — assemble a new document from images using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.
//
// JPEG assets are embedded byte-for-byte as `DCTDecode` external XObjects.
// PNG assets are decoded and stored Flate-compressed, with an `/SMask` when
// the image carries alpha.

use std::collections::BTreeMap;

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::types::{EmbeddableType, ImageAsset, ImageLayout, pt_to_mm};
use printpdf::{
    DictItem, ExternalStream, ExternalXObject, ImageCompression, ImageOptimizationOptions, Mm,
    Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, Px, RawImage, RawImageData,
    RawImageFormat, XObjectId, XObjectTransform,
};
use tracing::{debug, info, instrument};

use crate::image::layout::layout_image;
use crate::image::processor::ImageProcessor;

/// At 72 dpi one image pixel maps to one PDF point.
const POINTS_DPI: f32 = 72.0;

/// Build a PDF with one page per asset, in order.
#[instrument(skip(assets, layout), fields(image_count = assets.len()))]
pub fn images_to_pdf(assets: &[ImageAsset], layout: &ImageLayout, title: &str) -> Result<Vec<u8>> {
    if assets.is_empty() {
        return Err(BlattwerkError::Unsupported(
            "at least one image is needed to build a document".to_string(),
        ));
    }

    info!(sizing = ?layout.sizing, orientation = ?layout.orientation, fit = ?layout.fit, "Creating image PDF");

    let mut doc = PdfDocument::new(title);
    let mut pages = Vec::with_capacity(assets.len());

    for asset in assets {
        let (xobject_id, img_w, img_h) = add_asset(&mut doc, asset)?;

        let (page_box, placement) = layout_image(img_w, img_h, layout);
        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(placement.x)),
                translate_y: Some(Pt(placement.y)),
                scale_x: Some(placement.scale),
                scale_y: Some(placement.scale),
                dpi: Some(POINTS_DPI),
                rotate: None,
            },
        }];

        debug!(
            name = %asset.name,
            page_w_pt = page_box.width,
            page_h_pt = page_box.height,
            scale = placement.scale,
            "Image placed on page"
        );
        pages.push(PdfPage::new(
            Mm(pt_to_mm(page_box.width)),
            Mm(pt_to_mm(page_box.height)),
            ops,
        ));
    }

    doc.with_pages(pages);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let output = doc.save(&save_options(), &mut warnings);
    debug!(output_bytes = output.len(), warnings = warnings.len(), "Image PDF serialised");
    Ok(output)
}

/// Register one asset as an image XObject; returns its id and pixel size.
fn add_asset(doc: &mut PdfDocument, asset: &ImageAsset) -> Result<(XObjectId, u32, u32)> {
    if asset.embeddable_type == EmbeddableType::Jpeg {
        if let Some(color_space) = jpeg_color_space(&asset.decoded_bytes) {
            debug!(name = %asset.name, color_space, "Embedding JPEG as DCTDecode");
            let xobject = dct_xobject(asset, color_space);
            return Ok((doc.add_xobject(&xobject), asset.width, asset.height));
        }
        debug!(name = %asset.name, "JPEG colour model not embeddable as-is; decoding");
    }

    let processor = ImageProcessor::from_bytes(&asset.decoded_bytes)?;
    let (img_w, img_h) = (processor.width(), processor.height());
    let image = processor.into_dynamic();
    let (pixels, data_format) = if image.color().has_alpha() {
        (image.to_rgba8().into_raw(), RawImageFormat::RGBA8)
    } else {
        (image.to_rgb8().into_raw(), RawImageFormat::RGB8)
    };

    let raw = RawImage {
        pixels: RawImageData::U8(pixels),
        width: img_w as usize,
        height: img_h as usize,
        data_format,
        tag: Vec::new(),
    };
    Ok((doc.add_image(&raw), img_w, img_h))
}

fn dct_xobject(asset: &ImageAsset, color_space: &str) -> ExternalXObject {
    let dict = BTreeMap::from([
        ("Type".to_string(), DictItem::Name(b"XObject".to_vec())),
        ("Subtype".to_string(), DictItem::Name(b"Image".to_vec())),
        ("Width".to_string(), DictItem::Int(i64::from(asset.width))),
        ("Height".to_string(), DictItem::Int(i64::from(asset.height))),
        ("ColorSpace".to_string(), DictItem::Name(color_space.as_bytes().to_vec())),
        ("BitsPerComponent".to_string(), DictItem::Int(8)),
        ("Filter".to_string(), DictItem::Name(b"DCTDecode".to_vec())),
    ]);
    ExternalXObject {
        stream: ExternalStream {
            dict,
            content: asset.decoded_bytes.clone(),
            compress: false,
        },
        width: Some(Px(asset.width as usize)),
        height: Some(Px(asset.height as usize)),
        dpi: Some(POINTS_DPI),
    }
}

/// PDF colour space for a baseline or progressive JPEG, from the component
/// count in its start-of-frame header. CMYK and unusual layouts yield `None`.
fn jpeg_color_space(bytes: &[u8]) -> Option<&'static str> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut offset = 2;
    while offset + 4 <= bytes.len() {
        if bytes[offset] != 0xFF {
            return None;
        }
        let marker = bytes[offset + 1];
        match marker {
            // Fill byte.
            0xFF => {
                offset += 1;
                continue;
            }
            0x01 | 0xD0..=0xD7 => {
                offset += 2;
                continue;
            }
            0xD9 | 0xDA => return None,
            _ => {}
        }

        let length = u16::from_be_bytes([bytes[offset + 2], bytes[offset + 3]]) as usize;
        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            return match bytes.get(offset + 9)? {
                1 => Some("DeviceGray"),
                3 => Some("DeviceRGB"),
                _ => None,
            };
        }
        offset += 2 + length;
    }
    None
}

/// Lossless storage for decoded pixels; JPEG assets bypass this entirely.
fn save_options() -> PdfSaveOptions {
    PdfSaveOptions {
        image_optimization: Some(ImageOptimizationOptions {
            quality: None,
            max_image_size: None,
            dither_greyscale: None,
            convert_to_greyscale: None,
            auto_optimize: Some(false),
            format: Some(ImageCompression::Flate),
        }),
        ..PdfSaveOptions::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::image::ingest::ingest_image;
    use blattwerk_core::error::ErrorKind;
    use blattwerk_core::types::{Orientation, PageSizing, PaperSize};
    use lopdf::{Document, Object, Stream};

    fn image_streams(bytes: &[u8]) -> Vec<Stream> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.objects
            .values()
            .filter_map(|object| object.as_stream().ok())
            .filter(|stream| name_of(stream, b"Subtype") == Some(b"Image".as_slice()))
            .cloned()
            .collect()
    }

    fn name_of<'a>(stream: &'a Stream, key: &[u8]) -> Option<&'a [u8]> {
        stream.dict.get(key).and_then(Object::as_name).ok()
    }

    fn assets() -> Vec<ImageAsset> {
        vec![
            ingest_image("wide.png", &fixtures::png_bytes(300, 200), None).unwrap(),
            ingest_image("tall.jpg", &fixtures::jpeg_bytes(100, 400), None).unwrap(),
        ]
    }

    #[test]
    fn one_page_per_image() {
        let bytes = images_to_pdf(&assets(), &ImageLayout::default(), "Images").unwrap();
        assert_eq!(fixtures::page_count(&bytes), 2);
    }

    #[test]
    fn auto_orientation_per_page() {
        let bytes = images_to_pdf(&assets(), &ImageLayout::default(), "Images").unwrap();
        let sizes = fixtures::page_sizes(&bytes);
        assert!(sizes[0].0 > sizes[0].1, "wide image should get a landscape page");
        assert!(sizes[1].0 < sizes[1].1, "tall image should get a portrait page");
        assert!((sizes[1].0 - 595.0).abs() < 1.0);
    }

    #[test]
    fn match_image_pages_equal_pixels() {
        let layout = ImageLayout {
            sizing: PageSizing::MatchImage,
            ..ImageLayout::default()
        };
        let bytes = images_to_pdf(&assets(), &layout, "Images").unwrap();
        let sizes = fixtures::page_sizes(&bytes);
        assert!((sizes[0].0 - 300.0).abs() < 0.5 && (sizes[0].1 - 200.0).abs() < 0.5);
        assert!((sizes[1].0 - 100.0).abs() < 0.5 && (sizes[1].1 - 400.0).abs() < 0.5);
    }

    #[test]
    fn forced_landscape_letter() {
        let layout = ImageLayout {
            sizing: PageSizing::Paper(PaperSize::Letter),
            orientation: Orientation::Landscape,
            ..ImageLayout::default()
        };
        let bytes = images_to_pdf(&assets()[1..], &layout, "Images").unwrap();
        let (w, h) = fixtures::page_sizes(&bytes)[0];
        assert!(w > h);
    }

    #[test]
    fn no_images_is_unsupported() {
        let err = images_to_pdf(&[], &ImageLayout::default(), "Images").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn jpeg_is_embedded_without_reencoding() {
        let asset = ingest_image("photo.jpg", &fixtures::jpeg_bytes(40, 30), None).unwrap();
        let bytes =
            images_to_pdf(std::slice::from_ref(&asset), &ImageLayout::default(), "Images").unwrap();

        let streams = image_streams(&bytes);
        assert_eq!(streams.len(), 1);
        let image = &streams[0];
        assert_eq!(name_of(image, b"Filter"), Some(b"DCTDecode".as_slice()));
        assert_eq!(name_of(image, b"ColorSpace"), Some(b"DeviceRGB".as_slice()));
        assert_eq!(image.dict.get(b"Width").and_then(Object::as_i64).unwrap(), 40);
        assert_eq!(image.content, asset.decoded_bytes);
    }

    #[test]
    fn transparent_png_keeps_its_alpha() {
        let asset =
            ingest_image("logo.png", &fixtures::transparent_png_bytes(16, 8), None).unwrap();
        let bytes = images_to_pdf(&[asset], &ImageLayout::default(), "Images").unwrap();

        let streams = image_streams(&bytes);
        let with_mask: Vec<_> = streams.iter().filter(|s| s.dict.get(b"SMask").is_ok()).collect();
        assert_eq!(with_mask.len(), 1);
        assert_eq!(name_of(with_mask[0], b"ColorSpace"), Some(b"DeviceRGB".as_slice()));
        assert!(streams.iter().all(|s| name_of(s, b"Filter") != Some(b"DCTDecode".as_slice())));
    }

    #[test]
    fn opaque_png_has_no_mask() {
        let asset = ingest_image("scan.png", &fixtures::png_bytes(16, 8), None).unwrap();
        let bytes = images_to_pdf(&[asset], &ImageLayout::default(), "Images").unwrap();
        let streams = image_streams(&bytes);
        assert_eq!(streams.len(), 1);
        assert!(streams[0].dict.get(b"SMask").is_err());
    }

    #[test]
    fn jpeg_color_space_reads_frame_header() {
        assert_eq!(jpeg_color_space(&fixtures::jpeg_bytes(8, 8)), Some("DeviceRGB"));

        let mut gray = Vec::new();
        image::DynamicImage::ImageLuma8(image::GrayImage::new(8, 8))
            .write_to(&mut std::io::Cursor::new(&mut gray), image::ImageFormat::Jpeg)
            .unwrap();
        assert_eq!(jpeg_color_space(&gray), Some("DeviceGray"));

        assert_eq!(jpeg_color_space(&fixtures::png_bytes(4, 4)), None);
        assert_eq!(jpeg_color_space(&[0xFF, 0xD8, 0xFF]), None);
    }
}
