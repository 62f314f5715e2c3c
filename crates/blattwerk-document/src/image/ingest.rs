// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image ingestion — turn an uploaded raster into an `ImageAsset` whose bytes
// are PNG or JPEG and known to decode.
//
// Repair policy:
//   PNG (declared or by signature), intact   → kept as PNG
//   PNG, truncated/damaged                   → surviving rows re-encoded as PNG,
//                                              else JPEG
//   JPEG, bytes sniff as JPEG                → kept as-is
//   JPEG label on other content              → re-encoded JPEG
//   GIF, BMP, WebP, TIFF                     → re-encoded JPEG
//   anything that fails to decode            → Corrupt

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::types::{EmbeddableType, ImageAsset, ImageType};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::png;
use super::processor::ImageProcessor;

/// Quality used when converting non-embeddable formats to JPEG.
pub const CONVERSION_JPEG_QUALITY: u8 = 92;

/// Work out what the upload claims to be: the MIME type when given, else the
/// file extension, else the content itself.
pub fn declared_type(name: &str, bytes: &[u8], mime: Option<&str>) -> Result<ImageType> {
    if let Some(mime) = mime.filter(|m| !m.trim().is_empty()) {
        return ImageType::from_mime(mime).ok_or_else(|| {
            BlattwerkError::UnsupportedImageType(format!("{name}: {mime} is not supported"))
        });
    }

    if let Some((_, ext)) = name.rsplit_once('.') {
        if let Some(kind) = ImageType::from_extension(ext) {
            return Ok(kind);
        }
    }

    let format = image::guess_format(bytes)
        .map_err(|_| BlattwerkError::Corrupt(format!("{name}: unrecognised image data")))?;
    match format {
        image::ImageFormat::Png => Ok(ImageType::Png),
        image::ImageFormat::Jpeg => Ok(ImageType::Jpeg),
        image::ImageFormat::Gif => Ok(ImageType::Gif),
        image::ImageFormat::Bmp => Ok(ImageType::Bmp),
        image::ImageFormat::WebP => Ok(ImageType::WebP),
        image::ImageFormat::Tiff => Ok(ImageType::Tiff),
        other => Err(BlattwerkError::UnsupportedImageType(format!(
            "{name}: {other:?} images are not supported"
        ))),
    }
}

/// Validate, repair and decode one upload.
#[instrument(skip(bytes), fields(bytes_len = bytes.len()))]
pub fn ingest_image(name: &str, bytes: &[u8], mime: Option<&str>) -> Result<ImageAsset> {
    if bytes.is_empty() {
        return Err(BlattwerkError::Corrupt(format!("{name}: empty image")));
    }

    let declared = declared_type(name, bytes, mime)?;
    let treat_as_png = declared == ImageType::Png || png::has_png_signature(bytes);

    let (embeddable_type, decoded_bytes, processor) = if treat_as_png {
        repair_png(name, bytes)?
    } else if declared == ImageType::Jpeg && is_jpeg(bytes) {
        let processor = ImageProcessor::from_bytes(bytes)?;
        (EmbeddableType::Jpeg, bytes.to_vec(), processor)
    } else {
        let processor = ImageProcessor::from_bytes(bytes)?;
        let jpeg = processor.to_jpeg_bytes(CONVERSION_JPEG_QUALITY)?;
        info!(?declared, jpeg_bytes = jpeg.len(), "Converted image to JPEG");
        (EmbeddableType::Jpeg, jpeg, processor)
    };

    Ok(ImageAsset {
        id: Uuid::new_v4(),
        name: name.to_string(),
        size: bytes.len() as u64,
        declared_type: declared,
        embeddable_type,
        decoded_bytes,
        width: processor.width(),
        height: processor.height(),
    })
}

fn is_jpeg(bytes: &[u8]) -> bool {
    matches!(image::guess_format(bytes), Ok(image::ImageFormat::Jpeg))
}

fn repair_png(name: &str, bytes: &[u8]) -> Result<(EmbeddableType, Vec<u8>, ImageProcessor)> {
    let complete = png::is_complete_png(bytes);
    let processor = match ImageProcessor::from_bytes(bytes) {
        Ok(processor) if complete => return Ok((EmbeddableType::Png, bytes.to_vec(), processor)),
        Ok(processor) => processor,
        Err(err) => {
            warn!(name, error = %err, "PNG does not decode; salvaging surviving rows");
            png::salvage_png(bytes)
                .map(ImageProcessor::from_dynamic)
                .ok_or_else(|| {
                    BlattwerkError::Corrupt(format!("{name}: PNG is damaged beyond repair"))
                })?
        }
    };

    warn!(name, complete, "PNG failed integrity check; re-encoding");
    let reencoded = processor.to_png_bytes()?;
    if png::is_complete_png(&reencoded) {
        return Ok((EmbeddableType::Png, reencoded, processor));
    }

    warn!(name, "Re-encoded PNG still incomplete; falling back to JPEG");
    let jpeg = processor.to_jpeg_bytes(CONVERSION_JPEG_QUALITY)?;
    Ok((EmbeddableType::Jpeg, jpeg, processor))
}
