// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, downscale and re-encode in-memory images with the
// `image` crate.

use blattwerk_core::error::{BlattwerkError, Result};
use image::{DynamicImage, ImageFormat, imageops::FilterType};
use tracing::{debug, instrument};

/// A single decoded image.
///
/// Transformations consume `self` and return a new processor so calls chain:
///
/// ```ignore
/// let jpeg = ImageProcessor::from_bytes(&upload)?
///     .fit_within(1800)
///     .to_jpeg_bytes(72)?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode raw encoded bytes (PNG, JPEG, GIF, BMP, WebP, TIFF). The format is
    /// sniffed from the content; undecodable input is `Corrupt`.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(data)
            .map_err(|err| BlattwerkError::Corrupt(format!("failed to decode image: {err}")))?;
        debug!(width = image.width(), height = image.height(), "Image decoded from bytes");
        Ok(Self { image })
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Shrink so the longer side is at most `max_dimension`, keeping the aspect
    /// ratio. Images already small enough are returned untouched.
    pub fn fit_within(self, max_dimension: u32) -> Self {
        let longest = self.width().max(self.height());
        if max_dimension == 0 || longest <= max_dimension {
            return self;
        }
        let image = self
            .image
            .resize(max_dimension, max_dimension, FilterType::Triangle);
        debug!(width = image.width(), height = image.height(), "Image downscaled");
        Self { image }
    }

    // -- Output ---------------------------------------------------------------

    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| BlattwerkError::Unknown(format!("PNG encoding failed: {err}")))?;
        Ok(buffer)
    }

    /// Encode as baseline JPEG at `quality` (1-100). Alpha is dropped.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder)
            .map_err(|err| BlattwerkError::Unknown(format!("JPEG encoding failed: {err}")))?;
        Ok(buffer)
    }
}
