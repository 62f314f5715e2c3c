// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PNG structural checks. Cheap enough to run on every upload before decoding.
//
// `salvage_png` is the slow path for uploads the regular decoder rejects: the
// chunk list is closed off after the last surviving data and decoded row by
// row, so a cut-off upload still yields the rows that arrived.

use std::io::Cursor;

use image::{DynamicImage, ImageBuffer};
use tracing::debug;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Length + type + CRC around each chunk's data.
const CHUNK_OVERHEAD: usize = 12;

/// Zero-length `IEND` with its fixed CRC.
const IEND_CHUNK: [u8; 12] = [0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82];

/// Upper bound on the pixel buffer a salvage attempt may allocate.
const SALVAGE_MAX_BYTES: usize = 256 * 1024 * 1024;

pub fn has_png_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(&PNG_SIGNATURE)
}

/// Walk the chunk list and report whether it reaches `IEND` intact.
///
/// CRCs are not verified; the aim is to catch truncated uploads.
pub fn is_complete_png(bytes: &[u8]) -> bool {
    if !has_png_signature(bytes) {
        return false;
    }

    let mut offset = PNG_SIGNATURE.len();
    while offset + 8 <= bytes.len() {
        let length = chunk_length(bytes, offset);
        let chunk_type = &bytes[offset + 4..offset + 8];

        let Some(end) = offset
            .checked_add(CHUNK_OVERHEAD)
            .and_then(|n| n.checked_add(length))
        else {
            return false;
        };
        if end > bytes.len() {
            return false;
        }
        if chunk_type == b"IEND" {
            return true;
        }
        offset = end;
    }
    false
}

fn chunk_length(bytes: &[u8], offset: usize) -> usize {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ]) as usize
}

/// Recover whatever rows a damaged PNG still holds.
///
/// Returns `None` when not even the header and one row survive. Rows past
/// the damage are left black. Interlaced images are not salvaged since their
/// early passes do not map onto whole rows.
pub fn salvage_png(bytes: &[u8]) -> Option<DynamicImage> {
    if !has_png_signature(bytes) {
        return None;
    }

    let closed = close_chunk_list(bytes);
    let mut decoder = ::png::Decoder::new(Cursor::new(closed.as_slice()));
    decoder.set_transformations(::png::Transformations::normalize_to_color8());
    decoder.ignore_checksums(true);
    let mut reader = decoder.read_info().ok()?;

    let (width, height, interlaced) = {
        let info = reader.info();
        (info.width, info.height, info.interlaced)
    };
    if interlaced || width == 0 || height == 0 {
        return None;
    }

    let line_size = reader.output_line_size(width);
    let buffer_len = line_size.checked_mul(height as usize)?;
    if buffer_len > SALVAGE_MAX_BYTES {
        return None;
    }
    let (color_type, _) = reader.output_color_type();

    let mut pixels = vec![0u8; buffer_len];
    let mut rows = 0usize;
    while rows < height as usize {
        let Ok(Some(row)) = reader.next_row() else {
            break;
        };
        let data = row.data();
        let n = data.len().min(line_size);
        let start = rows * line_size;
        pixels[start..start + n].copy_from_slice(&data[..n]);
        rows += 1;
    }
    if rows == 0 {
        return None;
    }
    debug!(rows, height, "Recovered rows from damaged PNG");

    let image = match color_type {
        ::png::ColorType::Grayscale => {
            DynamicImage::ImageLuma8(ImageBuffer::from_raw(width, height, pixels)?)
        }
        ::png::ColorType::GrayscaleAlpha => {
            DynamicImage::ImageLumaA8(ImageBuffer::from_raw(width, height, pixels)?)
        }
        ::png::ColorType::Rgb => DynamicImage::ImageRgb8(ImageBuffer::from_raw(width, height, pixels)?),
        ::png::ColorType::Rgba => {
            DynamicImage::ImageRgba8(ImageBuffer::from_raw(width, height, pixels)?)
        }
        // EXPAND turns palettes into RGB(A).
        ::png::ColorType::Indexed => return None,
    };
    Some(image)
}

/// Copy every complete chunk, keep the surviving part of a cut `IDAT`, and
/// terminate with `IEND`. CRCs of rewritten chunks are left zero.
fn close_chunk_list(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + IEND_CHUNK.len());
    out.extend_from_slice(&PNG_SIGNATURE);

    let mut offset = PNG_SIGNATURE.len();
    while offset + 8 <= bytes.len() {
        let length = chunk_length(bytes, offset);
        let chunk_type = &bytes[offset + 4..offset + 8];
        if chunk_type == b"IEND" {
            break;
        }

        let data_start = offset + 8;
        let available = bytes.len() - data_start;
        if length.saturating_add(4) <= available {
            let end = data_start + length + 4;
            out.extend_from_slice(&bytes[offset..end]);
            offset = end;
            continue;
        }

        if chunk_type == b"IDAT" {
            let kept = available.min(length);
            out.extend_from_slice(&(kept as u32).to_be_bytes());
            out.extend_from_slice(chunk_type);
            out.extend_from_slice(&bytes[data_start..data_start + kept]);
            out.extend_from_slice(&[0; 4]);
        }
        break;
    }

    out.extend_from_slice(&IEND_CHUNK);
    out
}
