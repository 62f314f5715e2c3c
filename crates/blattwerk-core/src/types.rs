// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Blattwerk PDF toolkit.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an ingested source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(pub Uuid);

impl SourceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a loaded (parsed) document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a source buffer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceOrigin {
    /// Picked or dropped by the user.
    Upload,
    /// Produced by a previous Blattwerk operation and fed back in.
    Generated,
}

/// Immutable record of an uploaded file's bytes plus identifying metadata.
///
/// The byte buffer is shared and never mutated. The only field that changes
/// after creation is `password`, which records the last password the loader
/// accepted.
#[derive(Debug, Clone)]
pub struct Source {
    pub id: SourceId,
    pub origin: SourceOrigin,
    pub name: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    /// Lowercase hex SHA-256 of `bytes`.
    pub fingerprint: String,
    pub bytes: Arc<[u8]>,
    pub password: Option<String>,
}

impl Source {
    /// Record the password that successfully opened this source.
    pub fn record_password(&mut self, password: impl Into<String>) {
        self.password = Some(password.into());
    }

    /// A fresh, independently owned copy of the bytes.
    pub fn fresh_copy(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }
}

/// Width and height of a page in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    pub width: f32,
    pub height: f32,
}

/// Permission flags from the document's security handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub print: bool,
    pub modify: bool,
    pub copy: bool,
    pub annotate: bool,
}

impl Permissions {
    /// Decode the `/P` bit field (PDF 32000-1 table 22).
    pub fn from_bits(bits: i64) -> Self {
        let bit = |n: u32| bits & (1 << (n - 1)) != 0;
        Self {
            print: bit(3),
            modify: bit(4),
            copy: bit(5),
            annotate: bit(6),
        }
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            print: true,
            modify: true,
            copy: true,
            annotate: true,
        }
    }
}

/// Best-effort document metadata. Every field is read independently; a field
/// that could not be read is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub producer: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
    pub permissions: Option<Permissions>,
    pub first_page: Option<PageDimensions>,
}

/// Per-page edit state, decoupled from the document bytes until export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditablePage {
    pub id: usize,
    /// Zero-based index into the source document.
    pub original_index: usize,
    /// Accumulated rotation in degrees. Not normalized until export.
    pub rotation: i32,
    pub is_deleted: bool,
}

impl EditablePage {
    pub fn identity(index: usize) -> Self {
        Self {
            id: index,
            original_index: index,
            rotation: 0,
            is_deleted: false,
        }
    }

    /// Rotation clamped into `[0, 360)`.
    pub fn normalized_rotation(&self) -> i32 {
        normalize_rotation(self.rotation)
    }
}

/// `((degrees % 360) + 360) % 360`.
pub fn normalize_rotation(degrees: i32) -> i32 {
    degrees.rem_euclid(360)
}

/// Raster formats Blattwerk understands on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageType {
    Png,
    Jpeg,
    Gif,
    Bmp,
    WebP,
    Tiff,
}

impl ImageType {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::WebP => "image/webp",
            Self::Tiff => "image/tiff",
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/gif" => Some(Self::Gif),
            "image/bmp" | "image/x-ms-bmp" => Some(Self::Bmp),
            "image/webp" => Some(Self::WebP),
            "image/tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            "webp" => Some(Self::WebP),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }
}

/// The two formats the document writer can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddableType {
    Png,
    Jpeg,
}

/// A decoded image ready for embedding.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub id: Uuid,
    pub name: String,
    pub size: u64,
    pub declared_type: ImageType,
    /// What the bytes in `decoded_bytes` actually are after integrity repair.
    pub embeddable_type: EmbeddableType,
    pub decoded_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Tabloid => (279, 432),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Portrait dimensions in PDF points.
    pub fn dimensions_pt(&self) -> (f32, f32) {
        let (w, h) = self.dimensions_mm();
        (mm_to_pt(w as f32), mm_to_pt(h as f32))
    }
}

pub fn mm_to_pt(mm: f32) -> f32 {
    mm * 72.0 / 25.4
}

pub fn pt_to_mm(pt: f32) -> f32 {
    pt * 25.4 / 72.0
}

/// How image pages are sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSizing {
    Paper(PaperSize),
    /// One image pixel per point; orientation and margin are ignored.
    MatchImage,
}

/// Page orientation for image pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
    /// Landscape for images wider than tall, portrait otherwise.
    Auto,
}

/// How an image is scaled into its page box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitMode {
    /// Whole image visible, letterboxed.
    Fit,
    /// Page fully covered; the image may overflow and is clipped by the page.
    Fill,
    /// Like `Fit` but never upscales past 100%.
    Center,
}

/// Layout settings for image-to-document assembly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageLayout {
    pub sizing: PageSizing,
    pub orientation: Orientation,
    /// Margin in points.
    pub margin: f32,
    pub fit: FitMode,
}

impl Default for ImageLayout {
    fn default() -> Self {
        Self {
            sizing: PageSizing::Paper(PaperSize::A4),
            orientation: Orientation::Auto,
            margin: 24.0,
            fit: FitMode::Fit,
        }
    }
}

/// Which tool produced an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tool {
    Merge,
    Split,
    Edit,
    ImagesToPdf,
    Compress,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Split => "split",
            Self::Edit => "edit",
            Self::ImagesToPdf => "images",
            Self::Compress => "compress",
        }
    }
}

/// Structured record of a completed operation, fed to the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub tool: Tool,
    pub operation: String,
    pub source_count: usize,
    pub detail: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// Terminal artifact of every operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub size: u64,
    pub download_name: String,
    pub duration_ms: u64,
    pub warnings: Vec<String>,
    pub activity: Activity,
}
