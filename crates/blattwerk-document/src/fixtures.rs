// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test fixtures: small PDFs built with lopdf, plus helpers to inspect output.

use blattwerk_core::config::ToolkitConfig;
use lopdf::content::{Content, Operation};
use lopdf::{
    Dictionary, Document, EncryptionState, EncryptionVersion, Object, Permissions, Stream,
    dictionary,
};

use crate::pdf::loader::{DocumentLoader, LoadedDocument};
use crate::pdf::pages;
use crate::source;

/// A PDF with one page per entry of `sizes`, each labelled "Page N".
pub fn sized_pdf(sizes: &[(i64, i64)]) -> Vec<u8> {
    build(sizes, None, false)
}

/// `num_pages` US Letter pages.
pub fn pdf(num_pages: usize) -> Vec<u8> {
    sized_pdf(&vec![(612, 792); num_pages])
}

/// A single Letter page carrying `/Rotate`.
pub fn rotated_pdf(degrees: i64) -> Vec<u8> {
    build(&[(612, 792)], Some(degrees), false)
}

/// Two pages whose `/MediaBox` (420 x 595) lives on the `/Pages` node only.
pub fn inherited_media_box_pdf() -> Vec<u8> {
    build(&[(420, 595), (420, 595)], None, true)
}

/// `num_pages` Letter pages encrypted with the standard handler (RC4, 128-bit).
/// An empty `user_password` opens without prompting.
pub fn encrypted_pdf(
    num_pages: usize,
    user_password: &str,
    owner_password: &str,
    permissions: Permissions,
) -> Vec<u8> {
    let mut doc = build_document(&vec![(612, 792); num_pages], None, false);
    let file_id = Object::string_literal("blattwerk-fixture-id");
    doc.trailer.set("ID", Object::Array(vec![file_id.clone(), file_id]));
    let state = EncryptionState::try_from(EncryptionVersion::V2 {
        document: &doc,
        owner_password,
        user_password,
        key_length: 128,
        permissions,
    })
    .expect("encryption state builds");
    doc.encrypt(&state).expect("fixture encrypts");
    save(doc)
}

fn build(sizes: &[(i64, i64)], rotate: Option<i64>, inherit_box: bool) -> Vec<u8> {
    save(build_document(sizes, rotate, inherit_box))
}

fn save(mut doc: Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("fixture saves");
    buffer
}

fn build_document(sizes: &[(i64, i64)], rotate: Option<i64>, inherit_box: bool) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for (index, (width, height)) in sizes.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(24)]),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(72)]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("Page {}", index + 1))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().expect("content encodes"),
        ));

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        };
        if !inherit_box {
            page.set("MediaBox", media_box(*width, *height));
        }
        if let Some(degrees) = rotate {
            page.set("Rotate", degrees);
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let mut pages_dict = dictionary! {
        "Type" => "Pages",
        "Count" => sizes.len() as i64,
        "Kids" => kids,
    };
    if inherit_box {
        let (width, height) = sizes[0];
        pages_dict.set("MediaBox", media_box(width, height));
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", doc_info());
    doc
}

fn media_box(width: i64, height: i64) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(width),
        Object::Integer(height),
    ])
}

fn doc_info() -> Object {
    Object::Dictionary(dictionary! {
        "Title" => Object::string_literal("Fixture"),
        "Author" => Object::string_literal("Blattwerk Tests"),
        "CreationDate" => Object::string_literal("D:20260101120000Z"),
    })
}

pub fn load(bytes: &[u8]) -> Document {
    Document::load_mem(bytes).expect("fixture parses")
}

/// Ingest and load `bytes` with the default lopdf parser.
pub fn loaded(name: &str, bytes: Vec<u8>) -> LoadedDocument {
    let config = ToolkitConfig::default();
    let mut source = source::ingest(name, bytes, None, &config).expect("fixture ingests");
    DocumentLoader::with_config(config)
        .load(&mut source, None)
        .expect("fixture loads")
}

/// Page count of serialized output.
pub fn page_count(bytes: &[u8]) -> usize {
    load(bytes).get_pages().len()
}

/// (width, height) of every page of serialized output.
pub fn page_sizes(bytes: &[u8]) -> Vec<(f32, f32)> {
    let doc = load(bytes);
    pages::page_ids(&doc)
        .into_iter()
        .map(|id| {
            let dims = pages::media_box(&doc, id).expect("page has a media box");
            (dims.width, dims.height)
        })
        .collect()
}

/// Explicit `/Rotate` of every page of serialized output (None when absent).
pub fn page_rotations(bytes: &[u8]) -> Vec<Option<i64>> {
    let doc = load(bytes);
    pages::page_ids(&doc)
        .into_iter()
        .map(|id| {
            doc.get_dictionary(id)
                .ok()
                .and_then(|dict| dict.get(b"Rotate").ok())
                .and_then(|rotate| rotate.as_i64().ok())
        })
        .collect()
}

/// Encode a small gradient as PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 128])
    });
    let mut buffer = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
        .expect("png encodes");
    buffer
}

/// Encode pseudo-random RGB noise as PNG, so the compressed data is roughly
/// as long as the pixels and cuts land inside the image data.
pub fn noisy_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x2545_F491;
    let img = image::RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        };
        image::Rgb([next(), next(), next()])
    });
    let mut buffer = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
        .expect("png encodes");
    buffer
}

/// Encode a gradient with a transparent left half as PNG.
pub fn transparent_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        let alpha = if x < width / 2 { 0 } else { 255 };
        image::Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 128, alpha])
    });
    let mut buffer = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
        .expect("png encodes");
    buffer
}

/// Encode a small gradient as JPEG.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 3 % 256) as u8, 64, (y * 5 % 256) as u8])
    });
    let mut buffer = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Jpeg)
        .expect("jpeg encodes");
    buffer
}
