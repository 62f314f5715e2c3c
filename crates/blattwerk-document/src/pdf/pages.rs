// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-tree helpers shared by the loader, the copy machinery and the
// compression engine.

use blattwerk_core::types::PageDimensions;
use lopdf::{Document, Object, ObjectId};

/// Attributes a page may inherit from its ancestors (PDF 32000-1 §7.7.3.4).
pub const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// US Letter, used when a page has no resolvable `/MediaBox`.
const DEFAULT_MEDIA_BOX: PageDimensions = PageDimensions {
    width: 612.0,
    height: 792.0,
};

/// Page object ids in document order (index 0 is page 1).
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    // `get_pages` is keyed by 1-based page number, so values are in order.
    doc.get_pages().values().copied().collect()
}

/// Look up `key` on the page, walking up `/Parent` links when absent.
pub fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    // Bounded walk; malformed files can contain parent cycles.
    for _ in 0..64 {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(resolve(doc, value).clone());
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// Follow a single level of indirection.
pub fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

/// Numeric value of an integer or real object.
pub fn as_number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

/// Width and height of the page's (possibly inherited) `/MediaBox`.
pub fn media_box(doc: &Document, page_id: ObjectId) -> Option<PageDimensions> {
    let object = inherited_attribute(doc, page_id, b"MediaBox")?;
    let values = object
        .as_array()
        .ok()?
        .iter()
        .map(|item| as_number(resolve(doc, item)))
        .collect::<Option<Vec<f32>>>()?;
    if values.len() != 4 {
        return None;
    }
    Some(PageDimensions {
        width: (values[2] - values[0]).abs(),
        height: (values[3] - values[1]).abs(),
    })
}

/// The page's `/Rotate` value in degrees, or 0.
pub fn rotation(doc: &Document, page_id: ObjectId) -> i64 {
    inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|object| object.as_i64().ok())
        .unwrap_or(0)
}

/// Size of the page as displayed: media box with `/Rotate` applied.
pub fn viewport(doc: &Document, page_id: ObjectId) -> PageDimensions {
    let dims = media_box(doc, page_id).unwrap_or(DEFAULT_MEDIA_BOX);
    if rotation(doc, page_id).rem_euclid(180) == 90 {
        PageDimensions {
            width: dims.height,
            height: dims.width,
        }
    } else {
        dims
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn page_ids_follow_document_order() {
        let doc = fixtures::load(&fixtures::sized_pdf(&[(100, 200), (300, 400), (500, 600)]));
        let ids = page_ids(&doc);
        assert_eq!(ids.len(), 3);
        assert_eq!(media_box(&doc, ids[1]).unwrap().width, 300.0);
    }

    #[test]
    fn media_box_is_inherited_from_parent() {
        let doc = fixtures::load(&fixtures::inherited_media_box_pdf());
        let ids = page_ids(&doc);
        let dims = media_box(&doc, ids[0]).unwrap();
        assert_eq!((dims.width, dims.height), (420.0, 595.0));
    }

    #[test]
    fn viewport_swaps_for_quarter_turns() {
        let doc = fixtures::load(&fixtures::rotated_pdf(90));
        let ids = page_ids(&doc);
        let view = viewport(&doc, ids[0]);
        assert_eq!((view.width, view.height), (792.0, 612.0));
    }
}
