// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page copying — build a fresh output document by cloning pages (and every
// object they transitively reference) out of one or more source documents.

use std::collections::HashMap;

use blattwerk_core::error::{BlattwerkError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tracing::{debug, warn};

use super::pages::{self, INHERITABLE_KEYS};

/// A new, initially empty PDF that pages are appended to.
pub struct OutputDocument {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl OutputDocument {
    pub fn new() -> Self {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);
        Self {
            document,
            pages_id,
            kids: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Add a standalone object (image, content stream, ...) and return its id.
    pub fn add_object(&mut self, object: impl Into<Object>) -> ObjectId {
        self.document.add_object(object)
    }

    /// Append a page built by the caller; `/Type` and `/Parent` are filled in.
    pub fn push_page(&mut self, page: Dictionary) -> ObjectId {
        let id = self.document.new_object_id();
        self.insert_page(id, page);
        id
    }

    fn insert_page(&mut self, id: ObjectId, mut page: Dictionary) {
        page.set("Type", "Page");
        page.set("Parent", self.pages_id);
        self.document.objects.insert(id, Object::Dictionary(page));
        self.kids.push(id);
    }

    /// Set an absolute `/Rotate` on a page of this document.
    pub fn set_rotation(&mut self, page_id: ObjectId, degrees: i32) -> Result<()> {
        let page = self
            .document
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(BlattwerkError::unknown)?;
        page.set("Rotate", degrees as i64);
        Ok(())
    }

    /// Write the page tree and serialise the document.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let kids: Vec<Object> = self.kids.iter().map(|id| Object::Reference(*id)).collect();
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.kids.len() as i64,
            }),
        );
        self.document.compress();

        let mut output = Vec::new();
        self.document
            .save_to(&mut output)
            .map_err(|err| BlattwerkError::Unknown(format!("failed to serialise PDF: {err}")))?;
        debug!(pages = self.kids.len(), output_bytes = output.len(), "Output serialised");
        Ok(output)
    }
}

impl Default for OutputDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies pages from one source document into an [`OutputDocument`].
///
/// Objects shared between pages (fonts, images, resource dictionaries) are
/// copied once per copier; the id map also breaks reference cycles such as an
/// annotation's `/P` pointing back at its page.
pub struct PageCopier<'a> {
    source: &'a Document,
    copied: HashMap<ObjectId, ObjectId>,
}

impl<'a> PageCopier<'a> {
    pub fn new(source: &'a Document) -> Self {
        Self {
            source,
            copied: HashMap::new(),
        }
    }

    /// Copy the page `page_id` to the end of `target`. Returns the new page id.
    pub fn copy_page(&mut self, target: &mut OutputDocument, page_id: ObjectId) -> Result<ObjectId> {
        let source = self.source;
        let page = source
            .get_dictionary(page_id)
            .map_err(|err| BlattwerkError::Unknown(format!("cannot read page {page_id:?}: {err}")))?;

        // Registered up front so annotations pointing back at the page
        // resolve to the copy.
        let new_id = target.document.new_object_id();
        self.copied.insert(page_id, new_id);

        let mut copy = Dictionary::new();
        for (key, value) in page.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.copy_object(&mut target.document, value)?);
        }

        // The new page no longer sits under the old ancestors; pull down
        // anything it inherited from them.
        for key in INHERITABLE_KEYS {
            if !copy.has(key) {
                if let Some(value) = pages::inherited_attribute(source, page_id, key) {
                    copy.set(key.to_vec(), self.copy_object(&mut target.document, &value)?);
                }
            }
        }

        target.insert_page(new_id, copy);
        Ok(new_id)
    }

    fn copy_object(&mut self, target: &mut Document, object: &Object) -> Result<Object> {
        match object {
            Object::Reference(id) => self.copy_reference(target, *id),
            Object::Array(items) => items
                .iter()
                .map(|item| self.copy_object(target, item))
                .collect::<Result<Vec<_>>>()
                .map(Object::Array),
            Object::Dictionary(dict) => self.copy_dictionary(target, dict).map(Object::Dictionary),
            Object::Stream(stream) => {
                let dict = self.copy_dictionary(target, &stream.dict)?;
                Ok(Object::Stream(Stream::new(dict, stream.content.clone())))
            }
            other => Ok(other.clone()),
        }
    }

    fn copy_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Result<Dictionary> {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            // Parent links point into trees the output does not carry over.
            if key.as_slice() == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.copy_object(target, value)?);
        }
        Ok(copy)
    }

    fn copy_reference(&mut self, target: &mut Document, id: ObjectId) -> Result<Object> {
        if let Some(existing) = self.copied.get(&id) {
            return Ok(Object::Reference(*existing));
        }

        let source = self.source;
        let referenced = match source.get_object(id) {
            Ok(object) => object,
            Err(err) => {
                warn!(?id, %err, "Dangling reference replaced with null");
                return Ok(Object::Null);
            }
        };

        // Reserve the id before descending so cycles resolve to it.
        let new_id = target.new_object_id();
        self.copied.insert(id, new_id);
        let copy = self.copy_object(target, referenced)?;
        target.objects.insert(new_id, copy);
        Ok(Object::Reference(new_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn empty_output_is_a_valid_pdf() {
        let bytes = OutputDocument::new().finish().unwrap();
        assert_eq!(fixtures::page_count(&bytes), 0);
    }

    #[test]
    fn copies_pages_in_requested_order() {
        let source = fixtures::load(&fixtures::sized_pdf(&[(100, 100), (200, 200), (300, 300)]));
        let ids = pages::page_ids(&source);

        let mut output = OutputDocument::new();
        let mut copier = PageCopier::new(&source);
        copier.copy_page(&mut output, ids[2]).unwrap();
        copier.copy_page(&mut output, ids[0]).unwrap();
        let bytes = output.finish().unwrap();

        assert_eq!(fixtures::page_sizes(&bytes), vec![(300.0, 300.0), (100.0, 100.0)]);
    }

    #[test]
    fn inherited_media_box_survives_copy() {
        let source = fixtures::load(&fixtures::inherited_media_box_pdf());
        let ids = pages::page_ids(&source);

        let mut output = OutputDocument::new();
        PageCopier::new(&source).copy_page(&mut output, ids[1]).unwrap();
        let bytes = output.finish().unwrap();

        assert_eq!(fixtures::page_sizes(&bytes), vec![(420.0, 595.0)]);
    }

    #[test]
    fn shared_resources_are_copied_once() {
        let source = fixtures::load(&fixtures::pdf(4));
        let ids = pages::page_ids(&source);

        let mut output = OutputDocument::new();
        let mut copier = PageCopier::new(&source);
        for id in &ids {
            copier.copy_page(&mut output, *id).unwrap();
        }
        let bytes = output.finish().unwrap();

        let doc = fixtures::load(&bytes);
        let fonts = doc
            .objects
            .values()
            .filter(|object| {
                object
                    .as_dict()
                    .ok()
                    .and_then(|dict| dict.get(b"Type").ok())
                    .and_then(|ty| ty.as_name().ok())
                    == Some(b"Font".as_slice())
            })
            .count();
        assert_eq!(fonts, 1);
    }

    #[test]
    fn back_references_do_not_recurse_forever() {
        let mut source = fixtures::load(&fixtures::pdf(1));
        let page_id = pages::page_ids(&source)[0];
        let annot_id = source.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Text",
            "P" => page_id,
        });
        source
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .unwrap()
            .set("Annots", vec![Object::Reference(annot_id)]);

        let mut output = OutputDocument::new();
        let new_page = PageCopier::new(&source).copy_page(&mut output, page_id).unwrap();
        assert_eq!(output.page_count(), 1);

        let bytes = output.finish().unwrap();
        let doc = fixtures::load(&bytes);
        let copied_page = pages::page_ids(&doc)[0];
        assert_eq!(copied_page, new_page);
        let annots = doc.get_dictionary(copied_page).unwrap().get(b"Annots").unwrap();
        let annot_ref = annots.as_array().unwrap()[0].as_reference().unwrap();
        let back = doc.get_dictionary(annot_ref).unwrap().get(b"P").unwrap();
        assert_eq!(back.as_reference().unwrap(), copied_page);
    }

    #[test]
    fn rotation_is_written() {
        let source = fixtures::load(&fixtures::pdf(1));
        let mut output = OutputDocument::new();
        let id = PageCopier::new(&source)
            .copy_page(&mut output, pages::page_ids(&source)[0])
            .unwrap();
        output.set_rotation(id, 270).unwrap();
        let bytes = output.finish().unwrap();
        assert_eq!(fixtures::page_rotations(&bytes), vec![Some(270)]);
    }
}
