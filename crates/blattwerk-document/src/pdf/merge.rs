// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Merge — concatenate every page of two or more loaded documents.

use blattwerk_core::error::{BlattwerkError, Result};
use tracing::{debug, info, instrument};

use super::copy::{OutputDocument, PageCopier};
use super::loader::LoadedDocument;

/// Merge `documents` into one PDF: all pages of the first input, then all
/// pages of the second, and so on.
///
/// Fewer than two inputs is rejected with `Unsupported`. Nothing is returned
/// unless every page copies and the result serialises.
#[instrument(skip_all, fields(document_count = documents.len()))]
pub fn merge(documents: &[&LoadedDocument]) -> Result<Vec<u8>> {
    if documents.len() < 2 {
        return Err(BlattwerkError::Unsupported(format!(
            "merging needs at least two documents, got {}",
            documents.len()
        )));
    }

    let total_pages: usize = documents.iter().map(|doc| doc.page_count).sum();
    info!(total_pages, "Merging PDFs");

    let mut output = OutputDocument::new();
    for (index, loaded) in documents.iter().enumerate() {
        let mut copier = PageCopier::new(loaded.document());
        for page_id in loaded.page_ids() {
            copier.copy_page(&mut output, page_id)?;
        }
        debug!(input = index + 1, pages_so_far = output.page_count(), "Input appended");
    }

    let bytes = output.finish()?;
    debug!(output_bytes = bytes.len(), "Merge complete");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use blattwerk_core::error::ErrorKind;

    #[test]
    fn page_count_is_the_sum_of_inputs() {
        let a = fixtures::loaded("a.pdf", fixtures::pdf(2));
        let b = fixtures::loaded("b.pdf", fixtures::pdf(3));
        let c = fixtures::loaded("c.pdf", fixtures::pdf(1));

        let bytes = merge(&[&a, &b, &c]).unwrap();
        assert_eq!(fixtures::page_count(&bytes), 6);
    }

    #[test]
    fn inputs_keep_caller_order() {
        let small = fixtures::loaded("small.pdf", fixtures::sized_pdf(&[(100, 100), (110, 110)]));
        let large = fixtures::loaded("large.pdf", fixtures::sized_pdf(&[(500, 500)]));

        let bytes = merge(&[&large, &small]).unwrap();
        assert_eq!(
            fixtures::page_sizes(&bytes),
            vec![(500.0, 500.0), (100.0, 100.0), (110.0, 110.0)]
        );
    }

    #[test]
    fn same_document_twice_is_allowed() {
        let doc = fixtures::loaded("twice.pdf", fixtures::pdf(2));
        let bytes = merge(&[&doc, &doc]).unwrap();
        assert_eq!(fixtures::page_count(&bytes), 4);
    }

    #[test]
    fn single_input_is_unsupported() {
        let only = fixtures::loaded("only.pdf", fixtures::pdf(1));
        let err = merge(&[&only]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert_eq!(merge(&[]).unwrap_err().kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn inputs_are_not_modified() {
        let a = fixtures::loaded("a.pdf", fixtures::pdf(2));
        let b = fixtures::loaded("b.pdf", fixtures::pdf(2));
        merge(&[&a, &b]).unwrap();
        assert_eq!(a.page_ids().len(), 2);
        assert_eq!(b.document().get_pages().len(), 2);
    }
}
