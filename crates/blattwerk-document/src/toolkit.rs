// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Toolkit façade — the entry point hosts use. Wraps each operation with
// timing, download naming and activity reporting.

use std::time::{Duration, Instant};

use blattwerk_core::config::ToolkitConfig;
use blattwerk_core::error::Result;
use blattwerk_core::naming;
use blattwerk_core::presets;
use blattwerk_core::types::{
    Activity, EditablePage, ExportResult, ImageAsset, ImageLayout, Source, Tool,
};
use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::compress::{Compressor, PageRenderer};
use crate::image::ingest;
use crate::pdf::edit::{self, EditSession};
use crate::pdf::loader::{DocumentLoader, LoadedDocument, PasswordPrompt};
use crate::pdf::{merge, split, writer};
use crate::source;

// -- Activity sink -------------------------------------------------------------

/// Receives a copy of every export the toolkit produces.
pub trait ActivitySink {
    fn record(&mut self, result: &ExportResult);
}

/// Keeps every result in memory.
impl ActivitySink for Vec<ExportResult> {
    fn record(&mut self, result: &ExportResult) {
        self.push(result.clone());
    }
}

/// Discards everything.
impl ActivitySink for () {
    fn record(&mut self, _result: &ExportResult) {}
}

// -- Toolkit ---------------------------------------------------------------------

pub struct Toolkit<S = ()> {
    config: ToolkitConfig,
    loader: DocumentLoader,
    sink: S,
}

impl Toolkit<()> {
    pub fn new(config: ToolkitConfig) -> Self {
        Self::with_sink(config, ())
    }
}

impl Default for Toolkit<()> {
    fn default() -> Self {
        Self::new(ToolkitConfig::default())
    }
}

impl<S: ActivitySink> Toolkit<S> {
    pub fn with_sink(config: ToolkitConfig, sink: S) -> Self {
        Self {
            loader: DocumentLoader::with_config(config.clone()),
            config,
            sink,
        }
    }

    pub fn config(&self) -> &ToolkitConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    // -- Input -----------------------------------------------------------------

    pub fn ingest(
        &self,
        name: &str,
        bytes: Vec<u8>,
        last_modified: Option<DateTime<Utc>>,
    ) -> Result<Source> {
        source::ingest(name, bytes, last_modified, &self.config)
    }

    pub fn load(
        &self,
        source: &mut Source,
        prompt: Option<&mut dyn PasswordPrompt>,
    ) -> Result<LoadedDocument> {
        self.loader.load(source, prompt)
    }

    pub fn ingest_image(&self, name: &str, bytes: &[u8], mime: Option<&str>) -> Result<ImageAsset> {
        ingest::ingest_image(name, bytes, mime)
    }

    // -- Operations ------------------------------------------------------------

    #[instrument(skip_all, fields(document_count = documents.len()))]
    pub fn merge(&mut self, documents: &[&LoadedDocument]) -> Result<ExportResult> {
        let started = Instant::now();
        let bytes = merge::merge(documents)?;
        let base = documents.first().map(|doc| doc.name.as_str()).unwrap_or("merged");
        let detail = format!(
            "{} documents, {} pages",
            documents.len(),
            documents.iter().map(|doc| doc.page_count).sum::<usize>()
        );
        Ok(self.finish(Export {
            tool: Tool::Merge,
            operation: "merged",
            base,
            bytes,
            ext: "pdf",
            source_count: documents.len(),
            detail: Some(detail),
            warnings: Vec::new(),
            elapsed: started.elapsed(),
        }))
    }

    #[instrument(skip_all, fields(document = %document.id))]
    pub fn extract(&mut self, document: &LoadedDocument, page_numbers: &[f64]) -> Result<ExportResult> {
        let started = Instant::now();
        let extraction = split::extract(document, page_numbers)?;
        Ok(self.finish(Export {
            tool: Tool::Split,
            operation: "extract",
            base: &document.name,
            bytes: extraction.bytes,
            ext: "pdf",
            source_count: 1,
            detail: Some(format!("{} of {} pages", extraction.pages.len(), document.page_count)),
            warnings: Vec::new(),
            elapsed: started.elapsed(),
        }))
    }

    /// Extract pages chosen with selection text such as `"1-3, 5"`.
    pub fn extract_selection(&mut self, document: &LoadedDocument, selection: &str) -> Result<ExportResult> {
        let pages: Vec<f64> = split::parse_page_selection(selection)?
            .into_iter()
            .map(|page| page as f64)
            .collect();
        self.extract(document, &pages)
    }

    /// One export per chunk, in order.
    #[instrument(skip_all, fields(document = %document.id, size = size))]
    pub fn chunk(&mut self, document: &LoadedDocument, size: i64) -> Result<Vec<ExportResult>> {
        let chunks = split::chunk(document, size)?;
        let results = chunks
            .into_iter()
            .map(|chunk| {
                let operation = format!("part{}", chunk.index + 1);
                self.finish(Export {
                    tool: Tool::Split,
                    operation: &operation,
                    base: &document.name,
                    bytes: chunk.bytes,
                    ext: "pdf",
                    source_count: 1,
                    detail: Some(format!("pages {}-{}", chunk.start_page, chunk.end_page)),
                    warnings: Vec::new(),
                    elapsed: chunk.elapsed,
                })
            })
            .collect();
        Ok(results)
    }

    pub fn edit_session(&self, document: &LoadedDocument) -> EditSession {
        EditSession::new(document, self.config.undo_capacity)
    }

    #[instrument(skip_all, fields(document = %document.id))]
    pub fn apply_edits(&mut self, document: &LoadedDocument, pages: &[EditablePage]) -> Result<ExportResult> {
        let started = Instant::now();
        let bytes = edit::apply(document, pages)?;
        let kept = pages.iter().filter(|page| !page.is_deleted).count();
        Ok(self.finish(Export {
            tool: Tool::Edit,
            operation: "edited",
            base: &document.name,
            bytes,
            ext: "pdf",
            source_count: 1,
            detail: Some(format!("{kept} of {} pages kept", document.page_count)),
            warnings: Vec::new(),
            elapsed: started.elapsed(),
        }))
    }

    /// Assemble images into a PDF; `layout` defaults to the configured one.
    #[instrument(skip_all, fields(image_count = assets.len()))]
    pub fn images_to_pdf(&mut self, assets: &[ImageAsset], layout: Option<&ImageLayout>) -> Result<ExportResult> {
        let started = Instant::now();
        let layout = layout.copied().unwrap_or(self.config.image_layout);
        let base = assets.first().map(|asset| asset.name.as_str()).unwrap_or("images");
        let bytes = writer::images_to_pdf(assets, &layout, &naming::sanitize_base_name(base))?;
        Ok(self.finish(Export {
            tool: Tool::ImagesToPdf,
            operation: "images",
            base,
            bytes,
            ext: "pdf",
            source_count: assets.len(),
            detail: Some(format!("{} pages", assets.len())),
            warnings: Vec::new(),
            elapsed: started.elapsed(),
        }))
    }

    /// Compress with `preset_id`, or the configured default preset.
    #[instrument(skip_all, fields(document = %document.id))]
    pub fn compress<R: PageRenderer>(
        &mut self,
        document: &LoadedDocument,
        preset_id: Option<&str>,
        renderer: R,
    ) -> Result<ExportResult> {
        let started = Instant::now();
        let preset_id = preset_id.unwrap_or(&self.config.default_preset).to_string();
        let outcome = Compressor::new(renderer).compress(document, &preset_id)?;
        let detail = format!(
            "{preset_id}: {} -> {} bytes ({:.1}% saved)",
            outcome.original_size,
            outcome.compressed_size,
            outcome.savings_percent()
        );
        Ok(self.finish(Export {
            tool: Tool::Compress,
            operation: "compressed",
            base: &document.name,
            bytes: outcome.bytes,
            ext: "pdf",
            source_count: 1,
            detail: Some(detail),
            warnings: outcome.warnings,
            elapsed: started.elapsed(),
        }))
    }

    /// Pre-run size estimate for the compress screen.
    pub fn estimate_compressed_size(&self, original_size: u64, preset_id: Option<&str>) -> Result<u64> {
        presets::estimate_compressed_size(original_size, preset_id.unwrap_or(&self.config.default_preset))
    }

    fn finish(&mut self, export: Export<'_>) -> ExportResult {
        let completed_at = Utc::now();
        let result = ExportResult {
            size: export.bytes.len() as u64,
            download_name: naming::download_name(export.base, export.operation, completed_at, export.ext),
            duration_ms: export.elapsed.as_millis() as u64,
            warnings: export.warnings,
            activity: Activity {
                tool: export.tool,
                operation: export.operation.to_string(),
                source_count: export.source_count,
                detail: export.detail,
                completed_at,
            },
            bytes: export.bytes,
        };
        info!(
            tool = result.activity.tool.label(),
            download_name = %result.download_name,
            size = result.size,
            duration_ms = result.duration_ms,
            "Export ready"
        );
        self.sink.record(&result);
        result
    }
}

struct Export<'a> {
    tool: Tool,
    operation: &'a str,
    base: &'a str,
    bytes: Vec<u8>,
    ext: &'a str,
    source_count: usize,
    detail: Option<String>,
    warnings: Vec<String>,
    elapsed: Duration,
}
