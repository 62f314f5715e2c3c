// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document loader — parse a `Source` into a `LoadedDocument`, retrying with a
// user-supplied password until the document opens or the user gives up.
//
// The retry loop is an explicit state machine:
//
//   Attempting ──ok──────────────────────────▶ Terminal(Success)
//       │ password failure
//       ▼
//   AwaitingPassword ──prompt gives password──▶ Attempting
//       │ prompt gives nothing
//       ▼
//   Terminal(Failed)

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use blattwerk_core::config::ToolkitConfig;
use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::types::{DocumentId, DocumentMetadata, Source, SourceId};
use lopdf::encryption::{DecryptionError, PasswordAlgorithm, decrypt_object};
use lopdf::xref::XrefEntry;
use lopdf::{
    Document, EncryptionState, Error as LopdfError, Object, ObjectId, ObjectStream, Reader,
};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::metadata;
use super::pages;

// ---------------------------------------------------------------------------
// Parser port
// ---------------------------------------------------------------------------

/// Raw failure signal from a parsing service, before it is mapped into the
/// closed error taxonomy.
#[derive(Debug, Error)]
pub enum ParseFailure {
    /// The security handler rejected the password (or the empty password).
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Parsed, but the content is still encrypted.
    #[error("document is encrypted")]
    Encrypted,

    /// The security handler or encryption revision is not implemented.
    #[error("unsupported encryption: {0}")]
    Unsupported(String),

    /// Header, cross-reference table, trailer or object syntax is broken.
    #[error("malformed document: {0}")]
    Format(String),

    /// The input ends before the structure it announces.
    #[error("unexpected end of data: {0}")]
    Truncated(String),

    /// A referenced object does not exist.
    #[error("missing object: {0}")]
    MissingObject(String),

    #[error("{0}")]
    Other(String),
}

/// A document-parsing service.
///
/// Parsers may consume their input, so every call receives an owned buffer.
pub trait DocumentParser {
    fn parse(
        &self,
        bytes: Vec<u8>,
        password: Option<&str>,
    ) -> std::result::Result<Document, ParseFailure>;
}

/// The default parser, backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfParser;

impl DocumentParser for LopdfParser {
    fn parse(
        &self,
        bytes: Vec<u8>,
        password: Option<&str>,
    ) -> std::result::Result<Document, ParseFailure> {
        let mut document =
            Document::load_mem(&bytes).map_err(|err| classify_lopdf_error(err, &bytes))?;

        // lopdf opens files protected only by an owner password on its own.
        if !document.is_encrypted() || document.encryption_state.is_some() {
            return Ok(document);
        }

        let Some(password) = password else {
            return Err(ParseFailure::Encrypted);
        };
        document
            .authenticate_password(password)
            .map_err(|err| classify_lopdf_error(err, &bytes))?;
        decrypt_objects(&mut document, &bytes, password)?;
        Ok(document)
    }
}

/// Read every object of an encrypted file again and decrypt it.
///
/// When a user password is set, `Document::load_mem` keeps only the
/// `/Encrypt` dictionary; the rest of the file is re-parsed here from `bytes`.
fn decrypt_objects(
    document: &mut Document,
    bytes: &[u8],
    password: &str,
) -> std::result::Result<(), ParseFailure> {
    let algorithm =
        PasswordAlgorithm::try_from(&*document).map_err(|err| classify_lopdf_error(err, bytes))?;
    let password = algorithm
        .sanitize_password(password)
        .map_err(|err| classify_lopdf_error(err.into(), bytes))?;
    let state = EncryptionState::decode(&*document, &password)
        .map_err(|err| classify_lopdf_error(err, bytes))?;
    let encrypt_id = document
        .trailer
        .get(b"Encrypt")
        .and_then(Object::as_reference)
        .map_err(|err| ParseFailure::Format(format!("/Encrypt is not a reference: {err}")))?;

    let start = bytes
        .windows(5)
        .position(|window| window == b"%PDF-")
        .unwrap_or(0);
    let mut reader = Reader {
        buffer: &bytes[start..],
        document: Document::new(),
        encryption_state: None,
        raw_objects: BTreeMap::new(),
    };
    reader.document.reference_table = document.reference_table.clone();

    let mut contained = Vec::new();
    for (&number, entry) in &reader.document.reference_table.entries {
        let XrefEntry::Normal { generation, .. } = *entry else {
            continue;
        };
        let id = (number, generation);
        if id == encrypt_id {
            continue;
        }

        let mut object = match reader.get_object(id, &mut HashSet::new()) {
            Ok(object) => object,
            Err(err) => {
                warn!(object = ?id, %err, "Unreadable object skipped during decryption");
                continue;
            }
        };
        if let Err(err) = decrypt_object(&state, id, &mut object) {
            warn!(object = ?id, %err, "Object could not be decrypted");
            continue;
        }
        if let Object::Stream(stream) = &mut object {
            if stream.dict.has_type(b"ObjStm") {
                if let Ok(object_stream) = ObjectStream::new(stream) {
                    contained.extend(object_stream.objects);
                }
            }
        }
        document.objects.insert(id, object);
    }
    for (id, object) in contained {
        document.objects.entry(id).or_insert(object);
    }

    document.trailer.remove(b"Encrypt");
    document.objects.remove(&encrypt_id);
    document.encryption_state = Some(state);
    debug!(objects = document.objects.len(), "Encrypted document decrypted");
    Ok(())
}

/// Classify a `lopdf` error by its variant.
///
/// Structural failures in a file that has a header but no `%%EOF` marker are
/// reported as truncation.
fn classify_lopdf_error(err: lopdf::Error, bytes: &[u8]) -> ParseFailure {
    let message = err.to_string();
    match err {
        LopdfError::Decryption(
            DecryptionError::UnsupportedEncryption
            | DecryptionError::UnsupportedVersion
            | DecryptionError::UnsupportedRevision,
        )
        | LopdfError::UnsupportedSecurityHandler(_) => ParseFailure::Unsupported(message),
        LopdfError::Decryption(_) => ParseFailure::Decryption(message),
        LopdfError::IO(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            ParseFailure::Truncated(message)
        }
        LopdfError::Parse(_) | LopdfError::Xref(_) if is_truncated(bytes) => {
            ParseFailure::Truncated(message)
        }
        LopdfError::Parse(_)
        | LopdfError::Xref(_)
        | LopdfError::InvalidOffset(_)
        | LopdfError::IndirectObject { .. }
        | LopdfError::ObjectIdMismatch
        | LopdfError::InvalidStream(_)
        | LopdfError::InvalidObjectStream(_)
        | LopdfError::Decompress(_)
        | LopdfError::ObjectType { .. }
        | LopdfError::DictType { .. }
        | LopdfError::ReferenceCycle(_)
        | LopdfError::ReferenceLimit => ParseFailure::Format(message),
        LopdfError::ObjectNotFound(_) | LopdfError::MissingXrefEntry | LopdfError::DictKey(_) => {
            ParseFailure::MissingObject(message)
        }
        _ => ParseFailure::Other(message),
    }
}

/// A PDF header with no end-of-file marker in the final kilobyte.
fn is_truncated(bytes: &[u8]) -> bool {
    let tail = &bytes[bytes.len().saturating_sub(1024)..];
    bytes.windows(5).take(1024).any(|window| window == b"%PDF-")
        && !tail.windows(5).any(|window| window == b"%%EOF")
}

// ---------------------------------------------------------------------------
// Password port
// ---------------------------------------------------------------------------

/// Why the loader is asking for a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordReason {
    Required,
    Incorrect,
}

/// Supplies passwords on demand. Returning `None` cancels loading.
pub trait PasswordPrompt {
    fn request(&mut self, reason: PasswordReason) -> Option<String>;
}

impl<F> PasswordPrompt for F
where
    F: FnMut(PasswordReason) -> Option<String>,
{
    fn request(&mut self, reason: PasswordReason) -> Option<String> {
        self(reason)
    }
}

// ---------------------------------------------------------------------------
// Loaded document
// ---------------------------------------------------------------------------

/// Owned parsed handle. Released explicitly with [`DocumentHandle::release`]
/// or when dropped.
#[derive(Debug)]
pub struct DocumentHandle {
    document: Document,
}

impl DocumentHandle {
    fn new(document: Document) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Release the parsed structure.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for DocumentHandle {
    fn drop(&mut self) {
        debug!(objects = self.document.objects.len(), "Parsed handle released");
    }
}

/// A parsed document plus its identifying data.
#[derive(Debug)]
pub struct LoadedDocument {
    pub source_id: SourceId,
    pub id: DocumentId,
    pub name: String,
    pub size: u64,
    pub page_count: usize,
    /// PDF header version, e.g. `"1.7"`.
    pub version_tag: String,
    pub retained_bytes: Arc<[u8]>,
    pub metadata: DocumentMetadata,
    handle: DocumentHandle,
}

impl LoadedDocument {
    pub fn document(&self) -> &Document {
        self.handle.document()
    }

    /// Page object ids in order; index 0 is page 1.
    pub fn page_ids(&self) -> Vec<ObjectId> {
        pages::page_ids(self.document())
    }

    /// Discard the document, releasing its parsed handle.
    pub fn release(self) {
        info!(document = %self.id, "Releasing document");
        self.handle.release();
    }
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

enum LoadState {
    Attempting { password: Option<String> },
    AwaitingPassword { reason: PasswordReason },
    Terminal(Result<(Document, Option<String>)>),
}

/// Loads sources through a parser, driving the password state machine.
pub struct DocumentLoader<P = LopdfParser> {
    parser: P,
    config: ToolkitConfig,
}

impl DocumentLoader<LopdfParser> {
    /// A loader using `lopdf` and the default configuration.
    pub fn new() -> Self {
        Self::with_config(ToolkitConfig::default())
    }

    pub fn with_config(config: ToolkitConfig) -> Self {
        Self {
            parser: LopdfParser,
            config,
        }
    }
}

impl Default for DocumentLoader<LopdfParser> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: DocumentParser> DocumentLoader<P> {
    pub fn with_parser(parser: P, config: ToolkitConfig) -> Self {
        Self { parser, config }
    }

    /// Parse `source`, asking `prompt` for a password as often as needed.
    ///
    /// With no prompt, the first password failure is terminal. On success
    /// the accepted password (if any) is recorded on the source.
    #[instrument(skip_all, fields(source = %source.id, name = %source.name, size = source.size))]
    pub fn load(
        &self,
        source: &mut Source,
        mut prompt: Option<&mut dyn PasswordPrompt>,
    ) -> Result<LoadedDocument> {
        let mut attempts = 0u32;
        let mut state = LoadState::Attempting {
            password: source.password.clone(),
        };

        let (document, accepted_password) = loop {
            state = match state {
                LoadState::Attempting { password } => {
                    attempts += 1;
                    debug!(attempts, with_password = password.is_some(), "Parse attempt");
                    // The parser gets its own copy; `source.bytes` is never handed over.
                    match self.parser.parse(source.fresh_copy(), password.as_deref()) {
                        Ok(document) => LoadState::Terminal(Ok((document, password))),
                        Err(failure) => match map_failure(failure, password.is_some()) {
                            BlattwerkError::PasswordRequired => LoadState::AwaitingPassword {
                                reason: PasswordReason::Required,
                            },
                            BlattwerkError::PasswordIncorrect => LoadState::AwaitingPassword {
                                reason: PasswordReason::Incorrect,
                            },
                            other => LoadState::Terminal(Err(other)),
                        },
                    }
                }

                LoadState::AwaitingPassword { reason } => {
                    let supplied = prompt
                        .as_mut()
                        .and_then(|prompt| prompt.request(reason))
                        .filter(|password| !password.is_empty());
                    match supplied {
                        Some(password) => LoadState::Attempting {
                            password: Some(password),
                        },
                        None => {
                            info!(?reason, "Password entry cancelled");
                            LoadState::Terminal(Err(match reason {
                                PasswordReason::Required => BlattwerkError::PasswordRequired,
                                PasswordReason::Incorrect => BlattwerkError::PasswordIncorrect,
                            }))
                        }
                    }
                }

                LoadState::Terminal(result) => break result?,
            };
        };

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(BlattwerkError::Corrupt(format!(
                "'{}' contains no readable pages",
                source.name
            )));
        }
        if page_count > self.config.max_pages {
            return Err(BlattwerkError::Unsupported(format!(
                "'{}' has {page_count} pages; the limit is {}",
                source.name, self.config.max_pages
            )));
        }

        if let Some(password) = accepted_password {
            source.record_password(password);
        }

        let metadata = metadata::read_metadata(&document);
        let version_tag = document.version.clone();

        info!(page_count, attempts, version = %version_tag, "Document loaded");

        Ok(LoadedDocument {
            source_id: source.id,
            id: DocumentId::new(),
            name: source.name.clone(),
            size: source.size,
            page_count,
            version_tag,
            retained_bytes: Arc::clone(&source.bytes),
            metadata,
            handle: DocumentHandle::new(document),
        })
    }
}

/// Map a parser failure signal into the closed error taxonomy.
fn map_failure(failure: ParseFailure, password_supplied: bool) -> BlattwerkError {
    match failure {
        ParseFailure::Decryption(_) | ParseFailure::Encrypted => {
            if password_supplied {
                BlattwerkError::PasswordIncorrect
            } else {
                BlattwerkError::PasswordRequired
            }
        }
        ParseFailure::Unsupported(message) => BlattwerkError::Unsupported(message),
        ParseFailure::Format(message) => BlattwerkError::Corrupt(message),
        ParseFailure::Truncated(message) => BlattwerkError::MissingData(message),
        ParseFailure::MissingObject(message) => BlattwerkError::NotFound(message),
        ParseFailure::Other(message) => {
            warn!(%message, "Unrecognised parser failure");
            BlattwerkError::Unknown(message)
        }
    }
}
