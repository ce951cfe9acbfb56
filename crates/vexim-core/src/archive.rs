// ── Archive store ──
//
// A gzip-compressed tarball of named JSON documents, each shaped
// `{"configuration": ...}`. Documents keep insertion order so an export
// writes them in phase order and a re-import reads them back unchanged.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use indexmap::IndexMap;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::CoreError;

/// Default archive file name.
pub const DEFAULT_ARCHIVE: &str = "config_archive.tar.gz";

/// In-memory view of an export archive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Archive {
    documents: IndexMap<String, Value>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a `.tar.gz` archive from disk.
    pub fn read(path: &Path) -> Result<Self, CoreError> {
        let file = File::open(path).map_err(|e| CoreError::Archive {
            message: format!("cannot open {}: {e}", path.display()),
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Decode a gzip-compressed tar stream.
    pub fn from_reader(reader: impl Read) -> Result<Self, CoreError> {
        let mut tar = tar::Archive::new(GzDecoder::new(reader));
        let mut documents = IndexMap::new();

        for entry in tar.entries()? {
            let mut entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let path = entry.path()?;
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
                return Err(CoreError::Archive {
                    message: format!("unsupported entry name: {}", path.display()),
                });
            };

            let mut raw = Vec::new();
            entry.read_to_end(&mut raw)?;
            let document: Value = serde_json::from_slice(&raw).map_err(|e| CoreError::Archive {
                message: format!("{name} is not valid JSON: {e}"),
            })?;
            debug!(document = %name, bytes = raw.len(), "read archive document");
            documents.insert(name, document);
        }

        Ok(Self { documents })
    }

    /// Write the archive to disk as `.tar.gz`.
    pub fn write(&self, path: &Path) -> Result<(), CoreError> {
        let file = File::create(path).map_err(|e| CoreError::Archive {
            message: format!("cannot create {}: {e}", path.display()),
        })?;
        let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for (name, document) in &self.documents {
            let bytes = serde_json::to_vec(document)?;
            let mut header = tar::Header::new_gnu();
            header.set_size(bytes.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, bytes.as_slice())?;
            debug!(document = %name, bytes = bytes.len(), "wrote archive document");
        }

        builder.into_inner()?.finish()?;
        Ok(())
    }

    /// Store `configuration` under `name`, wrapped as `{"configuration": ...}`.
    pub fn insert(&mut self, name: impl Into<String>, configuration: Value) {
        self.documents
            .insert(name.into(), json!({ "configuration": configuration }));
    }

    /// The full document, if present.
    pub fn document(&self, name: &str) -> Option<&Value> {
        self.documents.get(name)
    }

    /// The `configuration` member of a document, if present.
    pub fn configuration(&self, name: &str) -> Option<&Value> {
        self.documents.get(name).and_then(|d| d.get("configuration"))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
