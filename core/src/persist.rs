//! Index snapshots on disk. `.bin` files hold bincode; anything else is
//! read and written as JSON `{term: {doc_id: [positions]}}`.

use crate::error::SearchError;
use crate::index::{PositionalIndex, Postings};
use crate::Result;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Bincode,
}

impl SnapshotFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("bin") => SnapshotFormat::Bincode,
            _ => SnapshotFormat::Json,
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write the snapshot to a sibling temp file, then rename it into place.
pub fn save_index<P: AsRef<Path>>(path: P, index: &PositionalIndex) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_path(path);
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        match SnapshotFormat::for_path(path) {
            SnapshotFormat::Json => serde_json::to_writer_pretty(&mut writer, index)?,
            SnapshotFormat::Bincode => bincode::serialize_into(&mut writer, index)?,
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    tracing::info!(path = %path.display(), terms = index.term_count(), "saved index snapshot");
    Ok(())
}

/// Decode a snapshot, check its invariants and compute corpus statistics.
pub fn load_index<P: AsRef<Path>>(path: P) -> Result<PositionalIndex> {
    let path = path.as_ref();
    let terms: BTreeMap<String, Postings> = match SnapshotFormat::for_path(path) {
        SnapshotFormat::Json => {
            let value: serde_json::Value = serde_json::from_reader(BufReader::new(File::open(path)?))?;
            serde_json::from_value(value).map_err(SearchError::bad_shape)?
        }
        SnapshotFormat::Bincode => {
            let mut buf = Vec::new();
            File::open(path)?.read_to_end(&mut buf)?;
            bincode::deserialize(&buf)?
        }
    };
    let index = PositionalIndex::from_terms(terms)?;
    tracing::info!(path = %path.display(), terms = index.term_count(), docs = index.doc_count(), "loaded index snapshot");
    Ok(index)
}
