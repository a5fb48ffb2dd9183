//! Dump parsing.
//!
//! The dump is either one JSON array of records or a JSON-lines stream of
//! records. The first non-whitespace byte decides which. The whole file is
//! parsed before anything downstream runs: a truncated or corrupt dump is an
//! error, never a shorter working set.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rse_core::DumpRecord;
use serde_jsonlines::JsonLinesReader;

use crate::error::DumpError;

/// Parse the dump at `path` on the blocking pool.
///
/// # Errors
///
/// Returns `DumpError` if the file cannot be read or is not a complete dump.
pub async fn load_dump(path: impl Into<PathBuf>) -> Result<Vec<DumpRecord>, DumpError> {
    let path = path.into();
    tokio::task::spawn_blocking(move || read_dump(&path)).await?
}

/// Parse the dump at `path`.
///
/// # Errors
///
/// Returns `DumpError` if the file cannot be read or is not a complete dump.
pub fn read_dump(path: &Path) -> Result<Vec<DumpRecord>, DumpError> {
    let file = File::open(path).map_err(|e| DumpError::io(path, e))?;
    let records = parse_dump(BufReader::new(file), path)?;
    tracing::info!(path = %path.display(), records = records.len(), "dump loaded");
    Ok(records)
}

/// Parse a dump from any buffered reader. `origin` only labels errors.
///
/// # Errors
///
/// Returns [`DumpError::Malformed`] for empty input, an unknown leading
/// byte, or any record that fails to parse.
pub fn parse_dump<R: BufRead>(mut reader: R, origin: &Path) -> Result<Vec<DumpRecord>, DumpError> {
    let malformed = |reason: String| DumpError::Malformed {
        path: origin.to_path_buf(),
        reason,
    };

    match first_significant_byte(&mut reader).map_err(|e| DumpError::io(origin, e))? {
        None => Err(malformed("empty dump".into())),
        Some(b'[') => serde_json::from_reader(reader).map_err(|e| malformed(e.to_string())),
        Some(b'{') => JsonLinesReader::new(reader)
            .read_all::<DumpRecord>()
            .enumerate()
            .map(|(index, record)| record.map_err(|e| malformed(format!("line {}: {e}", index + 1))))
            .collect(),
        Some(other) => Err(malformed(format!(
            "expected '[' or '{{', found {:?}",
            char::from(other)
        ))),
    }
}

/// Skip leading whitespace and return the next byte without consuming it.
fn first_significant_byte<R: BufRead>(reader: &mut R) -> std::io::Result<Option<u8>> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(None);
        }
        if let Some(pos) = buf.iter().position(|b| !b.is_ascii_whitespace()) {
            let byte = buf[pos];
            reader.consume(pos);
            return Ok(Some(byte));
        }
        let len = buf.len();
        reader.consume(len);
    }
}
