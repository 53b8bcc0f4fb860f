//! Page archive: encoded page images → one deflate-compressed zip.
//!
//! Entries are flat (no directories) and named `page_{NNN}.{ext}` with a
//! zero-padded 1-based page number. Entries are stored in the order they are
//! given, never re-sorted by name: an index wider than the padding would sort
//! out of page order.

use std::fs;
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use tracing::debug;
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Archive entry name for 1-based page `index`.
pub fn page_file_name(index: usize, width: usize, extension: &str) -> String {
    format!("page_{index:0width$}.{extension}")
}

/// Write `entries` (name, bytes) into a zip on `writer`, in the given order.
pub fn pack_into<W, N, B>(writer: W, entries: impl IntoIterator<Item = (N, B)>) -> ZipResult<W>
where
    W: Write + Seek,
    N: Into<String>,
    B: AsRef<[u8]>,
{
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);
    for (name, bytes) in entries {
        let name: String = name.into();
        zip.start_file(name, options)?;
        zip.write_all(bytes.as_ref())?;
    }
    zip.finish()
}

/// In-memory variant of [`pack_into`].
pub fn pack<N, B>(entries: impl IntoIterator<Item = (N, B)>) -> ZipResult<Vec<u8>>
where
    N: Into<String>,
    B: AsRef<[u8]>,
{
    Ok(pack_into(Cursor::new(Vec::new()), entries)?.into_inner())
}

/// Archive the files at `entries` (name, path), in the given order.
///
/// Returns the number of entries written.
pub fn pack_files<W, P>(
    writer: W,
    entries: impl IntoIterator<Item = (String, P)>,
) -> ZipResult<(W, usize)>
where
    W: Write + Seek,
    P: AsRef<Path>,
{
    let mut contents = Vec::new();
    for (name, path) in entries {
        contents.push((name, fs::read(path)?));
    }
    let count = contents.len();
    let writer = pack_into(writer, contents)?;
    debug!("Packed {} entries", count);
    Ok((writer, count))
}
