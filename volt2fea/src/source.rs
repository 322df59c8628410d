//! Getting VOLT source text out of fonts and files.

use std::{ffi::OsStr, path::Path};

use log::debug;
use write_fonts::{
    read::{FileRef, FontRef, ReadError},
    types::Tag,
};

use crate::error::Error;

/// The private table VOLT stores its project source in.
pub const TSIV: Tag = Tag::new(b"TSIV");

/// Convert CR and CRLF line endings to LF.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Decode raw source bytes as UTF-8, with normalized line endings.
pub fn decode(bytes: &[u8]) -> Result<String, Error> {
    let text = std::str::from_utf8(bytes)?;
    Ok(normalize_newlines(text))
}

/// The decoded `TSIV` table of a font, or of a member of a collection.
pub fn read_tsiv(data: &[u8], index: Option<u32>) -> Result<String, Error> {
    let font = get_font(data, index)?;
    let table = font.table_data(TSIV).ok_or(Error::MissingTable(TSIV))?;
    debug!("TSIV table is {} bytes", table.len());
    decode(table.as_ref())
}

/// Read source from `path`.
///
/// `.vtp` files are VOLT project exports and are read as text; anything else is
/// treated as a font.
pub fn load(path: &Path, index: Option<u32>) -> Result<String, Error> {
    let data = std::fs::read(path).map_err(|inner| Error::Load {
        path: path.to_path_buf(),
        inner,
    })?;
    let is_project = path
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("vtp"));
    if is_project {
        debug!("reading {} as a VOLT project", path.display());
        decode(&data)
    } else {
        read_tsiv(&data, index)
    }
}

fn get_font(bytes: &[u8], idx: Option<u32>) -> Result<FontRef, Error> {
    let font = FileRef::new(bytes).map_err(Error::FontRead)?;
    match (font, idx.unwrap_or(0)) {
        (FileRef::Font(font), 0) => Ok(font),
        (FileRef::Font(_), other) => Err(Error::FontRead(ReadError::InvalidCollectionIndex(other))),
        (FileRef::Collection(collection), idx) => collection.get(idx).map_err(Error::FontRead),
    }
}
