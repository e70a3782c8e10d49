//! Types for reading ZIP archives

use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use crate::result::ZipResult;
use crate::types::ZipEntry;

mod config;
pub(crate) mod directory;
pub mod locator;

pub use config::*;

/// Everything read from an archive buffer.
pub(crate) struct ParsedArchive {
    pub(crate) entries: IndexMap<Box<str>, ZipEntry>,
    pub(crate) comment: Box<str>,
}

/// Parse the central directory of `buffer`. Entry data is left in place and decoded on
/// demand.
pub(crate) fn parse_archive(buffer: Arc<[u8]>, config: &Config) -> ZipResult<ParsedArchive> {
    let info = locator::locate(&buffer)?;
    debug!(
        "central directory: {} entries at {} ({} bytes), zip64: {}",
        info.number_of_files, info.directory_start, info.directory_size, info.is_zip64
    );
    let mut entries = directory::read_entries(&buffer, &info, config)?;
    if config.entry_order == EntryOrder::Sorted {
        entries.sort_unstable_keys();
    }
    // The archive comment has no flag of its own; it is UTF-8 only if it decodes as such.
    let comment = match std::str::from_utf8(&info.comment) {
        Ok(comment) => comment.to_owned(),
        Err(_) => config.name_codec.decode(&info.comment),
    };
    Ok(ParsedArchive {
        entries,
        comment: comment.into(),
    })
}
