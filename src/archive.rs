//! The in-memory archive: ordered entries, the archive comment and the settings that apply
//! to both.

use std::fmt;
use std::io;
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use crate::compression::CompressionMethod;
use crate::path::canonicalize;
use crate::read::{self, Config, EntryOrder};
use crate::result::{ZipError, ZipResult};
use crate::types::ZipEntry;

/// Identifies an entry either by name or by position.
///
/// Every method that takes one accepts a `&str`, a `usize` or a `&ZipEntry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySelector<'a> {
    Name(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for EntrySelector<'a> {
    fn from(name: &'a str) -> Self {
        EntrySelector::Name(name)
    }
}

impl<'a> From<&'a String> for EntrySelector<'a> {
    fn from(name: &'a String) -> Self {
        EntrySelector::Name(name)
    }
}

impl<'a> From<&'a ZipEntry> for EntrySelector<'a> {
    fn from(entry: &'a ZipEntry) -> Self {
        EntrySelector::Name(entry.name())
    }
}

impl From<usize> for EntrySelector<'_> {
    fn from(index: usize) -> Self {
        EntrySelector::Index(index)
    }
}

impl fmt::Display for EntrySelector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntrySelector::Name(name) => f.write_str(name),
            EntrySelector::Index(index) => write!(f, "#{index}"),
        }
    }
}

/// A ZIP archive held in memory.
///
/// Entries read from an existing archive keep pointing into its bytes and are only
/// decompressed when read. Writing always rebuilds a complete archive; entries that were not
/// touched are copied over as they are.
///
/// ```
/// use zipkit::ZipArchive;
///
/// let mut archive = ZipArchive::new();
/// archive.add_file("docs/readme.txt", &b"hello"[..])?;
/// let bytes = archive.to_bytes()?;
///
/// let archive = ZipArchive::from_bytes(bytes)?;
/// assert_eq!(archive.read_to_string("docs/readme.txt", None)?, "hello");
/// # Ok::<(), zipkit::result::ZipError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct ZipArchive {
    pub(crate) entries: IndexMap<Box<str>, ZipEntry>,
    pub(crate) comment: Box<str>,
    pub(crate) config: Config,
}

impl ZipArchive {
    /// An empty archive with the default [`Config`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            entries: IndexMap::new(),
            comment: Box::default(),
            config,
        }
    }

    /// Read an archive from its bytes.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> ZipResult<Self> {
        Self::from_bytes_with_config(bytes, Config::default())
    }

    pub fn from_bytes_with_config(bytes: impl Into<Arc<[u8]>>, config: Config) -> ZipResult<Self> {
        let buffer = bytes.into();
        debug!("reading archive of {} bytes", buffer.len());
        let parsed = read::parse_archive(buffer, &config)?;
        Ok(Self {
            entries: parsed.entries,
            comment: parsed.comment,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of entries, directories included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in archive order.
    pub fn entries(&self) -> impl Iterator<Item = &ZipEntry> {
        self.entries.values()
    }

    /// Entry names in archive order.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|name| &**name)
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn set_comment(&mut self, comment: impl Into<Box<str>>) {
        self.comment = comment.into();
    }

    fn index_of(&self, selector: EntrySelector<'_>) -> Option<usize> {
        match selector {
            EntrySelector::Name(name) => self.entries.get_index_of(name),
            EntrySelector::Index(index) => (index < self.entries.len()).then_some(index),
        }
    }

    fn require_index(&self, selector: EntrySelector<'_>) -> ZipResult<usize> {
        self.index_of(selector)
            .ok_or_else(|| ZipError::FileNotFound(selector.to_string().into()))
    }

    pub fn entry<'a>(&self, selector: impl Into<EntrySelector<'a>>) -> Option<&ZipEntry> {
        let index = self.index_of(selector.into())?;
        self.entries.get_index(index).map(|(_, entry)| entry)
    }

    /// Mutable access to an entry, e.g. to change its comment, compression or password.
    pub fn entry_mut<'a>(
        &mut self,
        selector: impl Into<EntrySelector<'a>>,
    ) -> Option<&mut ZipEntry> {
        let index = self.index_of(selector.into())?;
        self.entries.get_index_mut(index).map(|(_, entry)| entry)
    }

    /// Entries below directory `dir`, at any depth. `dir` itself is not included.
    pub fn children<'a>(&self, dir: impl Into<EntrySelector<'a>>) -> Vec<&ZipEntry> {
        let Some(dir) = self.entry(dir) else {
            return Vec::new();
        };
        if !dir.is_dir() {
            return Vec::new();
        }
        let prefix = dir.name();
        self.entries
            .values()
            .filter(|entry| entry.name().len() > prefix.len() && entry.name().starts_with(prefix))
            .collect()
    }

    fn restore_order(&mut self) {
        if self.config.entry_order == EntryOrder::Sorted {
            self.entries.sort_unstable_keys();
        }
    }

    /// Add a file, or replace the content of the entry that already has this name.
    ///
    /// The name is canonicalized first, so `../x` is stored as `x`. The entry is compressed
    /// with [`Config::default_method`].
    pub fn add_file(
        &mut self,
        name: &str,
        contents: impl Into<Arc<[u8]>>,
    ) -> ZipResult<&mut ZipEntry> {
        let method = self.config.method_for_new_entries();
        self.insert(name, contents.into(), method)
    }

    /// Add an empty directory entry. A trailing `/` is added to the name if missing.
    pub fn add_directory(&mut self, name: &str) -> ZipResult<&mut ZipEntry> {
        let mut name = name.to_owned();
        if !name.ends_with(['/', '\\']) {
            name.push('/');
        }
        self.insert(&name, Arc::from(&[][..]), CompressionMethod::STORE)
    }

    fn insert(
        &mut self,
        name: &str,
        contents: Arc<[u8]>,
        method: CompressionMethod,
    ) -> ZipResult<&mut ZipEntry> {
        let canonical = canonicalize(name);
        if canonical.is_empty() {
            return Err(ZipError::PathEscape(name.into()));
        }
        if let Some(entry) = self.entries.get_mut(canonical.as_str()) {
            entry.set_contents(contents);
        } else {
            let entry = ZipEntry::new(&canonical, contents, method, &*self.config.name_codec);
            self.entries.insert(canonical.as_str().into(), entry);
            self.restore_order();
        }
        self.entries
            .get_mut(canonical.as_str())
            .ok_or_else(|| ZipError::FileNotFound(canonical.into()))
    }

    /// Replace the content of an existing entry.
    pub fn update_file<'a>(
        &mut self,
        selector: impl Into<EntrySelector<'a>>,
        contents: impl Into<Arc<[u8]>>,
    ) -> ZipResult<()> {
        let index = self.require_index(selector.into())?;
        if let Some((_, entry)) = self.entries.get_index_mut(index) {
            entry.set_contents(contents.into());
        }
        Ok(())
    }

    /// Give an entry a new name, keeping its position.
    pub fn rename<'a>(
        &mut self,
        selector: impl Into<EntrySelector<'a>>,
        new_name: &str,
    ) -> ZipResult<()> {
        let index = self.require_index(selector.into())?;
        let canonical = canonicalize(new_name);
        if canonical.is_empty() {
            return Err(ZipError::PathEscape(new_name.into()));
        }
        match self.entries.get_index_of(canonical.as_str()) {
            Some(existing) if existing == index => return Ok(()),
            Some(_) => return Err(ZipError::DuplicateName(canonical.into())),
            None => (),
        }
        let Some((_, mut entry)) = self.entries.shift_remove_index(index) else {
            return Err(ZipError::FileNotFound(canonical.into()));
        };
        entry.name = canonical.as_str().into();
        entry.encode_text(&*self.config.name_codec);
        self.entries
            .shift_insert(index, canonical.into_boxed_str(), entry);
        self.restore_order();
        Ok(())
    }

    /// Remove an entry. Removing a directory also removes everything below it.
    ///
    /// Returns the number of entries removed.
    pub fn delete_file<'a>(&mut self, selector: impl Into<EntrySelector<'a>>) -> ZipResult<usize> {
        let index = self.require_index(selector.into())?;
        let Some((name, entry)) = self.entries.get_index(index) else {
            return Ok(0);
        };
        if !entry.is_dir() {
            self.entries.shift_remove_index(index);
            return Ok(1);
        }
        let prefix = name.clone();
        let before = self.entries.len();
        self.entries.retain(|name, _| !name.starts_with(&*prefix));
        Ok(before - self.entries.len())
    }

    /// Remove exactly one entry, even if it is a directory with children.
    pub fn delete_entry<'a>(
        &mut self,
        selector: impl Into<EntrySelector<'a>>,
    ) -> ZipResult<ZipEntry> {
        let selector = selector.into();
        let index = self.require_index(selector)?;
        self.entries
            .shift_remove_index(index)
            .map(|(_, entry)| entry)
            .ok_or_else(|| ZipError::FileNotFound(selector.to_string().into()))
    }

    /// The decompressed content of an entry.
    ///
    /// `password` is needed for encrypted entries read from an archive. The first successful
    /// read is cached in the entry and returned by later calls regardless of `password`.
    pub fn read<'a>(
        &self,
        selector: impl Into<EntrySelector<'a>>,
        password: Option<&[u8]>,
    ) -> ZipResult<Arc<[u8]>> {
        let selector = selector.into();
        let index = self.require_index(selector)?;
        let (_, entry) = self
            .entries
            .get_index(index)
            .ok_or_else(|| ZipError::FileNotFound(selector.to_string().into()))?;
        entry.contents(&self.config.codecs, password)
    }

    pub fn read_to_string<'a>(
        &self,
        selector: impl Into<EntrySelector<'a>>,
        password: Option<&[u8]>,
    ) -> ZipResult<String> {
        let contents = self.read(selector, password)?;
        String::from_utf8(contents.to_vec())
            .map_err(|e| ZipError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    /// Decode every entry and check its CRC-32, stopping at the first failure.
    pub fn test(&self, password: Option<&[u8]>) -> ZipResult<()> {
        for entry in self.entries.values().filter(|entry| entry.is_file()) {
            entry.contents(&self.config.codecs, password)?;
        }
        Ok(())
    }
}
