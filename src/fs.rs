//! Reading archives from disk, adding local files, and extracting entries.
//!
//! Every extraction target goes through [`sanitize`], so an entry can never be written
//! outside the directory it is extracted to.

use std::ffi::OsStr;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::archive::{EntrySelector, ZipArchive};
use crate::path::{resolve, sanitize};
use crate::read::Config;
use crate::result::{ZipError, ZipResult};
use crate::types::ZipEntry;

fn non_utf8(path: &Path) -> ZipError {
    ZipError::Io(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{} is not valid UTF-8", path.display()),
    ))
}

/// `zip_dir` and `name` joined with a single `/`.
fn join_zip_path(zip_dir: &str, name: &str) -> String {
    let zip_dir = zip_dir.trim_end_matches(['/', '\\']);
    if zip_dir.is_empty() {
        name.to_owned()
    } else {
        format!("{zip_dir}/{name}")
    }
}

fn make_writable_dir_all<T: AsRef<Path>>(outpath: T) -> ZipResult<()> {
    fs::create_dir_all(outpath.as_ref())?;
    #[cfg(unix)]
    {
        // Dirs must be writable until all normal files are extracted
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(
            outpath.as_ref(),
            fs::Permissions::from_mode(0o700 | fs::metadata(outpath.as_ref())?.permissions().mode()),
        )?;
    }
    Ok(())
}

/// Copy timestamp and permissions of a local file onto an entry.
fn apply_metadata(entry: &mut ZipEntry, metadata: &fs::Metadata) {
    #[cfg(feature = "time")]
    if let Ok(modified) = metadata.modified() {
        if let Ok(time) = crate::types::DateTime::try_from(time::OffsetDateTime::from(modified)) {
            entry.set_last_modified(time);
        }
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        entry.set_unix_mode(metadata.permissions().mode());
    }
    #[cfg(not(any(unix, feature = "time")))]
    let _ = (entry, metadata);
}

/// Pending permission changes, applied once every file has been written.
#[derive(Debug, Default)]
struct Permissions {
    #[cfg(unix)]
    modes: Vec<(PathBuf, u32)>,
}

impl Permissions {
    #[allow(unused_variables)]
    fn push(&mut self, path: &Path, entry: &ZipEntry) {
        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            self.modes.push((path.to_path_buf(), mode));
        }
    }

    fn apply(self) -> ZipResult<()> {
        #[cfg(unix)]
        {
            use std::cmp::Reverse;
            use std::os::unix::fs::PermissionsExt;

            let mut modes = self.modes;
            // Ensure we update children's permissions before making a parent unwritable
            modes.sort_by_key(|(path, _)| Reverse(path.clone()));
            for (path, mode) in modes {
                fs::set_permissions(&path, fs::Permissions::from_mode(mode & 0o7777))?;
            }
        }
        Ok(())
    }
}

impl ZipArchive {
    /// Read the archive at `path`.
    pub fn open(path: impl AsRef<Path>) -> ZipResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> ZipResult<Self> {
        let path = path.as_ref();
        debug!("opening {}", path.display());
        let bytes = fs::read(path)?;
        Self::from_bytes_with_config(bytes, config)
    }

    /// Write the archive to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> ZipResult<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        fs::write(path, &bytes)?;
        debug!("saved {} entries to {}", self.len(), path.display());
        Ok(())
    }

    /// Add the local file at `path` under directory `zip_dir` of the archive.
    ///
    /// The entry is named `zip_name` if given, after the file otherwise. Its modification time
    /// and, on Unix, its permissions are taken from the file.
    pub fn add_local_file(
        &mut self,
        path: impl AsRef<Path>,
        zip_dir: &str,
        zip_name: Option<&str>,
    ) -> ZipResult<&mut ZipEntry> {
        let path = path.as_ref();
        let file_name = match zip_name {
            Some(name) => name,
            None => path
                .file_name()
                .and_then(OsStr::to_str)
                .ok_or_else(|| non_utf8(path))?,
        };
        let name = join_zip_path(zip_dir, file_name);
        let metadata = fs::metadata(path)?;
        let contents = fs::read(path)?;
        let entry = self.add_file(&name, contents)?;
        apply_metadata(entry, &metadata);
        Ok(entry)
    }

    /// Add everything below the local directory `path` under `zip_dir`, in file name order.
    ///
    /// `filter` sees each path relative to `path`, `/`-separated, and decides whether it is
    /// added. Returns the number of entries added.
    pub fn add_local_folder(
        &mut self,
        path: impl AsRef<Path>,
        zip_dir: &str,
        mut filter: impl FnMut(&str) -> bool,
    ) -> ZipResult<usize> {
        let root = path.as_ref();
        let mut added = 0;
        for item in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let item = item.map_err(io::Error::from)?;
            let relative = item.path().strip_prefix(root).unwrap_or(item.path());
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_str().ok_or_else(|| non_utf8(item.path())))
                .collect::<ZipResult<Vec<_>>>()?
                .join("/");
            if !filter(&relative) {
                continue;
            }
            let name = join_zip_path(zip_dir, &relative);
            if item.file_type().is_dir() {
                let metadata = item.metadata().map_err(io::Error::from)?;
                let entry = self.add_directory(&name)?;
                apply_metadata(entry, &metadata);
            } else if item.file_type().is_file() {
                self.add_local_file(item.path(), "", Some(&name))?;
            } else {
                debug!("skipping {}: not a regular file", item.path().display());
                continue;
            }
            added += 1;
        }
        Ok(added)
    }

    /// Write one entry below `target`.
    ///
    /// With `maintain_path` the entry's full name is recreated under `target`; otherwise only
    /// its file name is used. A directory entry is extracted together with its children.
    /// Existing files are left alone unless `overwrite` is set. Returns the number of files
    /// written.
    pub fn extract_entry_to<'a>(
        &self,
        selector: impl Into<EntrySelector<'a>>,
        target: impl AsRef<Path>,
        maintain_path: bool,
        overwrite: bool,
        password: Option<&[u8]>,
    ) -> ZipResult<usize> {
        let selector = selector.into();
        let target = target.as_ref();
        let entry = self
            .entry(selector)
            .ok_or_else(|| ZipError::FileNotFound(selector.to_string().into()))?;
        let mut permissions = Permissions::default();

        let written = if entry.is_dir() {
            let mut written = 0;
            for child in self.children(entry) {
                let name = if maintain_path {
                    child.name()
                } else {
                    &child.name()[entry.name().len()..]
                };
                written +=
                    self.extract_one(child, name, target, overwrite, password, &mut permissions)?;
            }
            if maintain_path {
                make_writable_dir_all(sanitize(target, entry.name())?)?;
            }
            written
        } else {
            let name = if maintain_path {
                entry.name()
            } else {
                entry.name().rsplit('/').next().unwrap_or_default()
            };
            self.extract_one(entry, name, target, overwrite, password, &mut permissions)?
        };
        permissions.apply()?;
        Ok(written)
    }

    /// Extract every entry below `target`, keeping the archive's directory structure.
    ///
    /// Returns the number of files written.
    pub fn extract_all_to(
        &self,
        target: impl AsRef<Path>,
        overwrite: bool,
        password: Option<&[u8]>,
    ) -> ZipResult<usize> {
        let target = target.as_ref();
        let mut permissions = Permissions::default();
        let mut written = 0;
        for entry in self.entries() {
            written +=
                self.extract_one(entry, entry.name(), target, overwrite, password, &mut permissions)?;
        }
        permissions.apply()?;
        debug!("extracted {written} files to {}", target.display());
        Ok(written)
    }

    fn extract_one(
        &self,
        entry: &ZipEntry,
        name: &str,
        target: &Path,
        overwrite: bool,
        password: Option<&[u8]>,
        permissions: &mut Permissions,
    ) -> ZipResult<usize> {
        let outpath = sanitize(target, name)?;
        if entry.is_dir() {
            make_writable_dir_all(&outpath)?;
            return Ok(0);
        }
        // Only a directory can stand for the target itself.
        if outpath == resolve(target)? {
            return Err(ZipError::PathEscape(entry.name().into()));
        }
        if !overwrite && outpath.exists() {
            debug!("not overwriting {}", outpath.display());
            return Ok(0);
        }
        let contents = self.read(entry, password)?;
        if let Some(parent) = outpath.parent() {
            make_writable_dir_all(parent)?;
        }
        debug!("extracting {} to {}", entry.name(), outpath.display());
        let mut file = fs::File::create(&outpath)?;
        file.write_all(&contents)?;
        #[cfg(feature = "time")]
        if let Ok(modified) = entry.last_modified().to_time() {
            file.set_modified(modified.into())?;
        }
        if self.config.keep_permissions {
            permissions.push(&outpath, entry);
        }
        Ok(1)
    }
}
