//! Path manipulation utilities
//!
//! Entry names come from untrusted archives. Everything that turns a name into a filesystem
//! location, or a filesystem location into a name, goes through this module.

use std::path::{Component, Path, PathBuf};

use log::warn;

use crate::result::{ZipError, ZipResult};

/// Split a name into its segments, accepting both separators.
fn segments(name: &str) -> impl Iterator<Item = &str> {
    name.split(['/', '\\'])
}

/// Normalize an entry name against a synthetic root.
///
/// `.` segments and empty segments are dropped and `..` pops the previous segment, but never
/// climbs above the root: however many leading `..` the input has, the result stays inside.
/// The result is relative, `/`-separated, and keeps a trailing `/` when the input had one and
/// anything is left.
pub fn canonicalize(name: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in segments(name) {
        match segment {
            "" | "." => (),
            ".." => {
                out.pop();
            }
            normal => out.push(normal),
        }
    }
    let mut canonical = out.join("/");
    if !canonical.is_empty() && name.ends_with(['/', '\\']) {
        canonical.push('/');
    }
    canonical
}

/// Lexically resolve `path` to an absolute path without `.` or `..` components.
///
/// Unlike [`std::fs::canonicalize`] this does not touch the filesystem, so it works for
/// directories that do not exist yet and does not follow symlinks.
pub(crate) fn resolve(path: &Path) -> ZipResult<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str())
            }
            Component::CurDir => (),
            Component::ParentDir => {
                // Popping the root is a no-op, matching how the OS resolves "/..".
                out.pop();
            }
        }
    }
    Ok(out)
}

/// Append `name`'s segments to `base`, resolving `.` and `..` lexically.
fn join_segments<'a>(base: &Path, name: impl IntoIterator<Item = &'a str>) -> PathBuf {
    let mut out = base.to_path_buf();
    for segment in name {
        match segment {
            "" | "." => (),
            ".." => {
                out.pop();
            }
            normal => out.push(normal),
        }
    }
    out
}

/// Compute the extraction path of entry `name` below `target_dir`.
///
/// Suffixes of the name are tried from longest to shortest: the first whose resolved path is
/// the resolved `target_dir` or below it wins. If none is, the last segment alone is joined to
/// the target. A name that cannot be confined even that way (its last segment is `..`) fails
/// with [`ZipError::PathEscape`].
pub fn sanitize(target_dir: impl AsRef<Path>, name: &str) -> ZipResult<PathBuf> {
    let root = resolve(target_dir.as_ref())?;
    let parts: Vec<&str> = segments(name).collect();

    for start in 0..parts.len() {
        let candidate = join_segments(&root, parts[start..].iter().copied());
        if is_inside(&candidate, &root) && !contains_prefix(&parts[start..]) {
            return Ok(candidate);
        }
    }

    let basename = parts
        .iter()
        .rev()
        .copied()
        .find(|segment| !segment.is_empty())
        .unwrap_or_default();
    warn!("entry name {name:?} escapes the target directory; using {basename:?}");
    let fallback = join_segments(&root, [basename]);
    if basename == ".." || !is_inside(&fallback, &root) {
        return Err(ZipError::PathEscape(name.into()));
    }
    Ok(fallback)
}

/// Whether `path` is `root` or below it, compared component by component.
fn is_inside(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

/// Whether any segment would be taken as a drive or UNC prefix when pushed onto a path.
fn contains_prefix(segments: &[&str]) -> bool {
    segments.iter().any(|segment| {
        Path::new(segment)
            .components()
            .any(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
    })
}
