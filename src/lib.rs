//! A library for reading, modifying and rebuilding zip archives held in memory.
//!
//! An archive is read from its bytes (or a path) into a [`ZipArchive`]. Its central directory
//! is parsed up front; entry data stays where it is until an entry is read, at which point it
//! is decrypted, decompressed and checked against its CRC-32 once, then cached.
//!
//! Entries can be added, replaced, renamed and removed. Writing rebuilds the whole archive;
//! entries that were not changed are copied without being recompressed.
//!
//! ```
//! use zipkit::ZipArchive;
//!
//! let mut archive = ZipArchive::new();
//! archive.add_directory("docs")?;
//! archive.add_file("docs/a.txt", &b"hello"[..])?;
//! archive
//!     .entry_mut("docs/a.txt")
//!     .expect("just added")
//!     .set_password(Some(b"secret"));
//!
//! let reread = ZipArchive::from_bytes(archive.to_bytes()?)?;
//! assert_eq!(&*reread.read("docs/a.txt", Some(b"secret"))?, b"hello");
//! # Ok::<(), zipkit::result::ZipError>(())
//! ```
//!
//! Supported compression methods are those of the [`CodecRegistry`] in the archive's
//! [`Config`]: stored and, with the default `deflate` feature, deflated. Other methods can be
//! plugged in by registering a [`Codec`].
//!
//! Encryption is limited to the legacy ZipCrypto cipher, which is weak and only meant for
//! compatibility with archives that already use it.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub use crate::archive::{EntrySelector, ZipArchive};
pub use crate::compression::{Codec, CodecRegistry, CompressionMethod};
pub use crate::cp437::{Cp437, NameCodec};
pub use crate::crc32::crc32;
pub use crate::path::{canonicalize, sanitize};
pub use crate::read::{Config, EntryOrder};
pub use crate::types::{DateTime, System, ZipEntry};

mod archive;
pub mod compression;
mod cp437;
mod crc32;
pub mod extra_fields;
mod fs;
pub mod path;
pub mod read;
pub mod result;
pub mod spec;
mod types;
mod write;
pub mod zipcrypto;
