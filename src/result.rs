#![allow(unknown_lints)] // non_local_definitions isn't in Rust 1.70
#![allow(non_local_definitions)]
//! Error types that can be emitted from this library

use displaydoc::Display;
use thiserror::Error;

use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::io;
use std::num::TryFromIntError;

/// Generic result type with ZipError as its error variant
pub type ZipResult<T> = Result<T, ZipError>;

/// Error type for Zip
#[derive(Debug, Display, Error)]
#[non_exhaustive]
pub enum ZipError {
    /// i/o error: {0}
    Io(#[from] io::Error),

    /// invalid Zip archive: {0}
    InvalidArchive(Cow<'static, str>),

    /// invalid signature for {record}: expected {expected:#010x}, found {found:#010x}
    InvalidSignature {
        record: &'static str,
        expected: u32,
        found: u32,
    },

    /// no end of central directory record found; this is not a zip archive
    NotAZipArchive,

    /// central directory declares more data than the archive holds: {0}
    DirectoryTooLarge(Cow<'static, str>),

    /// corrupt central directory record #{index}: {source}
    CorruptDirectory {
        index: usize,
        #[source]
        source: Box<ZipError>,
    },

    /// unsupported compression method {0}
    UnsupportedMethod(u16),

    /// a codec is already registered for compression method {0}
    MethodAlreadyRegistered(u16),

    /// checksum mismatch for {name}: expected {expected:#010x}, computed {actual:#010x}
    ChecksumMismatch {
        name: Box<str>,
        expected: u32,
        actual: u32,
    },

    /// the password provided for {0} is incorrect
    WrongPassword(Box<str>),

    /// {0} is encrypted and no password was provided
    PasswordRequired(Box<str>),

    /// entry name {0:?} cannot be confined to the extraction directory
    PathEscape(Box<str>),

    /// specified file not found in archive: {0}
    FileNotFound(Box<str>),

    /// an entry named {0} already exists
    DuplicateName(Box<str>),
}

pub(crate) fn invalid_archive<T, M: Into<Cow<'static, str>>>(message: M) -> ZipResult<T> {
    Err(ZipError::InvalidArchive(message.into()))
}

macro_rules! invalid {
    ($fmt_string:literal) => {
        {
            return crate::result::invalid_archive($fmt_string);
        }
    };
    ($fmt_string:literal, $($param:expr),+) => {
        {
            return crate::result::invalid_archive(format!($fmt_string, $($param),+));
        }
    };
}
pub(crate) use invalid;

impl ZipError {
    /// Whether this error was raised because the archive bytes themselves are malformed, as
    /// opposed to a problem with the caller's request or environment.
    pub fn is_malformed_archive(&self) -> bool {
        matches!(
            self,
            ZipError::InvalidArchive(_)
                | ZipError::InvalidSignature { .. }
                | ZipError::NotAZipArchive
                | ZipError::DirectoryTooLarge(_)
                | ZipError::CorruptDirectory { .. }
                | ZipError::ChecksumMismatch { .. }
        )
    }
}

impl From<ZipError> for io::Error {
    fn from(err: ZipError) -> io::Error {
        let kind = match &err {
            ZipError::Io(err) => err.kind(),
            ZipError::InvalidArchive(_)
            | ZipError::InvalidSignature { .. }
            | ZipError::NotAZipArchive
            | ZipError::DirectoryTooLarge(_)
            | ZipError::CorruptDirectory { .. }
            | ZipError::ChecksumMismatch { .. } => io::ErrorKind::InvalidData,
            ZipError::UnsupportedMethod(_) => io::ErrorKind::Unsupported,
            ZipError::MethodAlreadyRegistered(_) => io::ErrorKind::AlreadyExists,
            ZipError::WrongPassword(_)
            | ZipError::PasswordRequired(_)
            | ZipError::PathEscape(_) => io::ErrorKind::InvalidInput,
            ZipError::FileNotFound(_) => io::ErrorKind::NotFound,
            ZipError::DuplicateName(_) => io::ErrorKind::AlreadyExists,
        };

        io::Error::new(kind, err)
    }
}

/// Error type for time parsing
#[derive(Debug, Clone, Copy)]
pub struct DateTimeRangeError;

// TryFromIntError is also an out-of-range error.
impl From<TryFromIntError> for DateTimeRangeError {
    fn from(_value: TryFromIntError) -> Self {
        DateTimeRangeError
    }
}

impl fmt::Display for DateTimeRangeError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            fmt,
            "a date could not be represented within the bounds the MS-DOS date range (1980-2107)"
        )
    }
}

impl Error for DateTimeRangeError {}
