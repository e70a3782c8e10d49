//! Possible ZIP compression methods and the registry of codecs that implement them.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use crate::result::{ZipError, ZipResult};

/// Identifies the storage format used to compress a file within a ZIP archive.
///
/// Each file's compression method is stored alongside it, allowing the
/// contents to be read without context. Any 16-bit id can be represented; whether it can be
/// read or written depends on the [`CodecRegistry`] in use.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompressionMethod(u16);

#[allow(missing_docs)]
/// All compression methods defined for the ZIP format
impl CompressionMethod {
    pub const STORE: Self = CompressionMethod(0);
    pub const SHRINK: Self = CompressionMethod(1);
    pub const IMPLODE: Self = CompressionMethod(6);
    pub const DEFLATE: Self = CompressionMethod(8);
    pub const DEFLATE64: Self = CompressionMethod(9);
    pub const BZIP2: Self = CompressionMethod(12);
    pub const LZMA: Self = CompressionMethod(14);
    pub const ZSTD: Self = CompressionMethod(93);
    pub const XZ: Self = CompressionMethod(95);
    pub const PPMD: Self = CompressionMethod(98);
    pub const AES: Self = CompressionMethod(99);

    /// Converts a u16 to its corresponding CompressionMethod
    pub const fn from_u16(val: u16) -> CompressionMethod {
        CompressionMethod(val)
    }

    /// Converts a CompressionMethod to a u16
    pub const fn to_u16(self) -> u16 {
        self.0
    }
}

impl Default for CompressionMethod {
    fn default() -> Self {
        if cfg!(feature = "deflate") {
            CompressionMethod::DEFLATE
        } else {
            CompressionMethod::STORE
        }
    }
}

impl fmt::Debug for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            CompressionMethod::STORE => f.write_str("Stored"),
            CompressionMethod::SHRINK => f.write_str("Shrink"),
            CompressionMethod::IMPLODE => f.write_str("Implode"),
            CompressionMethod::DEFLATE => f.write_str("Deflated"),
            CompressionMethod::DEFLATE64 => f.write_str("Deflate64"),
            CompressionMethod::BZIP2 => f.write_str("Bzip2"),
            CompressionMethod::LZMA => f.write_str("Lzma"),
            CompressionMethod::ZSTD => f.write_str("Zstd"),
            CompressionMethod::XZ => f.write_str("Xz"),
            CompressionMethod::PPMD => f.write_str("Ppmd"),
            CompressionMethod::AES => f.write_str("Aes"),
            CompressionMethod(other) => write!(f, "Unsupported({other})"),
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Just duplicate what the Debug format looks like, i.e, the enum key:
        write!(f, "{self:?}")
    }
}

/// A compress/decompress pair for one compression method.
pub trait Codec: Send + Sync {
    /// Compress `data`. `level` is a method-specific tuning knob; `None` picks the default.
    fn compress(&self, data: &[u8], level: Option<i64>) -> io::Result<Vec<u8>>;

    /// Decompress `data`. `expected_size` is the uncompressed size recorded in the archive;
    /// output beyond it should be rejected rather than buffered.
    fn decompress(&self, data: &[u8], expected_size: u64) -> io::Result<Vec<u8>>;
}

/// Method 0: the data is stored as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stored;

impl Codec for Stored {
    fn compress(&self, data: &[u8], _level: Option<i64>) -> io::Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8], _expected_size: u64) -> io::Result<Vec<u8>> {
        Ok(data.to_vec())
    }
}

/// Method 8: raw DEFLATE through `flate2`.
#[cfg(feature = "deflate")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Deflated;

#[cfg(feature = "deflate")]
impl Deflated {
    const DEFAULT_LEVEL: i64 = 6;
    const MAX_LEVEL: i64 = 9;
}

#[cfg(feature = "deflate")]
impl Codec for Deflated {
    fn compress(&self, data: &[u8], level: Option<i64>) -> io::Result<Vec<u8>> {
        use flate2::{Compression, write::DeflateEncoder};
        use std::io::Write;

        let level = level.unwrap_or(Self::DEFAULT_LEVEL);
        if !(0..=Self::MAX_LEVEL).contains(&level) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("deflate level {level} is out of range"),
            ));
        }
        let mut encoder = DeflateEncoder::new(
            Vec::with_capacity(data.len() / 2),
            Compression::new(level as u32),
        );
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8], expected_size: u64) -> io::Result<Vec<u8>> {
        use flate2::read::DeflateDecoder;
        use std::io::Read;

        // Cap the hint so a hostile header cannot force a huge allocation up front.
        const MAX_PREALLOCATION: u64 = 1 << 24;
        let mut out = Vec::with_capacity(expected_size.min(MAX_PREALLOCATION) as usize);
        DeflateDecoder::new(data)
            .take(expected_size.saturating_add(1))
            .read_to_end(&mut out)?;
        if out.len() as u64 > expected_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("deflate stream inflates past its declared size of {expected_size} bytes"),
            ));
        }
        Ok(out)
    }
}

/// Maps compression method ids to codecs.
///
/// Build one at startup, wrap it in an [`Arc`] and hand it to
/// [`Config::codecs`](crate::read::Config::codecs); it is not modified afterwards.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: HashMap<CompressionMethod, Arc<dyn Codec>>,
}

impl CodecRegistry {
    /// A registry that only knows [`CompressionMethod::STORE`].
    pub fn new() -> Self {
        let mut codecs: HashMap<CompressionMethod, Arc<dyn Codec>> = HashMap::new();
        codecs.insert(CompressionMethod::STORE, Arc::new(Stored));
        Self { codecs }
    }

    /// Add a codec for `method`, failing if one is already registered.
    pub fn register(&mut self, method: CompressionMethod, codec: Arc<dyn Codec>) -> ZipResult<()> {
        if self.codecs.contains_key(&method) {
            return Err(ZipError::MethodAlreadyRegistered(method.to_u16()));
        }
        self.codecs.insert(method, codec);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, method: CompressionMethod, codec: Arc<dyn Codec>) -> ZipResult<Self> {
        self.register(method, codec)?;
        Ok(self)
    }

    /// Look up the codec for `method`.
    pub fn get(&self, method: CompressionMethod) -> ZipResult<&dyn Codec> {
        self.codecs
            .get(&method)
            .map(|codec| &**codec)
            .ok_or(ZipError::UnsupportedMethod(method.to_u16()))
    }

    pub fn supports(&self, method: CompressionMethod) -> bool {
        self.codecs.contains_key(&method)
    }

    /// Registered methods, in ascending id order.
    pub fn methods(&self) -> Vec<CompressionMethod> {
        let mut methods: Vec<_> = self.codecs.keys().copied().collect();
        methods.sort_unstable();
        methods
    }
}

/// The default population: [`Stored`], plus [`Deflated`] with the `deflate` feature.
impl Default for CodecRegistry {
    fn default() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "deflate")]
        registry
            .codecs
            .insert(CompressionMethod::DEFLATE, Arc::new(Deflated));
        registry
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}
