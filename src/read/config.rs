use std::fmt;
use std::sync::Arc;

use crate::compression::{CodecRegistry, CompressionMethod};
use crate::cp437::{Cp437, NameCodec};

/// Order in which entries are listed and written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryOrder {
    /// Directory order for entries read from an archive, then insertion order.
    #[default]
    Insertion,
    /// Sorted by name, byte-wise.
    Sorted,
}

/// Settings shared by every operation on a [`ZipArchive`](crate::ZipArchive).
///
/// ```
/// use std::sync::Arc;
/// use zipkit::{CodecRegistry, CompressionMethod, Config, EntryOrder};
///
/// let config = Config::default()
///     .entry_order(EntryOrder::Sorted)
///     .default_method(CompressionMethod::STORE)
///     .codecs(Arc::new(CodecRegistry::default()));
/// ```
#[derive(Clone)]
pub struct Config {
    pub(crate) entry_order: EntryOrder,
    pub(crate) default_method: Option<CompressionMethod>,
    pub(crate) name_codec: Arc<dyn NameCodec>,
    pub(crate) codecs: Arc<CodecRegistry>,
    pub(crate) lenient_directory: bool,
    pub(crate) keep_permissions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entry_order: EntryOrder::default(),
            default_method: None,
            name_codec: Arc::new(Cp437),
            codecs: Arc::new(CodecRegistry::default()),
            lenient_directory: false,
            keep_permissions: false,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("entry_order", &self.entry_order)
            .field("default_method", &self.method_for_new_entries())
            .field("codecs", &self.codecs)
            .field("lenient_directory", &self.lenient_directory)
            .field("keep_permissions", &self.keep_permissions)
            .finish_non_exhaustive()
    }
}

impl Config {
    #[must_use]
    pub fn entry_order(mut self, order: EntryOrder) -> Self {
        self.entry_order = order;
        self
    }

    /// Set the compression method for entries added without an explicit one.
    ///
    /// The default is [`CompressionMethod::DEFLATE`] when the registry has a codec for it,
    /// [`CompressionMethod::STORE`] otherwise.
    #[must_use]
    pub fn default_method(mut self, method: CompressionMethod) -> Self {
        self.default_method = Some(method);
        self
    }

    /// Set the codec for names and comments that are not flagged as UTF-8.
    #[must_use]
    pub fn name_codec(mut self, codec: Arc<dyn NameCodec>) -> Self {
        self.name_codec = codec;
        self
    }

    #[must_use]
    pub fn codecs(mut self, codecs: Arc<CodecRegistry>) -> Self {
        self.codecs = codecs;
        self
    }

    /// Keep the entries read before a malformed central directory record instead of failing.
    #[must_use]
    pub fn lenient_directory(mut self, lenient: bool) -> Self {
        self.lenient_directory = lenient;
        self
    }

    /// Apply stored Unix permissions to extracted files.
    #[must_use]
    pub fn keep_permissions(mut self, keep: bool) -> Self {
        self.keep_permissions = keep;
        self
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.codecs
    }

    pub(crate) fn method_for_new_entries(&self) -> CompressionMethod {
        self.default_method.unwrap_or_else(|| {
            if self.codecs.supports(CompressionMethod::DEFLATE) {
                CompressionMethod::DEFLATE
            } else {
                CompressionMethod::STORE
            }
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_method_follows_registry() {
        let config = Config::default().codecs(Arc::new(CodecRegistry::new()));
        assert_eq!(config.method_for_new_entries(), CompressionMethod::STORE);
        let config = config.default_method(CompressionMethod::from_u16(200));
        assert_eq!(
            config.method_for_new_entries(),
            CompressionMethod::from_u16(200)
        );
    }

    #[cfg(feature = "deflate")]
    #[test]
    fn deflate_by_default() {
        assert_eq!(
            Config::default().method_for_new_entries(),
            CompressionMethod::DEFLATE
        );
    }
}
