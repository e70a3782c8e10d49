//! Decoding and encoding of entry names and comments.
//!
//! Names carry general purpose flag bit 11 when they are UTF-8. Everything else is, per the
//! format, IBM code page 437, although some archivers use their local code page instead; the
//! [`NameCodec`] trait lets callers plug in the right one.

/// Text codec for names and comments that are not flagged as UTF-8.
pub trait NameCodec: Send + Sync {
    /// Decode raw name or comment bytes.
    fn decode(&self, raw: &[u8]) -> String;

    /// Encode `text` for storage without the UTF-8 flag.
    ///
    /// Returning `None` (the default) makes the writer store the text as UTF-8 and set the
    /// flag instead.
    fn encode(&self, _text: &str) -> Option<Vec<u8>> {
        None
    }
}

/// IBM code page 437, the codec the format prescribes for unflagged names.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cp437;

impl NameCodec for Cp437 {
    fn decode(&self, raw: &[u8]) -> String {
        raw.iter().copied().map(to_char).collect()
    }
}

/// Decode `raw` as UTF-8 when `is_utf8` is set, with `codec` otherwise.
pub(crate) fn decode_text(codec: &dyn NameCodec, raw: &[u8], is_utf8: bool) -> String {
    if is_utf8 {
        String::from_utf8_lossy(raw).into_owned()
    } else if raw.is_ascii() {
        // Every code page in use agrees with ASCII; skip the lookup.
        String::from_utf8_lossy(raw).into_owned()
    } else {
        codec.decode(raw)
    }
}

/// Encode `text`, returning the raw bytes and whether they are UTF-8 that needs the flag.
pub(crate) fn encode_text(codec: &dyn NameCodec, text: &str) -> (Vec<u8>, bool) {
    if text.is_ascii() {
        return (text.as_bytes().to_vec(), false);
    }
    match codec.encode(text) {
        Some(raw) => (raw, false),
        None => (text.as_bytes().to_vec(), true),
    }
}

/// Code points of bytes 0x80..=0xff.
const HIGH_HALF: [char; 128] = [
    '\u{00c7}', '\u{00fc}', '\u{00e9}', '\u{00e2}', '\u{00e4}', '\u{00e0}', '\u{00e5}', '\u{00e7}',
    '\u{00ea}', '\u{00eb}', '\u{00e8}', '\u{00ef}', '\u{00ee}', '\u{00ec}', '\u{00c4}', '\u{00c5}',
    '\u{00c9}', '\u{00e6}', '\u{00c6}', '\u{00f4}', '\u{00f6}', '\u{00f2}', '\u{00fb}', '\u{00f9}',
    '\u{00ff}', '\u{00d6}', '\u{00dc}', '\u{00a2}', '\u{00a3}', '\u{00a5}', '\u{20a7}', '\u{0192}',
    '\u{00e1}', '\u{00ed}', '\u{00f3}', '\u{00fa}', '\u{00f1}', '\u{00d1}', '\u{00aa}', '\u{00ba}',
    '\u{00bf}', '\u{2310}', '\u{00ac}', '\u{00bd}', '\u{00bc}', '\u{00a1}', '\u{00ab}', '\u{00bb}',
    '\u{2591}', '\u{2592}', '\u{2593}', '\u{2502}', '\u{2524}', '\u{2561}', '\u{2562}', '\u{2556}',
    '\u{2555}', '\u{2563}', '\u{2551}', '\u{2557}', '\u{255d}', '\u{255c}', '\u{255b}', '\u{2510}',
    '\u{2514}', '\u{2534}', '\u{252c}', '\u{251c}', '\u{2500}', '\u{253c}', '\u{255e}', '\u{255f}',
    '\u{255a}', '\u{2554}', '\u{2569}', '\u{2566}', '\u{2560}', '\u{2550}', '\u{256c}', '\u{2567}',
    '\u{2568}', '\u{2564}', '\u{2565}', '\u{2559}', '\u{2558}', '\u{2552}', '\u{2553}', '\u{256b}',
    '\u{256a}', '\u{2518}', '\u{250c}', '\u{2588}', '\u{2584}', '\u{258c}', '\u{2590}', '\u{2580}',
    '\u{03b1}', '\u{00df}', '\u{0393}', '\u{03c0}', '\u{03a3}', '\u{03c3}', '\u{00b5}', '\u{03c4}',
    '\u{03a6}', '\u{0398}', '\u{03a9}', '\u{03b4}', '\u{221e}', '\u{03c6}', '\u{03b5}', '\u{2229}',
    '\u{2261}', '\u{00b1}', '\u{2265}', '\u{2264}', '\u{2320}', '\u{2321}', '\u{00f7}', '\u{2248}',
    '\u{00b0}', '\u{2219}', '\u{00b7}', '\u{221a}', '\u{207f}', '\u{00b2}', '\u{25a0}', '\u{00a0}',
];

fn to_char(input: u8) -> char {
    match input {
        0x00..=0x7f => input as char,
        _ => HIGH_HALF[(input - 0x80) as usize],
    }
}
