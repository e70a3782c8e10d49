//! Helper module to compute a CRC32 checksum

use crc32fast::Hasher;

use crate::result::{ZipError, ZipResult};

/// CRC-32 (IEEE 802.3, reflected polynomial `0xEDB88320`) of `data`.
pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Check `data` against the checksum recorded for entry `name`.
pub(crate) fn verify(name: &str, data: &[u8], expected: u32) -> ZipResult<()> {
    let actual = crc32(data);
    if actual == expected {
        Ok(())
    } else {
        Err(ZipError::ChecksumMismatch {
            name: name.into(),
            expected,
            actual,
        })
    }
}

const fn make_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 {
                0xEDB8_8320 ^ (c >> 1)
            } else {
                c >> 1
            };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

static CRC_TABLE: [u32; 256] = make_table();

/// One table step of the raw (non-inverted) CRC-32 register, as used by the ZipCrypto key
/// schedule.
#[inline]
pub(crate) fn update_byte(crc: u32, byte: u8) -> u32 {
    (crc >> 8) ^ CRC_TABLE[((crc ^ byte as u32) & 0xff) as usize]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reference_vectors() {
        assert_eq!(crc32(b""), 0x0000_0000);
        assert_eq!(crc32(b"a"), 0xE8B7_BE43);
        assert_eq!(crc32(b"abc"), 0x3524_41C2);
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b"1234"), 0x9be3e0a3);
    }

    #[test]
    fn table_step_matches_hasher() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let raw = data.iter().fold(0xFFFF_FFFF, |crc, &b| update_byte(crc, b));
        assert_eq!(!raw, crc32(data));
    }

    #[test]
    fn verify_reports_both_values() {
        verify("a", b"a", 0xE8B7_BE43).unwrap();
        match verify("a", b"a", 1) {
            Err(ZipError::ChecksumMismatch {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 0xE8B7_BE43);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
