// ZipCrypto is the legacy "traditional PKWARE" cipher. It is broken, but archives that use it
// are still around, so they must read back and rewrite without losing their encryption.

mod common;

use common::RawEntry;
use zipkit::result::ZipError;
use zipkit::spec::{FixedSizeBlock, ZipDataDescriptor};
use zipkit::{DateTime, ZipArchive, crc32, zipcrypto};

const PASSWORD: &[u8] = b"test";
const SALT: [u8; 12] = [0x52, 0x13, 0xc4, 0x2f, 0x99, 0x01, 0x7e, 0xe0, 0x3b, 0x44, 0x00, 0x00];
const CONTENTS: &[u8] = b"abcdefghijklmnopqrstuvwxyz123456789";

fn encrypted_archive() -> Vec<u8> {
    let mut archive = ZipArchive::new();
    archive
        .add_file("test/secret.txt", CONTENTS)
        .unwrap()
        .set_password(Some(PASSWORD));
    archive.add_file("test/public.txt", &b"nothing to hide"[..]).unwrap();
    archive.to_bytes().unwrap()
}

#[test]
fn encrypted_file() {
    let archive = ZipArchive::from_bytes(encrypted_archive()).unwrap();
    assert_eq!(archive.len(), 2);
    assert!(archive.entry("test/secret.txt").unwrap().is_encrypted());
    assert!(!archive.entry("test/public.txt").unwrap().is_encrypted());

    assert!(matches!(
        archive.read("test/secret.txt", None),
        Err(ZipError::PasswordRequired(_))
    ));
    // The check byte only rules out most wrong passwords; the CRC catches the rest.
    assert!(archive.read("test/secret.txt", Some(b"wrong password")).is_err());

    assert_eq!(&*archive.read("test/secret.txt", Some(PASSWORD)).unwrap(), CONTENTS);
    assert_eq!(
        archive.read_to_string("test/public.txt", None).unwrap(),
        "nothing to hide"
    );
}

#[test]
fn decrypted_contents_are_cached() {
    let archive = ZipArchive::from_bytes(encrypted_archive()).unwrap();
    archive.read("test/secret.txt", Some(PASSWORD)).unwrap();
    assert_eq!(&*archive.read("test/secret.txt", None).unwrap(), CONTENTS);
}

#[test]
fn pkzip_check_byte() {
    let crc = crc32(CONTENTS);
    let mut entry = RawEntry::stored("secret.txt", CONTENTS);
    entry.flags = 1;
    entry.data = zipcrypto::encrypt_with_salt(CONTENTS, crc, PASSWORD, false, SALT);
    entry.compressed_size = entry.data.len() as u32;
    let archive = ZipArchive::from_bytes(common::build(&[entry], b"")).unwrap();

    assert_eq!(&*archive.read("secret.txt", Some(PASSWORD)).unwrap(), CONTENTS);
}

#[test]
fn wrong_password_is_detected() {
    let crc = crc32(CONTENTS);
    let mut entry = RawEntry::stored("secret.txt", CONTENTS);
    entry.flags = 1;
    entry.data = zipcrypto::encrypt_with_salt(CONTENTS, crc, PASSWORD, false, SALT);
    entry.compressed_size = entry.data.len() as u32;
    let archive = ZipArchive::from_bytes(common::build(&[entry], b"")).unwrap();

    let err = archive.read("secret.txt", Some(b"tset")).unwrap_err();
    assert!(
        matches!(
            err,
            ZipError::WrongPassword(_) | ZipError::ChecksumMismatch { .. }
        ),
        "{err:?}"
    );
}

/// One entry encrypted the way streaming writers do it: the CRC is not known when the header
/// is encrypted, so the check byte is the high byte of the DOS modification time instead.
fn streamed_archive() -> Vec<u8> {
    const TIME: u16 = 0x7d1c;
    let crc = crc32(CONTENTS);
    let check = u32::from(TIME >> 8) << 24;
    let encrypted = zipcrypto::encrypt_with_salt(CONTENTS, check, PASSWORD, false, SALT);

    let mut entry = RawEntry::stored("streamed.txt", CONTENTS);
    entry.flags = 1 | 8;
    entry.time = TIME;
    entry.compressed_size = encrypted.len() as u32;
    entry.zeroed_local = true;
    entry.trailer = ZipDataDescriptor {
        crc32: crc,
        compressed_size: encrypted.len() as u32,
        uncompressed_size: CONTENTS.len() as u32,
    }
    .encode();
    entry.data = encrypted;
    common::build(&[entry], b"")
}

#[test]
fn info_zip_check_byte_with_data_descriptor() {
    let archive = ZipArchive::from_bytes(streamed_archive()).unwrap();
    let streamed = archive.entry("streamed.txt").unwrap();
    assert!(streamed.is_encrypted());
    assert!(streamed.has_data_descriptor());
    assert_eq!(&*archive.read("streamed.txt", Some(PASSWORD)).unwrap(), CONTENTS);

    // Copied as is: flags, zeroed local header and descriptor all survive a rewrite.
    let rewritten = ZipArchive::from_bytes(archive.to_bytes().unwrap()).unwrap();
    assert!(rewritten.entry("streamed.txt").unwrap().has_data_descriptor());
    assert_eq!(&*rewritten.read("streamed.txt", Some(PASSWORD)).unwrap(), CONTENTS);
}

#[test]
fn info_zip_entry_with_new_time() {
    let time = DateTime::from_date_and_time(2001, 2, 3, 4, 5, 6).unwrap();
    let mut archive = ZipArchive::from_bytes(streamed_archive()).unwrap();
    archive
        .entry_mut("streamed.txt")
        .unwrap()
        .set_last_modified(time);

    let archive = ZipArchive::from_bytes(archive.to_bytes().unwrap()).unwrap();
    assert_eq!(archive.entry("streamed.txt").unwrap().last_modified(), time);
    assert_eq!(&*archive.read("streamed.txt", Some(PASSWORD)).unwrap(), CONTENTS);

    // Local and central times now disagree; another copy must still decrypt.
    let archive = ZipArchive::from_bytes(archive.to_bytes().unwrap()).unwrap();
    assert_eq!(&*archive.read("streamed.txt", Some(PASSWORD)).unwrap(), CONTENTS);
}

#[test]
fn legacy_two_byte_check() {
    let mut archive = ZipArchive::new();
    let entry = archive.add_file("old.txt", CONTENTS).unwrap();
    entry.set_password(Some(PASSWORD));
    entry.set_legacy_two_byte_check(true);
    let archive = ZipArchive::from_bytes(archive.to_bytes().unwrap()).unwrap();

    assert_eq!(&*archive.read("old.txt", Some(PASSWORD)).unwrap(), CONTENTS);
}

#[test]
fn untouched_entries_keep_their_encryption() {
    let first = encrypted_archive();
    let archive = ZipArchive::from_bytes(first.clone()).unwrap();
    let second = archive.to_bytes().unwrap();
    assert_eq!(first, second);

    let reread = ZipArchive::from_bytes(second).unwrap();
    assert!(reread.entry("test/secret.txt").unwrap().is_encrypted());
    assert_eq!(&*reread.read("test/secret.txt", Some(PASSWORD)).unwrap(), CONTENTS);
}

#[test]
fn change_and_remove_password() {
    let mut archive = ZipArchive::from_bytes(encrypted_archive()).unwrap();
    archive.read("test/secret.txt", Some(PASSWORD)).unwrap();
    archive
        .entry_mut("test/secret.txt")
        .unwrap()
        .set_password(Some(b"another"));
    archive
        .entry_mut("test/public.txt")
        .unwrap()
        .set_password(Some(b"another"));

    let mut archive = ZipArchive::from_bytes(archive.to_bytes().unwrap()).unwrap();
    assert_eq!(&*archive.read("test/secret.txt", Some(b"another")).unwrap(), CONTENTS);
    assert_eq!(
        &*archive.read("test/public.txt", Some(b"another")).unwrap(),
        b"nothing to hide"
    );

    archive.entry_mut("test/secret.txt").unwrap().set_password(None);
    let archive = ZipArchive::from_bytes(archive.to_bytes().unwrap()).unwrap();
    assert!(!archive.entry("test/secret.txt").unwrap().is_encrypted());
    assert_eq!(&*archive.read("test/secret.txt", None).unwrap(), CONTENTS);
}

#[test]
fn new_password_must_decrypt_unread_entry() {
    let mut archive = ZipArchive::from_bytes(encrypted_archive()).unwrap();
    archive
        .entry_mut("test/secret.txt")
        .unwrap()
        .set_password(Some(b"not the original"));
    assert!(archive.to_bytes().is_err());
}
