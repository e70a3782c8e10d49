use bencher::{benchmark_group, benchmark_main};

use bencher::Bencher;
use zipkit::result::ZipResult;
use zipkit::{CompressionMethod, Config, ZipArchive};

const FILE_COUNT: usize = 15_000;
const FILE_SIZE: usize = 1024;

fn stored() -> Config {
    Config::default().default_method(CompressionMethod::STORE)
}

fn generate_random_archive(count_files: usize, file_size: usize) -> ZipResult<Vec<u8>> {
    let mut archive = ZipArchive::with_config(stored());
    let mut bytes = vec![0u8; file_size];

    for i in 0..count_files {
        let name = format!("file_deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef_{i}.dat");
        getrandom::fill(&mut bytes).unwrap();
        archive.add_file(&name, bytes.as_slice())?;
    }

    archive.to_bytes()
}

fn read_metadata(bench: &mut Bencher) {
    let bytes = generate_random_archive(FILE_COUNT, FILE_SIZE).unwrap();

    bench.iter(|| {
        let archive = ZipArchive::from_bytes(bytes.as_slice()).unwrap();
        archive.len()
    });
}

const COMMENT_SIZE: usize = 50_000;

fn generate_random_archive_with_comment(comment_length: usize) -> ZipResult<Vec<u8>> {
    let mut archive = ZipArchive::with_config(stored());

    let mut bytes = vec![0u8; comment_length];
    getrandom::fill(&mut bytes).unwrap();
    let comment: String = bytes.iter().map(|b| (b'a' + b % 26) as char).collect();
    archive.set_comment(comment);

    archive.add_file("asdf.txt", &b"asdf"[..])?;
    archive.to_bytes()
}

fn parse_comment(bench: &mut Bencher) {
    let bytes = generate_random_archive_with_comment(COMMENT_SIZE).unwrap();

    bench.iter(|| {
        let archive = ZipArchive::from_bytes(bytes.as_slice()).unwrap();
        archive.len()
    });
}

fn read_all_entries(bench: &mut Bencher) {
    let bytes = generate_random_archive(1_000, FILE_SIZE).unwrap();

    bench.iter(|| {
        let archive = ZipArchive::from_bytes(bytes.as_slice()).unwrap();
        archive.test(None).unwrap();
        archive.len()
    });
}

benchmark_group!(benches, read_metadata, parse_comment, read_all_entries);
benchmark_main!(benches);
