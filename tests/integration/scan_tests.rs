use dupesweep::duplicates::{DuplicateFinder, FinderConfig};
use dupesweep::scanner::{HasherConfig, WalkerConfig};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use tempfile::tempdir;

fn write(path: &std::path::Path, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

/// `len` bytes with identical first and last 4 KiB; `marker` lands in the middle.
fn head_tail_twin(len: usize, marker: u8) -> Vec<u8> {
    let mut data = vec![b'h'; len];
    data[len / 2] = marker;
    data
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
    assert!(!summary.interrupted);
}

#[test]
fn test_scan_content_a_tree() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("subdir");
    fs::create_dir(&sub).unwrap();

    write(&dir.path().join("file1"), b"content A");
    write(&dir.path().join("file2"), b"content A");
    write(&dir.path().join("file3"), b"content B");
    write(&sub.join("file4"), b"content A");
    write(&dir.path().join("file5"), b"content C");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.size, 9);
    let expected: [u8; 32] = Sha256::digest(b"content A").into();
    assert_eq!(group.hash.0, expected);
    assert_eq!(
        group.files,
        vec![
            dir.path().join("file1"),
            dir.path().join("file2"),
            sub.join("file4"),
        ]
    );

    assert_eq!(summary.total_files, 5);
    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.duplicate_files, 2);
    assert_eq!(summary.reclaimable_space, 18);
    assert_eq!(summary.fallback_files, 5);
    assert!(summary.errors.is_empty());
}

#[test]
fn test_scan_zero_byte_pair() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("empty1.txt")).unwrap();
    File::create(dir.path().join("empty2.txt")).unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 0);
    assert_eq!(groups[0].files.len(), 2);
    let expected: [u8; 32] = Sha256::digest(b"").into();
    assert_eq!(groups[0].hash.0, expected);
    assert_eq!(summary.reclaimable_space, 0);
}

#[test]
fn test_scan_thousand_unique_files_same_size() {
    let dir = tempdir().unwrap();
    for i in 0..1000 {
        write(
            &dir.path().join(format!("f{i:04}.dat")),
            format!("unique content {i:06}").as_bytes(),
        );
    }

    let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(4));
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1000);
    assert_eq!(summary.eliminated_by_size, 0);
    assert!(summary.errors.is_empty());
    assert!(!summary.interrupted);
}

#[test]
fn test_same_content_different_extension_not_grouped() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("report.txt"), b"identical bytes");
    write(&dir.path().join("report.md"), b"identical bytes");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.eliminated_by_size, 2);
    assert_eq!(summary.full_digests, 0);
}

#[test]
fn test_extension_case_is_ignored() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("photo.JPG"), b"pixels");
    write(&dir.path().join("copy.jpg"), b"pixels");

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
}

#[test]
fn test_large_duplicates_use_fingerprint_then_digest() {
    let dir = tempdir().unwrap();
    let content: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
    write(&dir.path().join("a.bin"), &content);
    write(&dir.path().join("b.bin"), &content);

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 50_000);
    let expected: [u8; 32] = Sha256::digest(&content).into();
    assert_eq!(groups[0].hash.0, expected);
    assert_eq!(summary.fallback_files, 0);
    assert_eq!(summary.full_digests, 2);
}

#[test]
fn test_fingerprint_collision_without_full_match() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.bin"), &head_tail_twin(20_000, b'1'));
    write(&dir.path().join("b.bin"), &head_tail_twin(20_000, b'2'));

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.eliminated_by_fingerprint, 0);
    assert_eq!(summary.full_digests, 2);
}

#[test]
fn test_distinct_heads_eliminated_by_fingerprint() {
    let dir = tempdir().unwrap();
    let mut a = vec![b'x'; 20_000];
    let mut b = a.clone();
    a[0] = b'a';
    b[0] = b'b';
    write(&dir.path().join("a.bin"), &a);
    write(&dir.path().join("b.bin"), &b);

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.eliminated_by_fingerprint, 2);
    assert_eq!(summary.full_digests, 0);
}

#[test]
fn test_small_chunk_config_still_exact() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.log"), b"0123456789abcdef-same-0123456789abcdef");
    write(&dir.path().join("b.log"), b"0123456789abcdef-same-0123456789abcdef");
    write(&dir.path().join("c.log"), b"0123456789abcdef-diff-0123456789abcdef");

    let config = FinderConfig::default().with_hasher_config(
        HasherConfig::default()
            .with_partial_chunk_size(8)
            .with_full_chunk_size(5),
    );
    let finder = DuplicateFinder::new(config);
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(
        groups[0].files,
        vec![dir.path().join("a.log"), dir.path().join("b.log")]
    );
    assert_eq!(summary.fallback_files, 0);
    assert_eq!(summary.full_digests, 3);
}

#[test]
fn test_multiple_groups_within_one_bucket() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("1.txt"), b"aaaa");
    write(&dir.path().join("2.txt"), b"bbbb");
    write(&dir.path().join("3.txt"), b"aaaa");
    write(&dir.path().join("4.txt"), b"bbbb");
    write(&dir.path().join("5.txt"), b"cccc");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(summary.duplicate_files, 2);
    // Groups within a bucket follow their first member's discovery order
    assert_eq!(
        groups[0].files,
        vec![dir.path().join("1.txt"), dir.path().join("3.txt")]
    );
    assert_eq!(
        groups[1].files,
        vec![dir.path().join("2.txt"), dir.path().join("4.txt")]
    );
}

#[test]
fn test_executables_skipped_by_default() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("setup.exe"), b"MZ binary");
    write(&dir.path().join("setup-copy.exe"), b"MZ binary");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.skipped.executables, 2);
}

#[test]
fn test_empty_skip_list_includes_executables() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("setup.exe"), b"MZ binary");
    write(&dir.path().join("setup-copy.exe"), b"MZ binary");

    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_skip_extensions(Vec::new()));
    let finder = DuplicateFinder::new(config);
    let (groups, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
}

#[test]
fn test_repeated_scans_are_independent() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"dup");
    write(&dir.path().join("b.txt"), b"dup");

    let finder = DuplicateFinder::with_defaults();
    let (first, _) = finder.find_duplicates(dir.path()).unwrap();
    fs::remove_file(dir.path().join("b.txt")).unwrap();
    let (second, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
    assert_eq!(summary.total_files, 1);
}
