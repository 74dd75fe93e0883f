use dupesweep::duplicates::DuplicateFinder;
use dupesweep::scanner::{FileCandidate, HashError, ScanError};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_candidates_continue_on_missing_files() {
    let finder = DuplicateFinder::with_defaults();
    // Missing files with equal size so they reach the hashing stage
    let file1 = FileCandidate::new(PathBuf::from("nonexistent_1.txt"), 100);
    let file2 = FileCandidate::new(PathBuf::from("nonexistent_2.txt"), 100);

    let (groups, summary) = finder
        .find_duplicates_in_candidates(vec![file1, file2])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.errors.len(), 2);
    assert!(!summary.interrupted);

    for err in &summary.errors {
        match err {
            ScanError::Hash(HashError::NotFound(_)) => {}
            _ => panic!("Expected NotFound HashError, got: {:?}", err),
        }
    }
}

#[test]
fn test_failed_member_does_not_break_its_group() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    File::create(&a).unwrap().write_all(b"same").unwrap();
    File::create(&b).unwrap().write_all(b"same").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let candidates = vec![
        FileCandidate::new(a.clone(), 4),
        FileCandidate::new(dir.path().join("vanished.txt"), 4),
        FileCandidate::new(b.clone(), 4),
    ];

    let (groups, summary) = finder.find_duplicates_in_candidates(candidates).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files, vec![a, b]);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.has_errors());
}

#[test]
fn test_file_removed_after_walk_is_reported() {
    let dir = tempdir().unwrap();
    let only = dir.path().join("only.txt");
    File::create(&only).unwrap().write_all(b"xy").unwrap();
    let ghost = dir.path().join("ghost.txt");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder
        .find_duplicates_in_candidates(vec![
            FileCandidate::new(only, 2),
            FileCandidate::new(ghost.clone(), 2),
        ])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].to_string().contains("ghost.txt"));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_dropped_and_scan_continues() {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    File::create(dir.path().join("a.txt"))
        .unwrap()
        .write_all(b"dup")
        .unwrap();
    File::create(dir.path().join("b.txt"))
        .unwrap()
        .write_all(b"dup")
        .unwrap();
    let locked = dir.path().join("c.txt");
    File::create(&locked).unwrap().write_all(b"dup").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(groups.len(), 1);
    // Privileged users can still read the file; otherwise it is dropped with an error
    if summary.errors.is_empty() {
        assert_eq!(groups[0].files.len(), 3);
    } else {
        assert_eq!(groups[0].files.len(), 2);
        assert!(matches!(
            summary.errors[0],
            ScanError::Hash(HashError::PermissionDenied(_))
        ));
    }
}
