use dupesweep::duplicates::{DuplicateFinder, FinderConfig};
use dupesweep::scanner::WalkerConfig;
use std::fs::{self, File};
use std::io::Write;
use tempfile::tempdir;

fn write(path: &std::path::Path, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

#[test]
fn test_paths_with_quotes() {
    let dir = tempdir().unwrap();

    // Windows does not allow double quotes in filenames.
    if cfg!(not(windows)) {
        write(&dir.path().join("file_with_\"quote\".txt"), b"content");
        write(&dir.path().join("duplicate.txt"), b"content");

        let finder = DuplicateFinder::with_defaults();
        let (groups, _) = finder.find_duplicates(dir.path()).unwrap();

        assert_eq!(groups.len(), 1);
        assert!(groups[0]
            .files
            .iter()
            .any(|f| f.to_string_lossy().contains('"')));
    }
}

#[test]
fn test_paths_with_spaces_and_unicode() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("my file.txt"), b"content");
    write(&dir.path().join("résumé 日本.txt"), b"content");

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 2);
}

#[test]
fn test_deeply_nested_duplicates() {
    let dir = tempdir().unwrap();
    let mut deep = dir.path().to_path_buf();
    for i in 0..20 {
        deep = deep.join(format!("level{i}"));
    }
    fs::create_dir_all(&deep).unwrap();

    write(&dir.path().join("top.txt"), b"nested copy");
    write(&deep.join("bottom.txt"), b"nested copy");

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert!(groups[0].files.contains(&deep.join("bottom.txt")));
}

#[test]
fn test_relative_root_reports_absolute_paths() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"same");
    write(&dir.path().join("b.txt"), b"same");

    // `..` components are kept; only the current directory is prepended
    let root = dir.path().join("sub").join("..");
    fs::create_dir(dir.path().join("sub")).unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(&root).unwrap();

    assert_eq!(groups.len(), 1);
    assert!(groups[0].files.iter().all(|f| f.is_absolute()));
}

#[test]
fn test_hidden_files_included_by_default() {
    let dir = tempdir().unwrap();
    write(&dir.path().join(".hidden.txt"), b"secret");
    write(&dir.path().join("visible.txt"), b"secret");

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(dir.path()).unwrap();
    assert_eq!(groups.len(), 1);

    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_skip_hidden(true));
    let (groups, _) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();
    assert!(groups.is_empty());
}

#[test]
fn test_root_gitignore_does_not_hide_duplicates_by_default() {
    let dir = tempdir().unwrap();
    write(&dir.path().join(".gitignore"), b"*.log\n");
    write(&dir.path().join("a.log"), b"content A");
    write(&dir.path().join("b.log"), b"content A");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 2);
    assert_eq!(summary.skipped.ignored, 0);
}

#[test]
fn test_root_gitignore_honored_when_enabled() {
    let dir = tempdir().unwrap();
    write(&dir.path().join(".gitignore"), b"build/\n");
    fs::create_dir(dir.path().join("build")).unwrap();
    write(&dir.path().join("build").join("out.o"), b"object");
    write(&dir.path().join("copy.o"), b"object");

    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_respect_gitignore(true));
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.skipped.ignored, 1);
}

#[cfg(unix)]
#[test]
fn test_symlinks_never_duplicate_their_target() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("target.txt");
    write(&target, b"linked content");
    std::os::unix::fs::symlink(&target, dir.path().join("link.txt")).unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.skipped.symlinks, 1);
}

#[cfg(unix)]
#[test]
fn test_hardlinks_are_reported_as_duplicates() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.txt");
    write(&original, b"shared inode");
    fs::hard_link(&original, dir.path().join("alias.txt")).unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 2);
}
