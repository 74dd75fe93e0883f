use dupesweep::duplicates::{DuplicateFinder, FinderConfig};
use dupesweep::progress::{ProgressCallback, ScanPhase};
use dupesweep::signal::CancelToken;
use std::fs::File;
use std::io::Write;
use std::sync::Arc;
use tempfile::tempdir;

fn populate(dir: &std::path::Path, pairs: usize) {
    for i in 0..pairs {
        let content = format!("pair content {i:05}");
        for side in ["a", "b"] {
            File::create(dir.join(format!("{side}{i:05}.txt")))
                .unwrap()
                .write_all(content.as_bytes())
                .unwrap();
        }
    }
}

/// Cancels the scan as soon as a given phase starts.
struct CancelOnPhase {
    phase: ScanPhase,
    token: CancelToken,
}

impl ProgressCallback for CancelOnPhase {
    fn on_phase_start(&self, phase: ScanPhase, _total: usize) {
        if phase == self.phase {
            self.token.cancel();
        }
    }
    fn on_progress(&self, _processed: usize) {}
    fn on_phase_end(&self, _phase: ScanPhase) {}
}

#[test]
fn test_cancel_before_scan_returns_interrupted() {
    let dir = tempdir().unwrap();
    populate(dir.path(), 20);

    let token = CancelToken::new();
    token.cancel();
    let finder = DuplicateFinder::new(FinderConfig::default().with_cancel_token(token));

    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(summary.interrupted);
    assert!(groups.is_empty());
    assert!(summary.errors.is_empty());
}

#[test]
fn test_cancel_at_hashing_start_discards_pending_work() {
    let dir = tempdir().unwrap();
    populate(dir.path(), 50);

    let token = CancelToken::new();
    let callback = Arc::new(CancelOnPhase {
        phase: ScanPhase::Hashing,
        token: token.clone(),
    });
    let config = FinderConfig::default()
        .with_cancel_token(token)
        .with_progress_callback(callback);
    let finder = DuplicateFinder::new(config);

    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(summary.interrupted);
    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 100);
    // Cancelled reads are not reported as failures
    assert!(summary.errors.is_empty());
}

#[test]
fn test_uncancelled_token_runs_to_completion() {
    let dir = tempdir().unwrap();
    populate(dir.path(), 10);

    let token = CancelToken::new();
    let finder = DuplicateFinder::new(FinderConfig::default().with_cancel_token(token.clone()));
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(!token.is_cancelled());
    assert!(!summary.interrupted);
    assert_eq!(groups.len(), 10);
}
