//! Progress reporting for scan sessions.
//!
//! The finder notifies a caller-supplied [`ProgressCallback`] from its
//! coordinating thread only; hashing workers never call it. Two sinks ship
//! with the crate:
//!
//! - [`Progress`] renders indicatif bars for terminal output
//! - [`ChannelProgress`] forwards [`ProgressEvent`] messages over a
//!   crossbeam channel for callers that prefer to poll

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Stage of a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanPhase {
    /// Candidate discovery. The total is unknown up front.
    Walking,
    /// Partial fingerprints for every member of a potential duplicate set.
    Hashing,
}

impl ScanPhase {
    /// Short lower-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Walking => "walking",
            Self::Hashing => "hashing",
        }
    }
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress callback for duplicate finding phases.
///
/// Implement this trait to receive progress updates during a scan.
/// `on_progress` receives a processed count that never decreases within a
/// phase.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts. `total` is 0 when unknown.
    fn on_phase_start(&self, phase: ScanPhase, total: usize);

    /// Called with the running count of processed items.
    fn on_progress(&self, processed: usize);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: ScanPhase);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    walking: Mutex<Option<ProgressBar>>,
    hashing: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupesweep::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            walking: Mutex::new(None),
            hashing: Mutex::new(None),
            quiet,
        }
    }

    fn walking_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn hashing_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn slot(&self, phase: ScanPhase) -> &Mutex<Option<ProgressBar>> {
        match phase {
            ScanPhase::Walking => &self.walking,
            ScanPhase::Hashing => &self.hashing,
        }
    }

    /// Run `f` on the bar of the most recently started phase still running.
    fn with_active_bar(&self, f: impl FnOnce(&ProgressBar)) {
        for slot in [&self.hashing, &self.walking] {
            if let Ok(guard) = slot.lock() {
                if let Some(ref pb) = *guard {
                    f(pb);
                    return;
                }
            }
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: ScanPhase, total: usize) {
        if self.quiet {
            return;
        }

        let pb = match phase {
            ScanPhase::Walking => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::walking_style());
                pb.set_message("Walking directory");
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
            ScanPhase::Hashing => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::hashing_style());
                pb.set_message("Hashing");
                pb
            }
        };

        if let Ok(mut slot) = self.slot(phase).lock() {
            *slot = Some(pb);
        }
    }

    fn on_progress(&self, processed: usize) {
        if self.quiet {
            return;
        }
        self.with_active_bar(|pb| pb.set_position(processed as u64));
    }

    fn on_phase_end(&self, phase: ScanPhase) {
        if self.quiet {
            return;
        }

        let finished = self.slot(phase).lock().ok().and_then(|mut slot| slot.take());
        if let Some(pb) = finished {
            pb.finish_with_message(match phase {
                ScanPhase::Walking => "Walking complete",
                ScanPhase::Hashing => "Hashing complete",
            });
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.with_active_bar(|pb| pb.set_message(message.to_string()));
    }
}

/// Progress notification forwarded by [`ChannelProgress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A phase started.
    PhaseStarted {
        phase: ScanPhase,
        total: usize,
    },
    /// Running processed count for the current phase.
    Processed(usize),
    /// A phase finished.
    PhaseFinished(ScanPhase),
    /// Free-form status text.
    Message(String),
}

/// Sink that turns callbacks into [`ProgressEvent`] messages.
///
/// Sending never blocks and silently stops once the receiver is dropped.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: Sender<ProgressEvent>,
}

impl ChannelProgress {
    /// Create a sink and the receiver its events arrive on.
    #[must_use]
    pub fn new() -> (Self, Receiver<ProgressEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }

    fn send(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}

impl ProgressCallback for ChannelProgress {
    fn on_phase_start(&self, phase: ScanPhase, total: usize) {
        self.send(ProgressEvent::PhaseStarted { phase, total });
    }

    fn on_progress(&self, processed: usize) {
        self.send(ProgressEvent::Processed(processed));
    }

    fn on_phase_end(&self, phase: ScanPhase) {
        self.send(ProgressEvent::PhaseFinished(phase));
    }

    fn on_message(&self, message: &str) {
        self.send(ProgressEvent::Message(message.to_string()));
    }
}
