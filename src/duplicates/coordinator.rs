//! Bounded hashing coordinator.
//!
//! # Overview
//!
//! The coordinator drives both hashing stages for every potential duplicate
//! set of a scan:
//!
//! 1. One partial-stage task per bucket member ([`Hasher::fingerprint`])
//! 2. Once every member of a bucket has reported, members are split by
//!    fingerprint and each collision group becomes a full-digest job
//! 3. Once every member of a job has reported, members are grouped by
//!    SHA-256 digest and handed to the [`DuplicateAggregator`]
//!
//! Tasks run on one rayon pool owned by the scan session. Each task sends
//! its outcome over a crossbeam channel; the thread calling
//! [`Coordinator::run`] is the only one that touches bucket state, job state
//! or the aggregator. At most `4 × threads` tasks are in flight at a time,
//! so buckets are registered lazily as the window drains.
//!
//! # Fallback digests
//!
//! Files too small for a head+tail fingerprint come back from the partial
//! stage with their full digest already computed. A bucket where every
//! member did so is grouped directly. A bucket mixing both kinds (a tail seek
//! failed for some members) verifies every fingerprinted member with a full
//! digest, so no pair of identical files is ever split across the two kinds.
//!
//! # Cancellation
//!
//! The [`CancelToken`] is checked before every submission. After it fires,
//! queued work is dropped, in-flight tasks are drained and unfinished buckets
//! and jobs are discarded. Groups already handed to the aggregator stay.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crossbeam_channel::Sender;
use rayon::{ThreadPool, ThreadPoolBuildError};

use super::aggregator::DuplicateAggregator;
use super::groups::{group_by_digest, partition_by_fingerprint, Bucket, BucketKey, BucketMember};
use crate::progress::{ProgressCallback, ScanPhase};
use crate::scanner::{ContentDigest, Fingerprint, HashError, Hasher};
use crate::signal::CancelToken;

/// Tasks allowed in flight per pool thread.
const WINDOW_PER_THREAD: usize = 4;

/// Statistics from the hashing stages.
#[derive(Debug, Default)]
pub struct HashingStats {
    /// Partial-stage outcomes received (success or failure)
    pub fingerprinted: usize,
    /// Files whose partial stage fell back to a full digest
    pub fallback_files: usize,
    /// Full SHA-256 digests computed, fallbacks included
    pub full_digests: usize,
    /// Files dropped because no other member shared their fingerprint
    pub eliminated_by_fingerprint: usize,
    /// Whether cancellation cut the stage short
    pub interrupted: bool,
    /// Files dropped because they could not be read
    pub errors: Vec<HashError>,
}

/// Unit of work executed on the pool.
#[derive(Debug)]
enum Task {
    Partial {
        bucket: usize,
        size: u64,
        member: BucketMember,
    },
    Full {
        job: usize,
        member: BucketMember,
    },
}

impl Task {
    fn run(self, hasher: &Hasher) -> Outcome {
        match self {
            Self::Partial {
                bucket,
                size,
                member,
            } => {
                let result = hasher.fingerprint(&member.path, size);
                Outcome::Partial {
                    bucket,
                    member,
                    result,
                }
            }
            Self::Full { job, member } => {
                let result = hasher.full_digest(&member.path);
                Outcome::Full {
                    job,
                    member,
                    result,
                }
            }
        }
    }
}

/// Result sent back from the pool.
#[derive(Debug)]
enum Outcome {
    Partial {
        bucket: usize,
        member: BucketMember,
        result: Result<Fingerprint, HashError>,
    },
    Full {
        job: usize,
        member: BucketMember,
        result: Result<ContentDigest, HashError>,
    },
}

/// A potential duplicate set waiting for its partial-stage outcomes.
#[derive(Debug)]
struct BucketState {
    key: BucketKey,
    fingerprinted: Vec<(BucketMember, Fingerprint)>,
    pending: usize,
}

/// A fingerprint collision group waiting for its full digests.
#[derive(Debug)]
struct FullJob {
    size: u64,
    digested: Vec<(BucketMember, ContentDigest)>,
    pending: usize,
}

/// Runs hashing work for one scan session on a bounded pool.
pub struct Coordinator {
    pool: ThreadPool,
    threads: usize,
    hasher: Arc<Hasher>,
    cancel: Option<CancelToken>,
    progress: Option<Arc<dyn ProgressCallback>>,
    progress_interval: usize,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("threads", &self.threads)
            .field("hasher", &self.hasher)
            .field("cancel", &self.cancel)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .field("progress_interval", &self.progress_interval)
            .finish()
    }
}

impl Coordinator {
    /// Build the pool. `threads == 0` uses the available parallelism.
    ///
    /// # Errors
    ///
    /// Returns the rayon error if the pool threads cannot be spawned.
    pub fn new(threads: usize, hasher: Hasher) -> Result<Self, ThreadPoolBuildError> {
        let threads = if threads == 0 {
            std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
        } else {
            threads
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("dupesweep-hash-{i}"))
            .build()?;

        log::debug!("Hashing pool ready with {} threads", threads);

        Ok(Self {
            pool,
            threads,
            hasher: Arc::new(hasher),
            cancel: None,
            progress: None,
            progress_interval: 100,
        })
    }

    /// Observe `token` between submissions.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Report hashing progress to `callback`.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Notify progress every `interval` partial-stage outcomes.
    #[must_use]
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Number of pool threads.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.threads
    }

    fn window(&self) -> usize {
        self.threads * WINDOW_PER_THREAD
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Hash every potential duplicate set and feed verified groups to
    /// `aggregator`.
    ///
    /// Per-file failures are collected in the returned stats; they never stop
    /// the run.
    pub fn run(&self, sets: Vec<Bucket>, aggregator: &mut DuplicateAggregator) -> HashingStats {
        let total: usize = sets.iter().map(Bucket::len).sum();
        log::info!(
            "Hashing {} files in {} sets ({} threads)",
            total,
            sets.len(),
            self.threads
        );

        if let Some(ref callback) = self.progress {
            callback.on_phase_start(ScanPhase::Hashing, total);
        }

        let (tx, rx) = crossbeam_channel::unbounded();
        let mut session = Session::new(self, tx, aggregator, total);
        let mut sets = sets.into_iter();

        loop {
            session.fill(&mut sets);
            if session.in_flight == 0 {
                break;
            }
            match rx.recv() {
                Ok(outcome) => session.handle(outcome),
                Err(_) => break,
            }
        }

        let mut stats = session.finish();
        stats.interrupted = self.is_cancelled();

        if let Some(ref callback) = self.progress {
            callback.on_phase_end(ScanPhase::Hashing);
        }

        log::info!(
            "Hashing complete: {} fingerprinted, {} eliminated by fingerprint, {} full digests, {} dropped",
            stats.fingerprinted,
            stats.eliminated_by_fingerprint,
            stats.full_digests,
            stats.errors.len()
        );

        stats
    }
}

/// Coordinating-thread state for one [`Coordinator::run`] call.
struct Session<'a> {
    coordinator: &'a Coordinator,
    tx: Sender<Outcome>,
    aggregator: &'a mut DuplicateAggregator,
    queue: VecDeque<Task>,
    buckets: Vec<Option<BucketState>>,
    jobs: Vec<Option<FullJob>>,
    in_flight: usize,
    total: usize,
    stats: HashingStats,
}

impl<'a> Session<'a> {
    fn new(
        coordinator: &'a Coordinator,
        tx: Sender<Outcome>,
        aggregator: &'a mut DuplicateAggregator,
        total: usize,
    ) -> Self {
        Self {
            coordinator,
            tx,
            aggregator,
            queue: VecDeque::new(),
            buckets: Vec::new(),
            jobs: Vec::new(),
            in_flight: 0,
            total,
            stats: HashingStats::default(),
        }
    }

    /// Submit queued work, registering new buckets as needed, until the
    /// window is full or nothing is left.
    fn fill(&mut self, sets: &mut impl Iterator<Item = Bucket>) {
        while self.in_flight < self.coordinator.window() {
            if self.coordinator.is_cancelled() {
                if !self.queue.is_empty() {
                    log::debug!("Cancellation requested, dropping {} queued tasks", self.queue.len());
                    self.queue.clear();
                }
                return;
            }

            if let Some(task) = self.queue.pop_front() {
                self.spawn(task);
                continue;
            }

            match sets.next() {
                Some(bucket) => self.register(bucket),
                None => return,
            }
        }
    }

    fn register(&mut self, bucket: Bucket) {
        let id = self.buckets.len();
        let size = bucket.key.size;
        for member in bucket.members() {
            self.queue.push_back(Task::Partial {
                bucket: id,
                size,
                member,
            });
        }
        self.buckets.push(Some(BucketState {
            pending: bucket.len(),
            fingerprinted: Vec::with_capacity(bucket.len()),
            key: bucket.key,
        }));
    }

    fn spawn(&mut self, task: Task) {
        let hasher = Arc::clone(&self.coordinator.hasher);
        let tx = self.tx.clone();
        self.coordinator.pool.spawn(move || {
            let _ = tx.send(task.run(&hasher));
        });
        self.in_flight += 1;
    }

    fn handle(&mut self, outcome: Outcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match outcome {
            Outcome::Partial {
                bucket,
                member,
                result,
            } => {
                self.stats.fingerprinted += 1;
                self.notify_progress();
                self.on_partial(bucket, member, result);
            }
            Outcome::Full {
                job,
                member,
                result,
            } => self.on_full(job, member, result),
        }
    }

    fn notify_progress(&self) {
        let Some(ref callback) = self.coordinator.progress else {
            return;
        };
        let processed = self.stats.fingerprinted;
        if processed % self.coordinator.progress_interval == 0 || processed == self.total {
            callback.on_progress(processed);
        }
    }

    fn record_error(&mut self, error: HashError) {
        if error.is_cancelled() {
            log::trace!("{}", error);
            return;
        }
        log::warn!("Dropping unreadable file: {}", error);
        self.stats.errors.push(error);
    }

    fn on_partial(
        &mut self,
        bucket: usize,
        member: BucketMember,
        result: Result<Fingerprint, HashError>,
    ) {
        let fingerprint = match result {
            Ok(fingerprint) => {
                if fingerprint.is_full() {
                    self.stats.fallback_files += 1;
                    self.stats.full_digests += 1;
                }
                Some(fingerprint)
            }
            Err(e) => {
                self.record_error(e);
                None
            }
        };

        let Some(state) = self.buckets.get_mut(bucket).and_then(Option::as_mut) else {
            return;
        };
        state.pending = state.pending.saturating_sub(1);
        if let Some(fingerprint) = fingerprint {
            state.fingerprinted.push((member, fingerprint));
        }
        if state.pending > 0 {
            return;
        }

        let Some(state) = self.buckets[bucket].take() else {
            return;
        };
        if self.coordinator.is_cancelled() {
            log::debug!("Discarding bucket [{}] after cancellation", state.key);
            return;
        }
        self.resolve_bucket(state);
    }

    /// Turn a fully fingerprinted bucket into groups or full-digest jobs.
    fn resolve_bucket(&mut self, state: BucketState) {
        let BucketState {
            key,
            fingerprinted,
            ..
        } = state;

        let has_full = fingerprinted.iter().any(|(_, fp)| fp.is_full());
        let has_partial = fingerprinted.iter().any(|(_, fp)| !fp.is_full());

        if !has_partial {
            let digested = fingerprinted
                .into_iter()
                .filter_map(|(member, fp)| match fp {
                    Fingerprint::Full(digest) => Some((member, digest)),
                    Fingerprint::Partial(_) => None,
                })
                .collect();
            self.aggregator.extend(group_by_digest(key.size, digested));
            return;
        }

        if has_full {
            log::debug!(
                "Bucket [{}] mixes fallback digests with fingerprints, verifying all members",
                key
            );
            let mut known = Vec::new();
            let mut unknown = Vec::new();
            for (member, fp) in fingerprinted {
                match fp {
                    Fingerprint::Full(digest) => known.push((member, digest)),
                    Fingerprint::Partial(_) => unknown.push(member),
                }
            }
            self.start_full_job(key.size, known, unknown);
            return;
        }

        for group in partition_by_fingerprint(&key, fingerprinted) {
            if group.needs_verification() {
                log::debug!(
                    "Bucket [{}]: {} files share a fingerprint, verifying",
                    key,
                    group.members.len()
                );
                self.start_full_job(key.size, Vec::new(), group.members);
            } else {
                self.stats.eliminated_by_fingerprint += group.members.len();
                for member in &group.members {
                    log::trace!("Unique fingerprint: {}", member.path.display());
                }
            }
        }
    }

    fn start_full_job(
        &mut self,
        size: u64,
        known: Vec<(BucketMember, ContentDigest)>,
        unknown: Vec<BucketMember>,
    ) {
        let id = self.jobs.len();
        let pending = unknown.len();
        for member in unknown {
            self.queue.push_back(Task::Full { job: id, member });
        }
        self.jobs.push(Some(FullJob {
            size,
            digested: known,
            pending,
        }));
    }

    fn on_full(
        &mut self,
        job: usize,
        member: BucketMember,
        result: Result<ContentDigest, HashError>,
    ) {
        let digest = match result {
            Ok(digest) => {
                self.stats.full_digests += 1;
                Some(digest)
            }
            Err(e) => {
                self.record_error(e);
                None
            }
        };

        let Some(state) = self.jobs.get_mut(job).and_then(Option::as_mut) else {
            return;
        };
        state.pending = state.pending.saturating_sub(1);
        if let Some(digest) = digest {
            state.digested.push((member, digest));
        }
        if state.pending > 0 {
            return;
        }

        let Some(state) = self.jobs[job].take() else {
            return;
        };
        if self.coordinator.is_cancelled() {
            log::debug!("Discarding full-digest job after cancellation");
            return;
        }
        self.aggregator.extend(group_by_digest(state.size, state.digested));
    }

    fn finish(self) -> HashingStats {
        let unfinished = self.buckets.iter().flatten().count() + self.jobs.iter().flatten().count();
        if unfinished > 0 {
            log::debug!("{} unfinished buckets/jobs discarded", unfinished);
        }
        self.stats
    }
}
