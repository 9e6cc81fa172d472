// ─── Progress, Cancellation, Reporting ───

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

/// Observer for one sync attempt.
///
/// Both callbacks default to no-ops and must be cheap; a caller that
/// needs to reach a UI thread marshals there itself.
pub trait SyncObserver: Send + Sync {
    /// Called with `done` strictly increasing and `total` fixed for
    /// the duration of the attempt.
    fn on_progress(&self, done: usize, total: usize) {
        let _ = (done, total);
    }

    /// Fire-and-forget log line. May be dropped or buffered.
    fn on_log(&self, message: &str) {
        let _ = message;
    }
}

/// Observer that ignores everything.
pub struct NullObserver;

impl SyncObserver for NullObserver {}

/// Cooperative cancellation flag, checked between entries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Phases of one sync attempt, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    LockAcquired,
    Diffing,
    Transferring,
    CleaningOrphans,
    ApplyingOverrides,
    CommittingState,
    Done,
}

impl SyncPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncPhase::LockAcquired => "lock-acquired",
            SyncPhase::Diffing => "diffing",
            SyncPhase::Transferring => "transferring",
            SyncPhase::CleaningOrphans => "cleaning-orphans",
            SyncPhase::ApplyingOverrides => "applying-overrides",
            SyncPhase::CommittingState => "committing-state",
            SyncPhase::Done => "done",
        }
    }
}

/// Outcome summary of a successful sync.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub pack_id: String,
    pub pack_version: i64,
    pub files_total: usize,
    pub files_downloaded: usize,
    pub files_skipped: usize,
    pub orphans_removed: usize,
    pub overrides_applied: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Serializes progress ticks so `done` reaches the observer in order
/// even when entries complete on parallel workers.
pub(crate) struct ProgressCounter<'a> {
    done: Mutex<usize>,
    total: usize,
    observer: &'a dyn SyncObserver,
}

impl<'a> ProgressCounter<'a> {
    pub fn new(total: usize, observer: &'a dyn SyncObserver) -> Self {
        observer.on_progress(0, total);
        Self {
            done: Mutex::new(0),
            total,
            observer,
        }
    }

    pub async fn tick(&self) {
        let mut done = self.done.lock().await;
        *done += 1;
        self.observer.on_progress(*done, self.total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct Recorder {
        calls: StdMutex<Vec<(usize, usize)>>,
    }

    impl SyncObserver for Recorder {
        fn on_progress(&self, done: usize, total: usize) {
            self.calls.lock().unwrap().push((done, total));
        }
    }

    #[tokio::test]
    async fn progress_is_monotone_with_fixed_total() {
        let recorder = Recorder {
            calls: StdMutex::new(Vec::new()),
        };
        let counter = ProgressCounter::new(3, &recorder);
        counter.tick().await;
        counter.tick().await;
        counter.tick().await;

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(*calls, vec![(0, 3), (1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn cancel_token_flips_once() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
