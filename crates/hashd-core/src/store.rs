//! Shared service state: the identifier→digest map, aggregate statistics,
//! and the drain-based shutdown accounting.
//!
//! [`HashStore`] is the single serialization point for every piece of state
//! touched by more than one concurrent task. Request handlers submit and
//! read through it, completion tasks settle results into it, and the
//! shutdown path transitions it, all through one reader/writer lock, so the
//! "terminate only after every accepted submission has settled" check has a
//! race-free source of truth.

use crate::{Error, Result, SequenceAllocator};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Aggregate processing statistics, served as JSON by the stats endpoint.
///
/// `total` mirrors the sequence counter (submissions accepted, completed or
/// not); `average` is the mean wall-clock digest time in nanoseconds across
/// successful completions, `0` until the first one settles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Stats {
    pub total: u64,
    pub average: u64,
}

#[derive(Default)]
struct StoreInner {
    digests: HashMap<u64, String>,
    completed: u64,
    failed: u64,
    elapsed: Duration,
    draining: bool,
}

impl StoreInner {
    fn settled(&self) -> u64 {
        self.completed + self.failed
    }
}

/// The process-wide state object shared by request handlers, completion
/// tasks, and the shutdown path.
///
/// One instance is constructed at startup and passed by `Arc` into every
/// handler and task. The map, counters, and shutdown flag form a single
/// consistency domain under the inner [`RwLock`]; the sequence counter is a
/// separate atomic so the submission response path never waits on store
/// contention.
///
/// Shutdown is a one-way state machine: running → draining → terminated.
/// Both transitions are signalled through latched [`CancellationToken`]s, so
/// redundant signals are harmless and waiters cannot miss a wakeup.
pub struct HashStore {
    sequence: SequenceAllocator,
    inner: RwLock<StoreInner>,
    draining: CancellationToken,
    terminated: CancellationToken,
}

impl Default for HashStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HashStore {
    /// Creates an empty store in the running state.
    pub fn new() -> Self {
        Self {
            sequence: SequenceAllocator::new(),
            inner: RwLock::new(StoreInner::default()),
            draining: CancellationToken::new(),
            terminated: CancellationToken::new(),
        }
    }

    /// Accepts a submission and allocates its identifier.
    ///
    /// Allocation happens under the read lock: `begin_shutdown` flips the
    /// flag under the write lock, so an id is either issued before the
    /// transition (and therefore counted by every subsequent drain check) or
    /// refused. Without this, an id allocated between the flag flip and the
    /// final check could be orphaned by an exiting process.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShuttingDown`] once the shutdown transition has
    /// happened.
    pub fn submit(&self) -> Result<u64> {
        let inner = self.inner.read();
        if inner.draining {
            return Err(Error::ShuttingDown);
        }
        Ok(self.sequence.next_id())
    }

    /// Looks up the digest recorded for `id`, if any.
    ///
    /// `None` covers both "never submitted" and "submitted but not yet
    /// settled"; callers cannot tell the difference, matching the service's
    /// external contract.
    pub fn get(&self, id: u64) -> Option<String> {
        self.inner.read().digests.get(&id).cloned()
    }

    /// Records a successful digest computation for `id`.
    ///
    /// Adds `elapsed` to the cumulative processing time, bumps the
    /// completed-count, and evaluates the drain condition while still
    /// holding the write lock. The in-lock check is load-bearing: released
    /// first, the last completion and a concurrent shutdown request could
    /// each conclude the other will fire the termination signal.
    pub fn record(&self, id: u64, digest: String, elapsed: Duration) {
        let mut inner = self.inner.write();
        inner.digests.insert(id, digest);
        inner.elapsed += elapsed;
        inner.completed += 1;
        self.signal_if_drained(&inner);
    }

    /// Settles one submission as failed after a completion task fault.
    ///
    /// The submission's id stays perpetually not-found and contributes
    /// nothing to the average, but shutdown accounting still converges: a
    /// lost task must not stall the drain forever.
    pub fn record_failure(&self) {
        let mut inner = self.inner.write();
        inner.failed += 1;
        self.signal_if_drained(&inner);
    }

    /// Returns the current statistics snapshot.
    ///
    /// `total` may lead the settled-count at any time: submissions are
    /// counted on acceptance, completions when they settle.
    pub fn stats(&self) -> Stats {
        let inner = self.inner.read();
        let average = if inner.completed == 0 {
            0
        } else {
            (inner.elapsed.as_nanos() / u128::from(inner.completed)) as u64
        };
        Stats {
            total: self.sequence.current(),
            average,
        }
    }

    /// Number of accepted submissions that have not yet settled.
    pub fn outstanding(&self) -> u64 {
        let inner = self.inner.read();
        self.sequence.current() - inner.settled()
    }

    /// Performs the running → draining transition.
    ///
    /// Idempotent: repeated calls (or calls after termination) are no-ops.
    /// On the first call this latches the shutdown flag, fires the
    /// [`draining`] signal that stops the network listener, and evaluates
    /// the drain condition, so a shutdown with zero outstanding work
    /// terminates immediately.
    ///
    /// [`draining`]: HashStore::draining
    pub fn begin_shutdown(&self) {
        let mut inner = self.inner.write();
        if inner.draining {
            return;
        }
        inner.draining = true;
        self.draining.cancel();
        self.signal_if_drained(&inner);
    }

    /// Resolves once shutdown has been requested and new work must stop
    /// being accepted.
    pub async fn draining(&self) {
        self.draining.cancelled().await;
    }

    /// Resolves once shutdown has been requested *and* every accepted
    /// submission has settled. The signal is latched; awaiting after the
    /// fact returns immediately.
    pub async fn terminated(&self) {
        self.terminated.cancelled().await;
    }

    // Caller must hold the write lock. Safe to evaluate redundantly: the
    // token latches, extra cancels are no-ops.
    fn signal_if_drained(&self, inner: &StoreInner) {
        if inner.draining && inner.settled() == self.sequence.current() {
            self.terminated.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sha512_base64;
    use std::time::Duration;
    use tokio::time::timeout;

    const TICK: Duration = Duration::from_millis(50);

    #[test]
    fn submissions_get_dense_ids() {
        let store = HashStore::new();
        assert_eq!(store.submit().unwrap(), 1);
        assert_eq!(store.submit().unwrap(), 2);
        assert_eq!(store.submit().unwrap(), 3);
        assert_eq!(store.outstanding(), 3);
    }

    #[test]
    fn get_is_none_until_recorded() {
        let store = HashStore::new();
        let id = store.submit().unwrap();
        assert_eq!(store.get(id), None);
        assert_eq!(store.get(999), None);

        let digest = sha512_base64(b"angryMonkey");
        store.record(id, digest.clone(), Duration::from_micros(10));
        assert_eq!(store.get(id).as_deref(), Some(digest.as_str()));
    }

    #[test]
    fn stats_average_is_zero_until_first_completion() {
        let store = HashStore::new();
        assert_eq!(store.stats(), Stats { total: 0, average: 0 });

        let id = store.submit().unwrap();
        assert_eq!(store.stats(), Stats { total: 1, average: 0 });

        store.record(id, sha512_base64(b"a"), Duration::from_nanos(3_000));
        let id = store.submit().unwrap();
        store.record(id, sha512_base64(b"b"), Duration::from_nanos(1_000));

        assert_eq!(store.stats(), Stats { total: 2, average: 2_000 });
    }

    #[test]
    fn failures_do_not_skew_the_average() {
        let store = HashStore::new();
        let id = store.submit().unwrap();
        store.record_failure();

        assert_eq!(store.stats(), Stats { total: 1, average: 0 });
        assert_eq!(store.get(id), None);
        assert_eq!(store.outstanding(), 0);
    }

    #[tokio::test]
    async fn shutdown_with_no_submissions_terminates_immediately() {
        let store = HashStore::new();
        store.begin_shutdown();
        timeout(TICK, store.terminated())
            .await
            .expect("termination should be signalled with zero outstanding work");
    }

    #[tokio::test]
    async fn drain_waits_for_every_outstanding_submission() {
        let store = HashStore::new();
        let a = store.submit().unwrap();
        let b = store.submit().unwrap();

        store.begin_shutdown();
        timeout(TICK, store.draining())
            .await
            .expect("draining should be signalled as soon as shutdown is requested");
        assert!(
            timeout(TICK, store.terminated()).await.is_err(),
            "must not terminate while submissions are outstanding"
        );

        // Completion order is unrelated to issuance order.
        store.record(b, sha512_base64(b"b"), Duration::from_micros(5));
        assert!(timeout(TICK, store.terminated()).await.is_err());

        store.record(a, sha512_base64(b"a"), Duration::from_micros(5));
        timeout(TICK, store.terminated())
            .await
            .expect("termination should follow the final completion");
    }

    #[tokio::test]
    async fn faulted_task_still_allows_drain() {
        let store = HashStore::new();
        let _id = store.submit().unwrap();
        store.begin_shutdown();

        assert!(timeout(TICK, store.terminated()).await.is_err());
        store.record_failure();
        timeout(TICK, store.terminated())
            .await
            .expect("a settled failure should count toward the drain");
    }

    #[tokio::test]
    async fn shutdown_is_idempotent_and_refuses_new_work() {
        let store = HashStore::new();
        store.begin_shutdown();
        store.begin_shutdown();

        assert_eq!(store.submit(), Err(Error::ShuttingDown));
        timeout(TICK, store.terminated()).await.unwrap();

        // Redundant transitions after termination stay no-ops.
        store.begin_shutdown();
        timeout(TICK, store.terminated()).await.unwrap();
    }

    #[test]
    fn stats_serialize_to_the_wire_shape() {
        let stats = Stats { total: 1, average: 0 };
        assert_eq!(
            serde_json::to_string(&stats).unwrap(),
            r#"{"total":1,"average":0}"#
        );
    }
}
