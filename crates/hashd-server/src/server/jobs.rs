//! Completion tasks: the asynchronous half of a submission.
//!
//! Each accepted submission spawns exactly one detached task that sleeps the
//! configured delay, computes the SHA-512 digest, and settles the result
//! into the shared [`HashStore`]. Tasks run independently of each other and
//! of the request handlers; once accepted they are never cancelled, the
//! drain-based shutdown protocol waits for them instead.

use futures::FutureExt;
use hashd_core::{HashStore, sha512_base64};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Spawns the completion task for an accepted submission.
///
/// Returns immediately; the submission response never waits on the digest.
/// Elapsed time is measured around the digest computation only; the
/// artificial delay is excluded from the statistics.
///
/// The task body runs under a fault boundary: a panic is caught, logged, and
/// settled as a failure so it can neither crash the process nor stall the
/// drain. `parking_lot` locks do not poison, so the store stays usable after
/// a caught fault.
pub fn spawn_digest(store: Arc<HashStore>, delay: Duration, id: u64, password: String) {
    tokio::spawn(async move {
        let work = async {
            tokio::time::sleep(delay).await;

            let start = Instant::now();
            let digest = sha512_base64(password.as_bytes());
            let elapsed = start.elapsed();

            store.record(id, digest, elapsed);
        };

        if let Err(panic) = AssertUnwindSafe(work).catch_unwind().await {
            tracing::error!("Hash job {} panicked: {}", id, panic_message(panic.as_ref()));
            store.record_failure();
        }
    });
}

/// Best-effort extraction of a human-readable panic payload.
pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn job_settles_the_submission() {
        let store = Arc::new(HashStore::new());
        let id = store.submit().unwrap();

        spawn_digest(Arc::clone(&store), Duration::ZERO, id, "angryMonkey".into());

        store.begin_shutdown();
        timeout(Duration::from_secs(1), store.terminated())
            .await
            .expect("job should settle and complete the drain");

        assert_eq!(
            store.get(id).as_deref(),
            Some("ZEHhWB65gUlzdVwtDQArEyx+KVLzp/aTaRaPlBzYRIFj6vjFdqEb0Q5B8zVKCZ0vKbZPZklJz0Fd7su2A+gf7Q==")
        );
        assert!(store.stats().average > 0);
    }

    #[tokio::test]
    async fn delayed_job_does_not_block_the_caller() {
        let store = Arc::new(HashStore::new());
        let id = store.submit().unwrap();

        let before = Instant::now();
        spawn_digest(Arc::clone(&store), Duration::from_secs(3600), id, "p".into());
        assert!(before.elapsed() < Duration::from_millis(100));

        // The job is still sleeping; nothing has settled.
        assert_eq!(store.get(id), None);
        assert_eq!(store.outstanding(), 1);
    }
}
