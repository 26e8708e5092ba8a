use portable_atomic::{AtomicU64, Ordering};

/// A lock-free allocator of strictly increasing submission identifiers.
///
/// Backed by a single [`AtomicU64`], so allocation never blocks on the hash
/// store's lock: the response path stays fast no matter how contended the
/// store is. The first issued identifier is `1`; `0` is never issued, which
/// lets the HTTP layer treat a zero id as malformed.
///
/// All operations use `SeqCst` ordering. The shutdown drain check compares
/// the settled-count against [`current`] while holding the store's write
/// lock, and must never observe a value older than the latest allocation.
///
/// [`current`]: SequenceAllocator::current
#[derive(Debug, Default)]
pub struct SequenceAllocator {
    next: AtomicU64,
}

impl SequenceAllocator {
    /// Creates an allocator whose first [`next_id`] call returns `1`.
    ///
    /// [`next_id`]: SequenceAllocator::next_id
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Atomically increments the counter and returns the new value.
    ///
    /// No two calls ever return the same value, at any concurrency level.
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the most recently issued identifier (`0` before the first
    /// allocation).
    pub fn current(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}
