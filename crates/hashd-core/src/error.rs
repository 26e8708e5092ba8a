pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the hashing service core.
///
/// Client-input problems (bad verb, malformed id, missing field) are handled
/// at the transport boundary and never reach this crate; the store itself can
/// only refuse work, never fail it.
#[derive(Clone, Copy, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// A submission arrived after the shutdown transition. The service is
    /// draining and no longer issues identifiers.
    #[error("service is shutting down")]
    ShuttingDown,
}
