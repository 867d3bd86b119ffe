//! Unified error handling for the engine core.
//!
//! Mirrors the five error kinds the spec distinguishes (§7): generation
//! failures, persistence unavailability, invalid mutations, exhausted
//! resource pools, and missing assets. All of these degrade gracefully —
//! `EngineError` is never allowed to unwind out of a frame; callers either
//! log it, retry, or fall back. Panics stay reserved for invariant
//! violations caught by `debug_assert!` in debug builds.

/// Crate-wide result alias.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A generation worker failed to produce output for a chunk; the chunk
    /// stays `Pending` and queries fall through to the physics fallback.
    #[error("chunk generation failed for ({cx}, {cz}): {reason}")]
    TransientGenerator { cx: i32, cz: i32, reason: String },

    /// The durable store is unreachable; deltas remain cached in memory.
    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    /// Attempted to remove bedrock, or to place a block that would
    /// intersect the player's AABB.
    #[error("invalid mutation: {0}")]
    InvalidMutation(String),

    /// An effect pool (particles, explosion spheres, tracers) is at
    /// capacity; the new effect is silently dropped.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// An entity anchor's model handle could not be resolved by the asset
    /// loader; the anchor becomes a no-op.
    #[error("asset missing: {0}")]
    AssetMissing(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// A bug in our own bookkeeping (an invariant we believed held did
    /// not). Distinct from the environment-facing variants above.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e.to_string())
    }
}

impl From<bincode::Error> for EngineError {
    fn from(e: bincode::Error) -> Self {
        EngineError::Serialization(e.to_string())
    }
}

impl From<sled::Error> for EngineError {
    fn from(e: sled::Error) -> Self {
        EngineError::PersistenceUnavailable(e.to_string())
    }
}

/// Attaches context to an `Option` the way `anyhow::Context` does, but
/// producing an `EngineError` so the crate never needs two error
/// vocabularies at once.
pub trait ErrorContext<T> {
    fn context(self, msg: &str) -> EngineResult<T>;
}

impl<T> ErrorContext<T> for Option<T> {
    fn context(self, msg: &str) -> EngineResult<T> {
        self.ok_or_else(|| EngineError::Internal(msg.to_string()))
    }
}
