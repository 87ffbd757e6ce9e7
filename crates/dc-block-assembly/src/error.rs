//! Error types for block assembly.
//!
//! Per-candidate rejections and strategy bailouts are ordinary control
//! flow; only the cases below abort a template.

use thiserror::Error;

/// Result type alias for assembly operations.
pub type Result<T> = std::result::Result<T, AssemblyError>;

/// Errors that abort candidate construction.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// The completed candidate failed the external full-consensus check.
    /// The caller must retry against a fresh pool snapshot.
    #[error("candidate failed full validation: {reason}")]
    ValidationFailed {
        /// The consensus rule reported by the validator.
        reason: String,
    },

    /// The proofbase reservation alone exceeds the configured block size.
    #[error("proofbase reservation {reserve} exceeds max block size {max_block_size}")]
    ReserveTooLarge {
        /// Reserved header plus proofbase bytes.
        reserve: u64,
        /// Configured maximum block size.
        max_block_size: u64,
    },
}
