// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Engine error types.
//!
//! Mutators return these as typed results so callers can show a specific
//! message; nothing in the public API panics. A subscription transport
//! failure is NOT propagated through this type; it is recorded in the
//! affected shard's cache entry (see `sync::cache`).

/// Error type for all engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A shard document or an item key was absent on a read-modify-write.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unparseable date input (shard key calculation, fire-time derivation).
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Store read/write/subscription failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed mutation payload (missing or inconsistent fields).
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    /// Short machine-readable kind, used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::NotFound(_) => "not_found",
            EngineError::InvalidDate(_) => "invalid_date",
            EngineError::Transport(_) => "transport",
            EngineError::Validation(_) => "validation",
            EngineError::Internal(_) => "internal",
        }
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
