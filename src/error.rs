// src/error.rs

//! Error types for the catalog core
//!
//! Parsing is best-effort: malformed stanza fields and dependency
//! expressions are logged and skipped rather than propagated, so most of
//! these variants surface only through logs or targeted APIs. Only I/O
//! failures abort a batch load.

use thiserror::Error;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the catalog core
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed field inside a stanza (bad `Status`, bad `Conffiles` line)
    #[error("malformed {field} field: {reason}")]
    ParseStanza {
        field: &'static str,
        reason: String,
    },

    /// Unrecognized operator, missing closing paren, or bad name in a
    /// dependency expression; carries the offending token
    #[error("bad dependency expression: {0}")]
    ParseDepExpr(String),

    /// Stanza lacks a package name or a usable architecture
    #[error("stanza has no usable identity: {0}")]
    MissingIdentity(String),

    /// A back-reference expected to exist was missing
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),

    /// Feed or status file unreadable
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
