//! Configuration constants for the Minutario engine
//!
//! Centralized limits used throughout the engine for:
//! - Recursion depth (fail cleanly instead of overflowing the stack)
//! - Payload sizes (operator-fed input, but bounded anyway)
//! - Transcription magnitude (legal documents top out at millions)
//!
//! # Customization
//!
//! Currently these are compile-time constants. Future versions may
//! support runtime configuration if notarial offices need different
//! bounds.

/// Maximum magnitude accepted by the numeral transcriber.
///
/// Spanish composition through "millones" covers every amount a deed
/// can state; twelve digits is far beyond any cuantía seen in practice.
pub const MAX_TRANSCRIBABLE: i64 = 999_999_999_999;

/// Maximum nesting depth for aclaratoria clause chains.
///
/// Title histories rarely nest past three or four amendments; 32 levels
/// is generous while still catching malformed cyclic-looking input.
pub const MAX_CLAUSE_DEPTH: usize = 32;

/// Maximum number of parties on either side of a transaction.
///
/// Successions with many heirs are the largest real case (~20 parties).
pub const MAX_PARTIES: usize = 50;

/// Maximum rich-text markup size in bytes (256 KB).
///
/// Manually drafted clauses are a few pages at most; beyond this the
/// normalizer falls back to plain text extraction.
pub const MAX_MARKUP_SIZE: usize = 256_000;
