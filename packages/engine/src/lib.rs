//! Minutario Engine
//!
//! A Rust implementation of the notarial document engine.
//! This library provides functionality for:
//! - Transcribing numbers, dates and identifiers into Spanish words
//! - Grouping parties into conjugal pairs for the comparecientes section
//! - Resolving nested aclaratoria clause chains in title histories
//! - Normalizing lawyer-authored rich text into template-ready runs
//! - Assembling the full rendering context for minutas and deeds
//!
//! # Example
//!
//! ```ignore
//! use minutario_engine::{build_minuta_context, ActingUser, MinutaForm};
//! use chrono::Local;
//!
//! let form: MinutaForm = serde_json::from_str(payload)?;
//! let user = ActingUser {
//!     id: 7,
//!     username: "matrizador1".to_string(),
//!     role: "matrizador".to_string(),
//! };
//!
//! let context = build_minuta_context(&form, &user, Local::now().date_naive())?;
//! // hand `context` to the template renderer
//! ```

pub mod clauses;
pub mod config;
pub mod context;
pub mod error;
pub mod grouping;
pub mod party;
pub mod richtext;
pub mod service;
pub mod transcribe;
pub mod types;

// Re-export commonly used items
pub use clauses::{resolve_clauses, ClauseNode, RawClause};
pub use context::{
    build_matriz_context, build_minuta_context, MatrizForm, MinutaForm, Narrative, PropertyKind,
};
pub use error::{GenerationError, Result};
pub use grouping::{group_by_partnership, Group, GroupKind};
pub use party::{validate_cedula, validate_phone, Party};
pub use richtext::{normalize, NormalizeMode, NormalizedText};
pub use service::{DocumentKind, DocumentRecord, DocumentService, TemplateRenderer};
pub use transcribe::{
    age_in_years, decimal_to_words, house_number_to_words, to_digit_words, to_notarial_date,
    to_ordinal_feminine, to_plain_date, to_words,
};
pub use types::{ActingUser, Numeric, RenderingContext, StyledRun, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
