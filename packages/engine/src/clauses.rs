//! Recursive resolution of title-history clauses
//!
//! Acquisition histories and horizontal-property declarations share one
//! record shape: who granted the title, before which notary, and where
//! it was registered. Each record may carry a chain of aclaratoria
//! (clarificatory amendment) clauses, themselves records of the same
//! shape, nested without bound in practice.
//!
//! The resolver transcribes every date, derives the notary office
//! ordinal, and computes whether notarization and registration happened
//! in the same canton. Nesting is naturally a tree (built from strictly
//! nested input, so no cycles), but a generous depth guard still turns
//! malformed cyclic-looking input into a clean error instead of a stack
//! overflow.

use crate::config;
use crate::error::{GenerationError, Result};
use crate::transcribe;
use serde::{Deserialize, Serialize};

/// One raw title record as sent by the form, aclaratorias included.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawClause {
    #[serde(default)]
    pub titulo: Option<String>,
    #[serde(default)]
    pub titulo_otro: Option<String>,
    #[serde(default)]
    pub adquirido_de: Option<String>,
    #[serde(default)]
    pub fecha_otorgamiento: Option<String>,
    #[serde(default)]
    pub numero_notaria: Option<String>,
    #[serde(default)]
    pub canton_notaria: Option<String>,
    #[serde(default)]
    pub notario: Option<String>,
    #[serde(default)]
    pub fecha_inscripcion: Option<String>,
    #[serde(default)]
    pub canton_inscripcion: Option<String>,
    /// Nested amendment clauses, oldest first.
    #[serde(default, alias = "clauses")]
    pub aclaratorias: Vec<RawClause>,
}

/// One resolved title record ready for the template.
#[derive(Debug, Clone, Serialize)]
pub struct ClauseNode {
    pub titulo: String,
    pub titulo_otro: String,
    pub adquirido_de: String,
    /// Grant date in words, empty when absent.
    pub fecha_otorgamiento: String,
    pub numero_notaria: String,
    /// Feminine ordinal of the notary office ("Vigésima Segunda").
    pub notaria_ordinal: String,
    pub canton_notaria: String,
    pub notario: String,
    /// Inscription date in words, empty when absent.
    pub fecha_inscripcion: String,
    pub canton_inscripcion: String,
    /// Notarization and registration canton match (case-insensitive);
    /// false when either canton is absent.
    pub mismo_canton: bool,
    /// Resolved children; empty for a leaf, never null.
    pub aclaratorias: Vec<ClauseNode>,
}

/// Resolve a list of raw title records into an ordered clause tree.
///
/// # Errors
/// * `InvalidDate` for a present but malformed date field
/// * `ClauseDepthExceeded` past [`config::MAX_CLAUSE_DEPTH`]
pub fn resolve_clauses(raw: &[RawClause]) -> Result<Vec<ClauseNode>> {
    resolve_at(raw, 0)
}

fn resolve_at(raw: &[RawClause], depth: usize) -> Result<Vec<ClauseNode>> {
    if depth >= config::MAX_CLAUSE_DEPTH {
        return Err(GenerationError::ClauseDepthExceeded {
            max: config::MAX_CLAUSE_DEPTH,
        });
    }

    raw.iter()
        .map(|clause| {
            Ok(ClauseNode {
                titulo: text(&clause.titulo),
                titulo_otro: text(&clause.titulo_otro),
                adquirido_de: text(&clause.adquirido_de),
                fecha_otorgamiento: date_words(&clause.fecha_otorgamiento)?,
                numero_notaria: text(&clause.numero_notaria),
                notaria_ordinal: notary_ordinal(&clause.numero_notaria),
                canton_notaria: text(&clause.canton_notaria),
                notario: text(&clause.notario),
                fecha_inscripcion: date_words(&clause.fecha_inscripcion)?,
                canton_inscripcion: text(&clause.canton_inscripcion),
                mismo_canton: same_canton(&clause.canton_notaria, &clause.canton_inscripcion),
                aclaratorias: resolve_at(&clause.aclaratorias, depth + 1)?,
            })
        })
        .collect()
}

fn text(field: &Option<String>) -> String {
    field.as_deref().unwrap_or_default().trim().to_string()
}

/// Transcribe an optional date. Absence is a documented fallback (empty
/// string); a present but malformed date errors.
fn date_words(field: &Option<String>) -> Result<String> {
    match field.as_deref().map(str::trim) {
        None | Some("") => Ok(String::new()),
        Some(raw) => transcribe::to_plain_date(raw),
    }
}

/// Feminine ordinal of the notary office number; a non-numeric office
/// keeps the literal label, an absent one transcribes to nothing.
fn notary_ordinal(field: &Option<String>) -> String {
    let raw = match field.as_deref().map(str::trim) {
        None | Some("") => return String::new(),
        Some(r) => r,
    };
    match raw.parse::<i64>() {
        Ok(n) => transcribe::to_ordinal_feminine(n),
        Err(_) => {
            tracing::warn!(office = %raw, "Non-numeric notary office number");
            format!("Notaría No. {raw}")
        }
    }
}

/// Case-insensitive canton comparison; false when either is absent.
fn same_canton(notaria: &Option<String>, inscripcion: &Option<String>) -> bool {
    match (
        notaria.as_deref().map(str::trim),
        inscripcion.as_deref().map(str::trim),
    ) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => {
            a.to_lowercase() == b.to_lowercase()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn clause(canton_notaria: &str, canton_inscripcion: &str) -> RawClause {
        RawClause {
            titulo: Some("compraventa".to_string()),
            adquirido_de: Some("Carlos Andrade".to_string()),
            fecha_otorgamiento: Some("1998-06-15".to_string()),
            numero_notaria: Some("22".to_string()),
            canton_notaria: Some(canton_notaria.to_string()),
            notario: Some("Dr. Esteban Mora".to_string()),
            fecha_inscripcion: Some("1998-09-02".to_string()),
            canton_inscripcion: Some(canton_inscripcion.to_string()),
            ..RawClause::default()
        }
    }

    #[test]
    fn test_leaf_clause_resolution() {
        let resolved = resolve_clauses(&[clause("Quito", "QUITO")]).unwrap();

        assert_eq!(resolved.len(), 1);
        let node = &resolved[0];
        assert_eq!(
            node.fecha_otorgamiento,
            "quince de junio del año mil novecientos noventa y ocho"
        );
        assert_eq!(node.notaria_ordinal, "Vigésima Segunda");
        assert!(node.mismo_canton);
        assert!(node.aclaratorias.is_empty());
    }

    #[test]
    fn test_different_cantons() {
        let resolved = resolve_clauses(&[clause("Quito", "Rumiñahui")]).unwrap();
        assert!(!resolved[0].mismo_canton);
    }

    #[test]
    fn test_absent_canton_is_false_not_error() {
        let mut raw = clause("Quito", "");
        raw.canton_inscripcion = None;
        let resolved = resolve_clauses(&[raw]).unwrap();
        assert!(!resolved[0].mismo_canton);
    }

    #[test]
    fn test_absent_dates_resolve_empty() {
        let raw = RawClause::default();
        let resolved = resolve_clauses(&[raw]).unwrap();
        assert_eq!(resolved[0].fecha_otorgamiento, "");
        assert_eq!(resolved[0].fecha_inscripcion, "");
    }

    #[test]
    fn test_malformed_date_errors() {
        let mut raw = clause("Quito", "Quito");
        raw.fecha_otorgamiento = Some("15/06/1998".to_string());
        assert!(matches!(
            resolve_clauses(&[raw]),
            Err(GenerationError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_nesting_depth_matches_input() {
        let mut root = clause("Quito", "Quito");
        let mut middle = clause("Quito", "Quito");
        middle.aclaratorias = vec![clause("Cuenca", "Cuenca")];
        root.aclaratorias = vec![middle];

        let resolved = resolve_clauses(&[root]).unwrap();
        assert_eq!(resolved[0].aclaratorias.len(), 1);
        assert_eq!(resolved[0].aclaratorias[0].aclaratorias.len(), 1);
        assert!(resolved[0].aclaratorias[0].aclaratorias[0]
            .aclaratorias
            .is_empty());
    }

    #[test]
    fn test_order_preserved() {
        let mut root = clause("Quito", "Quito");
        let primera = RawClause {
            titulo: Some("primera".to_string()),
            ..RawClause::default()
        };
        let segunda = RawClause {
            titulo: Some("segunda".to_string()),
            ..RawClause::default()
        };
        root.aclaratorias = vec![primera, segunda];

        let resolved = resolve_clauses(&[root]).unwrap();
        assert_eq!(resolved[0].aclaratorias[0].titulo, "primera");
        assert_eq!(resolved[0].aclaratorias[1].titulo, "segunda");
    }

    #[test]
    fn test_depth_guard_fails_cleanly() {
        let mut chain = clause("Quito", "Quito");
        for _ in 0..config::MAX_CLAUSE_DEPTH + 1 {
            let mut outer = clause("Quito", "Quito");
            outer.aclaratorias = vec![chain];
            chain = outer;
        }

        assert!(matches!(
            resolve_clauses(&[chain]),
            Err(GenerationError::ClauseDepthExceeded { .. })
        ));
    }

    #[test]
    fn test_non_numeric_office_keeps_literal_label() {
        let mut raw = clause("Quito", "Quito");
        raw.numero_notaria = Some("22-A".to_string());
        let resolved = resolve_clauses(&[raw]).unwrap();
        assert_eq!(resolved[0].notaria_ordinal, "Notaría No. 22-A");
    }
}
