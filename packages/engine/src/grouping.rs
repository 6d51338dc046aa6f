//! Conjugal grouping of parties
//!
//! Minutas introduce married couples together ("los cónyuges...") with a
//! single shared address, so the flat party list is partitioned into
//! couple and single groups before numbering. A declared partner who
//! cannot be found in the same list is not an error: the party is simply
//! introduced alone.

use crate::party::Party;
use serde::Serialize;

/// Kind of a party group. Serialized with the template's historical
/// tokens ("conyuges"/"soltero").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupKind {
    #[serde(rename = "conyuges")]
    Couple,
    #[serde(rename = "soltero")]
    Single,
}

/// A group of at most two parties sharing one introduction in the
/// document. Holds borrowed views; the input list stays owned by the
/// caller.
#[derive(Debug)]
pub struct Group<'a> {
    pub kind: GroupKind,
    pub members: Vec<&'a Party>,
}

impl Group<'_> {
    /// Address shared by the group, assembled from the first member's
    /// components in the minuta form (no province).
    pub fn shared_address(&self) -> String {
        let Some(primera) = self.members.first() else {
            return "Sin dirección registrada".to_string();
        };

        let mut partes: Vec<String> = Vec::new();
        if let Some(calle) = trimmed(&primera.main_street) {
            partes.push(calle.to_string());
        }
        if let Some(numero) = trimmed(&primera.number_street) {
            match partes.last_mut() {
                Some(ultima) => {
                    ultima.push(' ');
                    ultima.push_str(numero);
                }
                None => partes.push(numero.to_string()),
            }
        }
        if let Some(secundaria) = trimmed(&primera.secondary_street) {
            if partes.is_empty() {
                partes.push(secundaria.to_string());
            } else {
                partes.push(format!("y {secundaria}"));
            }
        }
        if let Some(sector) = trimmed(&primera.sector) {
            partes.push(sector.to_string());
        }
        if let Some(parroquia) = trimmed(&primera.parroquia) {
            partes.push(format!("Parroquia {parroquia}"));
        }
        if let Some(canton) = trimmed(&primera.canton) {
            partes.push(format!("cantón {canton}"));
        }

        if partes.is_empty() {
            "Sin dirección registrada".to_string()
        } else {
            partes.join(", ")
        }
    }
}

fn trimmed(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Partition a party list into couple and single groups.
///
/// Single left-to-right scan with a consumed-marker set: a married party
/// with a partner reference claims the first later unconsumed party whose
/// document number matches and whose own reference (when present) points
/// back. Everyone else, including parties whose partner is missing or
/// inconsistent, forms a single group. Output preserves the
/// first-occurrence order of each group's anchor, and every input party
/// appears in exactly one group.
pub fn group_by_partnership(people: &[Party]) -> Vec<Group<'_>> {
    let mut consumed = vec![false; people.len()];
    let mut groups = Vec::new();

    for (idx, person) in people.iter().enumerate() {
        if consumed[idx] {
            continue;
        }
        consumed[idx] = true;

        let is_married = person
            .marital_status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("casado"));

        let partner_idx = if is_married {
            person.partner_ref().and_then(|wanted| {
                people.iter().enumerate().skip(idx + 1).position(|(j, p)| {
                    !consumed[j]
                        && p.document_number == wanted
                        && p.partner_ref()
                            .is_none_or(|back| back == person.document_number)
                })
            })
        } else {
            None
        };

        match partner_idx {
            Some(offset) => {
                let j = idx + 1 + offset;
                consumed[j] = true;
                groups.push(Group {
                    kind: GroupKind::Couple,
                    members: vec![person, &people[j]],
                });
            }
            None => {
                if is_married && person.partner_ref().is_some() {
                    tracing::warn!(
                        document = %person.document_number,
                        "Declared partner not found in party list, grouping as single"
                    );
                }
                groups.push(Group {
                    kind: GroupKind::Single,
                    members: vec![person],
                });
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn party(doc: &str, status: &str, partner: Option<&str>) -> Party {
        Party {
            names: format!("Persona {doc}"),
            document_number: doc.to_string(),
            marital_status: Some(status.to_string()),
            partner_document_number: partner.map(String::from),
            ..Party::default()
        }
    }

    #[test]
    fn test_couple_is_paired_in_original_order() {
        let people = vec![
            party("111", "casado", Some("222")),
            party("222", "casado", Some("111")),
        ];
        let groups = group_by_partnership(&people);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].kind, GroupKind::Couple);
        assert_eq!(groups[0].members[0].document_number, "111");
        assert_eq!(groups[0].members[1].document_number, "222");
    }

    #[test]
    fn test_missing_partner_degrades_to_single() {
        let people = vec![party("111", "casado", Some("999")), party("222", "soltero", None)];
        let groups = group_by_partnership(&people);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].kind, GroupKind::Single);
        assert_eq!(groups[1].kind, GroupKind::Single);
    }

    #[test]
    fn test_conflicting_back_reference_degrades_to_single() {
        // 222 exists but declares a different partner
        let people = vec![
            party("111", "casado", Some("222")),
            party("222", "casado", Some("333")),
            party("333", "casado", Some("222")),
        ];
        let groups = group_by_partnership(&people);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].kind, GroupKind::Single);
        assert_eq!(groups[0].members[0].document_number, "111");
        // 222 then pairs with 333, whose references are mutual
        assert_eq!(groups[1].kind, GroupKind::Couple);
    }

    #[test]
    fn test_every_party_appears_exactly_once() {
        let people = vec![
            party("1", "casado", Some("3")),
            party("2", "soltero", None),
            party("3", "casado", Some("1")),
            party("4", "viudo", None),
            party("5", "casado", Some("404")),
        ];
        let groups = group_by_partnership(&people);

        let total: usize = groups.iter().map(|g| g.members.len()).sum();
        assert_eq!(total, people.len());

        let mut seen: Vec<&str> = groups
            .iter()
            .flat_map(|g| g.members.iter().map(|m| m.document_number.as_str()))
            .collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), people.len());
    }

    #[test]
    fn test_couples_always_have_two_mutual_members() {
        let people = vec![
            party("1", "casado", Some("2")),
            party("2", "casado", Some("1")),
            party("3", "casado", Some("4")),
            party("4", "casado", None),
        ];
        for group in group_by_partnership(&people) {
            match group.kind {
                GroupKind::Couple => {
                    assert_eq!(group.members.len(), 2);
                    let (a, b) = (group.members[0], group.members[1]);
                    assert_eq!(a.partner_ref(), Some(b.document_number.as_str()));
                    if let Some(back) = b.partner_ref() {
                        assert_eq!(back, a.document_number.as_str());
                    }
                }
                GroupKind::Single => assert_eq!(group.members.len(), 1),
            }
        }
    }

    #[test]
    fn test_shared_address_from_first_member() {
        let mut ana = party("1", "casado", Some("2"));
        ana.main_street = Some("Av. Amazonas".to_string());
        ana.number_street = Some("N24-660".to_string());
        ana.secondary_street = Some("Av. Colón".to_string());
        ana.parroquia = Some("Iñaquito".to_string());
        ana.canton = Some("Quito".to_string());
        let luis = party("2", "casado", Some("1"));

        let people = vec![ana, luis];
        let groups = group_by_partnership(&people);
        assert_eq!(
            groups[0].shared_address(),
            "Av. Amazonas N24-660, y Av. Colón, Parroquia Iñaquito, cantón Quito"
        );
    }

    #[test]
    fn test_empty_address_placeholder() {
        let people = vec![party("1", "soltero", None)];
        let groups = group_by_partnership(&people);
        assert_eq!(groups[0].shared_address(), "Sin dirección registrada");
    }
}
