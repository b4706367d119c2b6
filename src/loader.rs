use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::AciError;
use crate::types::{AciTuple, AdministrativeRole, Subentry, SubentryDocument};

/// Parse a JSON array of subentry documents.
///
/// Every document is validated (roles, scope, tuples) and uuids must be
/// unique across the set.
///
/// Example:
/// ```rust
/// use aci_core::parse_subentries;
/// let text = r#"[{
///     "name": "people-acl",
///     "roles": ["accessControlSpecificArea"],
///     "scope": {"base": "ou=people,dc=example"},
///     "tuples": [{
///         "grant": true,
///         "precedence": 10,
///         "user_classes": [{"type": "all_users"}],
///         "protected_items": [{"type": "attribute_type", "value": ["mail"]}],
///         "micro_operations": ["read", "compare"]
///     }]
/// }]"#;
/// let subentries = parse_subentries(text).unwrap();
/// assert_eq!(subentries[0].tuples().len(), 1);
/// ```
pub fn parse_subentries(text: &str) -> Result<Vec<Subentry>, AciError> {
    let documents: Vec<SubentryDocument> = serde_json::from_str(text)?;
    let subentries = documents
        .into_iter()
        .map(Subentry::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    ensure_unique(&subentries)?;
    Ok(subentries)
}

pub(crate) fn ensure_unique(subentries: &[Subentry]) -> Result<(), AciError> {
    let mut seen = HashSet::new();
    for subentry in subentries {
        if !seen.insert(subentry.uuid()) {
            return Err(AciError::DuplicateSubentry(subentry.uuid().to_string()));
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct CanonicalSubentry<'a> {
    uuid: &'a str,
    name: &'a str,
    roles: &'a BTreeSet<AdministrativeRole>,
    scope: String,
    tuples: &'a [AciTuple],
}

/// SHA-256 over a canonical rendering of the subentry set, independent of
/// the order the subentries were supplied in.
pub fn fingerprint(subentries: &[Subentry]) -> Result<String, AciError> {
    let mut canonical: Vec<CanonicalSubentry<'_>> = subentries
        .iter()
        .map(|s| CanonicalSubentry {
            uuid: s.uuid(),
            name: s.name(),
            roles: s.roles(),
            scope: format!("{:?}", s.scope()),
            tuples: s.tuples(),
        })
        .collect();
    canonical.sort_by(|a, b| a.uuid.cmp(b.uuid));

    let bytes = serde_json::to_vec(&canonical)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}
