//! Schema lookups used by the relevance filters.
//!
//! The decision core never owns the directory schema; it asks a
//! [`SchemaLookup`] whether two attribute references denote the same attribute
//! type. [`BasicSchema`] is a small OID/name registry pre-loaded with the core
//! user and operational attribute types, suitable for tests and for embedders
//! without a schema subsystem of their own.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::AciError;

/// `descr` (keystring) or `numericoid`, optionally followed by `;options`.
static ATTRIBUTE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z0-9-]*|[0-9]+(?:\.[0-9]+)+)(?:;[A-Za-z0-9-]+)*$")
        .expect("attribute id pattern is valid")
});

pub(crate) fn is_valid_attribute_id(id: &str) -> bool {
    ATTRIBUTE_ID.is_match(id)
}

/// Read-only schema service. Implementations are shared across concurrent
/// evaluations.
pub trait SchemaLookup: Send + Sync {
    fn is_known_attribute_type(&self, id: &str) -> Result<bool, AciError>;

    /// Canonical identity for an attribute reference; equal results mean the
    /// same attribute type.
    fn normalize_attribute_id(&self, id: &str) -> Result<String, AciError>;

    /// Operational attributes are not covered by the all-user-attribute items.
    fn is_operational_attribute(&self, _id: &str) -> Result<bool, AciError> {
        Ok(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeTypeInfo {
    oid: String,
    operational: bool,
}

// (oid, names, operational)
const CORE_ATTRIBUTE_TYPES: &[(&str, &[&str], bool)] = &[
    ("2.5.4.0", &["objectClass"], false),
    ("2.5.4.3", &["cn", "commonName"], false),
    ("2.5.4.4", &["sn", "surname"], false),
    ("2.5.4.42", &["givenName", "gn"], false),
    ("2.5.4.10", &["o", "organizationName"], false),
    ("2.5.4.11", &["ou", "organizationalUnitName"], false),
    ("2.5.4.12", &["title"], false),
    ("2.5.4.13", &["description"], false),
    ("2.5.4.20", &["telephoneNumber"], false),
    ("2.5.4.31", &["member"], false),
    ("2.5.4.35", &["userPassword"], false),
    ("2.5.4.49", &["distinguishedName"], false),
    ("2.5.4.50", &["uniqueMember"], false),
    ("0.9.2342.19200300.100.1.1", &["uid", "userid"], false),
    ("0.9.2342.19200300.100.1.3", &["mail", "rfc822Mailbox"], false),
    ("0.9.2342.19200300.100.1.25", &["dc", "domainComponent"], false),
    ("2.5.18.1", &["createTimestamp"], true),
    ("2.5.18.2", &["modifyTimestamp"], true),
    ("2.5.18.3", &["creatorsName"], true),
    ("2.5.18.4", &["modifiersName"], true),
    ("2.5.18.5", &["administrativeRole"], true),
    ("2.5.18.6", &["subtreeSpecification"], true),
    ("2.5.18.9", &["hasSubordinates"], true),
    ("2.5.18.10", &["subschemaSubentry"], true),
    ("2.5.18.12", &["collectiveAttributeSubentries"], true),
    ("2.5.24.4", &["prescriptiveACI"], true),
    ("2.5.24.5", &["entryACI"], true),
    ("2.5.24.6", &["subentryACI"], true),
    ("1.3.6.1.1.16.4", &["entryUUID"], true),
    (
        "1.3.6.1.4.1.18060.0.4.1.2.11",
        &["accessControlSubentries"],
        true,
    ),
];

static CORE_REGISTRY: Lazy<HashMap<String, AttributeTypeInfo>> = Lazy::new(|| {
    let mut by_name = HashMap::new();
    for (oid, names, operational) in CORE_ATTRIBUTE_TYPES {
        register_into(&mut by_name, oid, names, *operational);
    }
    by_name
});

fn register_into(
    by_name: &mut HashMap<String, AttributeTypeInfo>,
    oid: &str,
    names: &[&str],
    operational: bool,
) {
    let info = AttributeTypeInfo {
        oid: oid.to_string(),
        operational,
    };
    by_name.insert(oid.to_string(), info.clone());
    for name in names {
        by_name.insert(name.to_ascii_lowercase(), info.clone());
    }
}

/// An in-memory OID/name registry.
///
/// In lenient mode (the default) syntactically valid but unregistered ids are
/// accepted and normalized to their lower-cased form; in strict mode they are a
/// lookup error.
#[derive(Debug, Clone)]
pub struct BasicSchema {
    by_name: Arc<HashMap<String, AttributeTypeInfo>>,
    strict: bool,
}

impl Default for BasicSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl BasicSchema {
    /// A registry holding the core attribute types.
    pub fn new() -> Self {
        Self {
            by_name: Arc::new(CORE_REGISTRY.clone()),
            strict: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Register an attribute type under its OID and names.
    pub fn with_attribute_type(mut self, oid: &str, names: &[&str], operational: bool) -> Self {
        register_into(Arc::make_mut(&mut self.by_name), oid, names, operational);
        self
    }

    fn lookup(&self, id: &str) -> Result<Option<&AttributeTypeInfo>, AciError> {
        let id = id.trim();
        if !is_valid_attribute_id(id) {
            return Err(AciError::Lookup(format!("invalid attribute id '{id}'")));
        }
        // Attribute options (`cn;lang-en`) do not change the attribute type.
        let base = id.split(';').next().unwrap_or(id);
        Ok(self.by_name.get(&base.to_ascii_lowercase()))
    }
}

impl SchemaLookup for BasicSchema {
    fn is_known_attribute_type(&self, id: &str) -> Result<bool, AciError> {
        Ok(self.lookup(id)?.is_some())
    }

    fn normalize_attribute_id(&self, id: &str) -> Result<String, AciError> {
        match self.lookup(id)? {
            Some(info) => Ok(info.oid.clone()),
            None if self.strict => Err(AciError::Lookup(format!(
                "unknown attribute type '{}'",
                id.trim()
            ))),
            None => Ok(id.trim().split(';').next().unwrap_or("").to_ascii_lowercase()),
        }
    }

    fn is_operational_attribute(&self, id: &str) -> Result<bool, AciError> {
        Ok(self.lookup(id)?.is_some_and(|info| info.operational))
    }
}
