//! Distinguished names.
//!
//! Names are normalized on parse: attribute types are lower-cased, values are
//! trimmed and lower-cased (case-ignore matching), and the components of a
//! multi-valued RDN are sorted. Two names are equal when their normalized forms
//! are equal.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AciError;
use crate::schema::is_valid_attribute_id;

/// A normalized distinguished name, leaf RDN first (`cn=a,ou=people,dc=example`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DistinguishedName {
    rdns: Vec<String>,
}

pub type Dn = DistinguishedName;

/// Split on `sep`, ignoring separators escaped with a backslash.
fn split_unescaped(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (idx, ch) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
        } else if ch == sep {
            parts.push(&s[start..idx]);
            start = idx + ch.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

fn normalize_rdn(rdn: &str, whole: &str) -> Result<String, AciError> {
    let mut avas = Vec::new();
    for ava in split_unescaped(rdn, '+') {
        let (attr, value) = ava.split_once('=').ok_or_else(|| {
            AciError::InvalidFormat(format!(
                "Failed to parse DN: RDN '{rdn}' has no '=' in '{whole}' (expected format: type=value[,type=value]*)"
            ))
        })?;
        let attr = attr.trim();
        if !is_valid_attribute_id(attr) {
            return Err(AciError::InvalidFormat(format!(
                "Failed to parse DN: invalid attribute type '{attr}' in '{whole}'"
            )));
        }
        avas.push(format!(
            "{}={}",
            attr.to_ascii_lowercase(),
            value.trim().to_lowercase()
        ));
    }
    avas.sort();
    Ok(avas.join("+"))
}

impl DistinguishedName {
    /// The empty name, ancestor of every entry.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.rdns.is_empty()
    }

    /// Number of RDNs.
    pub fn len(&self) -> usize {
        self.rdns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    /// The leaf RDN, normalized.
    pub fn rdn(&self) -> Option<&str> {
        self.rdns.first().map(String::as_str)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.rdns.is_empty() {
            return None;
        }
        Some(Self {
            rdns: self.rdns[1..].to_vec(),
        })
    }

    /// True when `self` equals `ancestor` or lies below it.
    pub fn is_descendant_or_self(&self, ancestor: &Self) -> bool {
        self.rdns.len() >= ancestor.rdns.len()
            && self.rdns[self.rdns.len() - ancestor.rdns.len()..] == ancestor.rdns[..]
    }

    /// True when `self` lies strictly below `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &Self) -> bool {
        self.rdns.len() > ancestor.rdns.len() && self.is_descendant_or_self(ancestor)
    }

    /// How many levels `self` lies below `ancestor`, if it is below it at all.
    pub fn depth_below(&self, ancestor: &Self) -> Option<usize> {
        self.is_descendant_or_self(ancestor)
            .then(|| self.rdns.len() - ancestor.rdns.len())
    }

    /// Append `suffix` below this (relative) name: `cn=a` + `dc=example` is
    /// `cn=a,dc=example`.
    pub fn concat(&self, suffix: &Self) -> Self {
        let mut rdns = self.rdns.clone();
        rdns.extend(suffix.rdns.iter().cloned());
        Self { rdns }
    }
}

impl Display for DistinguishedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.rdns.join(","))
    }
}

impl FromStr for DistinguishedName {
    type Err = AciError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::root());
        }
        let rdns = split_unescaped(s, ',')
            .into_iter()
            .map(|rdn| normalize_rdn(rdn, s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rdns })
    }
}

impl TryFrom<String> for DistinguishedName {
    type Error = AciError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DistinguishedName> for String {
    fn from(dn: DistinguishedName) -> Self {
        dn.to_string()
    }
}

/// Parse a DN, for call sites that hold a `&str` literal.
pub fn dn(s: &str) -> Result<Dn, AciError> {
    s.parse()
}
