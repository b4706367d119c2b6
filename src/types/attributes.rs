//! Multi-valued entry attributes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AciError;
use crate::schema::SchemaLookup;

/// The attributes of an entry, keyed by lower-cased attribute id.
///
/// Values are compared with case-ignore semantics (trimmed, lower-cased).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, Vec<String>>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add values for one attribute and return the updated set.
    pub fn with<I, S>(mut self, attr: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(attr, values);
        self
    }

    /// Append values to an attribute, creating it when absent.
    pub fn insert<I, S>(&mut self, attr: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0
            .entry(attr.trim().to_ascii_lowercase())
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    pub fn get(&self, attr: &str) -> Option<&[String]> {
        self.0
            .get(&attr.trim().to_ascii_lowercase())
            .map(Vec::as_slice)
    }

    /// Look an attribute up by its schema identity, so `cn`, `commonName` and
    /// `2.5.4.3` all find the same values.
    pub fn get_normalized(
        &self,
        schema: &dyn SchemaLookup,
        attr: &str,
    ) -> Result<Option<&[String]>, AciError> {
        if let Some(values) = self.get(attr) {
            return Ok(Some(values));
        }
        let wanted = schema.normalize_attribute_id(attr)?;
        for (key, values) in &self.0 {
            if schema.normalize_attribute_id(key)? == wanted {
                return Ok(Some(values.as_slice()));
            }
        }
        Ok(None)
    }

    /// Number of values held for `attr`, zero when absent.
    pub fn value_count(&self, attr: &str) -> usize {
        self.get(attr).map_or(0, <[String]>::len)
    }

    pub fn contains_value(&self, attr: &str, value: &str) -> bool {
        self.get(attr)
            .is_some_and(|values| values.iter().any(|v| values_match(v, value)))
    }

    pub fn object_classes(&self) -> &[String] {
        self.get("objectclass").unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }
}

/// Case-ignore value equality.
pub fn values_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
