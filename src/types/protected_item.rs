//! What an ACI tuple protects.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumDiscriminants, EnumIter};

use crate::error::AciError;
use crate::schema::{SchemaLookup, is_valid_attribute_id};

use super::attributes::{Attributes, values_match};

/// An attribute type paired with one of its values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeValueAssertion {
    pub attribute: String,
    pub value: String,
}

impl AttributeValueAssertion {
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

/// Upper bound on the number of values an attribute may hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaxValueCountItem {
    pub attribute: String,
    pub max_count: u32,
}

/// Values of `attribute` may only be values already present in `values_in`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RestrictedByItem {
    pub attribute: String,
    pub values_in: String,
}

/// A filter evaluated against the target entry, used by `RangeOfValues`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryFilter {
    Equality { attribute: String, value: String },
    Present { attribute: String },
    And(Vec<EntryFilter>),
    Or(Vec<EntryFilter>),
    Not(Box<EntryFilter>),
}

impl EntryFilter {
    pub fn matches(&self, entry: &Attributes, schema: &dyn SchemaLookup) -> Result<bool, AciError> {
        match self {
            EntryFilter::Equality { attribute, value } => Ok(entry
                .get_normalized(schema, attribute)?
                .is_some_and(|values| values.iter().any(|v| values_match(v, value)))),
            EntryFilter::Present { attribute } => Ok(entry
                .get_normalized(schema, attribute)?
                .is_some_and(|values| !values.is_empty())),
            EntryFilter::And(filters) => {
                for filter in filters {
                    if !filter.matches(entry, schema)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            EntryFilter::Or(filters) => {
                for filter in filters {
                    if filter.matches(entry, schema)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            EntryFilter::Not(filter) => Ok(!filter.matches(entry, schema)?),
        }
    }

    fn attributes(&self) -> Vec<&str> {
        match self {
            EntryFilter::Equality { attribute, .. } | EntryFilter::Present { attribute } => {
                vec![attribute.as_str()]
            }
            EntryFilter::And(filters) | EntryFilter::Or(filters) => {
                filters.iter().flat_map(EntryFilter::attributes).collect()
            }
            EntryFilter::Not(filter) => filter.attributes(),
        }
    }
}

/// An object-class refinement, used by `Classes`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Refinement {
    Item(String),
    And(Vec<Refinement>),
    Or(Vec<Refinement>),
    Not(Box<Refinement>),
}

impl Refinement {
    pub fn matches(&self, object_classes: &[String]) -> bool {
        match self {
            Refinement::Item(class) => object_classes.iter().any(|oc| values_match(oc, class)),
            Refinement::And(items) => items.iter().all(|r| r.matches(object_classes)),
            Refinement::Or(items) => items.iter().any(|r| r.matches(object_classes)),
            Refinement::Not(item) => !item.matches(object_classes),
        }
    }
}

/// The protected-item variants of an ACI tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, EnumDiscriminants)]
#[strum_discriminants(name(ProtectedItemKind), derive(Display, EnumIter, Hash))]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ProtectedItem {
    Entry,
    AllUserAttributeTypes,
    AllUserAttributeTypesAndValues,
    AttributeType(BTreeSet<String>),
    AllAttributeValues(BTreeSet<String>),
    AttributeValue(BTreeSet<AttributeValueAssertion>),
    SelfValue(BTreeSet<String>),
    RangeOfValues(EntryFilter),
    MaxValueCount(BTreeSet<MaxValueCountItem>),
    MaxImmSub(u32),
    RestrictedBy(BTreeSet<RestrictedByItem>),
    Classes(Refinement),
}

impl ProtectedItem {
    pub fn kind(&self) -> ProtectedItemKind {
        ProtectedItemKind::from(self)
    }

    /// Items that name an attribute type or value outright.
    pub fn is_attribute_explicit(&self) -> bool {
        matches!(
            self,
            ProtectedItem::AttributeType(_)
                | ProtectedItem::AllAttributeValues(_)
                | ProtectedItem::SelfValue(_)
                | ProtectedItem::AttributeValue(_)
        )
    }

    pub fn is_range_of_values(&self) -> bool {
        matches!(self, ProtectedItem::RangeOfValues(_))
    }

    pub fn attribute_types<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ProtectedItem::AttributeType(ids.into_iter().map(Into::into).collect())
    }

    pub fn all_attribute_values<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ProtectedItem::AllAttributeValues(ids.into_iter().map(Into::into).collect())
    }

    /// Every attribute id the item refers to.
    pub fn referenced_attributes(&self) -> Vec<&str> {
        match self {
            ProtectedItem::Entry
            | ProtectedItem::AllUserAttributeTypes
            | ProtectedItem::AllUserAttributeTypesAndValues
            | ProtectedItem::MaxImmSub(_)
            | ProtectedItem::Classes(_) => Vec::new(),
            ProtectedItem::AttributeType(ids)
            | ProtectedItem::AllAttributeValues(ids)
            | ProtectedItem::SelfValue(ids) => ids.iter().map(String::as_str).collect(),
            ProtectedItem::AttributeValue(avas) => {
                avas.iter().map(|a| a.attribute.as_str()).collect()
            }
            ProtectedItem::RangeOfValues(filter) => filter.attributes(),
            ProtectedItem::MaxValueCount(items) => {
                items.iter().map(|i| i.attribute.as_str()).collect()
            }
            ProtectedItem::RestrictedBy(items) => items
                .iter()
                .flat_map(|i| [i.attribute.as_str(), i.values_in.as_str()])
                .collect(),
        }
    }

    /// Reject items that can never describe anything.
    pub fn validate(&self) -> Result<(), AciError> {
        let empty = match self {
            ProtectedItem::AttributeType(ids)
            | ProtectedItem::AllAttributeValues(ids)
            | ProtectedItem::SelfValue(ids) => ids.is_empty(),
            ProtectedItem::AttributeValue(avas) => avas.is_empty(),
            ProtectedItem::MaxValueCount(items) => items.is_empty(),
            ProtectedItem::RestrictedBy(items) => items.is_empty(),
            _ => false,
        };
        if empty {
            return Err(AciError::Configuration(format!(
                "protected item '{}' lists no attributes",
                self.kind()
            )));
        }
        if let Some(bad) = self
            .referenced_attributes()
            .into_iter()
            .find(|id| !is_valid_attribute_id(id.trim()))
        {
            return Err(AciError::Configuration(format!(
                "protected item '{}' references invalid attribute id '{bad}'",
                self.kind()
            )));
        }
        Ok(())
    }
}
