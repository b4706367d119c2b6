//! The ACI tuple filters.
//!
//! Every filter takes the tuples that survived the previous stage and returns
//! a subset of them, in their original order. Relevance and constraint
//! filters may return nothing; the tiering filters never empty a non-empty
//! input.

use crate::error::AciError;
use crate::schema::SchemaLookup;
use crate::types::{AciTuple, EvaluationContext};

mod constraints;
mod micro_operation;
mod precedence;
mod protected_item;
mod user_class;

pub use constraints::{MaxImmSubFilter, MaxValueCountFilter, RestrictedByFilter};
pub use micro_operation::MicroOperationFilter;
pub use precedence::HighestPrecedenceFilter;
pub use protected_item::{MostSpecificProtectedItemFilter, RelatedProtectedItemFilter};
pub use user_class::{MostSpecificUserClassFilter, RelatedUserClassFilter};

/// What a filter may consult besides the tuples themselves.
#[derive(Clone, Copy)]
pub struct FilterContext<'a> {
    pub request: &'a EvaluationContext,
    pub schema: &'a dyn SchemaLookup,
}

impl<'a> FilterContext<'a> {
    pub fn new(request: &'a EvaluationContext, schema: &'a dyn SchemaLookup) -> Self {
        Self { request, schema }
    }

    /// Do two attribute references denote the same attribute type?
    pub(crate) fn same_attribute(&self, a: &str, b: &str) -> Result<bool, AciError> {
        if a.trim().eq_ignore_ascii_case(b.trim()) {
            return Ok(true);
        }
        Ok(self.schema.normalize_attribute_id(a)? == self.schema.normalize_attribute_id(b)?)
    }

    /// The requested attribute id, for filters that only act at attribute
    /// scopes.
    pub(crate) fn requested_attribute(&self) -> Option<&'a str> {
        self.request.attribute_id.as_deref()
    }
}

/// One stage of the pipeline.
pub trait TupleFilter {
    fn filter<'t>(
        &self,
        tuples: Vec<&'t AciTuple>,
        ctx: &FilterContext<'_>,
    ) -> Result<Vec<&'t AciTuple>, AciError>;
}

/// Keep the tuples for which `keep` holds, stopping at the first error.
pub(crate) fn retain_tuples<'t, F>(
    tuples: Vec<&'t AciTuple>,
    mut keep: F,
) -> Result<Vec<&'t AciTuple>, AciError>
where
    F: FnMut(&AciTuple) -> Result<bool, AciError>,
{
    let mut kept = Vec::with_capacity(tuples.len());
    for tuple in tuples {
        if keep(tuple)? {
            kept.push(tuple);
        }
    }
    Ok(kept)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::schema::BasicSchema;
    use crate::types::{
        AciTuple, AciTupleBuilder, EvaluationContext, MicroOperation, ProtectedItem, UserClass,
        dn,
    };

    pub fn schema() -> BasicSchema {
        BasicSchema::new()
    }

    pub fn entry_read() -> EvaluationContext {
        EvaluationContext::builder(dn("cn=bob,ou=people,dc=example").unwrap())
            .user_name(dn("cn=alice,ou=people,dc=example").unwrap())
            .micro_operation(MicroOperation::Read)
            .build()
    }

    pub fn attribute_read(attr: &str) -> EvaluationContext {
        EvaluationContext::builder(dn("cn=bob,ou=people,dc=example").unwrap())
            .user_name(dn("cn=alice,ou=people,dc=example").unwrap())
            .attribute(attr)
            .micro_operation(MicroOperation::Read)
            .build()
    }

    /// A tuple readable by everyone, with the given grant flag and item.
    pub fn tuple(grant: bool, item: ProtectedItem) -> AciTuple {
        base(grant).protected_item(item).build().unwrap()
    }

    pub fn base(grant: bool) -> AciTupleBuilder {
        let builder = if grant { AciTuple::grant() } else { AciTuple::deny() };
        builder
            .user_class(UserClass::AllUsers)
            .micro_operation(MicroOperation::Read)
    }
}
