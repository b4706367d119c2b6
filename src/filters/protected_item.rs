use crate::error::AciError;
use crate::types::{AciTuple, Dn, OperationScope, ProtectedItem, values_match};

use super::{FilterContext, TupleFilter, retain_tuples};

/// Keeps the tuples with at least one protected item that covers the
/// requested entry, attribute or value.
#[derive(Debug, Default, Clone, Copy)]
pub struct RelatedProtectedItemFilter;

impl RelatedProtectedItemFilter {
    fn covers(item: &ProtectedItem, ctx: &FilterContext<'_>) -> Result<bool, AciError> {
        let request = ctx.request;
        let at_entry = request.scope == OperationScope::Entry;
        let at_value = request.scope == OperationScope::AttributeTypeAndValue;

        match item {
            ProtectedItem::Entry | ProtectedItem::MaxImmSub(_) => Ok(at_entry),
            ProtectedItem::Classes(refinement) => {
                Ok(at_entry && refinement.matches(request.entry.object_classes()))
            }
            ProtectedItem::RangeOfValues(filter) => filter.matches(&request.entry, ctx.schema),
            _ if at_entry => Ok(false),

            ProtectedItem::AllUserAttributeTypes
            | ProtectedItem::AllUserAttributeTypesAndValues => match ctx.requested_attribute() {
                Some(attr) => Ok(!ctx.schema.is_operational_attribute(attr)?),
                None => Ok(false),
            },
            ProtectedItem::AttributeType(ids) | ProtectedItem::AllAttributeValues(ids) => {
                names_requested_attribute(ctx, ids.iter().map(String::as_str))
            }
            ProtectedItem::MaxValueCount(items) => {
                names_requested_attribute(ctx, items.iter().map(|i| i.attribute.as_str()))
            }
            ProtectedItem::RestrictedBy(items) => {
                names_requested_attribute(ctx, items.iter().map(|i| i.attribute.as_str()))
            }

            ProtectedItem::AttributeValue(avas) => {
                let (Some(attr), Some(value)) = (
                    ctx.requested_attribute(),
                    request.attribute_value.as_deref(),
                ) else {
                    return Ok(false);
                };
                if !at_value {
                    return Ok(false);
                }
                for ava in avas {
                    if values_match(&ava.value, value) && ctx.same_attribute(&ava.attribute, attr)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            ProtectedItem::SelfValue(ids) => {
                let Some(value) = request.attribute_value.as_deref().filter(|_| at_value) else {
                    return Ok(false);
                };
                let is_requester = value
                    .parse::<Dn>()
                    .is_ok_and(|name| name == request.user_name);
                Ok(is_requester && names_requested_attribute(ctx, ids.iter().map(String::as_str))?)
            }
        }
    }
}

fn names_requested_attribute<'i, I>(ctx: &FilterContext<'_>, ids: I) -> Result<bool, AciError>
where
    I: IntoIterator<Item = &'i str>,
{
    let Some(attr) = ctx.requested_attribute() else {
        return Ok(false);
    };
    for id in ids {
        if ctx.same_attribute(id, attr)? {
            return Ok(true);
        }
    }
    Ok(false)
}

impl TupleFilter for RelatedProtectedItemFilter {
    fn filter<'t>(
        &self,
        tuples: Vec<&'t AciTuple>,
        ctx: &FilterContext<'_>,
    ) -> Result<Vec<&'t AciTuple>, AciError> {
        retain_tuples(tuples, |tuple| {
            for item in tuple.protected_items() {
                if Self::covers(item, ctx)? {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }
}

/// Prefers tuples that name the attribute or value outright, then tuples that
/// select values by range. Never empties a non-empty input: when neither tier
/// is present the input is returned as is.
#[derive(Debug, Default, Clone, Copy)]
pub struct MostSpecificProtectedItemFilter;

impl MostSpecificProtectedItemFilter {
    fn select<'t>(
        tuples: &[&'t AciTuple],
        pred: fn(&ProtectedItem) -> bool,
    ) -> Vec<&'t AciTuple> {
        tuples
            .iter()
            .filter(|tuple| tuple.protected_items().iter().any(pred))
            .copied()
            .collect()
    }
}

impl TupleFilter for MostSpecificProtectedItemFilter {
    fn filter<'t>(
        &self,
        tuples: Vec<&'t AciTuple>,
        _ctx: &FilterContext<'_>,
    ) -> Result<Vec<&'t AciTuple>, AciError> {
        if tuples.len() <= 1 {
            return Ok(tuples);
        }

        let explicit = Self::select(&tuples, ProtectedItem::is_attribute_explicit);
        if !explicit.is_empty() {
            return Ok(explicit);
        }

        let ranged = Self::select(&tuples, ProtectedItem::is_range_of_values);
        if !ranged.is_empty() {
            return Ok(ranged);
        }

        Ok(tuples)
    }
}
