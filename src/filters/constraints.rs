//! Constraint filters. Each one removes grants that would let the requested
//! operation break a limit set by a protected item; denies always pass.

use crate::error::AciError;
use crate::types::{AciTuple, OperationScope, ProtectedItem, values_match};

use super::{FilterContext, TupleFilter, retain_tuples};

/// Drops grants whose `MaxValueCount` for the requested attribute is already
/// reached by the target entry. Acts at value scope only.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaxValueCountFilter;

impl MaxValueCountFilter {
    fn exceeded(tuple: &AciTuple, attr: &str, ctx: &FilterContext<'_>) -> Result<bool, AciError> {
        for item in tuple.protected_items() {
            let ProtectedItem::MaxValueCount(limits) = item else {
                continue;
            };
            for limit in limits {
                if !ctx.same_attribute(&limit.attribute, attr)? {
                    continue;
                }
                let present = ctx
                    .request
                    .entry
                    .get_normalized(ctx.schema, attr)?
                    .map_or(0, <[String]>::len);
                if present >= limit.max_count as usize {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

impl TupleFilter for MaxValueCountFilter {
    fn filter<'t>(
        &self,
        tuples: Vec<&'t AciTuple>,
        ctx: &FilterContext<'_>,
    ) -> Result<Vec<&'t AciTuple>, AciError> {
        if ctx.request.scope != OperationScope::AttributeTypeAndValue {
            return Ok(tuples);
        }
        let Some(attr) = ctx.requested_attribute() else {
            return Ok(tuples);
        };
        retain_tuples(tuples, |tuple| {
            Ok(!tuple.is_grant() || !Self::exceeded(tuple, attr, ctx)?)
        })
    }
}

/// Drops grants whose `MaxImmSub` is already reached by the target entry's
/// immediate subordinates. Acts at entry scope only.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaxImmSubFilter;

impl TupleFilter for MaxImmSubFilter {
    fn filter<'t>(
        &self,
        tuples: Vec<&'t AciTuple>,
        ctx: &FilterContext<'_>,
    ) -> Result<Vec<&'t AciTuple>, AciError> {
        if ctx.request.scope != OperationScope::Entry {
            return Ok(tuples);
        }
        let children = ctx.request.immediate_subordinates;
        Ok(tuples
            .into_iter()
            .filter(|tuple| {
                !tuple.is_grant()
                    || !tuple.protected_items().iter().any(|item| {
                        matches!(item, ProtectedItem::MaxImmSub(limit) if children >= *limit as usize)
                    })
            })
            .collect())
    }
}

/// Drops grants whose `RestrictedBy` item for the requested attribute does not
/// find the requested value among the target entry's values of the
/// restricting attribute. Acts at value scope only.
#[derive(Debug, Default, Clone, Copy)]
pub struct RestrictedByFilter;

impl RestrictedByFilter {
    fn violated(
        tuple: &AciTuple,
        attr: &str,
        value: &str,
        ctx: &FilterContext<'_>,
    ) -> Result<bool, AciError> {
        for item in tuple.protected_items() {
            let ProtectedItem::RestrictedBy(restrictions) = item else {
                continue;
            };
            for restriction in restrictions {
                if !ctx.same_attribute(&restriction.attribute, attr)? {
                    continue;
                }
                let allowed = ctx
                    .request
                    .entry
                    .get_normalized(ctx.schema, &restriction.values_in)?
                    .is_some_and(|values| values.iter().any(|v| values_match(v, value)));
                if !allowed {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

impl TupleFilter for RestrictedByFilter {
    fn filter<'t>(
        &self,
        tuples: Vec<&'t AciTuple>,
        ctx: &FilterContext<'_>,
    ) -> Result<Vec<&'t AciTuple>, AciError> {
        if ctx.request.scope != OperationScope::AttributeTypeAndValue {
            return Ok(tuples);
        }
        let (Some(attr), Some(value)) = (
            ctx.requested_attribute(),
            ctx.request.attribute_value.as_deref(),
        ) else {
            return Ok(tuples);
        };
        retain_tuples(tuples, |tuple| {
            Ok(!tuple.is_grant() || !Self::violated(tuple, attr, value, ctx)?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::fixtures::{attribute_read, base, entry_read, schema, tuple};
    use crate::types::{
        Attributes, EvaluationContext, MaxValueCountItem, MicroOperation, RestrictedByItem, dn,
    };
    use std::collections::BTreeSet;
    use yare::parameterized;

    fn add_value(attr: &str, value: &str, entry: Attributes) -> EvaluationContext {
        EvaluationContext::builder(dn("cn=staff,ou=groups,dc=example").unwrap())
            .user_name(dn("cn=alice,ou=people,dc=example").unwrap())
            .attribute_value(attr, value)
            .entry(entry)
            .micro_operation(MicroOperation::Add)
            .build()
    }

    fn max_values(attr: &str, max_count: u32) -> ProtectedItem {
        ProtectedItem::MaxValueCount(BTreeSet::from([MaxValueCountItem {
            attribute: attr.to_string(),
            max_count,
        }]))
    }

    fn restricted(attribute: &str, values_in: &str) -> ProtectedItem {
        ProtectedItem::RestrictedBy(BTreeSet::from([RestrictedByItem {
            attribute: attribute.to_string(),
            values_in: values_in.to_string(),
        }]))
    }

    #[parameterized(
        below = { 2, 3, true },
        at_limit = { 3, 3, false },
        above = { 4, 3, false },
        zero_limit = { 0, 0, false },
    )]
    fn test_max_value_count(present: usize, limit: u32, kept: bool) {
        let schema = schema();
        let values: Vec<String> = (0..present).map(|i| format!("v{i}@example.com")).collect();
        let request = add_value("mail", "new@example.com", Attributes::new().with("mail", values));
        let ctx = FilterContext::new(&request, &schema);

        let grant = tuple(true, max_values("mail", limit));
        let result = MaxValueCountFilter.filter(vec![&grant], &ctx).unwrap();
        assert_eq!(result.len() == 1, kept);
    }

    #[test]
    fn test_max_value_count_ignores_denies_and_other_attributes() {
        let schema = schema();
        let request = add_value(
            "mail",
            "new@example.com",
            Attributes::new().with("mail", ["a@example.com"]).with("cn", ["a", "b"]),
        );
        let ctx = FilterContext::new(&request, &schema);

        let deny = tuple(false, max_values("mail", 1));
        let other = tuple(true, max_values("cn", 1));
        let result = MaxValueCountFilter.filter(vec![&deny, &other], &ctx).unwrap();
        assert_eq!(result, vec![&deny, &other]);
    }

    #[test]
    fn test_max_value_count_only_at_value_scope() {
        let schema = schema();
        let request = attribute_read("mail");
        let ctx = FilterContext::new(&request, &schema);
        let grant = tuple(true, max_values("mail", 0));
        assert_eq!(MaxValueCountFilter.filter(vec![&grant], &ctx).unwrap().len(), 1);
    }

    #[test]
    fn test_max_imm_sub() {
        let schema = schema();
        let mut request = entry_read();
        request.immediate_subordinates = 5;
        let ctx = FilterContext::new(&request, &schema);

        let full = tuple(true, ProtectedItem::MaxImmSub(5));
        let room = tuple(true, ProtectedItem::MaxImmSub(6));
        let deny = tuple(false, ProtectedItem::MaxImmSub(1));
        let unrelated = tuple(true, ProtectedItem::Entry);

        let result = MaxImmSubFilter
            .filter(vec![&full, &room, &deny, &unrelated], &ctx)
            .unwrap();
        assert_eq!(result, vec![&room, &deny, &unrelated]);
    }

    #[test]
    fn test_max_imm_sub_only_at_entry_scope() {
        let schema = schema();
        let mut request = attribute_read("cn");
        request.immediate_subordinates = 10;
        let ctx = FilterContext::new(&request, &schema);
        let full = tuple(true, ProtectedItem::MaxImmSub(1));
        assert_eq!(MaxImmSubFilter.filter(vec![&full], &ctx).unwrap().len(), 1);
    }

    #[test]
    fn test_restricted_by() {
        let schema = schema();
        let entry = Attributes::new().with("uniqueMember", [
            "cn=alice,ou=people,dc=example",
            "cn=bob,ou=people,dc=example",
        ]);

        let allowed = add_value("member", "CN=Bob,ou=people,dc=example", entry.clone());
        let ctx = FilterContext::new(&allowed, &schema);
        let grant = tuple(true, restricted("member", "uniqueMember"));
        assert_eq!(RestrictedByFilter.filter(vec![&grant], &ctx).unwrap().len(), 1);

        let outside = add_value("member", "cn=carol,ou=people,dc=example", entry);
        let ctx = FilterContext::new(&outside, &schema);
        let deny = tuple(false, restricted("member", "uniqueMember"));
        let result = RestrictedByFilter.filter(vec![&grant, &deny], &ctx).unwrap();
        assert_eq!(result, vec![&deny]);
    }

    #[test]
    fn test_restricted_by_missing_attribute_is_violation() {
        let schema = schema();
        let request = add_value("member", "cn=bob,dc=example", Attributes::new());
        let ctx = FilterContext::new(&request, &schema);
        let grant = base(true)
            .protected_item(restricted("member", "uniqueMember"))
            .build()
            .unwrap();
        assert!(RestrictedByFilter.filter(vec![&grant], &ctx).unwrap().is_empty());
    }
}
