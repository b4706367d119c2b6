//! The fixed nine-stage tuple pipeline and the final grant/deny reduction.

use std::time::Duration;

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumIter};
use tracing::debug;

use crate::error::AciError;
use crate::filters::{
    FilterContext, HighestPrecedenceFilter, MaxImmSubFilter, MaxValueCountFilter,
    MicroOperationFilter, MostSpecificProtectedItemFilter, MostSpecificUserClassFilter,
    RelatedProtectedItemFilter, RelatedUserClassFilter, RestrictedByFilter, TupleFilter,
};
use crate::timers::PhaseTimer;
use crate::types::{AciTuple, Verdict};

/// The pipeline stages, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter, Serialize)]
pub enum Stage {
    RelatedUserClass,
    RelatedProtectedItem,
    MicroOperation,
    MaxValueCount,
    MaxImmSub,
    RestrictedBy,
    HighestPrecedence,
    MostSpecificUserClass,
    MostSpecificProtectedItem,
}

impl Stage {
    pub const ALL: [Stage; 9] = [
        Stage::RelatedUserClass,
        Stage::RelatedProtectedItem,
        Stage::MicroOperation,
        Stage::MaxValueCount,
        Stage::MaxImmSub,
        Stage::RestrictedBy,
        Stage::HighestPrecedence,
        Stage::MostSpecificUserClass,
        Stage::MostSpecificProtectedItem,
    ];

    /// Exclusionary stages may legitimately remove every tuple; the tiering
    /// stages never empty a non-empty input.
    pub fn is_exclusionary(&self) -> bool {
        !matches!(
            self,
            Stage::HighestPrecedence
                | Stage::MostSpecificUserClass
                | Stage::MostSpecificProtectedItem
        )
    }
}

impl TupleFilter for Stage {
    fn filter<'t>(
        &self,
        tuples: Vec<&'t AciTuple>,
        ctx: &FilterContext<'_>,
    ) -> Result<Vec<&'t AciTuple>, AciError> {
        match self {
            Stage::RelatedUserClass => RelatedUserClassFilter.filter(tuples, ctx),
            Stage::RelatedProtectedItem => RelatedProtectedItemFilter.filter(tuples, ctx),
            Stage::MicroOperation => MicroOperationFilter.filter(tuples, ctx),
            Stage::MaxValueCount => MaxValueCountFilter.filter(tuples, ctx),
            Stage::MaxImmSub => MaxImmSubFilter.filter(tuples, ctx),
            Stage::RestrictedBy => RestrictedByFilter.filter(tuples, ctx),
            Stage::HighestPrecedence => HighestPrecedenceFilter.filter(tuples, ctx),
            Stage::MostSpecificUserClass => MostSpecificUserClassFilter.filter(tuples, ctx),
            Stage::MostSpecificProtectedItem => {
                MostSpecificProtectedItemFilter.filter(tuples, ctx)
            }
        }
    }
}

/// Run every stage in order, stopping early once nothing is left.
pub fn run_pipeline<'t>(
    candidates: Vec<&'t AciTuple>,
    ctx: &FilterContext<'_>,
) -> Result<Vec<&'t AciTuple>, AciError> {
    run_stages(candidates, ctx, |_, _, _| {})
}

/// As [`run_pipeline`], reporting each stage, its output size and the time
/// it took to `observe`.
pub(crate) fn run_stages<'t, F>(
    candidates: Vec<&'t AciTuple>,
    ctx: &FilterContext<'_>,
    mut observe: F,
) -> Result<Vec<&'t AciTuple>, AciError>
where
    F: FnMut(Stage, usize, Duration),
{
    let mut tuples = candidates;
    for stage in Stage::ALL {
        if tuples.is_empty() {
            break;
        }
        let before = tuples.len();
        let mut elapsed = Duration::ZERO;
        {
            let _timer = PhaseTimer::new(&mut elapsed);
            tuples = stage.filter(tuples, ctx)?;
        }
        debug!(
            event = "Evaluate",
            phase = "Stage",
            stage = %stage,
            before = before,
            remaining = tuples.len()
        );
        observe(stage, tuples.len(), elapsed);
    }
    Ok(tuples)
}

/// Filter `candidates` through every stage and reduce what is left.
pub fn evaluate(candidates: Vec<&AciTuple>, ctx: &FilterContext<'_>) -> Result<Verdict, AciError> {
    Ok(reduce(&run_pipeline(candidates, ctx)?))
}

/// Reduce the surviving tuples to a verdict: nothing left means no rule
/// applies, any deny wins, otherwise grant.
pub fn reduce(tuples: &[&AciTuple]) -> Verdict {
    if tuples.is_empty() {
        Verdict::NoApplicableRule
    } else if tuples.iter().any(|t| !t.is_grant()) {
        Verdict::Deny
    } else {
        Verdict::Grant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::fixtures::{attribute_read, base, entry_read, schema, tuple};
    use crate::types::{
        AuthenticationLevel, EvaluationContext, MicroOperation, ProtectedItem, UserClass, dn,
    };
    use strum::IntoEnumIterator;

    fn corpus() -> Vec<AciTuple> {
        vec![
            base(true)
                .precedence(10)
                .protected_item(ProtectedItem::attribute_types(["mail"]))
                .build()
                .unwrap(),
            base(false)
                .precedence(10)
                .protected_item(ProtectedItem::Entry)
                .build()
                .unwrap(),
            base(true)
                .precedence(20)
                .protected_item(ProtectedItem::AllUserAttributeTypes)
                .build()
                .unwrap(),
            AciTuple::deny()
                .precedence(30)
                .user_class(UserClass::names([dn("cn=alice,ou=people,dc=example").unwrap()]))
                .min_auth_level(AuthenticationLevel::Strong)
                .protected_item(ProtectedItem::attribute_types(["userPassword"]))
                .micro_operations([MicroOperation::Read, MicroOperation::Compare])
                .build()
                .unwrap(),
            base(true)
                .protected_item(ProtectedItem::MaxImmSub(0))
                .micro_operation(MicroOperation::Add)
                .build()
                .unwrap(),
        ]
    }

    #[test]
    fn test_stage_order_is_fixed() {
        let names: Vec<String> = Stage::iter().map(|s| s.to_string()).collect();
        assert_eq!(names.len(), 9);
        assert_eq!(names[0], "RelatedUserClass");
        assert_eq!(names[8], "MostSpecificProtectedItem");
        assert_eq!(Stage::iter().collect::<Vec<_>>(), Stage::ALL.to_vec());
    }

    #[test]
    fn test_exclusionary_stages() {
        let exclusionary: Vec<Stage> = Stage::ALL
            .into_iter()
            .filter(Stage::is_exclusionary)
            .collect();
        assert_eq!(exclusionary.len(), 6);
        assert!(!Stage::MostSpecificProtectedItem.is_exclusionary());
    }

    #[test]
    fn test_every_stage_narrows_and_preserves_order() {
        let schema = schema();
        let tuples = corpus();
        for request in [entry_read(), attribute_read("mail"), attribute_read("userPassword")] {
            let ctx = FilterContext::new(&request, &schema);
            for stage in Stage::ALL {
                let input: Vec<&AciTuple> = tuples.iter().collect();
                let output = stage.filter(input.clone(), &ctx).unwrap();

                // Subset, in input order.
                let mut cursor = input.iter();
                for kept in &output {
                    assert!(
                        cursor.any(|t| std::ptr::eq(*t, *kept)),
                        "{stage} reordered or invented tuples"
                    );
                }
                if !stage.is_exclusionary() {
                    assert!(!output.is_empty(), "{stage} emptied a non-empty input");
                }
            }
        }
    }

    #[test]
    fn test_tiering_stages_pass_single_tuple() {
        let schema = schema();
        let request = entry_read();
        let ctx = FilterContext::new(&request, &schema);
        let only = tuple(true, ProtectedItem::Entry);
        for stage in Stage::ALL.into_iter().filter(|s| !s.is_exclusionary()) {
            assert_eq!(stage.filter(vec![&only], &ctx).unwrap(), vec![&only]);
        }
    }

    #[test]
    fn test_attribute_rule_beats_entry_deny() {
        let schema = schema();
        let request = attribute_read("mail");
        let ctx = FilterContext::new(&request, &schema);
        let tuples = corpus();

        // The two precedence-10 tuples.
        let input: Vec<&AciTuple> = tuples[..2].iter().collect();
        let result = run_pipeline(input, &ctx).unwrap();
        assert_eq!(reduce(&result), Verdict::Grant);
    }

    #[test]
    fn test_entry_deny_applies_to_entry_scope() {
        let schema = schema();
        let request = entry_read();
        let ctx = FilterContext::new(&request, &schema);
        let tuples = corpus();
        let result = run_pipeline(tuples.iter().collect(), &ctx).unwrap();
        assert_eq!(reduce(&result), Verdict::Deny);
    }

    #[test]
    fn test_higher_precedence_deny_wins() {
        let schema = schema();
        let request = attribute_read("userPassword");
        let ctx = FilterContext::new(&request, &schema);
        let tuples = corpus();
        let result = run_pipeline(tuples.iter().collect(), &ctx).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(reduce(&result), Verdict::Deny);
    }

    #[test]
    fn test_deny_dominates_equally_specific_grant() {
        let schema = schema();
        let request = attribute_read("mail");
        let ctx = FilterContext::new(&request, &schema);
        let grant = tuple(true, ProtectedItem::attribute_types(["mail"]));
        let deny = tuple(false, ProtectedItem::attribute_types(["mail"]));
        let result = run_pipeline(vec![&grant, &deny], &ctx).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(reduce(&result), Verdict::Deny);
    }

    #[test]
    fn test_no_candidates_is_no_applicable_rule() {
        let schema = schema();
        let request = entry_read();
        let ctx = FilterContext::new(&request, &schema);
        assert_eq!(evaluate(Vec::new(), &ctx).unwrap(), Verdict::NoApplicableRule);
    }

    #[test]
    fn test_evaluate_propagates_filter_errors() {
        let strict = crate::schema::BasicSchema::new().strict(true);
        let request = attribute_read("favouriteDrink");
        let ctx = FilterContext::new(&request, &strict);
        let tuples = corpus();
        assert!(evaluate(tuples.iter().collect(), &ctx).unwrap_err().is_lookup());
    }

    #[test]
    fn test_unmatched_operation_is_no_applicable_rule() {
        let schema = schema();
        let request = EvaluationContext::builder(dn("cn=bob,ou=people,dc=example").unwrap())
            .micro_operation(MicroOperation::Export)
            .build();
        let ctx = FilterContext::new(&request, &schema);
        let tuples = corpus();
        let result = run_pipeline(tuples.iter().collect(), &ctx).unwrap();
        assert_eq!(reduce(&result), Verdict::NoApplicableRule);
    }

    #[test]
    fn test_run_stages_reports_each_stage_until_empty() {
        let schema = schema();
        let request = EvaluationContext::builder(dn("cn=bob,dc=example").unwrap())
            .micro_operation(MicroOperation::Export)
            .build();
        let ctx = FilterContext::new(&request, &schema);
        let tuples = corpus();

        let mut seen = Vec::new();
        run_stages(tuples.iter().collect(), &ctx, |stage, remaining, _| {
            seen.push((stage, remaining))
        })
        .unwrap();
        assert_eq!(seen.last(), Some(&(Stage::MicroOperation, 0)));
        assert_eq!(seen.len(), 3);
    }
}
