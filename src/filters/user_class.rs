use crate::error::AciError;
use crate::types::AciTuple;

use super::{FilterContext, TupleFilter, retain_tuples};

/// Keeps the tuples whose user classes describe the requester.
///
/// Grants additionally require the requester to meet the tuple's minimum
/// authentication level. Denies are kept when the requester falls short of
/// that level even if no class names them, so weak authentication can never
/// sidestep a deny.
#[derive(Debug, Default, Clone, Copy)]
pub struct RelatedUserClassFilter;

impl RelatedUserClassFilter {
    fn is_relevant(tuple: &AciTuple, ctx: &FilterContext<'_>) -> Result<bool, AciError> {
        let described = describes_requester(tuple, ctx)?;
        let authenticated = ctx
            .request
            .authentication_level
            .satisfies(tuple.min_auth_level());
        Ok(if tuple.is_grant() {
            described && authenticated
        } else {
            described || !authenticated
        })
    }
}

fn describes_requester(tuple: &AciTuple, ctx: &FilterContext<'_>) -> Result<bool, AciError> {
    for class in tuple.user_classes() {
        if class.describes(ctx.request)? {
            return Ok(true);
        }
    }
    Ok(false)
}

impl TupleFilter for RelatedUserClassFilter {
    fn filter<'t>(
        &self,
        tuples: Vec<&'t AciTuple>,
        ctx: &FilterContext<'_>,
    ) -> Result<Vec<&'t AciTuple>, AciError> {
        retain_tuples(tuples, |tuple| Self::is_relevant(tuple, ctx))
    }
}

/// Keeps the tuples that name the requester most specifically: by name (or as
/// the target entry itself), then by group, then by subtree, then by
/// authentication level. When only `AllUsers` applies, nothing is removed.
#[derive(Debug, Default, Clone, Copy)]
pub struct MostSpecificUserClassFilter;

const USER_CLASS_TIERS: u8 = 4;

impl MostSpecificUserClassFilter {
    /// The most specific tier among the tuple's classes that describe the
    /// requester.
    fn best_tier(tuple: &AciTuple, ctx: &FilterContext<'_>) -> Result<Option<u8>, AciError> {
        let mut best: Option<u8> = None;
        for class in tuple.user_classes() {
            let Some(tier) = class.specificity_tier() else {
                continue;
            };
            if best.is_some_and(|b| b <= tier) {
                continue;
            }
            if class.describes(ctx.request)? {
                best = Some(tier);
            }
        }
        Ok(best)
    }
}

impl TupleFilter for MostSpecificUserClassFilter {
    fn filter<'t>(
        &self,
        tuples: Vec<&'t AciTuple>,
        ctx: &FilterContext<'_>,
    ) -> Result<Vec<&'t AciTuple>, AciError> {
        if tuples.len() <= 1 {
            return Ok(tuples);
        }

        let mut ranked = Vec::with_capacity(tuples.len());
        for tuple in &tuples {
            ranked.push(Self::best_tier(tuple, ctx)?);
        }

        for tier in 0..USER_CLASS_TIERS {
            let selected: Vec<&'t AciTuple> = tuples
                .iter()
                .zip(&ranked)
                .filter(|(_, rank)| **rank == Some(tier))
                .map(|(tuple, _)| *tuple)
                .collect();
            if !selected.is_empty() {
                return Ok(selected);
            }
        }
        Ok(tuples)
    }
}
