use crate::error::AciError;
use crate::types::AciTuple;

use super::{FilterContext, TupleFilter};

/// Keeps only the tuples at the highest precedence present.
#[derive(Debug, Default, Clone, Copy)]
pub struct HighestPrecedenceFilter;

impl TupleFilter for HighestPrecedenceFilter {
    fn filter<'t>(
        &self,
        tuples: Vec<&'t AciTuple>,
        _ctx: &FilterContext<'_>,
    ) -> Result<Vec<&'t AciTuple>, AciError> {
        if tuples.len() <= 1 {
            return Ok(tuples);
        }
        let Some(highest) = tuples.iter().map(|t| t.precedence()).max() else {
            return Ok(tuples);
        };
        Ok(tuples
            .into_iter()
            .filter(|t| t.precedence() == highest)
            .collect())
    }
}
