use crate::error::AciError;
use crate::types::AciTuple;

use super::{FilterContext, TupleFilter};

/// Keeps the tuples that cover at least one requested micro-operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct MicroOperationFilter;

impl TupleFilter for MicroOperationFilter {
    fn filter<'t>(
        &self,
        tuples: Vec<&'t AciTuple>,
        ctx: &FilterContext<'_>,
    ) -> Result<Vec<&'t AciTuple>, AciError> {
        let requested = &ctx.request.micro_operations;
        Ok(tuples
            .into_iter()
            .filter(|tuple| !tuple.micro_operations().is_disjoint(requested))
            .collect())
    }
}
