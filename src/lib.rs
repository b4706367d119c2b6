// src/lib.rs
pub use config::EngineConfig;
pub use engine::{AciEngine, AciSnapshot};
pub use error::AciError;
pub use filters::{
    FilterContext, HighestPrecedenceFilter, MaxImmSubFilter, MaxValueCountFilter,
    MicroOperationFilter, MostSpecificProtectedItemFilter, MostSpecificUserClassFilter,
    RelatedProtectedItemFilter, RelatedUserClassFilter, RestrictedByFilter, TupleFilter,
};
pub use loader::{fingerprint, parse_subentries};
pub use pipeline::{Stage, evaluate, reduce, run_pipeline};
pub use schema::{BasicSchema, SchemaLookup};
pub use scoping::{RoleFilter, candidates, subentries_for};
pub use types::*;

mod config;
mod engine;
mod error;
mod filters;
mod loader;
mod pipeline;
mod schema;
mod scoping;
mod timers;
mod types;

#[cfg(feature = "observability")]
pub mod metrics;
