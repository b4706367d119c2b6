//! Authentication levels.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::error::AciError;

/// How strongly a requester was authenticated. Ordered `None < Simple < Strong`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticationLevel {
    #[default]
    None,
    Simple,
    Strong,
}

impl AuthenticationLevel {
    /// True when a requester at `self` meets a `required` minimum.
    pub fn satisfies(&self, required: AuthenticationLevel) -> bool {
        *self >= required
    }

    pub fn parse(s: &str) -> Result<Self, AciError> {
        AuthenticationLevel::from_str(s.trim()).map_err(|_| {
            AciError::Configuration(format!("unknown authentication level '{s}'"))
        })
    }
}
