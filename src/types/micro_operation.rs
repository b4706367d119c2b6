//! Micro-operations: the atomic permission units granted or denied by a tuple.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::AciError;

/// A permission finer-grained than a protocol operation. A search, for
/// instance, needs `Browse` on the entry plus `Read` on each returned
/// attribute and `FilterMatch` on each filtered one.
#[derive(
    Debug,
    Clone,
    Copy,
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
)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum MicroOperation {
    Add,
    Browse,
    Compare,
    DiscloseOnError,
    Export,
    FilterMatch,
    Import,
    Invoke,
    Modify,
    Read,
    Remove,
    Rename,
    #[strum(to_string = "returnDN")]
    ReturnDn,
}

impl TryFrom<String> for MicroOperation {
    type Error = AciError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MicroOperation::from_str(value.trim())
            .map_err(|_| AciError::Configuration(format!("unknown micro-operation '{value}'")))
    }
}

impl From<MicroOperation> for String {
    fn from(op: MicroOperation) -> Self {
        op.to_string()
    }
}

/// Parse a list of micro-operation tags, failing on the first unknown one.
pub fn parse_micro_operations<I, S>(tags: I) -> Result<BTreeSet<MicroOperation>, AciError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| MicroOperation::try_from(t.as_ref().to_string()))
        .collect()
}
