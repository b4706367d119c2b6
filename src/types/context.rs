//! The per-request evaluation context.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::AciError;

use super::attributes::Attributes;
use super::auth_level::AuthenticationLevel;
use super::dn::Dn;
use super::micro_operation::MicroOperation;

/// What part of the target an access check is about.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OperationScope {
    #[default]
    Entry,
    AttributeType,
    AttributeTypeAndValue,
}

/// Everything the filters may consult about one request. Read-only for the
/// duration of an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationContext {
    pub scope: OperationScope,
    /// Name of the requester.
    pub user_name: Dn,
    /// Groups the requester belongs to.
    pub user_groups: BTreeSet<Dn>,
    /// The requester's own entry.
    pub user_entry: Attributes,
    pub authentication_level: AuthenticationLevel,
    /// Name of the target entry.
    pub entry_name: Dn,
    pub attribute_id: Option<String>,
    pub attribute_value: Option<String>,
    /// The target entry.
    pub entry: Attributes,
    /// Live count of the target entry's immediate subordinates.
    pub immediate_subordinates: usize,
    pub micro_operations: BTreeSet<MicroOperation>,
}

impl EvaluationContext {
    pub fn builder(entry_name: Dn) -> EvaluationContextBuilder {
        EvaluationContextBuilder {
            ctx: EvaluationContext {
                scope: OperationScope::Entry,
                user_name: Dn::root(),
                user_groups: BTreeSet::new(),
                user_entry: Attributes::new(),
                authentication_level: AuthenticationLevel::None,
                entry_name,
                attribute_id: None,
                attribute_value: None,
                entry: Attributes::new(),
                immediate_subordinates: 0,
                micro_operations: BTreeSet::new(),
            },
        }
    }

    /// Reject contexts no rule could ever be evaluated against.
    pub fn validate(&self) -> Result<(), AciError> {
        if self.micro_operations.is_empty() {
            return Err(AciError::Configuration(format!(
                "no micro-operations requested on '{}'",
                self.entry_name
            )));
        }
        let missing = match self.scope {
            OperationScope::Entry => None,
            OperationScope::AttributeType => self.attribute_id.is_none().then_some("attribute id"),
            OperationScope::AttributeTypeAndValue => {
                if self.attribute_id.is_none() {
                    Some("attribute id")
                } else if self.attribute_value.is_none() {
                    Some("attribute value")
                } else {
                    None
                }
            }
        };
        if let Some(missing) = missing {
            return Err(AciError::Configuration(format!(
                "{} scope requires an {missing}",
                self.scope
            )));
        }
        Ok(())
    }
}

/// Fluent construction of an [`EvaluationContext`].
#[derive(Debug, Clone)]
pub struct EvaluationContextBuilder {
    ctx: EvaluationContext,
}

impl EvaluationContextBuilder {
    pub fn user_name(mut self, name: Dn) -> Self {
        self.ctx.user_name = name;
        self
    }

    pub fn user_group(mut self, group: Dn) -> Self {
        self.ctx.user_groups.insert(group);
        self
    }

    pub fn user_groups<I: IntoIterator<Item = Dn>>(mut self, groups: I) -> Self {
        self.ctx.user_groups.extend(groups);
        self
    }

    pub fn user_entry(mut self, entry: Attributes) -> Self {
        self.ctx.user_entry = entry;
        self
    }

    pub fn authentication_level(mut self, level: AuthenticationLevel) -> Self {
        self.ctx.authentication_level = level;
        self
    }

    /// Check access to an attribute type of the target.
    pub fn attribute(mut self, id: impl Into<String>) -> Self {
        self.ctx.scope = OperationScope::AttributeType;
        self.ctx.attribute_id = Some(id.into());
        self.ctx.attribute_value = None;
        self
    }

    /// Check access to one value of an attribute of the target.
    pub fn attribute_value(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.ctx.scope = OperationScope::AttributeTypeAndValue;
        self.ctx.attribute_id = Some(id.into());
        self.ctx.attribute_value = Some(value.into());
        self
    }

    pub fn entry(mut self, entry: Attributes) -> Self {
        self.ctx.entry = entry;
        self
    }

    pub fn immediate_subordinates(mut self, count: usize) -> Self {
        self.ctx.immediate_subordinates = count;
        self
    }

    pub fn micro_operation(mut self, op: MicroOperation) -> Self {
        self.ctx.micro_operations.insert(op);
        self
    }

    pub fn micro_operations<I: IntoIterator<Item = MicroOperation>>(mut self, ops: I) -> Self {
        self.ctx.micro_operations.extend(ops);
        self
    }

    pub fn build(self) -> EvaluationContext {
        self.ctx
    }
}
