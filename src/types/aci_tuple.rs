//! ACI tuples: expanded, atomic access control rules.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FmtResult};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::AciError;

use super::auth_level::AuthenticationLevel;
use super::micro_operation::MicroOperation;
use super::protected_item::ProtectedItem;
use super::user_class::UserClass;

/// One grant-or-deny rule: who, what, which micro-operations, at which
/// precedence. Immutable once built; every set is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "AciTupleSpec")]
pub struct AciTuple {
    grant: bool,
    precedence: u8,
    user_classes: Vec<UserClass>,
    min_auth_level: AuthenticationLevel,
    protected_items: Vec<ProtectedItem>,
    micro_operations: BTreeSet<MicroOperation>,
}

/// The unvalidated wire form of an [`AciTuple`].
#[derive(Debug, Clone, Deserialize)]
struct AciTupleSpec {
    grant: bool,
    #[serde(default)]
    precedence: u8,
    user_classes: Vec<UserClass>,
    #[serde(default)]
    min_auth_level: AuthenticationLevel,
    protected_items: Vec<ProtectedItem>,
    micro_operations: BTreeSet<MicroOperation>,
}

impl TryFrom<AciTupleSpec> for AciTuple {
    type Error = AciError;

    fn try_from(spec: AciTupleSpec) -> Result<Self, Self::Error> {
        let tuple = AciTuple {
            grant: spec.grant,
            precedence: spec.precedence,
            user_classes: spec.user_classes,
            min_auth_level: spec.min_auth_level,
            protected_items: spec.protected_items,
            micro_operations: spec.micro_operations,
        };
        tuple.validate()?;
        Ok(tuple)
    }
}

impl AciTuple {
    /// Start building a granting tuple.
    pub fn grant() -> AciTupleBuilder {
        AciTupleBuilder::new(true)
    }

    /// Start building a denying tuple.
    pub fn deny() -> AciTupleBuilder {
        AciTupleBuilder::new(false)
    }

    pub fn is_grant(&self) -> bool {
        self.grant
    }

    pub fn precedence(&self) -> u8 {
        self.precedence
    }

    pub fn user_classes(&self) -> &[UserClass] {
        &self.user_classes
    }

    pub fn min_auth_level(&self) -> AuthenticationLevel {
        self.min_auth_level
    }

    pub fn protected_items(&self) -> &[ProtectedItem] {
        &self.protected_items
    }

    pub fn micro_operations(&self) -> &BTreeSet<MicroOperation> {
        &self.micro_operations
    }

    fn validate(&self) -> Result<(), AciError> {
        if self.user_classes.is_empty() {
            return Err(AciError::Configuration(
                "ACI tuple has no user classes".to_string(),
            ));
        }
        if self.protected_items.is_empty() {
            return Err(AciError::Configuration(
                "ACI tuple has no protected items".to_string(),
            ));
        }
        if self.micro_operations.is_empty() {
            return Err(AciError::Configuration(
                "ACI tuple has no micro-operations".to_string(),
            ));
        }
        for class in &self.user_classes {
            class.validate()?;
        }
        for item in &self.protected_items {
            item.validate()?;
        }
        Ok(())
    }
}

impl Display for AciTuple {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}(precedence={}; users=[{}]; items=[{}]; ops=[{}]; auth={})",
            if self.grant { "grant" } else { "deny" },
            self.precedence,
            self.user_classes.iter().map(UserClass::kind).join(", "),
            self.protected_items.iter().map(ProtectedItem::kind).join(", "),
            self.micro_operations.iter().join(", "),
            self.min_auth_level,
        )
    }
}

/// Builder for [`AciTuple`]; `build` enforces the non-empty invariants.
#[derive(Debug, Clone)]
pub struct AciTupleBuilder {
    grant: bool,
    precedence: u8,
    user_classes: Vec<UserClass>,
    min_auth_level: AuthenticationLevel,
    protected_items: Vec<ProtectedItem>,
    micro_operations: BTreeSet<MicroOperation>,
}

impl AciTupleBuilder {
    fn new(grant: bool) -> Self {
        Self {
            grant,
            precedence: 0,
            user_classes: Vec::new(),
            min_auth_level: AuthenticationLevel::None,
            protected_items: Vec::new(),
            micro_operations: BTreeSet::new(),
        }
    }

    pub fn precedence(mut self, precedence: u8) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn user_class(mut self, class: UserClass) -> Self {
        if !self.user_classes.contains(&class) {
            self.user_classes.push(class);
        }
        self
    }

    pub fn min_auth_level(mut self, level: AuthenticationLevel) -> Self {
        self.min_auth_level = level;
        self
    }

    pub fn protected_item(mut self, item: ProtectedItem) -> Self {
        if !self.protected_items.contains(&item) {
            self.protected_items.push(item);
        }
        self
    }

    pub fn micro_operation(mut self, op: MicroOperation) -> Self {
        self.micro_operations.insert(op);
        self
    }

    pub fn micro_operations<I: IntoIterator<Item = MicroOperation>>(mut self, ops: I) -> Self {
        self.micro_operations.extend(ops);
        self
    }

    pub fn build(self) -> Result<AciTuple, AciError> {
        AciTuple::try_from(AciTupleSpec {
            grant: self.grant,
            precedence: self.precedence,
            user_classes: self.user_classes,
            min_auth_level: self.min_auth_level,
            protected_items: self.protected_items,
            micro_operations: self.micro_operations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn mail_reader() -> AciTuple {
        AciTuple::grant()
            .precedence(10)
            .user_class(UserClass::AllUsers)
            .protected_item(ProtectedItem::attribute_types(["mail"]))
            .micro_operation(MicroOperation::Read)
            .micro_operation(MicroOperation::Compare)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder() {
        let tuple = mail_reader();
        assert!(tuple.is_grant());
        assert_eq!(tuple.precedence(), 10);
        assert_eq!(tuple.user_classes(), &[UserClass::AllUsers]);
        assert_eq!(tuple.micro_operations().len(), 2);
        assert_eq!(tuple.min_auth_level(), AuthenticationLevel::None);
    }

    #[test]
    fn test_default_precedence_is_zero() {
        let tuple = AciTuple::deny()
            .user_class(UserClass::AllUsers)
            .protected_item(ProtectedItem::Entry)
            .micro_operation(MicroOperation::Browse)
            .build()
            .unwrap();
        assert_eq!(tuple.precedence(), 0);
        assert!(!tuple.is_grant());
    }

    #[test]
    fn test_empty_sets_are_configuration_errors() {
        let no_users = AciTuple::grant()
            .protected_item(ProtectedItem::Entry)
            .micro_operation(MicroOperation::Read)
            .build();
        let no_items = AciTuple::grant()
            .user_class(UserClass::AllUsers)
            .micro_operation(MicroOperation::Read)
            .build();
        let no_ops = AciTuple::grant()
            .user_class(UserClass::AllUsers)
            .protected_item(ProtectedItem::Entry)
            .build();

        for result in [no_users, no_items, no_ops] {
            assert!(result.unwrap_err().is_configuration());
        }
    }

    #[test]
    fn test_nested_validation() {
        let result = AciTuple::grant()
            .user_class(UserClass::AllUsers)
            .protected_item(ProtectedItem::attribute_types(Vec::<String>::new()))
            .micro_operation(MicroOperation::Read)
            .build();
        assert!(result.unwrap_err().is_configuration());
    }

    #[test]
    fn test_deserialize_validates() {
        let json = serde_json::json!({
            "grant": true,
            "user_classes": [],
            "protected_items": [{"type": "entry"}],
            "micro_operations": ["read"]
        });
        let err = serde_json::from_value::<AciTuple>(json).unwrap_err();
        assert!(err.to_string().contains("no user classes"));
    }

    #[test]
    fn test_deserialize_rejects_unknown_micro_operation() {
        let json = serde_json::json!({
            "grant": true,
            "user_classes": [{"type": "all_users"}],
            "protected_items": [{"type": "entry"}],
            "micro_operations": ["teleport"]
        });
        let err = serde_json::from_value::<AciTuple>(json).unwrap_err();
        assert!(err.to_string().contains("teleport"));
    }

    #[test]
    fn test_round_trip() {
        let tuple = mail_reader();
        let serialized = serde_json::to_value(&tuple).unwrap();
        let deserialized: AciTuple = serde_json::from_value(serialized).unwrap();
        assert_eq!(tuple, deserialized);
    }

    #[test]
    fn test_display() {
        assert_snapshot!(
            mail_reader().to_string(),
            @"grant(precedence=10; users=[AllUsers]; items=[AttributeType]; ops=[compare, read]; auth=none)"
        );
    }
}
