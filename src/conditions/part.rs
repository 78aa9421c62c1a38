use super::{BooleanOperator, ConditionOperator, ListQuantifier};
use crate::datamodel::{DataModelPath, DataModelResolver};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tree-unique identifier of a condition part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(pub(crate) u64);

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "part#{}", self.0)
    }
}

/// Restricts a group to the items of a list in the data model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListScope {
    pub path: DataModelPath,
    #[serde(default)]
    pub quantifier: ListQuantifier,
}

/// The right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value")]
pub enum PredicateOperand {
    Static(Value),
    /// Another data model property, resolved on every evaluation.
    Dynamic(DataModelPath),
}

impl PredicateOperand {
    pub fn resolve(&self, resolver: &dyn DataModelResolver) -> Option<Value> {
        match self {
            PredicateOperand::Static(value) => Some(value.clone()),
            PredicateOperand::Dynamic(path) => resolver.resolve(path)?.value().cloned(),
        }
    }
}

/// One node of a display condition tree. Only groups have children.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionPart {
    Group {
        operator: BooleanOperator,
        scope: Option<ListScope>,
    },
    /// Compares a data model property against an operand.
    Predicate {
        left: DataModelPath,
        operator: ConditionOperator,
        right: Option<PredicateOperand>,
    },
    /// Compares a property of the current list item, given relative to the item.
    ListPredicate {
        item_path: String,
        operator: ConditionOperator,
        right: Option<PredicateOperand>,
    },
}

impl ConditionPart {
    pub fn group(operator: BooleanOperator) -> Self {
        ConditionPart::Group {
            operator,
            scope: None,
        }
    }

    pub fn list_group(operator: BooleanOperator, path: DataModelPath, quantifier: ListQuantifier) -> Self {
        ConditionPart::Group {
            operator,
            scope: Some(ListScope { path, quantifier }),
        }
    }

    pub fn predicate(left: DataModelPath, operator: ConditionOperator, right: impl Into<Value>) -> Self {
        ConditionPart::Predicate {
            left,
            operator,
            right: Some(PredicateOperand::Static(right.into())),
        }
    }

    pub fn list_predicate(
        item_path: impl Into<String>,
        operator: ConditionOperator,
        right: impl Into<Value>,
    ) -> Self {
        ConditionPart::ListPredicate {
            item_path: item_path.into(),
            operator,
            right: Some(PredicateOperand::Static(right.into())),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ConditionPart::Group { .. })
    }
}
