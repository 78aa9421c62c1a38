//! Display conditions: boolean trees over module data models deciding whether a profile
//! element is shown.

pub mod definition;
mod operator;
mod part;
mod tree;

pub use definition::ConditionDefinition;
pub use operator::{BooleanOperator, ConditionOperator, ListQuantifier};
pub use part::{ConditionPart, ListScope, PartId, PredicateOperand};
pub use tree::{ConditionChange, ConditionTree};
