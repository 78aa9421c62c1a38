use crate::value::{Value, coerce_to};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How a group combines the verdicts of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BooleanOperator {
    /// Every child is true. Vacuously true when empty.
    #[default]
    And,
    /// At least one child is true. False when empty.
    Or,
    /// Every child is false. Vacuously true when empty.
    AndNot,
    /// At least one child is false. False when empty.
    OrNot,
}

impl BooleanOperator {
    /// Combines child verdicts, short-circuiting where the operator allows.
    pub fn combine(self, mut verdicts: impl Iterator<Item = bool>) -> bool {
        match self {
            BooleanOperator::And => verdicts.all(|v| v),
            BooleanOperator::Or => verdicts.any(|v| v),
            BooleanOperator::AndNot => verdicts.all(|v| !v),
            BooleanOperator::OrNot => verdicts.any(|v| !v),
        }
    }
}

/// How many items of a list must satisfy a list-scoped group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ListQuantifier {
    #[default]
    Any,
    All,
    None,
}

impl ListQuantifier {
    pub fn apply(self, mut verdicts: impl Iterator<Item = bool>) -> bool {
        match self {
            ListQuantifier::Any => verdicts.any(|v| v),
            ListQuantifier::All => verdicts.all(|v| v),
            ListQuantifier::None => !verdicts.any(|v| v),
        }
    }
}

/// The comparison a predicate applies between its left value and its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
    StartsWith,
    EndsWith,
    IsNull,
    IsNotNull,
}

impl ConditionOperator {
    /// Whether the operator looks at the right-hand operand at all.
    pub fn takes_operand(self) -> bool {
        !matches!(self, ConditionOperator::IsNull | ConditionOperator::IsNotNull)
    }

    /// Applies the operator. A missing operand makes every binary comparison false.
    ///
    /// Numbers compare by value across numeric kinds, text comparisons ignore case and
    /// `Contains` on a list looks for an equal item.
    pub fn apply(self, left: Option<&Value>, right: Option<&Value>) -> bool {
        match (self, left, right) {
            (ConditionOperator::IsNull, left, _) => left.is_none(),
            (ConditionOperator::IsNotNull, left, _) => left.is_some(),
            (op, Some(left), Some(right)) => op.compare_values(left, right),
            _ => false,
        }
    }

    fn compare_values(self, left: &Value, right: &Value) -> bool {
        match self {
            ConditionOperator::Equal => values_equal(left, right),
            ConditionOperator::NotEqual => !values_equal(left, right),
            ConditionOperator::GreaterThan => compare(left, right).is_some_and(Ordering::is_gt),
            ConditionOperator::GreaterThanOrEqual => compare(left, right).is_some_and(Ordering::is_ge),
            ConditionOperator::LessThan => compare(left, right).is_some_and(Ordering::is_lt),
            ConditionOperator::LessThanOrEqual => compare(left, right).is_some_and(Ordering::is_le),
            ConditionOperator::Contains => match left {
                Value::List(items) => items.iter().any(|item| values_equal(item, right)),
                _ => text_pair(left, right).is_some_and(|(l, r)| l.contains(&r)),
            },
            ConditionOperator::StartsWith => {
                text_pair(left, right).is_some_and(|(l, r)| l.starts_with(&r))
            }
            ConditionOperator::EndsWith => {
                text_pair(left, right).is_some_and(|(l, r)| l.ends_with(&r))
            }
            ConditionOperator::IsNull | ConditionOperator::IsNotNull => false,
        }
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    if let (Some(l), Some(r)) = (left.as_f64(), right.as_f64()) {
        return l == r;
    }
    if let (Value::String(l), Value::String(r)) = (left, right) {
        return l.eq_ignore_ascii_case(r);
    }
    coerce_to(Some(right), left.value_type()).is_some_and(|r| *left == r)
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    left.as_f64()?.partial_cmp(&right.as_f64()?)
}

fn text_pair(left: &Value, right: &Value) -> Option<(String, String)> {
    Some((left.as_str()?.to_lowercase(), right.as_str()?.to_lowercase()))
}
