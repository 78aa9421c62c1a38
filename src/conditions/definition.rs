use super::{
    BooleanOperator, ConditionOperator, ConditionPart, ConditionTree, ListScope, PartId,
    PredicateOperand,
};
use crate::error::DefinitionError;
use serde::{Deserialize, Serialize};

/// The persisted, nested form of a display condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ConditionDefinition {
    #[serde(rename_all = "camelCase")]
    Group {
        operator: BooleanOperator,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scope: Option<ListScope>,
        #[serde(default)]
        children: Vec<ConditionDefinition>,
    },
    #[serde(rename_all = "camelCase")]
    Predicate {
        left: crate::datamodel::DataModelPath,
        operator: ConditionOperator,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        right: Option<PredicateOperand>,
    },
    #[serde(rename_all = "camelCase")]
    ListPredicate {
        item_path: String,
        operator: ConditionOperator,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        right: Option<PredicateOperand>,
    },
}

impl ConditionDefinition {
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        serde_json::from_str(json).map_err(|e| DefinitionError::JsonParseError(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, DefinitionError> {
        serde_json::to_string_pretty(self).map_err(|e| DefinitionError::JsonParseError(e.to_string()))
    }

    fn split(self) -> (ConditionPart, Vec<ConditionDefinition>) {
        match self {
            ConditionDefinition::Group {
                operator,
                scope,
                children,
            } => (ConditionPart::Group { operator, scope }, children),
            ConditionDefinition::Predicate {
                left,
                operator,
                right,
            } => (
                ConditionPart::Predicate {
                    left,
                    operator,
                    right,
                },
                Vec::new(),
            ),
            ConditionDefinition::ListPredicate {
                item_path,
                operator,
                right,
            } => (
                ConditionPart::ListPredicate {
                    item_path,
                    operator,
                    right,
                },
                Vec::new(),
            ),
        }
    }
}

impl ConditionTree {
    /// Builds a tree from its definition. A leaf at the top is wrapped in an `And` root.
    pub fn from_definition(definition: ConditionDefinition) -> Self {
        let (root_part, children) = match definition {
            group @ ConditionDefinition::Group { .. } => group.split(),
            leaf => (ConditionPart::group(BooleanOperator::And), vec![leaf]),
        };
        let mut tree = ConditionTree::default();
        tree.replace_part(tree.root(), root_part);
        let root = tree.root();
        let mut pending: Vec<(PartId, ConditionDefinition)> =
            children.into_iter().map(|c| (root, c)).collect();
        pending.reverse();
        while let Some((parent, definition)) = pending.pop() {
            let (part, children) = definition.split();
            if let Some(id) = tree.insert(parent, part) {
                pending.extend(children.into_iter().rev().map(|c| (id, c)));
            }
        }
        tree
    }

    pub fn to_definition(&self) -> ConditionDefinition {
        self.part_definition(self.root())
    }

    fn part_definition(&self, id: PartId) -> ConditionDefinition {
        match self.part(id).cloned() {
            Some(ConditionPart::Group { operator, scope }) => ConditionDefinition::Group {
                operator,
                scope,
                children: self
                    .children(id)
                    .iter()
                    .map(|c| self.part_definition(*c))
                    .collect(),
            },
            Some(ConditionPart::Predicate {
                left,
                operator,
                right,
            }) => ConditionDefinition::Predicate {
                left,
                operator,
                right,
            },
            Some(ConditionPart::ListPredicate {
                item_path,
                operator,
                right,
            }) => ConditionDefinition::ListPredicate {
                item_path,
                operator,
                right,
            },
            None => ConditionDefinition::Group {
                operator: BooleanOperator::And,
                scope: None,
                children: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_definition_keeps_child_order() {
        let definition: ConditionDefinition = serde_json::from_value(json!({
            "kind": "group",
            "operator": "Or",
            "children": [
                {"kind": "predicate", "left": {"module": "game", "path": "A"}, "operator": "IsNull"},
                {"kind": "group", "operator": "And", "children": [
                    {"kind": "listPredicate", "itemPath": "Name", "operator": "Equal",
                     "right": {"source": "Static", "value": {"type": "String", "value": "x"}}}
                ]}
            ]
        }))
        .unwrap();

        let tree = ConditionTree::from_definition(definition.clone());
        assert_eq!(tree.children(tree.root()).len(), 2);
        assert_eq!(tree.to_definition(), definition);
    }
}
