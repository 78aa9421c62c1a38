//! Tests for display condition trees evaluated against module data models.
mod common;
use common::*;
use hikari::conditions::{ConditionDefinition, ListScope, PredicateOperand};
use hikari::prelude::*;
use tokio::sync::broadcast::error::TryRecvError;

fn health_above(threshold: i32) -> ConditionPart {
    ConditionPart::predicate(game_path("Player.Health"), ConditionOperator::GreaterThan, threshold)
}

#[cfg(test)]
mod condition_tests {
    use super::*;

    #[test]
    fn test_empty_groups_follow_vacuous_truth_at_any_depth() {
        let modules = game_registry();

        let and_tree = ConditionTree::new(BooleanOperator::And);
        assert!(and_tree.evaluate(modules.as_ref()));
        let or_tree = ConditionTree::new(BooleanOperator::Or);
        assert!(!or_tree.evaluate(modules.as_ref()));

        let mut nested = ConditionTree::new(BooleanOperator::Or);
        let root = nested.root();
        let inner = nested.insert(root, ConditionPart::group(BooleanOperator::And)).expect("group");
        assert!(nested.evaluate(modules.as_ref()), "empty AND below OR is still true");
        nested.replace_part(inner, ConditionPart::group(BooleanOperator::Or));
        assert!(!nested.evaluate(modules.as_ref()));
    }

    #[test]
    fn test_add_and_remove_child_are_idempotent() {
        let mut tree = ConditionTree::default();
        let root = tree.root();
        let leaf = tree.create(health_above(50));

        assert!(tree.add_child(root, leaf));
        assert!(!tree.add_child(root, leaf));
        assert_eq!(tree.children(root), &[leaf]);

        let stranger = tree.create(health_above(10));
        assert!(!tree.remove_child(root, stranger));
        assert_eq!(tree.children(root), &[leaf]);

        assert!(tree.remove_child(root, leaf));
        assert!(!tree.remove_child(root, leaf));
        assert!(tree.children(root).is_empty());
        assert!(tree.contains(leaf), "detached parts stay available");
    }

    #[test]
    fn test_predicates_against_the_data_model() {
        let modules = game_registry();
        let mut tree = ConditionTree::default();
        let root = tree.root();
        tree.insert(root, health_above(50));
        tree.insert(
            root,
            ConditionPart::predicate(game_path("Player.Name"), ConditionOperator::StartsWith, "he"),
        );
        tree.insert(
            root,
            ConditionPart::predicate(game_path("Player.Alive"), ConditionOperator::Equal, true),
        );
        assert!(tree.evaluate(modules.as_ref()));

        tree.insert(root, health_above(90));
        assert!(!tree.evaluate(modules.as_ref()));
    }

    #[test]
    fn test_unresolvable_predicates_are_false() {
        let modules = game_registry();
        for path in ["Player.Mana", "Target.Health", "Inventory"] {
            let mut tree = ConditionTree::default();
            let root = tree.root();
            tree.insert(
                root,
                ConditionPart::Predicate {
                    left: game_path(path),
                    operator: ConditionOperator::IsNotNull,
                    right: None,
                },
            );
            assert!(!tree.evaluate(modules.as_ref()), "{path} should not resolve");
        }
    }

    #[test]
    fn test_disabled_module_makes_predicates_false() {
        let modules = game_registry();
        let mut tree = ConditionTree::new(BooleanOperator::And);
        let root = tree.root();
        tree.insert(root, health_above(0));
        assert!(tree.evaluate(modules.as_ref()));

        modules.get("game").expect("module").disable();
        assert!(!tree.evaluate(modules.as_ref()));
    }

    #[test]
    fn test_dynamic_operand_compares_two_properties() {
        let modules = game_registry();
        let mut tree = ConditionTree::default();
        let root = tree.root();
        tree.insert(
            root,
            ConditionPart::Predicate {
                left: game_path("Player.Health"),
                operator: ConditionOperator::GreaterThan,
                right: Some(PredicateOperand::Dynamic(game_path("Inventory"))),
            },
        );
        assert!(!tree.evaluate(modules.as_ref()), "a list operand never compares");

        tree.replace_part(
            tree.children(root)[0],
            ConditionPart::Predicate {
                left: game_path("Player.Health"),
                operator: ConditionOperator::Equal,
                right: Some(PredicateOperand::Dynamic(game_path("Player.Health"))),
            },
        );
        assert!(tree.evaluate(modules.as_ref()));
    }

    #[test]
    fn test_list_scoped_groups() {
        let modules = game_registry();
        let scoped = |quantifier| {
            let mut tree = ConditionTree::default();
            let root = tree.root();
            let group = tree
                .insert(
                    root,
                    ConditionPart::list_group(BooleanOperator::And, game_path("Inventory"), quantifier),
                )
                .expect("group");
            tree.insert(
                group,
                ConditionPart::list_predicate("Count", ConditionOperator::GreaterThanOrEqual, 2),
            );
            tree
        };

        assert!(scoped(ListQuantifier::Any).evaluate(modules.as_ref()));
        assert!(!scoped(ListQuantifier::All).evaluate(modules.as_ref()));
        assert!(!scoped(ListQuantifier::None).evaluate(modules.as_ref()));
    }

    #[test]
    fn test_empty_and_missing_lists() {
        let modules = game_registry();
        modules
            .get("game")
            .expect("module")
            .update_data_model(|model| model.insert("Inventory", DataModelEntry::List(Vec::new())));

        let tree_for = |path: &str, quantifier| {
            let mut tree = ConditionTree::default();
            let root = tree.root();
            tree.insert(
                root,
                ConditionPart::Group {
                    operator: BooleanOperator::Or,
                    scope: Some(ListScope {
                        path: game_path(path),
                        quantifier,
                    }),
                },
            );
            tree
        };

        assert!(!tree_for("Inventory", ListQuantifier::Any).evaluate(modules.as_ref()));
        assert!(tree_for("Inventory", ListQuantifier::All).evaluate(modules.as_ref()));
        assert!(tree_for("Inventory", ListQuantifier::None).evaluate(modules.as_ref()));
        assert!(!tree_for("Quests", ListQuantifier::All).evaluate(modules.as_ref()));
    }

    #[test]
    fn test_evaluate_object_targets_a_single_item() {
        let modules = game_registry();
        let mut tree = ConditionTree::default();
        let root = tree.root();
        tree.insert(
            root,
            ConditionPart::list_predicate("Name", ConditionOperator::Equal, "potion"),
        );

        let inventory = modules
            .resolve_list(&game_path("Inventory"))
            .expect("inventory resolves");
        assert!(tree.evaluate_object(modules.as_ref(), &inventory[0]));
        assert!(!tree.evaluate_object(modules.as_ref(), &inventory[1]));
        assert!(!tree.evaluate(modules.as_ref()), "no item, no verdict");

        // A data model predicate ignores the item.
        tree.insert(root, health_above(10));
        assert!(tree.evaluate_object(modules.as_ref(), &inventory[0]));
    }

    #[test]
    fn test_accepted_mutations_publish_one_change_each() {
        let mut tree = ConditionTree::default();
        let root = tree.root();
        let mut changes = tree.subscribe();

        let group = tree.insert(root, ConditionPart::group(BooleanOperator::Or)).expect("group");
        let leaf = tree.create(health_above(50));
        assert!(tree.add_child(group, leaf));
        assert!(!tree.add_child(group, leaf), "duplicate add is a no-op");
        assert!(tree.add_child(root, leaf));
        assert!(tree.remove_child(root, leaf));
        assert!(!tree.remove_child(root, leaf), "absent remove is a no-op");
        assert!(tree.replace_part(group, ConditionPart::group(BooleanOperator::And)));
        assert!(tree.replace_part(group, ConditionPart::group(BooleanOperator::And)));
        assert!(tree.delete(group));
        assert!(!tree.delete(group));

        let expected = [
            ConditionChange::Attached {
                parent: root,
                child: group,
                previous: None,
            },
            ConditionChange::Attached {
                parent: group,
                child: leaf,
                previous: None,
            },
            ConditionChange::Attached {
                parent: root,
                child: leaf,
                previous: Some(group),
            },
            ConditionChange::Detached { parent: root, child: leaf },
            ConditionChange::Replaced(group),
            ConditionChange::Deleted(group),
        ];
        for change in expected {
            assert_eq!(changes.try_recv().expect("change published"), change);
        }
        assert_eq!(changes.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_malformed_condition_json_is_a_definition_error() {
        assert!(matches!(
            ConditionDefinition::from_json("{ \"kind\": \"group\""),
            Err(DefinitionError::JsonParseError(_))
        ));

        let json = ConditionTree::default().to_definition().to_json().expect("serializes");
        let parsed = ConditionDefinition::from_json(&json).expect("parses");
        assert!(ConditionTree::from_definition(parsed).has_no_conditions());
    }
}
