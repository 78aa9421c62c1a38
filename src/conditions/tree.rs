use super::{BooleanOperator, ConditionPart, PartId};
use crate::datamodel::{DataModelEntry, DataModelResolver};
use crate::script::DEFAULT_CHANGE_CAPACITY;
use ahash::AHashMap;
use std::fmt;
use tokio::sync::broadcast;
use tracing::trace;

/// A mutation of a condition tree. Exactly one is published per accepted mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionChange {
    /// `child` now belongs to `parent`. `previous` is the parent it was moved away from.
    Attached {
        parent: PartId,
        child: PartId,
        previous: Option<PartId>,
    },
    Detached { parent: PartId, child: PartId },
    /// The part was reconfigured in place.
    Replaced(PartId),
    /// The part and its subtree were disposed.
    Deleted(PartId),
}

#[derive(Debug, Clone)]
struct Slot {
    part: ConditionPart,
    parent: Option<PartId>,
    children: Vec<PartId>,
}

/// A display condition: an arena of parts below a root group.
///
/// Parts are owned by the tree and refer to their parent by id. Parts created with
/// [`ConditionTree::create`] or detached with [`ConditionTree::remove_child`] stay in the
/// arena, outside the evaluated tree, until they are attached again or deleted.
///
/// Changes are published to receivers from [`ConditionTree::subscribe`]. Creating a detached
/// part publishes nothing.
pub struct ConditionTree {
    root: PartId,
    slots: AHashMap<PartId, Slot>,
    next: u64,
    changes: broadcast::Sender<ConditionChange>,
}

impl Clone for ConditionTree {
    /// The clone starts without subscribers.
    fn clone(&self) -> Self {
        let (changes, _) = broadcast::channel(DEFAULT_CHANGE_CAPACITY);
        Self {
            root: self.root,
            slots: self.slots.clone(),
            next: self.next,
            changes,
        }
    }
}

impl fmt::Debug for ConditionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionTree")
            .field("root", &self.root)
            .field("slots", &self.slots)
            .finish()
    }
}

impl Default for ConditionTree {
    fn default() -> Self {
        Self::new(BooleanOperator::And)
    }
}

impl ConditionTree {
    pub fn new(operator: BooleanOperator) -> Self {
        let root = PartId(0);
        let mut slots = AHashMap::new();
        slots.insert(
            root,
            Slot {
                part: ConditionPart::group(operator),
                parent: None,
                children: Vec::new(),
            },
        );
        let (changes, _) = broadcast::channel(DEFAULT_CHANGE_CAPACITY);
        Self {
            root,
            slots,
            next: 1,
            changes,
        }
    }

    pub fn root(&self) -> PartId {
        self.root
    }

    /// Subscribes to changes made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ConditionChange> {
        self.changes.subscribe()
    }

    fn publish(&self, change: ConditionChange) {
        trace!(?change, "condition change");
        // No subscribers is fine.
        let _ = self.changes.send(change);
    }

    /// Adds a detached part to the arena.
    pub fn create(&mut self, part: ConditionPart) -> PartId {
        let id = PartId(self.next);
        self.next += 1;
        self.slots.insert(
            id,
            Slot {
                part,
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    /// Creates a part and attaches it to `parent`. `None` if `parent` is not a group.
    pub fn insert(&mut self, parent: PartId, part: ConditionPart) -> Option<PartId> {
        if !self.part(parent).is_some_and(ConditionPart::is_group) {
            return None;
        }
        let id = self.create(part);
        self.add_child(parent, id);
        Some(id)
    }

    /// Attaches `child` to the group `parent`, moving it away from a previous parent.
    ///
    /// Returns `false` without changes if `child` already belongs to `parent`, if `parent`
    /// is not a group, or if the move would make a part its own ancestor.
    pub fn add_child(&mut self, parent: PartId, child: PartId) -> bool {
        if child == self.root || !self.slots.contains_key(&child) {
            return false;
        }
        if !self.part(parent).is_some_and(ConditionPart::is_group) {
            return false;
        }
        if self.slots[&child].parent == Some(parent) || self.is_ancestor(child, parent) {
            return false;
        }

        let previous = self.slots[&child].parent;
        if let Some(previous) = previous {
            if let Some(slot) = self.slots.get_mut(&previous) {
                slot.children.retain(|c| *c != child);
            }
        }
        if let Some(slot) = self.slots.get_mut(&parent) {
            slot.children.push(child);
        }
        if let Some(slot) = self.slots.get_mut(&child) {
            slot.parent = Some(parent);
        }
        self.publish(ConditionChange::Attached {
            parent,
            child,
            previous,
        });
        true
    }

    /// Detaches `child` from `parent`. `false` if it was not a child of `parent`.
    pub fn remove_child(&mut self, parent: PartId, child: PartId) -> bool {
        if !self.detach(parent, child) {
            return false;
        }
        self.publish(ConditionChange::Detached { parent, child });
        true
    }

    fn detach(&mut self, parent: PartId, child: PartId) -> bool {
        let Some(slot) = self.slots.get_mut(&parent) else {
            return false;
        };
        let before = slot.children.len();
        slot.children.retain(|c| *c != child);
        if slot.children.len() == before {
            return false;
        }
        if let Some(slot) = self.slots.get_mut(&child) {
            slot.parent = None;
        }
        true
    }

    /// Disposes a part and its whole subtree. The root cannot be deleted.
    pub fn delete(&mut self, id: PartId) -> bool {
        if id == self.root {
            return false;
        }
        let Some(parent) = self.slots.get(&id).map(|s| s.parent) else {
            return false;
        };
        if let Some(parent) = parent {
            self.detach(parent, id);
        }
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(slot) = self.slots.remove(&next) {
                pending.extend(slot.children);
            }
        }
        self.publish(ConditionChange::Deleted(id));
        true
    }

    pub fn contains(&self, id: PartId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Number of parts in the arena, attached or not, root included.
    pub fn part_count(&self) -> usize {
        self.slots.len()
    }

    /// Whether the root group has no children.
    pub fn has_no_conditions(&self) -> bool {
        self.children(self.root).is_empty()
    }

    pub fn part(&self, id: PartId) -> Option<&ConditionPart> {
        self.slots.get(&id).map(|s| &s.part)
    }

    /// Reconfigures a part in place. The root must stay a group, and a group with
    /// children cannot become a leaf. Replacing a part with an equal one publishes nothing.
    pub fn replace_part(&mut self, id: PartId, part: ConditionPart) -> bool {
        if id == self.root && !part.is_group() {
            return false;
        }
        match self.slots.get_mut(&id) {
            Some(slot) if slot.part == part => return true,
            Some(slot) if part.is_group() || slot.children.is_empty() => {
                slot.part = part;
            }
            _ => return false,
        }
        self.publish(ConditionChange::Replaced(id));
        true
    }

    pub fn parent(&self, id: PartId) -> Option<PartId> {
        self.slots.get(&id)?.parent
    }

    pub fn children(&self, id: PartId) -> &[PartId] {
        self.slots.get(&id).map(|s| s.children.as_slice()).unwrap_or_default()
    }

    fn is_ancestor(&self, candidate: PartId, of: PartId) -> bool {
        let mut current = Some(of);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Evaluates the whole tree against the data model.
    pub fn evaluate(&self, resolver: &dyn DataModelResolver) -> bool {
        self.evaluate_part(self.root, resolver, None)
    }

    /// Evaluates the whole tree against a single list item.
    pub fn evaluate_object(&self, resolver: &dyn DataModelResolver, item: &DataModelEntry) -> bool {
        self.evaluate_part(self.root, resolver, Some(item))
    }

    /// Evaluates one part. `item` is the list element list predicates compare against.
    ///
    /// Unresolvable properties and unknown parts evaluate to `false`.
    pub fn evaluate_part(
        &self,
        id: PartId,
        resolver: &dyn DataModelResolver,
        item: Option<&DataModelEntry>,
    ) -> bool {
        let Some(slot) = self.slots.get(&id) else {
            return false;
        };
        match &slot.part {
            ConditionPart::Group {
                operator,
                scope: None,
            } => operator.combine(
                slot.children
                    .iter()
                    .map(|c| self.evaluate_part(*c, resolver, item)),
            ),
            ConditionPart::Group {
                operator,
                scope: Some(scope),
            } => {
                let Some(items) = resolver.resolve_list(&scope.path) else {
                    return false;
                };
                scope.quantifier.apply(items.iter().map(|item| {
                    operator.combine(
                        slot.children
                            .iter()
                            .map(|c| self.evaluate_part(*c, resolver, Some(item))),
                    )
                }))
            }
            ConditionPart::Predicate {
                left,
                operator,
                right,
            } => {
                let Some(cell) = resolver.resolve(left) else {
                    return false;
                };
                let right = right.as_ref().and_then(|r| r.resolve(resolver));
                operator.apply(cell.value(), right.as_ref())
            }
            ConditionPart::ListPredicate {
                item_path,
                operator,
                right,
            } => {
                let Some(cell) = item
                    .and_then(|item| item.walk_path(item_path))
                    .and_then(DataModelEntry::as_property)
                else {
                    return false;
                };
                let right = right.as_ref().and_then(|r| r.resolve(resolver));
                operator.apply(cell.value(), right.as_ref())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::ConditionOperator;
    use crate::datamodel::DataModelPath;

    fn leaf() -> ConditionPart {
        ConditionPart::predicate(DataModelPath::new("m", "X"), ConditionOperator::Equal, 1)
    }

    #[test]
    fn moving_a_part_detaches_it_from_its_old_parent() {
        let mut tree = ConditionTree::default();
        let a = tree.insert(tree.root(), ConditionPart::group(BooleanOperator::Or)).unwrap();
        let b = tree.insert(tree.root(), ConditionPart::group(BooleanOperator::Or)).unwrap();
        let x = tree.insert(a, leaf()).unwrap();

        assert!(tree.add_child(b, x));
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.children(b), &[x]);
        assert_eq!(tree.parent(x), Some(b));
    }

    #[test]
    fn cycles_and_leaf_parents_are_rejected() {
        let mut tree = ConditionTree::default();
        let a = tree.insert(tree.root(), ConditionPart::group(BooleanOperator::And)).unwrap();
        let b = tree.insert(a, ConditionPart::group(BooleanOperator::And)).unwrap();
        let x = tree.insert(b, leaf()).unwrap();

        assert!(!tree.add_child(b, a));
        assert!(!tree.add_child(x, a));
        assert!(!tree.add_child(a, tree.root()));
        assert!(tree.insert(x, leaf()).is_none());
    }

    #[test]
    fn delete_disposes_the_subtree() {
        let mut tree = ConditionTree::default();
        let a = tree.insert(tree.root(), ConditionPart::group(BooleanOperator::And)).unwrap();
        let x = tree.insert(a, leaf()).unwrap();

        assert!(tree.delete(a));
        assert!(!tree.contains(a));
        assert!(!tree.contains(x));
        assert!(tree.has_no_conditions());
        assert_eq!(tree.part_count(), 1);
        assert!(!tree.delete(tree.root()));
    }
}
