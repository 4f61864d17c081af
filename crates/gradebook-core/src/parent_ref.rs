//! Parent-reference container: an owned, ordered list of children whose
//! single back-reference must point at the list's owner.
//!
//! The list itself only stores ids. Mutations go through
//! [`ParentRefHost`], whose default methods keep each child's back-reference
//! and its membership in this list in step:
//!
//! - insert: set the child's back-reference to the owner, then store it;
//! - replace: clear the old child's back-reference, swap, set the new one's;
//! - remove: clear the back-reference, then drop the id.
//!
//! Setting a back-reference re-enters these operations for the same child;
//! the guard table turns that nested call into a no-op.

use std::fmt;

use crate::error::{GradebookError, Result};
use crate::events::ChangeEvent;
use crate::guard::{GuardKey, Operation};
use crate::links::{CascadeContext, ChildId, Node, ParentId, Relation};

/// Ordered children of one owner.
pub struct ParentRefList<C: Node, P: Node> {
    owner: P::Id,
    items: Vec<C::Id>,
}

impl<C: Node, P: Node> ParentRefList<C, P> {
    pub(crate) fn new(owner: P::Id) -> Self {
        Self {
            owner,
            items: Vec::new(),
        }
    }

    pub fn owner(&self) -> P::Id {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &C::Id) -> bool {
        self.items.contains(item)
    }

    pub fn get(&self, index: usize) -> Option<C::Id> {
        self.items.get(index).copied()
    }

    pub fn position(&self, item: &C::Id) -> Option<usize> {
        self.items.iter().position(|candidate| candidate == item)
    }

    pub fn iter(&self) -> impl Iterator<Item = C::Id> + '_ {
        self.items.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<C::Id> {
        self.items.clone()
    }

    pub(crate) fn push(&mut self, item: C::Id) {
        self.items.push(item);
    }

    pub(crate) fn store(&mut self, index: usize, item: C::Id) {
        self.items.insert(index, item);
    }

    pub(crate) fn take(&mut self, index: usize) -> C::Id {
        self.items.remove(index)
    }

    pub(crate) fn replace(&mut self, index: usize, item: C::Id) -> C::Id {
        std::mem::replace(&mut self.items[index], item)
    }
}

impl<C: Node, P: Node> Clone for ParentRefList<C, P> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner,
            items: self.items.clone(),
        }
    }
}

impl<C: Node, P: Node> fmt::Debug for ParentRefList<C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentRefList")
            .field("owner", &self.owner)
            .field("items", &self.items)
            .finish()
    }
}

/// What a settled list operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListChange<Id> {
    Added(Id),
    Removed(Id),
    Replaced { old: Id, new: Id },
}

/// Owner of the entities one [`Relation`] connects.
pub(crate) trait ParentRefHost<R: Relation>: CascadeContext {
    fn parent_entity(&self, owner: ParentId<R>) -> Result<&R::Parent>;

    fn parent_entity_mut(&mut self, owner: ParentId<R>) -> Result<&mut R::Parent>;

    fn child_entity(&self, child: ChildId<R>) -> Result<&R::Child>;

    /// Cascading write of the child's back-reference.
    fn assign_parent(&mut self, child: ChildId<R>, parent: Option<ParentId<R>>) -> Result<()>;

    /// Called once a list operation has settled.
    fn children_changed(
        &mut self,
        owner: ParentId<R>,
        change: ListChange<ChildId<R>>,
    ) -> Result<()>;

    fn children_of(&self, owner: ParentId<R>) -> Result<&ParentRefList<R::Child, R::Parent>> {
        Ok(R::children(self.parent_entity(owner)?))
    }

    fn insert_child(&mut self, owner: ParentId<R>, index: usize, child: ChildId<R>) -> Result<()> {
        self.child_entity(child)?;
        let collection = R::list(owner);
        let list = self.children_of(owner)?;
        if list.contains(&child) {
            return Err(GradebookError::Duplicate {
                collection,
                item: child.into(),
            });
        }
        if index > list.len() {
            return Err(GradebookError::IndexOutOfRange {
                collection,
                index,
                len: list.len(),
            });
        }

        let guard = self
            .guards()
            .enter(GuardKey::collection(collection, Operation::Insert, child));
        if guard.is_recursive() {
            return Ok(());
        }

        self.assign_parent(child, Some(owner))?;

        let list = R::children_mut(self.parent_entity_mut(owner)?);
        if list.contains(&child) {
            return Ok(());
        }
        let index = index.min(list.len());
        list.store(index, child);
        drop(guard);

        self.record(ChangeEvent::Added {
            collection,
            index,
            item: child.into(),
        });
        self.children_changed(owner, ListChange::Added(child))
    }

    fn replace_child(&mut self, owner: ParentId<R>, index: usize, child: ChildId<R>) -> Result<()> {
        self.child_entity(child)?;
        let collection = R::list(owner);
        let list = self.children_of(owner)?;
        let Some(old) = list.get(index) else {
            return Err(GradebookError::IndexOutOfRange {
                collection,
                index,
                len: list.len(),
            });
        };
        if old == child {
            return Ok(());
        }
        if list.contains(&child) {
            return Err(GradebookError::Duplicate {
                collection,
                item: child.into(),
            });
        }

        let guard = self
            .guards()
            .enter(GuardKey::collection(collection, Operation::Replace, old));
        if guard.is_recursive() {
            return Ok(());
        }

        {
            let _removing = self
                .guards()
                .enter(GuardKey::collection(collection, Operation::Remove, old));
            self.assign_parent(old, None)?;
        }

        // The new child must be listed before its back-reference is set:
        // registering the owner flattens this list.
        let list = R::children_mut(self.parent_entity_mut(owner)?);
        let index = match list.position(&old) {
            Some(position) => {
                list.replace(position, child);
                position
            }
            None => {
                let at = index.min(list.len());
                list.store(at, child);
                at
            }
        };
        {
            let _inserting = self
                .guards()
                .enter(GuardKey::collection(collection, Operation::Insert, child));
            self.assign_parent(child, Some(owner))?;
        }
        drop(guard);

        self.record(ChangeEvent::Replaced {
            collection,
            index,
            old: old.into(),
            new: child.into(),
        });
        self.children_changed(owner, ListChange::Replaced { old, new: child })
    }

    fn remove_child_at(&mut self, owner: ParentId<R>, index: usize) -> Result<()> {
        let collection = R::list(owner);
        let list = self.children_of(owner)?;
        let Some(child) = list.get(index) else {
            return Err(GradebookError::IndexOutOfRange {
                collection,
                index,
                len: list.len(),
            });
        };

        let guard = self
            .guards()
            .enter(GuardKey::collection(collection, Operation::Remove, child));
        if guard.is_recursive() {
            return Ok(());
        }

        self.assign_parent(child, None)?;

        let list = R::children_mut(self.parent_entity_mut(owner)?);
        let Some(position) = list.position(&child) else {
            return Ok(());
        };
        list.take(position);
        drop(guard);

        self.record(ChangeEvent::Removed {
            collection,
            index: position,
            item: child.into(),
        });
        self.children_changed(owner, ListChange::Removed(child))
    }

    /// Remove children one at a time from the end, so each removal cascades.
    fn clear_children(&mut self, owner: ParentId<R>) -> Result<()> {
        let len = self.children_of(owner)?.len();
        for _ in 0..len {
            let Some(last) = self.children_of(owner)?.len().checked_sub(1) else {
                break;
            };
            self.remove_child_at(owner, last)?;
        }
        self.record(ChangeEvent::Reset {
            collection: R::list(owner),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{EvaluationId, StudentId};
    use crate::model::{Evaluation, Student};

    #[test]
    fn list_reads() {
        let owner = StudentId::new();
        let mut list: ParentRefList<Evaluation, Student> = ParentRefList::new(owner);
        let a = EvaluationId::new();
        let b = EvaluationId::new();

        list.push(a);
        list.store(0, b);
        assert_eq!(list.owner(), owner);
        assert_eq!(list.to_vec(), vec![b, a]);
        assert_eq!(list.position(&a), Some(1));
        assert_eq!(list.get(2), None);

        let c = EvaluationId::new();
        assert_eq!(list.replace(1, c), a);
        assert!(!list.contains(&a));
        assert_eq!(list.take(0), b);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![c]);
    }
}
