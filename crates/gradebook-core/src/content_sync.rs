//! Content-sync container: a registry of parent entities whose owned
//! sub-items are flattened into one shared registry.
//!
//! The flow is one-directional. Members push their sub-items into the
//! shared registry on insert and whenever their own list gains an item;
//! nothing in the shared registry ever adds a member's sub-item back.
//! Sub-items of a member that leaves are handed to
//! [`ContentSyncHost::detach_sub_item`].
//!
//! Enrolling a sub-item can register its other parent, which has sub-items
//! of its own. Those members go through a [`FlattenQueue`] drained by the
//! first flatten of the cascade, so a connected graph is walked in a loop
//! and the stack stays flat however long the chain of links is.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use crate::error::{GradebookError, Result};
use crate::events::ChangeEvent;
use crate::guard::{GuardKey, Operation};
use crate::ids::{Collection, EntityId};
use crate::links::{CascadeContext, ChildId, Node, Origin, ParentId, Relation};
use crate::parent_ref::ListChange;

/// Ordered, duplicate-free registry of parent entities.
pub struct ContentSyncList<T: Node> {
    collection: Collection,
    items: Vec<T::Id>,
    present: HashSet<T::Id>,
}

impl<T: Node> ContentSyncList<T> {
    pub(crate) fn new(collection: Collection) -> Self {
        Self {
            collection,
            items: Vec::new(),
            present: HashSet::new(),
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &T::Id) -> bool {
        self.present.contains(item)
    }

    pub fn get(&self, index: usize) -> Option<T::Id> {
        self.items.get(index).copied()
    }

    pub fn position(&self, item: &T::Id) -> Option<usize> {
        self.items.iter().position(|candidate| candidate == item)
    }

    pub fn iter(&self) -> impl Iterator<Item = T::Id> + '_ {
        self.items.iter().copied()
    }

    pub(crate) fn store(&mut self, index: usize, item: T::Id) {
        self.items.insert(index, item);
        self.present.insert(item);
    }

    pub(crate) fn take(&mut self, index: usize) -> T::Id {
        let item = self.items.remove(index);
        self.present.remove(&item);
        item
    }

    pub(crate) fn replace(&mut self, index: usize, item: T::Id) -> T::Id {
        let old = std::mem::replace(&mut self.items[index], item);
        self.present.remove(&old);
        self.present.insert(item);
        old
    }
}

impl<T: Node> fmt::Debug for ContentSyncList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentSyncList")
            .field("collection", &self.collection)
            .field("items", &self.items)
            .finish()
    }
}

/// Members whose sub-items still have to be flattened.
#[derive(Debug, Default)]
pub(crate) struct FlattenQueue {
    draining: bool,
    members: VecDeque<EntityId>,
}

impl FlattenQueue {
    /// Queue `member`. Returns `true` when nothing is draining yet, in which
    /// case the caller has to drain.
    pub(crate) fn push(&mut self, member: EntityId) -> bool {
        self.members.push_back(member);
        !std::mem::replace(&mut self.draining, true)
    }

    pub(crate) fn pop(&mut self) -> Option<EntityId> {
        self.members.pop_front()
    }

    pub(crate) fn finish(&mut self) {
        self.draining = false;
        self.members.clear();
    }

    pub(crate) fn is_idle(&self) -> bool {
        !self.draining && self.members.is_empty()
    }
}

/// Owner of the members registry for one [`Relation`]'s parents.
pub(crate) trait ContentSyncHost<R: Relation>: CascadeContext {
    fn members(&self) -> &ContentSyncList<R::Parent>;

    fn members_mut(&mut self) -> &mut ContentSyncList<R::Parent>;

    fn member_entity(&self, member: ParentId<R>) -> Result<&R::Parent>;

    /// Put `sub_item` into the shared registry if it is not there yet.
    fn enrol_sub_item(&mut self, sub_item: ChildId<R>) -> Result<()>;

    /// Handle a sub-item whose owner has left the registry.
    fn detach_sub_item(&mut self, owner: ParentId<R>, sub_item: ChildId<R>) -> Result<()>;

    fn sub_items_of(&self, member: ParentId<R>) -> Result<Vec<ChildId<R>>> {
        Ok(R::children(self.member_entity(member)?).to_vec())
    }

    fn flatten(&mut self, member: ParentId<R>) -> Result<()> {
        for sub_item in self.sub_items_of(member)? {
            self.enrol_sub_item(sub_item)?;
        }
        Ok(())
    }

    fn detach_all(&mut self, member: ParentId<R>) -> Result<()> {
        for sub_item in self.sub_items_of(member)? {
            self.detach_sub_item(member, sub_item)?;
        }
        Ok(())
    }

    fn insert_member(&mut self, index: usize, member: ParentId<R>, origin: Origin) -> Result<()> {
        self.member_entity(member)?;
        let members = self.members();
        let collection = members.collection();
        if members.contains(&member) {
            return match origin {
                Origin::Direct => Err(GradebookError::Duplicate {
                    collection,
                    item: member.into(),
                }),
                Origin::Cascade => Ok(()),
            };
        }
        if index > members.len() {
            return Err(GradebookError::IndexOutOfRange {
                collection,
                index,
                len: members.len(),
            });
        }

        let guard = self
            .guards()
            .enter(GuardKey::collection(collection, Operation::Insert, member));
        if guard.is_recursive() {
            return Ok(());
        }

        if origin == Origin::Cascade {
            tracing::debug!(%member, %collection, "registering referenced parent");
        }
        self.members_mut().store(index, member);
        self.record(ChangeEvent::Added {
            collection,
            index,
            item: member.into(),
        });
        self.schedule_flatten(member.into())?;
        drop(guard);
        Ok(())
    }

    fn replace_member(&mut self, index: usize, member: ParentId<R>) -> Result<()> {
        self.member_entity(member)?;
        let members = self.members();
        let collection = members.collection();
        let Some(old) = members.get(index) else {
            return Err(GradebookError::IndexOutOfRange {
                collection,
                index,
                len: members.len(),
            });
        };
        if old == member {
            return Ok(());
        }
        if members.contains(&member) {
            return Err(GradebookError::Duplicate {
                collection,
                item: member.into(),
            });
        }

        let guard = self
            .guards()
            .enter(GuardKey::collection(collection, Operation::Replace, old));
        if guard.is_recursive() {
            return Ok(());
        }

        self.members_mut().replace(index, member);
        self.record(ChangeEvent::Replaced {
            collection,
            index,
            old: old.into(),
            new: member.into(),
        });
        {
            let _removing = self
                .guards()
                .enter(GuardKey::collection(collection, Operation::Remove, old));
            self.detach_all(old)?;
        }
        self.schedule_flatten(member.into())?;
        drop(guard);
        Ok(())
    }

    fn remove_member_at(&mut self, index: usize) -> Result<()> {
        let members = self.members();
        let collection = members.collection();
        let Some(member) = members.get(index) else {
            return Err(GradebookError::IndexOutOfRange {
                collection,
                index,
                len: members.len(),
            });
        };

        let guard = self
            .guards()
            .enter(GuardKey::collection(collection, Operation::Remove, member));
        if guard.is_recursive() {
            return Ok(());
        }

        let members = self.members_mut();
        let Some(position) = members.position(&member) else {
            return Ok(());
        };
        members.take(position);
        self.record(ChangeEvent::Removed {
            collection,
            index: position,
            item: member.into(),
        });
        self.detach_all(member)?;
        drop(guard);
        Ok(())
    }

    /// Remove `member` if present. Returns whether anything was removed.
    fn remove_member(&mut self, member: ParentId<R>) -> Result<bool> {
        match self.members().position(&member) {
            Some(index) => self.remove_member_at(index).map(|()| true),
            None => Ok(false),
        }
    }

    fn clear_members(&mut self) -> Result<()> {
        let len = self.members().len();
        for _ in 0..len {
            let Some(last) = self.members().len().checked_sub(1) else {
                break;
            };
            self.remove_member_at(last)?;
        }
        let collection = self.members().collection();
        self.record(ChangeEvent::Reset { collection });
        Ok(())
    }

    /// Forward a settled change of `owner`'s own list. Only members are
    /// tracked, and only new sub-items need forwarding.
    fn sub_items_changed(&mut self, owner: ParentId<R>, change: ListChange<ChildId<R>>) -> Result<()> {
        if !self.members().contains(&owner) {
            return Ok(());
        }
        match change {
            ListChange::Added(sub_item) | ListChange::Replaced { new: sub_item, .. } => {
                self.enrol_sub_item(sub_item)
            }
            ListChange::Removed(_) => Ok(()),
        }
    }
}
