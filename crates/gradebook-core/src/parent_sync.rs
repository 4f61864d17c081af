//! Parent-sync container: a registry of items that each carry several
//! independent back-references (an evaluation's student and category).
//!
//! Inserting an item registers every parent it points at; removing it
//! clears all of its back-references. When a back-reference of an item
//! changes, [`ParentSyncHost::parent_reference_changed`] registers the new
//! parent, or drops the item once it has no parent left, unless the caller
//! added it directly.

use std::collections::HashSet;
use std::fmt;

use crate::error::{GradebookError, Result};
use crate::events::ChangeEvent;
use crate::guard::{GuardKey, Operation};
use crate::ids::{CategoryId, Collection, ParentKind, StudentId};
use crate::links::{CascadeContext, Node, Origin};

/// Ordered, duplicate-free registry of items with several parents.
pub struct ParentSyncList<T: Node> {
    collection: Collection,
    items: Vec<T::Id>,
    present: HashSet<T::Id>,
    direct: HashSet<T::Id>,
}

impl<T: Node> ParentSyncList<T> {
    pub(crate) fn new(collection: Collection) -> Self {
        Self {
            collection,
            items: Vec::new(),
            present: HashSet::new(),
            direct: HashSet::new(),
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

    /// Whether the item was added by the caller rather than by a cascade.
    /// Directly added items survive losing all of their parents.
    pub fn is_direct(&self, item: &T::Id) -> bool {
        self.direct.contains(item)
    }

    pub(crate) fn store(&mut self, index: usize, item: T::Id, direct: bool) {
        self.items.insert(index, item);
        self.present.insert(item);
        if direct {
            self.direct.insert(item);
        }
    }

    pub(crate) fn take(&mut self, index: usize) -> T::Id {
        let item = self.items.remove(index);
        self.present.remove(&item);
        self.direct.remove(&item);
        item
    }

    pub(crate) fn replace(&mut self, index: usize, item: T::Id, direct: bool) -> T::Id {
        let old = std::mem::replace(&mut self.items[index], item);
        self.present.remove(&old);
        self.present.insert(item);
        self.direct.remove(&old);
        if direct {
            self.direct.insert(item);
        }
        old
    }

    pub(crate) fn mark_direct(&mut self, item: T::Id) {
        if self.contains(&item) {
            self.direct.insert(item);
        }
    }
}

impl<T: Node> fmt::Debug for ParentSyncList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentSyncList")
            .field("collection", &self.collection)
            .field("items", &self.items)
            .field("direct", &self.direct)
            .finish()
    }
}

/// A parent an item currently points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParentRef {
    Student(StudentId),
    Category(CategoryId),
}

/// Owner of a [`ParentSyncList`] and of the registries its parents live in.
pub(crate) trait ParentSyncHost<T: Node>: CascadeContext {
    fn registry(&self) -> &ParentSyncList<T>;

    fn registry_mut(&mut self) -> &mut ParentSyncList<T>;

    fn item_entity(&self, item: T::Id) -> Result<&T>;

    fn parent_ref(&self, item: T::Id, kind: ParentKind) -> Result<Option<ParentRef>>;

    /// Make sure every parent `item` points at is registered.
    fn add_parent_links(&mut self, item: T::Id) -> Result<()>;

    /// Clear every back-reference of `item`.
    fn remove_parent_links(&mut self, item: T::Id) -> Result<()>;

    /// Register `parent` in its registry if it is not there yet.
    fn register_parent(&mut self, parent: ParentRef) -> Result<()>;

    fn has_parent(&self, item: T::Id) -> Result<bool> {
        for kind in ParentKind::ALL {
            if self.parent_ref(item, kind)?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn insert_item(&mut self, index: usize, item: T::Id, origin: Origin) -> Result<()> {
        self.item_entity(item)?;
        let registry = self.registry();
        let collection = registry.collection();
        if registry.contains(&item) {
            return match origin {
                Origin::Direct => Err(GradebookError::Duplicate {
                    collection,
                    item: item.into(),
                }),
                Origin::Cascade => Ok(()),
            };
        }
        if index > registry.len() {
            return Err(GradebookError::IndexOutOfRange {
                collection,
                index,
                len: registry.len(),
            });
        }

        let guard = self
            .guards()
            .enter(GuardKey::collection(collection, Operation::Insert, item));
        if guard.is_recursive() {
            return Ok(());
        }

        self.registry_mut()
            .store(index, item, origin == Origin::Direct);
        self.record(ChangeEvent::Added {
            collection,
            index,
            item: item.into(),
        });
        self.add_parent_links(item)?;
        drop(guard);
        Ok(())
    }

    fn replace_item(&mut self, index: usize, item: T::Id) -> Result<()> {
        self.item_entity(item)?;
        let registry = self.registry();
        let collection = registry.collection();
        let Some(old) = registry.get(index) else {
            return Err(GradebookError::IndexOutOfRange {
                collection,
                index,
                len: registry.len(),
            });
        };
        if old == item {
            return Ok(());
        }
        if registry.contains(&item) {
            return Err(GradebookError::Duplicate {
                collection,
                item: item.into(),
            });
        }

        let guard = self
            .guards()
            .enter(GuardKey::collection(collection, Operation::Replace, old));
        if guard.is_recursive() {
            return Ok(());
        }

        self.registry_mut().replace(index, item, true);
        self.record(ChangeEvent::Replaced {
            collection,
            index,
            old: old.into(),
            new: item.into(),
        });
        {
            let _removing = self
                .guards()
                .enter(GuardKey::collection(collection, Operation::Remove, old));
            self.remove_parent_links(old)?;
        }
        self.add_parent_links(item)?;
        drop(guard);
        Ok(())
    }

    fn remove_item_at(&mut self, index: usize) -> Result<()> {
        let registry = self.registry();
        let collection = registry.collection();
        let Some(item) = registry.get(index) else {
            return Err(GradebookError::IndexOutOfRange {
                collection,
                index,
                len: registry.len(),
            });
        };

        let guard = self
            .guards()
            .enter(GuardKey::collection(collection, Operation::Remove, item));
        if guard.is_recursive() {
            return Ok(());
        }

        let registry = self.registry_mut();
        let Some(position) = registry.position(&item) else {
            return Ok(());
        };
        registry.take(position);
        self.record(ChangeEvent::Removed {
            collection,
            index: position,
            item: item.into(),
        });
        self.remove_parent_links(item)?;
        drop(guard);
        Ok(())
    }

    /// Remove `item` if present. Returns whether anything was removed.
    fn remove_item(&mut self, item: T::Id) -> Result<bool> {
        match self.registry().position(&item) {
            Some(index) => self.remove_item_at(index).map(|()| true),
            None => Ok(false),
        }
    }

    fn clear_items(&mut self) -> Result<()> {
        let len = self.registry().len();
        for _ in 0..len {
            let Some(last) = self.registry().len().checked_sub(1) else {
                break;
            };
            self.remove_item_at(last)?;
        }
        let collection = self.registry().collection();
        self.record(ChangeEvent::Reset { collection });
        Ok(())
    }

    /// React to `item`'s `kind` back-reference having been changed.
    ///
    /// An item outside the registry that gained a parent is enrolled by
    /// cascade. A registered item that lost its last parent is dropped,
    /// unless it was added directly.
    fn parent_reference_changed(&mut self, item: T::Id, kind: ParentKind) -> Result<()> {
        let linked = self.parent_ref(item, kind)?;

        if !self.registry().contains(&item) {
            if linked.is_none() {
                return Ok(());
            }
            tracing::debug!(%item, %kind, "enrolling item that gained a parent");
            let at = self.registry().len();
            return self.insert_item(at, item, Origin::Cascade);
        }

        match linked {
            Some(parent) => self.register_parent(parent),
            None => {
                if self.has_parent(item)? || self.registry().is_direct(&item) {
                    return Ok(());
                }
                tracing::debug!(%item, "collecting orphaned item");
                self.remove_item(item).map(|_| ())
            }
        }
    }
}
