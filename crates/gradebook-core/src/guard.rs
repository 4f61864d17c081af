//! Scoped reentrancy guards for cascading operations.
//!
//! A cascade started by one mutation can loop back into the same operation
//! on the same item (assigning `evaluation.category` inserts into the
//! category's list, whose insert assigns `evaluation.category` again).
//! Every cascading operation enters a guard for its [`GuardKey`] first; a
//! nested entry for a key that is already held reports
//! [`CascadeGuard::is_recursive`] and the handler returns immediately, so
//! only the outermost call does the work.
//!
//! The table belongs to one gradebook. Handles release their entry on drop,
//! which covers early returns through `?` as well as unwinding.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::ids::{Collection, EntityId, ParentKind};

/// Where a guarded operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardScope {
    /// A container operation.
    Collection(Collection),
    /// A back-reference setter on one entity.
    Entity(EntityId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Insert,
    Replace,
    Remove,
    Assign(ParentKind),
}

/// Identifies one guarded operation on one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuardKey {
    pub scope: GuardScope,
    pub operation: Operation,
    pub item: EntityId,
}

impl GuardKey {
    pub fn new(scope: GuardScope, operation: Operation, item: impl Into<EntityId>) -> Self {
        Self {
            scope,
            operation,
            item: item.into(),
        }
    }

    pub fn collection(collection: Collection, operation: Operation, item: impl Into<EntityId>) -> Self {
        Self::new(GuardScope::Collection(collection), operation, item)
    }

    /// Key for the back-reference setter of `item`.
    pub fn assign(item: impl Into<EntityId>, kind: ParentKind) -> Self {
        let item = item.into();
        Self::new(GuardScope::Entity(item), Operation::Assign(kind), item)
    }
}

#[derive(Debug, Default)]
struct TableState {
    depths: HashMap<GuardKey, u32>,
    held: usize,
}

/// Depth counters for every guard currently held in one gradebook.
#[derive(Debug, Clone)]
pub struct GuardTable {
    state: Arc<Mutex<TableState>>,
    max_depth: u32,
}

impl GuardTable {
    /// Create a table that treats more than `max_depth` nested entries of
    /// one key as a runaway cascade.
    pub fn new(max_depth: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(TableState::default())),
            max_depth: u32::try_from(max_depth).unwrap_or(u32::MAX).max(1),
        }
    }

    /// Acquire a guard for `key`.
    ///
    /// # Panics
    ///
    /// Panics when `key` is already held `max_depth` times. That only
    /// happens if the wiring fails to terminate a cascade, and continuing
    /// would leave the graph half-updated. The table is left untouched.
    pub fn enter(&self, key: GuardKey) -> CascadeGuard {
        let mut state = lock(&self.state);
        let previous = state.depths.get(&key).copied().unwrap_or(0);
        if previous >= self.max_depth {
            drop(state);
            panic!(
                "cascade did not terminate: {} nested entries (limit {}) at {key:?}",
                previous + 1,
                self.max_depth
            );
        }
        state.depths.insert(key, previous + 1);
        state.held += 1;
        drop(state);

        if previous > 0 {
            tracing::trace!(?key, depth = previous, "suppressing re-entrant operation");
        }

        CascadeGuard {
            state: Arc::clone(&self.state),
            key,
            recursive: previous > 0,
        }
    }

    /// Current depth for `key` (0 when not held).
    pub fn depth(&self, key: &GuardKey) -> u32 {
        lock(&self.state).depths.get(key).copied().unwrap_or(0)
    }

    /// `true` when no guard is held, i.e. no cascade is in flight.
    pub fn is_quiescent(&self) -> bool {
        lock(&self.state).held == 0
    }
}

impl Default for GuardTable {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_CASCADE_DEPTH)
    }
}

/// A held entry in a [`GuardTable`]; released on drop.
#[derive(Debug)]
#[must_use = "the guard is released as soon as it is dropped"]
pub struct CascadeGuard {
    state: Arc<Mutex<TableState>>,
    key: GuardKey,
    recursive: bool,
}

impl CascadeGuard {
    /// Whether the same key was already held when this guard was taken.
    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub fn key(&self) -> GuardKey {
        self.key
    }
}

impl Drop for CascadeGuard {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        let Some(depth) = state.depths.get_mut(&self.key) else {
            panic!("reentrancy depth underflow at {:?}", self.key);
        };
        *depth -= 1;
        if *depth == 0 {
            state.depths.remove(&self.key);
        }
        state.held -= 1;
    }
}

// An underflow panic inside `drop` poisons the lock. The remaining counters
// are still meaningful, so other guards keep releasing while unwinding.
fn lock(state: &Mutex<TableState>) -> MutexGuard<'_, TableState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
