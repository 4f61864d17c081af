//! Change notifications.
//!
//! Every settled mutation appends a [`ChangeEvent`] to the gradebook's
//! journal. UI and persistence layers drain it with
//! [`Gradebook::take_events`](crate::Gradebook::take_events).

use serde::{Deserialize, Serialize};

use crate::ids::{Collection, EntityId, EvaluationId, ParentKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChangeEvent {
    Added {
        collection: Collection,
        index: usize,
        item: EntityId,
    },
    Removed {
        collection: Collection,
        index: usize,
        item: EntityId,
    },
    Replaced {
        collection: Collection,
        index: usize,
        old: EntityId,
        new: EntityId,
    },
    /// The collection was cleared.
    Reset { collection: Collection },
    /// A back-reference settled on a new value. Emitted once per setter
    /// call, after its cascade has finished.
    ParentChanged {
        evaluation: EvaluationId,
        kind: ParentKind,
        parent: Option<EntityId>,
    },
    /// A plain field (name, points, reason, bounds) changed.
    Updated { item: EntityId },
}

impl ChangeEvent {
    /// The collection this event concerns, if it is a collection event.
    pub fn collection(&self) -> Option<Collection> {
        match self {
            ChangeEvent::Added { collection, .. }
            | ChangeEvent::Removed { collection, .. }
            | ChangeEvent::Replaced { collection, .. }
            | ChangeEvent::Reset { collection } => Some(*collection),
            ChangeEvent::ParentChanged { .. } | ChangeEvent::Updated { .. } => None,
        }
    }
}
