//! Typed identities for students, categories and evaluations.
//!
//! Identity is assigned when a value is constructed, so two values are the
//! same entity exactly when their ids match.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Allocate a fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identity of a [`Student`](crate::model::Student).
    StudentId
);
entity_id!(
    /// Identity of a [`Category`](crate::model::Category).
    CategoryId
);
entity_id!(
    /// Identity of an [`Evaluation`](crate::model::Evaluation).
    EvaluationId
);

/// Any entity id, tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EntityId {
    Student(StudentId),
    Category(CategoryId),
    Evaluation(EvaluationId),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Student(id) => write!(f, "student {id}"),
            EntityId::Category(id) => write!(f, "category {id}"),
            EntityId::Evaluation(id) => write!(f, "evaluation {id}"),
        }
    }
}

impl From<StudentId> for EntityId {
    fn from(id: StudentId) -> Self {
        EntityId::Student(id)
    }
}

impl From<CategoryId> for EntityId {
    fn from(id: CategoryId) -> Self {
        EntityId::Category(id)
    }
}

impl From<EvaluationId> for EntityId {
    fn from(id: EvaluationId) -> Self {
        EntityId::Evaluation(id)
    }
}

/// Which back-reference of an evaluation is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentKind {
    Student,
    Category,
}

impl ParentKind {
    pub const ALL: [ParentKind; 2] = [ParentKind::Category, ParentKind::Student];
}

impl fmt::Display for ParentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentKind::Student => write!(f, "student"),
            ParentKind::Category => write!(f, "category"),
        }
    }
}

/// One of the ordered collections a gradebook maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "collection", content = "owner", rename_all = "snake_case")]
pub enum Collection {
    Students,
    Categories,
    Evaluations,
    StudentEvaluations(StudentId),
    CategoryEvaluations(CategoryId),
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Students => write!(f, "students"),
            Collection::Categories => write!(f, "categories"),
            Collection::Evaluations => write!(f, "evaluations"),
            Collection::StudentEvaluations(id) => write!(f, "evaluations of student {id}"),
            Collection::CategoryEvaluations(id) => write!(f, "evaluations of category {id}"),
        }
    }
}
