//! Gradebook error types.
//!
//! Every variant describes a rejected call. Validation always runs before any
//! collection is touched, so a returned error means nothing changed.

use thiserror::Error;

use crate::ids::{CategoryId, Collection, EntityId, EvaluationId};

/// Errors returned by [`Gradebook`](crate::Gradebook) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradebookError {
    /// The id does not name an entity this gradebook owns.
    #[error("unknown {0}")]
    Unknown(EntityId),

    /// The item is already present in the target collection.
    #[error("{item} is already present in {collection}")]
    Duplicate { collection: Collection, item: EntityId },

    /// The evaluation is owned by a different parent of the same kind.
    #[error("evaluation {evaluation} already belongs to {owner}")]
    ForeignEvaluation {
        evaluation: EvaluationId,
        owner: EntityId,
    },

    /// Positional access past the end of a collection.
    #[error("index {index} out of range for {collection} of length {len}")]
    IndexOutOfRange {
        collection: Collection,
        index: usize,
        len: usize,
    },

    /// A value with this id was already handed to the gradebook.
    #[error("{0} was already adopted")]
    AlreadyAdopted(EntityId),

    /// A draft or snapshot links to an entity that is not part of it.
    #[error("{from} refers to {to}, which is not part of the batch")]
    DanglingReference { from: EntityId, to: EntityId },

    /// The two sides of a draft link disagree.
    #[error("{owner} and evaluation {evaluation} disagree about their link")]
    InconsistentDraft {
        owner: EntityId,
        evaluation: EvaluationId,
    },

    #[error("invalid score bounds: minimum {min} exceeds maximum {max}")]
    InvalidBounds { min: f64, max: f64 },

    #[error("invalid points value: {0}")]
    InvalidPoints(f64),

    /// Points outside the category bounds while bounds are enforced.
    #[error("{points} points is outside the bounds of category {category}")]
    PointsOutOfRange { points: f64, category: CategoryId },

    /// New bounds would exclude scores already recorded in the category.
    #[error("new bounds for category {category} exclude {count} existing score(s)")]
    BoundsExcludeScores { category: CategoryId, count: usize },
}

pub type Result<T, E = GradebookError> = std::result::Result<T, E>;
