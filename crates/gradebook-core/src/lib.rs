//! gradebook-core: students, categories and evaluations kept referentially
//! consistent.
//!
//! A [`Gradebook`] owns three registries. Whichever one a caller mutates
//! (or whichever back-reference it sets), the change cascades until every
//! registry and every owner list agree again.

pub mod config;
pub mod content_sync;
pub mod error;
pub mod events;
pub mod gradebook;
pub mod guard;
pub mod ids;
pub mod invariants;
mod links;
pub mod model;
pub mod parent_ref;
pub mod parent_sync;
pub mod snapshot;
pub mod store;
pub mod summary;
pub mod validate;

pub use config::{BoundPolicy, GradebookConfig, OnRemove, RemovalPolicy};
pub use error::{GradebookError, Result};
pub use events::ChangeEvent;
pub use gradebook::{Batch, Gradebook};
pub use ids::{CategoryId, Collection, EntityId, EvaluationId, ParentKind, StudentId};
pub use links::Node;
pub use model::{Category, Evaluation, EvaluationDisplay, Student};
