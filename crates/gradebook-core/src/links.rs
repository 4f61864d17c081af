//! Typed back-reference capabilities.
//!
//! A [`Relation`] describes one child→parent edge: how to read and write the
//! child's back-reference and where the parent keeps its owned list. The
//! generic containers are written against these descriptors, so there is no
//! lookup of fields by name anywhere in the engine.

use std::fmt;
use std::hash::Hash;

use crate::content_sync::FlattenQueue;
use crate::error::{GradebookError, Result};
use crate::events::ChangeEvent;
use crate::guard::GuardTable;
use crate::ids::{CategoryId, Collection, EntityId, ParentKind, StudentId};
use crate::model::{Category, Evaluation, Student};
use crate::parent_ref::ParentRefList;

/// An entity with a typed identity.
pub trait Node {
    type Id: Copy + Eq + Hash + fmt::Debug + fmt::Display + Into<EntityId>;

    fn id(&self) -> Self::Id;
}

pub(crate) type ParentId<R> = <<R as Relation>::Parent as Node>::Id;
pub(crate) type ChildId<R> = <<R as Relation>::Child as Node>::Id;

/// One child→parent edge of the data model.
pub(crate) trait Relation: Sized {
    type Child: Node;
    type Parent: Node;

    const KIND: ParentKind;

    fn parent_of(child: &Self::Child) -> Option<ParentId<Self>>;

    /// Raw write of the back-reference, no cascade.
    fn store_parent(child: &mut Self::Child, parent: Option<ParentId<Self>>);

    fn children(parent: &Self::Parent) -> &ParentRefList<Self::Child, Self::Parent>;

    fn children_mut(parent: &mut Self::Parent) -> &mut ParentRefList<Self::Child, Self::Parent>;

    /// The owned list of `owner`, as a collection name.
    fn list(owner: ParentId<Self>) -> Collection;
}

/// Evaluation → Student.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StudentLink;

impl Relation for StudentLink {
    type Child = Evaluation;
    type Parent = Student;

    const KIND: ParentKind = ParentKind::Student;

    fn parent_of(child: &Evaluation) -> Option<StudentId> {
        child.student
    }

    fn store_parent(child: &mut Evaluation, parent: Option<StudentId>) {
        child.student = parent;
    }

    fn children(parent: &Student) -> &ParentRefList<Evaluation, Student> {
        &parent.evaluations
    }

    fn children_mut(parent: &mut Student) -> &mut ParentRefList<Evaluation, Student> {
        &mut parent.evaluations
    }

    fn list(owner: StudentId) -> Collection {
        Collection::StudentEvaluations(owner)
    }
}

/// Evaluation → Category.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CategoryLink;

impl Relation for CategoryLink {
    type Child = Evaluation;
    type Parent = Category;

    const KIND: ParentKind = ParentKind::Category;

    fn parent_of(child: &Evaluation) -> Option<CategoryId> {
        child.category
    }

    fn store_parent(child: &mut Evaluation, parent: Option<CategoryId>) {
        child.category = parent;
    }

    fn children(parent: &Category) -> &ParentRefList<Evaluation, Category> {
        &parent.evaluations
    }

    fn children_mut(parent: &mut Category) -> &mut ParentRefList<Evaluation, Category> {
        &mut parent.evaluations
    }

    fn list(owner: CategoryId) -> Collection {
        Collection::CategoryEvaluations(owner)
    }
}

/// State shared by every cascading container operation.
pub(crate) trait CascadeContext {
    fn guards(&self) -> &GuardTable;

    fn record(&mut self, event: ChangeEvent);

    fn flatten_queue(&mut self) -> &mut FlattenQueue;

    /// Flatten the sub-items of `member` if it is still registered.
    fn flatten_registered(&mut self, member: EntityId) -> Result<()>;

    /// Flatten `member` now if no flatten is in progress, otherwise leave it
    /// to the one that is.
    fn schedule_flatten(&mut self, member: EntityId) -> Result<()> {
        if !self.flatten_queue().push(member) {
            return Ok(());
        }
        let outcome = loop {
            let Some(next) = self.flatten_queue().pop() else {
                break Ok(());
            };
            if let Err(err) = self.flatten_registered(next) {
                break Err(err);
            }
        };
        self.flatten_queue().finish();
        outcome
    }
}

/// Who asked for an insert: the caller, or a cascade of another mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    Direct,
    Cascade,
}

/// Link two plain values on both sides, without any gradebook involved.
pub(crate) fn push_child<R>(parent: &mut R::Parent, child: &mut Evaluation) -> Result<()>
where
    R: Relation<Child = Evaluation>,
{
    let owner = parent.id();
    match R::parent_of(child) {
        Some(current) if current == owner => Err(GradebookError::Duplicate {
            collection: R::list(owner),
            item: child.id().into(),
        }),
        Some(current) => Err(GradebookError::ForeignEvaluation {
            evaluation: child.id(),
            owner: current.into(),
        }),
        None => {
            R::store_parent(child, Some(owner));
            R::children_mut(parent).push(child.id());
            Ok(())
        }
    }
}
