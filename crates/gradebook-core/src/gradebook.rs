//! The gradebook: one evaluations registry cross-wired with the students
//! and categories registries.
//!
//! `evaluations` is a [`ParentSyncList`]: inserting an evaluation registers
//! its student and category. `students` and `categories` are
//! [`ContentSyncList`]s whose members' owned evaluations are flattened into
//! `evaluations`. Changing a back-reference moves the evaluation between
//! owner lists, which feeds both directions; the guard table stops the
//! resulting round trip after one hop.
//!
//! Every public mutation validates its arguments before touching anything
//! and returns only once its cascade has settled.

use std::collections::{HashMap, HashSet};

use crate::config::{BoundPolicy, GradebookConfig, OnRemove};
use crate::content_sync::{ContentSyncHost, ContentSyncList, FlattenQueue};
use crate::error::{GradebookError, Result};
use crate::events::ChangeEvent;
use crate::guard::{GuardKey, GuardTable};
use crate::ids::{CategoryId, Collection, EntityId, EvaluationId, ParentKind, StudentId};
use crate::links::{CascadeContext, CategoryLink, Node, Origin, ParentId, Relation, StudentLink};
use crate::model::{within_bounds, Category, Evaluation, EvaluationDisplay, Student};
use crate::parent_ref::{ListChange, ParentRefHost};
use crate::parent_sync::{ParentRef, ParentSyncHost, ParentSyncList};

/// Pre-linked values handed to [`Gradebook::adopt`] together.
///
/// Every link inside the batch must point at another member of the batch,
/// and both sides of each link must agree.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub students: Vec<Student>,
    pub categories: Vec<Category>,
    pub evaluations: Vec<Evaluation>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_student(mut self, student: Student) -> Self {
        self.students.push(student);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.categories.push(category);
        self
    }

    pub fn with_evaluation(mut self, evaluation: Evaluation) -> Self {
        self.evaluations.push(evaluation);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty() && self.categories.is_empty() && self.evaluations.is_empty()
    }
}

/// Every entity the gradebook owns, registered or not.
#[derive(Debug, Default)]
pub(crate) struct Pool {
    pub(crate) students: HashMap<StudentId, Student>,
    pub(crate) categories: HashMap<CategoryId, Category>,
    pub(crate) evaluations: HashMap<EvaluationId, Evaluation>,
}

impl Pool {
    pub(crate) fn student(&self, id: StudentId) -> Result<&Student> {
        self.students.get(&id).ok_or(GradebookError::Unknown(id.into()))
    }

    fn student_mut(&mut self, id: StudentId) -> Result<&mut Student> {
        self.students.get_mut(&id).ok_or(GradebookError::Unknown(id.into()))
    }

    pub(crate) fn category(&self, id: CategoryId) -> Result<&Category> {
        self.categories.get(&id).ok_or(GradebookError::Unknown(id.into()))
    }

    fn category_mut(&mut self, id: CategoryId) -> Result<&mut Category> {
        self.categories.get_mut(&id).ok_or(GradebookError::Unknown(id.into()))
    }

    pub(crate) fn evaluation(&self, id: EvaluationId) -> Result<&Evaluation> {
        self.evaluations.get(&id).ok_or(GradebookError::Unknown(id.into()))
    }

    fn evaluation_mut(&mut self, id: EvaluationId) -> Result<&mut Evaluation> {
        self.evaluations.get_mut(&id).ok_or(GradebookError::Unknown(id.into()))
    }

    fn contains(&self, id: EntityId) -> bool {
        match id {
            EntityId::Student(id) => self.students.contains_key(&id),
            EntityId::Category(id) => self.categories.contains_key(&id),
            EntityId::Evaluation(id) => self.evaluations.contains_key(&id),
        }
    }
}

/// Students, categories and evaluations kept mutually consistent.
#[derive(Debug)]
pub struct Gradebook {
    pub(crate) pool: Pool,
    students: ContentSyncList<Student>,
    categories: ContentSyncList<Category>,
    evaluations: ParentSyncList<Evaluation>,
    guards: GuardTable,
    flatten_queue: FlattenQueue,
    journal: Vec<ChangeEvent>,
    config: GradebookConfig,
}

impl Default for Gradebook {
    fn default() -> Self {
        Self::new(GradebookConfig::default())
    }
}

impl Gradebook {
    pub fn new(config: GradebookConfig) -> Self {
        Self {
            pool: Pool::default(),
            students: ContentSyncList::new(Collection::Students),
            categories: ContentSyncList::new(Collection::Categories),
            evaluations: ParentSyncList::new(Collection::Evaluations),
            guards: GuardTable::new(config.max_cascade_depth),
            flatten_queue: FlattenQueue::default(),
            journal: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &GradebookConfig {
        &self.config
    }

    pub fn students(&self) -> &ContentSyncList<Student> {
        &self.students
    }

    pub fn categories(&self) -> &ContentSyncList<Category> {
        &self.categories
    }

    pub fn evaluations(&self) -> &ParentSyncList<Evaluation> {
        &self.evaluations
    }

    pub fn student(&self, id: StudentId) -> Option<&Student> {
        self.pool.students.get(&id)
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.pool.categories.get(&id)
    }

    pub fn evaluation(&self, id: EvaluationId) -> Option<&Evaluation> {
        self.pool.evaluations.get(&id)
    }

    /// `true` when no cascade is in flight.
    pub fn is_quiescent(&self) -> bool {
        self.guards.is_quiescent() && self.flatten_queue.is_idle()
    }

    /// Events recorded since the last [`take_events`](Self::take_events).
    pub fn events(&self) -> &[ChangeEvent] {
        &self.journal
    }

    pub fn take_events(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.journal)
    }

    /// Render an evaluation as `"{category}: {points}b ({reason})"`.
    pub fn display_evaluation(&self, id: EvaluationId) -> Result<EvaluationDisplay<'_>> {
        let evaluation = self.pool.evaluation(id)?;
        let category = match evaluation.category {
            Some(category) => Some(self.pool.category(category)?),
            None => None,
        };
        Ok(EvaluationDisplay {
            evaluation,
            category,
        })
    }

    // --- adoption ---

    /// Take ownership of a batch of values. Adopted values are detached
    /// until a registry reaches them.
    pub fn adopt(&mut self, batch: Batch) -> Result<()> {
        self.check_batch(&batch)?;

        tracing::debug!(
            students = batch.students.len(),
            categories = batch.categories.len(),
            evaluations = batch.evaluations.len(),
            "adopting batch"
        );
        let Batch {
            students,
            categories,
            evaluations,
        } = batch;
        self.pool
            .students
            .extend(students.into_iter().map(|s| (s.id(), s)));
        self.pool
            .categories
            .extend(categories.into_iter().map(|c| (c.id(), c)));
        self.pool
            .evaluations
            .extend(evaluations.into_iter().map(|e| (e.id(), e)));
        Ok(())
    }

    /// Adopt a single unlinked student.
    pub fn create_student(&mut self, student: Student) -> Result<StudentId> {
        let id = student.id();
        self.adopt(Batch::new().with_student(student))?;
        Ok(id)
    }

    /// Adopt a single unlinked category.
    pub fn create_category(&mut self, category: Category) -> Result<CategoryId> {
        let id = category.id();
        self.adopt(Batch::new().with_category(category))?;
        Ok(id)
    }

    /// Adopt a single unlinked evaluation.
    pub fn create_evaluation(&mut self, evaluation: Evaluation) -> Result<EvaluationId> {
        let id = evaluation.id();
        self.adopt(Batch::new().with_evaluation(evaluation))?;
        Ok(id)
    }

    fn check_batch(&self, batch: &Batch) -> Result<()> {
        let mut seen = HashSet::new();
        let ids = batch
            .students
            .iter()
            .map(|s| EntityId::from(s.id()))
            .chain(batch.categories.iter().map(|c| EntityId::from(c.id())))
            .chain(batch.evaluations.iter().map(|e| EntityId::from(e.id())));
        for id in ids {
            if self.pool.contains(id) || !seen.insert(id) {
                return Err(GradebookError::AlreadyAdopted(id));
            }
        }

        let students: HashMap<StudentId, &Student> =
            batch.students.iter().map(|s| (s.id(), s)).collect();
        let categories: HashMap<CategoryId, &Category> =
            batch.categories.iter().map(|c| (c.id(), c)).collect();
        let evaluations: HashMap<EvaluationId, &Evaluation> =
            batch.evaluations.iter().map(|e| (e.id(), e)).collect();

        for evaluation in &batch.evaluations {
            if let Some(points) = evaluation.points {
                if !points.is_finite() {
                    return Err(GradebookError::InvalidPoints(points));
                }
            }
            if let Some(student) = evaluation.student {
                let owner = students
                    .get(&student)
                    .ok_or(GradebookError::DanglingReference {
                        from: evaluation.id().into(),
                        to: student.into(),
                    })?;
                check_listed::<StudentLink>(owner, evaluation)?;
            }
            if let Some(category) = evaluation.category {
                let owner = categories
                    .get(&category)
                    .ok_or(GradebookError::DanglingReference {
                        from: evaluation.id().into(),
                        to: category.into(),
                    })?;
                check_listed::<CategoryLink>(owner, evaluation)?;
            }
        }

        for student in &batch.students {
            check_owned::<StudentLink>(student, &evaluations)?;
        }
        for category in &batch.categories {
            check_bounds(category.min_points, category.max_points)?;
            check_owned::<CategoryLink>(category, &evaluations)?;
        }
        Ok(())
    }

    // --- registries ---

    pub fn add_student(&mut self, student: StudentId) -> Result<()> {
        let at = self.students.len();
        self.insert_student(at, student)
    }

    pub fn insert_student(&mut self, index: usize, student: StudentId) -> Result<()> {
        ContentSyncHost::<StudentLink>::insert_member(self, index, student, Origin::Direct)
    }

    pub fn set_student(&mut self, index: usize, student: StudentId) -> Result<()> {
        ContentSyncHost::<StudentLink>::replace_member(self, index, student)
    }

    /// Returns `false` if the student was not registered.
    pub fn remove_student(&mut self, student: StudentId) -> Result<bool> {
        ContentSyncHost::<StudentLink>::remove_member(self, student)
    }

    pub fn remove_student_at(&mut self, index: usize) -> Result<()> {
        ContentSyncHost::<StudentLink>::remove_member_at(self, index)
    }

    pub fn clear_students(&mut self) -> Result<()> {
        ContentSyncHost::<StudentLink>::clear_members(self)
    }

    pub fn add_category(&mut self, category: CategoryId) -> Result<()> {
        let at = self.categories.len();
        self.insert_category(at, category)
    }

    pub fn insert_category(&mut self, index: usize, category: CategoryId) -> Result<()> {
        ContentSyncHost::<CategoryLink>::insert_member(self, index, category, Origin::Direct)
    }

    pub fn set_category(&mut self, index: usize, category: CategoryId) -> Result<()> {
        ContentSyncHost::<CategoryLink>::replace_member(self, index, category)
    }

    pub fn remove_category(&mut self, category: CategoryId) -> Result<bool> {
        ContentSyncHost::<CategoryLink>::remove_member(self, category)
    }

    pub fn remove_category_at(&mut self, index: usize) -> Result<()> {
        ContentSyncHost::<CategoryLink>::remove_member_at(self, index)
    }

    pub fn clear_categories(&mut self) -> Result<()> {
        ContentSyncHost::<CategoryLink>::clear_members(self)
    }

    /// Register an evaluation directly. It stays registered even after
    /// losing both parents.
    pub fn add_evaluation(&mut self, evaluation: EvaluationId) -> Result<()> {
        let at = self.evaluations.len();
        self.insert_evaluation(at, evaluation)
    }

    pub fn insert_evaluation(&mut self, index: usize, evaluation: EvaluationId) -> Result<()> {
        ParentSyncHost::<Evaluation>::insert_item(self, index, evaluation, Origin::Direct)
    }

    pub fn set_evaluation_at(&mut self, index: usize, evaluation: EvaluationId) -> Result<()> {
        ParentSyncHost::<Evaluation>::replace_item(self, index, evaluation)
    }

    /// Unregister an evaluation, clearing both of its back-references.
    pub fn remove_evaluation(&mut self, evaluation: EvaluationId) -> Result<bool> {
        ParentSyncHost::<Evaluation>::remove_item(self, evaluation)
    }

    pub fn remove_evaluation_at(&mut self, index: usize) -> Result<()> {
        ParentSyncHost::<Evaluation>::remove_item_at(self, index)
    }

    pub fn clear_evaluations(&mut self) -> Result<()> {
        ParentSyncHost::<Evaluation>::clear_items(self)
    }

    // --- entity lists ---

    /// Append an unowned evaluation to a student's list.
    ///
    /// Fails with `Duplicate` if the student already owns it and with
    /// `ForeignEvaluation` if another student does.
    pub fn student_add_evaluation(
        &mut self,
        student: StudentId,
        evaluation: EvaluationId,
    ) -> Result<()> {
        self.add_child::<StudentLink>(student, evaluation)
    }

    /// Returns `false` if the evaluation has no student.
    pub fn student_remove_evaluation(
        &mut self,
        student: StudentId,
        evaluation: EvaluationId,
    ) -> Result<bool> {
        self.remove_child::<StudentLink>(student, evaluation)
    }

    /// Insert into a student's list, taking the evaluation away from its
    /// current student if it has one.
    pub fn student_insert_evaluation(
        &mut self,
        student: StudentId,
        index: usize,
        evaluation: EvaluationId,
    ) -> Result<()> {
        ParentRefHost::<StudentLink>::insert_child(self, student, index, evaluation)
    }

    pub fn student_set_evaluation_at(
        &mut self,
        student: StudentId,
        index: usize,
        evaluation: EvaluationId,
    ) -> Result<()> {
        ParentRefHost::<StudentLink>::replace_child(self, student, index, evaluation)
    }

    pub fn student_remove_evaluation_at(&mut self, student: StudentId, index: usize) -> Result<()> {
        ParentRefHost::<StudentLink>::remove_child_at(self, student, index)
    }

    pub fn student_clear_evaluations(&mut self, student: StudentId) -> Result<()> {
        ParentRefHost::<StudentLink>::clear_children(self, student)
    }

    pub fn category_add_evaluation(
        &mut self,
        category: CategoryId,
        evaluation: EvaluationId,
    ) -> Result<()> {
        self.add_child::<CategoryLink>(category, evaluation)
    }

    pub fn category_remove_evaluation(
        &mut self,
        category: CategoryId,
        evaluation: EvaluationId,
    ) -> Result<bool> {
        self.remove_child::<CategoryLink>(category, evaluation)
    }

    pub fn category_insert_evaluation(
        &mut self,
        category: CategoryId,
        index: usize,
        evaluation: EvaluationId,
    ) -> Result<()> {
        ParentRefHost::<CategoryLink>::insert_child(self, category, index, evaluation)
    }

    pub fn category_set_evaluation_at(
        &mut self,
        category: CategoryId,
        index: usize,
        evaluation: EvaluationId,
    ) -> Result<()> {
        ParentRefHost::<CategoryLink>::replace_child(self, category, index, evaluation)
    }

    pub fn category_remove_evaluation_at(
        &mut self,
        category: CategoryId,
        index: usize,
    ) -> Result<()> {
        ParentRefHost::<CategoryLink>::remove_child_at(self, category, index)
    }

    pub fn category_clear_evaluations(&mut self, category: CategoryId) -> Result<()> {
        ParentRefHost::<CategoryLink>::clear_children(self, category)
    }

    fn add_child<R>(&mut self, owner: ParentId<R>, evaluation: EvaluationId) -> Result<()>
    where
        R: Relation<Child = Evaluation>,
        Self: ParentRefHost<R>,
    {
        ParentRefHost::<R>::parent_entity(self, owner)?;
        match R::parent_of(self.pool.evaluation(evaluation)?) {
            Some(current) if current == owner => Err(GradebookError::Duplicate {
                collection: R::list(owner),
                item: evaluation.into(),
            }),
            Some(current) => Err(GradebookError::ForeignEvaluation {
                evaluation,
                owner: current.into(),
            }),
            None => {
                let at = ParentRefHost::<R>::children_of(self, owner)?.len();
                ParentRefHost::<R>::insert_child(self, owner, at, evaluation)
            }
        }
    }

    fn remove_child<R>(&mut self, owner: ParentId<R>, evaluation: EvaluationId) -> Result<bool>
    where
        R: Relation<Child = Evaluation>,
        Self: ParentRefHost<R>,
    {
        ParentRefHost::<R>::parent_entity(self, owner)?;
        match R::parent_of(self.pool.evaluation(evaluation)?) {
            Some(current) if current == owner => {
                let Some(index) = ParentRefHost::<R>::children_of(self, owner)?.position(&evaluation)
                else {
                    return Ok(false);
                };
                ParentRefHost::<R>::remove_child_at(self, owner, index).map(|()| true)
            }
            Some(current) => Err(GradebookError::ForeignEvaluation {
                evaluation,
                owner: current.into(),
            }),
            None => Ok(false),
        }
    }

    // --- back-references ---

    /// Point an evaluation at a student, or at none.
    pub fn set_evaluation_student(
        &mut self,
        evaluation: EvaluationId,
        student: Option<StudentId>,
    ) -> Result<()> {
        self.assign_parent_ref::<StudentLink>(evaluation, student)
    }

    /// Point an evaluation at a category, or at none.
    pub fn set_evaluation_category(
        &mut self,
        evaluation: EvaluationId,
        category: Option<CategoryId>,
    ) -> Result<()> {
        self.assign_parent_ref::<CategoryLink>(evaluation, category)
    }

    /// Cascading back-reference setter shared by both relations.
    ///
    /// Leaves the old owner's list, enters the new one's, then lets the
    /// evaluations registry react. One `ParentChanged` is recorded once the
    /// whole cascade has settled.
    fn assign_parent_ref<R>(
        &mut self,
        evaluation: EvaluationId,
        parent: Option<ParentId<R>>,
    ) -> Result<()>
    where
        R: Relation<Child = Evaluation>,
        Self: ParentRefHost<R>,
    {
        let guard = self.guards.enter(GuardKey::assign(evaluation, R::KIND));
        if guard.is_recursive() {
            return Ok(());
        }

        let current = R::parent_of(self.pool.evaluation(evaluation)?);
        if current == parent {
            return Ok(());
        }
        if let Some(parent) = parent {
            ParentRefHost::<R>::parent_entity(self, parent)?;
        }

        if let Some(old) = current {
            if let Some(index) = ParentRefHost::<R>::children_of(self, old)?.position(&evaluation) {
                ParentRefHost::<R>::remove_child_at(self, old, index)?;
            }
        }

        R::store_parent(self.pool.evaluation_mut(evaluation)?, parent);

        if let Some(parent) = parent {
            let list = ParentRefHost::<R>::children_of(self, parent)?;
            if !list.contains(&evaluation) {
                let at = list.len();
                ParentRefHost::<R>::insert_child(self, parent, at, evaluation)?;
            }
        }

        ParentSyncHost::<Evaluation>::parent_reference_changed(self, evaluation, R::KIND)?;
        drop(guard);

        self.record(ChangeEvent::ParentChanged {
            evaluation,
            kind: R::KIND,
            parent: parent.map(Into::into),
        });
        Ok(())
    }

    // --- value edits ---

    /// Set or clear an evaluation's score.
    ///
    /// A score outside the category bounds is logged or refused depending
    /// on [`BoundPolicy`].
    pub fn set_evaluation_points(
        &mut self,
        evaluation: EvaluationId,
        points: Option<f64>,
    ) -> Result<()> {
        let current = self.pool.evaluation(evaluation)?;
        if let Some(points) = points {
            if !points.is_finite() {
                return Err(GradebookError::InvalidPoints(points));
            }
            if let Some(category) = current.category {
                let category = self.pool.category(category)?;
                if !category.admits(points) {
                    match self.config.bound_policy {
                        BoundPolicy::Reject => {
                            return Err(GradebookError::PointsOutOfRange {
                                points,
                                category: category.id(),
                            })
                        }
                        BoundPolicy::Warn => tracing::warn!(
                            %evaluation,
                            points,
                            category = %category.name,
                            "points outside category bounds"
                        ),
                    }
                }
            }
        }

        self.pool.evaluation_mut(evaluation)?.points = points;
        self.record(ChangeEvent::Updated {
            item: evaluation.into(),
        });
        Ok(())
    }

    pub fn set_evaluation_reason(
        &mut self,
        evaluation: EvaluationId,
        reason: Option<String>,
    ) -> Result<()> {
        self.pool.evaluation_mut(evaluation)?.reason = reason;
        self.record(ChangeEvent::Updated {
            item: evaluation.into(),
        });
        Ok(())
    }

    pub fn rename_student(
        &mut self,
        student: StudentId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Result<()> {
        let entity = self.pool.student_mut(student)?;
        entity.first_name = first_name.into();
        entity.last_name = last_name.into();
        self.record(ChangeEvent::Updated {
            item: student.into(),
        });
        Ok(())
    }

    pub fn rename_category(&mut self, category: CategoryId, name: impl Into<String>) -> Result<()> {
        self.pool.category_mut(category)?.name = name.into();
        self.record(ChangeEvent::Updated {
            item: category.into(),
        });
        Ok(())
    }

    /// Change a category's score bounds.
    ///
    /// Scores already recorded outside the new bounds are logged or make
    /// the call fail, depending on [`BoundPolicy`].
    pub fn set_category_bounds(
        &mut self,
        category: CategoryId,
        min_points: Option<f64>,
        max_points: Option<f64>,
    ) -> Result<()> {
        check_bounds(min_points, max_points)?;
        let entity = self.pool.category(category)?;
        let excluded = entity
            .evaluations
            .iter()
            .filter_map(|id| self.pool.evaluations.get(&id))
            .filter_map(|evaluation| evaluation.points)
            .filter(|&points| !within_bounds(points, min_points, max_points))
            .count();
        if excluded > 0 {
            match self.config.bound_policy {
                BoundPolicy::Reject => {
                    return Err(GradebookError::BoundsExcludeScores {
                        category,
                        count: excluded,
                    })
                }
                BoundPolicy::Warn => tracing::warn!(
                    category = %entity.name,
                    excluded,
                    "new bounds exclude existing scores"
                ),
            }
        }

        let entity = self.pool.category_mut(category)?;
        entity.min_points = min_points;
        entity.max_points = max_points;
        self.record(ChangeEvent::Updated {
            item: category.into(),
        });
        Ok(())
    }

    pub(crate) fn register_student(&mut self, student: StudentId) -> Result<()> {
        let at = self.students.len();
        ContentSyncHost::<StudentLink>::insert_member(self, at, student, Origin::Cascade)
    }

    pub(crate) fn register_category(&mut self, category: CategoryId) -> Result<()> {
        let at = self.categories.len();
        ContentSyncHost::<CategoryLink>::insert_member(self, at, category, Origin::Cascade)
    }

    /// Route a member's sub-item according to the removal policy.
    fn release_evaluation<R>(
        &mut self,
        policy: OnRemove,
        owner: ParentId<R>,
        evaluation: EvaluationId,
    ) -> Result<()>
    where
        R: Relation<Child = Evaluation>,
        Self: ParentRefHost<R>,
    {
        if R::parent_of(self.pool.evaluation(evaluation)?) != Some(owner) {
            return Ok(());
        }
        match policy {
            OnRemove::Detach => self.assign_parent_ref::<R>(evaluation, None),
            OnRemove::Delete if self.evaluations.contains(&evaluation) => {
                tracing::debug!(%evaluation, %owner, "deleting evaluation of removed owner");
                ParentSyncHost::<Evaluation>::remove_item(self, evaluation).map(|_| ())
            }
            OnRemove::Delete => self.assign_parent_ref::<R>(evaluation, None),
        }
    }
}

fn check_bounds(min_points: Option<f64>, max_points: Option<f64>) -> Result<()> {
    for bound in [min_points, max_points].into_iter().flatten() {
        if !bound.is_finite() {
            return Err(GradebookError::InvalidPoints(bound));
        }
    }
    match (min_points, max_points) {
        (Some(min), Some(max)) if min > max => Err(GradebookError::InvalidBounds { min, max }),
        _ => Ok(()),
    }
}

/// The draft parent `owner` must list `evaluation`, which points at it.
fn check_listed<R>(owner: &R::Parent, evaluation: &Evaluation) -> Result<()>
where
    R: Relation<Child = Evaluation>,
{
    if R::children(owner).contains(&evaluation.id()) {
        Ok(())
    } else {
        Err(GradebookError::InconsistentDraft {
            owner: owner.id().into(),
            evaluation: evaluation.id(),
        })
    }
}

/// Every evaluation a draft parent lists must be in the batch and point back.
fn check_owned<R>(
    parent: &R::Parent,
    evaluations: &HashMap<EvaluationId, &Evaluation>,
) -> Result<()>
where
    R: Relation<Child = Evaluation>,
{
    let owner = parent.id();
    for id in R::children(parent).iter() {
        let evaluation = evaluations
            .get(&id)
            .ok_or(GradebookError::DanglingReference {
                from: owner.into(),
                to: id.into(),
            })?;
        if R::parent_of(evaluation) != Some(owner) {
            return Err(GradebookError::InconsistentDraft {
                owner: owner.into(),
                evaluation: id,
            });
        }
    }
    Ok(())
}

impl CascadeContext for Gradebook {
    fn guards(&self) -> &GuardTable {
        &self.guards
    }

    fn record(&mut self, event: ChangeEvent) {
        if self.config.record_events {
            self.journal.push(event);
        }
    }

    fn flatten_queue(&mut self) -> &mut FlattenQueue {
        &mut self.flatten_queue
    }

    fn flatten_registered(&mut self, member: EntityId) -> Result<()> {
        match member {
            EntityId::Student(student) if self.students.contains(&student) => {
                ContentSyncHost::<StudentLink>::flatten(self, student)
            }
            EntityId::Category(category) if self.categories.contains(&category) => {
                ContentSyncHost::<CategoryLink>::flatten(self, category)
            }
            _ => Ok(()),
        }
    }
}

impl ParentSyncHost<Evaluation> for Gradebook {
    fn registry(&self) -> &ParentSyncList<Evaluation> {
        &self.evaluations
    }

    fn registry_mut(&mut self) -> &mut ParentSyncList<Evaluation> {
        &mut self.evaluations
    }

    fn item_entity(&self, item: EvaluationId) -> Result<&Evaluation> {
        self.pool.evaluation(item)
    }

    fn parent_ref(&self, item: EvaluationId, kind: ParentKind) -> Result<Option<ParentRef>> {
        let evaluation = self.pool.evaluation(item)?;
        Ok(match kind {
            ParentKind::Student => evaluation.student.map(ParentRef::Student),
            ParentKind::Category => evaluation.category.map(ParentRef::Category),
        })
    }

    fn add_parent_links(&mut self, item: EvaluationId) -> Result<()> {
        for kind in ParentKind::ALL {
            if let Some(parent) = self.parent_ref(item, kind)? {
                self.register_parent(parent)?;
            }
        }
        Ok(())
    }

    fn remove_parent_links(&mut self, item: EvaluationId) -> Result<()> {
        self.assign_parent_ref::<CategoryLink>(item, None)?;
        self.assign_parent_ref::<StudentLink>(item, None)
    }

    fn register_parent(&mut self, parent: ParentRef) -> Result<()> {
        match parent {
            ParentRef::Student(student) => self.register_student(student),
            ParentRef::Category(category) => self.register_category(category),
        }
    }
}

/// Wires one relation's owner lists and members registry into the gradebook.
macro_rules! relation_hosts {
    ($link:ty, $parent:ty, $id:ty, $members:ident, $get:ident, $get_mut:ident, $policy:ident) => {
        impl ParentRefHost<$link> for Gradebook {
            fn parent_entity(&self, owner: $id) -> Result<&$parent> {
                self.pool.$get(owner)
            }

            fn parent_entity_mut(&mut self, owner: $id) -> Result<&mut $parent> {
                self.pool.$get_mut(owner)
            }

            fn child_entity(&self, child: EvaluationId) -> Result<&Evaluation> {
                self.pool.evaluation(child)
            }

            fn assign_parent(&mut self, child: EvaluationId, parent: Option<$id>) -> Result<()> {
                self.assign_parent_ref::<$link>(child, parent)
            }

            fn children_changed(
                &mut self,
                owner: $id,
                change: ListChange<EvaluationId>,
            ) -> Result<()> {
                ContentSyncHost::<$link>::sub_items_changed(self, owner, change)
            }
        }

        impl ContentSyncHost<$link> for Gradebook {
            fn members(&self) -> &ContentSyncList<$parent> {
                &self.$members
            }

            fn members_mut(&mut self) -> &mut ContentSyncList<$parent> {
                &mut self.$members
            }

            fn member_entity(&self, member: $id) -> Result<&$parent> {
                self.pool.$get(member)
            }

            fn enrol_sub_item(&mut self, sub_item: EvaluationId) -> Result<()> {
                let at = self.evaluations.len();
                ParentSyncHost::<Evaluation>::insert_item(self, at, sub_item, Origin::Cascade)
            }

            fn detach_sub_item(&mut self, owner: $id, sub_item: EvaluationId) -> Result<()> {
                let policy = self.config.removal.$policy;
                self.release_evaluation::<$link>(policy, owner, sub_item)
            }
        }
    };
}

relation_hosts!(StudentLink, Student, StudentId, students, student, student_mut, students);
relation_hosts!(CategoryLink, Category, CategoryId, categories, category, category_mut, categories);
