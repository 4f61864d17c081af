//! Core data model types for gradebook.
//!
//! Students, categories and evaluations are plain values. They can be built
//! and pre-linked freely ("drafts") and handed to a
//! [`Gradebook`](crate::Gradebook), which owns them from then on and keeps
//! their links consistent.

use std::fmt;

use crate::error::Result;
use crate::ids::{CategoryId, EvaluationId, StudentId};
use crate::links::{push_child, CategoryLink, Node, StudentLink};
use crate::parent_ref::ParentRefList;

/// A student and the evaluations they own.
#[derive(Debug, Clone)]
pub struct Student {
    id: StudentId,
    pub first_name: String,
    pub last_name: String,
    pub(crate) evaluations: ParentRefList<Evaluation, Student>,
}

impl Student {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self::with_id(StudentId::new(), first_name, last_name)
    }

    pub fn with_id(
        id: StudentId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            evaluations: ParentRefList::new(id),
        }
    }

    pub fn id(&self) -> StudentId {
        self.id
    }

    pub fn evaluations(&self) -> &ParentRefList<Evaluation, Student> {
        &self.evaluations
    }

    /// Link a draft evaluation to this draft student.
    ///
    /// Fails if the evaluation already belongs to this or another student.
    pub fn push_evaluation(&mut self, evaluation: &mut Evaluation) -> Result<()> {
        push_child::<StudentLink>(self, evaluation)
    }
}

impl Node for Student {
    type Id = StudentId;

    fn id(&self) -> StudentId {
        self.id
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => write!(f, "{} {}", self.first_name, self.last_name),
            (false, true) => write!(f, "{}", self.first_name),
            _ => write!(f, "{}", self.last_name),
        }
    }
}

/// A grading category with optional score bounds.
#[derive(Debug, Clone)]
pub struct Category {
    id: CategoryId,
    pub name: String,
    pub(crate) min_points: Option<f64>,
    pub(crate) max_points: Option<f64>,
    pub(crate) evaluations: ParentRefList<Evaluation, Category>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(CategoryId::new(), name)
    }

    pub fn with_id(id: CategoryId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            min_points: None,
            max_points: None,
            evaluations: ParentRefList::new(id),
        }
    }

    /// Builder: set score bounds. Checked when the category is adopted.
    pub fn with_bounds(mut self, min_points: Option<f64>, max_points: Option<f64>) -> Self {
        self.min_points = min_points;
        self.max_points = max_points;
        self
    }

    pub fn id(&self) -> CategoryId {
        self.id
    }

    pub fn min_points(&self) -> Option<f64> {
        self.min_points
    }

    pub fn max_points(&self) -> Option<f64> {
        self.max_points
    }

    /// Whether `points` lies within this category's bounds.
    pub fn admits(&self, points: f64) -> bool {
        within_bounds(points, self.min_points, self.max_points)
    }

    pub fn evaluations(&self) -> &ParentRefList<Evaluation, Category> {
        &self.evaluations
    }

    /// Link a draft evaluation to this draft category.
    pub fn push_evaluation(&mut self, evaluation: &mut Evaluation) -> Result<()> {
        push_child::<CategoryLink>(self, evaluation)
    }
}

pub(crate) fn within_bounds(points: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.map_or(true, |min| points >= min) && max.map_or(true, |max| points <= max)
}

impl Node for Category {
    type Id = CategoryId;

    fn id(&self) -> CategoryId {
        self.id
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A score given to a student in a category.
///
/// `points == None` means ungraded. Either back-reference may be unset.
#[derive(Debug, Clone)]
pub struct Evaluation {
    id: EvaluationId,
    pub points: Option<f64>,
    pub reason: Option<String>,
    pub(crate) student: Option<StudentId>,
    pub(crate) category: Option<CategoryId>,
}

impl Evaluation {
    pub fn new() -> Self {
        Self::with_id(EvaluationId::new())
    }

    pub fn with_id(id: EvaluationId) -> Self {
        Self {
            id,
            points: None,
            reason: None,
            student: None,
            category: None,
        }
    }

    pub fn with_points(mut self, points: f64) -> Self {
        self.points = Some(points);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn id(&self) -> EvaluationId {
        self.id
    }

    pub fn student(&self) -> Option<StudentId> {
        self.student
    }

    pub fn category(&self) -> Option<CategoryId> {
        self.category
    }

    pub fn has_parent(&self) -> bool {
        self.student.is_some() || self.category.is_some()
    }
}

impl Default for Evaluation {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for Evaluation {
    type Id = EvaluationId;

    fn id(&self) -> EvaluationId {
        self.id
    }
}

/// `"{category}: {points}b ({reason})"` rendering of an evaluation.
///
/// Ungraded evaluations show `?b`. A missing category or reason renders as
/// an empty string, so the parentheses are always present.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationDisplay<'a> {
    pub evaluation: &'a Evaluation,
    pub category: Option<&'a Category>,
}

impl fmt::Display for EvaluationDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let category = self.category.map_or("", |c| c.name.as_str());
        write!(f, "{category}: ")?;
        match self.evaluation.points {
            Some(points) => write!(f, "{points}b")?,
            None => write!(f, "?b")?,
        }
        write!(f, " ({})", self.evaluation.reason.as_deref().unwrap_or(""))
    }
}
