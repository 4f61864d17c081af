//! Consistency checks over a whole gradebook.
//!
//! [`check_invariants`] is what the tests and `gradebook check` use to
//! confirm that a settled gradebook is a consistent graph.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use serde::Serialize;

use crate::gradebook::Gradebook;
use crate::ids::{Collection, EntityId};

/// Which consistency rule was broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// A collection holds the same item twice.
    Unique,
    /// A collection holds an id the gradebook does not own.
    Present,
    /// `evaluation.category` and the category's list disagree.
    CategoryLink,
    /// `evaluation.student` and the student's list disagree.
    StudentLink,
    /// A registered evaluation points at an unregistered parent.
    ParentRegistered,
    /// A registered evaluation without parents was not added directly.
    OrphanCollected,
    /// A registered parent owns an unregistered evaluation.
    Flattened,
    /// A cascade guard is still held.
    Quiescent,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rule::Unique => "unique",
            Rule::Present => "present",
            Rule::CategoryLink => "category-link",
            Rule::StudentLink => "student-link",
            Rule::ParentRegistered => "parent-registered",
            Rule::OrphanCollected => "orphan-collected",
            Rule::Flattened => "flattened",
            Rule::Quiescent => "quiescent",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvariantViolation {
    pub rule: Rule,
    pub message: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule, self.message)
    }
}

/// Check every consistency rule. An empty result means the gradebook is
/// consistent.
pub fn check_invariants(gradebook: &Gradebook) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut violate = |rule: Rule, message: String| {
        violations.push(InvariantViolation { rule, message });
    };
    let pool = &gradebook.pool;

    check_unique(Collection::Students, gradebook.students().iter(), &mut violate);
    check_unique(Collection::Categories, gradebook.categories().iter(), &mut violate);
    check_unique(Collection::Evaluations, gradebook.evaluations().iter(), &mut violate);

    for id in gradebook.students().iter() {
        if !pool.students.contains_key(&id) {
            violate(Rule::Present, format!("students lists unknown student {id}"));
        }
    }
    for id in gradebook.categories().iter() {
        if !pool.categories.contains_key(&id) {
            violate(Rule::Present, format!("categories lists unknown category {id}"));
        }
    }

    for student in pool.students.values() {
        let list = student.evaluations();
        check_unique(list_collection(list.owner().into()), list.iter(), &mut violate);
        for id in list.iter() {
            match pool.evaluations.get(&id) {
                Some(evaluation) if evaluation.student() == Some(student.id()) => {}
                Some(evaluation) => violate(
                    Rule::StudentLink,
                    format!(
                        "student {} lists evaluation {id}, which points at {:?}",
                        student.id(),
                        evaluation.student()
                    ),
                ),
                None => violate(
                    Rule::Present,
                    format!("student {} lists unknown evaluation {id}", student.id()),
                ),
            }
            if gradebook.students().contains(&student.id())
                && !gradebook.evaluations().contains(&id)
            {
                violate(
                    Rule::Flattened,
                    format!("evaluation {id} of student {} is not registered", student.id()),
                );
            }
        }
    }

    for category in pool.categories.values() {
        let list = category.evaluations();
        check_unique(list_collection(list.owner().into()), list.iter(), &mut violate);
        for id in list.iter() {
            match pool.evaluations.get(&id) {
                Some(evaluation) if evaluation.category() == Some(category.id()) => {}
                Some(evaluation) => violate(
                    Rule::CategoryLink,
                    format!(
                        "category {} lists evaluation {id}, which points at {:?}",
                        category.id(),
                        evaluation.category()
                    ),
                ),
                None => violate(
                    Rule::Present,
                    format!("category {} lists unknown evaluation {id}", category.id()),
                ),
            }
            if gradebook.categories().contains(&category.id())
                && !gradebook.evaluations().contains(&id)
            {
                violate(
                    Rule::Flattened,
                    format!(
                        "evaluation {id} of category {} is not registered",
                        category.id()
                    ),
                );
            }
        }
    }

    for evaluation in pool.evaluations.values() {
        let id = evaluation.id();
        if let Some(student) = evaluation.student() {
            let listed = pool
                .students
                .get(&student)
                .is_some_and(|s| s.evaluations().contains(&id));
            if !listed {
                violate(
                    Rule::StudentLink,
                    format!("evaluation {id} points at student {student}, which does not list it"),
                );
            }
        }
        if let Some(category) = evaluation.category() {
            let listed = pool
                .categories
                .get(&category)
                .is_some_and(|c| c.evaluations().contains(&id));
            if !listed {
                violate(
                    Rule::CategoryLink,
                    format!(
                        "evaluation {id} points at category {category}, which does not list it"
                    ),
                );
            }
        }
    }

    for id in gradebook.evaluations().iter() {
        let Some(evaluation) = pool.evaluations.get(&id) else {
            violate(Rule::Present, format!("evaluations lists unknown evaluation {id}"));
            continue;
        };
        if let Some(student) = evaluation.student() {
            if !gradebook.students().contains(&student) {
                violate(
                    Rule::ParentRegistered,
                    format!("evaluation {id} points at unregistered student {student}"),
                );
            }
        }
        if let Some(category) = evaluation.category() {
            if !gradebook.categories().contains(&category) {
                violate(
                    Rule::ParentRegistered,
                    format!("evaluation {id} points at unregistered category {category}"),
                );
            }
        }
        if !evaluation.has_parent() && !gradebook.evaluations().is_direct(&id) {
            violate(
                Rule::OrphanCollected,
                format!("evaluation {id} has no parent and was not added directly"),
            );
        }
    }

    if !gradebook.is_quiescent() {
        violate(Rule::Quiescent, "a cascade guard is still held".into());
    }

    violations
}

fn list_collection(owner: EntityId) -> Collection {
    match owner {
        EntityId::Student(id) => Collection::StudentEvaluations(id),
        EntityId::Category(id) => Collection::CategoryEvaluations(id),
        EntityId::Evaluation(_) => Collection::Evaluations,
    }
}

fn check_unique<Id, F>(collection: Collection, items: impl Iterator<Item = Id>, violate: &mut F)
where
    Id: Copy + Eq + Hash + fmt::Display,
    F: FnMut(Rule, String),
{
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item) {
            violate(Rule::Unique, format!("{collection} contains {item} twice"));
        }
    }
}
