//! Bulk load/save boundary.
//!
//! A [`GradebookSnapshot`] is a flat, serde-friendly copy of the registered
//! entities. Evaluations refer to their parents by id; loading re-links
//! them and rebuilds the registries through the normal cascades.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::GradebookConfig;
use crate::error::{GradebookError, Result};
use crate::gradebook::{Batch, Gradebook};
use crate::ids::{CategoryId, EvaluationId, StudentId};
use crate::links::Origin;
use crate::model::{Category, Evaluation, Student};
use crate::parent_sync::ParentSyncHost;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: StudentId,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_points: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_points: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub id: EvaluationId,
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub student: Option<StudentId>,
    #[serde(default)]
    pub category: Option<CategoryId>,
    /// Registered directly rather than through a parent.
    #[serde(default)]
    pub direct: bool,
}

/// The registered contents of a gradebook at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradebookSnapshot {
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub students: Vec<StudentRecord>,
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
    #[serde(default)]
    pub evaluations: Vec<EvaluationRecord>,
}

impl Default for GradebookSnapshot {
    fn default() -> Self {
        Self {
            saved_at: Utc::now(),
            students: Vec::new(),
            categories: Vec::new(),
            evaluations: Vec::new(),
        }
    }
}

impl GradebookSnapshot {
    /// Rebuild linked drafts from the records.
    ///
    /// Owner lists follow the order of `evaluations`.
    pub fn into_batch(self) -> Result<Batch> {
        let mut students: Vec<Student> = self
            .students
            .into_iter()
            .map(|r| Student::with_id(r.id, r.first_name, r.last_name))
            .collect();
        let mut categories: Vec<Category> = self
            .categories
            .into_iter()
            .map(|r| Category::with_id(r.id, r.name).with_bounds(r.min_points, r.max_points))
            .collect();
        let student_index: HashMap<StudentId, usize> = students
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id(), i))
            .collect();
        let category_index: HashMap<CategoryId, usize> = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id(), i))
            .collect();

        let mut evaluations = Vec::with_capacity(self.evaluations.len());
        for record in self.evaluations {
            let mut evaluation = Evaluation::with_id(record.id);
            evaluation.points = record.points;
            evaluation.reason = record.reason;

            if let Some(student) = record.student {
                let &index = student_index.get(&student).ok_or(
                    GradebookError::DanglingReference {
                        from: record.id.into(),
                        to: student.into(),
                    },
                )?;
                students[index].push_evaluation(&mut evaluation)?;
            }
            if let Some(category) = record.category {
                let &index = category_index.get(&category).ok_or(
                    GradebookError::DanglingReference {
                        from: record.id.into(),
                        to: category.into(),
                    },
                )?;
                categories[index].push_evaluation(&mut evaluation)?;
            }
            evaluations.push(evaluation);
        }

        Ok(Batch {
            students,
            categories,
            evaluations,
        })
    }
}

impl Gradebook {
    /// Build a gradebook from a snapshot.
    ///
    /// Students are registered first, which pulls in their evaluations and
    /// the categories those reference. Remaining categories and evaluations
    /// follow. The change journal starts empty.
    pub fn load(snapshot: GradebookSnapshot, config: GradebookConfig) -> Result<Self> {
        let student_ids: Vec<StudentId> = snapshot.students.iter().map(|s| s.id).collect();
        let category_ids: Vec<CategoryId> = snapshot.categories.iter().map(|c| c.id).collect();
        let evaluation_ids: Vec<(EvaluationId, bool)> = snapshot
            .evaluations
            .iter()
            .map(|e| (e.id, e.direct))
            .collect();

        let mut gradebook = Gradebook::new(config);
        gradebook.adopt(snapshot.into_batch()?)?;

        for student in student_ids {
            gradebook.register_student(student)?;
        }
        for category in category_ids {
            gradebook.register_category(category)?;
        }
        for (evaluation, direct) in evaluation_ids {
            if gradebook.evaluations().contains(&evaluation) {
                if direct {
                    ParentSyncHost::<Evaluation>::registry_mut(&mut gradebook).mark_direct(evaluation);
                }
                continue;
            }
            let origin = match gradebook.evaluation(evaluation) {
                Some(e) if e.has_parent() && !direct => Origin::Cascade,
                _ => Origin::Direct,
            };
            let at = gradebook.evaluations().len();
            ParentSyncHost::<Evaluation>::insert_item(&mut gradebook, at, evaluation, origin)?;
        }

        gradebook.take_events();
        tracing::info!(
            students = gradebook.students().len(),
            categories = gradebook.categories().len(),
            evaluations = gradebook.evaluations().len(),
            "gradebook loaded"
        );
        Ok(gradebook)
    }

    /// Copy the registered entities into a snapshot, in registry order.
    pub fn snapshot(&self) -> GradebookSnapshot {
        let students = self
            .students()
            .iter()
            .filter_map(|id| self.student(id))
            .map(|s| StudentRecord {
                id: s.id(),
                first_name: s.first_name.clone(),
                last_name: s.last_name.clone(),
            })
            .collect();
        let categories = self
            .categories()
            .iter()
            .filter_map(|id| self.category(id))
            .map(|c| CategoryRecord {
                id: c.id(),
                name: c.name.clone(),
                min_points: c.min_points(),
                max_points: c.max_points(),
            })
            .collect();
        let evaluations = self
            .evaluations()
            .iter()
            .filter_map(|id| self.evaluation(id))
            .map(|e| EvaluationRecord {
                id: e.id(),
                points: e.points,
                reason: e.reason.clone(),
                student: e.student(),
                category: e.category(),
                direct: self.evaluations().is_direct(&e.id()),
            })
            .collect();

        GradebookSnapshot {
            saved_at: Utc::now(),
            students,
            categories,
            evaluations,
        }
    }
}
