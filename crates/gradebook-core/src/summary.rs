//! Per-student and per-category totals.

use serde::{Deserialize, Serialize};

use crate::gradebook::Gradebook;
use crate::ids::{CategoryId, StudentId};
use crate::model::Evaluation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub id: StudentId,
    pub name: String,
    pub graded: usize,
    pub ungraded: usize,
    pub total_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
    pub graded: usize,
    pub ungraded: usize,
    /// Mean of graded scores, `None` when nothing is graded.
    pub average: Option<f64>,
}

/// Totals over the registered entities, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub students: Vec<StudentSummary>,
    pub categories: Vec<CategorySummary>,
    pub evaluations: usize,
    pub graded: usize,
}

struct Tally {
    graded: usize,
    ungraded: usize,
    total: f64,
}

fn tally<'a>(evaluations: impl Iterator<Item = &'a Evaluation>) -> Tally {
    let mut tally = Tally {
        graded: 0,
        ungraded: 0,
        total: 0.0,
    };
    for evaluation in evaluations {
        match evaluation.points {
            Some(points) => {
                tally.graded += 1;
                tally.total += points;
            }
            None => tally.ungraded += 1,
        }
    }
    tally
}

impl Gradebook {
    pub fn summary(&self) -> Summary {
        let students = self
            .students()
            .iter()
            .filter_map(|id| self.student(id))
            .map(|student| {
                let tally = tally(
                    student
                        .evaluations()
                        .iter()
                        .filter_map(|id| self.evaluation(id)),
                );
                StudentSummary {
                    id: student.id(),
                    name: student.to_string(),
                    graded: tally.graded,
                    ungraded: tally.ungraded,
                    total_points: tally.total,
                }
            })
            .collect();

        let categories = self
            .categories()
            .iter()
            .filter_map(|id| self.category(id))
            .map(|category| {
                let tally = tally(
                    category
                        .evaluations()
                        .iter()
                        .filter_map(|id| self.evaluation(id)),
                );
                CategorySummary {
                    id: category.id(),
                    name: category.name.clone(),
                    graded: tally.graded,
                    ungraded: tally.ungraded,
                    average: (tally.graded > 0).then(|| tally.total / tally.graded as f64),
                }
            })
            .collect();

        let overall = tally(self.evaluations().iter().filter_map(|id| self.evaluation(id)));
        Summary {
            students,
            categories,
            evaluations: overall.graded + overall.ungraded,
            graded: overall.graded,
        }
    }
}
