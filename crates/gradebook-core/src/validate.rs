//! Advisory checks on recorded scores.

use serde::Serialize;

use crate::gradebook::Gradebook;
use crate::ids::EvaluationId;

/// A non-fatal issue found by [`validate_bounds`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationWarning {
    /// The evaluation concerned.
    pub evaluation: EvaluationId,
    /// Warning message.
    pub message: String,
}

/// Report every registered score that lies outside its category's bounds.
pub fn validate_bounds(gradebook: &Gradebook) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for id in gradebook.evaluations().iter() {
        let Some(evaluation) = gradebook.evaluation(id) else {
            continue;
        };
        let (Some(points), Some(category)) = (
            evaluation.points,
            evaluation.category().and_then(|c| gradebook.category(c)),
        ) else {
            continue;
        };
        if !category.admits(points) {
            warnings.push(ValidationWarning {
                evaluation: id,
                message: format!(
                    "{points} points is outside [{}, {}] for category '{}'",
                    bound_label(category.min_points()),
                    bound_label(category.max_points()),
                    category.name
                ),
            });
        }
    }

    warnings
}

fn bound_label(bound: Option<f64>) -> String {
    bound.map_or_else(|| "-".to_string(), |b| b.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Evaluation};

    #[test]
    fn reports_out_of_range_scores() {
        let mut gradebook = Gradebook::default();
        let category = gradebook
            .create_category(Category::new("Quiz").with_bounds(None, Some(10.0)))
            .unwrap();
        let fine = gradebook
            .create_evaluation(Evaluation::new().with_points(7.0))
            .unwrap();
        let over = gradebook
            .create_evaluation(Evaluation::new().with_points(11.0))
            .unwrap();
        let ungraded = gradebook.create_evaluation(Evaluation::new()).unwrap();
        for evaluation in [fine, over, ungraded] {
            gradebook.category_add_evaluation(category, evaluation).unwrap();
        }

        let warnings = validate_bounds(&gradebook);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].evaluation, over);
        assert_eq!(
            warnings[0].message,
            "11 points is outside [-, 10] for category 'Quiz'"
        );
    }

    #[test]
    fn clean_gradebook_has_no_warnings() {
        assert!(validate_bounds(&Gradebook::default()).is_empty());
    }
}
