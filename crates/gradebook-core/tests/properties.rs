//! Mixed mutation sequences, checked for consistency after every step.

use gradebook_core::invariants::check_invariants;
use gradebook_core::{
    Batch, Category, CategoryId, Evaluation, EvaluationId, Gradebook, GradebookConfig,
    GradebookError, OnRemove, RemovalPolicy, Student, StudentId,
};
use proptest::prelude::*;
use proptest::sample::Index;

const STUDENTS: usize = 4;
const CATEGORIES: usize = 3;
const EVALUATIONS: usize = 12;

/// One public mutation. Entities are picked by their position in the
/// world's id lists, registry and list slots through an [`Index`] scaled to
/// the current length plus one, so past-the-end slots get tried too.
#[derive(Debug, Clone)]
enum Op {
    AddStudent(usize),
    InsertStudent(Index, usize),
    SetStudent(Index, usize),
    RemoveStudent(usize),
    RemoveStudentAt(Index),
    ClearStudents,

    AddCategory(usize),
    InsertCategory(Index, usize),
    SetCategory(Index, usize),
    RemoveCategory(usize),
    RemoveCategoryAt(Index),
    ClearCategories,

    AddEvaluation(usize),
    InsertEvaluation(Index, usize),
    SetEvaluationAt(Index, usize),
    RemoveEvaluation(usize),
    RemoveEvaluationAt(Index),
    ClearEvaluations,

    SetEvaluationStudent(usize, Option<usize>),
    SetEvaluationCategory(usize, Option<usize>),
    SetEvaluationPoints(usize, Option<i8>),

    StudentAddEvaluation(usize, usize),
    StudentInsertEvaluation(usize, Index, usize),
    StudentSetEvaluationAt(usize, Index, usize),
    StudentRemoveEvaluation(usize, usize),
    StudentRemoveEvaluationAt(usize, Index),
    StudentClearEvaluations(usize),

    CategoryAddEvaluation(usize, usize),
    CategoryInsertEvaluation(usize, Index, usize),
    CategorySetEvaluationAt(usize, Index, usize),
    CategoryRemoveEvaluation(usize, usize),
    CategoryRemoveEvaluationAt(usize, Index),
    CategoryClearEvaluations(usize),
}

fn student_ops() -> impl Strategy<Value = Op> {
    let s = 0..STUDENTS;
    prop_oneof![
        s.clone().prop_map(Op::AddStudent),
        (any::<Index>(), s.clone()).prop_map(|(at, s)| Op::InsertStudent(at, s)),
        (any::<Index>(), s.clone()).prop_map(|(at, s)| Op::SetStudent(at, s)),
        s.prop_map(Op::RemoveStudent),
        any::<Index>().prop_map(Op::RemoveStudentAt),
        Just(Op::ClearStudents),
    ]
}

fn category_ops() -> impl Strategy<Value = Op> {
    let c = 0..CATEGORIES;
    prop_oneof![
        c.clone().prop_map(Op::AddCategory),
        (any::<Index>(), c.clone()).prop_map(|(at, c)| Op::InsertCategory(at, c)),
        (any::<Index>(), c.clone()).prop_map(|(at, c)| Op::SetCategory(at, c)),
        c.prop_map(Op::RemoveCategory),
        any::<Index>().prop_map(Op::RemoveCategoryAt),
        Just(Op::ClearCategories),
    ]
}

fn evaluation_ops() -> impl Strategy<Value = Op> {
    let e = 0..EVALUATIONS;
    prop_oneof![
        1 => e.clone().prop_map(Op::AddEvaluation),
        1 => (any::<Index>(), e.clone()).prop_map(|(at, e)| Op::InsertEvaluation(at, e)),
        2 => (any::<Index>(), e.clone()).prop_map(|(at, e)| Op::SetEvaluationAt(at, e)),
        1 => e.clone().prop_map(Op::RemoveEvaluation),
        1 => any::<Index>().prop_map(Op::RemoveEvaluationAt),
        1 => Just(Op::ClearEvaluations),
        2 => (e.clone(), prop::option::of(0..STUDENTS))
            .prop_map(|(e, s)| Op::SetEvaluationStudent(e, s)),
        2 => (e.clone(), prop::option::of(0..CATEGORIES))
            .prop_map(|(e, c)| Op::SetEvaluationCategory(e, c)),
        1 => (e, prop::option::of(any::<i8>())).prop_map(|(e, p)| Op::SetEvaluationPoints(e, p)),
    ]
}

fn student_list_ops() -> impl Strategy<Value = Op> {
    let (s, e) = (0..STUDENTS, 0..EVALUATIONS);
    prop_oneof![
        (s.clone(), e.clone()).prop_map(|(s, e)| Op::StudentAddEvaluation(s, e)),
        (s.clone(), any::<Index>(), e.clone())
            .prop_map(|(s, at, e)| Op::StudentInsertEvaluation(s, at, e)),
        (s.clone(), any::<Index>(), e.clone())
            .prop_map(|(s, at, e)| Op::StudentSetEvaluationAt(s, at, e)),
        (s.clone(), e).prop_map(|(s, e)| Op::StudentRemoveEvaluation(s, e)),
        (s.clone(), any::<Index>()).prop_map(|(s, at)| Op::StudentRemoveEvaluationAt(s, at)),
        s.prop_map(Op::StudentClearEvaluations),
    ]
}

fn category_list_ops() -> impl Strategy<Value = Op> {
    let (c, e) = (0..CATEGORIES, 0..EVALUATIONS);
    prop_oneof![
        (c.clone(), e.clone()).prop_map(|(c, e)| Op::CategoryAddEvaluation(c, e)),
        (c.clone(), any::<Index>(), e.clone())
            .prop_map(|(c, at, e)| Op::CategoryInsertEvaluation(c, at, e)),
        (c.clone(), any::<Index>(), e.clone())
            .prop_map(|(c, at, e)| Op::CategorySetEvaluationAt(c, at, e)),
        (c.clone(), e).prop_map(|(c, e)| Op::CategoryRemoveEvaluation(c, e)),
        (c.clone(), any::<Index>()).prop_map(|(c, at)| Op::CategoryRemoveEvaluationAt(c, at)),
        c.prop_map(Op::CategoryClearEvaluations),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => student_ops(),
        1 => category_ops(),
        2 => evaluation_ops(),
        1 => student_list_ops(),
        1 => category_list_ops(),
    ]
}

struct World {
    gradebook: Gradebook,
    students: Vec<StudentId>,
    categories: Vec<CategoryId>,
    evaluations: Vec<EvaluationId>,
}

impl World {
    /// Every entity starts detached. Two thirds of the evaluations are drafts
    /// owned by a student and half of those belong to a category as well, so
    /// inserts and replacements see parented values from the first step.
    fn new(config: GradebookConfig) -> Self {
        let mut students: Vec<Student> = (0..STUDENTS)
            .map(|i| Student::new(format!("S{i}"), "Test"))
            .collect();
        let mut categories: Vec<Category> = (0..CATEGORIES)
            .map(|i| Category::new(format!("C{i}")))
            .collect();
        let mut evaluations = Vec::with_capacity(EVALUATIONS);
        for i in 0..EVALUATIONS {
            let mut evaluation = Evaluation::new().with_points(i as f64);
            if i % 3 != 0 {
                students[i % STUDENTS]
                    .push_evaluation(&mut evaluation)
                    .unwrap();
            }
            if i % 3 == 2 {
                categories[i % CATEGORIES]
                    .push_evaluation(&mut evaluation)
                    .unwrap();
            }
            evaluations.push(evaluation);
        }

        let ids: (Vec<StudentId>, Vec<CategoryId>, Vec<EvaluationId>) = (
            students.iter().map(Student::id).collect(),
            categories.iter().map(Category::id).collect(),
            evaluations.iter().map(Evaluation::id).collect(),
        );
        let mut gradebook = Gradebook::new(config);
        gradebook
            .adopt(Batch {
                students,
                categories,
                evaluations,
            })
            .unwrap();
        Self {
            gradebook,
            students: ids.0,
            categories: ids.1,
            evaluations: ids.2,
        }
    }

    /// Everything observable about the graph, for before/after comparison.
    fn fingerprint(&self) -> Vec<String> {
        let gb = &self.gradebook;
        let mut lines = vec![
            format!("students {:?}", gb.students().iter().collect::<Vec<_>>()),
            format!("categories {:?}", gb.categories().iter().collect::<Vec<_>>()),
            format!("evaluations {:?}", gb.evaluations().iter().collect::<Vec<_>>()),
        ];
        for &id in &self.students {
            lines.push(format!("{id} {:?}", gb.student(id).unwrap().evaluations().to_vec()));
        }
        for &id in &self.categories {
            lines.push(format!("{id} {:?}", gb.category(id).unwrap().evaluations().to_vec()));
        }
        for &id in &self.evaluations {
            let e = gb.evaluation(id).unwrap();
            lines.push(format!(
                "{id} {:?} {:?} {:?} {}",
                e.student(),
                e.category(),
                e.points,
                gb.evaluations().is_direct(&id)
            ));
        }
        lines
    }

    fn student_len(&self, s: usize) -> usize {
        self.gradebook
            .student(self.students[s])
            .map_or(0, |student| student.evaluations().len())
    }

    fn category_len(&self, c: usize) -> usize {
        self.gradebook
            .category(self.categories[c])
            .map_or(0, |category| category.evaluations().len())
    }

    fn apply(&mut self, op: &Op) -> Result<(), GradebookError> {
        let students = self.gradebook.students().len() + 1;
        let categories = self.gradebook.categories().len() + 1;
        let evaluations = self.gradebook.evaluations().len() + 1;
        let (s, c, e) = (&self.students, &self.categories, &self.evaluations);

        match op.clone() {
            Op::AddStudent(i) => self.gradebook.add_student(s[i]),
            Op::InsertStudent(at, i) => self.gradebook.insert_student(at.index(students), s[i]),
            Op::SetStudent(at, i) => self.gradebook.set_student(at.index(students), s[i]),
            Op::RemoveStudent(i) => self.gradebook.remove_student(s[i]).map(drop),
            Op::RemoveStudentAt(at) => self.gradebook.remove_student_at(at.index(students)),
            Op::ClearStudents => self.gradebook.clear_students(),

            Op::AddCategory(i) => self.gradebook.add_category(c[i]),
            Op::InsertCategory(at, i) => {
                self.gradebook.insert_category(at.index(categories), c[i])
            }
            Op::SetCategory(at, i) => self.gradebook.set_category(at.index(categories), c[i]),
            Op::RemoveCategory(i) => self.gradebook.remove_category(c[i]).map(drop),
            Op::RemoveCategoryAt(at) => self.gradebook.remove_category_at(at.index(categories)),
            Op::ClearCategories => self.gradebook.clear_categories(),

            Op::AddEvaluation(i) => self.gradebook.add_evaluation(e[i]),
            Op::InsertEvaluation(at, i) => {
                self.gradebook.insert_evaluation(at.index(evaluations), e[i])
            }
            Op::SetEvaluationAt(at, i) => {
                self.gradebook.set_evaluation_at(at.index(evaluations), e[i])
            }
            Op::RemoveEvaluation(i) => self.gradebook.remove_evaluation(e[i]).map(drop),
            Op::RemoveEvaluationAt(at) => {
                self.gradebook.remove_evaluation_at(at.index(evaluations))
            }
            Op::ClearEvaluations => self.gradebook.clear_evaluations(),

            Op::SetEvaluationStudent(i, owner) => self
                .gradebook
                .set_evaluation_student(e[i], owner.map(|j| s[j])),
            Op::SetEvaluationCategory(i, owner) => self
                .gradebook
                .set_evaluation_category(e[i], owner.map(|j| c[j])),
            Op::SetEvaluationPoints(i, points) => self
                .gradebook
                .set_evaluation_points(e[i], points.map(f64::from)),

            Op::StudentAddEvaluation(j, i) => self.gradebook.student_add_evaluation(s[j], e[i]),
            Op::StudentInsertEvaluation(j, at, i) => {
                let at = at.index(self.student_len(j) + 1);
                self.gradebook.student_insert_evaluation(s[j], at, e[i])
            }
            Op::StudentSetEvaluationAt(j, at, i) => {
                let at = at.index(self.student_len(j) + 1);
                self.gradebook.student_set_evaluation_at(s[j], at, e[i])
            }
            Op::StudentRemoveEvaluation(j, i) => {
                self.gradebook.student_remove_evaluation(s[j], e[i]).map(drop)
            }
            Op::StudentRemoveEvaluationAt(j, at) => {
                let at = at.index(self.student_len(j) + 1);
                self.gradebook.student_remove_evaluation_at(s[j], at)
            }
            Op::StudentClearEvaluations(j) => self.gradebook.student_clear_evaluations(s[j]),

            Op::CategoryAddEvaluation(j, i) => self.gradebook.category_add_evaluation(c[j], e[i]),
            Op::CategoryInsertEvaluation(j, at, i) => {
                let at = at.index(self.category_len(j) + 1);
                self.gradebook.category_insert_evaluation(c[j], at, e[i])
            }
            Op::CategorySetEvaluationAt(j, at, i) => {
                let at = at.index(self.category_len(j) + 1);
                self.gradebook.category_set_evaluation_at(c[j], at, e[i])
            }
            Op::CategoryRemoveEvaluation(j, i) => {
                self.gradebook.category_remove_evaluation(c[j], e[i]).map(drop)
            }
            Op::CategoryRemoveEvaluationAt(j, at) => {
                let at = at.index(self.category_len(j) + 1);
                self.gradebook.category_remove_evaluation_at(c[j], at)
            }
            Op::CategoryClearEvaluations(j) => self.gradebook.category_clear_evaluations(c[j]),
        }
    }
}

fn run(config: GradebookConfig, ops: &[Op]) -> Result<(), TestCaseError> {
    let mut world = World::new(config);
    for (step, op) in ops.iter().enumerate() {
        let before = world.fingerprint();
        let outcome = world.apply(op);

        let violations = check_invariants(&world.gradebook);
        prop_assert!(
            violations.is_empty(),
            "step {step} ({op:?}): {violations:#?}"
        );
        prop_assert!(world.gradebook.is_quiescent(), "step {step} ({op:?})");
        if outcome.is_err() {
            prop_assert_eq!(
                before,
                world.fingerprint(),
                "step {} ({:?}): rejected call changed state ({:?})",
                step,
                op,
                outcome
            );
        }
    }
    Ok(())
}

fn removal(on_remove: OnRemove) -> GradebookConfig {
    GradebookConfig {
        removal: RemovalPolicy {
            students: on_remove,
            categories: on_remove,
        },
        ..GradebookConfig::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn random_sequences_stay_consistent(ops in prop::collection::vec(op(), 1..200)) {
        run(GradebookConfig::default(), &ops)?;
    }

    #[test]
    fn random_sequences_stay_consistent_when_detaching(
        ops in prop::collection::vec(op(), 1..200)
    ) {
        run(removal(OnRemove::Detach), &ops)?;
    }

    #[test]
    fn random_sequences_stay_consistent_when_deleting(
        ops in prop::collection::vec(op(), 1..200)
    ) {
        run(removal(OnRemove::Delete), &ops)?;
    }
}

#[test]
fn long_chains_terminate() {
    let mut gradebook = Gradebook::default();
    let student = gradebook.create_student(Student::new("Long", "Chain")).unwrap();
    let categories: Vec<CategoryId> = (0..50)
        .map(|i| gradebook.create_category(Category::new(format!("C{i}"))).unwrap())
        .collect();
    for &category in &categories {
        let evaluation = gradebook.create_evaluation(Evaluation::new()).unwrap();
        gradebook.category_add_evaluation(category, evaluation).unwrap();
        gradebook.set_evaluation_student(evaluation, Some(student)).unwrap();
    }
    assert_eq!(gradebook.evaluations().len(), 50);
    assert_eq!(gradebook.categories().len(), 50);

    gradebook.remove_student(student).unwrap();
    assert!(gradebook.evaluations().is_empty());
    assert!(gradebook.is_quiescent());
    assert!(check_invariants(&gradebook).is_empty());
}
