use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use gradebook_core::{Batch, Category, Evaluation, Gradebook, Student, StudentId};

fn bench_registration(c: &mut Criterion) {
    let mut group = c.benchmark_group("registration");

    for n in [10usize, 100, 1000] {
        group.bench_function(format!("add_student_{n}_evaluations"), |b| {
            b.iter_batched(
                || student_with_evaluations(n),
                |(mut gradebook, student)| {
                    gradebook.add_student(student).unwrap();
                    black_box(gradebook.evaluations().len())
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.bench_function("remove_student_100_evaluations", |b| {
        b.iter_batched(
            || {
                let (mut gradebook, student) = student_with_evaluations(100);
                gradebook.add_student(student).unwrap();
                (gradebook, student)
            },
            |(mut gradebook, student)| {
                gradebook.remove_student(student).unwrap();
                black_box(gradebook.evaluations().len())
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_setters(c: &mut Criterion) {
    let mut group = c.benchmark_group("setters");

    let mut gradebook = Gradebook::default();
    let first = gradebook.create_student(Student::new("A", "One")).unwrap();
    let second = gradebook.create_student(Student::new("B", "Two")).unwrap();
    let category = gradebook.create_category(Category::new("Quiz")).unwrap();
    gradebook.add_student(first).unwrap();
    gradebook.add_student(second).unwrap();
    let evaluation = gradebook.create_evaluation(Evaluation::new()).unwrap();
    gradebook.category_add_evaluation(category, evaluation).unwrap();
    gradebook.set_evaluation_student(evaluation, Some(first)).unwrap();

    group.bench_function("move_between_students", |b| {
        b.iter(|| {
            gradebook
                .set_evaluation_student(black_box(evaluation), Some(second))
                .unwrap();
            gradebook
                .set_evaluation_student(black_box(evaluation), Some(first))
                .unwrap();
            gradebook.take_events();
        })
    });

    group.bench_function("detach_and_reattach_category", |b| {
        b.iter(|| {
            gradebook
                .set_evaluation_category(black_box(evaluation), None)
                .unwrap();
            gradebook
                .set_evaluation_category(black_box(evaluation), Some(category))
                .unwrap();
            gradebook.take_events();
        })
    });

    group.finish();
}

fn student_with_evaluations(n: usize) -> (Gradebook, StudentId) {
    let mut student = Student::new("Bench", "Student");
    let mut batch = Batch::new();
    for i in 0..n {
        let mut evaluation = Evaluation::new().with_points(i as f64);
        student.push_evaluation(&mut evaluation).unwrap();
        batch = batch.with_evaluation(evaluation);
    }
    let id = student.id();
    let mut gradebook = Gradebook::default();
    gradebook.adopt(batch.with_student(student)).unwrap();
    (gradebook, id)
}

criterion_group!(benches, bench_registration, bench_setters);
criterion_main!(benches);
