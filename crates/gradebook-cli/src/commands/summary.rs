//! The `gradebook summary` command.

use std::path::PathBuf;

use anyhow::Result;

use gradebook_core::summary::Summary;

pub fn execute(data: PathBuf, config: Option<PathBuf>, format: String) -> Result<()> {
    let gradebook = super::open(&data, config)?;
    let summary = gradebook.summary();

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        "text" => print_tables(&summary),
        other => anyhow::bail!("unknown format: {other} (expected 'text' or 'json')"),
    }

    Ok(())
}

fn print_tables(summary: &Summary) {
    use comfy_table::{Cell, Table};

    let mut students = Table::new();
    students.set_header(vec!["Student", "Graded", "Ungraded", "Total"]);
    for s in &summary.students {
        students.add_row(vec![
            Cell::new(&s.name),
            Cell::new(s.graded),
            Cell::new(s.ungraded),
            Cell::new(format!("{:.1}", s.total_points)),
        ]);
    }

    let mut categories = Table::new();
    categories.set_header(vec!["Category", "Graded", "Ungraded", "Average"]);
    for c in &summary.categories {
        categories.add_row(vec![
            Cell::new(&c.name),
            Cell::new(c.graded),
            Cell::new(c.ungraded),
            Cell::new(
                c.average
                    .map(|avg| format!("{avg:.2}"))
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }

    println!("{students}");
    println!("\n{categories}");
    println!(
        "\n{} of {} evaluations graded",
        summary.graded, summary.evaluations
    );
}
