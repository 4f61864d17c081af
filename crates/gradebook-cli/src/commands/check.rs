//! The `gradebook check` command.

use std::path::PathBuf;

use anyhow::Result;

use gradebook_core::invariants::check_invariants;
use gradebook_core::validate::validate_bounds;

pub fn execute(data: PathBuf, config: Option<PathBuf>, strict: bool) -> Result<()> {
    let gradebook = super::open(&data, config)?;

    println!(
        "Gradebook: {} students, {} categories, {} evaluations",
        gradebook.students().len(),
        gradebook.categories().len(),
        gradebook.evaluations().len()
    );

    let violations = check_invariants(&gradebook);
    for v in &violations {
        println!("  ERROR: {v}");
    }

    let warnings = validate_bounds(&gradebook);
    for w in &warnings {
        println!("  [{}] WARNING: {}", w.evaluation, w.message);
    }

    if !violations.is_empty() {
        anyhow::bail!("{} consistency violation(s) found", violations.len());
    }

    if warnings.is_empty() {
        println!("All links consistent.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
        if strict {
            anyhow::bail!("scores outside category bounds");
        }
    }

    Ok(())
}
