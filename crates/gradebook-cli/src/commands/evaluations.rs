//! The `gradebook evaluations` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(data: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let gradebook = super::open(&data, config)?;

    for id in gradebook.evaluations().iter() {
        let owner = gradebook
            .evaluation(id)
            .and_then(|e| e.student())
            .and_then(|s| gradebook.student(s))
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{owner:<24} {}", gradebook.display_evaluation(id)?);
    }

    Ok(())
}
