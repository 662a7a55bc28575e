//! The `rubricforge validate` command.

use std::path::PathBuf;

use anyhow::Result;

use rubricforge_core::model::Domain;
use rubricforge_core::parser::{builtin_rubric, parse_rubric, validate_rubric};
use rubricforge_core::rubric::Rubric;

pub fn execute(rubric_path: Option<PathBuf>, domain: Option<Domain>) -> Result<()> {
    let rubrics: Vec<Rubric> = match (rubric_path, domain) {
        (Some(path), _) => vec![parse_rubric(&path)?],
        (None, Some(domain)) => vec![builtin_rubric(domain)?],
        (None, None) => Domain::ALL
            .iter()
            .map(|d| builtin_rubric(*d))
            .collect::<Result<_>>()?,
    };

    let mut total_warnings = 0;

    for rubric in &rubrics {
        println!(
            "Rubric: {} ({} dimensions, max {})",
            rubric.title,
            rubric.dimensions.len(),
            rubric.max_total_score()
        );

        let warnings = validate_rubric(rubric);
        for w in &warnings {
            let prefix = w
                .dimension
                .as_ref()
                .map(|key| format!("  [{key}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All rubrics valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
