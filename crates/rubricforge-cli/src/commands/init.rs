//! The `rubricforge init` command.

use std::path::Path;

use anyhow::{Context, Result};

use rubricforge_core::model::Domain;
use rubricforge_core::parser::builtin_rubric_source;
use rubricforge_probes::config::SAMPLE_CONFIG;

fn write_new(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

pub fn execute() -> Result<()> {
    write_new(Path::new("rubricforge.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("rubrics")?;
    for domain in Domain::ALL {
        let path = Path::new("rubrics").join(format!("{domain}.toml"));
        write_new(&path, builtin_rubric_source(domain))?;
    }

    println!("\nNext steps:");
    println!("  1. Point [rubrics] in rubricforge.toml at the files you edit");
    println!("  2. Run: rubricforge validate --rubric rubrics/requirement.toml");
    println!("  3. Run: rubricforge requirement 需求说明.md");

    Ok(())
}
