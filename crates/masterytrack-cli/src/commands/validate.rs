//! The `masterytrack validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(curriculum_path: PathBuf) -> Result<()> {
    let curricula = if curriculum_path.is_dir() {
        masterytrack_core::parser::load_curriculum_directory(&curriculum_path)?
    } else {
        vec![masterytrack_core::parser::parse_curriculum(&curriculum_path)?]
    };

    let mut total_warnings = 0;

    for curriculum in &curricula {
        println!(
            "Curriculum: {} ({} levels, {} lessons)",
            curriculum.name,
            curriculum.levels.len(),
            curriculum.lessons().count()
        );

        let warnings = masterytrack_core::parser::validate_curriculum(curriculum);
        for w in &warnings {
            let prefix = w
                .entity_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All curricula valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
