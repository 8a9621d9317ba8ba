//! The `masterytrack summary` command.

use std::path::PathBuf;

use anyhow::Result;

use masterytrack_core::summary::ProgressionSummary;

use super::Workspace;

pub async fn execute(
    curriculum: PathBuf,
    state: PathBuf,
    student: String,
    format: String,
) -> Result<()> {
    let workspace = Workspace::open(&curriculum, &state)?;

    let summary = workspace
        .engine
        .summarize(&student, &workspace.curriculum.id)
        .await?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        "markdown" | "md" => println!("{}", summary.to_markdown()),
        _ => print_table(&summary),
    }

    Ok(())
}

fn print_table(summary: &ProgressionSummary) {
    use comfy_table::{Cell, Table};

    println!(
        "Student {} in curriculum {} ({:.1}% complete)",
        summary.student_id, summary.curriculum_id, summary.progress_percentage
    );

    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![
        Cell::new("Lessons completed"),
        Cell::new(format!(
            "{}/{}",
            summary.completed_lessons, summary.total_lessons
        )),
    ]);
    table.add_row(vec![
        Cell::new("Lessons graded"),
        Cell::new(summary.graded_lessons),
    ]);
    table.add_row(vec![
        Cell::new("Average stars"),
        Cell::new(format!("{:.2}", summary.average_stars)),
    ]);
    table.add_row(vec![
        Cell::new("Modules unlocked"),
        Cell::new(format!(
            "{}/{}",
            summary.unlocked_modules, summary.total_modules
        )),
    ]);
    table.add_row(vec![
        Cell::new("Current level"),
        Cell::new(summary.current_level_id.as_deref().unwrap_or("-")),
    ]);
    table.add_row(vec![
        Cell::new("Current module"),
        Cell::new(summary.current_module_id.as_deref().unwrap_or("-")),
    ]);

    println!("{table}");

    if !summary.open_assessments.is_empty() {
        println!("\nOpen assessments:");
        for a in &summary.open_assessments {
            println!("  {} ({}): {}", a.id, a.level_id, a.status);
        }
    }
}
