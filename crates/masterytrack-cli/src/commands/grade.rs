//! The `masterytrack grade` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use masterytrack_core::records::GradeRequest;

use super::Workspace;

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    curriculum: PathBuf,
    state: PathBuf,
    student: Option<String>,
    lesson: Option<String>,
    stars: Option<u8>,
    instructor: Option<String>,
    notes: Option<String>,
    time_spent_secs: Option<u64>,
    batch: Option<PathBuf>,
) -> Result<()> {
    let workspace = Workspace::open(&curriculum, &state)?;

    if let Some(batch_path) = batch {
        let content = std::fs::read_to_string(&batch_path)
            .with_context(|| format!("failed to read batch file: {}", batch_path.display()))?;
        let requests: Vec<GradeRequest> =
            serde_json::from_str(&content).context("failed to parse batch JSON")?;

        let outcome = workspace.engine.record_grades_bulk(&requests).await;
        workspace.save().await?;

        println!(
            "Batch applied: {} succeeded, {} failed",
            outcome.succeeded.len(),
            outcome.failed.len()
        );
        for failure in &outcome.failed {
            println!(
                "  [{}] {}/{}: {}",
                failure.index, failure.student_id, failure.lesson_id, failure.error
            );
        }
        return Ok(());
    }

    let request = GradeRequest {
        student_id: student.context("--student is required without --batch")?,
        lesson_id: lesson.context("--lesson is required without --batch")?,
        stars_earned: stars.context("--stars is required without --batch")?,
        instructor_id: instructor.context("--instructor is required without --batch")?,
        notes,
        time_spent_secs,
    };

    let record = workspace.engine.record_grade(&request).await?;
    workspace.save().await?;

    println!(
        "Graded {} on {}: {} star(s), attempt {}",
        record.student_id,
        record.lesson_id,
        record.stars_earned.unwrap_or(0),
        record.attempt_count
    );
    Ok(())
}
