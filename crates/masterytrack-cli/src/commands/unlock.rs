//! The `masterytrack unlock` command.

use std::path::PathBuf;

use anyhow::Result;

use super::Workspace;

pub async fn execute(
    curriculum: PathBuf,
    state: PathBuf,
    student: String,
    module: String,
) -> Result<()> {
    let workspace = Workspace::open(&curriculum, &state)?;

    let unlock = workspace
        .engine
        .evaluate_module_unlock(&student, &module)
        .await?;
    workspace.save().await?;

    println!(
        "Module {} for {}: {}/{} stars ({:.1}%), threshold {}, {}",
        unlock.module_id,
        unlock.student_id,
        unlock.stars_earned,
        unlock.total_possible_stars,
        unlock.unlock_percentage,
        if unlock.threshold_met { "met" } else { "not met" },
        if unlock.is_unlocked { "UNLOCKED" } else { "locked" }
    );
    Ok(())
}
