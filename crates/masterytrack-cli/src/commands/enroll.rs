//! The `masterytrack enroll` command.

use std::path::PathBuf;

use anyhow::Result;

use super::Workspace;

pub async fn execute(curriculum: PathBuf, state: PathBuf, student: String) -> Result<()> {
    let workspace = Workspace::open(&curriculum, &state)?;

    use masterytrack_core::traits::ProgressStore;
    workspace.store.register_student(&student).await?;
    workspace.save().await?;

    println!(
        "Enrolled {student} in {} ({})",
        workspace.curriculum.name, workspace.curriculum.id
    );
    Ok(())
}
