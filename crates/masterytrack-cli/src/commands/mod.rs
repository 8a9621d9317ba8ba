//! CLI subcommand implementations.

pub mod assess;
pub mod enroll;
pub mod grade;
pub mod init;
pub mod summary;
pub mod unlock;
pub mod validate;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use masterytrack_core::engine::ProgressionEngine;
use masterytrack_core::model::Curriculum;
use masterytrack_core::parser::parse_curriculum;
use masterytrack_core::snapshot::ProgressSnapshot;
use masterytrack_core::traits::ProgressStore;
use masterytrack_store::{InMemoryProgressStore, InMemoryStructure};

/// A curriculum plus its progress state, wired into an engine.
///
/// Commands load the state file, run engine operations, and write the
/// updated snapshot back.
pub(crate) struct Workspace {
    pub curriculum: Curriculum,
    pub engine: ProgressionEngine,
    pub store: Arc<InMemoryProgressStore>,
    state_path: PathBuf,
}

impl Workspace {
    /// Load a curriculum and its progress snapshot. A missing snapshot
    /// file starts empty.
    pub fn open(curriculum_path: &Path, state_path: &Path) -> Result<Self> {
        let curriculum = parse_curriculum(curriculum_path)?;

        let snapshot = if state_path.exists() {
            let snapshot = ProgressSnapshot::load_json(state_path)?;
            if snapshot.curriculum_id != curriculum.id {
                anyhow::bail!(
                    "progress file {} belongs to curriculum '{}', not '{}'",
                    state_path.display(),
                    snapshot.curriculum_id,
                    curriculum.id
                );
            }
            snapshot
        } else {
            ProgressSnapshot::empty(&curriculum.id)
        };

        let store = Arc::new(InMemoryProgressStore::from_snapshot(&snapshot));
        let structure = Arc::new(InMemoryStructure::new(curriculum.clone()));
        let engine = ProgressionEngine::new(structure, Arc::clone(&store) as Arc<dyn ProgressStore>);

        Ok(Self {
            curriculum,
            engine,
            store,
            state_path: state_path.to_path_buf(),
        })
    }

    /// Persist the current progress state back to the snapshot file.
    pub async fn save(&self) -> Result<()> {
        let snapshot = self.store.to_snapshot(&self.curriculum.id).await;
        snapshot
            .save_json(&self.state_path)
            .with_context(|| format!("failed to save {}", self.state_path.display()))
    }
}
