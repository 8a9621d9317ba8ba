//! Progress snapshot with JSON persistence.
//!
//! A snapshot is the full serialized progress state for one curriculum:
//! the student roster, the grading ledger, unlock records, and assessment
//! records. The CLI round-trips engine state through these files.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::records::{StudentLessonProgress, StudentLevelAssessment, StudentModuleUnlock};

/// Serialized progress state for one curriculum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Unique snapshot identifier.
    pub id: Uuid,
    /// When the snapshot was written.
    pub created_at: DateTime<Utc>,
    /// The curriculum these records belong to.
    pub curriculum_id: String,
    /// Known students, including those without any records yet.
    #[serde(default)]
    pub students: Vec<String>,
    #[serde(default)]
    pub lesson_progress: Vec<StudentLessonProgress>,
    #[serde(default)]
    pub module_unlocks: Vec<StudentModuleUnlock>,
    #[serde(default)]
    pub assessments: Vec<StudentLevelAssessment>,
}

impl ProgressSnapshot {
    /// An empty snapshot for a curriculum.
    pub fn empty(curriculum_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            curriculum_id: curriculum_id.into(),
            students: Vec::new(),
            lesson_progress: Vec::new(),
            module_unlocks: Vec::new(),
            assessments: Vec::new(),
        }
    }

    /// Save the snapshot as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize snapshot")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        Ok(())
    }

    /// Load a snapshot from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot from {}", path.display()))?;
        let snapshot: ProgressSnapshot =
            serde_json::from_str(&content).context("failed to parse snapshot JSON")?;
        Ok(snapshot)
    }
}
