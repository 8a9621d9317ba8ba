//! Curriculum structure types.
//!
//! These are the read-only structure inputs to the progression engine:
//! the Curriculum → Level → Module → Section → Lesson hierarchy, the
//! assessment criteria attached to each level, and the per-curriculum
//! progression settings.

use serde::{Deserialize, Serialize};

/// The highest star grade a lesson attempt can earn.
pub const MAX_STARS: u8 = 3;

/// A top-level instructional program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curriculum {
    /// Unique identifier for this curriculum.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of the program.
    #[serde(default)]
    pub description: String,
    /// Progression rules for every student enrolled in this curriculum.
    #[serde(default)]
    pub settings: CurriculumProgressionSettings,
    /// Ordered levels. Position in this vector is the level ordering.
    #[serde(default)]
    pub levels: Vec<Level>,
}

impl Curriculum {
    /// Iterate over every module in curriculum order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.levels.iter().flat_map(|l| l.modules.iter())
    }

    /// Iterate over every lesson in curriculum order.
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.modules().flat_map(|m| m.lessons())
    }
}

/// A stage of a curriculum, gated by an instructor-administered assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    /// Unique identifier for this level.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Criteria scored during the level-completion assessment.
    #[serde(default)]
    pub criteria: Vec<LevelAssessmentCriterion>,
    /// Ordered modules within this level.
    #[serde(default)]
    pub modules: Vec<Module>,
}

/// A weighted, independently-scored dimension of a level assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelAssessmentCriterion {
    /// Unique identifier, referenced by recorded criterion scores.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Position of this criterion on the score sheet. Unique within a level.
    pub sequence_order: u32,
    /// Relative weight. Weights need not sum to any fixed total.
    pub weight: f64,
    /// Maximum raw score an instructor can record.
    pub max_score: u32,
    /// Per-criterion floor; a score below this fails the assessment.
    pub min_passing_score: u32,
}

/// An unlockable group of lessons within a level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// Unique identifier for this module.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Ordered sections within this module.
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Module {
    /// Iterate over the module's lessons in section order.
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.sections.iter().flat_map(|s| s.lessons.iter())
    }

    /// Number of lessons across all sections.
    pub fn lesson_count(&self) -> usize {
        self.sections.iter().map(|s| s.lessons.len()).sum()
    }
}

/// A grouping of lessons within a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Unique identifier for this section.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Ordered lessons.
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// The gradable unit of a curriculum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    /// Unique identifier for this lesson.
    pub id: String,
    /// Human-readable name.
    pub name: String,
}

/// Per-curriculum configuration controlling every progression rule.
///
/// Created when a curriculum is published; identity is immutable, values
/// are not. Passed explicitly into every evaluator call so the engine
/// carries no ambient configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumProgressionSettings {
    /// Percentage of a module's possible stars required to unlock it,
    /// and the aggregate passing bar for level assessments.
    #[serde(default = "default_unlock_threshold")]
    pub unlock_threshold_percent: f64,
    /// When true, every graded lesson in a module must have at least one
    /// star before the module's threshold counts as met.
    #[serde(default)]
    pub require_min_one_star_per_lesson: bool,
    /// When true, level assessments may be requested without the prior
    /// levels' modules being unlocked.
    #[serde(default)]
    pub allow_cross_level_progression: bool,
    /// When false, a completed lesson grade is immutable and further
    /// grading attempts are rejected.
    #[serde(default = "default_true")]
    pub allow_lesson_retakes: bool,
    /// Telemetry only: accumulate reported time spent per lesson.
    #[serde(default)]
    pub track_time_spent: bool,
    /// Telemetry only: surface attempt counts to the UI.
    #[serde(default = "default_true")]
    pub track_attempts: bool,
}

fn default_unlock_threshold() -> f64 {
    70.0
}

fn default_true() -> bool {
    true
}

impl Default for CurriculumProgressionSettings {
    fn default() -> Self {
        Self {
            unlock_threshold_percent: default_unlock_threshold(),
            require_min_one_star_per_lesson: false,
            allow_cross_level_progression: false,
            allow_lesson_retakes: true,
            track_time_spent: false,
            track_attempts: true,
        }
    }
}
