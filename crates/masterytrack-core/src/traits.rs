//! Store trait definitions.
//!
//! The engine reads curriculum structure through [`StructureReader`] and
//! keeps student records behind [`ProgressStore`]. Both are async traits
//! implemented by the `masterytrack-store` crate; tests provide their own
//! implementations where useful.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::EngineError;
use crate::model::{CurriculumProgressionSettings, Lesson, Level, LevelAssessmentCriterion, Module};
use crate::records::{StudentLessonProgress, StudentLevelAssessment, StudentModuleUnlock};

/// Read-only view of the curriculum tree.
///
/// Every method returns `NotFound` for unknown ids rather than defaulting
/// to empty collections.
#[async_trait]
pub trait StructureReader: Send + Sync {
    /// Progression settings for a curriculum.
    async fn settings(
        &self,
        curriculum_id: &str,
    ) -> Result<CurriculumProgressionSettings, EngineError>;

    /// Ordered levels of a curriculum.
    async fn levels(&self, curriculum_id: &str) -> Result<Vec<Level>, EngineError>;

    /// Ordered modules of a level.
    async fn modules_in_level(&self, level_id: &str) -> Result<Vec<Module>, EngineError>;

    /// Ordered lessons of a module, flattened across its sections.
    async fn lessons_in_module(&self, module_id: &str) -> Result<Vec<Lesson>, EngineError>;

    /// Ordered assessment criteria of a level.
    async fn criteria_for_level(
        &self,
        level_id: &str,
    ) -> Result<Vec<LevelAssessmentCriterion>, EngineError>;

    /// Owning curriculum of a module.
    async fn curriculum_of_module(&self, module_id: &str) -> Result<String, EngineError>;

    /// Owning curriculum of a level.
    async fn curriculum_of_level(&self, level_id: &str) -> Result<String, EngineError>;

    /// Owning module of a lesson.
    async fn module_of_lesson(&self, lesson_id: &str) -> Result<String, EngineError>;
}

/// Storage for student-keyed progress records.
///
/// Writes must be atomic per record; readers may observe a pre- or
/// post-update snapshot, never a partially-applied one.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Whether the store has seen this student (registered or graded).
    async fn student_exists(&self, student_id: &str) -> Result<bool, EngineError>;

    /// Make a student known to the store. Idempotent.
    async fn register_student(&self, student_id: &str) -> Result<(), EngineError>;

    /// The grading ledger entry for a student×lesson pair, if any.
    async fn lesson_progress(
        &self,
        student_id: &str,
        lesson_id: &str,
    ) -> Result<Option<StudentLessonProgress>, EngineError>;

    /// Upsert a grading ledger entry.
    async fn put_lesson_progress(&self, record: StudentLessonProgress)
        -> Result<(), EngineError>;

    /// The unlock record for a student×module pair, if evaluated yet.
    async fn module_unlock(
        &self,
        student_id: &str,
        module_id: &str,
    ) -> Result<Option<StudentModuleUnlock>, EngineError>;

    /// Upsert an unlock record.
    async fn put_module_unlock(&self, record: StudentModuleUnlock) -> Result<(), EngineError>;

    /// An assessment record by id, if any.
    async fn assessment(
        &self,
        assessment_id: Uuid,
    ) -> Result<Option<StudentLevelAssessment>, EngineError>;

    /// Upsert an assessment record.
    async fn put_assessment(&self, record: StudentLevelAssessment) -> Result<(), EngineError>;

    /// All assessment records for a student within a curriculum, in
    /// creation order.
    async fn assessments_for_student(
        &self,
        student_id: &str,
        curriculum_id: &str,
    ) -> Result<Vec<StudentLevelAssessment>, EngineError>;
}
