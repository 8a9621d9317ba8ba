//! Central progression engine.
//!
//! Coordinates the grading ledger, the module unlock evaluator, the level
//! assessment workflow, and the summary aggregator over the store traits.
//! Mutations are serialized per (student, curriculum) through an internal
//! lock map; reads go straight to the store and may observe a pre- or
//! post-update snapshot, never a partial one.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{EngineError, EntityKind};
use crate::model::CurriculumProgressionSettings;
use crate::records::{
    AssessmentStatus, BulkGradeFailure, BulkGradeOutcome, GradeRequest, StudentLessonProgress,
    StudentLevelAssessment, StudentModuleUnlock,
};
use crate::scoring;
use crate::summary::{build_summary, ProgressionSummary};
use crate::traits::{ProgressStore, StructureReader};

/// The progression engine.
pub struct ProgressionEngine {
    structure: Arc<dyn StructureReader>,
    store: Arc<dyn ProgressStore>,
    locks: Mutex<HashMap<(String, String), Arc<Mutex<()>>>>,
}

impl ProgressionEngine {
    pub fn new(structure: Arc<dyn StructureReader>, store: Arc<dyn ProgressStore>) -> Self {
        Self {
            structure,
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The single-writer lock for a (student, curriculum) pair.
    async fn student_lock(&self, student_id: &str, curriculum_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry((student_id.to_string(), curriculum_id.to_string()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Record a star grade for a student×lesson pair.
    ///
    /// Creates the ledger entry on the first grading event; rejects with
    /// `LockedRecord` when the lesson is already completed and the
    /// curriculum disallows retakes. Grading is the only event that
    /// invalidates unlock state, so the owning module is re-evaluated
    /// before this returns.
    pub async fn record_grade(
        &self,
        request: &GradeRequest,
    ) -> Result<StudentLessonProgress, EngineError> {
        scoring::validate_star_grade(request.stars_earned)?;

        let module_id = self.structure.module_of_lesson(&request.lesson_id).await?;
        let curriculum_id = self.structure.curriculum_of_module(&module_id).await?;
        let settings = self.structure.settings(&curriculum_id).await?;

        let lock = self.student_lock(&request.student_id, &curriculum_id).await;
        let _guard = lock.lock().await;

        let existing = self
            .store
            .lesson_progress(&request.student_id, &request.lesson_id)
            .await?;

        if let Some(prior) = &existing {
            if prior.is_completed && !settings.allow_lesson_retakes {
                return Err(EngineError::LockedRecord {
                    student_id: request.student_id.clone(),
                    lesson_id: request.lesson_id.clone(),
                    current: Box::new(prior.clone()),
                });
            }
        }

        let mut record = existing.unwrap_or_else(|| {
            StudentLessonProgress::new(&request.student_id, &request.lesson_id)
        });
        record.attempt_count += 1;
        record.stars_earned = Some(request.stars_earned);
        record.is_completed = true;
        record.last_attempt_date = Some(Utc::now());
        record.graded_by_instructor_id = Some(request.instructor_id.clone());
        if request.notes.is_some() {
            record.notes = request.notes.clone();
        }
        if settings.track_time_spent {
            record.time_spent_secs += request.time_spent_secs.unwrap_or(0);
        }

        self.store.register_student(&request.student_id).await?;
        self.store.put_lesson_progress(record.clone()).await?;

        let unlock = self
            .refresh_module_unlock(&request.student_id, &module_id, &settings)
            .await?;
        tracing::debug!(
            student = %request.student_id,
            lesson = %request.lesson_id,
            stars = request.stars_earned,
            module = %module_id,
            unlocked = unlock.is_unlocked,
            "grade recorded"
        );

        Ok(record)
    }

    /// Apply an ordered batch of grades, each item as its own
    /// transaction. A failure never rolls back earlier successes.
    pub async fn record_grades_bulk(&self, batch: &[GradeRequest]) -> BulkGradeOutcome {
        let mut outcome = BulkGradeOutcome::default();

        for (index, request) in batch.iter().enumerate() {
            match self.record_grade(request).await {
                Ok(record) => outcome.succeeded.push(record),
                Err(e) => {
                    tracing::warn!(
                        student = %request.student_id,
                        lesson = %request.lesson_id,
                        "bulk grade item {index} rejected: {e}"
                    );
                    outcome.failed.push(BulkGradeFailure {
                        index,
                        student_id: request.student_id.clone(),
                        lesson_id: request.lesson_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        outcome
    }

    /// Evaluate (and persist) a module's unlock state for a student.
    pub async fn evaluate_module_unlock(
        &self,
        student_id: &str,
        module_id: &str,
    ) -> Result<StudentModuleUnlock, EngineError> {
        let curriculum_id = self.structure.curriculum_of_module(module_id).await?;
        if !self.store.student_exists(student_id).await? {
            return Err(EngineError::not_found(EntityKind::Student, student_id));
        }
        let settings = self.structure.settings(&curriculum_id).await?;

        let lock = self.student_lock(student_id, &curriculum_id).await;
        let _guard = lock.lock().await;

        self.refresh_module_unlock(student_id, module_id, &settings)
            .await
    }

    /// Recompute a module's unlock record from the ledger and persist it.
    /// Caller must hold the student lock.
    async fn refresh_module_unlock(
        &self,
        student_id: &str,
        module_id: &str,
        settings: &CurriculumProgressionSettings,
    ) -> Result<StudentModuleUnlock, EngineError> {
        let lessons = self.structure.lessons_in_module(module_id).await?;

        let grades: Vec<StudentLessonProgress> = try_join_all(
            lessons
                .iter()
                .map(|lesson| self.store.lesson_progress(student_id, &lesson.id)),
        )
        .await?
        .into_iter()
        .flatten()
        .collect();

        let prior = self.store.module_unlock(student_id, module_id).await?;
        let unlock = scoring::evaluate_module_unlock(
            student_id,
            module_id,
            &lessons,
            &grades,
            settings,
            prior.as_ref(),
        );
        self.store.put_module_unlock(unlock.clone()).await?;
        Ok(unlock)
    }

    /// Open a pending level assessment for a student.
    ///
    /// When cross-level progression is disabled, every module of every
    /// prior level must already be unlocked; the missing modules are
    /// named in the `PrerequisiteNotMet` rejection. At most one open
    /// assessment may exist per student×level.
    pub async fn create_assessment(
        &self,
        student_id: &str,
        level_id: &str,
        instructor_id: &str,
    ) -> Result<StudentLevelAssessment, EngineError> {
        let curriculum_id = self.structure.curriculum_of_level(level_id).await?;
        if !self.store.student_exists(student_id).await? {
            return Err(EngineError::not_found(EntityKind::Student, student_id));
        }
        let settings = self.structure.settings(&curriculum_id).await?;

        let lock = self.student_lock(student_id, &curriculum_id).await;
        let _guard = lock.lock().await;

        let existing = self
            .store
            .assessments_for_student(student_id, &curriculum_id)
            .await?;
        if let Some(open) = existing
            .iter()
            .find(|a| a.level_id == level_id && a.status.is_open())
        {
            return Err(EngineError::InvalidState {
                assessment_id: open.id,
                current: open.status,
            });
        }

        if !settings.allow_cross_level_progression {
            let levels = self.structure.levels(&curriculum_id).await?;
            let mut missing = Vec::new();
            for level in levels.iter().take_while(|l| l.id != level_id) {
                let modules = self.structure.modules_in_level(&level.id).await?;
                for module in &modules {
                    if module.lesson_count() == 0 {
                        continue;
                    }
                    let unlocked = self
                        .store
                        .module_unlock(student_id, &module.id)
                        .await?
                        .is_some_and(|u| u.is_unlocked);
                    if !unlocked {
                        missing.push(module.id.clone());
                    }
                }
            }
            if !missing.is_empty() {
                return Err(EngineError::PrerequisiteNotMet {
                    level_id: level_id.to_string(),
                    missing_modules: missing,
                });
            }
        }

        let record =
            StudentLevelAssessment::new(student_id, level_id, &curriculum_id, instructor_id);
        self.store.put_assessment(record.clone()).await?;
        tracing::info!(
            student = %student_id,
            level = %level_id,
            assessment = %record.id,
            "assessment opened"
        );
        Ok(record)
    }

    /// Complete a pending assessment with a full criterion score sheet.
    pub async fn complete_assessment(
        &self,
        assessment_id: Uuid,
        criteria_scores: BTreeMap<String, u32>,
        notes: Option<String>,
    ) -> Result<StudentLevelAssessment, EngineError> {
        let found = self.load_assessment(assessment_id).await?;
        let lock = self
            .student_lock(&found.student_id, &found.curriculum_id)
            .await;
        let _guard = lock.lock().await;

        // Re-read under the lock; a racing mutation may have moved it.
        let mut record = self.load_assessment(assessment_id).await?;
        if record.status != AssessmentStatus::Pending {
            return Err(EngineError::InvalidState {
                assessment_id,
                current: record.status,
            });
        }

        let criteria = self.structure.criteria_for_level(&record.level_id).await?;
        let settings = self.structure.settings(&record.curriculum_id).await?;
        let score = scoring::score_assessment(&criteria, &criteria_scores, &settings)?;

        let verdict = if score.passed {
            AssessmentStatus::Passed
        } else {
            AssessmentStatus::Failed
        };
        debug_assert!(record.status.can_transition(verdict));

        let others = self
            .store
            .assessments_for_student(&record.student_id, &record.curriculum_id)
            .await?;
        let can_continue = score.passed
            && (settings.allow_cross_level_progression
                || !scoring::has_blocking_assessment(&others, record.id));

        record.criteria_scores = criteria_scores;
        record.overall_score = Some(score.overall_score);
        record.passed = Some(score.passed);
        record.status = verdict;
        record.can_continue_next_level = can_continue;
        record.assessment_date = Some(Utc::now());
        if notes.is_some() {
            record.notes = notes;
        }

        self.store.put_assessment(record.clone()).await?;
        tracing::info!(
            assessment = %assessment_id,
            overall = score.overall_score,
            passed = score.passed,
            "assessment completed"
        );
        Ok(record)
    }

    /// Suspend a pending assessment. A hard stop: continuation is forced
    /// off until the suspension is cleared through remediation.
    pub async fn suspend_assessment(
        &self,
        assessment_id: Uuid,
        reason: impl Into<String>,
    ) -> Result<StudentLevelAssessment, EngineError> {
        let found = self.load_assessment(assessment_id).await?;
        let lock = self
            .student_lock(&found.student_id, &found.curriculum_id)
            .await;
        let _guard = lock.lock().await;

        let mut record = self.load_assessment(assessment_id).await?;
        if !record.status.can_transition(AssessmentStatus::Suspended) {
            return Err(EngineError::InvalidState {
                assessment_id,
                current: record.status,
            });
        }

        record.status = AssessmentStatus::Suspended;
        record.suspension_reason = Some(reason.into());
        record.can_continue_next_level = false;

        self.store.put_assessment(record.clone()).await?;
        tracing::warn!(assessment = %assessment_id, "assessment suspended");
        Ok(record)
    }

    /// Clear a suspension: append the remediation notes and return the
    /// assessment to pending. Recorded criterion scores are untouched.
    pub async fn resume_assessment(
        &self,
        assessment_id: Uuid,
        remediation_notes: impl Into<String>,
    ) -> Result<StudentLevelAssessment, EngineError> {
        let found = self.load_assessment(assessment_id).await?;
        let lock = self
            .student_lock(&found.student_id, &found.curriculum_id)
            .await;
        let _guard = lock.lock().await;

        let mut record = self.load_assessment(assessment_id).await?;
        if !record.status.can_transition(AssessmentStatus::Pending) {
            return Err(EngineError::InvalidState {
                assessment_id,
                current: record.status,
            });
        }

        record.remediation_notes.push(remediation_notes.into());
        record.suspension_reason = None;
        record.status = AssessmentStatus::Pending;

        self.store.put_assessment(record.clone()).await?;
        tracing::info!(assessment = %assessment_id, "assessment resumed");
        Ok(record)
    }

    /// Compose a read-only progression summary for a student within a
    /// curriculum.
    pub async fn summarize(
        &self,
        student_id: &str,
        curriculum_id: &str,
    ) -> Result<ProgressionSummary, EngineError> {
        if !self.store.student_exists(student_id).await? {
            return Err(EngineError::not_found(EntityKind::Student, student_id));
        }
        let levels = self.structure.levels(curriculum_id).await?;

        let lesson_ids: Vec<String> = levels
            .iter()
            .flat_map(|l| l.modules.iter())
            .flat_map(|m| m.lessons())
            .map(|lesson| lesson.id.clone())
            .collect();
        let module_ids: Vec<String> = levels
            .iter()
            .flat_map(|l| l.modules.iter())
            .map(|m| m.id.clone())
            .collect();

        let fetched_grades = try_join_all(
            lesson_ids
                .iter()
                .map(|id| self.store.lesson_progress(student_id, id)),
        )
        .await?;
        let grades: HashMap<String, StudentLessonProgress> = lesson_ids
            .into_iter()
            .zip(fetched_grades)
            .filter_map(|(id, record)| record.map(|r| (id, r)))
            .collect();

        let fetched_unlocks = try_join_all(
            module_ids
                .iter()
                .map(|id| self.store.module_unlock(student_id, id)),
        )
        .await?;
        let unlocks: HashMap<String, StudentModuleUnlock> = module_ids
            .into_iter()
            .zip(fetched_unlocks)
            .filter_map(|(id, record)| record.map(|r| (id, r)))
            .collect();

        let assessments = self
            .store
            .assessments_for_student(student_id, curriculum_id)
            .await?;

        Ok(build_summary(
            student_id,
            curriculum_id,
            &levels,
            &grades,
            &unlocks,
            &assessments,
        ))
    }

    async fn load_assessment(
        &self,
        assessment_id: Uuid,
    ) -> Result<StudentLevelAssessment, EngineError> {
        self.store
            .assessment(assessment_id)
            .await?
            .ok_or_else(|| {
                EngineError::not_found(EntityKind::Assessment, assessment_id.to_string())
            })
    }
}
