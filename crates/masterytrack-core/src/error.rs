//! Engine error types.
//!
//! Errors are classified, not typed per call site: callers branch on
//! [`EngineError::classification`] instead of string matching. Nothing in
//! the engine is retried automatically and no error is silently
//! swallowed.

use thiserror::Error;
use uuid::Uuid;

use crate::records::{AssessmentStatus, StudentLessonProgress};

/// The kind of entity a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Student,
    Lesson,
    Module,
    Level,
    Curriculum,
    Assessment,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Student => write!(f, "student"),
            EntityKind::Lesson => write!(f, "lesson"),
            EntityKind::Module => write!(f, "module"),
            EntityKind::Level => write!(f, "level"),
            EntityKind::Curriculum => write!(f, "curriculum"),
            EntityKind::Assessment => write!(f, "assessment"),
        }
    }
}

/// Coarse error class, used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Out-of-range or missing input; nothing was applied.
    Validation,
    /// The operation conflicts with current record state; the current
    /// state is attached so the caller can refresh.
    StateConflict,
    /// Unknown entity; never defaulted to an empty record.
    NotFound,
    /// A required unlock is missing; the missing prerequisite is named.
    Prerequisite,
}

/// Errors produced by the progression engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A star grade or criterion score is out of range or missing.
    #[error("invalid score: {reason}")]
    InvalidScore { reason: String },

    /// Grading was attempted on a completed lesson while the curriculum
    /// disallows retakes.
    #[error("lesson {lesson_id} is locked for student {student_id}: retakes are disabled")]
    LockedRecord {
        student_id: String,
        lesson_id: String,
        /// The record as it stands, so the caller can refresh.
        current: Box<StudentLessonProgress>,
    },

    /// The assessment is not in a state that permits the operation.
    #[error("assessment {assessment_id} is {current}, which does not permit this operation")]
    InvalidState {
        assessment_id: Uuid,
        current: AssessmentStatus,
    },

    /// An entity lookup failed.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// Assessment requested before the required modules were unlocked.
    #[error("prerequisites not met for level {level_id}: locked modules {missing_modules:?}")]
    PrerequisiteNotMet {
        level_id: String,
        missing_modules: Vec<String>,
    },
}

impl EngineError {
    /// Classify this error for caller-side handling.
    pub fn classification(&self) -> ErrorClass {
        match self {
            EngineError::InvalidScore { .. } => ErrorClass::Validation,
            EngineError::LockedRecord { .. } | EngineError::InvalidState { .. } => {
                ErrorClass::StateConflict
            }
            EngineError::NotFound { .. } => ErrorClass::NotFound,
            EngineError::PrerequisiteNotMet { .. } => ErrorClass::Prerequisite,
        }
    }

    /// Shorthand for a [`EngineError::NotFound`].
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::StudentLessonProgress;

    #[test]
    fn classification_covers_all_variants() {
        let invalid = EngineError::InvalidScore {
            reason: "stars must be 0-3".into(),
        };
        assert_eq!(invalid.classification(), ErrorClass::Validation);

        let locked = EngineError::LockedRecord {
            student_id: "s1".into(),
            lesson_id: "l1".into(),
            current: Box::new(StudentLessonProgress::new("s1", "l1")),
        };
        assert_eq!(locked.classification(), ErrorClass::StateConflict);

        let state = EngineError::InvalidState {
            assessment_id: Uuid::nil(),
            current: AssessmentStatus::Passed,
        };
        assert_eq!(state.classification(), ErrorClass::StateConflict);

        let missing = EngineError::not_found(EntityKind::Module, "mod-9");
        assert_eq!(missing.classification(), ErrorClass::NotFound);

        let prereq = EngineError::PrerequisiteNotMet {
            level_id: "level-3".into(),
            missing_modules: vec!["mod-4".into()],
        };
        assert_eq!(prereq.classification(), ErrorClass::Prerequisite);
    }

    #[test]
    fn error_messages_name_the_entities() {
        let e = EngineError::not_found(EntityKind::Lesson, "les-1");
        assert_eq!(e.to_string(), "lesson not found: les-1");

        let e = EngineError::PrerequisiteNotMet {
            level_id: "level-3".into(),
            missing_modules: vec!["mod-4".into(), "mod-5".into()],
        };
        assert!(e.to_string().contains("level-3"));
        assert!(e.to_string().contains("mod-4"));
    }
}
