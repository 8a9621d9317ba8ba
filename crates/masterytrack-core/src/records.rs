//! Per-student progress records.
//!
//! These are the records the engine owns: the append-only lesson grading
//! ledger entries, the derived (and monotonic) module unlock state, and
//! level assessment records with their workflow status.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One grading ledger entry per student×lesson, created on the first
/// grading event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentLessonProgress {
    pub student_id: String,
    pub lesson_id: String,
    /// Star grade from the most recent attempt, 0–3.
    pub stars_earned: Option<u8>,
    pub is_completed: bool,
    /// Incremented on every grading event.
    pub attempt_count: u32,
    pub last_attempt_date: Option<DateTime<Utc>>,
    pub graded_by_instructor_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Accumulated only when the curriculum tracks time spent.
    #[serde(default)]
    pub time_spent_secs: u64,
}

impl StudentLessonProgress {
    /// A fresh, ungraded record for a student×lesson pair.
    pub fn new(student_id: impl Into<String>, lesson_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            lesson_id: lesson_id.into(),
            stars_earned: None,
            is_completed: false,
            attempt_count: 0,
            last_attempt_date: None,
            graded_by_instructor_id: None,
            notes: None,
            time_spent_secs: 0,
        }
    }
}

/// Derived unlock state, one per student×module. Recomputed from the
/// grading ledger, never hand-edited. `is_unlocked` is a one-way latch:
/// once true it survives any later recomputation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentModuleUnlock {
    pub student_id: String,
    pub module_id: String,
    /// Sum of current stars over the module's lessons, ungraded as 0.
    pub stars_earned: u32,
    /// 3 × lesson count in the module.
    pub total_possible_stars: u32,
    /// `stars_earned / total_possible_stars × 100`, 0 for empty modules.
    pub unlock_percentage: f64,
    pub threshold_met: bool,
    pub is_unlocked: bool,
    pub evaluated_at: DateTime<Utc>,
}

/// Workflow status of a level assessment.
///
/// The allowed transitions are `pending → passed|failed` (completion with
/// a verdict), `pending → suspended`, and `suspended → pending` (after
/// remediation). `passed` and `failed` are terminal; a later attempt is a
/// new assessment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentStatus {
    Pending,
    Suspended,
    Passed,
    Failed,
}

impl AssessmentStatus {
    /// Whether this assessment instance can never change state again.
    pub fn is_terminal(self) -> bool {
        matches!(self, AssessmentStatus::Passed | AssessmentStatus::Failed)
    }

    /// Whether the record is still open (pending or suspended).
    pub fn is_open(self) -> bool {
        !self.is_terminal()
    }

    /// The explicit transition table; checked on every mutation.
    pub fn can_transition(self, to: AssessmentStatus) -> bool {
        use AssessmentStatus::*;
        matches!(
            (self, to),
            (Pending, Passed) | (Pending, Failed) | (Pending, Suspended) | (Suspended, Pending)
        )
    }
}

impl fmt::Display for AssessmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssessmentStatus::Pending => write!(f, "pending"),
            AssessmentStatus::Suspended => write!(f, "suspended"),
            AssessmentStatus::Passed => write!(f, "passed"),
            AssessmentStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for AssessmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(AssessmentStatus::Pending),
            "suspended" => Ok(AssessmentStatus::Suspended),
            "passed" => Ok(AssessmentStatus::Passed),
            "failed" => Ok(AssessmentStatus::Failed),
            other => Err(format!("unknown assessment status: {other}")),
        }
    }
}

/// A level assessment instance for one student.
///
/// At most one open (pending or suspended) record exists per
/// student×level; reassessment after a terminal verdict creates a new
/// record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentLevelAssessment {
    pub id: Uuid,
    pub student_id: String,
    pub level_id: String,
    pub curriculum_id: String,
    pub instructor_id: String,
    pub status: AssessmentStatus,
    /// Recorded raw score per criterion id.
    #[serde(default)]
    pub criteria_scores: BTreeMap<String, u32>,
    /// Weighted percentage, set on completion.
    pub overall_score: Option<f64>,
    /// Verdict, set on completion.
    pub passed: Option<bool>,
    /// Derived; defaults false and is forced false while suspended.
    #[serde(default)]
    pub can_continue_next_level: bool,
    /// Set only while suspended.
    pub suspension_reason: Option<String>,
    /// Appended by instructors when a suspension is cleared.
    #[serde(default)]
    pub remediation_notes: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub assessment_date: Option<DateTime<Utc>>,
}

impl StudentLevelAssessment {
    /// A fresh pending assessment with an empty score sheet.
    pub fn new(
        student_id: impl Into<String>,
        level_id: impl Into<String>,
        curriculum_id: impl Into<String>,
        instructor_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id: student_id.into(),
            level_id: level_id.into(),
            curriculum_id: curriculum_id.into(),
            instructor_id: instructor_id.into(),
            status: AssessmentStatus::Pending,
            criteria_scores: BTreeMap::new(),
            overall_score: None,
            passed: None,
            can_continue_next_level: false,
            suspension_reason: None,
            remediation_notes: Vec::new(),
            notes: None,
            created_at: Utc::now(),
            assessment_date: None,
        }
    }
}

/// A single grading request, also the unit of a bulk batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeRequest {
    pub student_id: String,
    pub lesson_id: String,
    /// Star grade, 0–3.
    pub stars_earned: u8,
    pub instructor_id: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Telemetry; accumulated only when the curriculum tracks time spent.
    #[serde(default)]
    pub time_spent_secs: Option<u64>,
}

/// Outcome of a bulk grading batch. Each item succeeds or fails on its
/// own; a failure never rolls back earlier successes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkGradeOutcome {
    pub succeeded: Vec<StudentLessonProgress>,
    pub failed: Vec<BulkGradeFailure>,
}

/// One rejected item from a bulk grading batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkGradeFailure {
    /// Position of the item in the submitted batch.
    pub index: usize,
    pub student_id: String,
    pub lesson_id: String,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use AssessmentStatus::*;

    #[test]
    fn transition_table() {
        assert!(Pending.can_transition(Passed));
        assert!(Pending.can_transition(Failed));
        assert!(Pending.can_transition(Suspended));
        assert!(Suspended.can_transition(Pending));

        assert!(!Suspended.can_transition(Passed));
        assert!(!Suspended.can_transition(Failed));
        assert!(!Passed.can_transition(Pending));
        assert!(!Failed.can_transition(Pending));
        assert!(!Pending.can_transition(Pending));
    }

    #[test]
    fn terminal_states() {
        assert!(Passed.is_terminal());
        assert!(Failed.is_terminal());
        assert!(Pending.is_open());
        assert!(Suspended.is_open());
    }

    #[test]
    fn status_display_and_parse() {
        assert_eq!(Pending.to_string(), "pending");
        assert_eq!(Suspended.to_string(), "suspended");
        assert_eq!("passed".parse::<AssessmentStatus>().unwrap(), Passed);
        assert_eq!("Failed".parse::<AssessmentStatus>().unwrap(), Failed);
        assert!("done".parse::<AssessmentStatus>().is_err());
    }

    #[test]
    fn new_assessment_starts_pending_and_empty() {
        let a = StudentLevelAssessment::new("s1", "level-1", "swim-101", "coach");
        assert_eq!(a.status, Pending);
        assert!(a.criteria_scores.is_empty());
        assert!(a.overall_score.is_none());
        assert!(a.passed.is_none());
        assert!(!a.can_continue_next_level);
    }

    #[test]
    fn lesson_progress_serde_roundtrip() {
        let mut record = StudentLessonProgress::new("s1", "l1");
        record.stars_earned = Some(2);
        record.is_completed = true;
        record.attempt_count = 1;
        let json = serde_json::to_string(&record).unwrap();
        let back: StudentLessonProgress = serde_json::from_str(&json).unwrap();
        assert_eq!(back.stars_earned, Some(2));
        assert!(back.is_completed);
    }
}
