//! Pure scoring functions.
//!
//! Everything here is a deterministic function of its inputs: module
//! unlock evaluation over the grading ledger, and weighted criterion
//! scoring for level assessments. Settings are passed in explicitly so
//! callers can evaluate under varied rules without process-wide state.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::error::EngineError;
use crate::model::{CurriculumProgressionSettings, Lesson, LevelAssessmentCriterion, MAX_STARS};
use crate::records::{
    AssessmentStatus, StudentLessonProgress, StudentLevelAssessment, StudentModuleUnlock,
};

/// Validate a star grade, 0–3.
pub fn validate_star_grade(stars: u8) -> Result<(), EngineError> {
    if stars > MAX_STARS {
        return Err(EngineError::InvalidScore {
            reason: format!("stars_earned must be 0-{MAX_STARS}, got {stars}"),
        });
    }
    Ok(())
}

/// Evaluate a module's unlock state from the current grading ledger.
///
/// `grades` are the ledger entries for this student over `lessons`;
/// ungraded lessons simply have no entry and never count against the
/// student. `prior` carries the one-way unlock latch: once a prior record
/// was unlocked, the result stays unlocked regardless of current stars.
///
/// A module with zero lessons reports 0% and is always unlocked.
pub fn evaluate_module_unlock(
    student_id: &str,
    module_id: &str,
    lessons: &[Lesson],
    grades: &[StudentLessonProgress],
    settings: &CurriculumProgressionSettings,
    prior: Option<&StudentModuleUnlock>,
) -> StudentModuleUnlock {
    let total_possible_stars = (lessons.len() as u32) * u32::from(MAX_STARS);

    let stars_earned: u32 = lessons
        .iter()
        .filter_map(|lesson| grades.iter().find(|g| g.lesson_id == lesson.id))
        .map(|g| u32::from(g.stars_earned.unwrap_or(0)))
        .sum();

    let unlock_percentage = if total_possible_stars == 0 {
        0.0
    } else {
        f64::from(stars_earned) / f64::from(total_possible_stars) * 100.0
    };

    let floor_met = !settings.require_min_one_star_per_lesson
        || grades
            .iter()
            .filter(|g| g.is_completed && lessons.iter().any(|l| l.id == g.lesson_id))
            .all(|g| g.stars_earned.unwrap_or(0) >= 1);

    let threshold_met = if lessons.is_empty() {
        true
    } else {
        unlock_percentage >= settings.unlock_threshold_percent && floor_met
    };

    // One-way latch: a later retake can lower the stars but never re-lock.
    let is_unlocked = prior.is_some_and(|p| p.is_unlocked) || threshold_met;

    StudentModuleUnlock {
        student_id: student_id.to_string(),
        module_id: module_id.to_string(),
        stars_earned,
        total_possible_stars,
        unlock_percentage,
        threshold_met,
        is_unlocked,
        evaluated_at: Utc::now(),
    }
}

/// Verdict of scoring a level assessment's score sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssessmentScore {
    /// Weighted percentage, 0–100.
    pub overall_score: f64,
    /// Aggregate bar and every per-criterion floor both hold.
    pub passed: bool,
}

/// Score a completed criterion sheet against a level's criteria.
///
/// Every criterion must have exactly one in-range score; unknown or
/// missing entries are validation errors and nothing is applied. The
/// aggregate passing bar reuses the curriculum's unlock threshold,
/// mirroring the module-unlock floor/aggregate pattern.
///
/// A level with no criteria scores 100 and passes vacuously.
pub fn score_assessment(
    criteria: &[LevelAssessmentCriterion],
    scores: &BTreeMap<String, u32>,
    settings: &CurriculumProgressionSettings,
) -> Result<AssessmentScore, EngineError> {
    for key in scores.keys() {
        if !criteria.iter().any(|c| &c.id == key) {
            return Err(EngineError::InvalidScore {
                reason: format!("score recorded for unknown criterion: {key}"),
            });
        }
    }

    let mut weighted_sum = 0.0;
    let mut weighted_max = 0.0;
    let mut floors_met = true;

    for criterion in criteria {
        let score = *scores.get(&criterion.id).ok_or_else(|| EngineError::InvalidScore {
            reason: format!("missing score for criterion: {}", criterion.id),
        })?;
        if score > criterion.max_score {
            return Err(EngineError::InvalidScore {
                reason: format!(
                    "score {score} exceeds max {} for criterion {}",
                    criterion.max_score, criterion.id
                ),
            });
        }
        weighted_sum += f64::from(score) * criterion.weight;
        weighted_max += f64::from(criterion.max_score) * criterion.weight;
        floors_met &= score >= criterion.min_passing_score;
    }

    let overall_score = if weighted_max == 0.0 {
        100.0
    } else {
        100.0 * weighted_sum / weighted_max
    };

    let passed = overall_score >= settings.unlock_threshold_percent && floors_met;

    Ok(AssessmentScore {
        overall_score,
        passed,
    })
}

/// Whether another assessment blocks advancement for this student.
///
/// Used when cross-level progression is disabled: a suspended assessment,
/// or a failed one without a later passed record for the same level,
/// holds the student back.
pub fn has_blocking_assessment(assessments: &[StudentLevelAssessment], exclude: uuid::Uuid) -> bool {
    assessments.iter().any(|a| {
        if a.id == exclude {
            return false;
        }
        match a.status {
            AssessmentStatus::Suspended => true,
            AssessmentStatus::Failed => !assessments.iter().any(|later| {
                later.level_id == a.level_id
                    && later.status == AssessmentStatus::Passed
                    && later.created_at >= a.created_at
            }),
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Lesson;

    fn lesson(id: &str) -> Lesson {
        Lesson {
            id: id.into(),
            name: id.into(),
        }
    }

    fn graded(lesson_id: &str, stars: u8) -> StudentLessonProgress {
        StudentLessonProgress {
            stars_earned: Some(stars),
            is_completed: true,
            attempt_count: 1,
            last_attempt_date: Some(Utc::now()),
            graded_by_instructor_id: Some("coach".into()),
            ..StudentLessonProgress::new("s1", lesson_id)
        }
    }

    fn settings(threshold: f64, floor: bool) -> CurriculumProgressionSettings {
        CurriculumProgressionSettings {
            unlock_threshold_percent: threshold,
            require_min_one_star_per_lesson: floor,
            ..Default::default()
        }
    }

    fn criterion(id: &str, weight: f64, max: u32, min_pass: u32) -> LevelAssessmentCriterion {
        LevelAssessmentCriterion {
            id: id.into(),
            name: id.into(),
            sequence_order: 1,
            weight,
            max_score: max,
            min_passing_score: min_pass,
        }
    }

    #[test]
    fn star_grade_bounds() {
        assert!(validate_star_grade(0).is_ok());
        assert!(validate_star_grade(3).is_ok());
        assert!(validate_star_grade(4).is_err());
    }

    #[test]
    fn empty_module_is_always_unlocked() {
        let unlock =
            evaluate_module_unlock("s1", "m1", &[], &[], &settings(70.0, true), None);
        assert_eq!(unlock.total_possible_stars, 0);
        assert_eq!(unlock.unlock_percentage, 0.0);
        assert!(unlock.threshold_met);
        assert!(unlock.is_unlocked);
    }

    #[test]
    fn eleven_of_fifteen_stars_clears_seventy_percent() {
        // 5 lessons, 15 possible stars, 11 earned -> 73.3%.
        let lessons: Vec<Lesson> = (1..=5).map(|i| lesson(&format!("l{i}"))).collect();
        let grades = vec![
            graded("l1", 3),
            graded("l2", 3),
            graded("l3", 2),
            graded("l4", 2),
            graded("l5", 1),
        ];
        let unlock =
            evaluate_module_unlock("s1", "m1", &lessons, &grades, &settings(70.0, false), None);
        assert_eq!(unlock.stars_earned, 11);
        assert_eq!(unlock.total_possible_stars, 15);
        assert!((unlock.unlock_percentage - 73.333).abs() < 0.01);
        assert!(unlock.threshold_met);
        assert!(unlock.is_unlocked);
    }

    #[test]
    fn zero_star_lesson_violates_the_floor() {
        // 12/15 = 80% clears the bar, but one graded lesson has 0 stars.
        let lessons: Vec<Lesson> = (1..=5).map(|i| lesson(&format!("l{i}"))).collect();
        let grades = vec![
            graded("l1", 3),
            graded("l2", 3),
            graded("l3", 3),
            graded("l4", 3),
            graded("l5", 0),
        ];
        let unlock =
            evaluate_module_unlock("s1", "m1", &lessons, &grades, &settings(70.0, true), None);
        assert!((unlock.unlock_percentage - 80.0).abs() < f64::EPSILON);
        assert!(!unlock.threshold_met);
        assert!(!unlock.is_unlocked);
    }

    #[test]
    fn ungraded_lessons_do_not_count_against_the_student() {
        // Only 2 of 5 lessons graded, both perfect: 6/15 = 40%, below the
        // bar, but the one-star floor is satisfied by the graded lessons.
        let lessons: Vec<Lesson> = (1..=5).map(|i| lesson(&format!("l{i}"))).collect();
        let grades = vec![graded("l1", 3), graded("l2", 3)];
        let unlock =
            evaluate_module_unlock("s1", "m1", &lessons, &grades, &settings(40.0, true), None);
        assert!(unlock.threshold_met);
    }

    #[test]
    fn unlock_is_monotonic_across_retakes() {
        let lessons: Vec<Lesson> = (1..=2).map(|i| lesson(&format!("l{i}"))).collect();
        let grades = vec![graded("l1", 3), graded("l2", 3)];
        let first =
            evaluate_module_unlock("s1", "m1", &lessons, &grades, &settings(70.0, false), None);
        assert!(first.is_unlocked);

        // A retake lowers the stars below the threshold.
        let regraded = vec![graded("l1", 1), graded("l2", 0)];
        let second = evaluate_module_unlock(
            "s1",
            "m1",
            &lessons,
            &regraded,
            &settings(70.0, false),
            Some(&first),
        );
        assert!(!second.threshold_met);
        assert!(second.is_unlocked, "latch must survive a lowered retake");
    }

    #[test]
    fn unlock_percentage_stays_in_range() {
        let lessons: Vec<Lesson> = (1..=3).map(|i| lesson(&format!("l{i}"))).collect();
        let grades = vec![graded("l1", 3), graded("l2", 3), graded("l3", 3)];
        let unlock =
            evaluate_module_unlock("s1", "m1", &lessons, &grades, &settings(70.0, false), None);
        assert!((unlock.unlock_percentage - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn weighted_overall_score() {
        let criteria = vec![criterion("a", 2.0, 10, 0), criterion("b", 1.0, 10, 0)];
        let mut scores = BTreeMap::new();
        scores.insert("a".to_string(), 10);
        scores.insert("b".to_string(), 4);
        // (10*2 + 4*1) / (10*2 + 10*1) = 24/30 = 80%
        let result = score_assessment(&criteria, &scores, &settings(70.0, false)).unwrap();
        assert!((result.overall_score - 80.0).abs() < f64::EPSILON);
        assert!(result.passed);
    }

    #[test]
    fn criterion_floor_overrides_aggregate() {
        let criteria = vec![criterion("a", 1.0, 10, 0), criterion("b", 1.0, 10, 8)];
        let mut scores = BTreeMap::new();
        scores.insert("a".to_string(), 10);
        scores.insert("b".to_string(), 7);
        // 17/20 = 85% clears the bar, but criterion b is below its floor.
        let result = score_assessment(&criteria, &scores, &settings(70.0, false)).unwrap();
        assert!(result.overall_score > 70.0);
        assert!(!result.passed);
    }

    #[test]
    fn missing_and_out_of_range_scores_are_rejected() {
        let criteria = vec![criterion("a", 1.0, 10, 0)];
        let empty = BTreeMap::new();
        assert!(score_assessment(&criteria, &empty, &settings(70.0, false)).is_err());

        let mut over = BTreeMap::new();
        over.insert("a".to_string(), 11);
        assert!(score_assessment(&criteria, &over, &settings(70.0, false)).is_err());

        let mut unknown = BTreeMap::new();
        unknown.insert("a".to_string(), 5);
        unknown.insert("zz".to_string(), 5);
        assert!(score_assessment(&criteria, &unknown, &settings(70.0, false)).is_err());
    }

    #[test]
    fn no_criteria_passes_vacuously() {
        let result = score_assessment(&[], &BTreeMap::new(), &settings(70.0, false)).unwrap();
        assert_eq!(result.overall_score, 100.0);
        assert!(result.passed);
    }

    #[test]
    fn suspended_assessment_blocks_advancement() {
        let mut suspended = StudentLevelAssessment::new("s1", "level-1", "c1", "coach");
        suspended.status = AssessmentStatus::Suspended;
        let current = StudentLevelAssessment::new("s1", "level-2", "c1", "coach");
        assert!(has_blocking_assessment(
            &[suspended, current.clone()],
            current.id
        ));
    }

    #[test]
    fn failed_assessment_blocks_until_a_later_pass() {
        let mut failed = StudentLevelAssessment::new("s1", "level-1", "c1", "coach");
        failed.status = AssessmentStatus::Failed;
        let current = StudentLevelAssessment::new("s1", "level-2", "c1", "coach");
        assert!(has_blocking_assessment(
            &[failed.clone(), current.clone()],
            current.id
        ));

        let mut retake = StudentLevelAssessment::new("s1", "level-1", "c1", "coach");
        retake.status = AssessmentStatus::Passed;
        assert!(!has_blocking_assessment(
            &[failed, retake, current.clone()],
            current.id
        ));
    }
}
