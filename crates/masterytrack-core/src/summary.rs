//! Per-student progression summary aggregation.
//!
//! Read-only composition over the grading ledger, unlock records, and
//! assessment records. Missing unlock records mean "not yet evaluated"
//! and count as locked; they are never an error here.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Level;
use crate::records::{StudentLessonProgress, StudentLevelAssessment, StudentModuleUnlock};

/// Snapshot of one student's standing within a curriculum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionSummary {
    pub student_id: String,
    pub curriculum_id: String,
    pub total_lessons: usize,
    pub graded_lessons: usize,
    pub completed_lessons: usize,
    /// Mean stars over graded lessons; 0 when nothing is graded.
    pub average_stars: f64,
    pub total_modules: usize,
    pub unlocked_modules: usize,
    /// Highest level with a passed assessment, or the first level.
    pub current_level_id: Option<String>,
    /// First unlocked module that is not yet fully completed.
    pub current_module_id: Option<String>,
    /// Assessments still pending or suspended.
    pub open_assessments: Vec<OpenAssessment>,
    /// Completed lessons over total lessons, as a percentage.
    pub progress_percentage: f64,
    pub generated_at: DateTime<Utc>,
}

/// A still-open assessment, listed in the summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAssessment {
    pub id: Uuid,
    pub level_id: String,
    pub status: crate::records::AssessmentStatus,
}

impl ProgressionSummary {
    /// Render the summary as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Student {} in curriculum {}:** {:.1}% complete\n\n",
            self.student_id, self.curriculum_id, self.progress_percentage
        ));
        md.push_str("| Metric | Value |\n|--------|-------|\n");
        md.push_str(&format!(
            "| Lessons completed | {}/{} |\n",
            self.completed_lessons, self.total_lessons
        ));
        md.push_str(&format!("| Lessons graded | {} |\n", self.graded_lessons));
        md.push_str(&format!("| Average stars | {:.2} |\n", self.average_stars));
        md.push_str(&format!(
            "| Modules unlocked | {}/{} |\n",
            self.unlocked_modules, self.total_modules
        ));
        if let Some(level) = &self.current_level_id {
            md.push_str(&format!("| Current level | {level} |\n"));
        }
        if let Some(module) = &self.current_module_id {
            md.push_str(&format!("| Current module | {module} |\n"));
        }

        if !self.open_assessments.is_empty() {
            md.push_str("\n### Open assessments\n\n");
            for a in &self.open_assessments {
                md.push_str(&format!("- {} ({}): {}\n", a.id, a.level_id, a.status));
            }
        }

        md
    }
}

/// Build a summary from the component records.
///
/// `levels` must be the curriculum's full levels in order; `grades` and
/// `unlocks` are keyed by lesson and module id respectively.
pub fn build_summary(
    student_id: &str,
    curriculum_id: &str,
    levels: &[Level],
    grades: &HashMap<String, StudentLessonProgress>,
    unlocks: &HashMap<String, StudentModuleUnlock>,
    assessments: &[StudentLevelAssessment],
) -> ProgressionSummary {
    let mut total_lessons = 0usize;
    let mut graded_lessons = 0usize;
    let mut completed_lessons = 0usize;
    let mut star_sum = 0u32;
    let mut total_modules = 0usize;
    let mut unlocked_modules = 0usize;
    let mut current_module_id = None;

    for level in levels {
        for module in &level.modules {
            total_modules += 1;
            let lesson_count = module.lesson_count();

            // Zero-lesson modules are unconditionally unlocked; otherwise
            // a missing unlock record means "not yet evaluated".
            let unlocked = lesson_count == 0
                || unlocks.get(&module.id).is_some_and(|u| u.is_unlocked);
            if unlocked {
                unlocked_modules += 1;
            }

            let mut module_completed = 0usize;
            for lesson in module.lessons() {
                total_lessons += 1;
                if let Some(grade) = grades.get(&lesson.id) {
                    if let Some(stars) = grade.stars_earned {
                        graded_lessons += 1;
                        star_sum += u32::from(stars);
                    }
                    if grade.is_completed {
                        completed_lessons += 1;
                        module_completed += 1;
                    }
                }
            }

            if current_module_id.is_none()
                && unlocked
                && lesson_count > 0
                && module_completed < lesson_count
            {
                current_module_id = Some(module.id.clone());
            }
        }
    }

    let current_level_id = levels
        .iter()
        .rev()
        .find(|level| {
            assessments.iter().any(|a| {
                a.level_id == level.id && a.status == crate::records::AssessmentStatus::Passed
            })
        })
        .or(levels.first())
        .map(|level| level.id.clone());

    let open_assessments = assessments
        .iter()
        .filter(|a| a.status.is_open())
        .map(|a| OpenAssessment {
            id: a.id,
            level_id: a.level_id.clone(),
            status: a.status,
        })
        .collect();

    let average_stars = if graded_lessons == 0 {
        0.0
    } else {
        f64::from(star_sum) / graded_lessons as f64
    };

    let progress_percentage = if total_lessons == 0 {
        0.0
    } else {
        completed_lessons as f64 / total_lessons as f64 * 100.0
    };

    ProgressionSummary {
        student_id: student_id.to_string(),
        curriculum_id: curriculum_id.to_string(),
        total_lessons,
        graded_lessons,
        completed_lessons,
        average_stars,
        total_modules,
        unlocked_modules,
        current_level_id,
        current_module_id,
        open_assessments,
        progress_percentage,
        generated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Lesson, Module, Section};
    use crate::records::AssessmentStatus;

    fn level(id: &str, modules: Vec<Module>) -> Level {
        Level {
            id: id.into(),
            name: id.into(),
            criteria: vec![],
            modules,
        }
    }

    fn module(id: &str, lesson_ids: &[&str]) -> Module {
        Module {
            id: id.into(),
            name: id.into(),
            sections: vec![Section {
                id: format!("{id}-sec"),
                name: "Main".into(),
                lessons: lesson_ids
                    .iter()
                    .map(|l| Lesson {
                        id: (*l).into(),
                        name: (*l).into(),
                    })
                    .collect(),
            }],
        }
    }

    fn graded(lesson_id: &str, stars: u8) -> StudentLessonProgress {
        StudentLessonProgress {
            stars_earned: Some(stars),
            is_completed: true,
            attempt_count: 1,
            ..StudentLessonProgress::new("s1", lesson_id)
        }
    }

    fn unlocked(module_id: &str) -> StudentModuleUnlock {
        StudentModuleUnlock {
            student_id: "s1".into(),
            module_id: module_id.into(),
            stars_earned: 6,
            total_possible_stars: 6,
            unlock_percentage: 100.0,
            threshold_met: true,
            is_unlocked: true,
            evaluated_at: Utc::now(),
        }
    }

    #[test]
    fn counts_and_percentage() {
        let levels = vec![level(
            "level-1",
            vec![module("m1", &["l1", "l2"]), module("m2", &["l3", "l4"])],
        )];
        let mut grades = HashMap::new();
        grades.insert("l1".to_string(), graded("l1", 3));
        grades.insert("l2".to_string(), graded("l2", 1));
        let mut unlocks = HashMap::new();
        unlocks.insert("m1".to_string(), unlocked("m1"));

        let summary = build_summary("s1", "c1", &levels, &grades, &unlocks, &[]);
        assert_eq!(summary.total_lessons, 4);
        assert_eq!(summary.completed_lessons, 2);
        assert_eq!(summary.graded_lessons, 2);
        assert!((summary.average_stars - 2.0).abs() < f64::EPSILON);
        assert_eq!(summary.total_modules, 2);
        assert_eq!(summary.unlocked_modules, 1);
        assert!((summary.progress_percentage - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_unlock_record_counts_as_locked() {
        let levels = vec![level("level-1", vec![module("m1", &["l1"])])];
        let summary =
            build_summary("s1", "c1", &levels, &HashMap::new(), &HashMap::new(), &[]);
        assert_eq!(summary.unlocked_modules, 0);
        assert!(summary.current_module_id.is_none());
    }

    #[test]
    fn zero_lesson_module_counts_as_unlocked() {
        let levels = vec![level("level-1", vec![module("m-empty", &[])])];
        let summary =
            build_summary("s1", "c1", &levels, &HashMap::new(), &HashMap::new(), &[]);
        assert_eq!(summary.unlocked_modules, 1);
    }

    #[test]
    fn current_module_is_first_unlocked_incomplete() {
        let levels = vec![level(
            "level-1",
            vec![module("m1", &["l1"]), module("m2", &["l2", "l3"])],
        )];
        let mut grades = HashMap::new();
        grades.insert("l1".to_string(), graded("l1", 3));
        let mut unlocks = HashMap::new();
        unlocks.insert("m1".to_string(), unlocked("m1"));
        unlocks.insert("m2".to_string(), unlocked("m2"));

        let summary = build_summary("s1", "c1", &levels, &grades, &unlocks, &[]);
        // m1 is fully completed, so m2 is the working module.
        assert_eq!(summary.current_module_id.as_deref(), Some("m2"));
    }

    #[test]
    fn current_level_is_highest_passed_or_first() {
        let levels = vec![
            level("level-1", vec![]),
            level("level-2", vec![]),
            level("level-3", vec![]),
        ];

        let summary =
            build_summary("s1", "c1", &levels, &HashMap::new(), &HashMap::new(), &[]);
        assert_eq!(summary.current_level_id.as_deref(), Some("level-1"));

        let mut passed1 = StudentLevelAssessment::new("s1", "level-1", "c1", "coach");
        passed1.status = AssessmentStatus::Passed;
        let mut passed2 = StudentLevelAssessment::new("s1", "level-2", "c1", "coach");
        passed2.status = AssessmentStatus::Passed;
        let summary = build_summary(
            "s1",
            "c1",
            &levels,
            &HashMap::new(),
            &HashMap::new(),
            &[passed1, passed2],
        );
        assert_eq!(summary.current_level_id.as_deref(), Some("level-2"));
    }

    #[test]
    fn open_assessments_are_listed() {
        let levels = vec![level("level-1", vec![])];
        let pending = StudentLevelAssessment::new("s1", "level-1", "c1", "coach");
        let mut suspended = StudentLevelAssessment::new("s1", "level-1", "c1", "coach");
        suspended.status = AssessmentStatus::Suspended;
        let mut done = StudentLevelAssessment::new("s1", "level-1", "c1", "coach");
        done.status = AssessmentStatus::Passed;

        let summary = build_summary(
            "s1",
            "c1",
            &levels,
            &HashMap::new(),
            &HashMap::new(),
            &[pending, suspended, done],
        );
        assert_eq!(summary.open_assessments.len(), 2);
    }

    #[test]
    fn markdown_rendering() {
        let levels = vec![level("level-1", vec![module("m1", &["l1"])])];
        let summary =
            build_summary("s1", "c1", &levels, &HashMap::new(), &HashMap::new(), &[]);
        let md = summary.to_markdown();
        assert!(md.contains("Student s1"));
        assert!(md.contains("0/1"));
    }
}
