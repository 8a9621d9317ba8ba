//! In-memory store implementations.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use masterytrack_core::error::{EngineError, EntityKind};
use masterytrack_core::model::{
    Curriculum, CurriculumProgressionSettings, Lesson, Level, LevelAssessmentCriterion, Module,
};
use masterytrack_core::records::{
    StudentLessonProgress, StudentLevelAssessment, StudentModuleUnlock,
};
use masterytrack_core::snapshot::ProgressSnapshot;
use masterytrack_core::traits::{ProgressStore, StructureReader};

/// Indexed, read-only view over one or more parsed curricula.
#[derive(Debug, Default)]
pub struct InMemoryStructure {
    curricula: HashMap<String, Curriculum>,
    levels: HashMap<String, Level>,
    modules: HashMap<String, Module>,
    level_to_curriculum: HashMap<String, String>,
    module_to_curriculum: HashMap<String, String>,
    lesson_to_module: HashMap<String, String>,
}

impl InMemoryStructure {
    /// Build an indexed view from a single curriculum.
    pub fn new(curriculum: Curriculum) -> Self {
        let mut structure = Self::default();
        structure.add(curriculum);
        structure
    }

    /// Index another curriculum into this view.
    pub fn add(&mut self, curriculum: Curriculum) {
        for level in &curriculum.levels {
            self.levels.insert(level.id.clone(), level.clone());
            self.level_to_curriculum
                .insert(level.id.clone(), curriculum.id.clone());
            for module in &level.modules {
                self.modules.insert(module.id.clone(), module.clone());
                self.module_to_curriculum
                    .insert(module.id.clone(), curriculum.id.clone());
                for lesson in module.lessons() {
                    self.lesson_to_module
                        .insert(lesson.id.clone(), module.id.clone());
                }
            }
        }
        self.curricula.insert(curriculum.id.clone(), curriculum);
    }

    fn curriculum(&self, curriculum_id: &str) -> Result<&Curriculum, EngineError> {
        self.curricula
            .get(curriculum_id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Curriculum, curriculum_id))
    }
}

#[async_trait]
impl StructureReader for InMemoryStructure {
    async fn settings(
        &self,
        curriculum_id: &str,
    ) -> Result<CurriculumProgressionSettings, EngineError> {
        Ok(self.curriculum(curriculum_id)?.settings.clone())
    }

    async fn levels(&self, curriculum_id: &str) -> Result<Vec<Level>, EngineError> {
        Ok(self.curriculum(curriculum_id)?.levels.clone())
    }

    async fn modules_in_level(&self, level_id: &str) -> Result<Vec<Module>, EngineError> {
        self.levels
            .get(level_id)
            .map(|l| l.modules.clone())
            .ok_or_else(|| EngineError::not_found(EntityKind::Level, level_id))
    }

    async fn lessons_in_module(&self, module_id: &str) -> Result<Vec<Lesson>, EngineError> {
        self.modules
            .get(module_id)
            .map(|m| m.lessons().cloned().collect())
            .ok_or_else(|| EngineError::not_found(EntityKind::Module, module_id))
    }

    async fn criteria_for_level(
        &self,
        level_id: &str,
    ) -> Result<Vec<LevelAssessmentCriterion>, EngineError> {
        self.levels
            .get(level_id)
            .map(|l| {
                let mut criteria = l.criteria.clone();
                criteria.sort_by_key(|c| c.sequence_order);
                criteria
            })
            .ok_or_else(|| EngineError::not_found(EntityKind::Level, level_id))
    }

    async fn curriculum_of_module(&self, module_id: &str) -> Result<String, EngineError> {
        self.module_to_curriculum
            .get(module_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(EntityKind::Module, module_id))
    }

    async fn curriculum_of_level(&self, level_id: &str) -> Result<String, EngineError> {
        self.level_to_curriculum
            .get(level_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(EntityKind::Level, level_id))
    }

    async fn module_of_lesson(&self, lesson_id: &str) -> Result<String, EngineError> {
        self.lesson_to_module
            .get(lesson_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(EntityKind::Lesson, lesson_id))
    }
}

#[derive(Debug, Default)]
struct Inner {
    students: HashSet<String>,
    lesson_progress: HashMap<(String, String), StudentLessonProgress>,
    module_unlocks: HashMap<(String, String), StudentModuleUnlock>,
    assessments: HashMap<Uuid, StudentLevelAssessment>,
}

/// Progress records behind a single `RwLock`: writers replace whole
/// records atomically, readers never see a partial update.
#[derive(Debug, Default)]
pub struct InMemoryProgressStore {
    inner: RwLock<Inner>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a saved snapshot.
    pub fn from_snapshot(snapshot: &ProgressSnapshot) -> Self {
        let mut inner = Inner::default();
        inner.students = snapshot.students.iter().cloned().collect();
        for record in &snapshot.lesson_progress {
            inner.students.insert(record.student_id.clone());
            inner.lesson_progress.insert(
                (record.student_id.clone(), record.lesson_id.clone()),
                record.clone(),
            );
        }
        for record in &snapshot.module_unlocks {
            inner.module_unlocks.insert(
                (record.student_id.clone(), record.module_id.clone()),
                record.clone(),
            );
        }
        for record in &snapshot.assessments {
            inner.assessments.insert(record.id, record.clone());
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Serialize the current state into a snapshot for a curriculum.
    pub async fn to_snapshot(&self, curriculum_id: &str) -> ProgressSnapshot {
        let inner = self.inner.read().await;
        let mut snapshot = ProgressSnapshot::empty(curriculum_id);

        snapshot.students = inner.students.iter().cloned().collect();
        snapshot.students.sort();

        snapshot.lesson_progress = inner.lesson_progress.values().cloned().collect();
        snapshot
            .lesson_progress
            .sort_by(|a, b| (&a.student_id, &a.lesson_id).cmp(&(&b.student_id, &b.lesson_id)));

        snapshot.module_unlocks = inner.module_unlocks.values().cloned().collect();
        snapshot
            .module_unlocks
            .sort_by(|a, b| (&a.student_id, &a.module_id).cmp(&(&b.student_id, &b.module_id)));

        snapshot.assessments = inner.assessments.values().cloned().collect();
        snapshot.assessments.sort_by_key(|a| a.created_at);

        snapshot
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn student_exists(&self, student_id: &str) -> Result<bool, EngineError> {
        Ok(self.inner.read().await.students.contains(student_id))
    }

    async fn register_student(&self, student_id: &str) -> Result<(), EngineError> {
        self.inner
            .write()
            .await
            .students
            .insert(student_id.to_string());
        Ok(())
    }

    async fn lesson_progress(
        &self,
        student_id: &str,
        lesson_id: &str,
    ) -> Result<Option<StudentLessonProgress>, EngineError> {
        Ok(self
            .inner
            .read()
            .await
            .lesson_progress
            .get(&(student_id.to_string(), lesson_id.to_string()))
            .cloned())
    }

    async fn put_lesson_progress(
        &self,
        record: StudentLessonProgress,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.write().await;
        inner.students.insert(record.student_id.clone());
        inner.lesson_progress.insert(
            (record.student_id.clone(), record.lesson_id.clone()),
            record,
        );
        Ok(())
    }

    async fn module_unlock(
        &self,
        student_id: &str,
        module_id: &str,
    ) -> Result<Option<StudentModuleUnlock>, EngineError> {
        Ok(self
            .inner
            .read()
            .await
            .module_unlocks
            .get(&(student_id.to_string(), module_id.to_string()))
            .cloned())
    }

    async fn put_module_unlock(&self, record: StudentModuleUnlock) -> Result<(), EngineError> {
        self.inner.write().await.module_unlocks.insert(
            (record.student_id.clone(), record.module_id.clone()),
            record,
        );
        Ok(())
    }

    async fn assessment(
        &self,
        assessment_id: Uuid,
    ) -> Result<Option<StudentLevelAssessment>, EngineError> {
        Ok(self
            .inner
            .read()
            .await
            .assessments
            .get(&assessment_id)
            .cloned())
    }

    async fn put_assessment(&self, record: StudentLevelAssessment) -> Result<(), EngineError> {
        self.inner.write().await.assessments.insert(record.id, record);
        Ok(())
    }

    async fn assessments_for_student(
        &self,
        student_id: &str,
        curriculum_id: &str,
    ) -> Result<Vec<StudentLevelAssessment>, EngineError> {
        let inner = self.inner.read().await;
        let mut records: Vec<StudentLevelAssessment> = inner
            .assessments
            .values()
            .filter(|a| a.student_id == student_id && a.curriculum_id == curriculum_id)
            .cloned()
            .collect();
        records.sort_by_key(|a| a.created_at);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use masterytrack_core::model::Section;
    use masterytrack_core::records::AssessmentStatus;

    fn sample_curriculum() -> Curriculum {
        Curriculum {
            id: "swim-101".into(),
            name: "Learn to Swim".into(),
            description: String::new(),
            settings: CurriculumProgressionSettings::default(),
            levels: vec![Level {
                id: "level-1".into(),
                name: "One".into(),
                criteria: vec![
                    LevelAssessmentCriterion {
                        id: "c-b".into(),
                        name: "B".into(),
                        sequence_order: 2,
                        weight: 1.0,
                        max_score: 10,
                        min_passing_score: 5,
                    },
                    LevelAssessmentCriterion {
                        id: "c-a".into(),
                        name: "A".into(),
                        sequence_order: 1,
                        weight: 1.0,
                        max_score: 10,
                        min_passing_score: 5,
                    },
                ],
                modules: vec![Module {
                    id: "mod-1".into(),
                    name: "Getting Wet".into(),
                    sections: vec![Section {
                        id: "sec-1".into(),
                        name: "Basics".into(),
                        lessons: vec![
                            Lesson {
                                id: "les-1".into(),
                                name: "Enter".into(),
                            },
                            Lesson {
                                id: "les-2".into(),
                                name: "Bubbles".into(),
                            },
                        ],
                    }],
                }],
            }],
        }
    }

    #[tokio::test]
    async fn structure_lookups() {
        let structure = InMemoryStructure::new(sample_curriculum());
        assert_eq!(
            structure.module_of_lesson("les-2").await.unwrap(),
            "mod-1"
        );
        assert_eq!(
            structure.curriculum_of_module("mod-1").await.unwrap(),
            "swim-101"
        );
        assert_eq!(
            structure.curriculum_of_level("level-1").await.unwrap(),
            "swim-101"
        );
        let lessons = structure.lessons_in_module("mod-1").await.unwrap();
        assert_eq!(lessons.len(), 2);
    }

    #[tokio::test]
    async fn structure_unknown_ids_are_not_found() {
        let structure = InMemoryStructure::new(sample_curriculum());
        assert!(structure.module_of_lesson("nope").await.is_err());
        assert!(structure.lessons_in_module("nope").await.is_err());
        assert!(structure.settings("nope").await.is_err());
    }

    #[tokio::test]
    async fn criteria_come_back_in_sequence_order() {
        let structure = InMemoryStructure::new(sample_curriculum());
        let criteria = structure.criteria_for_level("level-1").await.unwrap();
        let ids: Vec<&str> = criteria.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c-a", "c-b"]);
    }

    #[tokio::test]
    async fn progress_records_roundtrip() {
        let store = InMemoryProgressStore::new();
        assert!(!store.student_exists("s1").await.unwrap());

        let mut record = StudentLessonProgress::new("s1", "les-1");
        record.stars_earned = Some(2);
        record.is_completed = true;
        store.put_lesson_progress(record).await.unwrap();

        assert!(store.student_exists("s1").await.unwrap());
        let loaded = store.lesson_progress("s1", "les-1").await.unwrap().unwrap();
        assert_eq!(loaded.stars_earned, Some(2));
        assert!(store.lesson_progress("s1", "les-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn snapshot_roundtrip_preserves_records() {
        let store = InMemoryProgressStore::new();
        store.register_student("s1").await.unwrap();

        let mut record = StudentLessonProgress::new("s1", "les-1");
        record.stars_earned = Some(3);
        record.is_completed = true;
        store.put_lesson_progress(record).await.unwrap();

        let mut assessment = StudentLevelAssessment::new("s1", "level-1", "swim-101", "coach");
        assessment.status = AssessmentStatus::Suspended;
        store.put_assessment(assessment.clone()).await.unwrap();

        let snapshot = store.to_snapshot("swim-101").await;
        assert_eq!(snapshot.students, vec!["s1"]);

        let rebuilt = InMemoryProgressStore::from_snapshot(&snapshot);
        assert!(rebuilt.student_exists("s1").await.unwrap());
        let loaded = rebuilt.assessment(assessment.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, AssessmentStatus::Suspended);
    }
}
