//! TOML curriculum parser.
//!
//! Loads curriculum definitions from TOML files and directories, and
//! validates them for structural issues before they reach the engine.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{
    Curriculum, CurriculumProgressionSettings, Lesson, Level, LevelAssessmentCriterion, Module,
    Section,
};

/// Intermediate TOML structure for parsing curriculum files.
#[derive(Debug, Deserialize)]
struct TomlCurriculumFile {
    curriculum: TomlCurriculumHeader,
    #[serde(default)]
    levels: Vec<TomlLevel>,
}

#[derive(Debug, Deserialize)]
struct TomlCurriculumHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    settings: CurriculumProgressionSettings,
}

#[derive(Debug, Deserialize)]
struct TomlLevel {
    id: String,
    name: String,
    #[serde(default)]
    criteria: Vec<TomlCriterion>,
    #[serde(default)]
    modules: Vec<TomlModule>,
}

#[derive(Debug, Deserialize)]
struct TomlCriterion {
    id: String,
    name: String,
    sequence_order: u32,
    #[serde(default = "default_weight")]
    weight: f64,
    max_score: u32,
    #[serde(default)]
    min_passing_score: u32,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct TomlModule {
    id: String,
    name: String,
    #[serde(default)]
    sections: Vec<TomlSection>,
}

#[derive(Debug, Deserialize)]
struct TomlSection {
    id: String,
    name: String,
    #[serde(default)]
    lessons: Vec<TomlLesson>,
}

#[derive(Debug, Deserialize)]
struct TomlLesson {
    id: String,
    name: String,
}

/// Parse a single TOML file into a [`Curriculum`].
pub fn parse_curriculum(path: &Path) -> Result<Curriculum> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read curriculum file: {}", path.display()))?;

    parse_curriculum_str(&content, path)
}

/// Parse a TOML string into a [`Curriculum`] (useful for testing).
pub fn parse_curriculum_str(content: &str, source_path: &Path) -> Result<Curriculum> {
    let parsed: TomlCurriculumFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let levels = parsed
        .levels
        .into_iter()
        .map(|l| Level {
            id: l.id,
            name: l.name,
            criteria: l
                .criteria
                .into_iter()
                .map(|c| LevelAssessmentCriterion {
                    id: c.id,
                    name: c.name,
                    sequence_order: c.sequence_order,
                    weight: c.weight,
                    max_score: c.max_score,
                    min_passing_score: c.min_passing_score,
                })
                .collect(),
            modules: l
                .modules
                .into_iter()
                .map(|m| Module {
                    id: m.id,
                    name: m.name,
                    sections: m
                        .sections
                        .into_iter()
                        .map(|s| Section {
                            id: s.id,
                            name: s.name,
                            lessons: s
                                .lessons
                                .into_iter()
                                .map(|le| Lesson {
                                    id: le.id,
                                    name: le.name,
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    Ok(Curriculum {
        id: parsed.curriculum.id,
        name: parsed.curriculum.name,
        description: parsed.curriculum.description,
        settings: parsed.curriculum.settings,
        levels,
    })
}

/// Recursively load all `.toml` curriculum files from a directory.
pub fn load_curriculum_directory(dir: &Path) -> Result<Vec<Curriculum>> {
    let mut curricula = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            curricula.extend(load_curriculum_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_curriculum(&path) {
                Ok(c) => curricula.push(c),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(curricula)
}

/// A warning from curriculum validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The offending entity id (if applicable).
    pub entity_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a curriculum for common issues.
pub fn validate_curriculum(curriculum: &Curriculum) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let threshold = curriculum.settings.unlock_threshold_percent;
    if !(0.0..=100.0).contains(&threshold) {
        warnings.push(ValidationWarning {
            entity_id: Some(curriculum.id.clone()),
            message: format!("unlock_threshold_percent out of range: {threshold}"),
        });
    }

    // Duplicate ids anywhere in the tree confuse record keys.
    let mut seen = std::collections::HashSet::new();
    let mut check_id = |id: &str, warnings: &mut Vec<ValidationWarning>| {
        if !seen.insert(id.to_string()) {
            warnings.push(ValidationWarning {
                entity_id: Some(id.to_string()),
                message: format!("duplicate id in curriculum tree: {id}"),
            });
        }
    };

    for level in &curriculum.levels {
        check_id(&level.id, &mut warnings);

        let mut seen_orders = std::collections::HashSet::new();
        for c in &level.criteria {
            check_id(&c.id, &mut warnings);
            if !seen_orders.insert(c.sequence_order) {
                warnings.push(ValidationWarning {
                    entity_id: Some(c.id.clone()),
                    message: format!(
                        "duplicate criterion sequence_order {} in level {}",
                        c.sequence_order, level.id
                    ),
                });
            }
            if c.weight <= 0.0 {
                warnings.push(ValidationWarning {
                    entity_id: Some(c.id.clone()),
                    message: format!("criterion weight must be positive, got {}", c.weight),
                });
            }
            if c.max_score == 0 {
                warnings.push(ValidationWarning {
                    entity_id: Some(c.id.clone()),
                    message: "criterion max_score must be positive".into(),
                });
            }
            if c.min_passing_score > c.max_score {
                warnings.push(ValidationWarning {
                    entity_id: Some(c.id.clone()),
                    message: format!(
                        "min_passing_score {} exceeds max_score {}",
                        c.min_passing_score, c.max_score
                    ),
                });
            }
        }

        if level.criteria.is_empty() {
            warnings.push(ValidationWarning {
                entity_id: Some(level.id.clone()),
                message: "level has no assessment criteria; completion passes vacuously".into(),
            });
        }

        for module in &level.modules {
            check_id(&module.id, &mut warnings);
            for section in &module.sections {
                check_id(&section.id, &mut warnings);
                for lesson in &section.lessons {
                    check_id(&lesson.id, &mut warnings);
                }
            }
            if module.lesson_count() == 0 {
                warnings.push(ValidationWarning {
                    entity_id: Some(module.id.clone()),
                    message: "module has no lessons and will always be unlocked".into(),
                });
            }
        }
    }

    warnings
}
