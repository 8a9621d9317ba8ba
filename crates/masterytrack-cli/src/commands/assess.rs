//! The `masterytrack assess` subcommands.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};

use masterytrack_core::records::StudentLevelAssessment;

use super::Workspace;
use crate::AssessAction;

pub async fn execute(curriculum: PathBuf, state: PathBuf, action: AssessAction) -> Result<()> {
    let workspace = Workspace::open(&curriculum, &state)?;

    let record = match action {
        AssessAction::Start {
            student,
            level,
            instructor,
        } => {
            workspace
                .engine
                .create_assessment(&student, &level, &instructor)
                .await?
        }
        AssessAction::Complete { id, scores, notes } => {
            let scores = parse_scores(&scores)?;
            workspace
                .engine
                .complete_assessment(id, scores, notes)
                .await?
        }
        AssessAction::Suspend { id, reason } => {
            workspace.engine.suspend_assessment(id, reason).await?
        }
        AssessAction::Resume { id, notes } => {
            workspace.engine.resume_assessment(id, notes).await?
        }
    };

    workspace.save().await?;
    print_assessment(&record);
    Ok(())
}

/// Parse repeated `criterion-id=score` arguments into a score sheet.
fn parse_scores(raw: &[String]) -> Result<BTreeMap<String, u32>> {
    let mut scores = BTreeMap::new();
    for entry in raw {
        let (criterion, value) = entry
            .split_once('=')
            .with_context(|| format!("expected criterion-id=score, got '{entry}'"))?;
        let value: u32 = value
            .parse()
            .with_context(|| format!("invalid score in '{entry}'"))?;
        scores.insert(criterion.to_string(), value);
    }
    Ok(scores)
}

fn print_assessment(record: &StudentLevelAssessment) {
    println!(
        "Assessment {} for student {}, level {}: {}",
        record.id, record.student_id, record.level_id, record.status
    );
    if let Some(overall) = record.overall_score {
        println!(
            "  overall {:.1}%, {}",
            overall,
            if record.passed == Some(true) {
                "passed"
            } else {
                "failed"
            }
        );
        println!(
            "  can continue to next level: {}",
            record.can_continue_next_level
        );
    }
    if let Some(reason) = &record.suspension_reason {
        println!("  suspended: {reason}");
    }
}
