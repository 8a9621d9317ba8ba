//! The `masterytrack init` command.

use anyhow::Result;

use masterytrack_core::snapshot::ProgressSnapshot;

pub fn execute() -> Result<()> {
    // Create a starter curriculum
    if std::path::Path::new("curriculum.toml").exists() {
        println!("curriculum.toml already exists, skipping.");
    } else {
        std::fs::write("curriculum.toml", EXAMPLE_CURRICULUM)?;
        println!("Created curriculum.toml");
    }

    // Create an empty progress file matching the starter curriculum
    let progress_path = std::path::Path::new("progress.json");
    if progress_path.exists() {
        println!("progress.json already exists, skipping.");
    } else {
        ProgressSnapshot::empty("swim-101").save_json(progress_path)?;
        println!("Created progress.json");
    }

    println!("\nNext steps:");
    println!("  1. Edit curriculum.toml with your levels, modules, and lessons");
    println!("  2. Run: masterytrack validate --curriculum curriculum.toml");
    println!("  3. Run: masterytrack enroll --curriculum curriculum.toml --student alice");
    println!(
        "  4. Run: masterytrack grade --curriculum curriculum.toml \
         --student alice --lesson les-enter --stars 3 --instructor coach-sam"
    );

    Ok(())
}

const EXAMPLE_CURRICULUM: &str = r#"[curriculum]
id = "swim-101"
name = "Learn to Swim"
description = "A starter curriculum: water confidence through first strokes"

[curriculum.settings]
unlock_threshold_percent = 70.0
require_min_one_star_per_lesson = false
allow_cross_level_progression = false
allow_lesson_retakes = true
track_time_spent = false
track_attempts = true

[[levels]]
id = "level-1"
name = "Water Confidence"

[[levels.criteria]]
id = "c-submerge"
name = "Submerge face for 5 seconds"
sequence_order = 1
weight = 1.0
max_score = 10
min_passing_score = 5

[[levels.criteria]]
id = "c-float"
name = "Back float with support"
sequence_order = 2
weight = 2.0
max_score = 10
min_passing_score = 6

[[levels.modules]]
id = "mod-getting-wet"
name = "Getting Wet"

[[levels.modules.sections]]
id = "sec-entry"
name = "Pool Entry"

[[levels.modules.sections.lessons]]
id = "les-enter"
name = "Enter the pool safely"

[[levels.modules.sections.lessons]]
id = "les-bubbles"
name = "Blow bubbles"

[[levels.modules.sections]]
id = "sec-floating"
name = "Floating"

[[levels.modules.sections.lessons]]
id = "les-front-float"
name = "Front float"

[[levels]]
id = "level-2"
name = "First Strokes"

[[levels.criteria]]
id = "c-glide"
name = "Push-off glide"
sequence_order = 1
weight = 1.0
max_score = 10
min_passing_score = 5

[[levels.modules]]
id = "mod-kicking"
name = "Kicking"

[[levels.modules.sections]]
id = "sec-kick"
name = "Kick Drills"

[[levels.modules.sections.lessons]]
id = "les-flutter"
name = "Flutter kick with board"
"#;
