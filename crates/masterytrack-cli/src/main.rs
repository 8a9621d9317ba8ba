//! masterytrack CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use uuid::Uuid;

mod commands;

#[derive(Parser)]
#[command(name = "masterytrack", version, about = "Curriculum progression and mastery tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter curriculum and empty progress file
    Init,

    /// Validate curriculum TOML files
    Validate {
        /// Path to curriculum file or directory
        #[arg(long)]
        curriculum: PathBuf,
    },

    /// Register a student in the progress file
    Enroll {
        /// Path to curriculum TOML
        #[arg(long)]
        curriculum: PathBuf,

        /// Path to progress snapshot JSON
        #[arg(long, default_value = "progress.json")]
        state: PathBuf,

        /// Student identifier
        #[arg(long)]
        student: String,
    },

    /// Record a star grade for a lesson, or apply a batch file
    Grade {
        /// Path to curriculum TOML
        #[arg(long)]
        curriculum: PathBuf,

        /// Path to progress snapshot JSON
        #[arg(long, default_value = "progress.json")]
        state: PathBuf,

        /// Student identifier
        #[arg(long)]
        student: Option<String>,

        /// Lesson identifier
        #[arg(long)]
        lesson: Option<String>,

        /// Star grade, 0-3
        #[arg(long)]
        stars: Option<u8>,

        /// Grading instructor identifier
        #[arg(long)]
        instructor: Option<String>,

        /// Free-text grading notes
        #[arg(long)]
        notes: Option<String>,

        /// Time spent on the lesson, in seconds (telemetry)
        #[arg(long)]
        time_spent_secs: Option<u64>,

        /// JSON file with an ordered array of grade requests
        #[arg(long)]
        batch: Option<PathBuf>,
    },

    /// Evaluate and print a module's unlock state for a student
    Unlock {
        /// Path to curriculum TOML
        #[arg(long)]
        curriculum: PathBuf,

        /// Path to progress snapshot JSON
        #[arg(long, default_value = "progress.json")]
        state: PathBuf,

        /// Student identifier
        #[arg(long)]
        student: String,

        /// Module identifier
        #[arg(long)]
        module: String,
    },

    /// Manage level assessments
    Assess {
        /// Path to curriculum TOML
        #[arg(long)]
        curriculum: PathBuf,

        /// Path to progress snapshot JSON
        #[arg(long, default_value = "progress.json")]
        state: PathBuf,

        #[command(subcommand)]
        action: AssessAction,
    },

    /// Print a student's progression summary
    Summary {
        /// Path to curriculum TOML
        #[arg(long)]
        curriculum: PathBuf,

        /// Path to progress snapshot JSON
        #[arg(long, default_value = "progress.json")]
        state: PathBuf,

        /// Student identifier
        #[arg(long)]
        student: String,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
enum AssessAction {
    /// Open a pending assessment for a student and level
    Start {
        /// Student identifier
        #[arg(long)]
        student: String,

        /// Level identifier
        #[arg(long)]
        level: String,

        /// Administering instructor identifier
        #[arg(long)]
        instructor: String,
    },

    /// Complete a pending assessment with criterion scores
    Complete {
        /// Assessment id
        #[arg(long)]
        id: Uuid,

        /// Criterion score as `criterion-id=score`; repeatable
        #[arg(long = "score")]
        scores: Vec<String>,

        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Suspend a pending assessment
    Suspend {
        /// Assessment id
        #[arg(long)]
        id: Uuid,

        /// Why the assessment is on hold
        #[arg(long)]
        reason: String,
    },

    /// Return a suspended assessment to pending
    Resume {
        /// Assessment id
        #[arg(long)]
        id: Uuid,

        /// Remediation notes to append
        #[arg(long)]
        notes: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("masterytrack=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { curriculum } => commands::validate::execute(curriculum),
        Commands::Enroll {
            curriculum,
            state,
            student,
        } => commands::enroll::execute(curriculum, state, student).await,
        Commands::Grade {
            curriculum,
            state,
            student,
            lesson,
            stars,
            instructor,
            notes,
            time_spent_secs,
            batch,
        } => {
            commands::grade::execute(
                curriculum,
                state,
                student,
                lesson,
                stars,
                instructor,
                notes,
                time_spent_secs,
                batch,
            )
            .await
        }
        Commands::Unlock {
            curriculum,
            state,
            student,
            module,
        } => commands::unlock::execute(curriculum, state, student, module).await,
        Commands::Assess {
            curriculum,
            state,
            action,
        } => commands::assess::execute(curriculum, state, action).await,
        Commands::Summary {
            curriculum,
            state,
            student,
            format,
        } => commands::summary::execute(curriculum, state, student, format).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
