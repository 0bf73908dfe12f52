use std::path::PathBuf;

use anyhow::Context;
use attendance_marks_analysis::{cohort, lookup, report, AnalysisConfig, AnalysisContext};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "attendance-marks-analysis")]
#[command(
    about = "Attendance and marks analysis for school spreadsheet exports",
    long_about = None
)]
struct Cli {
    /// Log pipeline progress to stderr
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ThresholdArgs {
    /// Attendance percentage below which a class is flagged
    #[arg(long)]
    low_attendance: Option<f64>,
    /// Attendance percentage above which a class is flagged
    #[arg(long)]
    high_attendance: Option<f64>,
    /// z-score below which a subject mark is flagged
    #[arg(long, allow_hyphen_values = true)]
    low_marks: Option<f64>,
    /// z-score above which a subject mark is flagged
    #[arg(long, allow_hyphen_values = true)]
    high_marks: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse an attendance export against a marks export
    Analyze {
        #[arg(long)]
        attendance: PathBuf,
        #[arg(long)]
        marks: PathBuf,
        /// TOML file with analysis settings
        #[arg(long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        thresholds: ThresholdArgs,
        /// Write the JSON result here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Directory for the scatter plot and histogram
        #[arg(long)]
        plots_dir: Option<PathBuf>,
        /// Save the analysis context for the report and students commands
        #[arg(long)]
        context: Option<PathBuf>,
    },
    /// Generate a Markdown report for students flagged in several subjects
    Report {
        #[arg(long)]
        context: PathBuf,
        #[arg(long, default_value = "student_reports.md")]
        out: PathBuf,
        /// Override the minimum number of low-mark subjects
        #[arg(long)]
        min_subjects: Option<usize>,
    },
    /// List students, or search them by StudentID
    Students {
        #[arg(long)]
        context: PathBuf,
        #[arg(long)]
        query: Option<String>,
    },
    /// Write a configuration file with the default settings
    InitConfig {
        #[arg(long, default_value = "analysis.toml")]
        out: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn apply_thresholds(config: &mut AnalysisConfig, args: &ThresholdArgs) {
    let thresholds = &mut config.thresholds;
    if let Some(value) = args.low_attendance {
        thresholds.low_attendance = value;
    }
    if let Some(value) = args.high_attendance {
        thresholds.high_attendance = value;
    }
    if let Some(value) = args.low_marks {
        thresholds.low_marks = value;
    }
    if let Some(value) = args.high_marks {
        thresholds.high_marks = value;
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze {
            attendance,
            marks,
            config,
            thresholds,
            out,
            plots_dir,
            context,
        } => {
            let mut settings = match config {
                Some(path) => AnalysisConfig::load_from_file(&path)?,
                None => AnalysisConfig::default(),
            };
            apply_thresholds(&mut settings, &thresholds);

            let analysis = AnalysisContext::load(&attendance, &marks, settings)
                .context("failed to load the attendance and marks exports")?;
            let results = analysis.analyze(plots_dir.as_deref())?;

            for warning in &results.warnings {
                eprintln!("Warning: {warning}");
            }

            let json = serde_json::to_string_pretty(&results)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Results written to {}.", path.display());
                }
                None => println!("{json}"),
            }

            if let Some(path) = context {
                analysis.save(&path)?;
                eprintln!("Context saved to {}.", path.display());
            }
        }
        Commands::Report {
            context,
            out,
            min_subjects,
        } => {
            let analysis = AnalysisContext::open(&context)?;
            let prepared = analysis.prepare();
            let settings = &analysis.config.report;
            let low_marks =
                cohort::marks_below(&prepared.marks, analysis.config.thresholds.low_marks);
            let students = report::flagged_students(
                &low_marks,
                min_subjects.unwrap_or(settings.min_flagged_subjects),
            );

            let document = report::build_report(
                &prepared.marks,
                &prepared.attendance,
                &students,
                settings,
                chrono::Local::now().date_naive(),
            );
            std::fs::write(&out, document)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!(
                "Report for {} students written to {}.",
                students.len(),
                out.display()
            );
        }
        Commands::Students { context, query } => {
            let analysis = AnalysisContext::open(&context)?;
            let prepared = analysis.prepare();
            let json = match query {
                Some(query) => serde_json::to_string_pretty(&lookup::search_students(
                    &prepared.marks,
                    &prepared.attendance,
                    &query,
                ))?,
                None => serde_json::to_string_pretty(&lookup::list_students(
                    &prepared.marks,
                    &prepared.attendance,
                ))?,
            };
            println!("{json}");
        }
        Commands::InitConfig { out } => {
            AnalysisConfig::default().save_to_file(&out)?;
            println!("Default configuration written to {}.", out.display());
        }
    }

    Ok(())
}
