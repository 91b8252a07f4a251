//! mocktest CLI: take timed mock exams from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mocktest", version, about = "Timed mock exam sessions in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a timed exam
    Take {
        /// Exam identifier (defaults to the id of --question-set)
        #[arg(long)]
        exam: Option<String>,

        /// Path to a .toml question set or directory (bypasses the configured backend)
        #[arg(long)]
        question_set: Option<PathBuf>,

        /// Attempt length in seconds
        #[arg(long)]
        duration: Option<u32>,

        /// Directory for the JSON report (local backend only)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Locale for question text, e.g. "en" or "hi"
        #[arg(long)]
        locale: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print a saved report
    Show {
        /// Report JSON file
        #[arg(long)]
        report: PathBuf,

        /// Output format: text, json, markdown, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate question set TOML files
    Validate {
        /// Path to question set file or directory
        #[arg(long)]
        question_set: PathBuf,
    },

    /// Create starter config and sample question set
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mocktest=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take {
            exam,
            question_set,
            duration,
            output,
            locale,
            config,
        } => {
            commands::take::execute(exam, question_set, duration, output, locale, config).await
        }
        Commands::Show {
            report,
            format,
            output,
        } => commands::show::execute(report, format, output),
        Commands::Validate { question_set } => commands::validate::execute(question_set),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
