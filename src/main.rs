use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use resume_customizer::completion::CompletionClient;
use resume_customizer::config::{ConfigManager, ConfigOverrides};
use resume_customizer::error::CustomizeError;
use resume_customizer::{app_log, app_span, load_resume, CustomizeRequest, ResumeCustomizer};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::Instrument;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

#[derive(Parser)]
#[command(name = "resume-customizer", version)]
#[command(about = "Reorder RenderCV resume highlights and technologies for a job posting")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write JSON logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Customize a resume based on a job posting and render it
    Customize(CustomizeArgs),
    /// Check that a resume file has the layout the customizer expects
    Validate(ValidateArgs),
}

#[derive(Args)]
struct CustomizeArgs {
    /// RenderCV YAML resume
    resume_file: PathBuf,

    /// Plain-text job posting
    job_posting_file: PathBuf,

    /// Output filename (without extension)
    #[arg(short, long, default_value = "tempresume")]
    output: PathBuf,

    /// Keep the customized YAML after a successful render
    #[arg(long)]
    keep_yaml: bool,

    /// Write the customized YAML to this path (implies --keep-yaml)
    #[arg(long, value_name = "PATH")]
    yaml_path: Option<PathBuf>,

    /// Model identifier, e.g. openai/gpt-5-mini
    #[arg(long)]
    model: Option<String>,

    /// Configuration file (defaults to ./resume-customizer.yaml when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct ValidateArgs {
    /// RenderCV YAML resume
    resume_file: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    if let Err(e) = init_logging(cli.verbose, cli.log_file.as_deref()) {
        let err = CustomizeError::Io(e);
        report(&err);
        return ExitCode::from(err.exit_code());
    }

    let result = match cli.command {
        Command::Customize(args) => customize(args, cli.verbose).await,
        Command::Validate(args) => validate(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::from(err.exit_code())
        }
    }
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let default_directive = if verbose {
        "resume_customizer=debug,warn"
    } else {
        "warn"
    };
    let stderr_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(Mutex::new(file))
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_filter(EnvFilter::new("resume_customizer=trace,info")),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(stderr_filter),
        )
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")
}

async fn customize(args: CustomizeArgs, verbose: bool) -> Result<(), CustomizeError> {
    let config = ConfigManager::load(
        args.config.as_deref(),
        ConfigOverrides {
            model: args.model,
            keep_intermediate: args.keep_yaml,
            intermediate_path: args.yaml_path,
            verbose,
        },
    )?;

    // Fails on a missing key before any file or network work.
    let client = CompletionClient::new(&config)?;

    if config.verbose {
        println!("Processing resume: {}", args.resume_file.display());
        println!("Job posting: {}", args.job_posting_file.display());
        println!("Output: {}", args.output.display());
        println!("Model: {}", client.model());
    }

    let request = CustomizeRequest {
        resume_path: args.resume_file,
        job_posting_path: args.job_posting_file,
        output_stem: args.output,
    };

    println!("🤖 Customizing resume with AI...");
    let span = app_span!(
        "customize",
        resume = %request.resume_path.display(),
        model = %config.model
    );
    let outcome = ResumeCustomizer::new(&config, client)
        .customize(&request)
        .instrument(span)
        .await?;

    if config.verbose && !outcome.renderer_output.is_empty() {
        eprintln!("RenderCV output:\n{}", outcome.renderer_output);
    }
    println!(
        "✅ Resume rendered successfully as '{}'",
        outcome.artifact.display()
    );
    if let Some(path) = &outcome.intermediate {
        println!("📄 Customized resume YAML saved as: {}", path.display());
    }

    Ok(())
}

async fn validate(args: ValidateArgs) -> Result<(), CustomizeError> {
    let resume = load_resume(&args.resume_file).await?;

    println!(
        "✅ {} is a valid resume for {}",
        args.resume_file.display(),
        resume.name()
    );
    for experience in resume.experiences() {
        println!(
            "  • Experience {}: {} highlights",
            experience.describe(),
            experience.highlights.len()
        );
    }
    for technology in resume.technologies() {
        println!(
            "  • Technologies {}: {} details",
            technology.describe(),
            technology.details.len()
        );
    }

    Ok(())
}

fn report(err: &CustomizeError) {
    app_log!(
        debug,
        kind = err.kind(),
        exit_code = err.exit_code(),
        "Run terminated: {}",
        err
    );

    eprintln!("❌ Error: {}", err);
    match err {
        CustomizeError::Format { raw, .. } => {
            eprintln!("\nRaw AI response:\n{}", raw);
        }
        CustomizeError::Render { output, .. } if !output.is_empty() => {
            eprintln!("\nRenderer output:\n{}", output);
        }
        _ => {}
    }
    eprintln!("💡 {}", err.hint());
}
