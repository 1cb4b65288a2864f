use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use interview_reviser::{
    AppConfig, ChatClient, ChatConfig, load_templates, planned_call_count, prepare_transcript,
    process_transcript, read_transcript_file,
};

#[derive(Parser)]
#[command(name = "interview-reviser")]
#[command(author, version, about = "Interview transcript revision pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Revise a speaker-labeled transcript into a formatted interview document
    Process {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Input transcript, overrides `input_file`
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output document (.docx or text), overrides `output_file`
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Prompt templates file (YAML), overrides `prompts_file`
        #[arg(long)]
        prompts: Option<PathBuf>,

        /// JSON run report, overrides `report_file`
        #[arg(long)]
        report: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Normalize and chunk a transcript without calling the model
    Analyze {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Input transcript, overrides `input_file`
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            config,
            input,
            output,
            prompts,
            report,
            verbose,
        } => {
            setup_logging(verbose);
            let mut config = load_config(&config)?;
            if let Some(path) = input {
                config.input_file = Some(path);
            }
            if let Some(path) = output {
                config.output_file = Some(path);
            }
            if prompts.is_some() {
                config.prompts_file = prompts;
            }
            if report.is_some() {
                config.report_file = report;
            }
            run_process(config).await
        }
        Commands::Analyze {
            config,
            input,
            verbose,
        } => {
            setup_logging(verbose);
            let mut config = load_config(&config)?;
            if let Some(path) = input {
                config.input_file = Some(path);
            }
            analyze_transcript(&config)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_config(path: &Path) -> Result<AppConfig> {
    info!("Loading configuration from {:?}", path);
    AppConfig::from_file(path).context("Failed to load configuration")
}

async fn run_process(config: AppConfig) -> Result<()> {
    let input = config
        .input_file
        .clone()
        .context("No input transcript: set `input_file` or pass --input")?;
    let output = config
        .output_file
        .clone()
        .context("No output document: set `output_file` or pass --output")?;

    let templates = load_templates(&config)?;
    let client = ChatClient::new(ChatConfig::from_app_config(&config))?;
    info!(
        "Using model {} ({} workers, {} revise iterations, polish {})",
        client.model(),
        config.max_workers,
        config.revise_iteration,
        if config.enable_polish { "on" } else { "off" }
    );

    let report = process_transcript(&config, templates, Arc::new(client), &input, &output).await?;

    info!(
        "Complete: {} of {} chunks revised, output written to {}",
        report.chunks_succeeded, report.chunks, report.output_path
    );
    if report.chunks_failed > 0 {
        info!(
            "Chunks needing manual review: {:?}",
            report
                .failed_chunk_indices
                .iter()
                .map(|i| i + 1)
                .collect::<Vec<_>>()
        );
    }

    Ok(())
}

fn analyze_transcript(config: &AppConfig) -> Result<()> {
    let input = config
        .input_file
        .as_ref()
        .context("No input transcript: set `input_file` or pass --input")?;

    info!("Analyzing transcript from {:?}", input);
    let lines = read_transcript_file(input)?;
    let prepared =
        prepare_transcript(&lines, config).context("Failed to normalize input transcript")?;
    let turns = &prepared.normalization.turns;

    println!("Transcript Analysis");
    println!("===================");
    println!("Input lines: {}", prepared.input_lines);
    println!("Merged turns: {}", turns.len());
    println!("Paired turns: {}", prepared.normalization.paired_turns.len());
    println!();

    println!("Speakers");
    println!("--------");
    let mut speakers: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for turn in turns {
        let entry = speakers.entry(turn.speaker.as_str()).or_default();
        entry.0 += 1;
        entry.1 += turn.content.chars().count();
    }
    for (speaker, (turn_count, chars)) in &speakers {
        println!("{}: {} turns, {} chars", speaker, turn_count, chars);
    }
    println!();

    println!("Chunks");
    println!("------");
    println!("Chunk size limit: {} chars", config.chunk_size);
    println!("Total chunks: {}", prepared.chunks.len());
    for chunk in &prepared.chunks {
        let len = chunk.char_len();
        let marker = if len > config.chunk_size {
            " (oversized turn)"
        } else {
            ""
        };
        println!("Chunk {}: {} chars{}", chunk.index + 1, len, marker);
    }
    println!();

    println!(
        "Planned model calls: {}",
        planned_call_count(prepared.chunks.len(), config)
    );

    Ok(())
}
