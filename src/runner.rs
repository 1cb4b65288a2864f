use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::FormatError;
use crate::io::{RunReport, read_transcript_file};
use crate::llm::{PromptTemplates, TextBackend};
use crate::models::Chunk;
use crate::stages::{
    NormalizationResult, NormalizeConfig, RevisionPipeline, Stage2Result, Stage3Config, chunk_turns,
    execute_stage2, execute_stage3, normalize, refine_introduction,
};

/// Normalized transcript and its chunks, ready for revision
#[derive(Debug)]
pub struct PreparedTranscript {
    pub input_lines: usize,
    pub normalization: NormalizationResult,
    pub chunks: Vec<Chunk>,
}

/// Run stages 0 and 1. No backend call is made.
pub fn prepare_transcript(
    lines: &[String],
    config: &AppConfig,
) -> Result<PreparedTranscript, FormatError> {
    let normalize_config = NormalizeConfig {
        interviewee_name: config.interviewee_name.clone(),
        organization_label: config.organization_label.clone(),
    };
    let normalization = normalize(lines, &normalize_config)?;
    let chunks = chunk_turns(&normalization.paired_turns, config.chunk_size);

    Ok(PreparedTranscript {
        input_lines: lines.len(),
        normalization,
        chunks,
    })
}

/// Prompt templates from `prompts_file`, or the built-in set
pub fn load_templates(config: &AppConfig) -> Result<PromptTemplates> {
    match &config.prompts_file {
        Some(path) => {
            info!("Loading prompt templates from {:?}", path);
            PromptTemplates::from_file(path)
        }
        None => Ok(PromptTemplates::default()),
    }
}

/// Number of backend calls a full run makes when every step succeeds
pub fn planned_call_count(chunks: usize, config: &AppConfig) -> usize {
    if chunks == 0 {
        return 0;
    }
    let per_chunk = 1 + 2 * config.revise_iteration as usize + usize::from(config.enable_polish);
    1 + chunks * per_chunk
}

/// Revise a transcript file end to end and write the output document
pub async fn process_transcript(
    config: &AppConfig,
    templates: PromptTemplates,
    backend: Arc<dyn TextBackend>,
    input: &Path,
    output: &Path,
) -> Result<RunReport> {
    let run_id = Uuid::new_v4().to_string();
    let started_at = Utc::now();
    info!(%run_id, "Loading transcript from {:?}", input);

    let lines = read_transcript_file(input)?;
    let prepared =
        prepare_transcript(&lines, config).context("Failed to normalize input transcript")?;

    info!(
        "Stage 0/1: {} lines -> {} turns -> {} paired turns -> {} chunks",
        prepared.input_lines,
        prepared.normalization.turns.len(),
        prepared.normalization.paired_turns.len(),
        prepared.chunks.len()
    );

    let chunk_count = prepared.chunks.len();
    let settings = config.revision_settings();

    let stage2 = if chunk_count == 0 {
        warn!("Transcript is empty, nothing to revise");
        Stage2Result::default()
    } else {
        let introduction = refine_introduction(
            backend.as_ref(),
            &templates,
            &config.interviewee_introduction,
            &settings,
        )
        .await;
        let transcript_system = templates.transcript_system(&config.interviewee_name, &introduction);
        let pipeline = Arc::new(RevisionPipeline::new(
            backend,
            templates,
            transcript_system,
            settings,
        ));
        execute_stage2(pipeline, prepared.chunks, config.max_workers).await
    };

    info!(
        "Stage 2: {} chunks revised, {} failed",
        stage2.succeeded, stage2.failed
    );

    let stage3_config = Stage3Config {
        failed_chunk_policy: config.failed_chunk_policy,
        output_format: config.output_format,
        organization_label: config.organization_label.clone(),
    };
    let stage3 = execute_stage3(&stage2.revisions, output, &stage3_config)?;

    let report = RunReport {
        run_id,
        started_at,
        finished_at: Utc::now(),
        model: config.model.clone(),
        input_lines: prepared.input_lines,
        turns: prepared.normalization.turns.len(),
        paired_turns: prepared.normalization.paired_turns.len(),
        chunks: chunk_count,
        chunks_succeeded: stage2.succeeded,
        chunks_failed: stage2.failed,
        failed_chunk_indices: stage2.failed_indices(),
        output_path: stage3.output_path.display().to_string(),
    };

    if let Some(path) = &config.report_file {
        report.write_json(path)?;
        info!("Run report written to {:?}", path);
    }

    Ok(report)
}
