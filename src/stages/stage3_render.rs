use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::io::{OutputFormat, write_docx, write_text};
use crate::models::ChunkRevision;

/// Separator between chunk results in the assembled body
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// What to emit for a chunk whose revision failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailedChunkPolicy {
    /// Marker paragraph followed by the unrevised chunk text
    #[default]
    Placeholder,
    /// Leave the chunk out
    Skip,
}

/// Configuration for Stage 3 rendering
#[derive(Debug, Clone)]
pub struct Stage3Config {
    pub failed_chunk_policy: FailedChunkPolicy,
    pub output_format: OutputFormat,
    /// Speaker styled with the accent color
    pub organization_label: String,
}

/// Result of Stage 3 rendering
#[derive(Debug)]
pub struct Stage3Result {
    pub output_path: PathBuf,
    /// Format actually written (`Auto` resolved)
    pub format: OutputFormat,
    pub placeholders: usize,
    pub skipped: usize,
}

/// Marker paragraph flagging a chunk for manual review
pub fn failure_marker(index: usize, total: usize) -> String {
    format!(
        "[Revision failed for chunk {}/{}; original text follows]",
        index + 1,
        total
    )
}

/// Concatenate chunk results in order, applying the failed-chunk policy
pub fn assemble(revisions: &[ChunkRevision], policy: FailedChunkPolicy) -> String {
    let total = revisions.len();

    revisions
        .iter()
        .filter_map(|revision| match (&revision.revised, policy) {
            (Some(text), _) => Some(text.trim().to_string()),
            (None, FailedChunkPolicy::Skip) => None,
            (None, FailedChunkPolicy::Placeholder) => Some(format!(
                "{}{}{}",
                failure_marker(revision.index, total),
                PARAGRAPH_SEPARATOR,
                revision.source.trim()
            )),
        })
        .collect::<Vec<_>>()
        .join(PARAGRAPH_SEPARATOR)
}

/// Execute Stage 3: assemble the body and write the output document
pub fn execute_stage3(
    revisions: &[ChunkRevision],
    output: &Path,
    config: &Stage3Config,
) -> Result<Stage3Result> {
    let failed = revisions.iter().filter(|r| r.is_failed()).count();
    if failed > 0 {
        warn!(
            "{} of {} chunks failed revision ({:?} policy)",
            failed,
            revisions.len(),
            config.failed_chunk_policy
        );
    }

    let body = assemble(revisions, config.failed_chunk_policy);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }

    let format = config.output_format.resolve(output);
    info!("Writing {:?} output to {:?}", format, output);
    match format {
        OutputFormat::Docx => write_docx(&body, &config.organization_label, output)?,
        _ => write_text(&body, output)?,
    }

    let (placeholders, skipped) = match config.failed_chunk_policy {
        FailedChunkPolicy::Placeholder => (failed, 0),
        FailedChunkPolicy::Skip => (0, failed),
    };

    Ok(Stage3Result {
        output_path: output.to_path_buf(),
        format,
        placeholders,
        skipped,
    })
}
