use std::path::Path;

use anyhow::{Context, Result};

/// Read a transcript file as trimmed, non-blank lines
pub fn read_transcript_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript: {:?}", path))?;
    Ok(transcript_lines(&content))
}

/// Split transcript text into trimmed, non-blank lines
pub fn transcript_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
