use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::FormatError;
use crate::models::{PairedTurn, Turn};

/// `(HH:MM:SS)` timestamps appended to transcript lines
static TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\d{2}:\d{2}:\d{2}\)").expect("timestamp pattern is valid"));

/// Delimiter between speaker and content in raw transcript lines
pub const SPEAKER_DELIMITER: &str = ": ";

/// Configuration for Stage 0
#[derive(Debug, Clone)]
pub struct NormalizeConfig {
    /// Speaker name that is kept as-is
    pub interviewee_name: String,
    /// Label every other speaker is rewritten to
    pub organization_label: String,
}

/// Result of Stage 0 normalization
#[derive(Debug, Clone)]
pub struct NormalizationResult {
    /// Turns after relabeling and merging same-speaker runs
    pub turns: Vec<Turn>,
    /// Merged turns grouped two at a time
    pub paired_turns: Vec<PairedTurn>,
}

/// Perform Stage 0: transcript normalization
///
/// This stage:
/// 1. Strips `(HH:MM:SS)` timestamps and surrounding whitespace
/// 2. Splits each line into speaker and content, relabeling non-interviewee speakers
/// 3. Merges consecutive lines of the same speaker
/// 4. Pairs merged turns positionally
///
/// A single malformed line fails the whole transcript.
pub fn normalize(
    lines: &[String],
    config: &NormalizeConfig,
) -> Result<NormalizationResult, FormatError> {
    let mut relabeled = Vec::with_capacity(lines.len());

    for (index, raw) in lines.iter().enumerate() {
        let line = strip_timestamp(raw);
        let turn = parse_speaker_line(&line).ok_or_else(|| FormatError {
            line_number: index + 1,
            line: line.clone(),
        })?;
        relabeled.push(relabel(turn, config));
    }

    let turns = merge_consecutive_speakers(relabeled);
    let paired_turns = pair_turns(&turns);

    debug!(
        "Normalized {} lines into {} turns, {} paired turns",
        lines.len(),
        turns.len(),
        paired_turns.len()
    );

    Ok(NormalizationResult {
        turns,
        paired_turns,
    })
}

/// Remove every `(HH:MM:SS)` timestamp and trim the result
pub fn strip_timestamp(line: &str) -> String {
    TIMESTAMP.replace_all(line, "").trim().to_string()
}

/// Split a line on the first `": "` into a turn
pub fn parse_speaker_line(line: &str) -> Option<Turn> {
    line.split_once(SPEAKER_DELIMITER)
        .map(|(speaker, content)| Turn::new(speaker, content))
}

fn relabel(mut turn: Turn, config: &NormalizeConfig) -> Turn {
    if turn.speaker != config.interviewee_name {
        turn.speaker = config.organization_label.clone();
    }
    turn
}

/// Merge runs of the same speaker, joining their content with a space
pub fn merge_consecutive_speakers(turns: Vec<Turn>) -> Vec<Turn> {
    let mut merged: Vec<Turn> = Vec::with_capacity(turns.len());

    for turn in turns {
        match merged.last_mut() {
            Some(current) if current.speaker == turn.speaker => {
                current.content.push(' ');
                current.content.push_str(&turn.content);
            }
            _ => merged.push(turn),
        }
    }

    merged
}

/// Group turns two at a time in order; an odd trailing turn stands alone
pub fn pair_turns(turns: &[Turn]) -> Vec<PairedTurn> {
    turns
        .chunks(2)
        .map(|pair| match pair {
            [first, second] => PairedTurn::pair(first, second),
            [single] => PairedTurn::single(single),
            _ => unreachable!("chunks(2) yields one or two turns"),
        })
        .collect()
}
