use tracing::debug;

use crate::models::{Chunk, PairedTurn};

/// Perform Stage 1: greedy chunking of paired turns
///
/// Turns are accumulated whole. When the next turn would push the running
/// length past `max_chars`, the accumulation is flushed first. A single turn
/// longer than `max_chars` becomes its own oversized chunk. Turns are
/// concatenated without a separator.
pub fn chunk_turns(turns: &[PairedTurn], max_chars: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for turn in turns {
        let turn_len = turn.char_len();
        if current_len > 0 && current_len + turn_len > max_chars {
            flush(&mut chunks, &mut current);
            current_len = 0;
        }
        current.push(turn.as_str());
        current_len += turn_len;
    }

    if !current.is_empty() {
        flush(&mut chunks, &mut current);
    }

    debug!(
        "Chunked {} paired turns into {} chunks (max {} chars)",
        turns.len(),
        chunks.len(),
        max_chars
    );

    chunks
}

fn flush(chunks: &mut Vec<Chunk>, current: &mut Vec<&str>) {
    let index = chunks.len();
    chunks.push(Chunk::from_turns(index, current.drain(..)));
}
