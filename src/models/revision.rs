use serde::Serialize;

/// A size-bounded block of consecutive paired turns, revised as one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position in the original transcript order
    pub index: usize,
    /// Paired turns concatenated without a separator
    pub text: String,
    /// Byte offset in `text` where each paired turn starts
    #[serde(skip)]
    turn_starts: Vec<usize>,
}

impl Chunk {
    /// A chunk holding a single block of text
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            turn_starts: vec![0],
        }
    }

    /// Concatenate paired turns into one chunk, remembering where each starts
    pub fn from_turns<'a>(index: usize, turns: impl IntoIterator<Item = &'a str>) -> Self {
        let mut text = String::new();
        let mut turn_starts = Vec::new();
        for turn in turns {
            turn_starts.push(text.len());
            text.push_str(turn);
        }
        Self {
            index,
            text,
            turn_starts,
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// The chunk text with each paired turn on its own line
    pub fn line_separated(&self) -> String {
        let mut out = String::with_capacity(self.text.len() + self.turn_starts.len());
        for (i, &start) in self.turn_starts.iter().enumerate() {
            let end = self
                .turn_starts
                .get(i + 1)
                .copied()
                .unwrap_or(self.text.len());
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&self.text[start..end]);
        }
        out
    }
}

/// Outcome of the revision pipeline for one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRevision {
    pub index: usize,
    /// The unrevised chunk, one paired turn per line
    pub source: String,
    /// `None` when the chunk's pipeline failed irrecoverably
    pub revised: Option<String>,
}

impl ChunkRevision {
    pub fn is_failed(&self) -> bool {
        self.revised.is_none()
    }
}
