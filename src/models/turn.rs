use std::fmt;

use serde::{Deserialize, Serialize};

/// A single speaker turn after timestamp removal and relabeling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Either the interviewee's name or the organization label
    pub speaker: String,
    /// What was said
    pub content: String,
}

impl Turn {
    pub fn new(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            content: content.into(),
        }
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.speaker, self.content)
    }
}

/// Two consecutive merged turns joined by a line break.
///
/// A trailing turn without a partner is kept as a single-turn pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedTurn {
    text: String,
}

impl PairedTurn {
    pub fn pair(first: &Turn, second: &Turn) -> Self {
        Self {
            text: format!("{}\n{}", first, second),
        }
    }

    pub fn single(turn: &Turn) -> Self {
        Self {
            text: turn.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters, the unit chunk sizes are measured in
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_display() {
        assert_eq!(Turn::new("Alice", "hello").to_string(), "Alice: hello");
    }

    #[test]
    fn test_paired_turn_text() {
        let a = Turn::new("A", "hi there");
        let b = Turn::new("B", "yo");
        assert_eq!(PairedTurn::pair(&a, &b).as_str(), "A: hi there\nB: yo");
        assert_eq!(PairedTurn::single(&b).as_str(), "B: yo");
    }

    #[test]
    fn test_char_len_counts_chars_not_bytes() {
        let turn = Turn::new("张三", "你好");
        let pair = PairedTurn::single(&turn);
        assert_eq!(pair.char_len(), 6);
        assert!(pair.as_str().len() > 6);
    }
}
