//! Transcript-related types.

use std::ops::Index;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// Text the user submitted.
    User,
    /// A frame received from the assistant.
    Assistant,
    /// A notice produced locally about the connection. Never sent.
    System,
}

/// One entry in the transcript.
///
/// Turns are immutable once created. The text is opaque here; it may
/// carry inline emphasis markup that only the renderer interprets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    sender: Sender,
    text: String,
    timestamp: DateTime<Utc>,
}

impl Turn {
    /// Creates a turn stamped with the current client time.
    #[inline]
    pub(crate) fn now(sender: Sender, text: String) -> Self {
        Self {
            sender,
            text,
            timestamp: Utc::now(),
        }
    }

    /// Returns who produced this turn.
    #[inline]
    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// Returns the text of this turn.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns when this turn was accepted into the transcript.
    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// An append-only, insertion-ordered list of turns.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub(crate) struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Appends a turn and returns its index.
    #[inline]
    pub(crate) fn push(&mut self, turn: Turn) -> usize {
        self.turns.push(turn);
        self.turns.len() - 1
    }

    /// Returns the turns as a slice, oldest first.
    #[inline]
    pub(crate) fn as_slice(&self) -> &[Turn] {
        &self.turns
    }
}

impl Index<usize> for Transcript {
    type Output = Turn;

    #[inline]
    fn index(&self, index: usize) -> &Turn {
        &self.turns[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_order() {
        let mut transcript = Transcript::default();
        assert_eq!(transcript.push(Turn::now(Sender::User, "a".to_owned())), 0);
        assert_eq!(
            transcript.push(Turn::now(Sender::Assistant, "b".to_owned())),
            1
        );

        let texts: Vec<_> =
            transcript.as_slice().iter().map(Turn::text).collect();
        assert_eq!(texts, ["a", "b"]);
        assert_eq!(transcript[1].sender(), Sender::Assistant);
        assert!(transcript[0].timestamp() <= transcript[1].timestamp());
    }

    #[test]
    fn test_turn_serialization() {
        let turn = Turn::now(Sender::System, "Connected.".to_owned());
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value["sender"], "system");
        assert_eq!(value["text"], "Connected.");

        let back: Turn = serde_json::from_value(value).unwrap();
        assert_eq!(back, turn);
    }
}
