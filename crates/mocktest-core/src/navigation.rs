//! Bounds-checked movement over a fixed question sequence.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Outcome of a relative move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "position")]
pub enum Step {
    /// Moved to the contained position.
    Moved(usize),
    /// Already at the first question; nothing changed.
    AtStart,
    /// Already at the last question; nothing changed.
    AtEnd,
}

/// Current position plus the set of positions the student has seen.
///
/// Invariant: `position < len` whenever `len > 0`.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    position: usize,
    visited: Vec<bool>,
}

impl Navigator {
    /// A navigator over `len` questions, positioned on (and having visited) the first.
    pub fn new(len: usize) -> Self {
        let mut visited = vec![false; len];
        if let Some(first) = visited.first_mut() {
            *first = true;
        }
        Self {
            position: 0,
            visited,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    pub fn is_visited(&self, position: usize) -> bool {
        self.visited.get(position).copied().unwrap_or(false)
    }

    pub fn previous(&mut self) -> Step {
        if self.position == 0 {
            return Step::AtStart;
        }
        self.move_to(self.position - 1);
        Step::Moved(self.position)
    }

    pub fn next(&mut self) -> Step {
        if self.position + 1 >= self.len() {
            return Step::AtEnd;
        }
        self.move_to(self.position + 1);
        Step::Moved(self.position)
    }

    /// Jump to `target`, rejecting out-of-range targets without moving.
    pub fn jump_to(&mut self, target: usize) -> Result<usize, SessionError> {
        self.check(target)?;
        self.move_to(target);
        Ok(self.position)
    }

    /// Validate a position against the sequence bounds.
    pub fn check(&self, position: usize) -> Result<(), SessionError> {
        if position < self.len() {
            Ok(())
        } else {
            Err(SessionError::InvalidPosition {
                position,
                len: self.len(),
            })
        }
    }

    fn move_to(&mut self, position: usize) {
        self.position = position;
        self.visited[position] = true;
    }
}
