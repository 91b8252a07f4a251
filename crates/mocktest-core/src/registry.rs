//! Per-session answer and review-flag stores.
//!
//! Both registries are keyed by question position. Mutation is restricted to
//! this crate so the session controller stays the only writer; callers get
//! read access and can build standalone snapshots for scoring.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::OptionLabel;

/// Position → last selected option. A missing entry means unanswered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRegistry {
    entries: BTreeMap<usize, OptionLabel>,
}

impl AnswerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected option for `position`, or `None` if unanswered.
    pub fn get(&self, position: usize) -> Option<OptionLabel> {
        self.entries.get(&position).copied()
    }

    pub fn is_answered(&self, position: usize) -> bool {
        self.entries.contains_key(&position)
    }

    /// Number of answered positions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Answered positions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, OptionLabel)> + '_ {
        self.entries.iter().map(|(p, l)| (*p, *l))
    }

    /// Insert or overwrite the answer for `position`, returning the previous one.
    pub(crate) fn upsert(&mut self, position: usize, label: OptionLabel) -> Option<OptionLabel> {
        self.entries.insert(position, label)
    }

    pub(crate) fn remove(&mut self, position: usize) -> Option<OptionLabel> {
        self.entries.remove(&position)
    }
}

impl FromIterator<(usize, OptionLabel)> for AnswerRegistry {
    fn from_iter<I: IntoIterator<Item = (usize, OptionLabel)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Positions currently flagged for review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRegistry {
    flagged: BTreeSet<usize>,
}

impl ReviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_flagged(&self, position: usize) -> bool {
        self.flagged.contains(&position)
    }

    /// Number of flagged positions.
    pub fn len(&self) -> usize {
        self.flagged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flagged.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.flagged.iter().copied()
    }

    /// Flip the flag for `position` and return the new value.
    pub(crate) fn toggle(&mut self, position: usize) -> bool {
        if self.flagged.remove(&position) {
            false
        } else {
            self.flagged.insert(position);
            true
        }
    }
}

impl FromIterator<usize> for ReviewRegistry {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            flagged: iter.into_iter().collect(),
        }
    }
}
