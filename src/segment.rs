//! Aligned token positions within a format
//!
//! A segment starts out [`Segment::Fixed`] and becomes [`Segment::Variable`]
//! the first time a different token is seen at its position. There is no way
//! back.

use crate::config::ValueOrder;
use ahash::{HashMap, HashMapExt};

/// Position whose every observed token has been identical so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedSegment {
    text: String,
    count: u64,
}

impl FixedSegment {
    /// New fixed segment with no observations yet
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            count: 0,
        }
    }

    pub(crate) fn with_count(text: impl Into<String>, count: u64) -> Self {
        Self {
            text: text.into(),
            count,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Accept `observed` only if it equals the literal
    pub fn merge(&mut self, observed: &str) -> bool {
        if self.text != observed {
            return false;
        }

        self.count += 1;
        true
    }
}

/// Position observed with at least two distinct tokens.
///
/// Values are kept in first-seen order; `index` maps a value to its slot.
#[derive(Debug, Clone, Default)]
pub struct VariableSegment {
    values: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl VariableSegment {
    /// Take over a fixed segment's history
    pub fn promote(fixed: &FixedSegment) -> Self {
        Self::from_values([(fixed.text.clone(), fixed.count)])
    }

    /// Build from `(value, count)` pairs; repeated values are summed
    pub(crate) fn from_values(values: impl IntoIterator<Item = (String, u64)>) -> Self {
        let mut segment = Self {
            values: Vec::new(),
            index: HashMap::new(),
        };
        for (value, count) in values {
            segment.add(value, count);
        }
        segment
    }

    fn add(&mut self, value: String, count: u64) {
        match self.index.get(&value) {
            Some(&slot) => self.values[slot].1 += count,
            None => {
                self.index.insert(value.clone(), self.values.len());
                self.values.push((value, count));
            }
        }
    }

    /// Sum of all value counts
    pub fn count(&self) -> u64 {
        self.values.iter().map(|(_, count)| count).sum()
    }

    /// Observations recorded for a single value
    pub fn value_count(&self, value: &str) -> Option<u64> {
        self.index.get(value).map(|&slot| self.values[slot].1)
    }

    /// Number of distinct values seen
    pub fn distinct(&self) -> usize {
        self.values.len()
    }

    /// Observed values with their counts
    pub fn values(&self, order: ValueOrder) -> Vec<(&str, u64)> {
        let mut values: Vec<(&str, u64)> = self
            .values
            .iter()
            .map(|(value, count)| (value.as_str(), *count))
            .collect();

        if order == ValueOrder::Sorted {
            values.sort_unstable_by(|a, b| a.0.cmp(b.0));
        }

        values
    }

    /// Always accepts
    pub fn merge(&mut self, observed: &str) -> bool {
        match self.index.get(observed) {
            Some(&slot) => self.values[slot].1 += 1,
            None => self.add(observed.to_string(), 1),
        }
        true
    }
}

// Same values with the same counts, regardless of the order they were first seen
impl PartialEq for VariableSegment {
    fn eq(&self, other: &Self) -> bool {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .all(|(value, count)| other.value_count(value) == Some(*count))
    }
}

impl Eq for VariableSegment {}

/// One aligned chunk position across a cluster's logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Fixed(FixedSegment),
    Variable(VariableSegment),
}

impl Segment {
    /// Shape token: the literal for fixed segments, `wildcard` otherwise
    pub fn text<'a>(&'a self, wildcard: &'a str) -> &'a str {
        match self {
            Self::Fixed(fixed) => fixed.text(),
            Self::Variable(_) => wildcard,
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }

    /// Number of observations accepted since creation
    pub fn count(&self) -> u64 {
        match self {
            Self::Fixed(fixed) => fixed.count(),
            Self::Variable(variable) => variable.count(),
        }
    }

    /// Offer a token to this position.
    ///
    /// `false` means a fixed segment saw a different literal; nothing was
    /// recorded and the caller is expected to promote.
    pub fn merge(&mut self, observed: &str) -> bool {
        match self {
            Self::Fixed(fixed) => fixed.merge(observed),
            Self::Variable(variable) => variable.merge(observed),
        }
    }
}
