//! Inputs produced upstream of format extraction
//!
//! Tokenizing raw lines and grouping them into clusters happens elsewhere.
//! This module only describes what format extraction needs from those
//! results: an ordered chunk sequence per log, a place to hang the resulting
//! format, and a cluster that owns its logs. [`Log`] and [`LogCluster`] are
//! plain owned implementations for callers without types of their own.

use crate::format::Format;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};

/// One token of a tokenized log line
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
}

impl Chunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl From<&str> for Chunk {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Chunk {
    fn from(text: String) -> Self {
        Self { text }
    }
}

/// A tokenized log line as seen by format extraction
pub trait LogEntry {
    /// Ordered chunks of this line
    fn chunks(&self) -> &[Chunk];

    /// Record which format summarizes this line (non-owning)
    fn attach_format(&mut self, format: Weak<Format>);
}

/// A group of logs that share the same chunk count
pub trait Cluster {
    type Entry: LogEntry;

    /// Identifier used for diagnostics and the format's back-reference
    fn key(&self) -> &str;

    fn logs(&self) -> &[Self::Entry];

    fn logs_mut(&mut self) -> &mut [Self::Entry];

    /// Take ownership of the format built from this cluster
    fn attach_format(&mut self, format: Arc<Format>);
}

/// Owned tokenized log line
#[derive(Debug, Clone, Default)]
pub struct Log {
    chunks: Vec<Chunk>,
    format: Weak<Format>,
}

impl Log {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self {
            chunks,
            format: Weak::new(),
        }
    }

    /// Build a log from already split tokens
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(tokens.into_iter().map(Chunk::new).collect())
    }

    /// Format summarizing this log, while its cluster keeps it alive
    pub fn format(&self) -> Option<Arc<Format>> {
        self.format.upgrade()
    }
}

impl LogEntry for Log {
    fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    fn attach_format(&mut self, format: Weak<Format>) {
        self.format = format;
    }
}

/// Owned cluster of logs
#[derive(Debug, Clone, Default)]
pub struct LogCluster {
    key: String,
    logs: Vec<Log>,
    format: Option<Arc<Format>>,
}

impl LogCluster {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            logs: Vec::new(),
            format: None,
        }
    }

    pub fn with_logs(key: impl Into<String>, logs: Vec<Log>) -> Self {
        Self {
            key: key.into(),
            logs,
            format: None,
        }
    }

    pub fn push(&mut self, log: Log) {
        self.logs.push(log);
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    /// Format built from this cluster, if any
    pub fn format(&self) -> Option<&Arc<Format>> {
        self.format.as_ref()
    }
}

impl Cluster for LogCluster {
    type Entry = Log;

    fn key(&self) -> &str {
        &self.key
    }

    fn logs(&self) -> &[Log] {
        &self.logs
    }

    fn logs_mut(&mut self) -> &mut [Log] {
        &mut self.logs
    }

    fn attach_format(&mut self, format: Arc<Format>) {
        self.format = Some(format);
    }
}
