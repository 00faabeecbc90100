//! Logshape - log template extraction
//!
//! Takes clusters of structurally similar, already tokenized log lines and
//! extracts the template they share: positions that never change stay
//! fixed text, positions that vary become wildcards with a frequency table.
//! Each template carries a content-derived id that only changes when its
//! shape does, so it can be used to deduplicate and count logs downstream.

pub mod cluster;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod segment;

pub use cluster::{Chunk, Cluster, Log, LogCluster, LogEntry};
pub use config::{Config, FormatOptions, Highlight, ValueOrder};
pub use error::{LogshapeError, Result};
pub use format::{coverage, generate_format, generate_formats, Coverage, Format};
pub use segment::{FixedSegment, Segment, VariableSegment};
