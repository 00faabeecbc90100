//! Templates extracted from clusters of structurally similar log lines
//!
//! A [`Format`] holds one [`Segment`] per chunk position. Every merged log
//! either confirms a fixed segment or promotes it to a variable one. The
//! format's id is a SHA-256 digest of its shape tokens (literal or wildcard
//! per position), so it only changes when a promotion happens, never when
//! value frequencies move.

mod build;
mod record;

pub use build::{coverage, generate_format, generate_formats, Coverage};

use crate::cluster::Chunk;
use crate::config::{FormatOptions, Highlight};
use crate::error::{LogshapeError, Result};
use crate::segment::{FixedSegment, Segment, VariableSegment};
use colored::{Color, Colorize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Template summarizing a cluster of logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    hash: String,
    segments: Vec<Segment>,
    count: u64,
    sample: String,
    cluster_key: Option<String>,
    options: FormatOptions,
}

impl Format {
    /// Fix the shape from a reference log.
    ///
    /// Every position starts as a fixed segment with no observations; the
    /// reference log still has to be merged to be counted.
    pub fn seed(chunks: &[Chunk], options: FormatOptions) -> Self {
        let segments = chunks
            .iter()
            .map(|chunk| Segment::Fixed(FixedSegment::new(chunk.text.as_str())))
            .collect();

        let mut format = Self {
            hash: String::new(),
            segments,
            count: 0,
            sample: String::new(),
            cluster_key: None,
            options,
        };
        format.calc_hash();
        format
    }

    /// Fold one log into the template.
    ///
    /// Returns whether any segment was promoted (and the id recomputed).
    /// A chunk count that differs from the segment count is rejected before
    /// anything is touched.
    pub fn merge(&mut self, chunks: &[Chunk]) -> Result<bool> {
        if chunks.len() != self.segments.len() {
            return Err(LogshapeError::StructuralMismatch {
                expected: self.segments.len(),
                actual: chunks.len(),
            });
        }

        self.count += 1;
        let mut changed = false;

        for (position, (segment, chunk)) in self.segments.iter_mut().zip(chunks).enumerate() {
            if segment.merge(&chunk.text) {
                continue;
            }

            let Segment::Fixed(fixed) = &*segment else {
                continue;
            };
            tracing::trace!(
                position,
                literal = fixed.text(),
                observed = chunk.text.as_str(),
                "Promoting segment to variable"
            );

            let mut variable = VariableSegment::promote(fixed);
            variable.merge(&chunk.text);
            *segment = Segment::Variable(variable);
            changed = true;
        }

        if changed {
            self.calc_hash();
        }

        Ok(changed)
    }

    /// Full lowercase hex shape digest
    pub fn id(&self) -> &str {
        &self.hash
    }

    /// Leading characters of the id for compact display.
    ///
    /// Only 32 bits by default: collisions are plausible, never use it as a key.
    pub fn short_id(&self) -> &str {
        let len = self.options.short_id_len.min(self.hash.len());
        &self.hash[..len]
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of logs folded in so far
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Rendered text cached when construction finished
    pub fn sample(&self) -> &str {
        &self.sample
    }

    /// Key of the cluster this format was built from
    pub fn cluster_key(&self) -> Option<&str> {
        self.cluster_key.as_deref()
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    /// Shape tokens in segment order (literal or wildcard)
    pub fn shape(&self) -> Vec<&str> {
        self.segments
            .iter()
            .map(|segment| segment.text(&self.options.wildcard))
            .collect()
    }

    /// `"<count> [<short id>] <segments>"` with variable markers colored per `highlight`
    pub fn render(&self, highlight: Highlight) -> String {
        let mut out = format!(
            "{:>width$} [{}] ",
            self.count,
            self.short_id(),
            width = self.options.count_width
        );

        for segment in &self.segments {
            match segment {
                Segment::Fixed(fixed) => out.push_str(fixed.text()),
                Segment::Variable(_) => {
                    let marker = self.options.wildcard.as_str();
                    match highlight {
                        Highlight::Auto => out.push_str(&marker.red().to_string()),
                        Highlight::Always => out.push_str(&format!(
                            "\x1b[{}m{}\x1b[0m",
                            Color::Red.to_fg_str(),
                            marker
                        )),
                        Highlight::Never => out.push_str(marker),
                    }
                }
            }
        }

        out
    }

    /// Re-render the cached sample.
    ///
    /// The sample is persisted, so it only carries escape codes when the
    /// options ask for `Always`; `Auto` is treated as `Never` here.
    pub(crate) fn refresh_sample(&mut self) {
        let highlight = match self.options.highlight {
            Highlight::Always => Highlight::Always,
            Highlight::Auto | Highlight::Never => Highlight::Never,
        };
        self.sample = self.render(highlight);
    }

    fn calc_hash(&mut self) {
        self.hash = shape_hash(&self.segments, &self.options.wildcard);
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(self.options.highlight))
    }
}

/// SHA-256 over the concatenated shape tokens, as lowercase hex
pub fn shape_hash(segments: &[Segment], wildcard: &str) -> String {
    let mut hasher = Sha256::new();
    for segment in segments {
        hasher.update(segment.text(wildcard).as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(tokens: &[&str]) -> Vec<Chunk> {
        tokens.iter().map(|t| Chunk::new(*t)).collect()
    }

    fn plain() -> FormatOptions {
        FormatOptions {
            highlight: Highlight::Never,
            ..FormatOptions::default()
        }
    }

    fn digest(input: &str) -> String {
        hex::encode(Sha256::digest(input.as_bytes()))
    }

    #[test]
    fn test_seed_is_all_fixed() {
        let format = Format::seed(&chunks(&["connect", "to", "10.0.0.1"]), plain());

        assert_eq!(format.count(), 0);
        assert!(format.segments().iter().all(Segment::is_fixed));
        assert_eq!(format.id(), digest("connectto10.0.0.1"));
    }

    #[test]
    fn test_merge_promotes_on_mismatch() {
        let mut format = Format::seed(&chunks(&["connect", "to", "10.0.0.1"]), plain());

        assert!(!format.merge(&chunks(&["connect", "to", "10.0.0.1"])).unwrap());
        assert!(format.merge(&chunks(&["connect", "to", "10.0.0.2"])).unwrap());

        assert_eq!(format.count(), 2);
        assert_eq!(format.shape(), vec!["connect", "to", "*"]);
        assert_eq!(format.id(), digest("connectto*"));

        match &format.segments()[2] {
            Segment::Variable(variable) => {
                assert_eq!(variable.value_count("10.0.0.1"), Some(1));
                assert_eq!(variable.value_count("10.0.0.2"), Some(1));
            }
            other => panic!("expected variable segment, got {:?}", other),
        }
    }

    #[test]
    fn test_value_only_change_keeps_id() {
        let mut format = Format::seed(&chunks(&["port", "80"]), plain());
        format.merge(&chunks(&["port", "80"])).unwrap();
        format.merge(&chunks(&["port", "443"])).unwrap();
        let id = format.id().to_string();

        assert!(!format.merge(&chunks(&["port", "8080"])).unwrap());
        assert!(!format.merge(&chunks(&["port", "80"])).unwrap());

        assert_eq!(format.id(), id);
        assert_eq!(format.segments()[1].count(), 4);
    }

    #[test]
    fn test_length_mismatch_leaves_state_untouched() {
        let mut format = Format::seed(&chunks(&["a", "b"]), plain());
        format.merge(&chunks(&["a", "b"])).unwrap();
        let before = format.clone();

        match format.merge(&chunks(&["a", "b", "c"])) {
            Err(LogshapeError::StructuralMismatch { expected, actual }) => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("expected structural mismatch, got {:?}", other),
        }

        assert_eq!(format, before);
    }

    #[test]
    fn test_render_plain() {
        let mut format = Format::seed(&chunks(&["user", "=", "alice"]), plain());
        format.merge(&chunks(&["user", "=", "alice"])).unwrap();
        format.merge(&chunks(&["user", "=", "bob"])).unwrap();

        let expected = format!("     2 [{}] user=*", &format.id()[..8]);
        assert_eq!(format.render(Highlight::Never), expected);
        assert_eq!(format.to_string(), expected);
    }

    #[test]
    fn test_render_always_highlights_marker() {
        let mut format = Format::seed(&chunks(&["a", "b"]), plain());
        format.merge(&chunks(&["a", "b"])).unwrap();
        format.merge(&chunks(&["a", "c"])).unwrap();

        let rendered = format.render(Highlight::Always);
        assert!(rendered.ends_with("a\x1b[31m*\x1b[0m"));
    }

    #[test]
    fn test_sample_ignores_terminal_detection() {
        let options = FormatOptions {
            highlight: Highlight::Auto,
            ..FormatOptions::default()
        };
        let mut format = Format::seed(&chunks(&["a", "b"]), options);
        format.merge(&chunks(&["a", "b"])).unwrap();
        format.merge(&chunks(&["a", "c"])).unwrap();
        format.refresh_sample();

        assert_eq!(format.sample(), format.render(Highlight::Never));
        assert!(!format.sample().contains('\x1b'));
    }

    #[test]
    fn test_sample_highlighted_when_always() {
        let options = FormatOptions {
            highlight: Highlight::Always,
            ..FormatOptions::default()
        };
        let mut format = Format::seed(&chunks(&["a", "b"]), options);
        format.merge(&chunks(&["a", "b"])).unwrap();
        format.merge(&chunks(&["a", "c"])).unwrap();
        format.refresh_sample();

        assert!(format.sample().ends_with("a\x1b[31m*\x1b[0m"));
    }

    #[test]
    fn test_short_id_length_follows_options() {
        let options = FormatOptions {
            short_id_len: 12,
            ..plain()
        };
        let format = Format::seed(&chunks(&["x"]), options);

        assert_eq!(format.short_id().len(), 12);
        assert!(format.id().starts_with(format.short_id()));
    }

    #[test]
    fn test_custom_wildcard_changes_id() {
        let options = FormatOptions {
            wildcard: "<*>".to_string(),
            ..plain()
        };
        let mut format = Format::seed(&chunks(&["a", "b"]), options);
        format.merge(&chunks(&["a", "b"])).unwrap();
        format.merge(&chunks(&["a", "c"])).unwrap();

        assert_eq!(format.id(), digest("a<*>"));
        assert_eq!(format.shape(), vec!["a", "<*>"]);
    }
}
