// Format construction from clusters, plus a coverage ranking over the results
use super::Format;
use crate::cluster::{Cluster, LogEntry};
use crate::config::FormatOptions;
use crate::error::{LogshapeError, Result};
use std::sync::Arc;

/// Build the format summarizing `cluster`.
///
/// # Algorithm
/// 1. Seed the shape from the first log (all positions fixed)
/// 2. Merge every log, the first one included, in cluster order
/// 3. Cache the rendered sample
/// 4. Hand the format to the cluster and point every log back at it
///
/// # Errors
/// * `InvalidInput` - the cluster has no logs
/// * `IncompleteFormat` - a log's chunk count disagreed with the first log's;
///   the error carries the format as merged up to that log
pub fn generate_format<C: Cluster>(cluster: &mut C, options: &FormatOptions) -> Result<Arc<Format>> {
    let first = cluster.logs().first().ok_or_else(|| {
        LogshapeError::InvalidInput(format!("cluster '{}' has no logs", cluster.key()))
    })?;

    let mut format = Format::seed(first.chunks(), options.clone());
    format.cluster_key = Some(cluster.key().to_string());

    for (log_index, log) in cluster.logs().iter().enumerate() {
        if let Err(e) = format.merge(log.chunks()) {
            format.refresh_sample();
            return Err(LogshapeError::IncompleteFormat {
                log_index,
                source: Box::new(e),
                partial: Box::new(format),
            });
        }
    }

    format.refresh_sample();

    tracing::debug!(
        cluster = cluster.key(),
        id = format.short_id(),
        count = format.count(),
        segments = format.segments().len(),
        "Generated format"
    );

    let format = Arc::new(format);
    for log in cluster.logs_mut() {
        log.attach_format(Arc::downgrade(&format));
    }
    cluster.attach_format(Arc::clone(&format));

    Ok(format)
}

/// Build one format per cluster, in order.
///
/// Clusters that fail are logged and skipped; they get no format attached.
pub fn generate_formats<C: Cluster>(clusters: &mut [C], options: &FormatOptions) -> Vec<Arc<Format>> {
    let mut formats = Vec::with_capacity(clusters.len());

    for cluster in clusters.iter_mut() {
        match generate_format(cluster, options) {
            Ok(format) => formats.push(format),
            Err(e) => {
                tracing::warn!("Skipping cluster '{}': {}", cluster.key(), e);
            }
        }
    }

    formats
}

/// A format's share of all logs across a set of formats
#[derive(Debug, Clone)]
pub struct Coverage<'a> {
    pub format: &'a Format,
    /// Fraction of all logs matching this format
    pub share: f64,
    /// Running share including every larger format before this one
    pub cumulative: f64,
}

/// Rank formats by count, largest first (ties by id).
///
/// Reading down until `cumulative` crosses 0.9 answers "what do 90% of
/// these logs look like".
pub fn coverage<F: AsRef<Format>>(formats: &[F]) -> Vec<Coverage<'_>> {
    let mut ranked: Vec<&Format> = formats.iter().map(AsRef::as_ref).collect();
    ranked.sort_by(|a, b| b.count().cmp(&a.count()).then_with(|| a.id().cmp(b.id())));

    let total: u64 = ranked.iter().map(|f| f.count()).sum();
    if total == 0 {
        return ranked
            .into_iter()
            .map(|format| Coverage {
                format,
                share: 0.0,
                cumulative: 0.0,
            })
            .collect();
    }

    let mut running = 0u64;
    ranked
        .into_iter()
        .map(|format| {
            running += format.count();
            Coverage {
                format,
                share: format.count() as f64 / total as f64,
                cumulative: running as f64 / total as f64,
            }
        })
        .collect()
}

impl AsRef<Format> for Format {
    fn as_ref(&self) -> &Format {
        self
    }
}
