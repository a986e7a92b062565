//! Run-level summary folded from processed pages.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::types::{PageClassification, ProcessedPage};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub total_pages: usize,
    pub pure_static: usize,
    pub routing_only: usize,
    pub interactive: usize,
    pub original_bytes: u64,
    pub new_bytes: u64,
    pub scripts_removed: usize,
    pub preloads_removed: usize,
    pub helpers_injected: usize,
    /// Pages with no entry source module (never classified).
    pub skipped_pages: usize,
    pub failed_pages: usize,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl RunStats {
    pub fn count(&self, class: PageClassification) -> usize {
        match class {
            PageClassification::PureStatic => self.pure_static,
            PageClassification::RoutingOnly => self.routing_only,
            PageClassification::Interactive => self.interactive,
        }
    }

    pub fn bytes_saved(&self) -> i64 {
        self.original_bytes as i64 - self.new_bytes as i64
    }

    pub fn savings_percent(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        self.bytes_saved() as f64 * 100.0 / self.original_bytes as f64
    }
}

/// Fold processed pages, in the order given, into run statistics.
pub fn aggregate(pages: &[ProcessedPage], started: Instant) -> RunStats {
    let mut stats = pages.iter().fold(RunStats::default(), |mut acc, page| {
        acc.total_pages += 1;
        match page.classification() {
            PageClassification::PureStatic => acc.pure_static += 1,
            PageClassification::RoutingOnly => acc.routing_only += 1,
            PageClassification::Interactive => acc.interactive += 1,
        }
        acc.original_bytes += page.analysis.original_size as u64;
        acc.new_bytes += page.new_size as u64;
        acc.scripts_removed += page.scripts_removed;
        acc.preloads_removed += page.preloads_removed;
        if page.helper_injected {
            acc.helpers_injected += 1;
        }
        acc
    });
    stats.elapsed = started.elapsed();
    stats
}
