use anyhow::Result;
use std::time::Instant;
use tracing::info;

use crate::record::Record;

pub const DEFAULT_MIN_VOLUME: u64 = 100;
pub const DEFAULT_GAP_THRESHOLD: u32 = 20;
pub const DEFAULT_TOP_N: usize = 25;

/// Filters that decide which keywords count as gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapConfig {
    pub min_volume: u64,
    /// A keyword is a gap when its position is strictly greater than this.
    pub gap_threshold: u32,
    pub top_n: usize,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            min_volume: DEFAULT_MIN_VOLUME,
            gap_threshold: DEFAULT_GAP_THRESHOLD,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl GapConfig {
    pub fn validate(&self) -> Result<()> {
        if self.gap_threshold == 0 {
            anyhow::bail!("gap threshold must be at least 1");
        }
        if self.top_n == 0 {
            anyhow::bail!("top N must be greater than 0");
        }
        Ok(())
    }

    pub fn is_gap(&self, record: &Record) -> bool {
        record.volume >= self.min_volume && record.position > self.gap_threshold
    }
}

/// Selects the highest-volume gaps, best-ranked first among equal volumes.
/// Records that tie on both keys keep their input order.
pub fn find_gaps(records: &[Record], config: &GapConfig) -> Vec<Record> {
    let start_time = Instant::now();

    let mut gaps: Vec<Record> = records
        .iter()
        .filter(|record| config.is_gap(record))
        .cloned()
        .collect();
    let candidate_count = gaps.len();

    gaps.sort_by(|a, b| {
        b.volume
            .cmp(&a.volume)
            .then_with(|| a.position.cmp(&b.position))
    });
    gaps.truncate(config.top_n);

    info!(
        action = "complete",
        component = "gap_analysis",
        candidate_count,
        gap_count = gaps.len(),
        min_volume = config.min_volume,
        gap_threshold = config.gap_threshold,
        top_n = config.top_n,
        duration_ms = start_time.elapsed().as_millis(),
        "Gap analysis completed"
    );
    gaps
}

pub fn total_volume(gaps: &[Record]) -> u64 {
    gaps.iter().map(|record| record.volume).sum()
}
