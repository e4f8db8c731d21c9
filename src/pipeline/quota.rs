//! Per-difficulty quotas and their distribution across chunks.

use crate::config::ComplexityDistribution;
use crate::output::Complexity;
use serde::{Deserialize, Serialize};

/// Exact number of questions requested per difficulty bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Quota {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

impl Quota {
    /// `easy = ⌊total·low/100⌋`, `medium = ⌊total·medium/100⌋`, `hard` takes
    /// the rest. When the first two overshoot `total`, hard is clamped to 0
    /// and medium becomes `total − easy`.
    ///
    /// The three counts always sum to `total`. Percentages above 100 (which a
    /// normalised distribution never has) are additionally guarded by
    /// clamping `easy` to `total`.
    pub fn compute(total: usize, dist: &ComplexityDistribution) -> Self {
        let easy = (total * dist.low as usize / 100).min(total);
        let medium = total * dist.medium as usize / 100;
        if easy + medium > total {
            return Self {
                easy,
                medium: total - easy,
                hard: 0,
            };
        }
        Self {
            easy,
            medium,
            hard: total - easy - medium,
        }
    }

    pub fn get(&self, complexity: Complexity) -> usize {
        match complexity {
            Complexity::Easy => self.easy,
            Complexity::Medium => self.medium,
            Complexity::Hard => self.hard,
        }
    }

    pub fn total(&self) -> usize {
        self.easy + self.medium + self.hard
    }
}

/// Fixed per-chunk request sizes for one bucket, used when requests are
/// dispatched concurrently and later chunks cannot see earlier results.
///
/// Mirrors the serial walk assuming every request delivers in full:
/// `per_chunk = max(1, count / chunks)`, the last chunk takes what remains,
/// and chunks after the quota is exhausted get 0.
pub fn static_plan(count: usize, chunks: usize) -> Vec<usize> {
    if chunks == 0 {
        return Vec::new();
    }
    let per_chunk = (count / chunks).max(1);
    let mut remaining = count;
    (0..chunks)
        .map(|i| {
            let k = if i == chunks - 1 {
                remaining
            } else {
                per_chunk.min(remaining)
            };
            remaining -= k;
            k
        })
        .collect()
}
