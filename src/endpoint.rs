//! Spectrum endpoint estimate from the high amplitude tail.
//!
//! Starting at the last non-empty bin the histogram is walked downwards.
//! Every bin with more than [`NOISE_THRESHOLD`] counts contributes its low
//! edge, weighted by its content, until the accumulated counts reach the tail
//! budget. The endpoint is the weighted median (and mean) of those edges.

use serde::{Deserialize, Serialize};

use crate::{
    error::{AnalysisError, Result},
    histogram::AmpHistogram,
};

/// Counts collected from the tail before stopping.
pub const DEFAULT_TAIL_BUDGET: u64 = 75;
/// Bins with this many counts or fewer are treated as noise.
pub const NOISE_THRESHOLD: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub median: f64,
    pub mean: f64,
    /// Counts actually collected, `>= budget` unless the spectrum ran out.
    pub collected: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointEstimator {
    pub tail_budget: u64,
}

impl Default for EndpointEstimator {
    fn default() -> Self {
        EndpointEstimator {
            tail_budget: DEFAULT_TAIL_BUDGET,
        }
    }
}

impl EndpointEstimator {
    pub fn new(tail_budget: u64) -> Self {
        EndpointEstimator { tail_budget }
    }

    /// `name` is only used for diagnostics.
    pub fn estimate(&self, name: &str, histogram: &AmpHistogram) -> Result<Endpoint> {
        let insufficient = |reason: &str| AnalysisError::InsufficientData {
            name: name.to_owned(),
            reason: reason.to_owned(),
        };

        let last = histogram
            .last_bin_above(0)
            .ok_or_else(|| insufficient("histogram has no entries"))?;

        let mut sum = 0;
        let mut samples = vec![];
        for bin in (0..=last).rev() {
            let content = histogram.y[bin];
            if content > NOISE_THRESHOLD {
                sum += content;
                samples.push((histogram.low_edge(bin), content as f64));
            }
            if sum >= self.tail_budget {
                break;
            }
        }

        if samples.is_empty() {
            return Err(insufficient("no bin above the noise threshold"));
        }
        if sum < self.tail_budget {
            log::warn!(
                "{name}: spectrum exhausted after {sum} of {} tail counts",
                self.tail_budget
            );
        }

        Ok(Endpoint {
            median: weighted_median(&samples),
            mean: weighted_mean(&samples),
            collected: sum,
        })
    }
}

/// `x` of the first sample (ascending `x`) at which the cumulative weight
/// reaches half of the total.
pub fn weighted_median(samples: &[(f64, f64)]) -> f64 {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let half = sorted.iter().map(|(_, w)| w).sum::<f64>() / 2.0;
    let mut cumulative = 0.0;
    for (x, w) in &sorted {
        cumulative += w;
        if cumulative >= half {
            return *x;
        }
    }
    sorted.last().map(|(x, _)| *x).unwrap_or(f64::NAN)
}

pub fn weighted_mean(samples: &[(f64, f64)]) -> f64 {
    let (sum, weights) = samples
        .iter()
        .fold((0.0, 0.0), |(sum, weights), (x, w)| (sum + x * w, weights + w));
    sum / weights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decay(len: usize, top: u64) -> AmpHistogram {
        let counts = (0..len)
            .map(|idx| top.saturating_sub(idx as u64 * top / len as u64))
            .collect();
        AmpHistogram::from_channels(counts)
    }

    #[test]
    fn single_heavy_bin() {
        let hist = AmpHistogram::from_channels(vec![0, 0, 0, 100, 0, 0]);
        let endpoint = EndpointEstimator::default().estimate("h", &hist).unwrap();
        assert_eq!(endpoint.median, 3.0);
        assert_eq!(endpoint.mean, 3.0);
        assert_eq!(endpoint.collected, 100);
    }

    #[test]
    fn noise_bins_are_skipped() {
        // the single counts at 8 and 9 never contribute
        let hist = AmpHistogram::from_channels(vec![0, 0, 0, 0, 0, 0, 40, 40, 1, 1]);
        let endpoint = EndpointEstimator::default().estimate("h", &hist).unwrap();
        assert_eq!(endpoint.collected, 80);
        assert_eq!(endpoint.median, 6.0);
        assert_eq!(endpoint.mean, 6.5);
    }

    #[test]
    fn stops_once_budget_is_reached() {
        let hist = AmpHistogram::from_channels(vec![500, 500, 30, 30, 30, 30]);
        let endpoint = EndpointEstimator::new(70).estimate("h", &hist).unwrap();
        // bins 5, 4, 3 give 90 >= 70
        assert_eq!(endpoint.collected, 90);
        assert_eq!(endpoint.median, 4.0);
        assert_eq!(endpoint.mean, 4.0);
    }

    #[test]
    fn uses_bin_edges_not_indices() {
        let hist = AmpHistogram::from_bins(vec![(10.0, 0), (12.5, 80), (15.0, 0)]).unwrap();
        let endpoint = EndpointEstimator::default().estimate("h", &hist).unwrap();
        assert_eq!(endpoint.median, 12.5);
    }

    #[test]
    fn deterministic() {
        let hist = decay(400, 300);
        let estimator = EndpointEstimator::default();
        let a = estimator.estimate("h", &hist).unwrap();
        let b = estimator.estimate("h", &hist).unwrap();
        assert_eq!(a.median.to_bits(), b.median.to_bits());
        assert_eq!(a.mean.to_bits(), b.mean.to_bits());
    }

    #[test]
    fn exhausted_spectrum_uses_what_was_collected() {
        let hist = AmpHistogram::from_channels(vec![10, 0, 20]);
        let endpoint = EndpointEstimator::default().estimate("h", &hist).unwrap();
        assert_eq!(endpoint.collected, 30);
        assert_eq!(endpoint.median, 2.0);
    }

    #[test]
    fn empty_histogram_is_insufficient() {
        let hist = AmpHistogram::from_channels(vec![0; 16]);
        let err = EndpointEstimator::default().estimate("empty", &hist).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { ref name, .. } if name == "empty"));
    }

    #[test]
    fn noise_only_histogram_is_insufficient() {
        let hist = AmpHistogram::from_channels(vec![1, 0, 1, 1]);
        let err = EndpointEstimator::default().estimate("noise", &hist).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    }

    #[test]
    fn weighted_median_takes_first_crossing() {
        let samples = [(3.0, 1.0), (1.0, 1.0), (2.0, 2.0)];
        // sorted: 1(1) 2(2) 3(1); half = 2, cumulative reaches 3 at x = 2
        assert_eq!(weighted_median(&samples), 2.0);
        let samples = [(1.0, 1.0), (2.0, 1.0)];
        assert_eq!(weighted_median(&samples), 1.0);
    }
}
