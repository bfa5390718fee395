use serde::{Deserialize, Serialize};

/// Amplitude histogram with uniform bins.
///
/// `x` holds the low edge of every bin, `y` the counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmpHistogram {
    pub x: Vec<f64>,
    pub y: Vec<u64>,
    pub step: f64,
}

impl AmpHistogram {
    /// One bin per ADC channel, channel `i` has low edge `i`.
    pub fn from_channels(counts: Vec<u64>) -> Self {
        let x = (0..counts.len()).map(|idx| idx as f64).collect();
        AmpHistogram { x, y: counts, step: 1.0 }
    }

    /// Build from already binned `(low_edge, count)` pairs.
    ///
    /// Returns `None` unless the edges are strictly ascending with a uniform step.
    pub fn from_bins(bins: Vec<(f64, u64)>) -> Option<Self> {
        let (x, y): (Vec<_>, Vec<_>) = bins.into_iter().unzip();
        let step = match x.as_slice() {
            [] => return None,
            [_] => 1.0,
            [first, second, ..] => second - first,
        };
        if step <= 0.0 {
            return None;
        }
        let uniform = x
            .windows(2)
            .all(|pair| ((pair[1] - pair[0]) - step).abs() <= step * 1e-6);
        uniform.then_some(AmpHistogram { x, y, step })
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn low_edge(&self, bin: usize) -> f64 {
        self.x[bin]
    }

    pub fn total(&self) -> u64 {
        self.y.iter().sum()
    }

    /// Index of the highest bin whose content is strictly above `threshold`.
    pub fn last_bin_above(&self, threshold: u64) -> Option<usize> {
        self.y.iter().rposition(|&count| count > threshold)
    }

    /// Bin-wise sum of histograms sharing the same binning as `self`.
    pub fn merged<'a>(&self, others: impl IntoIterator<Item = &'a AmpHistogram>) -> AmpHistogram {
        let mut out = self.clone();
        for other in others {
            out.y
                .iter_mut()
                .zip(other.y.iter())
                .for_each(|(acc, count)| *acc += count);
            if other.y.len() > out.y.len() {
                let start = out.y.len();
                out.y.extend_from_slice(&other.y[start..]);
                out.x.extend_from_slice(&other.x[start..]);
            }
        }
        out
    }

    pub fn to_csv(&self, separator: char) -> String {
        let mut out = String::new();
        self.x.iter().zip(self.y.iter()).for_each(|(x, y)| {
            out.push_str(&format!("{x}{separator}{y}\n"));
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_have_unit_bins() {
        let hist = AmpHistogram::from_channels(vec![1, 0, 2]);
        assert_eq!(hist.x, vec![0.0, 1.0, 2.0]);
        assert_eq!(hist.low_edge(2), 2.0);
        assert_eq!(hist.total(), 3);
    }

    #[test]
    fn last_bin_above_scans_from_the_top() {
        let hist = AmpHistogram::from_channels(vec![5, 0, 3, 1, 0]);
        assert_eq!(hist.last_bin_above(0), Some(3));
        assert_eq!(hist.last_bin_above(1), Some(2));
        assert_eq!(hist.last_bin_above(10), None);
    }

    #[test]
    fn from_bins_rejects_non_uniform_edges() {
        assert!(AmpHistogram::from_bins(vec![(0.0, 1), (1.0, 2), (3.0, 1)]).is_none());
        assert!(AmpHistogram::from_bins(vec![(2.0, 1), (1.0, 2)]).is_none());
        assert!(AmpHistogram::from_bins(vec![]).is_none());

        let hist = AmpHistogram::from_bins(vec![(0.0, 1), (0.5, 2), (1.0, 3)]).unwrap();
        assert_eq!(hist.step, 0.5);
        assert_eq!(hist.low_edge(2), 1.0);
    }

    #[test]
    fn merged_sums_bin_contents() {
        let a = AmpHistogram::from_channels(vec![1, 2, 3]);
        let b = AmpHistogram::from_channels(vec![1, 1, 1, 4]);
        let sum = a.merged([&b]);
        assert_eq!(sum.y, vec![2, 3, 4, 4]);
        assert_eq!(sum.x.len(), 4);
    }

    #[test]
    fn csv_lists_edges_and_counts() {
        let hist = AmpHistogram::from_channels(vec![0, 7]);
        assert_eq!(hist.to_csv('\t'), "0\t0\n1\t7\n");
    }
}
