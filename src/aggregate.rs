//! Batch level view over all measurements: time offsets, groupings and
//! per-identifier endpoint series.

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeDelta};
use clap::ValueEnum;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::{
    error::{AnalysisError, Result},
    measurement::Measurement,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Days,
    Hours,
}

impl TimeUnit {
    pub fn count(&self, delta: TimeDelta) -> i64 {
        match self {
            TimeUnit::Days => delta.num_days(),
            TimeUnit::Hours => delta.num_hours(),
        }
    }

    pub fn axis_title(&self) -> &'static str {
        match self {
            TimeUnit::Days => "Time [days]",
            TimeUnit::Hours => "Time [hours]",
        }
    }
}

/// Every measurement of a run plus its offset from the earliest date.
///
/// Offsets are derived from the full membership, so the batch can only be
/// built (or rebuilt) as a whole.
#[derive(Debug, Clone)]
pub struct Batch {
    measurements: Vec<Measurement>,
    relative_times: Vec<TimeDelta>,
    min_date: NaiveDate,
}

impl Batch {
    pub fn new(measurements: Vec<Measurement>) -> Result<Self> {
        let min_date = measurements
            .iter()
            .map(|measurement| measurement.meta.date)
            .min()
            .ok_or(AnalysisError::EmptyBatch)?;

        let relative_times = measurements
            .iter()
            .map(|measurement| measurement.meta.date - min_date)
            .collect();

        Ok(Batch {
            measurements,
            relative_times,
            min_date,
        })
    }

    /// New batch with `more` appended; offsets are recomputed.
    pub fn extended(self, more: Vec<Measurement>) -> Result<Self> {
        let mut measurements = self.measurements;
        measurements.extend(more);
        Batch::new(measurements)
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    pub fn min_date(&self) -> NaiveDate {
        self.min_date
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn get(&self, idx: usize) -> &Measurement {
        &self.measurements[idx]
    }

    pub fn relative_time(&self, idx: usize) -> TimeDelta {
        self.relative_times[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Measurement, TimeDelta)> {
        self.measurements
            .iter()
            .zip(self.relative_times.iter().copied())
    }

    /// Indices ordered by date, insertion order within a date.
    pub fn date_order(&self) -> Vec<usize> {
        (0..self.len())
            .sorted_by_key(|&idx| self.measurements[idx].meta.date)
            .collect()
    }

    pub fn groups(&self) -> Groups {
        let mut groups = Groups::default();
        for (idx, measurement) in self.measurements.iter().enumerate() {
            let meta = &measurement.meta;
            groups.by_date.entry(meta.date).or_default().push(idx);
            groups
                .by_sample
                .entry(meta.sample_label.clone())
                .or_default()
                .push(idx);
            groups
                .by_concentration
                .entry(meta.concentration.clone())
                .or_default()
                .push(idx);
            groups
                .by_identifier
                .entry(meta.identifier.clone())
                .or_default()
                .push(idx);
        }
        groups
    }

    /// Members of every `(date, sample_label)` pair that has any.
    pub fn stacks(&self) -> BTreeMap<(NaiveDate, String), Vec<usize>> {
        let mut stacks: BTreeMap<_, Vec<usize>> = BTreeMap::new();
        for (idx, measurement) in self.measurements.iter().enumerate() {
            let key = (measurement.meta.date, measurement.meta.sample_label.clone());
            stacks.entry(key).or_default().push(idx);
        }
        stacks
    }

    /// One endpoint series per identifier, ascending in time.
    pub fn time_series(&self, unit: TimeUnit) -> BTreeMap<String, Vec<SeriesPoint>> {
        let mut series: BTreeMap<String, Vec<SeriesPoint>> = BTreeMap::new();
        for (measurement, relative_time) in self.iter() {
            series
                .entry(measurement.meta.identifier.clone())
                .or_default()
                .push(SeriesPoint {
                    name: measurement.name.clone(),
                    date: measurement.meta.date,
                    relative_time: unit.count(relative_time),
                    median: measurement.endpoint.median,
                    mean: measurement.endpoint.mean,
                });
        }
        // sort_by_key is stable
        series
            .values_mut()
            .for_each(|points| points.sort_by_key(|point| point.relative_time));
        series
    }
}

/// Measurement indices bucketed four ways; keys sorted, members in batch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Groups {
    pub by_date: BTreeMap<NaiveDate, Vec<usize>>,
    pub by_sample: BTreeMap<String, Vec<usize>>,
    pub by_concentration: BTreeMap<String, Vec<usize>>,
    pub by_identifier: BTreeMap<String, Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub name: String,
    pub date: NaiveDate,
    pub relative_time: i64,
    pub median: f64,
    pub mean: f64,
}

/// Straight line fit of the median endpoint against time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Drift {
    /// Endpoint change per time unit.
    pub slope: f64,
    pub intercept: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl Drift {
    /// `None` for series with fewer than two distinct time points.
    pub fn fit(points: &[SeriesPoint]) -> Option<Drift> {
        if points.iter().map(|point| point.relative_time).unique().count() < 2 {
            return None;
        }
        let x = points
            .iter()
            .map(|point| point.relative_time as f64)
            .collect::<Vec<_>>();
        let y = points.iter().map(|point| point.median).collect::<Vec<_>>();

        let (slope, intercept): (f64, f64) = linreg::linear_regression(&x, &y).ok()?;

        Some(Drift {
            slope,
            intercept,
            mean: y.as_slice().mean(),
            std_dev: y.as_slice().std_dev(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        endpoint::EndpointEstimator, histogram::AmpHistogram, metadata::NamingConvention,
        source::NamedHistogram,
    };

    fn measurement(name: &str, top: usize) -> Measurement {
        let mut counts = vec![0; 64];
        counts[top] = 100;
        Measurement::new(
            NamedHistogram {
                name: name.to_owned(),
                histogram: AmpHistogram::from_channels(counts),
            },
            NamingConvention::TokenCount,
            &EndpointEstimator::default(),
        )
        .unwrap()
    }

    fn batch() -> Batch {
        Batch::new(vec![
            measurement("050117_5_TEST_12_A", 40),
            measurement("020117_5_TEST_12_A", 44),
            measurement("020117_5_TEST_8_B", 30),
            measurement("030117_LAB", 50),
            measurement("050117_5_TEST_8_A", 20),
        ])
        .unwrap()
    }

    #[test]
    fn relative_times_start_at_earliest_date() {
        let batch = batch();
        assert_eq!(batch.min_date(), NaiveDate::from_ymd_opt(2017, 1, 2).unwrap());
        let days = batch
            .iter()
            .map(|(_, delta)| delta.num_days())
            .collect::<Vec<_>>();
        assert_eq!(days, vec![3, 0, 0, 1, 3]);
        assert!(days.iter().all(|day| *day >= 0));
        assert!(days.contains(&0));
    }

    #[test]
    fn every_measurement_in_one_bucket_per_map() {
        let batch = batch();
        let groups = batch.groups();
        for map in [&groups.by_sample, &groups.by_concentration, &groups.by_identifier] {
            let mut members = map.values().flatten().copied().collect::<Vec<_>>();
            members.sort();
            assert_eq!(members, (0..batch.len()).collect::<Vec<_>>());
        }
        let mut members = groups.by_date.values().flatten().copied().collect::<Vec<_>>();
        members.sort();
        assert_eq!(members, (0..batch.len()).collect::<Vec<_>>());

        assert_eq!(groups.by_sample["A"], vec![0, 1, 4]);
        assert_eq!(groups.by_concentration["8"], vec![2, 4]);
        assert_eq!(groups.by_identifier.len(), 4);
    }

    #[test]
    fn series_sorted_by_time() {
        let series = batch().time_series(TimeUnit::Days);
        let times = series["12A"]
            .iter()
            .map(|point| point.relative_time)
            .collect::<Vec<_>>();
        assert_eq!(times, vec![0, 3]);
        assert_eq!(series["12A"][0].median, 44.0);
        assert_eq!(series["Pure_LAB"].len(), 1);
    }

    #[test]
    fn series_ties_keep_batch_order() {
        let batch = Batch::new(vec![
            measurement("020117_5_TEST_12_A", 44),
            measurement("010117_5_TEST_12_A", 30),
            measurement("020117_5_TEST_12_A", 40),
        ])
        .unwrap();
        let series = batch.time_series(TimeUnit::Days);
        let points = series["12A"]
            .iter()
            .map(|point| (point.relative_time, point.median))
            .collect::<Vec<_>>();
        assert_eq!(points, vec![(0, 30.0), (1, 44.0), (1, 40.0)]);
    }

    #[test]
    fn hours_unit() {
        let series = batch().time_series(TimeUnit::Hours);
        assert_eq!(series["8A"][0].relative_time, 72);
    }

    #[test]
    fn stacks_by_date_and_sample() {
        let stacks = batch().stacks();
        let jan_2 = NaiveDate::from_ymd_opt(2017, 1, 2).unwrap();
        let jan_5 = NaiveDate::from_ymd_opt(2017, 1, 5).unwrap();
        assert_eq!(stacks[&(jan_5, "A".to_owned())], vec![0, 4]);
        assert_eq!(stacks[&(jan_2, "B".to_owned())], vec![2]);
        assert_eq!(stacks.len(), 4);
    }

    #[test]
    fn date_order_is_stable() {
        assert_eq!(batch().date_order(), vec![1, 2, 3, 0, 4]);
    }

    #[test]
    fn extending_recomputes_offsets() {
        let batch = batch()
            .extended(vec![measurement("010117_LAB", 50)])
            .unwrap();
        assert_eq!(batch.relative_time(1).num_days(), 1);
        assert_eq!(batch.relative_time(5).num_days(), 0);
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert!(matches!(Batch::new(vec![]), Err(AnalysisError::EmptyBatch)));
    }

    #[test]
    fn drift_fit() {
        let points = [(0, 100.0), (1, 98.0), (2, 96.0)]
            .into_iter()
            .map(|(relative_time, median)| SeriesPoint {
                name: String::new(),
                date: NaiveDate::from_ymd_opt(2017, 1, 1).unwrap(),
                relative_time,
                median,
                mean: median,
            })
            .collect::<Vec<_>>();
        let drift = Drift::fit(&points).unwrap();
        assert!((drift.slope + 2.0).abs() < 1e-9);
        assert!((drift.intercept - 100.0).abs() < 1e-9);
        assert!((drift.mean - 98.0).abs() < 1e-9);
        assert!(Drift::fit(&points[..1]).is_none());
    }
}
