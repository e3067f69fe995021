// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Order statistics over repeated measurements.
//!
//! Every function takes a borrowed slice, sorts a private copy when the result depends on order,
//! and returns the zero value of the sample type for empty input.

use crate::sample::Sample;
use serde::{Deserialize, Serialize};

/// Fraction trimmed from each end of the sorted samples when callers pass `0.0`.
pub const DEFAULT_TRIMMED_MEAN_FRACTION: f64 = 0.2;

fn sorted<T: Sample>(samples: &[T]) -> Vec<T> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.cmp_sample(b));
    sorted
}

fn mean_f64<T: Sample>(samples: &[T]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.to_f64()).sum::<f64>() / samples.len() as f64
}

/// Sum of all samples.
pub fn sum<T: Sample>(samples: &[T]) -> T {
    samples.iter().fold(T::default(), |acc, s| acc + *s)
}

/// Arithmetic mean of all samples.
pub fn mean<T: Sample>(samples: &[T]) -> T {
    if samples.is_empty() {
        return T::default();
    }
    T::from_f64(mean_f64(samples))
}

/// Smallest sample.
pub fn min<T: Sample>(samples: &[T]) -> T {
    samples
        .iter()
        .copied()
        .reduce(|a, b| if b.cmp_sample(&a).is_lt() { b } else { a })
        .unwrap_or_default()
}

/// Largest sample.
pub fn max<T: Sample>(samples: &[T]) -> T {
    samples
        .iter()
        .copied()
        .reduce(|a, b| if b.cmp_sample(&a).is_gt() { b } else { a })
        .unwrap_or_default()
}

/// Middle element of the sorted samples (the upper one for even lengths).
pub fn median<T: Sample>(samples: &[T]) -> T {
    if samples.is_empty() {
        return T::default();
    }
    let sorted = sorted(samples);
    sorted[sorted.len() / 2]
}

/// Mean of the samples left after dropping `floor(n * fraction)` values from each end of the
/// sorted sequence.
///
/// * `fraction == 0.0` selects [`DEFAULT_TRIMMED_MEAN_FRACTION`]; other values are clamped to
///   `[0, 1]`.
/// * Fewer than three samples: plain mean.
/// * Exactly three samples: the median.
/// * When trimming would drop every sample the median is returned.
pub fn trimmed_mean<T: Sample>(samples: &[T], fraction: f64) -> T {
    let n = samples.len();
    match n {
        0 => return T::default(),
        1 | 2 => return mean(samples),
        3 => return median(samples),
        _ => {}
    }

    let fraction = if fraction == 0.0 {
        DEFAULT_TRIMMED_MEAN_FRACTION
    } else {
        fraction.clamp(0.0, 1.0)
    };
    let sorted = sorted(samples);
    let trim = (n as f64 * fraction).floor() as usize;
    if trim * 2 >= n {
        return sorted[n / 2];
    }
    T::from_f64(mean_f64(&sorted[trim..n - trim]))
}

/// Nearest-rank percentile with midpoint interpolation for fractional ranks.
///
/// With `index = p / 100 * n` over the sorted samples:
/// * integral `index`: `sorted[index - 1]`;
/// * fractional `index > 1`: mean of `sorted[floor(index) - 1]` and `sorted[floor(index)]`;
/// * otherwise `sorted[0]`.
///
/// `p` outside `(0, 100]` yields zero.
pub fn percentile<T: Sample>(samples: &[T], p: f64) -> T {
    if samples.is_empty() || !(p > 0.0 && p <= 100.0) {
        return T::default();
    }
    let sorted = sorted(samples);
    let index = (p / 100.0) * sorted.len() as f64;
    if index >= 1.0 && index.fract() == 0.0 {
        return sorted[index as usize - 1];
    }
    if index > 1.0 {
        let i = index.floor() as usize;
        return T::from_f64((sorted[i - 1].to_f64() + sorted[i].to_f64()) / 2.0);
    }
    sorted[0]
}

/// Descriptive statistics of one sample set, as reported in summary rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary<T> {
    pub count: usize,
    pub min: T,
    pub max: T,
    pub mean: T,
    pub trimmed_mean: T,
    pub p50: T,
    pub p90: T,
    pub p99: T,
}

impl<T: Sample> SampleSummary<T> {
    pub fn from_samples(samples: &[T], trim_fraction: f64) -> Self {
        Self {
            count: samples.len(),
            min: min(samples),
            max: max(samples),
            mean: mean(samples),
            trimmed_mean: trimmed_mean(samples, trim_fraction),
            p50: percentile(samples, 50.0),
            p90: percentile(samples, 90.0),
            p99: percentile(samples, 99.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duplicate::duplicate_item;
    use std::time::Duration;

    #[duplicate_item(
        test_name                             input                                  fraction  expected;
        [test_trimmed_mean_empty]             [Vec::<f64>::new()]                    [0.2]     [0.0];
        [test_trimmed_mean_single]            [vec![7.0]]                            [0.2]     [7.0];
        [test_trimmed_mean_pair]              [vec![1.0, 4.0]]                       [0.2]     [2.5];
        [test_trimmed_mean_three_is_median]   [vec![100.0, 1.0, 2.0]]                [0.2]     [2.0];
        [test_trimmed_mean_drops_outliers]    [vec![10.0, 1.0, 2.0, 3.0, 100.0]]     [0.2]     [5.0];
        [test_trimmed_mean_default_fraction]  [vec![10.0, 1.0, 2.0, 3.0, 100.0]]     [0.0]     [5.0];
        [test_trimmed_mean_no_trim_small]     [vec![1.0, 2.0, 3.0, 4.0]]             [0.2]     [2.5];
        [test_trimmed_mean_all_trimmed]       [vec![1.0, 2.0, 3.0, 4.0]]             [0.9]     [3.0];
    )]
    #[test]
    fn test_name() {
        assert_eq!(trimmed_mean(&input, fraction), expected);
    }

    #[duplicate_item(
        test_name                              p        expected;
        [test_percentile_median_integer_rank]  [50.0]   [5.0];
        [test_percentile_p90_integer_rank]     [90.0]   [9.0];
        [test_percentile_p100]                 [100.0]  [10.0];
        [test_percentile_fractional_rank]      [25.0]   [2.5];
        [test_percentile_rank_below_one]       [5.0]    [1.0];
        [test_percentile_rank_exactly_one]     [10.0]   [1.0];
        [test_percentile_zero]                 [0.0]    [0.0];
        [test_percentile_negative]             [-10.0]  [0.0];
        [test_percentile_above_hundred]        [100.5]  [0.0];
    )]
    #[test]
    fn test_name() {
        let samples: Vec<f64> = (1..=10).map(f64::from).rev().collect();
        assert_eq!(percentile(&samples, p), expected);
    }

    #[test]
    fn test_percentile_fractional_rank_above_one_on_odd_length() {
        // index = 0.5 * 5 = 2.5 -> mean(sorted[1], sorted[2])
        assert_eq!(percentile(&[5.0, 1.0, 3.0, 2.0, 4.0], 50.0), 2.5);
    }

    #[test]
    fn test_integer_samples_truncate() {
        assert_eq!(trimmed_mean(&[10i64, 1, 2, 3, 100], 0.2), 5);
        assert_eq!(mean(&[1i64, 2]), 1);
        assert_eq!(percentile(&[1i64, 2, 3, 4], 37.5), 1);
        assert_eq!(percentile(&[1i64, 2, 3, 4, 5], 50.0), 2);
    }

    #[test]
    fn test_duration_samples() {
        let samples = [10u64, 1, 2, 3, 100].map(Duration::from_micros);
        assert_eq!(trimmed_mean(&samples, 0.2), Duration::from_micros(5));
        assert_eq!(sum(&samples), Duration::from_micros(116));
        assert_eq!(min(&samples), Duration::from_micros(1));
        assert_eq!(max(&samples), Duration::from_micros(100));
    }

    #[test]
    fn test_empty_aggregates_are_zero() {
        let empty: [i64; 0] = [];
        assert_eq!(sum(&empty), 0);
        assert_eq!(mean(&empty), 0);
        assert_eq!(min(&empty), 0);
        assert_eq!(max(&empty), 0);
        assert_eq!(median(&empty), 0);
        assert_eq!(percentile(&empty, 50.0), 0);
    }

    #[test]
    fn test_input_is_not_reordered() {
        let samples = vec![3.0, 1.0, 2.0, 9.0, 0.5];
        let copy = samples.clone();
        let _ = trimmed_mean(&samples, 0.2);
        let _ = percentile(&samples, 90.0);
        let _ = median(&samples);
        assert_eq!(samples, copy);
    }

    #[test]
    fn test_sample_summary() {
        let samples: Vec<i64> = (1..=10).collect();
        let summary = SampleSummary::from_samples(&samples, 0.2);
        assert_eq!(summary.count, 10);
        assert_eq!(summary.min, 1);
        assert_eq!(summary.max, 10);
        assert_eq!(summary.p50, 5);
        assert_eq!(summary.p90, 9);
        assert_eq!(summary.trimmed_mean, 5);
    }

    #[test]
    fn fuzz_small_samples_use_plain_mean() {
        bolero::check!()
            .with_type::<(i16, i16)>()
            .for_each(|(a, b)| {
                let samples = [f64::from(*a), f64::from(*b)];
                assert_eq!(trimmed_mean(&samples, 0.2), mean(&samples));
                assert_eq!(trimmed_mean(&samples[..1], 0.2), samples[0]);
            })
    }

    #[test]
    fn fuzz_trimmed_mean_is_bounded() {
        bolero::check!().with_type::<Vec<i16>>().for_each(|v| {
            let samples: Vec<f64> = v.iter().copied().map(f64::from).collect();
            let result = trimmed_mean(&samples, 0.2);
            if samples.is_empty() {
                assert_eq!(result, 0.0);
            } else {
                assert!(result >= min(&samples));
                assert!(result <= max(&samples));
            }
        })
    }

    #[test]
    fn fuzz_percentile_is_a_bounded_rank() {
        bolero::check!()
            .with_type::<(Vec<i16>, u8)>()
            .for_each(|(v, p)| {
                let samples: Vec<f64> = v.iter().copied().map(f64::from).collect();
                let p = f64::from(*p % 100 + 1);
                let result = percentile(&samples, p);
                if !samples.is_empty() {
                    assert!(result >= min(&samples));
                    assert!(result <= max(&samples));
                }
            })
    }
}
