// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{format_f64, header_with_base, row_with_base};
use crate::model::SummaryBase;
use crate::pipeline::MergedEvaluation;
use crate::plot::Series;
use crate::writer::Tabular;
use indexmap::IndexMap;
use libdd_inference_stats::{percentile, trimmed_mean};
use serde::{Deserialize, Serialize};

/// End-to-end latency of one evaluation, from the root span of every pooled run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelLatencySummary {
    #[serde(flatten)]
    pub base: SummaryBase,
    /// Root span duration per run, microseconds.
    pub durations: Vec<i64>,
    /// Trimmed mean, microseconds.
    pub latency: f64,
    pub latency_p90: f64,
    pub latency_p99: f64,
    /// Inputs per second.
    pub throughput: f64,
}

impl ModelLatencySummary {
    pub fn from_merged(merged: &MergedEvaluation, trim_fraction: f64) -> Self {
        let durations: Vec<f64> = merged.run_durations.iter().map(|d| *d as f64).collect();
        let latency = trimmed_mean(&durations, trim_fraction);
        let throughput = if latency > 0.0 {
            f64::from(merged.base.batch_size) * 1e6 / latency
        } else {
            0.0
        };
        Self {
            base: merged.base.clone(),
            durations: merged.run_durations.clone(),
            latency,
            latency_p90: percentile(&durations, 90.0),
            latency_p99: percentile(&durations, 99.0),
            throughput,
        }
    }

    /// One box per batch size.
    pub fn box_series(summaries: &[Self]) -> Series {
        let mut series = Series::new("latency (us)");
        for s in summaries {
            for d in &s.durations {
                series.push(s.base.batch_size.to_string(), *d as f64);
            }
        }
        series
    }
}

impl Tabular for ModelLatencySummary {
    fn header() -> Vec<String> {
        header_with_base(&[
            "runs",
            "latency_us",
            "latency_p90_us",
            "latency_p99_us",
            "throughput",
        ])
    }

    fn row(&self) -> Vec<String> {
        row_with_base(
            &self.base,
            vec![
                self.durations.len().to_string(),
                format_f64(self.latency),
                format_f64(self.latency_p90),
                format_f64(self.latency_p99),
                format_f64(self.throughput),
            ],
        )
    }
}

/// Latency and throughput of one model, framework and machine across batch sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputLatencyCurve {
    pub model_name: String,
    pub model_version: String,
    pub framework_name: String,
    pub framework_version: String,
    pub machine_architecture: String,
    /// Sorted by batch size.
    pub points: Vec<CurvePoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub batch_size: u32,
    pub latency: f64,
    pub throughput: f64,
}

fn joined<T: ToString>(values: impl Iterator<Item = T>) -> String {
    values.map(|v| v.to_string()).collect::<Vec<_>>().join(";")
}

impl ThroughputLatencyCurve {
    /// One curve per configuration, in first-seen order.
    pub fn group(summaries: &[ModelLatencySummary]) -> Vec<Self> {
        let mut curves: IndexMap<_, Self> = IndexMap::new();
        for s in summaries {
            let curve = curves
                .entry(s.base.configuration_key())
                .or_insert_with(|| Self {
                    model_name: s.base.model_name.clone(),
                    model_version: s.base.model_version.clone(),
                    framework_name: s.base.framework_name.clone(),
                    framework_version: s.base.framework_version.clone(),
                    machine_architecture: s.base.machine_architecture.clone(),
                    points: Vec::new(),
                });
            curve.points.push(CurvePoint {
                batch_size: s.base.batch_size,
                latency: s.latency,
                throughput: s.throughput,
            });
        }
        curves
            .into_values()
            .map(|mut c| {
                c.points.sort_by_key(|p| p.batch_size);
                c
            })
            .collect()
    }

    /// Throughput per batch size.
    pub fn bar_series(&self) -> Series {
        let mut series = Series::new(format!(
            "{} {} on {} {} ({})",
            self.model_name,
            self.model_version,
            self.framework_name,
            self.framework_version,
            self.machine_architecture
        ));
        for p in &self.points {
            series.push(p.batch_size.to_string(), p.throughput);
        }
        series
    }
}

impl Tabular for ThroughputLatencyCurve {
    fn header() -> Vec<String> {
        [
            "model_name",
            "model_version",
            "framework_name",
            "framework_version",
            "machine_architecture",
            "batch_sizes",
            "latencies_us",
            "throughputs",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect()
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.model_name.clone(),
            self.model_version.clone(),
            self.framework_name.clone(),
            self.framework_version.clone(),
            self.machine_architecture.clone(),
            joined(self.points.iter().map(|p| p.batch_size)),
            joined(self.points.iter().map(|p| format_f64(p.latency))),
            joined(self.points.iter().map(|p| format_f64(p.throughput))),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::fixtures;

    #[test]
    fn latency_and_throughput() {
        let summary = ModelLatencySummary::from_merged(
            &fixtures::merged(8, vec![1000, 2000, 2000, 2000, 100_000]),
            0.2,
        );
        assert_eq!(summary.latency, 2000.0);
        assert_eq!(summary.latency_p90, 51_000.0);
        assert_eq!(summary.latency_p99, 51_000.0);
        assert_eq!(summary.throughput, 4000.0);
        assert_eq!(summary.row().len(), ModelLatencySummary::header().len());
    }

    #[test]
    fn no_runs_has_zero_throughput() {
        let summary = ModelLatencySummary::from_merged(&fixtures::merged(8, vec![]), 0.2);
        assert_eq!(summary.latency, 0.0);
        assert_eq!(summary.throughput, 0.0);
    }

    #[test]
    fn curves_sorted_by_batch_size() {
        let summaries: Vec<ModelLatencySummary> = [(4, 2000), (1, 1000), (2, 1000)]
            .into_iter()
            .map(|(batch, latency)| {
                ModelLatencySummary::from_merged(&fixtures::merged(batch, vec![latency]), 0.2)
            })
            .collect();
        let curves = ThroughputLatencyCurve::group(&summaries);

        assert_eq!(curves.len(), 1);
        let batches: Vec<u32> = curves[0].points.iter().map(|p| p.batch_size).collect();
        assert_eq!(batches, [1, 2, 4]);
        assert_eq!(curves[0].row()[5], "1;2;4");
        assert_eq!(curves[0].row()[7], "1000.000;2000.000;2000.000");
        assert_eq!(
            curves[0].bar_series().values().collect::<Vec<_>>(),
            [1000.0, 2000.0, 2000.0]
        );

        let boxes = ModelLatencySummary::box_series(&summaries);
        assert_eq!(boxes.labels().collect::<Vec<_>>(), ["4", "1", "2"]);
    }
}
