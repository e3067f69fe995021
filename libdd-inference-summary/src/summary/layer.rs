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

/// One merged layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSummary {
    #[serde(flatten)]
    pub base: SummaryBase,
    pub index: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub layer_type: String,
    pub shape: String,
    /// Trimmed mean over runs, microseconds.
    pub duration: i64,
    pub duration_p90: i64,
    pub allocated_bytes: i64,
    pub peak_allocated_bytes: i64,
    pub samples: usize,
}

impl LayerSummary {
    pub fn from_merged(merged: &MergedEvaluation, trim_fraction: f64) -> Vec<Self> {
        merged
            .layers
            .iter()
            .map(|lk| {
                let layer = &lk.layer;
                Self {
                    base: merged.base.clone(),
                    index: layer.index,
                    name: layer.name.clone(),
                    layer_type: layer.layer_type.clone(),
                    shape: layer.shape.clone(),
                    duration: trimmed_mean(&layer.durations, trim_fraction),
                    duration_p90: percentile(&layer.durations, 90.0),
                    allocated_bytes: trimmed_mean(&layer.allocated_bytes, trim_fraction),
                    peak_allocated_bytes: trimmed_mean(&layer.peak_allocated_bytes, trim_fraction),
                    samples: layer.durations.len(),
                }
            })
            .collect()
    }
}

impl Tabular for LayerSummary {
    fn header() -> Vec<String> {
        header_with_base(&[
            "layer_index",
            "layer_name",
            "layer_type",
            "layer_shape",
            "layer_duration_us",
            "layer_duration_p90_us",
            "layer_allocated_bytes",
            "layer_peak_allocated_bytes",
        ])
    }

    fn row(&self) -> Vec<String> {
        row_with_base(
            &self.base,
            vec![
                self.index.to_string(),
                self.name.clone(),
                self.layer_type.clone(),
                self.shape.clone(),
                self.duration.to_string(),
                self.duration_p90.to_string(),
                self.allocated_bytes.to_string(),
                self.peak_allocated_bytes.to_string(),
            ],
        )
    }
}

/// Layers of one evaluation grouped by type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerTypeSummary {
    #[serde(flatten)]
    pub base: SummaryBase,
    #[serde(rename = "type")]
    pub layer_type: String,
    pub occurrences: usize,
    /// Sum of the per-layer trimmed mean durations, microseconds.
    pub duration: i64,
    /// Share of the evaluation's summed layer duration, in percent.
    pub percentage: f64,
}

impl LayerTypeSummary {
    /// Groups in first-seen order.
    pub fn from_layers(layers: &[LayerSummary]) -> Vec<Self> {
        let mut groups: IndexMap<&str, Self> = IndexMap::new();
        for layer in layers {
            let entry = groups
                .entry(layer.layer_type.as_str())
                .or_insert_with(|| Self {
                    base: layer.base.clone(),
                    layer_type: layer.layer_type.clone(),
                    occurrences: 0,
                    duration: 0,
                    percentage: 0.0,
                });
            entry.occurrences += 1;
            entry.duration += layer.duration;
        }

        let total: i64 = groups.values().map(|g| g.duration).sum();
        groups
            .into_values()
            .map(|mut g| {
                if total > 0 {
                    g.percentage = g.duration as f64 * 100.0 / total as f64;
                }
                g
            })
            .collect()
    }

    /// Duration per type.
    pub fn bar_series(summaries: &[Self]) -> Series {
        let mut series = Series::new("layer duration by type (us)");
        for s in summaries {
            series.push(s.layer_type.clone(), s.duration as f64);
        }
        series
    }

    /// Duration share per type.
    pub fn pie_series(summaries: &[Self]) -> Series {
        let mut series = Series::new("layer duration share by type (%)");
        for s in summaries {
            series.push(s.layer_type.clone(), s.percentage);
        }
        series
    }
}

impl Tabular for LayerTypeSummary {
    fn header() -> Vec<String> {
        header_with_base(&[
            "layer_type",
            "layer_occurrences",
            "layer_duration_us",
            "layer_duration_percentage",
        ])
    }

    fn row(&self) -> Vec<String> {
        row_with_base(
            &self.base,
            vec![
                self.layer_type.clone(),
                self.occurrences.to_string(),
                self.duration.to_string(),
                format_f64(self.percentage),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::fixtures;
    use crate::writer::{write_table, TableBuffer};

    #[test]
    fn one_row_per_layer() {
        let layers = LayerSummary::from_merged(&fixtures::merged(1, vec![100, 100]), 0.2);
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[0].name, "conv");
        assert_eq!(layers[0].duration, 60);
        assert_eq!(layers[0].duration_p90, 60);
        assert_eq!(layers[0].samples, 2);
        assert_eq!(layers[0].allocated_bytes, 0);

        let mut table = TableBuffer::new();
        write_table(&mut table, &layers).unwrap();
        assert_eq!(table.cell(2, "layer_name"), Some("conv2"));
        assert_eq!(table.cell(2, "model_name"), Some("ResNet50"));
    }

    #[test]
    fn types_in_first_seen_order() {
        let layers = LayerSummary::from_merged(&fixtures::merged(1, vec![100]), 0.2);
        let types = LayerTypeSummary::from_layers(&layers);

        assert_eq!(types.len(), 2);
        assert_eq!(types[0].layer_type, "Convolution");
        assert_eq!(types[0].occurrences, 2);
        assert_eq!(types[0].duration, 90);
        assert_eq!(types[0].percentage, 90.0);
        assert_eq!(types[1].layer_type, "Activation");
        assert_eq!(types[1].percentage, 10.0);

        let pie = LayerTypeSummary::pie_series(&types);
        assert_eq!(pie.labels().collect::<Vec<_>>(), ["Convolution", "Activation"]);
        assert_eq!(pie.values().sum::<f64>(), 100.0);
        assert_eq!(LayerTypeSummary::bar_series(&types).len(), 2);
        assert_eq!(types[0].row()[LayerTypeSummary::header().len() - 1], "90.000");
    }
}
