// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{format_f64, header_with_base, row_with_base};
use crate::model::SummaryBase;
use crate::pipeline::MergedEvaluation;
use crate::writer::Tabular;
use libdd_inference_stats::trimmed_mean;
use serde::{Deserialize, Serialize};

/// One kernel of one merged layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelSummary {
    #[serde(flatten)]
    pub base: SummaryBase,
    pub layer_index: i64,
    pub layer_name: String,
    pub name: String,
    pub mangled_name: String,
    pub samples: usize,
    pub mean_duration: f64,
    pub mean_flops: f64,
    pub mean_dram_read_bytes: f64,
    pub mean_dram_write_bytes: f64,
    pub mean_achieved_occupancy: f64,
    pub arithmetic_intensity: f64,
    pub arithmetic_throughput: f64,
    pub memory_bound: bool,
}

impl KernelSummary {
    pub fn from_merged(merged: &MergedEvaluation) -> Vec<Self> {
        merged
            .layers
            .iter()
            .flat_map(|lk| {
                lk.kernels.iter().map(move |k| Self {
                    base: merged.base.clone(),
                    layer_index: lk.layer.index,
                    layer_name: lk.layer.name.clone(),
                    name: k.name.clone(),
                    mangled_name: k.mangled_name.clone(),
                    samples: k.durations.len(),
                    mean_duration: k.mean_duration,
                    mean_flops: k.mean_flops,
                    mean_dram_read_bytes: k.mean_dram_read_bytes,
                    mean_dram_write_bytes: k.mean_dram_write_bytes,
                    mean_achieved_occupancy: k.mean_achieved_occupancy,
                    arithmetic_intensity: k.arithmetic_intensity,
                    arithmetic_throughput: k.arithmetic_throughput,
                    memory_bound: k.memory_bound,
                })
            })
            .collect()
    }
}

impl Tabular for KernelSummary {
    fn header() -> Vec<String> {
        header_with_base(&[
            "layer_index",
            "layer_name",
            "kernel_name",
            "kernel_mangled_name",
            "kernel_samples",
            "kernel_duration_us",
            "kernel_flops",
            "kernel_dram_read_bytes",
            "kernel_dram_write_bytes",
            "kernel_achieved_occupancy",
            "kernel_arithmetic_intensity",
            "kernel_arithmetic_throughput",
            "kernel_memory_bound",
        ])
    }

    fn row(&self) -> Vec<String> {
        row_with_base(
            &self.base,
            vec![
                self.layer_index.to_string(),
                self.layer_name.clone(),
                self.name.clone(),
                self.mangled_name.clone(),
                self.samples.to_string(),
                format_f64(self.mean_duration),
                format_f64(self.mean_flops),
                format_f64(self.mean_dram_read_bytes),
                format_f64(self.mean_dram_write_bytes),
                format_f64(self.mean_achieved_occupancy),
                format_f64(self.arithmetic_intensity),
                format_f64(self.arithmetic_throughput),
                self.memory_bound.to_string(),
            ],
        )
    }
}

/// Kernel totals of one merged layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerKernelSummary {
    #[serde(flatten)]
    pub base: SummaryBase,
    pub layer_index: i64,
    pub layer_name: String,
    /// Trimmed mean layer duration, microseconds.
    pub layer_duration: i64,
    pub kernel_count: usize,
    /// Sum of the kernels' mean durations, microseconds.
    pub kernel_duration: f64,
    pub flops: f64,
    pub dram_read_bytes: f64,
    pub dram_write_bytes: f64,
}

impl LayerKernelSummary {
    pub fn from_merged(merged: &MergedEvaluation, trim_fraction: f64) -> Vec<Self> {
        merged
            .layers
            .iter()
            .map(|lk| Self {
                base: merged.base.clone(),
                layer_index: lk.layer.index,
                layer_name: lk.layer.name.clone(),
                layer_duration: trimmed_mean(&lk.layer.durations, trim_fraction),
                kernel_count: lk.kernels.len(),
                kernel_duration: lk.kernels.iter().map(|k| k.mean_duration).sum(),
                flops: lk.kernels.iter().map(|k| k.mean_flops).sum(),
                dram_read_bytes: lk.kernels.iter().map(|k| k.mean_dram_read_bytes).sum(),
                dram_write_bytes: lk.kernels.iter().map(|k| k.mean_dram_write_bytes).sum(),
            })
            .collect()
    }
}

impl Tabular for LayerKernelSummary {
    fn header() -> Vec<String> {
        header_with_base(&[
            "layer_index",
            "layer_name",
            "layer_duration_us",
            "kernel_count",
            "kernel_duration_us",
            "kernel_flops",
            "kernel_dram_read_bytes",
            "kernel_dram_write_bytes",
        ])
    }

    fn row(&self) -> Vec<String> {
        row_with_base(
            &self.base,
            vec![
                self.layer_index.to_string(),
                self.layer_name.clone(),
                self.layer_duration.to_string(),
                self.kernel_count.to_string(),
                format_f64(self.kernel_duration),
                format_f64(self.flops),
                format_f64(self.dram_read_bytes),
                format_f64(self.dram_write_bytes),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::fixtures;

    #[test]
    fn kernels_flattened_in_layer_order() {
        let kernels = KernelSummary::from_merged(&fixtures::merged(1, vec![100]));
        let names: Vec<(i64, &str)> = kernels
            .iter()
            .map(|k| (k.layer_index, k.name.as_str()))
            .collect();
        assert_eq!(names, [(0, "sgemm"), (0, "bias"), (2, "sgemm")]);
        assert_eq!(kernels[0].row().len(), KernelSummary::header().len());
        assert_eq!(kernels[0].row()[SummaryBase::HEADER.len() + 5], "40.000");
    }

    #[test]
    fn layer_totals() {
        let layers = LayerKernelSummary::from_merged(&fixtures::merged(1, vec![100]), 0.2);
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[0].kernel_count, 2);
        assert_eq!(layers[0].kernel_duration, 50.0);
        assert_eq!(layers[0].flops, 1050.0);
        assert_eq!(layers[0].dram_read_bytes, 150.0);
        assert_eq!(layers[1].kernel_count, 0);
        assert_eq!(layers[1].kernel_duration, 0.0);
        assert_eq!(layers[2].layer_duration, 30);
    }
}
