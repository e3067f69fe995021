// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! GPU kernels: launch spans seed a kernel, execution spans fill its measurements.

use indexmap::IndexMap;
use libdd_inference_stats::trimmed_mean;
use libdd_inference_trace::{KeyValue, Span, TagValue};
use serde::{Deserialize, Serialize};

pub const LAUNCH_OPERATION: &str = "cuda_launch";
pub const EXECUTION_OPERATION: &str = "gpu_kernel";

pub const CORRELATION_ID_TAG: &str = "correlation_id";
pub const KERNEL_NAME_TAG: &str = "kernel_name";
pub const MANGLED_KERNEL_NAME_TAG: &str = "mangled_kernel_name";

pub const FLOP_COUNT_FIELD: &str = "flop_count_sp";
pub const DRAM_READ_BYTES_FIELD: &str = "dram_read_bytes";
pub const DRAM_WRITE_BYTES_FIELD: &str = "dram_write_bytes";
pub const ACHIEVED_OCCUPANCY_FIELD: &str = "achieved_occupancy";

fn to_map(pairs: &[KeyValue]) -> IndexMap<String, TagValue> {
    pairs
        .iter()
        .map(|kv| (kv.key.clone(), kv.value.clone()))
        .collect()
}

/// One kernel launch inside a layer.
///
/// `durations`, `tags` and `logs` come only from execution spans; one entry per pooled run.
/// The `mean_*` scalars and the roofline figures are derived, see [`KernelInformation::derive`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KernelInformation {
    pub name: String,
    pub mangled_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<i64>,
    /// Microseconds.
    pub durations: Vec<i64>,
    pub tags: Vec<IndexMap<String, TagValue>>,
    pub logs: Vec<IndexMap<String, TagValue>>,
    /// Microseconds.
    pub mean_duration: f64,
    pub mean_flops: f64,
    pub mean_dram_read_bytes: f64,
    pub mean_dram_write_bytes: f64,
    pub mean_achieved_occupancy: f64,
    /// Flops per DRAM byte.
    pub arithmetic_intensity: f64,
    /// Flops per second.
    pub arithmetic_throughput: f64,
    pub memory_bound: bool,
}

impl KernelInformation {
    /// Seeds a kernel from a `cuda_launch` span. The mangled name defaults to the kernel name.
    pub fn from_launch(span: &Span) -> Self {
        let name = span
            .tag(KERNEL_NAME_TAG)
            .map(|v| v.to_string())
            .unwrap_or_default();
        let mangled_name = span
            .tag(MANGLED_KERNEL_NAME_TAG)
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
            .unwrap_or_else(|| name.clone());
        Self {
            name,
            mangled_name,
            correlation_id: span.tag_as_i64(CORRELATION_ID_TAG).ok(),
            ..Default::default()
        }
    }

    /// Whether an execution span was already recorded for this run.
    pub fn is_filled(&self) -> bool {
        !self.durations.is_empty()
    }

    /// Records the measurements of a `gpu_kernel` span.
    pub fn record_execution(&mut self, span: &Span) {
        self.durations.push(span.duration);
        self.tags.push(to_map(&span.tags));
        self.logs
            .extend(span.logs.iter().map(|log| to_map(&log.fields)));
    }

    /// Appends the samples of the same kernel from another run.
    pub fn pool(&mut self, other: &KernelInformation) {
        self.durations.extend_from_slice(&other.durations);
        self.tags.extend(other.tags.iter().cloned());
        self.logs.extend(other.logs.iter().cloned());
    }

    /// Trimmed mean of the numeric values logged under `key`. Zero when nothing was logged.
    pub fn mean_log_value(&self, key: &str, fraction: f64) -> f64 {
        let values: Vec<f64> = self
            .logs
            .iter()
            .filter_map(|log| log.get(key)?.as_f64())
            .collect();
        trimmed_mean(&values, fraction)
    }

    /// Recomputes every derived scalar from the current samples.
    pub fn derive(&mut self, fraction: f64, ideal_arithmetic_intensity: Option<f64>) {
        let durations: Vec<f64> = self.durations.iter().map(|d| *d as f64).collect();
        self.mean_duration = trimmed_mean(&durations, fraction);
        self.mean_flops = self.mean_log_value(FLOP_COUNT_FIELD, fraction);
        self.mean_dram_read_bytes = self.mean_log_value(DRAM_READ_BYTES_FIELD, fraction);
        self.mean_dram_write_bytes = self.mean_log_value(DRAM_WRITE_BYTES_FIELD, fraction);
        self.mean_achieved_occupancy = self.mean_log_value(ACHIEVED_OCCUPANCY_FIELD, fraction);

        let dram_bytes = self.mean_dram_read_bytes + self.mean_dram_write_bytes;
        self.arithmetic_intensity = if dram_bytes > 0.0 {
            self.mean_flops / dram_bytes
        } else {
            0.0
        };
        self.arithmetic_throughput = if self.mean_duration > 0.0 {
            self.mean_flops * 1e6 / self.mean_duration
        } else {
            0.0
        };
        self.memory_bound =
            ideal_arithmetic_intensity.is_some_and(|ideal| self.arithmetic_intensity < ideal);
    }

    pub fn mean_dram_bytes(&self) -> f64 {
        self.mean_dram_read_bytes + self.mean_dram_write_bytes
    }
}
