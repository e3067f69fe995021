// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-layer measurements read from framework level spans.

use indexmap::IndexMap;
use libdd_inference_stats::{percentile, trimmed_mean};
use libdd_inference_trace::{Span, SpanTree, TraceError, TraceLevel};
use serde::{Deserialize, Serialize};

pub const LAYER_INDEX_TAG: &str = "layer_sequence_index";
pub const OP_TYPE_TAG: &str = "op_type";
pub const STATIC_TYPE_TAG: &str = "static_type";
pub const SHAPE_TAG: &str = "shape";
pub const ALLOCATION_DESCRIPTION_TAG: &str = "allocation_description";
pub const MEMORY_STATS_TAG: &str = "memory_stats";

/// One layer, with one sample per pooled run in every sample vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerInformation {
    pub index: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub layer_type: String,
    pub static_type: String,
    pub shape: String,
    /// Microseconds.
    pub durations: Vec<i64>,
    pub allocated_bytes: Vec<i64>,
    pub peak_allocated_bytes: Vec<i64>,
    pub allocator_bytes_in_use: Vec<i64>,
    pub allocator_name: String,
    pub host_temp_mem_sizes: Vec<i64>,
    pub device_temp_mem_sizes: Vec<i64>,
    pub host_persistent_mem_sizes: Vec<i64>,
    pub device_persistent_mem_sizes: Vec<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct AllocationDescription {
    #[serde(default)]
    allocator_name: String,
    #[serde(default, alias = "total_bytes")]
    allocated_bytes: Option<i64>,
    #[serde(default)]
    peak_bytes: Option<i64>,
    #[serde(default)]
    allocator_bytes_in_use: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct MemoryStats {
    #[serde(default, alias = "temp_memory_size")]
    host_temp_memory_size: Option<i64>,
    #[serde(default)]
    device_temp_memory_size: Option<i64>,
    #[serde(default, alias = "persistent_memory_size")]
    host_persistent_memory_size: Option<i64>,
    #[serde(default)]
    device_persistent_memory_size: Option<i64>,
}

/// Decodes a JSON object carried as a string tag. Absent, non-string and malformed tags all
/// decode to `None`.
fn json_tag<T: serde::de::DeserializeOwned>(span: &Span, key: &str) -> Option<T> {
    let raw = span.tag(key)?.as_str()?;
    serde_json::from_str(raw).ok()
}

fn optional_string(span: &Span, key: &str) -> String {
    span.tag(key).map(|v| v.to_string()).unwrap_or_default()
}

/// Framework level spans carrying a non-empty `layer_sequence_index` tag.
pub fn is_layer_span(span: &Span) -> bool {
    span.trace_level() == Some(TraceLevel::Framework) && span.has_tag(LAYER_INDEX_TAG)
}

impl LayerInformation {
    /// Reads metadata and the first sample of every measurement from a layer span.
    ///
    /// # Errors
    ///
    /// Fails when `layer_sequence_index` is absent or not an integer. Memory tags are optional.
    pub fn from_span(span: &Span) -> Result<Self, TraceError> {
        let mut layer = Self {
            index: span.tag_as_i64(LAYER_INDEX_TAG)?,
            name: span.operation_name.clone(),
            layer_type: optional_string(span, OP_TYPE_TAG),
            static_type: optional_string(span, STATIC_TYPE_TAG),
            shape: optional_string(span, SHAPE_TAG),
            ..Default::default()
        };
        layer.record_samples(span);
        Ok(layer)
    }

    /// Copies the metadata of `template` and reads only the samples from `span`.
    pub fn from_template(template: &LayerInformation, span: &Span) -> Self {
        let mut layer = template.metadata();
        layer.record_samples(span);
        layer
    }

    /// Same layer without any samples.
    pub fn metadata(&self) -> Self {
        Self {
            index: self.index,
            name: self.name.clone(),
            layer_type: self.layer_type.clone(),
            static_type: self.static_type.clone(),
            shape: self.shape.clone(),
            allocator_name: self.allocator_name.clone(),
            ..Default::default()
        }
    }

    fn record_samples(&mut self, span: &Span) {
        self.durations.push(span.duration);
        let allocation = json_tag::<AllocationDescription>(span, ALLOCATION_DESCRIPTION_TAG);
        if let Some(allocation) = allocation {
            if self.allocator_name.is_empty() {
                self.allocator_name = allocation.allocator_name;
            }
            self.allocated_bytes.extend(allocation.allocated_bytes);
            self.peak_allocated_bytes.extend(allocation.peak_bytes);
            self.allocator_bytes_in_use
                .extend(allocation.allocator_bytes_in_use);
        }
        if let Some(stats) = json_tag::<MemoryStats>(span, MEMORY_STATS_TAG) {
            self.host_temp_mem_sizes.extend(stats.host_temp_memory_size);
            self.device_temp_mem_sizes
                .extend(stats.device_temp_memory_size);
            self.host_persistent_mem_sizes
                .extend(stats.host_persistent_memory_size);
            self.device_persistent_mem_sizes
                .extend(stats.device_persistent_memory_size);
        }
    }

    /// Appends every sample of `other`. Metadata is left untouched.
    pub fn pool(&mut self, other: &LayerInformation) {
        self.durations.extend_from_slice(&other.durations);
        self.allocated_bytes.extend_from_slice(&other.allocated_bytes);
        self.peak_allocated_bytes
            .extend_from_slice(&other.peak_allocated_bytes);
        self.allocator_bytes_in_use
            .extend_from_slice(&other.allocator_bytes_in_use);
        self.host_temp_mem_sizes
            .extend_from_slice(&other.host_temp_mem_sizes);
        self.device_temp_mem_sizes
            .extend_from_slice(&other.device_temp_mem_sizes);
        self.host_persistent_mem_sizes
            .extend_from_slice(&other.host_persistent_mem_sizes);
        self.device_persistent_mem_sizes
            .extend_from_slice(&other.device_persistent_mem_sizes);
        if self.allocator_name.is_empty() {
            self.allocator_name.clone_from(&other.allocator_name);
        }
    }

    pub fn trimmed_mean_duration(&self, fraction: f64) -> i64 {
        trimmed_mean(&self.durations, fraction)
    }

    pub fn duration_percentile(&self, p: f64) -> i64 {
        percentile(&self.durations, p)
    }
}

/// Layer metadata of every run, keyed by layer name and index in first-seen order.
///
/// Built once per evaluation so that per-run aggregation can skip tag parsing. A name that
/// repeats at several indexes gets one entry per index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerTable {
    layers: IndexMap<(String, i64), LayerInformation>,
}

impl LayerTable {
    /// Scans the layer spans of every tree. Spans that fail to parse are left out; the per-run
    /// aggregator reports them.
    pub fn from_trees<'a>(trees: impl IntoIterator<Item = &'a SpanTree>) -> Self {
        let mut layers = IndexMap::new();
        for tree in trees {
            for span in tree.spans().iter().filter(|s| is_layer_span(s)) {
                let Ok(index) = span.tag_as_i64(LAYER_INDEX_TAG) else {
                    continue;
                };
                let key = (span.operation_name.clone(), index);
                if layers.contains_key(&key) {
                    continue;
                }
                if let Ok(layer) = LayerInformation::from_span(span) {
                    layers.insert(key, layer.metadata());
                }
            }
        }
        Self { layers }
    }

    pub fn get(&self, name: &str, index: i64) -> Option<&LayerInformation> {
        self.layers.get(&(name.to_owned(), index))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerInformation> {
        self.layers.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libdd_inference_trace::test_utils::SpanBuilder;

    fn conv(id: u64, index: i64, duration: i64) -> Span {
        SpanBuilder::new(id, "conv1")
            .level(TraceLevel::Framework)
            .tag(LAYER_INDEX_TAG, index)
            .tag(OP_TYPE_TAG, "Convolution")
            .tag(STATIC_TYPE_TAG, "Conv2D")
            .tag(SHAPE_TAG, "[1,64,112,112]")
            .tag(
                ALLOCATION_DESCRIPTION_TAG,
                r#"{"allocator_name": "GPU_0_bfc", "allocated_bytes": 4096, "peak_bytes": 8192}"#,
            )
            .tag(
                MEMORY_STATS_TAG,
                r#"{"host_temp_memory_size": 16, "device_persistent_memory_size": 256}"#,
            )
            .duration(duration)
            .build()
    }

    #[test]
    fn reads_metadata_and_memory() {
        let layer = LayerInformation::from_span(&conv(1, 3, 120)).unwrap();
        assert_eq!(layer.index, 3);
        assert_eq!(layer.name, "conv1");
        assert_eq!(layer.layer_type, "Convolution");
        assert_eq!(layer.static_type, "Conv2D");
        assert_eq!(layer.shape, "[1,64,112,112]");
        assert_eq!(layer.durations, [120]);
        assert_eq!(layer.allocator_name, "GPU_0_bfc");
        assert_eq!(layer.allocated_bytes, [4096]);
        assert_eq!(layer.peak_allocated_bytes, [8192]);
        assert!(layer.allocator_bytes_in_use.is_empty());
        assert_eq!(layer.host_temp_mem_sizes, [16]);
        assert_eq!(layer.device_persistent_mem_sizes, [256]);
        assert!(layer.device_temp_mem_sizes.is_empty());
    }

    #[test]
    fn broken_memory_tags_give_empty_samples() {
        let span = SpanBuilder::new(1, "relu")
            .level(TraceLevel::Framework)
            .tag(LAYER_INDEX_TAG, "4")
            .tag(ALLOCATION_DESCRIPTION_TAG, "{not json")
            .tag(MEMORY_STATS_TAG, 12)
            .duration(7)
            .build();
        let layer = LayerInformation::from_span(&span).unwrap();
        assert_eq!(layer.index, 4);
        assert_eq!(layer.durations, [7]);
        assert!(layer.allocated_bytes.is_empty());
        assert!(layer.host_temp_mem_sizes.is_empty());
        assert_eq!(layer.layer_type, "");
    }

    #[test]
    fn bad_index_is_an_error() {
        let span = SpanBuilder::new(1, "relu")
            .level(TraceLevel::Framework)
            .tag(LAYER_INDEX_TAG, "third")
            .build();
        assert_eq!(
            LayerInformation::from_span(&span),
            Err(TraceError::TypeCoercion {
                key: LAYER_INDEX_TAG.to_owned(),
                expected: "i64",
            })
        );
    }

    #[test]
    fn pool_appends_samples() {
        let mut layer = LayerInformation::from_span(&conv(1, 0, 100)).unwrap();
        layer.pool(&LayerInformation::from_span(&conv(2, 0, 140)).unwrap());
        assert_eq!(layer.durations, [100, 140]);
        assert_eq!(layer.allocated_bytes, [4096, 4096]);
        assert_eq!(layer.trimmed_mean_duration(0.2), 120);
    }

    #[test]
    fn table_matches_span_path() {
        let tree = SpanTree::build(vec![
            conv(1, 0, 100),
            SpanBuilder::new(2, "fc")
                .level(TraceLevel::Framework)
                .tag(LAYER_INDEX_TAG, 1)
                .tag(OP_TYPE_TAG, "FullyConnected")
                .duration(30)
                .build(),
            SpanBuilder::new(3, "ignored")
                .level(TraceLevel::Framework)
                .tag(LAYER_INDEX_TAG, "")
                .build(),
        ])
        .unwrap();
        let table = LayerTable::from_trees([&tree]);
        assert_eq!(table.len(), 2);

        for span in &tree.spans()[..2] {
            let direct = LayerInformation::from_span(span).unwrap();
            let template = table.get(&span.operation_name, direct.index).unwrap();
            assert_eq!(LayerInformation::from_template(template, span), direct);
        }
        assert!(table.get("ignored", 0).is_none());
    }

    fn relu(id: u64, index: i64, op_type: &str, duration: i64) -> Span {
        SpanBuilder::new(id, "relu")
            .level(TraceLevel::Framework)
            .tag(LAYER_INDEX_TAG, index)
            .tag(OP_TYPE_TAG, op_type)
            .duration(duration)
            .build()
    }

    #[test]
    fn repeated_names_keep_their_index() {
        let first = SpanTree::build(vec![
            relu(1, 1, "Activation", 10),
            conv(2, 2, 50),
            relu(3, 3, "Activation", 20),
        ])
        .unwrap();
        // Later run: same layers, different type tag on the first relu and a new relu index.
        let second = SpanTree::build(vec![
            relu(11, 1, "Relu", 12),
            conv(12, 2, 52),
            relu(13, 3, "Activation", 22),
            relu(14, 4, "Activation", 5),
        ])
        .unwrap();
        let table = LayerTable::from_trees([&first, &second]);

        let keys: Vec<(&str, i64)> = table.iter().map(|l| (l.name.as_str(), l.index)).collect();
        assert_eq!(keys, [("relu", 1), ("conv1", 2), ("relu", 3), ("relu", 4)]);

        for span in first.spans().iter().chain(second.spans()) {
            let direct = LayerInformation::from_span(span).unwrap();
            let via_table = LayerInformation::from_template(
                table.get(&span.operation_name, direct.index).unwrap(),
                span,
            );
            assert_eq!(via_table.index, direct.index);
            assert_eq!(via_table.name, direct.name);
            assert_eq!(via_table.durations, direct.durations);
        }

        // Metadata is the first-seen span's.
        let template = table.get("relu", 1).unwrap();
        let later = LayerInformation::from_template(template, &second.spans()[0]);
        assert_eq!(later.layer_type, "Activation");
        assert_eq!(later.durations, [12]);
    }
}
