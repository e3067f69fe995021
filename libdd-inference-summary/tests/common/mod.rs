// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use libdd_inference_summary::{Evaluation, NameVersion, Performance};
use libdd_inference_trace::test_utils::SpanBuilder;
use libdd_inference_trace::{Span, TagValue, Trace, TraceLevel};

pub fn evaluation(id: &str, batch_size: u32, performance_id: &str) -> Evaluation {
    Evaluation {
        id: id.to_owned(),
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        model: NameVersion::new("ResNet50", "1.0"),
        framework: NameVersion::new("MXNet", "1.4"),
        machine_architecture: "amd64".to_owned(),
        hostname: "gpu-07".to_owned(),
        batch_size,
        use_gpu: true,
        trace_level: Some(TraceLevel::SystemLibrary),
        performance_id: performance_id.to_owned(),
        model_accuracy_id: format!("a-{id}"),
    }
}

fn layer(
    id: u64,
    parent: u64,
    name: &str,
    index: i64,
    op_type: &str,
    start: i64,
    duration: i64,
) -> Span {
    SpanBuilder::new(id, name)
        .parent(parent)
        .level(TraceLevel::Framework)
        .tag("layer_sequence_index", index)
        .tag("op_type", op_type)
        .tag(
            "allocation_description",
            r#"{"allocator_name": "GPU_0_bfc", "allocated_bytes": 1024, "peak_bytes": 2048}"#,
        )
        .start(start)
        .duration(duration)
        .build()
}

fn launch(id: u64, parent: u64, correlation_id: i64, kernel_name: &str, start: i64) -> Span {
    SpanBuilder::new(id, "cuda_launch")
        .parent(parent)
        .level(TraceLevel::SystemLibrary)
        .tag("correlation_id", correlation_id)
        .tag("kernel_name", kernel_name)
        .start(start)
        .duration(1)
        .build()
}

fn execution(id: u64, parent: u64, correlation_id: i64, start: i64, duration: i64) -> Span {
    SpanBuilder::new(id, "gpu_kernel")
        .parent(parent)
        .level(TraceLevel::SystemLibrary)
        .tag("correlation_id", correlation_id)
        .start(start)
        .duration(duration)
        .log(
            start,
            vec![
                ("flop_count_sp", TagValue::Float(1.0e6)),
                ("dram_read_bytes", TagValue::Float(2.0e5)),
                ("dram_write_bytes", TagValue::Float(2.0e5)),
                ("achieved_occupancy", TagValue::Float(0.5)),
            ],
        )
        .build()
}

/// One prediction: `conv1` (index 0, one `sgemm` kernel with correlation id 42) and `relu`
/// (index 1, one `relu_kernel` with correlation id 43). Every duration is multiplied by `scale`.
pub fn run(base_id: u64, scale: i64) -> Vec<Span> {
    let start = base_id as i64 * 10_000;
    vec![
        SpanBuilder::new(base_id, "c_predict")
            .level(TraceLevel::Model)
            .start(start)
            .duration(1000 * scale)
            .build(),
        layer(base_id + 1, base_id, "conv1", 0, "Convolution", start, 600 * scale),
        launch(base_id + 2, base_id + 1, 42, "sgemm", start),
        execution(base_id + 3, base_id + 2, 42, start + 1, 400 * scale),
        layer(base_id + 4, base_id, "relu", 1, "Activation", start + 600 * scale, 100 * scale),
        launch(base_id + 5, base_id + 4, 43, "relu_kernel", start + 600 * scale),
        execution(base_id + 6, base_id + 5, 43, start + 600 * scale + 1, 50 * scale),
    ]
}

/// A performance record with one run per scale, each in its own trace.
pub fn performance(id: &str, scales: &[i64]) -> Performance {
    Performance {
        id: id.to_owned(),
        trace_level: Some(TraceLevel::SystemLibrary),
        traces: scales
            .iter()
            .enumerate()
            .map(|(i, &scale)| Trace {
                trace_id: format!("{id}-{i}"),
                spans: run(100 * (i as u64 + 1), scale),
            })
            .collect(),
    }
}
