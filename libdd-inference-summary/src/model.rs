// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Stored records: the evaluation under test, its trace payload and its accuracy.

use crate::collection::Record;
use chrono::{DateTime, SecondsFormat, Utc};
use libdd_inference_trace::{Span, TagValue, Trace, TraceLevel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameVersion {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

impl NameVersion {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// One configuration under test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(rename = "_id")]
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub model: NameVersion,
    pub framework: NameVersion,
    #[serde(rename = "machinearchitecture")]
    pub machine_architecture: String,
    #[serde(default)]
    pub hostname: String,
    pub batch_size: u32,
    #[serde(default)]
    pub use_gpu: bool,
    #[serde(default)]
    pub trace_level: Option<TraceLevel>,
    pub performance_id: String,
    #[serde(default)]
    pub model_accuracy_id: String,
}

impl Record for Evaluation {
    fn field(&self, key: &str) -> Option<TagValue> {
        let value: TagValue = match key {
            "_id" => self.id.as_str().into(),
            "model.name" => self.model.name.as_str().into(),
            "model.version" => self.model.version.as_str().into(),
            "framework.name" => self.framework.name.as_str().into(),
            "framework.version" => self.framework.version.as_str().into(),
            "machinearchitecture" => self.machine_architecture.as_str().into(),
            "hostname" => self.hostname.as_str().into(),
            "batch_size" => i64::from(self.batch_size).into(),
            "use_gpu" => self.use_gpu.into(),
            "trace_level" => self.trace_level?.as_str().into(),
            "performance_id" => self.performance_id.as_str().into(),
            "model_accuracy_id" => self.model_accuracy_id.as_str().into(),
            _ => return None,
        };
        Some(value)
    }
}

/// Trace payload of one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub trace_level: Option<TraceLevel>,
    #[serde(default)]
    pub traces: Vec<Trace>,
}

impl Performance {
    /// Every span of every trace, in payload order.
    pub fn into_spans(self) -> Vec<Span> {
        self.traces.into_iter().flat_map(|t| t.spans).collect()
    }

    pub fn span_count(&self) -> usize {
        self.traces.iter().map(|t| t.spans.len()).sum()
    }
}

impl Record for Performance {
    fn field(&self, key: &str) -> Option<TagValue> {
        match key {
            "_id" => Some(self.id.as_str().into()),
            "trace_level" => Some(self.trace_level?.as_str().into()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelAccuracy {
    #[serde(rename = "_id")]
    pub id: String,
    pub top1: f64,
    pub top5: f64,
}

impl Record for ModelAccuracy {
    fn field(&self, key: &str) -> Option<TagValue> {
        match key {
            "_id" => Some(self.id.as_str().into()),
            _ => None,
        }
    }
}

/// Identifying columns repeated on every summary record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryBase {
    pub model_name: String,
    pub model_version: String,
    pub framework_name: String,
    pub framework_version: String,
    pub machine_architecture: String,
    pub hostname: String,
    pub batch_size: u32,
    pub use_gpu: bool,
    pub created_at: DateTime<Utc>,
}

impl SummaryBase {
    pub const HEADER: [&'static str; 9] = [
        "model_name",
        "model_version",
        "framework_name",
        "framework_version",
        "machine_architecture",
        "hostname",
        "batch_size",
        "use_gpu",
        "created_at",
    ];

    pub fn header() -> Vec<String> {
        Self::HEADER.iter().map(|h| h.to_string()).collect()
    }

    pub fn row(&self) -> Vec<String> {
        vec![
            self.model_name.clone(),
            self.model_version.clone(),
            self.framework_name.clone(),
            self.framework_version.clone(),
            self.machine_architecture.clone(),
            self.hostname.clone(),
            self.batch_size.to_string(),
            self.use_gpu.to_string(),
            self.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        ]
    }

    /// Model, framework and machine, without the batch size.
    pub fn configuration_key(&self) -> (String, String, String, String, String) {
        (
            self.model_name.clone(),
            self.model_version.clone(),
            self.framework_name.clone(),
            self.framework_version.clone(),
            self.machine_architecture.clone(),
        )
    }
}

impl From<&Evaluation> for SummaryBase {
    fn from(evaluation: &Evaluation) -> Self {
        Self {
            model_name: evaluation.model.name.clone(),
            model_version: evaluation.model.version.clone(),
            framework_name: evaluation.framework.name.clone(),
            framework_version: evaluation.framework.version.clone(),
            machine_architecture: evaluation.machine_architecture.clone(),
            hostname: evaluation.hostname.clone(),
            batch_size: evaluation.batch_size,
            use_gpu: evaluation.use_gpu,
            created_at: evaluation.created_at,
        }
    }
}
