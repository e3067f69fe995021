// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Builders and recorders shared by the unit and integration tests of the inference crates.

use crate::observer::{Diagnostic, DiagnosticKind, Observer};
use crate::span::{Log, RefType, Reference, Span, TRACE_LEVEL_TAG};
use crate::tag::{KeyValue, TagValue};
use crate::trace_level::TraceLevel;
use std::sync::Mutex;

/// Fluent constructor for [`Span`] fixtures.
#[derive(Debug, Clone)]
pub struct SpanBuilder {
    span: Span,
}

impl SpanBuilder {
    pub fn new(span_id: u64, operation_name: impl Into<String>) -> Self {
        Self {
            span: Span {
                span_id,
                operation_name: operation_name.into(),
                ..Default::default()
            },
        }
    }

    pub fn parent(mut self, parent_id: u64) -> Self {
        self.span.parent_id = parent_id;
        self
    }

    pub fn child_of(mut self, span_id: u64) -> Self {
        self.span.references.push(Reference {
            ref_type: RefType::ChildOf,
            trace_id: self.span.trace_id.clone(),
            span_id,
        });
        self
    }

    pub fn start(mut self, start_time: i64) -> Self {
        self.span.start_time = start_time;
        self
    }

    pub fn duration(mut self, duration: i64) -> Self {
        self.span.duration = duration;
        self
    }

    pub fn level(self, level: TraceLevel) -> Self {
        self.tag(TRACE_LEVEL_TAG, level.as_str())
    }

    pub fn tag(mut self, key: &str, value: impl Into<TagValue>) -> Self {
        self.span.tags.push(KeyValue::new(key, value));
        self
    }

    pub fn log(mut self, timestamp: i64, fields: Vec<(&str, TagValue)>) -> Self {
        self.span.logs.push(Log {
            timestamp,
            fields: fields
                .into_iter()
                .map(|(k, v)| KeyValue::new(k, v))
                .collect(),
        });
        self
    }

    pub fn build(self) -> Span {
        self.span
    }
}

/// Observer that keeps every diagnostic as `(kind, rendered message)`.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    records: Mutex<Vec<(DiagnosticKind, String)>>,
}

impl RecordingObserver {
    pub fn records(&self) -> Vec<(DiagnosticKind, String)> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.records().iter().filter(|(k, _)| *k == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

impl Observer for RecordingObserver {
    fn observe(&self, diagnostic: Diagnostic<'_>) {
        if let Ok(mut records) = self.records.lock() {
            records.push((diagnostic.kind(), diagnostic.to_string()));
        }
    }
}
