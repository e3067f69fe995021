// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Lookup helpers over span lists. Filters are stable: they preserve input order.

use crate::error::TraceError;
use crate::span::{RefType, Span};
use crate::trace_level::TraceLevel;

/// First span named `name`, in list order.
pub fn find_by_operation_name<'a>(spans: &'a [Span], name: &str) -> Result<&'a Span, TraceError> {
    spans
        .iter()
        .find(|s| s.operation_name == name)
        .ok_or_else(|| TraceError::NotFound(format!("span with operation name `{name}`")))
}

pub fn filter_by_operation_name<'a>(spans: &'a [Span], name: &str) -> Vec<&'a Span> {
    spans.iter().filter(|s| s.operation_name == name).collect()
}

pub fn filter_by_operation_name_and_trace_level<'a>(
    spans: &'a [Span],
    name: &str,
    level: TraceLevel,
) -> Vec<&'a Span> {
    spans
        .iter()
        .filter(|s| s.operation_name == name && s.trace_level() == Some(level))
        .collect()
}

pub fn filter_by_trace_level(spans: &[Span], level: TraceLevel) -> Vec<&Span> {
    spans
        .iter()
        .filter(|s| s.trace_level() == Some(level))
        .collect()
}

/// The parent span id: the explicit `parent_id` when set, otherwise the first `CHILD_OF`
/// reference, otherwise `None` (the span is a root).
pub fn parent_of(span: &Span) -> Option<u64> {
    if span.parent_id != 0 {
        return Some(span.parent_id);
    }
    span.references
        .iter()
        .find(|r| r.ref_type == RefType::ChildOf && r.span_id != 0)
        .map(|r| r.span_id)
}
