// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The recorded span model.

use crate::error::TraceError;
use crate::tag::{KeyValue, TagValue};
use crate::trace_level::TraceLevel;
use serde::{Deserialize, Serialize};

/// Tag carrying the instrumentation level of a span.
pub const TRACE_LEVEL_TAG: &str = "trace_level";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefType {
    ChildOf,
    FollowsFrom,
}

/// Causal reference from a span to another span, possibly in another trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub ref_type: RefType,
    #[serde(default)]
    pub trace_id: String,
    pub span_id: u64,
}

/// Timestamped structured record attached to a span; carries performance counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Log {
    /// Microseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub fields: Vec<KeyValue>,
}

impl Log {
    pub fn field(&self, key: &str) -> Option<&TagValue> {
        self.fields.iter().find(|kv| kv.key == key).map(|kv| &kv.value)
    }
}

/// One recorded unit of execution activity.
///
/// `parent_id` is `0` for spans without an explicit parent. The execution tree is rebuilt from
/// these links (see [`crate::tree::SpanTree`]); spans never own each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Span {
    #[serde(default)]
    pub trace_id: String,
    pub span_id: u64,
    #[serde(default)]
    pub parent_id: u64,
    #[serde(default)]
    pub references: Vec<Reference>,
    pub operation_name: String,
    /// Microseconds since the Unix epoch.
    pub start_time: i64,
    /// Microseconds.
    pub duration: i64,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
    #[serde(default)]
    pub logs: Vec<Log>,
}

impl Span {
    pub fn end_time(&self) -> i64 {
        self.start_time.saturating_add(self.duration)
    }

    /// First tag with `key`, matched case-sensitively.
    pub fn tag(&self, key: &str) -> Option<&TagValue> {
        self.tags.iter().find(|kv| kv.key == key).map(|kv| &kv.value)
    }

    /// True when the tag exists and is not the empty string.
    pub fn has_tag(&self, key: &str) -> bool {
        self.tag(key).is_some_and(|v| !v.is_empty())
    }

    fn required_tag(&self, key: &str) -> Result<&TagValue, TraceError> {
        self.tag(key).ok_or_else(|| {
            TraceError::NotFound(format!(
                "tag `{key}` on span {} ({})",
                self.span_id, self.operation_name
            ))
        })
    }

    pub fn tag_as_string(&self, key: &str) -> Result<String, TraceError> {
        Ok(self.required_tag(key)?.to_string())
    }

    pub fn tag_as_i64(&self, key: &str) -> Result<i64, TraceError> {
        self.required_tag(key)?
            .as_i64()
            .ok_or_else(|| TraceError::TypeCoercion {
                key: key.to_owned(),
                expected: "i64",
            })
    }

    pub fn tag_as_int(&self, key: &str) -> Result<i32, TraceError> {
        let value = self.tag_as_i64(key)?;
        i32::try_from(value).map_err(|_| TraceError::TypeCoercion {
            key: key.to_owned(),
            expected: "i32",
        })
    }

    pub fn tag_as_f64(&self, key: &str) -> Result<f64, TraceError> {
        self.required_tag(key)?
            .as_f64()
            .ok_or_else(|| TraceError::TypeCoercion {
                key: key.to_owned(),
                expected: "f64",
            })
    }

    /// Level from the `trace_level` tag; `None` when absent or unrecognized.
    pub fn trace_level(&self) -> Option<TraceLevel> {
        self.tag(TRACE_LEVEL_TAG)?.as_str()?.parse().ok()
    }

    /// Values of `key` across all log records, in log order.
    pub fn log_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a TagValue> + 'a {
        self.logs.iter().filter_map(move |log| log.field(key))
    }
}

/// Spans recorded under one trace id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub trace_id: String,
    #[serde(default)]
    pub spans: Vec<Span>,
}
