// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

//! Span handling for inference traces.
//!
//! Traces are recorded by nested instrumentation at model, framework and system library
//! levels. This crate provides the typed span model, lookup helpers, the partitioning of a
//! flat span list into runs ([`grouping`]) and the per-run containment tree ([`tree`]) that
//! layer and kernel aggregation is built on.

pub mod error;
pub mod grouping;
pub mod observer;
pub mod selectors;
pub mod span;
pub mod tag;
pub mod trace_level;
pub mod tree;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::TraceError;
pub use grouping::{group_spans, SpanGroup};
pub use observer::{Diagnostic, DiagnosticKind, NoopObserver, Observer, TracingObserver};
pub use span::{Log, RefType, Reference, Span, Trace};
pub use tag::{KeyValue, TagValue};
pub use trace_level::TraceLevel;
pub use tree::SpanTree;
