// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Non-fatal conditions met while aggregating, reported to an injected [`Observer`].
//!
//! Components never log through global state: they receive an observer from their caller.
//! [`TracingObserver`] forwards everything to `tracing` events.

use std::error::Error;
use std::fmt;
use tracing::{debug, error, warn};

/// A condition that was tolerated, with enough context to log it.
#[derive(Debug, Clone, Copy)]
pub enum Diagnostic<'a> {
    /// The span's parent chain never reaches a run root; the span was dropped.
    OrphanSpan {
        span_id: u64,
        operation_name: &'a str,
    },
    /// A layer span could not be turned into a layer; the layer was skipped.
    SkippedLayer {
        span_id: u64,
        error: &'a (dyn Error + Send + Sync),
    },
    /// A kernel execution span had no launch with the same correlation id.
    UnmatchedKernel {
        layer_index: i64,
        span_id: u64,
        correlation_id: Option<i64>,
    },
    /// One run could not be aggregated and will not be pooled.
    RunExcluded {
        run: usize,
        error: &'a (dyn Error + Send + Sync),
    },
    /// One evaluation could not be summarized; its siblings continue.
    EvaluationSkipped {
        evaluation_id: &'a str,
        error: &'a (dyn Error + Send + Sync),
    },
}

/// Discriminant of a [`Diagnostic`], handy for assertions and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    OrphanSpan,
    SkippedLayer,
    UnmatchedKernel,
    RunExcluded,
    EvaluationSkipped,
}

impl Diagnostic<'_> {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::OrphanSpan { .. } => DiagnosticKind::OrphanSpan,
            Diagnostic::SkippedLayer { .. } => DiagnosticKind::SkippedLayer,
            Diagnostic::UnmatchedKernel { .. } => DiagnosticKind::UnmatchedKernel,
            Diagnostic::RunExcluded { .. } => DiagnosticKind::RunExcluded,
            Diagnostic::EvaluationSkipped { .. } => DiagnosticKind::EvaluationSkipped,
        }
    }
}

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::OrphanSpan {
                span_id,
                operation_name,
            } => write!(
                f,
                "span {span_id} ({operation_name}) does not belong to any run"
            ),
            Diagnostic::SkippedLayer { span_id, error } => {
                write!(f, "layer span {span_id} skipped: {error}")
            }
            Diagnostic::UnmatchedKernel {
                layer_index,
                span_id,
                correlation_id,
            } => match correlation_id {
                Some(id) => write!(
                    f,
                    "gpu kernel span {span_id} in layer {layer_index} has no launch with correlation id {id}"
                ),
                None => write!(
                    f,
                    "gpu kernel span {span_id} in layer {layer_index} has no correlation id"
                ),
            },
            Diagnostic::RunExcluded { run, error } => {
                write!(f, "run {run} excluded from merge: {error}")
            }
            Diagnostic::EvaluationSkipped {
                evaluation_id,
                error,
            } => write!(f, "evaluation {evaluation_id} skipped: {error}"),
        }
    }
}

/// Receives diagnostics. Shared across worker threads when runs are aggregated in parallel.
pub trait Observer: Send + Sync {
    fn observe(&self, diagnostic: Diagnostic<'_>);
}

/// Emits every diagnostic as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn observe(&self, diagnostic: Diagnostic<'_>) {
        match diagnostic {
            Diagnostic::OrphanSpan {
                span_id,
                operation_name,
            } => debug!(span_id, operation_name, "Dropping span outside of any run"),
            Diagnostic::SkippedLayer { span_id, error } => {
                warn!(span_id, %error, "Skipping layer span")
            }
            Diagnostic::UnmatchedKernel {
                layer_index,
                span_id,
                correlation_id,
            } => warn!(
                layer_index,
                span_id,
                correlation_id = ?correlation_id,
                "Dropping gpu kernel without matching launch"
            ),
            Diagnostic::RunExcluded { run, error } => {
                warn!(run, %error, "Excluding run from merge")
            }
            Diagnostic::EvaluationSkipped {
                evaluation_id,
                error,
            } => error!(evaluation_id, %error, "Skipping evaluation"),
        }
    }
}

/// Discards every diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn observe(&self, _diagnostic: Diagnostic<'_>) {}
}
