// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for `libdd-inference-trace`.

use thiserror::Error;

/// Errors raised while reading spans and reconstructing runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TraceError {
    /// A required span or tag is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Parent or reference data is cyclic or otherwise inconsistent.
    #[error("malformed trace: {0}")]
    MalformedTrace(String),

    /// A tag value exists but cannot be converted to the requested type.
    #[error("tag `{key}` cannot be read as {expected}")]
    TypeCoercion {
        /// The tag key.
        key: String,
        /// Name of the requested type.
        expected: &'static str,
    },

    /// Nothing to aggregate: no spans, or no run roots among them.
    #[error("empty input: {0}")]
    EmptyInput(String),
}
