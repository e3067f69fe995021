// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for `libdd-inference-summary`.

use libdd_inference_trace::TraceError;
use thiserror::Error;

/// Errors raised while summarizing evaluations.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Span or tag level failure.
    #[error(transparent)]
    Trace(#[from] TraceError),

    /// A referenced record does not exist in its collection.
    #[error("not found: {0}")]
    NotFound(String),

    /// Nothing to summarize.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Runs of one evaluation disagree on their layers or kernels.
    ///
    /// Only raised under [`crate::MergeStrictness::Strict`].
    #[error("run mismatch: {0}")]
    RunMismatch(String),

    /// The record store failed.
    #[error("collection error: {0}")]
    Collection(String),

    /// The table sink failed.
    #[error("writer error: {0}")]
    Writer(String),

    /// The summary configuration was invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A record or a JSON-encoded tag could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_display_is_transparent() {
        let err = SummaryError::from(TraceError::EmptyInput("no spans".to_owned()));
        assert_eq!(err.to_string(), "empty input: no spans");
        assert!(matches!(err, SummaryError::Trace(_)));
    }

    #[test]
    fn not_found_display() {
        let err = SummaryError::NotFound("performance p1".to_owned());
        assert_eq!(err.to_string(), "not found: performance p1");
    }

    #[test]
    fn empty_input_display() {
        let err = SummaryError::EmptyInput("no evaluations".to_owned());
        assert_eq!(err.to_string(), "empty input: no evaluations");
    }

    #[test]
    fn run_mismatch_display() {
        let err = SummaryError::RunMismatch("layer conv1 missing from run 0".to_owned());
        assert_eq!(
            err.to_string(),
            "run mismatch: layer conv1 missing from run 0"
        );
    }

    #[test]
    fn collection_display() {
        let err = SummaryError::Collection("closed".to_owned());
        assert_eq!(err.to_string(), "collection error: closed");
    }

    #[test]
    fn writer_display() {
        let err = SummaryError::Writer("row has 2 fields".to_owned());
        assert_eq!(err.to_string(), "writer error: row has 2 fields");
    }

    #[test]
    fn invalid_config_display() {
        let err = SummaryError::InvalidConfig("empty root operation".to_owned());
        assert_eq!(
            err.to_string(),
            "invalid configuration: empty root operation"
        );
    }

    #[test]
    fn serialization_display() {
        let err = serde_json::from_str::<u32>("x").unwrap_err();
        let err = SummaryError::from(err);
        assert!(err.to_string().starts_with("serialization error: "));
    }
}
