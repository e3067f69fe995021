// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Configuration of the summarization pipeline.

use crate::error::SummaryError;
use libdd_inference_stats::DEFAULT_TRIMMED_MEAN_FRACTION;
use libdd_inference_trace::TraceLevel;
use serde::{Deserialize, Serialize};
use std::env;

pub const ENV_TRIM_FRACTION: &str = "DD_INFERENCE_TRIM_FRACTION";
pub const ENV_ROOT_OPERATION: &str = "DD_INFERENCE_ROOT_OPERATION";
pub const ENV_ROOT_TRACE_LEVEL: &str = "DD_INFERENCE_ROOT_TRACE_LEVEL";
pub const ENV_MERGE_STRICT: &str = "DD_INFERENCE_MERGE_STRICT";
pub const ENV_PARALLEL: &str = "DD_INFERENCE_PARALLEL";

const DEFAULT_ROOT_OPERATION: &str = "c_predict";

/// How the cross-run merge treats layers and kernels absent from the first run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrictness {
    /// Drop them silently.
    #[default]
    Lenient,
    /// Fail with [`SummaryError::RunMismatch`].
    Strict,
}

/// Settings shared by every stage of [`crate::EvaluationSummarizer`].
///
/// Constructed via [`SummaryConfig::builder`], [`SummaryConfig::from_env`] or
/// [`Default::default`].
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryConfig {
    trimmed_mean_fraction: f64,
    root_operation_name: String,
    root_trace_level: TraceLevel,
    merge_strictness: MergeStrictness,
    parallel: bool,
    ideal_arithmetic_intensity: Option<f64>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            trimmed_mean_fraction: DEFAULT_TRIMMED_MEAN_FRACTION,
            root_operation_name: DEFAULT_ROOT_OPERATION.to_owned(),
            root_trace_level: TraceLevel::Model,
            merge_strictness: MergeStrictness::Lenient,
            parallel: false,
            ideal_arithmetic_intensity: None,
        }
    }
}

impl SummaryConfig {
    pub fn builder() -> SummaryConfigBuilder {
        SummaryConfigBuilder::new()
    }

    /// Defaults overridden by the `DD_INFERENCE_*` environment variables.
    pub fn from_env() -> Result<Self, SummaryError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`SummaryConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SummaryError> {
        let mut builder = Self::builder();
        if let Some(raw) = lookup(ENV_TRIM_FRACTION) {
            let fraction = raw.trim().parse::<f64>().map_err(|_| {
                SummaryError::InvalidConfig(format!("{ENV_TRIM_FRACTION}={raw} is not a number"))
            })?;
            builder = builder.trimmed_mean_fraction(fraction);
        }
        if let Some(name) = lookup(ENV_ROOT_OPERATION) {
            builder = builder.root_operation_name(name.trim());
        }
        if let Some(raw) = lookup(ENV_ROOT_TRACE_LEVEL) {
            let level = raw
                .parse::<TraceLevel>()
                .map_err(|e| SummaryError::InvalidConfig(format!("{ENV_ROOT_TRACE_LEVEL}: {e}")))?;
            builder = builder.root_trace_level(level);
        }
        if let Some(raw) = lookup(ENV_MERGE_STRICT) {
            if parse_flag(ENV_MERGE_STRICT, &raw)? {
                builder = builder.merge_strictness(MergeStrictness::Strict);
            }
        }
        if let Some(raw) = lookup(ENV_PARALLEL) {
            builder = builder.parallel(parse_flag(ENV_PARALLEL, &raw)?);
        }
        builder.build()
    }

    /// Fraction trimmed from each end before averaging. `0.0` selects the statistics default.
    pub fn trimmed_mean_fraction(&self) -> f64 {
        self.trimmed_mean_fraction
    }

    /// Operation name of the span that roots one run.
    pub fn root_operation_name(&self) -> &str {
        &self.root_operation_name
    }

    pub fn root_trace_level(&self) -> TraceLevel {
        self.root_trace_level
    }

    pub fn merge_strictness(&self) -> MergeStrictness {
        self.merge_strictness
    }

    /// Whether runs are reconstructed and aggregated on the rayon pool.
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Machine balance point; kernels below it are flagged memory bound.
    pub fn ideal_arithmetic_intensity(&self) -> Option<f64> {
        self.ideal_arithmetic_intensity
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, SummaryError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(SummaryError::InvalidConfig(format!(
            "{key}={raw} is not a boolean"
        ))),
    }
}

/// Builder for [`SummaryConfig`]. Unset fields keep their defaults.
#[derive(Debug, Default)]
pub struct SummaryConfigBuilder {
    trimmed_mean_fraction: Option<f64>,
    root_operation_name: Option<String>,
    root_trace_level: Option<TraceLevel>,
    merge_strictness: MergeStrictness,
    parallel: bool,
    ideal_arithmetic_intensity: Option<f64>,
}

impl SummaryConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Must lie in `[0, 0.5]`.
    pub fn trimmed_mean_fraction(mut self, fraction: f64) -> Self {
        self.trimmed_mean_fraction = Some(fraction);
        self
    }

    pub fn root_operation_name(mut self, name: impl Into<String>) -> Self {
        self.root_operation_name = Some(name.into());
        self
    }

    pub fn root_trace_level(mut self, level: TraceLevel) -> Self {
        self.root_trace_level = Some(level);
        self
    }

    /// Roots runs at the application level `predict` span instead of the model level
    /// `c_predict` span.
    pub fn application_root(self) -> Self {
        self.root_operation_name("predict")
            .root_trace_level(TraceLevel::Application)
    }

    pub fn merge_strictness(mut self, strictness: MergeStrictness) -> Self {
        self.merge_strictness = strictness;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn ideal_arithmetic_intensity(mut self, intensity: f64) -> Self {
        self.ideal_arithmetic_intensity = Some(intensity);
        self
    }

    /// Returns [`SummaryError::InvalidConfig`] for a fraction outside `[0, 0.5]`, an empty root
    /// operation name or a non-positive ideal intensity.
    pub fn build(self) -> Result<SummaryConfig, SummaryError> {
        let defaults = SummaryConfig::default();

        let trimmed_mean_fraction = self
            .trimmed_mean_fraction
            .unwrap_or(defaults.trimmed_mean_fraction);
        if !(0.0..=0.5).contains(&trimmed_mean_fraction) {
            return Err(SummaryError::InvalidConfig(format!(
                "trimmed mean fraction {trimmed_mean_fraction} is outside [0, 0.5]"
            )));
        }

        let root_operation_name = self
            .root_operation_name
            .unwrap_or(defaults.root_operation_name);
        if root_operation_name.is_empty() {
            return Err(SummaryError::InvalidConfig(
                "root operation name is empty".to_owned(),
            ));
        }

        if let Some(intensity) = self.ideal_arithmetic_intensity {
            if !(intensity.is_finite() && intensity > 0.0) {
                return Err(SummaryError::InvalidConfig(format!(
                    "ideal arithmetic intensity {intensity} must be positive"
                )));
            }
        }

        Ok(SummaryConfig {
            trimmed_mean_fraction,
            root_operation_name,
            root_trace_level: self.root_trace_level.unwrap_or(defaults.root_trace_level),
            merge_strictness: self.merge_strictness,
            parallel: self.parallel,
            ideal_arithmetic_intensity: self.ideal_arithmetic_intensity,
        })
    }
}
