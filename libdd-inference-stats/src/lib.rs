// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

//! Robust statistics for repeated inference measurements.
//!
//! A single generic implementation serves floating point metrics (flops, bytes, occupancy),
//! integer microsecond durations and [`std::time::Duration`] alike, through the [`Sample`]
//! trait.
//!
//! ```
//! use libdd_inference_stats::{percentile, trimmed_mean};
//!
//! let latencies = [10i64, 1, 2, 3, 100];
//! assert_eq!(trimmed_mean(&latencies, 0.2), 5);
//! assert_eq!(percentile(&latencies, 100.0), 100);
//! ```

pub mod robust;
pub mod sample;

pub use robust::{
    max, mean, median, min, percentile, sum, trimmed_mean, SampleSummary,
    DEFAULT_TRIMMED_MEAN_FRACTION,
};
pub use sample::Sample;
