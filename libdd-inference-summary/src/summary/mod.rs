// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Report records derived from [`crate::MergedEvaluation`]s.
//!
//! Every record implements [`crate::Tabular`] and `Serialize`; some also produce chart
//! [`crate::Series`].

pub mod accuracy;
pub mod kernel;
pub mod latency;
pub mod layer;

pub use accuracy::AccuracySummary;
pub use kernel::{KernelSummary, LayerKernelSummary};
pub use latency::{ModelLatencySummary, ThroughputLatencyCurve};
pub use layer::{LayerSummary, LayerTypeSummary};

use crate::model::SummaryBase;

/// Fixed precision for floating point cells.
pub(crate) fn format_f64(value: f64) -> String {
    format!("{value:.3}")
}

/// Base columns followed by `extra`.
pub(crate) fn header_with_base(extra: &[&str]) -> Vec<String> {
    let mut header = SummaryBase::header();
    header.extend(extra.iter().map(|h| h.to_string()));
    header
}

pub(crate) fn row_with_base(base: &SummaryBase, extra: Vec<String>) -> Vec<String> {
    let mut row = base.row();
    row.extend(extra);
    row
}
