// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

//! Summaries of inference evaluations.
//!
//! An [`Evaluation`] points at a [`Performance`] record holding the spans of many repeated
//! predictions. [`EvaluationSummarizer`] splits those spans into runs, rebuilds each run's
//! containment tree, extracts layers and GPU kernels per run ([`aggregator`]) and pools the runs
//! ([`merge`]). The [`summary`] module turns the pooled result into report tables.
//!
//! Storage, output and charting are abstracted by [`Collection`], [`Writer`] and [`Plotter`].
//! Diagnostics go to the injected [`libdd_inference_trace::Observer`].

pub mod aggregator;
pub mod collection;
pub mod config;
pub mod error;
pub mod kernel;
pub mod layer;
pub mod merge;
pub mod model;
pub mod pipeline;
pub mod plot;
pub mod summary;
pub mod writer;

pub use aggregator::{LayerKernels, RunAggregator};
pub use collection::{Collection, Filter, MemoryCollection, Record};
pub use config::{MergeStrictness, SummaryConfig, SummaryConfigBuilder};
pub use error::SummaryError;
pub use kernel::KernelInformation;
pub use layer::{LayerInformation, LayerTable};
pub use merge::merge_runs;
pub use model::{Evaluation, ModelAccuracy, NameVersion, Performance, SummaryBase};
pub use pipeline::{find_evaluations, EvaluationQuery, EvaluationSummarizer, MergedEvaluation};
pub use plot::{Plotter, Series};
pub use writer::{write_table, TableBuffer, Tabular, Writer};
