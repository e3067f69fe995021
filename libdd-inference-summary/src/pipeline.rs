// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! From an evaluation record to its merged layer and kernel measurements.

use crate::aggregator::{LayerKernels, RunAggregator};
use crate::collection::{Collection, Filter};
use crate::config::SummaryConfig;
use crate::error::SummaryError;
use crate::layer::LayerTable;
use crate::merge::merge_runs;
use crate::model::{Evaluation, Performance, SummaryBase};
use libdd_inference_trace::{group_spans, Diagnostic, Observer, SpanGroup, SpanTree, TraceError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Every run of one evaluation, pooled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedEvaluation {
    pub evaluation_id: String,
    pub base: SummaryBase,
    /// Duration of the root span of every pooled run, in run order. Microseconds.
    pub run_durations: Vec<i64>,
    pub layers: Vec<LayerKernels>,
}

impl MergedEvaluation {
    pub fn run_count(&self) -> usize {
        self.run_durations.len()
    }
}

/// Fields an evaluation search can constrain. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationQuery {
    pub model_name: Option<String>,
    pub model_version: Option<String>,
    pub framework_name: Option<String>,
    pub framework_version: Option<String>,
    pub machine_architecture: Option<String>,
    pub hostname: Option<String>,
    pub batch_size: Option<u32>,
}

impl EvaluationQuery {
    pub fn to_filter(&self) -> Filter {
        let mut filter = Filter::new();
        let strings = [
            ("model.name", &self.model_name),
            ("model.version", &self.model_version),
            ("framework.name", &self.framework_name),
            ("framework.version", &self.framework_version),
            ("machinearchitecture", &self.machine_architecture),
            ("hostname", &self.hostname),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                filter.insert(key, value.as_str());
            }
        }
        if let Some(batch_size) = self.batch_size {
            filter.insert("batch_size", i64::from(batch_size));
        }
        filter
    }
}

/// Evaluations matching `query`, in collection order.
///
/// # Errors
///
/// [`SummaryError::EmptyInput`] when nothing matches.
pub fn find_evaluations(
    collection: &dyn Collection<Evaluation>,
    query: &EvaluationQuery,
) -> Result<Vec<Evaluation>, SummaryError> {
    let evaluations = collection.find(&query.to_filter())?;
    if evaluations.is_empty() {
        return Err(SummaryError::EmptyInput(format!(
            "no evaluation matches {query:?}"
        )));
    }
    Ok(evaluations)
}

/// Summarizes evaluations against a store of performance records.
pub struct EvaluationSummarizer<'a> {
    performances: &'a dyn Collection<Performance>,
    config: &'a SummaryConfig,
    observer: &'a dyn Observer,
}

impl<'a> EvaluationSummarizer<'a> {
    pub fn new(
        performances: &'a dyn Collection<Performance>,
        config: &'a SummaryConfig,
        observer: &'a dyn Observer,
    ) -> Self {
        Self {
            performances,
            config,
            observer,
        }
    }

    pub fn config(&self) -> &SummaryConfig {
        self.config
    }

    /// Reconstructs, aggregates and merges every run of `evaluation`.
    ///
    /// # Errors
    ///
    /// * [`SummaryError::NotFound`] when the performance record is missing.
    /// * [`SummaryError::EmptyInput`] when it holds no spans or no run survives.
    /// * [`SummaryError::Trace`] when no run root is found.
    /// * [`SummaryError::RunMismatch`] from a strict merge.
    pub fn summarize(&self, evaluation: &Evaluation) -> Result<MergedEvaluation, SummaryError> {
        let performance = self
            .performances
            .find(&Filter::by_id(evaluation.performance_id.as_str()))?
            .into_iter()
            .next()
            .ok_or_else(|| {
                SummaryError::NotFound(format!(
                    "performance {} of evaluation {}",
                    evaluation.performance_id, evaluation.id
                ))
            })?;

        let spans = performance.into_spans();
        if spans.is_empty() {
            return Err(SummaryError::EmptyInput(format!(
                "performance {} has no spans",
                evaluation.performance_id
            )));
        }

        let groups = group_spans(
            spans,
            self.config.root_operation_name(),
            self.config.root_trace_level(),
            self.observer,
        )?;
        debug!(
            evaluation_id = evaluation.id.as_str(),
            runs = groups.len(),
            "Grouped spans into runs"
        );

        let runs = self.build_trees(groups);
        if runs.is_empty() {
            return Err(SummaryError::EmptyInput(format!(
                "no run of evaluation {} could be reconstructed",
                evaluation.id
            )));
        }

        let table = LayerTable::from_trees(runs.iter().map(|(_, tree)| tree));
        let aggregator = RunAggregator::new(self.config, self.observer).with_layer_table(&table);
        let per_run: Vec<Vec<LayerKernels>> = if self.config.parallel() {
            runs.par_iter()
                .map(|(_, tree)| aggregator.aggregate(tree))
                .collect()
        } else {
            runs.iter()
                .map(|(_, tree)| aggregator.aggregate(tree))
                .collect()
        };

        let layers = merge_runs(per_run, self.config)?;
        Ok(MergedEvaluation {
            evaluation_id: evaluation.id.clone(),
            base: SummaryBase::from(evaluation),
            run_durations: runs.iter().map(|(duration, _)| *duration).collect(),
            layers,
        })
    }

    /// Trees of the runs that could be reconstructed, with their root durations, in run order.
    fn build_trees(&self, groups: Vec<SpanGroup>) -> Vec<(i64, SpanTree)> {
        let build = |group: SpanGroup| -> Result<(i64, SpanTree), TraceError> {
            let duration = group.root().duration;
            Ok((duration, SpanTree::build(group.into_spans())?))
        };
        let results: Vec<Result<(i64, SpanTree), TraceError>> = if self.config.parallel() {
            groups.into_par_iter().map(build).collect()
        } else {
            groups.into_iter().map(build).collect()
        };

        results
            .into_iter()
            .enumerate()
            .filter_map(|(run, result)| match result {
                Ok(tree) => Some(tree),
                Err(error) => {
                    self.observer
                        .observe(Diagnostic::RunExcluded { run, error: &error });
                    None
                }
            })
            .collect()
    }

    /// Summarizes every evaluation, skipping and reporting the ones that fail.
    ///
    /// # Errors
    ///
    /// [`SummaryError::EmptyInput`] for an empty list. Failures of single evaluations are only
    /// reported to the observer.
    pub fn summarize_all(
        &self,
        evaluations: &[Evaluation],
    ) -> Result<Vec<MergedEvaluation>, SummaryError> {
        if evaluations.is_empty() {
            return Err(SummaryError::EmptyInput(
                "no evaluation to summarize".to_owned(),
            ));
        }
        Ok(evaluations
            .iter()
            .filter_map(|evaluation| match self.summarize(evaluation) {
                Ok(merged) => Some(merged),
                Err(error) => {
                    self.observer.observe(Diagnostic::EvaluationSkipped {
                        evaluation_id: &evaluation.id,
                        error: &error,
                    });
                    None
                }
            })
            .collect())
    }
}
