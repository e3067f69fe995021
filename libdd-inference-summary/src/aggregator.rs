// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Layer and kernel extraction for one run.

use crate::config::SummaryConfig;
use crate::kernel::{
    KernelInformation, CORRELATION_ID_TAG, EXECUTION_OPERATION, LAUNCH_OPERATION,
};
use crate::layer::{is_layer_span, LayerInformation, LayerTable, LAYER_INDEX_TAG};
use libdd_inference_trace::{Diagnostic, Observer, Span, SpanTree, TraceLevel};
use serde::{Deserialize, Serialize};

/// A layer and the kernels launched while it ran, in launch order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerKernels {
    pub layer: LayerInformation,
    pub kernels: Vec<KernelInformation>,
}

/// Turns the containment tree of one run into a list of layers sorted by index.
pub struct RunAggregator<'a> {
    config: &'a SummaryConfig,
    observer: &'a dyn Observer,
    layer_table: Option<&'a LayerTable>,
}

impl<'a> RunAggregator<'a> {
    pub fn new(config: &'a SummaryConfig, observer: &'a dyn Observer) -> Self {
        Self {
            config,
            observer,
            layer_table: None,
        }
    }

    /// Takes layer metadata from `table` instead of parsing it from every span.
    pub fn with_layer_table(mut self, table: &'a LayerTable) -> Self {
        self.layer_table = Some(table);
        self
    }

    /// Layers with a readable index, stably sorted by index. Empty when the run has no framework
    /// level layer spans.
    pub fn aggregate(&self, tree: &SpanTree) -> Vec<LayerKernels> {
        let mut layers: Vec<LayerKernels> = tree
            .spans()
            .iter()
            .filter(|span| is_layer_span(span))
            .filter_map(|span| {
                let layer = self.layer(span)?;
                let kernels = self.kernels(tree, span, layer.index);
                Some(LayerKernels { layer, kernels })
            })
            .collect();
        layers.sort_by_key(|l| l.layer.index);
        layers
    }

    fn layer(&self, span: &Span) -> Option<LayerInformation> {
        let parsed = span.tag_as_i64(LAYER_INDEX_TAG).and_then(|index| {
            match self
                .layer_table
                .and_then(|table| table.get(&span.operation_name, index))
            {
                Some(template) => Ok(LayerInformation::from_template(template, span)),
                None => LayerInformation::from_span(span),
            }
        });
        match parsed {
            Ok(layer) => Some(layer),
            Err(error) => {
                self.observer.observe(Diagnostic::SkippedLayer {
                    span_id: span.span_id,
                    error: &error,
                });
                None
            }
        }
    }

    /// Kernels launched by `layer_span` itself. Launches inside a nested layer belong to that
    /// layer only.
    fn kernels(
        &self,
        tree: &SpanTree,
        layer_span: &Span,
        layer_index: i64,
    ) -> Vec<KernelInformation> {
        let library_spans = tree.children_at_level_within(
            layer_span.span_id,
            TraceLevel::SystemLibrary,
            is_layer_span,
        );

        let mut kernels: Vec<KernelInformation> = library_spans
            .iter()
            .filter(|s| s.operation_name == LAUNCH_OPERATION)
            .map(|s| KernelInformation::from_launch(s))
            .collect();

        for execution in library_spans
            .iter()
            .filter(|s| s.operation_name == EXECUTION_OPERATION)
        {
            let correlation_id = execution.tag_as_i64(CORRELATION_ID_TAG).ok();
            let target = correlation_id.and_then(|id| {
                kernels
                    .iter_mut()
                    .find(|k| k.correlation_id == Some(id))
            });
            match target {
                Some(kernel) => {
                    if !kernel.is_filled() {
                        kernel.record_execution(execution);
                    }
                }
                None => self.observer.observe(Diagnostic::UnmatchedKernel {
                    layer_index,
                    span_id: execution.span_id,
                    correlation_id,
                }),
            }
        }

        for kernel in &mut kernels {
            kernel.derive(
                self.config.trimmed_mean_fraction(),
                self.config.ideal_arithmetic_intensity(),
            );
        }
        kernels
    }
}
