// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{format_f64, header_with_base, row_with_base};
use crate::collection::{Collection, Filter};
use crate::error::SummaryError;
use crate::model::{Evaluation, ModelAccuracy, SummaryBase};
use crate::writer::Tabular;
use libdd_inference_trace::{Diagnostic, Observer};
use serde::{Deserialize, Serialize};

/// Top-1 and top-5 accuracy of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracySummary {
    #[serde(flatten)]
    pub base: SummaryBase,
    pub top1: f64,
    pub top5: f64,
}

impl AccuracySummary {
    /// Summaries of the evaluations whose accuracy record exists, in input order. Missing
    /// records are reported and skipped.
    ///
    /// # Errors
    ///
    /// [`SummaryError::EmptyInput`] for an empty list, and any error of the collection itself.
    pub fn collect(
        evaluations: &[Evaluation],
        accuracies: &dyn Collection<ModelAccuracy>,
        observer: &dyn Observer,
    ) -> Result<Vec<Self>, SummaryError> {
        if evaluations.is_empty() {
            return Err(SummaryError::EmptyInput(
                "no evaluation to summarize".to_owned(),
            ));
        }
        let mut summaries = Vec::with_capacity(evaluations.len());
        for evaluation in evaluations {
            let filter = Filter::by_id(evaluation.model_accuracy_id.as_str());
            match accuracies.find(&filter)?.into_iter().next() {
                Some(accuracy) => summaries.push(Self {
                    base: SummaryBase::from(evaluation),
                    top1: accuracy.top1,
                    top5: accuracy.top5,
                }),
                None => {
                    let error = SummaryError::NotFound(format!(
                        "model accuracy {} of evaluation {}",
                        evaluation.model_accuracy_id, evaluation.id
                    ));
                    observer.observe(Diagnostic::EvaluationSkipped {
                        evaluation_id: &evaluation.id,
                        error: &error,
                    });
                }
            }
        }
        Ok(summaries)
    }
}

impl Tabular for AccuracySummary {
    fn header() -> Vec<String> {
        header_with_base(&["top1", "top5"])
    }

    fn row(&self) -> Vec<String> {
        row_with_base(
            &self.base,
            vec![format_f64(self.top1), format_f64(self.top5)],
        )
    }
}
