// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Pools the per-run layer lists of one evaluation.
//!
//! The first run is the skeleton. Every other run contributes the samples of the layers it
//! shares with the skeleton (same name and index) and, inside those, of the kernels it shares
//! (same name and same occurrence among kernels of that name). Anything the skeleton lacks is
//! dropped, or rejected under [`MergeStrictness::Strict`].

use crate::aggregator::LayerKernels;
use crate::config::{MergeStrictness, SummaryConfig};
use crate::error::SummaryError;
use crate::kernel::KernelInformation;
use std::collections::HashMap;

/// `(name, k)` for the k-th kernel of each name, in launch order.
fn kernel_keys(kernels: &[KernelInformation]) -> Vec<(&str, usize)> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    kernels
        .iter()
        .map(|k| {
            let ordinal = seen.entry(k.name.as_str()).or_insert(0);
            let key = (k.name.as_str(), *ordinal);
            *ordinal += 1;
            key
        })
        .collect()
}

fn find_layer<'r>(run: &'r [LayerKernels], skeleton: &LayerKernels) -> Option<&'r LayerKernels> {
    run.iter()
        .find(|l| l.layer.name == skeleton.layer.name && l.layer.index == skeleton.layer.index)
}

fn check_run(
    run_number: usize,
    skeleton: &[LayerKernels],
    run: &[LayerKernels],
) -> Result<(), SummaryError> {
    for layer in run {
        let Some(base) = find_layer(skeleton, layer) else {
            return Err(SummaryError::RunMismatch(format!(
                "layer {} ({}) of run {run_number} is missing from run 0",
                layer.layer.index, layer.layer.name
            )));
        };
        let base_keys = kernel_keys(&base.kernels);
        if let Some((name, ordinal)) = kernel_keys(&layer.kernels)
            .into_iter()
            .find(|key| !base_keys.contains(key))
        {
            return Err(SummaryError::RunMismatch(format!(
                "kernel {name} #{ordinal} in layer {} of run {run_number} is missing from run 0",
                layer.layer.index
            )));
        }
    }
    Ok(())
}

/// Merges the runs and sorts the result by layer index.
///
/// Merging a single run returns it unchanged apart from the ordering. Derived kernel figures are
/// recomputed from the pooled samples.
///
/// # Errors
///
/// [`SummaryError::EmptyInput`] without runs, [`SummaryError::RunMismatch`] under
/// [`MergeStrictness::Strict`] when a later run has a layer or kernel the first run lacks.
pub fn merge_runs(
    runs: Vec<Vec<LayerKernels>>,
    config: &SummaryConfig,
) -> Result<Vec<LayerKernels>, SummaryError> {
    let mut runs = runs.into_iter();
    let Some(mut skeleton) = runs.next() else {
        return Err(SummaryError::EmptyInput("no run to merge".to_owned()));
    };

    for (offset, run) in runs.enumerate() {
        if config.merge_strictness() == MergeStrictness::Strict {
            check_run(offset + 1, &skeleton, &run)?;
        }
        for base in &mut skeleton {
            let Some(other) = find_layer(&run, base) else {
                continue;
            };
            base.layer.pool(&other.layer);

            let other_keys = kernel_keys(&other.kernels);
            let base_keys: Vec<(String, usize)> = kernel_keys(&base.kernels)
                .into_iter()
                .map(|(name, k)| (name.to_owned(), k))
                .collect();
            for (kernel, (name, k)) in base.kernels.iter_mut().zip(&base_keys) {
                if let Some(i) = other_keys
                    .iter()
                    .position(|(n, ordinal)| *n == name.as_str() && ordinal == k)
                {
                    kernel.pool(&other.kernels[i]);
                }
            }
        }
    }

    for layer in &mut skeleton {
        for kernel in &mut layer.kernels {
            kernel.derive(
                config.trimmed_mean_fraction(),
                config.ideal_arithmetic_intensity(),
            );
        }
    }
    skeleton.sort_by_key(|l| l.layer.index);
    Ok(skeleton)
}
