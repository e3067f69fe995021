// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Partitioning of a flat span list into one group per run.
//!
//! A run is identified by its root span (the predict call). Every other span belongs to the run
//! whose root it reaches by following [`parent_of`] links.

use crate::error::TraceError;
use crate::observer::{Diagnostic, Observer};
use crate::selectors::parent_of;
use crate::span::Span;
use crate::trace_level::TraceLevel;
use std::collections::{HashMap, HashSet};

/// Spans of a single run, in their original relative order.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanGroup {
    root: usize,
    spans: Vec<Span>,
}

impl SpanGroup {
    /// The predict span this run is keyed by.
    pub fn root(&self) -> &Span {
        &self.spans[self.root]
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn into_spans(self) -> Vec<Span> {
        self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

#[derive(Clone, Copy)]
enum Owner {
    Unresolved,
    Run(usize),
    Orphan,
}

/// Groups `spans` by the run root they descend from.
///
/// Roots are the spans named `root_operation_name` at `root_level`; groups are returned in the
/// order their roots appear. Spans that reach no root (including spans caught in a parent cycle)
/// are reported to `observer` and dropped.
pub fn group_spans(
    spans: Vec<Span>,
    root_operation_name: &str,
    root_level: TraceLevel,
    observer: &dyn Observer,
) -> Result<Vec<SpanGroup>, TraceError> {
    let mut run_of_root: HashMap<usize, usize> = HashMap::new();
    for (i, span) in spans.iter().enumerate() {
        if span.operation_name == root_operation_name && span.trace_level() == Some(root_level) {
            let run = run_of_root.len();
            run_of_root.insert(i, run);
        }
    }
    if run_of_root.is_empty() {
        return Err(TraceError::EmptyInput(format!(
            "no group of spans found: no `{root_operation_name}` span at {root_level}"
        )));
    }

    let mut position_of_id: HashMap<u64, usize> = HashMap::with_capacity(spans.len());
    for (i, span) in spans.iter().enumerate() {
        position_of_id.entry(span.span_id).or_insert(i);
    }

    let mut owners = vec![Owner::Unresolved; spans.len()];
    let mut path = Vec::new();
    let mut visited = HashSet::new();
    for start in 0..spans.len() {
        path.clear();
        visited.clear();
        let mut current = Some(start);
        let owner = loop {
            let Some(i) = current else {
                break Owner::Orphan;
            };
            if let Some(&run) = run_of_root.get(&i) {
                break Owner::Run(run);
            }
            match owners[i] {
                Owner::Unresolved => {}
                resolved => break resolved,
            }
            if !visited.insert(i) {
                break Owner::Orphan;
            }
            path.push(i);
            current = parent_of(&spans[i]).and_then(|id| position_of_id.get(&id).copied());
        };
        for &i in &path {
            owners[i] = owner;
        }
    }

    let mut groups: Vec<SpanGroup> = (0..run_of_root.len())
        .map(|_| SpanGroup {
            root: 0,
            spans: Vec::new(),
        })
        .collect();
    for (i, span) in spans.into_iter().enumerate() {
        let run = match run_of_root.get(&i) {
            Some(&run) => {
                groups[run].root = groups[run].spans.len();
                run
            }
            None => match owners[i] {
                Owner::Run(run) => run,
                Owner::Unresolved | Owner::Orphan => {
                    observer.observe(Diagnostic::OrphanSpan {
                        span_id: span.span_id,
                        operation_name: &span.operation_name,
                    });
                    continue;
                }
            },
        };
        groups[run].spans.push(span);
    }
    Ok(groups)
}
