// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Containment tree of one run.
//!
//! Explicit parent links (see [`parent_of`]) always win. A span whose parent is not part of the
//! span list is attached to the tightest span whose `[start, end]` interval encloses it and whose
//! trace level is not finer than its own. The tree is immutable once built.

use crate::error::TraceError;
use crate::selectors::parent_of;
use crate::span::Span;
use crate::trace_level::TraceLevel;
use std::cmp::Reverse;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct SpanTree {
    spans: Vec<Span>,
    position_of_id: HashMap<u64, usize>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    New,
    InProgress,
    Done,
}

/// Spans without a level sort after every known level.
fn level_rank(span: &Span) -> usize {
    span.trace_level().map_or(usize::MAX, |l| l as usize)
}

impl SpanTree {
    /// Builds the tree.
    ///
    /// # Errors
    ///
    /// [`TraceError::MalformedTrace`] on duplicate span ids, on a span that is its own parent and
    /// on explicit parent cycles.
    pub fn build(spans: Vec<Span>) -> Result<Self, TraceError> {
        let mut position_of_id = HashMap::with_capacity(spans.len());
        for (i, span) in spans.iter().enumerate() {
            if position_of_id.insert(span.span_id, i).is_some() {
                return Err(TraceError::MalformedTrace(format!(
                    "duplicate span id {}",
                    span.span_id
                )));
            }
        }

        let mut parents = Vec::with_capacity(spans.len());
        for span in &spans {
            let parent = match parent_of(span) {
                Some(id) if id == span.span_id => {
                    return Err(TraceError::MalformedTrace(format!(
                        "span {id} is its own parent"
                    )))
                }
                Some(id) => position_of_id.get(&id).copied(),
                None => None,
            };
            parents.push(parent);
        }
        check_acyclic(&spans, &parents)?;
        attach_by_interval(&spans, &mut parents);

        let mut children = vec![Vec::new(); spans.len()];
        for (i, parent) in parents.iter().enumerate() {
            if let Some(p) = parent {
                children[*p].push(i);
            }
        }

        Ok(Self {
            spans,
            position_of_id,
            parents,
            children,
        })
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn get(&self, span_id: u64) -> Option<&Span> {
        self.position_of_id.get(&span_id).map(|&i| &self.spans[i])
    }

    /// Reconstructed parent of `span_id`.
    pub fn parent(&self, span_id: u64) -> Option<&Span> {
        let i = *self.position_of_id.get(&span_id)?;
        self.parents[i].map(|p| &self.spans[p])
    }

    /// Spans without a reconstructed parent, in list order.
    pub fn roots(&self) -> impl Iterator<Item = &Span> {
        self.parents
            .iter()
            .zip(&self.spans)
            .filter(|(p, _)| p.is_none())
            .map(|(_, s)| s)
    }

    /// Direct children of `span_id`, in list order. Empty for unknown ids.
    pub fn children_of(&self, span_id: u64) -> Vec<&Span> {
        match self.position_of_id.get(&span_id) {
            Some(&i) => self.children[i].iter().map(|&c| &self.spans[c]).collect(),
            None => Vec::new(),
        }
    }

    /// Every descendant of `span_id` at `level`, in list order. Intermediate spans at other
    /// levels are traversed.
    pub fn children_at_level(&self, span_id: u64, level: TraceLevel) -> Vec<&Span> {
        self.children_at_level_within(span_id, level, |_| false)
    }

    /// Like [`SpanTree::children_at_level`], but subtrees rooted at a descendant for which
    /// `boundary` holds are neither returned nor traversed.
    pub fn children_at_level_within(
        &self,
        span_id: u64,
        level: TraceLevel,
        boundary: impl Fn(&Span) -> bool,
    ) -> Vec<&Span> {
        let Some(&start) = self.position_of_id.get(&span_id) else {
            return Vec::new();
        };
        let mut found = Vec::new();
        let mut stack: Vec<usize> = self.children[start].clone();
        while let Some(i) = stack.pop() {
            let span = &self.spans[i];
            if boundary(span) {
                continue;
            }
            if span.trace_level() == Some(level) {
                found.push(i);
            }
            stack.extend_from_slice(&self.children[i]);
        }
        found.sort_unstable();
        found.into_iter().map(|i| &self.spans[i]).collect()
    }
}

fn check_acyclic(spans: &[Span], parents: &[Option<usize>]) -> Result<(), TraceError> {
    let mut state = vec![Visit::New; spans.len()];
    let mut path = Vec::new();
    for start in 0..spans.len() {
        path.clear();
        let mut current = Some(start);
        while let Some(i) = current {
            match state[i] {
                Visit::Done => break,
                Visit::InProgress => {
                    return Err(TraceError::MalformedTrace(format!(
                        "span {} is its own ancestor",
                        spans[i].span_id
                    )))
                }
                Visit::New => {
                    state[i] = Visit::InProgress;
                    path.push(i);
                    current = parents[i];
                }
            }
        }
        for &i in &path {
            state[i] = Visit::Done;
        }
    }
    Ok(())
}

/// Would making `parent` the parent of `child` close a cycle?
fn is_ancestor_or_self(parents: &[Option<usize>], child: usize, mut parent: usize) -> bool {
    for _ in 0..=parents.len() {
        if parent == child {
            return true;
        }
        match parents[parent] {
            Some(p) => parent = p,
            None => return false,
        }
    }
    true
}

fn attach_by_interval(spans: &[Span], parents: &mut [Option<usize>]) {
    // Enclosing spans rank before enclosed ones: longer first, then coarser, then earlier.
    let key = |i: usize| (Reverse(spans[i].duration), level_rank(&spans[i]), i);
    for i in 0..spans.len() {
        if parents[i].is_some() {
            continue;
        }
        let span = &spans[i];
        let rank = level_rank(span);
        let mut candidates: Vec<usize> = (0..spans.len())
            .filter(|&j| {
                let c = &spans[j];
                j != i
                    && key(j) < key(i)
                    && level_rank(c) <= rank
                    && c.start_time <= span.start_time
                    && c.end_time() >= span.end_time()
            })
            .collect();
        // The tightest encloser has the largest key below `key(i)`.
        candidates.sort_unstable_by_key(|&j| Reverse(key(j)));
        parents[i] = candidates
            .into_iter()
            .find(|&j| !is_ancestor_or_self(parents, i, j));
    }
}
