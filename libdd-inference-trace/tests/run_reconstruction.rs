// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use libdd_inference_trace::test_utils::{RecordingObserver, SpanBuilder};
use libdd_inference_trace::{group_spans, DiagnosticKind, Span, SpanTree, TraceLevel};
use std::collections::BTreeSet;

const ROOTS: [u64; 3] = [1, 2, 3];

/// Three runs; span `k` hangs below an earlier span chosen by `choices[k]`, or below a missing
/// span when its flag is set.
fn forest(choices: &[(u8, bool)]) -> (Vec<Span>, BTreeSet<u64>) {
    let mut spans: Vec<Span> = ROOTS
        .iter()
        .map(|&id| {
            SpanBuilder::new(id, "c_predict")
                .level(TraceLevel::Model)
                .build()
        })
        .collect();
    let mut orphans = BTreeSet::new();
    for (k, (choice, orphan)) in choices.iter().enumerate() {
        let id = 100 + k as u64;
        let parent = if *orphan {
            10_000 + k as u64
        } else {
            spans[*choice as usize % spans.len()].span_id
        };
        if *orphan || orphans.contains(&parent) {
            orphans.insert(id);
        }
        spans.push(
            SpanBuilder::new(id, "op")
                .parent(parent)
                .level(TraceLevel::Framework)
                .build(),
        );
    }
    // Present the spans out of order.
    spans.reverse();
    (spans, orphans)
}

#[test]
fn three_roots_three_groups() {
    bolero::check!()
        .with_type::<Vec<(u8, bool)>>()
        .for_each(|choices| {
            let (spans, orphans) = forest(choices);
            let all: BTreeSet<u64> = spans.iter().map(|s| s.span_id).collect();
            let observer = RecordingObserver::default();

            let groups = group_spans(spans, "c_predict", TraceLevel::Model, &observer).unwrap();

            assert_eq!(groups.len(), 3);
            let mut union = BTreeSet::new();
            for group in &groups {
                assert!(!group.is_empty());
                assert!(ROOTS.contains(&group.root().span_id));
                for span in group.spans() {
                    assert!(union.insert(span.span_id), "span in two groups");
                }
            }
            let expected: BTreeSet<u64> = all.difference(&orphans).copied().collect();
            assert_eq!(union, expected);
            assert_eq!(observer.count(DiagnosticKind::OrphanSpan), orphans.len());
        })
}

#[test]
fn each_group_builds_a_tree_rooted_at_its_predict_span() {
    let (spans, _) = forest(&[(0, false), (1, false), (2, false), (3, false), (4, false)]);
    let groups = group_spans(
        spans,
        "c_predict",
        TraceLevel::Model,
        &RecordingObserver::default(),
    )
    .unwrap();

    for group in groups {
        let root_id = group.root().span_id;
        let tree = SpanTree::build(group.into_spans()).unwrap();
        let roots: Vec<u64> = tree.roots().map(|s| s.span_id).collect();
        assert_eq!(roots, [root_id]);
    }
}
