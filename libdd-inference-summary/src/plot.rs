// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Chart data handed to an external renderer.

use serde::{Deserialize, Serialize};

/// Named sequence of labelled values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<(String, f64)>,
}

impl Series {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    pub fn push(&mut self, label: impl Into<String>, value: f64) {
        self.points.push((label.into(), value));
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.points.iter().map(|(l, _)| l.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(_, v)| *v)
    }
}

/// Renders series. Implementations own the output format.
pub trait Plotter {
    type Renderable;

    fn bar_plot(&self, series: &Series) -> Self::Renderable;

    fn pie_plot(&self, series: &Series) -> Self::Renderable;

    /// One box per label; repeated labels contribute samples to the same box.
    fn box_plot(&self, series: &Series) -> Self::Renderable;
}
