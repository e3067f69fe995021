// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Tabular output.

use crate::error::SummaryError;

/// A summary that renders as one table row.
pub trait Tabular {
    /// Column names. Every [`Tabular::row`] has the same length.
    fn header() -> Vec<String>
    where
        Self: Sized;

    fn row(&self) -> Vec<String>;
}

/// Sink for a header followed by rows.
pub trait Writer {
    fn header(&mut self, fields: &[String]) -> Result<(), SummaryError>;

    fn row(&mut self, fields: &[String]) -> Result<(), SummaryError>;

    fn rows(&mut self, rows: &[Vec<String>]) -> Result<(), SummaryError> {
        for row in rows {
            self.row(row)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), SummaryError>;
}

/// Writes the header of `T` and one row per item. Does not close the writer.
pub fn write_table<W, T>(writer: &mut W, items: &[T]) -> Result<(), SummaryError>
where
    W: Writer + ?Sized,
    T: Tabular,
{
    writer.header(&T::header())?;
    for item in items {
        writer.row(&item.row())?;
    }
    Ok(())
}

/// [`Writer`] that keeps the table in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableBuffer {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    closed: bool,
}

impl TableBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header_fields(&self) -> &[String] {
        &self.header
    }

    /// Rows written so far.
    pub fn body(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Cell at `row` under the column named `column`.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let i = self.header.iter().position(|h| h == column)?;
        self.rows.get(row)?.get(i).map(String::as_str)
    }

    fn ensure_open(&self) -> Result<(), SummaryError> {
        if self.closed {
            return Err(SummaryError::Writer("table is closed".to_owned()));
        }
        Ok(())
    }
}

impl Writer for TableBuffer {
    fn header(&mut self, fields: &[String]) -> Result<(), SummaryError> {
        self.ensure_open()?;
        if !self.rows.is_empty() {
            return Err(SummaryError::Writer(
                "header written after rows".to_owned(),
            ));
        }
        self.header = fields.to_vec();
        Ok(())
    }

    fn row(&mut self, fields: &[String]) -> Result<(), SummaryError> {
        self.ensure_open()?;
        if !self.header.is_empty() && fields.len() != self.header.len() {
            return Err(SummaryError::Writer(format!(
                "row has {} fields, header has {}",
                fields.len(),
                self.header.len()
            )));
        }
        self.rows.push(fields.to_vec());
        Ok(())
    }

    fn close(&mut self) -> Result<(), SummaryError> {
        self.ensure_open()?;
        self.closed = true;
        Ok(())
    }
}
