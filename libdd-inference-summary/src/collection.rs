// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Record stores.
//!
//! The summarizer reads evaluations, performance payloads and accuracy records through
//! [`Collection`]. [`MemoryCollection`] keeps records in a `Vec` and loads JSON fixtures.

use crate::error::SummaryError;
use indexmap::IndexMap;
use libdd_inference_trace::TagValue;
use serde::de::DeserializeOwned;
use std::io::Read;

/// A record that can be matched against a [`Filter`].
pub trait Record {
    /// Value of a dotted field path such as `model.name`, if the record has it.
    fn field(&self, key: &str) -> Option<TagValue>;
}

/// Conjunction of field equalities, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    fields: IndexMap<String, TagValue>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on the `_id` field.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new().with("_id", id.into())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<TagValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.fields.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when every field of the filter is present on `record` with an equal value. Numbers
    /// compare by value, so `batch_size: 8` matches `"8"`.
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        self.fields
            .iter()
            .all(|(key, expected)| record.field(key).is_some_and(|v| same_value(&v, expected)))
    }
}

fn same_value(a: &TagValue, b: &TagValue) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (TagValue::String(_), TagValue::String(_)) => false,
        (TagValue::Bool(_), _) | (_, TagValue::Bool(_)) => a.as_bool() == b.as_bool(),
        _ => matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y),
    }
}

/// Store of records of type `R`.
pub trait Collection<R>: Send + Sync {
    /// Records matching `filter`, in insertion order. An empty filter matches everything.
    fn find(&self, filter: &Filter) -> Result<Vec<R>, SummaryError>;

    fn insert(&mut self, record: R) -> Result<(), SummaryError>;

    /// Releases the store. Later calls fail with [`SummaryError::Collection`].
    fn close(&mut self) -> Result<(), SummaryError>;
}

/// [`Collection`] over a `Vec`.
#[derive(Debug, Clone)]
pub struct MemoryCollection<R> {
    name: String,
    records: Vec<R>,
    closed: bool,
}

impl<R> MemoryCollection<R> {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_records(name, Vec::new())
    }

    pub fn with_records(name: impl Into<String>, records: Vec<R>) -> Self {
        Self {
            name: name.into(),
            records,
            closed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn ensure_open(&self) -> Result<(), SummaryError> {
        if self.closed {
            return Err(SummaryError::Collection(format!(
                "collection `{}` is closed",
                self.name
            )));
        }
        Ok(())
    }
}

impl<R: DeserializeOwned> MemoryCollection<R> {
    /// Loads a JSON array of records.
    pub fn from_json_reader(
        name: impl Into<String>,
        reader: impl Read,
    ) -> Result<Self, SummaryError> {
        let records: Vec<R> = serde_json::from_reader(reader)?;
        Ok(Self::with_records(name, records))
    }
}

impl<R> Collection<R> for MemoryCollection<R>
where
    R: Record + Clone + Send + Sync,
{
    fn find(&self, filter: &Filter) -> Result<Vec<R>, SummaryError> {
        self.ensure_open()?;
        Ok(self
            .records
            .iter()
            .filter(|r| filter.matches(*r))
            .cloned()
            .collect())
    }

    fn insert(&mut self, record: R) -> Result<(), SummaryError> {
        self.ensure_open()?;
        self.records.push(record);
        Ok(())
    }

    fn close(&mut self) -> Result<(), SummaryError> {
        self.ensure_open()?;
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Row {
        id: String,
        size: i64,
        gpu: bool,
    }

    impl Record for Row {
        fn field(&self, key: &str) -> Option<TagValue> {
            match key {
                "_id" => Some(self.id.clone().into()),
                "size" => Some(self.size.into()),
                "gpu" => Some(self.gpu.into()),
                _ => None,
            }
        }
    }

    fn rows() -> MemoryCollection<Row> {
        MemoryCollection::from_json_reader(
            "rows",
            r#"[
                {"id": "a", "size": 1, "gpu": true},
                {"id": "b", "size": 8, "gpu": false},
                {"id": "c", "size": 8, "gpu": true}
            ]"#
            .as_bytes(),
        )
        .unwrap()
    }

    fn ids(rows: Vec<Row>) -> Vec<String> {
        rows.into_iter().map(|r| r.id).collect()
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert_eq!(ids(rows().find(&Filter::new()).unwrap()), ["a", "b", "c"]);
    }

    #[test]
    fn fields_are_conjunctive_and_numbers_coerce() {
        let filter = Filter::new().with("size", "8").with("gpu", true);
        assert_eq!(ids(rows().find(&filter).unwrap()), ["c"]);
        assert_eq!(ids(rows().find(&Filter::by_id("b")).unwrap()), ["b"]);
        assert!(rows()
            .find(&Filter::new().with("missing", 1))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn strings_compare_exactly() {
        let filter = Filter::new().with("_id", "A");
        assert!(rows().find(&filter).unwrap().is_empty());
    }

    #[test]
    fn insert_then_close() {
        let mut rows = rows();
        rows.insert(Row {
            id: "d".to_owned(),
            size: 2,
            gpu: false,
        })
        .unwrap();
        assert_eq!(rows.len(), 4);

        rows.close().unwrap();
        assert!(matches!(
            rows.find(&Filter::new()),
            Err(SummaryError::Collection(_))
        ));
        assert!(rows.close().is_err());
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let result = MemoryCollection::<Row>::from_json_reader("rows", "{".as_bytes());
        assert!(matches!(result, Err(SummaryError::Serialization(_))));
    }
}
