//! Column type inference for raw tables.
//!
//! Every raw column is sampled and assigned the narrowest [`ColumnType`] that
//! parses all of its non-empty sampled cells, preferring `Integer`, then
//! `Float`, then `Date`, and falling back to `String`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::parse_naive_date;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Date,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnType::String => "String",
            ColumnType::Integer => "Integer",
            ColumnType::Float => "Float",
            ColumnType::Date => "Date",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
struct TypeCandidate {
    possible_integer: bool,
    possible_float: bool,
    possible_date: bool,
    observed: bool,
}

impl TypeCandidate {
    fn new() -> Self {
        Self {
            possible_integer: true,
            possible_float: true,
            possible_date: true,
            observed: false,
        }
    }

    fn observe(&mut self, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        self.observed = true;
        if self.possible_integer && value.parse::<i64>().is_err() {
            self.possible_integer = false;
        }
        if self.possible_float && value.parse::<f64>().is_err() {
            self.possible_float = false;
        }
        if self.possible_date && parse_naive_date(value).is_err() {
            self.possible_date = false;
        }
    }

    fn decide(&self) -> ColumnType {
        if !self.observed {
            ColumnType::String
        } else if self.possible_integer {
            ColumnType::Integer
        } else if self.possible_float {
            ColumnType::Float
        } else if self.possible_date {
            ColumnType::Date
        } else {
            ColumnType::String
        }
    }
}

/// Accumulates per-column evidence over sampled records.
#[derive(Debug, Clone)]
pub struct TypeInference {
    candidates: Vec<TypeCandidate>,
    sample_rows: usize,
    processed: usize,
}

impl TypeInference {
    /// `sample_rows == 0` samples every record.
    pub fn new(width: usize, sample_rows: usize) -> Self {
        Self {
            candidates: vec![TypeCandidate::new(); width],
            sample_rows,
            processed: 0,
        }
    }

    pub fn is_saturated(&self) -> bool {
        self.sample_rows > 0 && self.processed >= self.sample_rows
    }

    pub fn observe_record(&mut self, record: &[String]) {
        if self.is_saturated() {
            return;
        }
        for (candidate, field) in self.candidates.iter_mut().zip(record) {
            candidate.observe(field);
        }
        self.processed += 1;
    }

    pub fn decide(&self) -> Vec<ColumnType> {
        self.candidates.iter().map(TypeCandidate::decide).collect()
    }
}

pub fn infer_column_types(width: usize, records: &[Vec<String>], sample_rows: usize) -> Vec<ColumnType> {
    let mut inference = TypeInference::new(width, sample_rows);
    for record in records {
        if inference.is_saturated() {
            break;
        }
        inference.observe_record(record);
    }
    inference.decide()
}
