//! Numeric coercion and row filtering for normalized transactions.

use std::{collections::BTreeMap, fmt};

use log::info;
use serde::Serialize;

use crate::{
    data::{Value, coerce_numeric},
    frame::{Frame, Row},
};

use super::{
    columns::{self, DISCOUNT_COMPONENTS, QUANTITY, SALES_VALUE},
    error::{Result, Stage},
};

pub const REJECT_REASON: &str = "reject_reason";
pub const SOURCE_ROW: &str = "source_row";

/// Which transaction columns are present, probed once after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionLayout {
    pub quantity: usize,
    pub sales_value: usize,
    /// Indices of `retail_disc`, `coupon_disc`, `coupon_match_disc`.
    pub discounts: [Option<usize>; 3],
}

impl TransactionLayout {
    pub fn probe(frame: &Frame) -> Result<Self> {
        Ok(Self {
            quantity: columns::require(frame, Stage::Sanitize, QUANTITY)?,
            sales_value: columns::require(frame, Stage::Sanitize, SALES_VALUE)?,
            discounts: DISCOUNT_COMPONENTS.map(|name| frame.column_index(name)),
        })
    }

    pub fn missing_discounts(&self) -> Vec<&'static str> {
        DISCOUNT_COMPONENTS
            .iter()
            .zip(&self.discounts)
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| *name)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingQuantity,
    NonPositiveQuantity,
    MissingSalesValue,
    NegativeSalesValue,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::MissingQuantity => "missing_quantity",
            RejectReason::NonPositiveQuantity => "non_positive_quantity",
            RejectReason::MissingSalesValue => "missing_sales_value",
            RejectReason::NegativeSalesValue => "negative_sales_value",
        }
    }

    /// `None` when a line with these measures is kept.
    pub fn classify(quantity: Option<f64>, sales_value: Option<f64>) -> Option<Self> {
        match (quantity, sales_value) {
            (None, _) => Some(RejectReason::MissingQuantity),
            (Some(q), _) if q <= 0.0 => Some(RejectReason::NonPositiveQuantity),
            (_, None) => Some(RejectReason::MissingSalesValue),
            (_, Some(s)) if s < 0.0 => Some(RejectReason::NegativeSalesValue),
            _ => None,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedLine {
    /// Zero-based position in the normalized input.
    pub source_row: usize,
    pub reason: RejectReason,
    pub values: Row,
}

/// Retained and rejected lines, both in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub retained: Frame,
    pub rejected: Vec<RejectedLine>,
}

impl Partition {
    pub fn reason_counts(&self) -> BTreeMap<RejectReason, usize> {
        let mut counts = BTreeMap::new();
        for line in &self.rejected {
            *counts.entry(line.reason).or_insert(0) += 1;
        }
        counts
    }

    /// Rejected lines with their coerced cells plus the reason and position.
    pub fn rejected_frame(&self) -> Frame {
        let mut columns = self.retained.columns().to_vec();
        columns.push(SOURCE_ROW.to_string());
        columns.push(REJECT_REASON.to_string());
        let rows = self
            .rejected
            .iter()
            .map(|line| {
                let mut row = line.values.clone();
                row.push(Some(Value::Integer(line.source_row as i64)));
                row.push(Some(Value::String(line.reason.as_str().to_string())));
                row
            })
            .collect();
        Frame::from_parts(columns, rows)
    }
}

/// Coerces measures to numbers, zero-fills discount components and splits
/// rows into retained and rejected sets.
pub fn sanitize(frame: Frame, layout: &TransactionLayout) -> Partition {
    let numeric = [layout.quantity, layout.sales_value]
        .into_iter()
        .chain(layout.discounts.iter().flatten().copied())
        .collect::<Vec<_>>();
    let absent = layout.missing_discounts();

    let (mut column_names, rows) = frame.into_parts();
    column_names.extend(absent.iter().map(|name| name.to_string()));

    let total = rows.len();
    let mut retained = Vec::with_capacity(total);
    let mut rejected = Vec::new();
    for (source_row, mut row) in rows.into_iter().enumerate() {
        for &idx in &numeric {
            row[idx] = coerce_numeric(row[idx].as_ref()).map(Value::Float);
        }
        for &idx in layout.discounts.iter().flatten() {
            row[idx].get_or_insert(Value::Float(0.0));
        }
        row.extend(absent.iter().map(|_| Some(Value::Float(0.0))));

        let quantity = coerce_numeric(row[layout.quantity].as_ref());
        let sales_value = coerce_numeric(row[layout.sales_value].as_ref());
        match RejectReason::classify(quantity, sales_value) {
            None => retained.push(row),
            Some(reason) => rejected.push(RejectedLine {
                source_row,
                reason,
                values: row,
            }),
        }
    }
    info!(
        "Sanitized {} line(s): {} retained, {} rejected",
        total,
        retained.len(),
        rejected.len()
    );
    Partition {
        retained: Frame::from_parts(column_names, retained),
        rejected,
    }
}
