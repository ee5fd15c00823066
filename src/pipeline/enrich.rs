//! Optional product attribute join.
//!
//! The product table is probed for a department-like and a category-like
//! column. When the join key and at least one attribute are available the
//! attributes are left-joined onto the transaction lines; otherwise the lines
//! pass through untouched.

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use log::{info, warn};
use serde::Serialize;

use crate::{
    data::Value,
    frame::{Frame, Row},
};

use super::columns::PRODUCT_ID;

pub const DEPARTMENT_CANDIDATES: &[&str] = &["department", "dept"];
pub const CATEGORY_CANDIDATES: &[&str] = &["product_category", "category", "cat"];

/// Attribute columns discovered on the product table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeColumns {
    pub department: Option<String>,
    pub category: Option<String>,
}

impl AttributeColumns {
    /// First product column (in table order) matching each candidate list.
    pub fn probe(products: &Frame) -> Self {
        let find = |candidates: &[&str]| {
            products
                .columns()
                .iter()
                .find(|name| candidates.contains(&name.as_str()))
                .cloned()
        };
        Self {
            department: find(DEPARTMENT_CANDIDATES),
            category: find(CATEGORY_CANDIDATES),
        }
    }

    /// Category first, then department.
    pub fn names(&self) -> Vec<&str> {
        self.category
            .iter()
            .chain(self.department.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.department.is_none() && self.category.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    ProductKeyMissing,
    TransactionKeyMissing,
    NoAttributeColumns,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkipReason::ProductKeyMissing => "products have no product_id column",
            SkipReason::TransactionKeyMissing => "transactions have no product_id column",
            SkipReason::NoAttributeColumns => "no department or category column",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Enrichment {
    Joined {
        columns: AttributeColumns,
        unmatched_lines: usize,
        conflicting_products: usize,
    },
    Skipped {
        reason: SkipReason,
    },
}

impl Enrichment {
    pub fn is_joined(&self) -> bool {
        matches!(self, Enrichment::Joined { .. })
    }
}

pub fn attach_attributes(frame: Frame, products: &Frame) -> (Frame, Enrichment) {
    let attributes = AttributeColumns::probe(products);
    let skip = if attributes.is_empty() {
        Some(SkipReason::NoAttributeColumns)
    } else if !products.has_column(PRODUCT_ID) {
        Some(SkipReason::ProductKeyMissing)
    } else if !frame.has_column(PRODUCT_ID) {
        Some(SkipReason::TransactionKeyMissing)
    } else {
        None
    };
    if let Some(reason) = skip {
        info!("Skipping product attribute join: {reason}");
        return (frame, Enrichment::Skipped { reason });
    }

    let names = attributes.names();
    let lookup = ProductLookup::build(products, &names);
    if lookup.conflicting > 0 {
        warn!(
            "{} product id(s) carry conflicting attribute values; matching lines are duplicated",
            lookup.conflicting
        );
    }

    let (mut columns, rows) = frame.into_parts();
    let key_idx = columns
        .iter()
        .position(|c| c == PRODUCT_ID)
        .unwrap_or_default();
    let width = columns.len();
    let targets = names
        .iter()
        .map(|name| match columns.iter().position(|c| c == name) {
            Some(idx) => idx,
            None => {
                columns.push(name.to_string());
                columns.len() - 1
            }
        })
        .collect::<Vec<_>>();
    let added = columns.len() - width;

    let mut unmatched_lines = 0usize;
    let mut joined = Vec::with_capacity(rows.len());
    for mut row in rows {
        row.extend((0..added).map(|_| None));
        let matches = row[key_idx]
            .as_ref()
            .and_then(|key| lookup.entries.get(&key.as_display()));
        match matches {
            Some(entries) => {
                for attrs in entries {
                    let mut combined = row.clone();
                    for (&idx, value) in targets.iter().zip(attrs) {
                        combined[idx] = value.clone();
                    }
                    joined.push(combined);
                }
            }
            None => {
                unmatched_lines += 1;
                for &idx in &targets {
                    row[idx] = None;
                }
                joined.push(row);
            }
        }
    }

    info!(
        "Joined product attributes {:?}; {} line(s) without a matching product",
        names, unmatched_lines
    );
    let conflicting_products = lookup.conflicting;
    (
        Frame::from_parts(columns, joined),
        Enrichment::Joined {
            columns: attributes,
            unmatched_lines,
            conflicting_products,
        },
    )
}

/// Distinct attribute tuples per product key, keyed by display form so that
/// integer and textual ids match.
struct ProductLookup {
    entries: HashMap<String, Vec<Row>>,
    conflicting: usize,
}

impl ProductLookup {
    fn build(products: &Frame, names: &[&str]) -> Self {
        let key_idx = products.column_index(PRODUCT_ID).unwrap_or_default();
        let attr_idx = names
            .iter()
            .filter_map(|name| products.column_index(name))
            .collect::<Vec<_>>();
        let mut entries: HashMap<String, Vec<Row>> = HashMap::new();
        let mut conflicted = HashSet::new();
        for row in products.rows() {
            let Some(key) = row[key_idx].as_ref() else {
                continue;
            };
            let key = key.as_display();
            let attrs = attr_idx.iter().map(|&idx| row[idx].clone()).collect::<Row>();
            let bucket = entries.entry(key.clone()).or_default();
            if bucket.contains(&attrs) {
                continue;
            }
            if !bucket.is_empty() {
                conflicted.insert(key);
            }
            bucket.push(attrs);
        }
        Self {
            entries,
            conflicting: conflicted.len(),
        }
    }
}
