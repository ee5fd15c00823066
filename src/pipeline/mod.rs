//! Cleaning and basket aggregation of raw transaction lines.
//!
//! Stages run strictly in sequence, each consuming the table produced by the
//! previous one:
//!
//! 1. [`normalize`]: lowercase column names and apply the rename map.
//! 2. [`sanitize`]: coerce measures, zero-fill discounts, partition out
//!    invalid lines.
//! 3. [`metrics`]: unit price and discount measures.
//! 4. [`enrich`]: optional product attribute join.
//! 5. [`dates`]: calendar `order_date` from the `day` offset.
//! 6. [`coupon`]: per-line coupon treatment flag.
//! 7. [`baskets`]: one row per basket.
//!
//! The caller's tables are never modified.

pub mod baskets;
pub mod columns;
pub mod coupon;
pub mod dates;
pub mod enrich;
pub mod error;
pub mod metrics;
pub mod normalize;
pub mod sanitize;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::debug;

use crate::{config::PipelineConfig, frame::Frame};

pub use baskets::{Basket, aggregate_baskets, baskets_to_frame};
pub use enrich::{AttributeColumns, Enrichment, SkipReason};
pub use error::{PipelineError, Result, Stage};
pub use sanitize::{Partition, RejectReason, RejectedLine, TransactionLayout};

/// Enriched line-level table plus what the sanitizer discarded.
#[derive(Debug, Clone)]
pub struct CleanedLines {
    pub lines: Frame,
    pub rejected: Frame,
    pub reject_counts: BTreeMap<RejectReason, usize>,
    pub enrichment: Enrichment,
    pub raw_lines: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Line-level table including `coupon_applied_line`.
    pub lines: Frame,
    pub baskets: Vec<Basket>,
    pub rejected: Frame,
    pub reject_counts: BTreeMap<RejectReason, usize>,
    pub enrichment: Enrichment,
    pub raw_lines: usize,
}

impl PipelineOutput {
    pub fn baskets_frame(&self) -> Frame {
        baskets_to_frame(&self.baskets)
    }

    pub fn treated_baskets(&self) -> usize {
        self.baskets.iter().filter(|b| b.coupon_applied).count()
    }

    /// Share of baskets with at least one coupon-treated line.
    pub fn coupon_rate(&self) -> f64 {
        if self.baskets.is_empty() {
            0.0
        } else {
            self.treated_baskets() as f64 / self.baskets.len() as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    base_date: NaiveDate,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl Pipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            base_date: config.base_date,
        }
    }

    pub fn with_base_date(base_date: NaiveDate) -> Self {
        Self { base_date }
    }

    pub fn base_date(&self) -> NaiveDate {
        self.base_date
    }

    /// Normalization through date derivation.
    pub fn clean(&self, transactions: &Frame, products: &Frame) -> Result<CleanedLines> {
        let lines = normalize::normalize_transactions(transactions);
        let products = normalize::normalize_products(products);
        debug!("Normalized transaction columns: {:?}", lines.columns());

        let layout = TransactionLayout::probe(&lines)?;
        let missing = layout.missing_discounts();
        if !missing.is_empty() {
            debug!("Discount column(s) {missing:?} absent; treating them as zero");
        }
        let raw_lines = lines.height();
        let partition = sanitize::sanitize(lines, &layout);
        let reject_counts = partition.reason_counts();
        let rejected = partition.rejected_frame();

        let lines = metrics::derive_metrics(partition.retained)?;
        let (lines, enrichment) = enrich::attach_attributes(lines, &products);
        let lines = dates::derive_order_date(lines, self.base_date)?;
        Ok(CleanedLines {
            lines,
            rejected,
            reject_counts,
            enrichment,
            raw_lines,
        })
    }

    pub fn run(&self, transactions: &Frame, products: &Frame) -> Result<PipelineOutput> {
        let cleaned = self.clean(transactions, products)?;
        let lines = coupon::flag_coupon_lines(cleaned.lines)?;
        let baskets = aggregate_baskets(&lines)?;
        Ok(PipelineOutput {
            lines,
            baskets,
            rejected: cleaned.rejected,
            reject_counts: cleaned.reject_counts,
            enrichment: cleaned.enrichment,
            raw_lines: cleaned.raw_lines,
        })
    }
}
