//! Discovery and parsing of the raw retail tables.
//!
//! Each [`TableKind`] has a list of candidate file stems; the first stem that
//! exists with a supported extension wins. Files are parsed into [`Frame`]s
//! with per-column type inference.

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use itertools::Itertools;
use log::{debug, info, warn};

use crate::{
    config::PipelineConfig,
    data::{Value, parse_typed_value},
    frame::{Frame, Row},
    io_utils,
    schema::{ColumnType, infer_column_types},
};

pub const EXTENSIONS: &[&str] = &["csv", "tsv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableKind {
    Transactions,
    Products,
    Households,
    Coupons,
    Redemptions,
    Campaigns,
    CampaignDescriptions,
    CouponRedemptions,
}

impl TableKind {
    pub const ALL: [TableKind; 8] = [
        TableKind::Transactions,
        TableKind::Products,
        TableKind::Households,
        TableKind::Coupons,
        TableKind::Redemptions,
        TableKind::Campaigns,
        TableKind::CampaignDescriptions,
        TableKind::CouponRedemptions,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TableKind::Transactions => "transactions",
            TableKind::Products => "products",
            TableKind::Households => "households",
            TableKind::Coupons => "coupons",
            TableKind::Redemptions => "redemptions",
            TableKind::Campaigns => "campaigns",
            TableKind::CampaignDescriptions => "campaign_descriptions",
            TableKind::CouponRedemptions => "coupon_redemptions",
        }
    }

    pub fn stems(self) -> &'static [&'static str] {
        match self {
            TableKind::Transactions => &["transactions", "transaction_data", "transaction", "trans"],
            TableKind::Products => &["products", "product"],
            TableKind::Households => &["households", "hh_demographic", "household", "hh"],
            TableKind::Coupons => &["coupons", "coupon"],
            TableKind::Redemptions => &["redemptions", "coupon_redempt", "redemption"],
            TableKind::Campaigns => &["campaigns", "campaign_table", "campaign"],
            TableKind::CampaignDescriptions => &[
                "campaign_descriptions",
                "campaign_desc",
                "campaign_description",
            ],
            TableKind::CouponRedemptions => &["coupon_redemptions", "causal_data"],
        }
    }

    pub fn is_required(self) -> bool {
        !matches!(self, TableKind::CouponRedemptions)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub kind: TableKind,
    pub path: PathBuf,
    pub frame: Frame,
}

/// The raw datasets found under one directory.
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    tables: BTreeMap<TableKind, LoadedTable>,
}

impl RawTables {
    /// Loads every table; fails on the first missing required table.
    pub fn load(dir: &Path, config: &PipelineConfig) -> Result<Self> {
        Self::load_kinds(dir, &TableKind::ALL, config)
    }

    /// Loads only the given tables, still treating missing required ones as
    /// an error.
    pub fn load_kinds(dir: &Path, kinds: &[TableKind], config: &PipelineConfig) -> Result<Self> {
        let mut tables = BTreeMap::new();
        for &kind in kinds {
            match find_table(dir, kind) {
                Some(path) => {
                    let frame = read_frame(&path, config)
                        .with_context(|| format!("Loading table '{kind}' from {path:?}"))?;
                    info!(
                        "Loaded '{}' from {:?}: {} row(s) x {} column(s)",
                        kind,
                        path,
                        frame.height(),
                        frame.width()
                    );
                    tables.insert(kind, LoadedTable { kind, path, frame });
                }
                None if kind.is_required() => {
                    return Err(anyhow!(
                        "Table '{}' not found in {:?}. Tried stems {:?} with extensions {:?}",
                        kind,
                        dir,
                        kind.stems(),
                        EXTENSIONS
                    ));
                }
                None => debug!("Optional table '{}' not present in {:?}", kind, dir),
            }
        }
        Ok(Self { tables })
    }

    pub fn get(&self, kind: TableKind) -> Option<&LoadedTable> {
        self.tables.get(&kind)
    }

    pub fn frame(&self, kind: TableKind) -> Option<&Frame> {
        self.get(kind).map(|table| &table.frame)
    }

    pub fn require(&self, kind: TableKind) -> Result<&Frame> {
        self.frame(kind)
            .ok_or_else(|| anyhow!("Table '{kind}' was not loaded"))
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadedTable> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

pub fn find_table(dir: &Path, kind: TableKind) -> Option<PathBuf> {
    kind.stems().iter().find_map(|stem| {
        EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{stem}.{ext}")))
            .find(|candidate| candidate.is_file())
    })
}

pub fn read_frame(path: &Path, config: &PipelineConfig) -> Result<Frame> {
    let delimiter = io_utils::delimiter_for_path(path, config.delimiter_byte());
    let encoding = io_utils::resolve_encoding(config.encoding.as_deref())?;
    let (headers, records) = io_utils::read_all_records(path, delimiter, encoding)?;
    let types = infer_column_types(headers.len(), &records, config.sample_rows);
    debug!(
        "Inferred types for {:?}: {}",
        path,
        headers
            .iter()
            .zip(&types)
            .map(|(name, ty)| format!("{name}:{ty}"))
            .join(", ")
    );

    let mut fallbacks = 0usize;
    let rows = records
        .iter()
        .map(|record| {
            types
                .iter()
                .zip(record)
                .map(|(ty, raw)| typed_cell(raw, ty, &mut fallbacks))
                .collect::<Row>()
        })
        .collect::<Vec<_>>();
    if fallbacks > 0 {
        warn!(
            "{} cell(s) in {:?} did not match their sampled column type and were kept as text",
            fallbacks, path
        );
    }
    Frame::from_rows(headers, rows)
}

fn typed_cell(raw: &str, ty: &ColumnType, fallbacks: &mut usize) -> Option<Value> {
    match parse_typed_value(raw, ty) {
        Ok(value) => value,
        Err(_) => {
            *fallbacks += 1;
            Some(Value::String(raw.to_string()))
        }
    }
}
