//! Pipeline configuration.
//!
//! Values come from an optional YAML file and are then overridden by command
//! line flags. Every field has a default so an empty file is valid.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SAMPLE_ROWS: usize = 2000;

/// First day of the Dunnhumby observation window; `day == 1` maps here.
pub fn default_base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, 1, 1).unwrap_or_default()
}

fn default_sample_rows() -> usize {
    DEFAULT_SAMPLE_ROWS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default = "default_base_date")]
    pub base_date: NaiveDate,
    /// Rows sampled per raw table when inferring column types (0 = all).
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
    #[serde(default)]
    pub delimiter: Option<char>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_date: default_base_date(),
            sample_rows: DEFAULT_SAMPLE_ROWS,
            delimiter: None,
            encoding: None,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read_to_string(path).with_context(|| format!("Opening config file {path:?}"))?;
        Self::from_yaml(&raw).with_context(|| format!("Parsing config file {path:?}"))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn with_base_date(mut self, base_date: Option<NaiveDate>) -> Self {
        if let Some(date) = base_date {
            self.base_date = date;
        }
        self
    }

    pub fn with_sample_rows(mut self, sample_rows: Option<usize>) -> Self {
        if let Some(rows) = sample_rows {
            self.sample_rows = rows;
        }
        self
    }

    pub fn with_delimiter(mut self, delimiter: Option<u8>) -> Self {
        if let Some(delimiter) = delimiter {
            self.delimiter = Some(delimiter as char);
        }
        self
    }

    pub fn with_encoding(mut self, encoding: Option<String>) -> Self {
        if encoding.is_some() {
            self.encoding = encoding;
        }
        self
    }

    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter.filter(char::is_ascii).map(|c| c as u8)
    }
}
