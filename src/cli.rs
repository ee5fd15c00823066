use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::data::parse_naive_date;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Clean retail transaction lines and aggregate them into baskets",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the raw tables found in a directory with their shapes
    Tables(TablesArgs),
    /// Run the cleaning pipeline and write line, basket and rejection tables
    Build(BuildArgs),
}

/// Options shared by every command that reads the raw directory.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Directory holding the raw CSV/TSV tables
    #[arg(short, long)]
    pub raw: PathBuf,
    /// Optional YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Number of rows to sample when inferring column types (0 means full scan)
    #[arg(long)]
    pub sample_rows: Option<usize>,
    /// Delimiter override for every raw table (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the raw tables (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct TablesArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Calendar date of day 1 (YYYY-MM-DD and similar formats)
    #[arg(long, value_parser = parse_date)]
    pub base_date: Option<NaiveDate>,
    /// Output file for the cleaned, flagged line-level table
    #[arg(long = "lines-out")]
    pub lines_out: Option<PathBuf>,
    /// Output file for the basket table
    #[arg(long = "baskets-out")]
    pub baskets_out: Option<PathBuf>,
    /// Output file for lines removed by the sanitizer
    #[arg(long = "rejected-out")]
    pub rejected_out: Option<PathBuf>,
    /// Output file for the JSON run summary
    #[arg(long = "summary-out")]
    pub summary_out: Option<PathBuf>,
    /// Number of basket rows to print after the run
    #[arg(long, default_value_t = 10)]
    pub preview: usize,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "pipe" | "|" => Ok(b'|'),
        "semicolon" | ";" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err(format!("Unsupported delimiter '{other}'"));
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    parse_naive_date(value.trim()).map_err(|err| err.to_string())
}
