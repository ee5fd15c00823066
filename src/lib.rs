pub mod cli;
pub mod config;
pub mod data;
pub mod frame;
pub mod io_utils;
pub mod loader;
pub mod pipeline;
pub mod report;
pub mod schema;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{BuildArgs, Cli, Commands, SourceArgs, TablesArgs},
    config::PipelineConfig,
    frame::Frame,
    loader::{RawTables, TableKind},
    pipeline::Pipeline,
    report::RunSummary,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("basket_builder", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Tables(args) => handle_tables(&args),
        Commands::Build(args) => handle_build(&args),
    }
}

fn load_config(source: &SourceArgs) -> Result<PipelineConfig> {
    let config = match &source.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    let config = config
        .with_sample_rows(source.sample_rows)
        .with_delimiter(source.delimiter)
        .with_encoding(source.input_encoding.clone());
    debug!("Effective configuration: {config:?}");
    Ok(config)
}

fn handle_tables(args: &TablesArgs) -> Result<()> {
    let config = load_config(&args.source)?;
    info!("Scanning raw tables in {:?}", args.source.raw);
    let tables = RawTables::load(&args.source.raw, &config)
        .with_context(|| format!("Loading raw tables from {:?}", args.source.raw))?;
    let headers = ["table", "file", "rows", "columns"].map(String::from);
    let rows = tables
        .iter()
        .map(|table| {
            vec![
                table.kind.to_string(),
                table.path.display().to_string(),
                table.frame.height().to_string(),
                table.frame.width().to_string(),
            ]
        })
        .collect::<Vec<_>>();
    print!("{}", report::render_table(&headers, &rows));
    Ok(())
}

fn handle_build(args: &BuildArgs) -> Result<()> {
    let config = load_config(&args.source)?.with_base_date(args.base_date);
    info!(
        "Building baskets from {:?} with base date {}",
        args.source.raw, config.base_date
    );
    let tables = RawTables::load_kinds(
        &args.source.raw,
        &[TableKind::Transactions, TableKind::Products],
        &config,
    )
    .with_context(|| format!("Loading raw tables from {:?}", args.source.raw))?;
    let transactions = tables.require(TableKind::Transactions)?;
    let products = tables.require(TableKind::Products)?;

    let output = Pipeline::new(&config)
        .run(transactions, products)
        .context("Running basket pipeline")?;

    if let Some(path) = &args.lines_out {
        write_frame(&output.lines, path)?;
    }
    let baskets = output.baskets_frame();
    if let Some(path) = &args.baskets_out {
        write_frame(&baskets, path)?;
    }
    if let Some(path) = &args.rejected_out {
        write_frame(&output.rejected, path)?;
    }
    let summary = RunSummary::from_output(&output);
    if let Some(path) = &args.summary_out {
        summary.save_json(path)?;
        info!("Run summary written to {path:?}");
    }

    if args.preview > 0 {
        for (label, frame) in [("lines", &output.lines), ("baskets", &baskets)] {
            if frame.is_empty() {
                continue;
            }
            println!("{label} ({} row(s))", frame.height());
            print!("{}", report::render_frame(frame, args.preview));
            println!();
        }
    }
    let headers = ["metric", "value"].map(String::from);
    print!("{}", report::render_table(&headers, &summary.rows()));
    Ok(())
}

fn write_frame(frame: &Frame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Creating output directory {parent:?}"))?;
    }
    let mut writer = io_utils::open_csv_writer(path)?;
    frame
        .write_csv(&mut writer)
        .with_context(|| format!("Writing {path:?}"))?;
    info!(
        "Wrote {} row(s) x {} column(s) to {:?}",
        frame.height(),
        frame.width(),
        path
    );
    Ok(())
}
