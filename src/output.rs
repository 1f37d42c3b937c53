//! Output persistence for result tables.
//!
//! Supports CSV tables (optionally gzip-compressed) and pretty JSON summaries.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::types::{
    AlertRecord, AupsValue, BacktestResult, BacktestSummary, DistrictRanking, ForecastPoint,
};
use crate::pipeline::DistrictFailure;

/// A row type that can be written as a CSV table.
///
/// `HEADERS` must list the serialized field names in declaration order; it
/// is only used for empty tables, where there is no row to derive them from.
pub trait TableRow: Serialize {
    const HEADERS: &'static [&'static str];
}

impl TableRow for AupsValue {
    const HEADERS: &'static [&'static str] = &["district_id", "period", "score"];
}

impl TableRow for ForecastPoint {
    const HEADERS: &'static [&'static str] = &[
        "district_id",
        "period",
        "predicted_demand",
        "lower_bound",
        "upper_bound",
    ];
}

impl TableRow for BacktestResult {
    const HEADERS: &'static [&'static str] = &[
        "district_id",
        "period",
        "predicted_demand",
        "actual_demand",
        "absolute_error",
        "percent_error",
    ];
}

impl TableRow for BacktestSummary {
    const HEADERS: &'static [&'static str] = &[
        "district_id",
        "periods_tested",
        "mean_absolute_error",
        "mean_percent_error",
    ];
}

impl TableRow for AlertRecord {
    const HEADERS: &'static [&'static str] = &[
        "district_id",
        "period",
        "tier",
        "aups_score",
        "aups_trend",
        "population_trend",
    ];
}

impl TableRow for DistrictRanking {
    const HEADERS: &'static [&'static str] =
        &["rank", "district_id", "period", "score", "normalized_score"];
}

impl TableRow for DistrictFailure {
    const HEADERS: &'static [&'static str] = &["district_id", "stage", "kind", "message"];
}

/// Writes `rows` to a CSV file at `path`, replacing any existing file.
///
/// Paths ending in `.gz` are gzip-compressed. An empty `rows` slice still
/// produces the header row.
pub fn write_table<T: TableRow>(path: &str, rows: &[T]) -> Result<()> {
    let gzip = path.ends_with(".gz");
    debug!(path, rows = rows.len(), gzip, "Writing CSV table");

    let file = File::create(path).with_context(|| format!("failed to create {path}"))?;

    if gzip {
        let encoder = GzEncoder::new(file, Compression::default());
        let encoder = write_rows(encoder, rows)?;
        encoder.finish()?;
    } else {
        write_rows(file, rows)?;
    }

    info!(path, rows = rows.len(), "Table written");
    Ok(())
}

fn write_rows<W: Write, T: TableRow>(sink: W, rows: &[T]) -> Result<W> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(sink);
    if rows.is_empty() {
        writer.write_record(T::HEADERS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV writer: {}", e.error()))
}

/// Serializes `value` as pretty-printed JSON to `path`.
pub fn write_json(path: &str, value: &impl Serialize) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, body).with_context(|| format!("failed to write {path}"))?;
    info!(path, "JSON written");
    Ok(())
}

/// Joins a file name onto an output directory, adding `.gz` when requested.
pub fn table_path(dir: &str, name: &str, gzip: bool) -> String {
    let file = if gzip {
        format!("{name}.csv.gz")
    } else {
        format!("{name}.csv")
    };
    Path::new(dir).join(file).display().to_string()
}
