use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Tabular input as it arrives from an export: ordered headers and rows of
/// text cells. Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Builds a table from in-memory data, padding short rows with empty
    /// cells and dropping cells beyond the header count.
    pub fn new<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|row| {
                let mut cells: Vec<String> = row.into_iter().map(Into::into).collect();
                cells.resize(width, String::new());
                cells
            })
            .collect();
        Self { headers, rows }
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let start_time = Instant::now();
        info!(action = "start", component = "csv_load", file_path = ?path, "Loading keyword export");

        if !path.exists() {
            anyhow::bail!("Input file not found: {:?}", path);
        }

        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open input file {:?}", path))?;
        let table = Self::from_reader(file)
            .with_context(|| format!("Failed to parse CSV from {:?}", path))?;

        info!(
            action = "complete",
            component = "csv_load",
            column_count = table.headers.len(),
            row_count = table.rows.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Keyword export loaded"
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .context("Failed to read CSV header row")?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read CSV row {}", index + 1))?;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        Ok(Self::new(headers, rows))
    }
}
