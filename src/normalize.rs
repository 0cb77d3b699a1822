use anyhow::Result;
use std::time::Instant;
use tracing::{debug, info};

use crate::record::{Record, UNRANKED_POSITION};
use crate::table::RawTable;

/// Canonical fields and the source column names accepted for each, in
/// priority order. The canonical name itself always comes first.
const VOLUME_ALIASES: &[&str] = &[
    "volume",
    "vol",
    "search_volume",
    "search volume",
    "monthly_volume",
];
const POSITION_ALIASES: &[&str] = &["position", "pos", "rank"];
const URL_ALIASES: &[&str] = &["url"];
const DOMAIN_ALIASES: &[&str] = &["domain"];

/// Column indices resolved for one table. `None` means the field falls back
/// to its default for every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub keyword: usize,
    pub volume: Option<usize>,
    pub position: Option<usize>,
    pub url: Option<usize>,
    pub domain: Option<usize>,
}

pub fn canonical_column_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Returns the first unclaimed column matching one of `aliases`, trying the
/// aliases in order.
fn resolve_column(columns: &[String], aliases: &[&str], claimed: &mut Vec<usize>) -> Option<usize> {
    let found = aliases.iter().find_map(|alias| {
        columns
            .iter()
            .enumerate()
            .find(|(index, name)| name.as_str() == *alias && !claimed.contains(index))
            .map(|(index, _)| index)
    })?;
    claimed.push(found);
    Some(found)
}

pub fn resolve_columns(headers: &[String]) -> Result<ColumnMap> {
    if headers.is_empty() {
        anyhow::bail!("Input table has no columns");
    }

    let columns: Vec<String> = headers.iter().map(|h| canonical_column_name(h)).collect();
    let mut claimed = Vec::new();

    let keyword = resolve_column(&columns, &["keyword"], &mut claimed).unwrap_or_else(|| {
        claimed.push(0);
        0
    });

    Ok(ColumnMap {
        keyword,
        volume: resolve_column(&columns, VOLUME_ALIASES, &mut claimed),
        position: resolve_column(&columns, POSITION_ALIASES, &mut claimed),
        url: resolve_column(&columns, URL_ALIASES, &mut claimed),
        domain: resolve_column(&columns, DOMAIN_ALIASES, &mut claimed),
    })
}

/// Parses a numeric cell the way spreadsheet exports write them: integers,
/// or decimals truncated toward zero. Anything else is `None`.
fn parse_integer(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    if let Ok(value) = cell.parse::<i64>() {
        return Some(value);
    }
    match cell.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value.trunc() as i64),
        _ => None,
    }
}

pub fn parse_volume(cell: &str) -> u64 {
    match parse_integer(cell) {
        Some(value) if value >= 0 => value as u64,
        _ => 0,
    }
}

/// Ranks start at 1. A zero or negative rank is treated like a missing one
/// and becomes `UNRANKED_POSITION`, so such rows can surface as gaps.
pub fn parse_position(cell: &str) -> u32 {
    match parse_integer(cell) {
        Some(value) if value >= 1 => u32::try_from(value).unwrap_or(UNRANKED_POSITION),
        _ => UNRANKED_POSITION,
    }
}

fn cell<'a>(row: &'a [String], column: Option<usize>) -> Option<&'a str> {
    column.and_then(|index| row.get(index)).map(String::as_str)
}

/// Maps a raw export onto canonical records. Malformed values degrade to
/// defaults; only a table without columns is an error.
pub fn normalize_table(table: &RawTable) -> Result<Vec<Record>> {
    let start_time = Instant::now();
    let columns = resolve_columns(&table.headers)?;
    info!(
        action = "resolve",
        component = "normalizer",
        keyword_column = %table.headers[columns.keyword].trim(),
        volume_column = columns.volume.is_some(),
        position_column = columns.position.is_some(),
        "Resolved canonical columns"
    );

    let mut records = Vec::with_capacity(table.rows.len());
    let mut dropped = 0usize;

    for row in &table.rows {
        let keyword = cell(row, Some(columns.keyword)).unwrap_or_default();
        if keyword.trim().is_empty() {
            dropped += 1;
            continue;
        }

        records.push(Record {
            keyword: keyword.to_string(),
            volume: cell(row, columns.volume).map(parse_volume).unwrap_or(0),
            position: cell(row, columns.position)
                .map(parse_position)
                .unwrap_or(UNRANKED_POSITION),
            url: cell(row, columns.url).unwrap_or_default().to_string(),
            domain: cell(row, columns.domain).unwrap_or_default().to_string(),
        });
    }

    if dropped > 0 {
        debug!(
            action = "drop",
            component = "normalizer",
            dropped_rows = dropped,
            "Dropped rows without a keyword"
        );
    }

    info!(
        action = "complete",
        component = "normalizer",
        record_count = records.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Normalization completed"
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().copied(),
            rows.iter().map(|row| row.iter().copied()),
        )
    }

    #[test]
    fn canonical_headers_are_matched_case_and_space_insensitively() {
        let t = table(
            &[" Keyword ", "VOLUME", "Position", "URL", " Domain"],
            &[&["ivf cost", "500", "35", "https://a.example/ivf", "a.example"]],
        );
        let records = normalize_table(&t).unwrap();

        assert_eq!(
            records,
            vec![Record {
                keyword: "ivf cost".into(),
                volume: 500,
                position: 35,
                url: "https://a.example/ivf".into(),
                domain: "a.example".into(),
            }]
        );
    }

    #[test]
    fn first_column_stands_in_for_missing_keyword() {
        let t = table(&["Query", "Search Volume", "Rank"], &[&["egg freezing", "1200", "41"]]);
        let records = normalize_table(&t).unwrap();

        assert_eq!(records[0].keyword, "egg freezing");
        assert_eq!(records[0].volume, 1200);
        assert_eq!(records[0].position, 41);
    }

    #[test]
    fn aliases_follow_priority_order() {
        let t = table(
            &["keyword", "monthly_volume", "vol", "rank", "pos"],
            &[&["ivf", "10", "20", "7", "3"]],
        );
        let map = resolve_columns(&t.headers).unwrap();

        assert_eq!(map.volume, Some(2));
        assert_eq!(map.position, Some(4));
    }

    #[test]
    fn keyword_fallback_claims_its_column() {
        let t = table(&["volume", "position"], &[&["ivf cost", "12"]]);
        let map = resolve_columns(&t.headers).unwrap();

        assert_eq!(map.keyword, 0);
        assert_eq!(map.volume, None);
        assert_eq!(map.position, Some(1));
    }

    #[test]
    fn missing_columns_take_defaults() {
        let t = table(&["keyword"], &[&["ivf success rate"]]);
        let records = normalize_table(&t).unwrap();

        assert_eq!(records[0].volume, 0);
        assert_eq!(records[0].position, UNRANKED_POSITION);
        assert!(records[0].url.is_empty());
        assert!(records[0].domain.is_empty());
    }

    #[test]
    fn unparsable_numbers_degrade_to_defaults() {
        assert_eq!(parse_volume("n/a"), 0);
        assert_eq!(parse_volume("-40"), 0);
        assert_eq!(parse_volume(" 880 "), 880);
        assert_eq!(parse_volume("1500.9"), 1500);
        assert_eq!(parse_position(""), UNRANKED_POSITION);
        assert_eq!(parse_position("0"), UNRANKED_POSITION);
        assert_eq!(parse_position("12.0"), 12);
        assert_eq!(parse_position("NaN"), UNRANKED_POSITION);
    }

    #[test]
    fn blank_keywords_are_dropped() {
        let t = table(&["keyword", "volume"], &[&["  ", "900"], &["ivf", "100"]]);
        let records = normalize_table(&t).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].keyword, "ivf");
    }

    #[test]
    fn zero_columns_is_fatal() {
        let t = RawTable::default();
        assert!(normalize_table(&t).is_err());
    }

    #[test]
    fn input_table_is_left_untouched() {
        let t = table(&[" Keyword "], &[&["ivf"]]);
        let before = t.clone();
        normalize_table(&t).unwrap();
        assert_eq!(t, before);
    }
}
