use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::args::{Args, Mode};
use crate::chat::{ChatClientConfig, HttpChatClient};
use crate::gaps::find_gaps;
use crate::normalize::normalize_table;
use crate::record::Record;
use crate::report::Insight;
use crate::synth::{LlmSynthesizer, RuleBasedSynthesizer, Synthesizer};
use crate::table::RawTable;
use crate::utils::format_number;

#[derive(Debug)]
pub struct AnalysisResult {
    pub rows_loaded: usize,
    pub records_kept: usize,
    pub gaps: Vec<Record>,
    pub insight: Insight,
}

pub fn build_synthesizer(args: &Args) -> Result<Box<dyn Synthesizer>> {
    match args.mode {
        Mode::Rules => Ok(Box::new(RuleBasedSynthesizer::new())),
        Mode::Llm => {
            let api_key = args
                .api_key
                .clone()
                .context("an API key is required for --mode llm")?;
            let client = HttpChatClient::new(ChatClientConfig {
                api_base: args.api_base.clone(),
                api_key,
                timeout: Duration::from_secs(args.timeout),
                max_retries: args.retries,
            })?;
            let synthesizer = LlmSynthesizer::new(client).with_model(args.model.clone());
            Ok(Box::new(synthesizer))
        }
    }
}

/// Runs one analysis over an already loaded table.
pub fn analyze_table(
    table: &RawTable,
    args: &Args,
    synthesizer: &dyn Synthesizer,
) -> Result<AnalysisResult> {
    let config = args.gap_config();
    config.validate()?;

    let records = normalize_table(table)?;
    let gaps = find_gaps(&records, &config);

    let synth_start = Instant::now();
    let insight = synthesizer.synthesize(&args.question, &gaps);
    info!(
        action = "complete",
        component = "synthesis",
        synthesizer = synthesizer.name(),
        failed = insight.is_failure(),
        duration_ms = synth_start.elapsed().as_millis(),
        "Insight synthesized"
    );

    Ok(AnalysisResult {
        rows_loaded: table.rows.len(),
        records_kept: records.len(),
        gaps,
        insight,
    })
}

pub fn run_analysis(args: &Args) -> Result<AnalysisResult> {
    let total_start_time = Instant::now();
    info!(action = "start", component = "analysis", input = ?args.input, mode = ?args.mode, "Starting gap analysis");

    let table = RawTable::from_csv_path(&args.input)?;
    let synthesizer = build_synthesizer(args)?;
    let result = analyze_table(&table, args, synthesizer.as_ref())?;

    if result.insight.is_failure() {
        warn!(
            action = "complete",
            component = "analysis",
            "Synthesis returned an error object instead of a report"
        );
    }

    info!(
        action = "complete",
        component = "analysis",
        rows_loaded = result.rows_loaded,
        gap_count = result.gaps.len(),
        duration_ms = total_start_time.elapsed().as_millis(),
        "Analysis completed"
    );
    Ok(result)
}

pub fn print_evidence(result: &AnalysisResult) {
    println!("\n--- Keyword Gap Evidence ---");
    println!(
        "Rows loaded: {}, usable keywords: {}, gaps: {}",
        format_number(result.rows_loaded as u64),
        format_number(result.records_kept as u64),
        result.gaps.len()
    );

    if result.gaps.is_empty() {
        println!("No keywords matched the current filters.\n");
        return;
    }

    println!();
    for gap in &result.gaps {
        let position = if gap.is_ranked() {
            format!("#{}", gap.position)
        } else {
            "unranked".to_string()
        };
        let domain = if gap.domain.is_empty() {
            String::new()
        } else {
            format!(" [{}]", gap.domain)
        };
        println!(
            "- {}: {} searches/mo, {}{}",
            gap.keyword,
            format_number(gap.volume),
            position,
            domain
        );
    }
    println!();
}

pub fn write_insight(insight: &Insight, output: Option<&Path>) -> Result<()> {
    let json = insight
        .to_json_pretty()
        .context("Failed to serialize insight")?;

    match output {
        Some(path) => {
            fs::write(path, format!("{}\n", json))
                .with_context(|| format!("Failed to write report to {:?}", path))?;
            info!(action = "write", component = "output", file_path = ?path, "Report written");
        }
        None => println!("{}", json),
    }
    Ok(())
}
