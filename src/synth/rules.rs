use tracing::info;

use super::Synthesizer;
use crate::gaps::total_volume;
use crate::record::Record;
use crate::report::{EstimatedImpact, ImpactEstimate, Insight, Opportunity, Report};
use crate::themes::{suggest_asset, Theme, ThemeTally};

pub const NO_GAPS_SUMMARY: &str = "No gaps found based on current filters.";
const NO_GAPS_IMPACT: &str = "low (insufficient evidence rows)";
const NO_GAPS_ACTIONS: &[&str] = &[
    "Lower the Min Volume filter, or raise the gap threshold to broaden results.",
    "Upload a SEMrush export with more keywords (Keyword Gap / Organic Research / Position Tracking).",
];

pub const MAX_OPPORTUNITIES: usize = 8;
const OPPORTUNITY_NOTE: &str = "Prioritize by volume + intent; treat this as a content brief starter.";

const PILLAR_ACTION: &str = "Create 1–2 pillar pages for the highest-volume missed themes, then add supporting FAQ sections targeting long-tail variants.";

/// Theme-specific actions, appended in this order when the theme is among
/// the top themes.
const THEME_ACTIONS: &[(Theme, &str)] = &[
    (
        Theme::CostCoverage,
        "Build/refresh a 'Cost & Coverage' hub: IVF cost, egg freezing cost, what insurance covers, state-by-state considerations, and employer benefit explainers.",
    ),
    (
        Theme::HowTo,
        "Publish a 'How it works / Timeline' guide with step-by-step sections, eligibility, and what to expect—optimize for 'how/timeline' queries.",
    ),
    (
        Theme::Comparisons,
        "Create comparison pages (e.g., IVF vs surrogacy) with decision frameworks, pros/cons, and FAQ—these often win high-intent searches.",
    ),
    (
        Theme::SuccessRates,
        "Add medically-reviewed success rate content with age bands, definitions, and citations—optimize headings for 'success rate' questions.",
    ),
    (
        Theme::Local,
        "If appropriate, create a location/clinic-finder support page and SEO FAQs for 'near me' intent (often requires local SEO strategy).",
    ),
];

const TACTICAL_ACTIONS: &[&str] = &[
    "For each new/updated page: add a concise definition near the top, a table of contents, and 6–10 FAQ items matching question-style keywords.",
    "Add internal links from your highest-traffic pages to the new hubs using descriptive anchor text.",
    "Track success: top 10 rankings for the cluster, organic entrances to the new pages, and downstream conversion proxy (CTA clicks / lead starts).",
];

const IMPACT_METHOD: &str = "Sum(volume) * 0.05 (rough CTR capture proxy for demo)";
const IMPACT_CONFIDENCE: &str = "low (rule-based prototype estimate)";
/// Share of gap volume assumed to turn into clicks, in percent.
pub const CTR_CAPTURE_PERCENT: u64 = 5;

/// Heuristic synthesizer. Pure and deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedSynthesizer;

impl RuleBasedSynthesizer {
    pub fn new() -> Self {
        Self
    }

    pub fn build_report(&self, question: &str, gaps: &[Record]) -> Report {
        if gaps.is_empty() {
            return no_gaps_report(question);
        }

        let tally = ThemeTally::from_keywords(gaps.iter().map(|g| g.keyword.as_str()));
        let top_themes = tally.top_themes();

        let total = total_volume(gaps);
        let theme_list = if top_themes.is_empty() {
            "general gaps".to_string()
        } else {
            top_themes
                .iter()
                .map(Theme::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };

        Report {
            question: question.to_string(),
            summary: format!(
                "Found {} high-opportunity keywords where current ranking is weaker than the configured threshold. Top themes: {}.",
                gaps.len(),
                theme_list
            ),
            top_opportunities: top_opportunities(gaps),
            recommended_actions: recommended_actions(&top_themes),
            estimated_impact: EstimatedImpact::Estimate(ImpactEstimate {
                method: IMPACT_METHOD.to_string(),
                total_volume_in_gaps: total,
                estimated_additional_clicks_per_month: estimated_clicks(total),
                confidence: IMPACT_CONFIDENCE.to_string(),
            }),
        }
    }
}

impl Synthesizer for RuleBasedSynthesizer {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn synthesize(&self, question: &str, gaps: &[Record]) -> Insight {
        let report = self.build_report(question, gaps);
        info!(
            action = "complete",
            component = "rule_synthesizer",
            opportunity_count = report.top_opportunities.len(),
            action_count = report.recommended_actions.len(),
            "Rule-based report assembled"
        );
        Insight::Report(report)
    }
}

fn no_gaps_report(question: &str) -> Report {
    Report {
        question: question.to_string(),
        summary: NO_GAPS_SUMMARY.to_string(),
        top_opportunities: Vec::new(),
        recommended_actions: NO_GAPS_ACTIONS.iter().map(|s| s.to_string()).collect(),
        estimated_impact: EstimatedImpact::Note(NO_GAPS_IMPACT.to_string()),
    }
}

fn top_opportunities(gaps: &[Record]) -> Vec<Opportunity> {
    let mut by_volume: Vec<&Record> = gaps.iter().collect();
    by_volume.sort_by(|a, b| b.volume.cmp(&a.volume));

    by_volume
        .into_iter()
        .take(MAX_OPPORTUNITIES)
        .map(|gap| Opportunity {
            keyword: gap.keyword.clone(),
            volume: gap.volume,
            current_position: gap.position,
            suggested_asset: suggest_asset(&gap.keyword).to_string(),
            notes: OPPORTUNITY_NOTE.to_string(),
        })
        .collect()
}

fn recommended_actions(top_themes: &[Theme]) -> Vec<String> {
    let mut actions = vec![PILLAR_ACTION.to_string()];
    actions.extend(
        THEME_ACTIONS
            .iter()
            .filter(|(theme, _)| top_themes.contains(theme))
            .map(|(_, action)| action.to_string()),
    );
    actions.extend(TACTICAL_ACTIONS.iter().map(|s| s.to_string()));
    actions
}

pub fn estimated_clicks(total_volume: u64) -> u64 {
    total_volume.saturating_mul(CTR_CAPTURE_PERCENT) / 100
}
