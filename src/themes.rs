use serde::{Deserialize, Serialize};
use std::fmt;

/// Intent categories inferred from keyword text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    CostCoverage,
    Comparisons,
    HowTo,
    Local,
    Eligibility,
    SuccessRates,
}

/// Theme token lists in enumeration order. Tokens are lowercase substrings.
pub const THEME_TOKENS: &[(Theme, &[&str])] = &[
    (
        Theme::CostCoverage,
        &["cost", "price", "coverage", "insurance", "benefits"],
    ),
    (Theme::Comparisons, &["vs", "versus", "compare", "best"]),
    (Theme::HowTo, &["how", "timeline", "steps", "process"]),
    (Theme::Local, &["near me", "clinic", "doctor", "center"]),
    (
        Theme::Eligibility,
        &["qualify", "requirements", "eligible", "who can"],
    ),
    (Theme::SuccessRates, &["success", "rate", "chances", "age"]),
];

pub const TOP_THEME_LIMIT: usize = 3;

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::CostCoverage => "cost_coverage",
            Theme::Comparisons => "comparisons",
            Theme::HowTo => "how_to",
            Theme::Local => "local",
            Theme::Eligibility => "eligibility",
            Theme::SuccessRates => "success_rates",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn contains_any(text: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|token| text.contains(token))
}

/// Hit counts per theme, kept in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeTally {
    counts: Vec<(Theme, usize)>,
}

impl ThemeTally {
    pub fn from_keywords<'a, I>(keywords: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts: Vec<(Theme, usize)> =
            THEME_TOKENS.iter().map(|(theme, _)| (*theme, 0)).collect();

        for keyword in keywords {
            let lowered = keyword.to_lowercase();
            for ((_, tokens), (_, count)) in THEME_TOKENS.iter().zip(counts.iter_mut()) {
                if contains_any(&lowered, tokens) {
                    *count += 1;
                }
            }
        }

        Self { counts }
    }

    pub fn count(&self, theme: Theme) -> usize {
        self.counts
            .iter()
            .find(|(t, _)| *t == theme)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    /// Themes with at least one hit, most hits first; ties keep enumeration
    /// order.
    pub fn ranked(&self) -> Vec<(Theme, usize)> {
        let mut ranked: Vec<(Theme, usize)> = self
            .counts
            .iter()
            .copied()
            .filter(|(_, count)| *count > 0)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    pub fn top_themes(&self) -> Vec<Theme> {
        self.ranked()
            .into_iter()
            .take(TOP_THEME_LIMIT)
            .map(|(theme, _)| theme)
            .collect()
    }
}

/// Content formats suggested for a keyword. Checked top to bottom; the first
/// rule with a matching token wins.
const ASSET_RULES: &[(&[&str], &str)] = &[
    (
        &["cost", "price", "coverage", "insurance"],
        "Cost/Coverage hub page + FAQ",
    ),
    (&["vs", "versus", "compare", "best"], "Comparison page"),
    (
        &["how", "timeline", "steps", "process"],
        "How-to / Timeline guide",
    ),
    (
        &["success", "rate", "chances", "age"],
        "Success rates explainer (medically reviewed)",
    ),
    (
        &["near me", "clinic", "doctor", "center"],
        "Local intent support page + FAQs",
    ),
];

const FALLBACK_ASSET: &str = "Educational pillar page + supporting FAQs";

pub fn suggest_asset(keyword: &str) -> &'static str {
    let lowered = keyword.to_lowercase();
    ASSET_RULES
        .iter()
        .find(|(tokens, _)| contains_any(&lowered, tokens))
        .map(|(_, asset)| *asset)
        .unwrap_or(FALLBACK_ASSET)
}
