pub mod analysis;
pub mod args;
pub mod chat;
pub mod gaps;
pub mod normalize;
pub mod record;
pub mod report;
pub mod synth;
pub mod table;
pub mod themes;
pub mod utils;

pub use analysis::{analyze_table, run_analysis, AnalysisResult};
pub use args::Args;
pub use gaps::{find_gaps, GapConfig};
pub use normalize::normalize_table;
pub use record::Record;
pub use report::{Insight, Report};
pub use synth::{LlmSynthesizer, RuleBasedSynthesizer, Synthesizer};
pub use table::RawTable;
pub use themes::{suggest_asset, Theme, ThemeTally};
