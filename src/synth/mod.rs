pub mod llm;
pub mod rules;

use crate::record::Record;
use crate::report::Insight;

pub use llm::LlmSynthesizer;
pub use rules::RuleBasedSynthesizer;

/// Turns a question and a set of gap records into an insight. Both
/// implementations share the report contract so callers can swap them.
pub trait Synthesizer {
    fn name(&self) -> &'static str;

    fn synthesize(&self, question: &str, gaps: &[Record]) -> Insight;
}
