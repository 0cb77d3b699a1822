use anyhow::Result;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{info, warn};

use super::Synthesizer;
use crate::chat::{ChatCompletion, ChatMessage, ChatRequest, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use crate::record::Record;
use crate::report::{EstimatedImpact, Insight, Opportunity, Report};

pub const REQUIRED_KEYS: &[&str] = &[
    "summary",
    "top_opportunities",
    "recommended_actions",
    "estimated_impact",
];

const SYSTEM_PROMPT: &str = "You are an SEO content strategist. \
Use only the provided keyword data; do not invent keywords, volumes or rankings. \
Answer with a single JSON object and nothing else. \
The object must have exactly these keys: \
\"summary\" (string), \
\"top_opportunities\" (array of objects with keyword, volume, current_position, suggested_asset, notes), \
\"recommended_actions\" (array of strings), \
\"estimated_impact\" (object or string).";

/// Shape the model is asked to return. The question is supplied by the
/// caller, not the model.
#[derive(Debug, Deserialize)]
struct ReplyBody {
    summary: String,
    top_opportunities: Vec<Opportunity>,
    recommended_actions: Vec<String>,
    estimated_impact: EstimatedImpact,
}

/// Delegates report writing to a chat-completion backend.
pub struct LlmSynthesizer<C: ChatCompletion> {
    client: C,
    model: String,
}

impl<C: ChatCompletion> LlmSynthesizer<C> {
    /// The client owns the credential; `HttpChatClient::new` refuses a
    /// blank key.
    pub fn new(client: C) -> Self {
        Self {
            client,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn build_request(&self, question: &str, gaps: &[Record]) -> Result<ChatRequest> {
        let gap_json = serde_json::to_string_pretty(gaps)?;
        let user_prompt = format!(
            "Question:\n{}\n\nKeyword gap data (JSON):\n{}",
            question, gap_json
        );

        Ok(ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user_prompt)],
            temperature: DEFAULT_TEMPERATURE,
        })
    }
}

impl<C: ChatCompletion> Synthesizer for LlmSynthesizer<C> {
    fn name(&self) -> &'static str {
        "llm"
    }

    fn synthesize(&self, question: &str, gaps: &[Record]) -> Insight {
        let start_time = Instant::now();
        info!(
            action = "start",
            component = "llm_synthesizer",
            model = %self.model,
            gap_count = gaps.len(),
            "Requesting model-written report"
        );

        let request = match self.build_request(question, gaps) {
            Ok(request) => request,
            Err(e) => return Insight::failed(format!("failed to build request: {}", e), ""),
        };

        let insight = match self.client.complete(&request) {
            Ok(reply) => parse_reply(question, &reply),
            Err(e) => Insight::failed(format!("chat completion failed: {}", e), e.raw_body()),
        };

        if let Insight::Failed(failure) = &insight {
            warn!(
                action = "complete",
                component = "llm_synthesizer",
                error = %failure.error,
                duration_ms = start_time.elapsed().as_millis(),
                "Model reply could not be used"
            );
        } else {
            info!(
                action = "complete",
                component = "llm_synthesizer",
                duration_ms = start_time.elapsed().as_millis(),
                "Model report parsed"
            );
        }
        insight
    }
}

fn code_fence() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n(.*?)\n?\s*```\s*$").ok())
        .as_ref()
}

/// Returns the JSON text inside a Markdown code fence, or the reply itself.
pub fn strip_code_fence(reply: &str) -> &str {
    code_fence()
        .and_then(|fence| fence.captures(reply))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(reply)
        .trim()
}

/// Parses a model reply into a report. Anything unusable comes back as a
/// failure that carries the raw reply.
pub fn parse_reply(question: &str, reply: &str) -> Insight {
    let value: serde_json::Value = match serde_json::from_str(strip_code_fence(reply)) {
        Ok(value) => value,
        Err(e) => return Insight::failed(format!("reply was not valid JSON: {}", e), reply),
    };

    let Some(object) = value.as_object() else {
        return Insight::failed("reply JSON is not an object", reply);
    };

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !object.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Insight::failed(
            format!("reply is missing required keys: {}", missing.join(", ")),
            reply,
        );
    }

    match serde_json::from_value::<ReplyBody>(value) {
        Ok(body) => Insight::Report(Report {
            question: question.to_string(),
            summary: body.summary,
            top_opportunities: body.top_opportunities,
            recommended_actions: body.recommended_actions,
            estimated_impact: body.estimated_impact,
        }),
        Err(e) => Insight::failed(format!("reply has an unexpected shape: {}", e), reply),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatError;
    use std::cell::RefCell;

    /// Replays a canned reply and records the request it was given.
    struct StubChat {
        reply: Result<String, (u16, String)>,
        seen: RefCell<Option<ChatRequest>>,
    }

    impl StubChat {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                seen: RefCell::new(None),
            }
        }

        fn failing(status: u16, body: &str) -> Self {
            Self {
                reply: Err((status, body.to_string())),
                seen: RefCell::new(None),
            }
        }
    }

    impl ChatCompletion for StubChat {
        fn complete(&self, request: &ChatRequest) -> Result<String, ChatError> {
            *self.seen.borrow_mut() = Some(request.clone());
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err((status, body)) => Err(ChatError::Status {
                    status: *status,
                    body: body.clone(),
                }),
            }
        }
    }

    const GOOD_REPLY: &str = r#"{
        "summary": "Two cost gaps.",
        "top_opportunities": [{"keyword": "ivf cost", "volume": 500, "current_position": 35,
                               "suggested_asset": "Cost hub", "notes": "high intent"}],
        "recommended_actions": ["Write the cost hub."],
        "estimated_impact": "moderate"
    }"#;

    #[test]
    fn request_carries_persona_question_and_gap_data() {
        let synthesizer = LlmSynthesizer::new(StubChat::replying(GOOD_REPLY));
        let gaps = vec![Record::new("ivf cost", 500, 35)];
        synthesizer.synthesize("What are we missing?", &gaps);

        let request = synthesizer.client.seen.borrow().clone().unwrap();
        assert_eq!(request.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(request.messages[0].role, "system");
        assert!(request.messages[0].content.contains("Use only the provided keyword data"));
        for key in REQUIRED_KEYS {
            assert!(request.messages[0].content.contains(key));
        }
        assert!(request.messages[1].content.contains("What are we missing?"));
        assert!(request.messages[1].content.contains("\"keyword\": \"ivf cost\""));
    }

    #[test]
    fn valid_reply_becomes_report_with_question() {
        let synthesizer = LlmSynthesizer::new(StubChat::replying(GOOD_REPLY)).with_model("gpt-4o");
        let insight = synthesizer.synthesize("q?", &[]);
        let report = insight.report().expect("report");

        assert_eq!(report.question, "q?");
        assert_eq!(report.top_opportunities[0].current_position, 35);
        assert_eq!(report.estimated_impact, EstimatedImpact::Note("moderate".into()));
        assert_eq!(synthesizer.client.seen.borrow().as_ref().unwrap().model, "gpt-4o");
    }

    #[test]
    fn non_json_reply_is_wrapped_not_raised() {
        let insight = parse_reply("q", "I'm sorry, I can't help with that.");
        let value = serde_json::to_value(&insight).unwrap();

        assert!(value["error"].as_str().unwrap().starts_with("reply was not valid JSON"));
        assert_eq!(value["raw_response"], "I'm sorry, I can't help with that.");
    }

    #[test]
    fn missing_keys_are_reported() {
        let insight = parse_reply("q", r#"{"summary": "only this"}"#);
        match insight {
            Insight::Failed(failure) => {
                assert!(failure.error.contains("top_opportunities"));
                assert!(failure.error.contains("estimated_impact"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn wrong_types_are_reported() {
        let reply = r#"{"summary": "s", "top_opportunities": "none",
                        "recommended_actions": [], "estimated_impact": "low"}"#;
        assert!(parse_reply("q", reply).is_failure());
    }

    #[test]
    fn fenced_reply_is_unwrapped() {
        let fenced = format!("```json\n{}\n```", GOOD_REPLY);
        assert!(!parse_reply("q", &fenced).is_failure());
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn transport_failure_embeds_body() {
        let synthesizer = LlmSynthesizer::new(StubChat::failing(500, "upstream exploded"));
        match synthesizer.synthesize("q", &[]) {
            Insight::Failed(failure) => {
                assert!(failure.error.contains("HTTP 500"));
                assert_eq!(failure.raw_response, "upstream exploded");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
