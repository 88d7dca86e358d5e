//! Prompt rendering and tolerant response parsing for evaluator transports.

use serde::Deserialize;

use crate::error::{EvalError, EvalResult};
use crate::traits::evaluator::{ReviewReply, ScreenReply, TriageReply};
use crate::types::conversation::Conversation;
use crate::types::triage::{ReviewDecision, TriageDecision};

/// System prompt for the summary-only triage tier.
pub const TRIAGE_SYSTEM: &str = r#"You screen listing items against the user's matching criteria using only a short card summary.

Output JSON with this structure:
{"decision": "reject" | "keep" | "maybe", "reason": "one sentence"}

- "reject": the summary alone shows the item cannot match
- "keep": the summary alone shows the item clearly matches
- "maybe": the summary is not enough to decide either way

Be decisive from the evidence given. Do not ask for more information."#;

/// System prompt for the full-record review tier.
pub const REVIEW_SYSTEM: &str = r#"You review one complete record against the user's matching criteria.

Output JSON with this structure:
{"decision": "accept" | "reject", "reason": "one sentence"}

Accept only if the full content matches the criteria."#;

/// System prompt for the basic binary screen.
pub const SCREEN_SYSTEM: &str = r#"You decide whether a listing item is worth collecting, given the user's matching criteria.

Output JSON with this structure:
{"download": true | false, "reason": "one sentence"}"#;

/// Render the user message for a triage call.
pub fn format_triage_user(criteria: &str, summary: &str, conversation: &Conversation) -> String {
    format_user(criteria, "Card summary", summary, conversation)
}

/// Render the user message for a review call.
pub fn format_review_user(criteria: &str, detail: &str, conversation: &Conversation) -> String {
    format_user(criteria, "Full record", detail, conversation)
}

/// Render the user message for a screen call.
pub fn format_screen_user(criteria: &str, summary: &str, conversation: &Conversation) -> String {
    format_user(criteria, "Card summary", summary, conversation)
}

fn format_user(criteria: &str, label: &str, body: &str, conversation: &Conversation) -> String {
    let transcript = conversation.render();
    if transcript.is_empty() {
        format!("Matching criteria: {}\n\n{}:\n{}", criteria, label, body)
    } else {
        format!(
            "Matching criteria: {}\n\n{}\n{}:\n{}",
            criteria, transcript, label, body
        )
    }
}

/// Strip a markdown code fence from a model response, if present.
pub fn strip_code_fences(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

#[derive(Deserialize)]
struct DecisionJson {
    decision: String,
    #[serde(default)]
    reason: String,
}

#[derive(Deserialize)]
struct ScreenJson {
    download: bool,
    #[serde(default)]
    reason: String,
}

/// Parse a triage response body into a reply.
pub fn parse_triage_reply(response: &str) -> EvalResult<TriageReply> {
    let parsed = parse_decision_json(response)?;
    let decision = match parsed.decision.trim().to_lowercase().as_str() {
        "reject" => TriageDecision::Reject,
        "keep" => TriageDecision::Keep,
        "maybe" => TriageDecision::Maybe,
        _ => {
            return Err(EvalError::UnrecognizedDecision {
                raw: parsed.decision,
            })
        }
    };
    Ok(TriageReply {
        decision,
        reason: parsed.reason,
    })
}

/// Parse a review response body into a reply.
pub fn parse_review_reply(response: &str) -> EvalResult<ReviewReply> {
    let parsed = parse_decision_json(response)?;
    let decision = match parsed.decision.trim().to_lowercase().as_str() {
        "accept" => ReviewDecision::Accept,
        "reject" => ReviewDecision::Reject,
        _ => {
            return Err(EvalError::UnrecognizedDecision {
                raw: parsed.decision,
            })
        }
    };
    Ok(ReviewReply {
        decision,
        reason: parsed.reason,
    })
}

/// Parse a screen response body into a reply.
pub fn parse_screen_reply(response: &str) -> EvalResult<ScreenReply> {
    if response.trim().is_empty() {
        return Err(EvalError::Empty);
    }
    let parsed: ScreenJson = serde_json::from_str(strip_code_fences(response))
        .map_err(|e| EvalError::Malformed(e.to_string()))?;
    Ok(ScreenReply {
        download: parsed.download,
        reason: parsed.reason,
    })
}

fn parse_decision_json(response: &str) -> EvalResult<DecisionJson> {
    if response.trim().is_empty() {
        return Err(EvalError::Empty);
    }
    serde_json::from_str(strip_code_fences(response)).map_err(|e| EvalError::Malformed(e.to_string()))
}
