//! Evaluator transport trait: the wire-level remote classification calls.
//!
//! Implementations wrap a specific remote model endpoint and handle
//! prompting and response parsing. The fail-open policy, timeouts, and
//! counter discipline live one layer up in [`crate::evaluator::Evaluator`];
//! transports report failures honestly and let that layer degrade them.

use async_trait::async_trait;

use crate::error::EvalResult;
use crate::types::conversation::Conversation;
use crate::types::triage::{ReviewDecision, TriageDecision};

/// Decision plus reasoning from a triage call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageReply {
    /// The rendered decision
    pub decision: TriageDecision,

    /// Free-text reasoning
    pub reason: String,
}

/// Decision plus reasoning from a full-record review call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewReply {
    /// The rendered decision
    pub decision: ReviewDecision,

    /// Free-text reasoning
    pub reason: String,
}

/// Decision plus reasoning from a basic-mode screen call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenReply {
    /// Whether to collect the item
    pub download: bool,

    /// Free-text reasoning
    pub reason: String,
}

/// Remote classification transport, one call type per tier.
///
/// Every call takes the rendered item text, the user's matching criteria,
/// and the running per-page conversation. The conversation biases the
/// model toward consistent criteria application but is never required: a
/// fresh, empty conversation must still produce valid decisions.
#[async_trait]
pub trait EvaluatorTransport: Send + Sync {
    /// Cheap summary-only triage: reject / keep / maybe.
    async fn triage_call(
        &self,
        summary: &str,
        criteria: &str,
        conversation: &Conversation,
    ) -> EvalResult<TriageReply>;

    /// Full-record review for items triaged `maybe`: accept / reject.
    async fn review_call(
        &self,
        detail: &str,
        criteria: &str,
        conversation: &Conversation,
    ) -> EvalResult<ReviewReply>;

    /// Basic-mode binary screen: download true/false.
    async fn screen_call(
        &self,
        summary: &str,
        criteria: &str,
        conversation: &Conversation,
    ) -> EvalResult<ScreenReply>;
}
