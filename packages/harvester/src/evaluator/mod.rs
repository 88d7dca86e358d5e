//! The AI evaluator: fail-open wrapper over the remote transport.
//!
//! The transport reports failures honestly; this layer is where every one
//! of them — network error, timeout, malformed body, unrecognized
//! decision — resolves to the permissive outcome. Over-inclusion is
//! recoverable by the user; silent data loss is not.

pub mod openai;
pub mod prompts;

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{EvalError, EvalResult};
use crate::traits::evaluator::{EvaluatorTransport, ReviewReply, ScreenReply, TriageReply};
use crate::types::conversation::Conversation;
use crate::types::triage::{ReviewDecision, TriageDecision};

pub use openai::OpenAiTransport;

/// Reason attached to decisions produced by fail-open degradation.
pub const FAIL_OPEN_REASON: &str = "evaluation unavailable; included to avoid losing a match";

/// Fail-open evaluator over a transport.
///
/// Bounds each call with its tier's timeout (short for triage, longer for
/// the full-record review) and appends every rendered decision to the
/// per-page conversation.
pub struct Evaluator<T> {
    transport: T,
    triage_timeout: Duration,
    review_timeout: Duration,
}

impl<T: EvaluatorTransport> Evaluator<T> {
    /// Create an evaluator with default tier timeouts.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            triage_timeout: Duration::from_millis(15_000),
            review_timeout: Duration::from_millis(45_000),
        }
    }

    /// Set the per-tier timeouts.
    pub fn with_timeouts(mut self, triage: Duration, review: Duration) -> Self {
        self.set_timeouts(triage, review);
        self
    }

    /// Adjust the per-tier timeouts in place.
    pub fn set_timeouts(&mut self, triage: Duration, review: Duration) {
        self.triage_timeout = triage;
        self.review_timeout = review;
    }

    /// Triage an item from its card summary. Never fails: degrades to
    /// `keep` so the full record gets a look.
    pub async fn triage(
        &self,
        summary: &str,
        criteria: &str,
        conversation: &mut Conversation,
    ) -> TriageReply {
        let outcome = flatten(
            timeout(
                self.triage_timeout,
                self.transport.triage_call(summary, criteria, conversation),
            )
            .await,
            self.triage_timeout,
        );

        let reply = match outcome {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "triage call failed; failing open to keep");
                TriageReply {
                    decision: TriageDecision::Keep,
                    reason: FAIL_OPEN_REASON.to_string(),
                }
            }
        };

        debug!(decision = %reply.decision, "triage decision");
        conversation.push(summary, format!("{}: {}", reply.decision, reply.reason));
        reply
    }

    /// Review an item from its full record. Never fails: degrades to
    /// `accept`.
    pub async fn review(
        &self,
        detail: &str,
        criteria: &str,
        conversation: &mut Conversation,
    ) -> ReviewReply {
        let outcome = flatten(
            timeout(
                self.review_timeout,
                self.transport.review_call(detail, criteria, conversation),
            )
            .await,
            self.review_timeout,
        );

        let reply = match outcome {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "review call failed; failing open to accept");
                ReviewReply {
                    decision: ReviewDecision::Accept,
                    reason: FAIL_OPEN_REASON.to_string(),
                }
            }
        };

        debug!(decision = %reply.decision, "review decision");
        conversation.push(detail, format!("{}: {}", reply.decision, reply.reason));
        reply
    }

    /// Basic-mode binary screen. Never fails: degrades to `download`.
    pub async fn screen(
        &self,
        summary: &str,
        criteria: &str,
        conversation: &mut Conversation,
    ) -> ScreenReply {
        let outcome = flatten(
            timeout(
                self.triage_timeout,
                self.transport.screen_call(summary, criteria, conversation),
            )
            .await,
            self.triage_timeout,
        );

        let reply = match outcome {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "screen call failed; failing open to download");
                ScreenReply {
                    download: true,
                    reason: FAIL_OPEN_REASON.to_string(),
                }
            }
        };

        let decision_text = if reply.download { "download" } else { "skip" };
        debug!(decision = decision_text, "screen decision");
        conversation.push(summary, format!("{}: {}", decision_text, reply.reason));
        reply
    }
}

fn flatten<R>(
    result: Result<EvalResult<R>, tokio::time::error::Elapsed>,
    waited: Duration,
) -> EvalResult<R> {
    match result {
        Ok(inner) => inner,
        Err(_) => Err(EvalError::Timeout {
            waited_ms: waited.as_millis() as u64,
        }),
    }
}
