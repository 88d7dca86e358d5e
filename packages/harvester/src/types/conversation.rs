//! Per-page evaluator conversation log.

/// Ordered exchange log giving the remote evaluator continuity across
/// items on the same page.
///
/// Deliberately not serializable: the conversation lives only in the
/// per-boot page context and dies with the execution context on every
/// navigation. Continuity cannot cross a page boundary, and the evaluator
/// must produce valid decisions from a fresh, empty conversation — the
/// log only biases the model toward consistent criteria application.
#[derive(Debug, Default)]
pub struct Conversation {
    exchanges: Vec<Exchange>,
}

/// A single prior item and the decision rendered for it.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Rendered item text submitted to the evaluator
    pub item_text: String,

    /// Decision plus reasoning as sent back
    pub decision_text: String,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of prior exchanges.
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    /// Whether no exchange has been logged yet.
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Append an exchange after a decision is rendered.
    pub fn push(&mut self, item_text: impl Into<String>, decision_text: impl Into<String>) {
        self.exchanges.push(Exchange {
            item_text: item_text.into(),
            decision_text: decision_text.into(),
        });
    }

    /// Borrow the exchange log.
    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Render the log as a transcript block for inclusion in a prompt.
    ///
    /// Returns an empty string for an empty conversation so prompts can
    /// embed it unconditionally.
    pub fn render(&self) -> String {
        if self.exchanges.is_empty() {
            return String::new();
        }

        let mut out = String::from("Previously on this page you decided:\n");
        for (i, exchange) in self.exchanges.iter().enumerate() {
            out.push_str(&format!(
                "{}. Item:\n{}\nYour decision: {}\n",
                i + 1,
                exchange.item_text,
                exchange.decision_text
            ));
        }
        out
    }
}
