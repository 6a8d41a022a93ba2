//! Context-window admission control.
//!
//! Before anything is sent to a provider the guard estimates what the conversation will
//! cost in tokens and refuses the request when that estimate plus the model's reserved
//! output would not fit in the context window. A refused request never reaches the
//! network.
use serde::{Deserialize, Serialize};

use crate::errors::{ChatError, ChatResult};
use crate::models::message::Message;
use crate::models::profile::{Encoding, FramingCosts, ModelProfile};
use crate::token_counter::TokenCounter;

/// Outcome of a successful admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetReport {
    pub estimated_tokens: usize,
    pub reserved_output_tokens: usize,
    pub context_window_tokens: usize,
}

impl BudgetReport {
    pub fn projected(&self) -> usize {
        self.estimated_tokens + self.reserved_output_tokens
    }

    pub fn remaining(&self) -> usize {
        self.context_window_tokens.saturating_sub(self.projected())
    }

    pub fn fits(&self) -> bool {
        self.projected() <= self.context_window_tokens
    }
}

pub struct TokenBudgetGuard {
    counter: TokenCounter,
}

impl TokenBudgetGuard {
    pub fn new() -> ChatResult<Self> {
        Ok(TokenBudgetGuard {
            counter: TokenCounter::new()?,
        })
    }

    pub fn with_counter(counter: TokenCounter) -> Self {
        TokenBudgetGuard { counter }
    }

    /// Approximate prompt cost of `log` for the model named by `model_identifier`.
    pub fn estimate_tokens(&self, log: &[Message], model_identifier: &str) -> usize {
        self.estimate_with(
            log,
            model_identifier,
            Encoding::for_identifier(model_identifier),
            FramingCosts::for_identifier(model_identifier),
        )
    }

    /// Same as [`estimate_tokens`](Self::estimate_tokens) but uses the encoding and
    /// framing constants declared on the profile.
    pub fn estimate_for_profile(&self, log: &[Message], profile: &ModelProfile) -> usize {
        self.estimate_with(log, &profile.identifier, profile.encoding, profile.framing)
    }

    fn estimate_with(
        &self,
        log: &[Message],
        model_identifier: &str,
        encoding: Encoding,
        framing: FramingCosts,
    ) -> usize {
        if framing.approximate {
            tracing::warn!(
                model = model_identifier,
                "framing token constants are not verified for this model; estimate is approximate"
            );
        }

        let mut total = 0;
        for message in log {
            // role and content are both encoded, plus the delimiters around them
            total += framing.per_message;
            total += self.counter.count_tokens(message.role.as_str(), encoding);
            total += self.counter.count_tokens(&message.content, encoding);
        }
        total + framing.reply_priming
    }

    pub fn report(&self, log: &[Message], profile: &ModelProfile) -> BudgetReport {
        BudgetReport {
            estimated_tokens: self.estimate_for_profile(log, profile),
            reserved_output_tokens: profile.max_output_tokens,
            context_window_tokens: profile.context_window_tokens,
        }
    }

    pub fn can_submit(&self, log: &[Message], profile: &ModelProfile) -> bool {
        self.report(log, profile).fits()
    }

    /// Typed form of [`can_submit`](Self::can_submit)
    pub fn check(&self, log: &[Message], profile: &ModelProfile) -> ChatResult<BudgetReport> {
        let report = self.report(log, profile);
        if report.fits() {
            Ok(report)
        } else {
            Err(ChatError::AdmissionRejected {
                estimated: report.estimated_tokens,
                reserved: report.reserved_output_tokens,
                window: report.context_window_tokens,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::ModelCatalog;

    fn guard() -> TokenBudgetGuard {
        TokenBudgetGuard::new().unwrap()
    }

    #[test]
    fn test_empty_log_costs_reply_priming() {
        let guard = guard();
        assert_eq!(guard.estimate_tokens(&[], "gpt-4o"), 2);
        assert_eq!(guard.estimate_tokens(&[], "gpt-4"), 2);
    }

    #[test]
    fn test_single_message_accounting() {
        let guard = guard();
        let log = vec![Message::user().with_text("hello")];
        // 4 framing + "user" (1) + "hello" (1) + 2 priming
        assert_eq!(guard.estimate_tokens(&log, "gpt-4o"), 8);
    }

    #[test]
    fn test_gpt4o_accepts_short_message() {
        let guard = guard();
        let catalog = ModelCatalog::builtin();
        let log = vec![Message::user().with_text("hello")];
        assert!(guard.can_submit(&log, catalog.get("gpt-4o").unwrap()));
    }

    #[test]
    fn test_zero_margin_model_rejects_everything() {
        let guard = guard();
        let catalog = ModelCatalog::builtin();
        let gpt4 = catalog.get("gpt-4").unwrap();

        let log = vec![Message::user().with_text("hi")];
        assert!(!guard.can_submit(&log, gpt4));
        // empty log still carries the reply priming
        assert!(!guard.can_submit(&[], gpt4));

        match guard.check(&log, gpt4) {
            Err(ChatError::AdmissionRejected {
                reserved, window, ..
            }) => {
                assert_eq!(reserved, 8192);
                assert_eq!(window, 8192);
            }
            other => panic!("expected admission rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_boundary_equality_is_admitted() {
        let guard = guard();
        let log = vec![Message::user().with_text("hello")];
        let estimate = guard.estimate_tokens(&log, "gpt-4o");

        let exact = ModelProfile::new("gpt-4o", "exact fit", estimate + 100, 100);
        assert!(guard.can_submit(&log, &exact));
        let report = guard.check(&log, &exact).unwrap();
        assert_eq!(report.remaining(), 0);

        let short = ModelProfile::new("gpt-4o", "one short", estimate + 99, 100);
        assert!(!guard.can_submit(&log, &short));
    }

    #[test]
    fn test_special_token_markup_is_never_under_counted() {
        let guard = guard();
        let content = "<|endoftext|>".repeat(100);
        let log = vec![Message::user().with_text(&content)];

        for (model, encoder) in [
            ("gpt-4", tiktoken_rs::cl100k_base().unwrap()),
            ("gpt-4o", tiktoken_rs::o200k_base().unwrap()),
        ] {
            let billed = encoder.encode_ordinary(&content).len();
            assert!(guard.estimate_tokens(&log, model) >= billed);
        }
    }

    #[test]
    fn test_estimate_is_monotonic_and_deterministic() {
        let guard = guard();
        let mut log = Vec::new();
        let mut previous = guard.estimate_tokens(&log, "gpt-4o-mini");
        for text in ["first question", "", "a much longer follow-up question with detail"] {
            log.push(Message::user().with_text(text));
            let current = guard.estimate_tokens(&log, "gpt-4o-mini");
            assert!(current >= previous);
            assert_eq!(current, guard.estimate_tokens(&log, "gpt-4o-mini"));
            previous = current;
        }
    }

    #[test]
    fn test_profile_and_identifier_estimates_agree_for_builtins() {
        let guard = guard();
        let log = vec![
            Message::user().with_text("What is a context window?"),
            Message::assistant().with_text("The maximum number of tokens per request."),
        ];
        for profile in ModelCatalog::builtin().profiles() {
            assert_eq!(
                guard.estimate_for_profile(&log, profile),
                guard.estimate_tokens(&log, &profile.identifier)
            );
        }
    }
}
