//! One submission, end to end.
//!
//! ```text
//! Idle -> Ingest -> Admission-check -> Dispatch -> Success -> Idle
//!                         |                |
//!                         v                v
//!                     Rejected       Provider-Error
//! ```
//!
//! The user's text (and any file digest) is appended before the admission check and is
//! kept whatever happens afterwards. At most one assistant message is appended per
//! submission, and only on success.
use std::sync::Arc;

use serde::Serialize;

use crate::attachments::{digest_attachments, Attachment};
use crate::budget::{BudgetReport, TokenBudgetGuard};
use crate::errors::{ChatError, ChatResult};
use crate::models::message::Message;
use crate::models::profile::ModelCatalog;
use crate::providers::base::{CompletionRequest, Provider, Usage};
use crate::session::ChatSession;

#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl Submission {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Submission {
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub message: Message,
    pub usage: Usage,
    pub budget: BudgetReport,
}

/// Result of one submission plus any non-fatal attachment warnings
#[derive(Debug)]
pub struct SubmissionReport {
    pub warnings: Vec<String>,
    pub outcome: ChatResult<Reply>,
}

impl SubmissionReport {
    fn refused(error: ChatError) -> Self {
        SubmissionReport {
            warnings: Vec::new(),
            outcome: Err(error),
        }
    }
}

pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    guard: TokenBudgetGuard,
    catalog: ModelCatalog,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn Provider>, guard: TokenBudgetGuard, catalog: ModelCatalog) -> Self {
        Orchestrator {
            provider,
            guard,
            catalog,
        }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn guard(&self) -> &TokenBudgetGuard {
        &self.guard
    }

    /// Budget of the session's current log against its selected model
    pub fn budget(&self, session: &ChatSession) -> ChatResult<BudgetReport> {
        let profile = session.settings.resolve(&self.catalog)?;
        Ok(self.guard.report(session.log.messages(), profile))
    }

    pub async fn submit(&self, session: &mut ChatSession, submission: Submission) -> SubmissionReport {
        if submission.text.trim().is_empty() {
            return SubmissionReport::refused(ChatError::EmptyInput);
        }
        let credential = match session.credential() {
            Some(credential) => credential.clone(),
            None => return SubmissionReport::refused(ChatError::MissingCredential),
        };
        let profile = match session.settings.resolve(&self.catalog) {
            Ok(profile) => profile,
            Err(e) => return SubmissionReport::refused(e),
        };

        // ingest
        session.log.append_user_message(&submission.text);
        let digest = digest_attachments(&submission.attachments);
        if let Some(text) = &digest.text {
            session.log.append_file_digest(text);
        }
        let warnings = digest.warnings;

        // admission check
        let budget = match self.guard.check(session.log.messages(), profile) {
            Ok(budget) => budget,
            Err(e) => {
                tracing::info!(
                    session = session.id(),
                    model = %profile.identifier,
                    error = %e,
                    "submission rejected"
                );
                return SubmissionReport {
                    warnings,
                    outcome: Err(e),
                };
            }
        };

        // dispatch
        tracing::info!(
            session = session.id(),
            model = %profile.identifier,
            estimated_tokens = budget.estimated_tokens,
            reserved_output_tokens = budget.reserved_output_tokens,
            "dispatching completion"
        );
        let request = CompletionRequest {
            model: profile,
            messages: session.log.messages(),
            temperature: session.settings.temperature,
        };
        let outcome = match self.provider.complete(&credential, &request).await {
            Ok((message, usage)) => {
                session.log.append_assistant_message(&message.content);
                Ok(Reply {
                    message,
                    usage,
                    budget,
                })
            }
            Err(e) => {
                tracing::warn!(session = session.id(), kind = %e.kind(), error = %e, "completion failed");
                Err(e)
            }
        };

        SubmissionReport { warnings, outcome }
    }
}
