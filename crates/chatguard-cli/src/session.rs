use anyhow::Result;

use chatguard::attachments::Attachment;
use chatguard::errors::ErrorKind;
use chatguard::orchestrator::{Orchestrator, Submission};
use chatguard::session::ChatSession;

use crate::commands::{self, Command, HELP};
use crate::inputs::load_attachment;
use crate::prompt::Prompt;

pub struct Session<'a> {
    orchestrator: &'a Orchestrator,
    chat: ChatSession,
    prompt: Box<dyn Prompt + 'a>,
    pending: Vec<Attachment>,
}

impl<'a> Session<'a> {
    pub fn new(
        orchestrator: &'a Orchestrator,
        chat: ChatSession,
        prompt: Box<dyn Prompt + 'a>,
        pending: Vec<Attachment>,
    ) -> Self {
        Session {
            orchestrator,
            chat,
            prompt,
            pending,
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        self.setup_session();

        loop {
            let line = self.prompt.get_input()?;
            match commands::parse(&line) {
                Ok(Command::Exit) => break,
                Ok(Command::AskAgain) => continue,
                Ok(Command::Message(text)) => self.submit(text).await,
                Ok(command) => self.run_command(command),
                Err(usage) => self.prompt.render_error(&usage),
            }
        }

        self.prompt.close();
        Ok(())
    }

    fn setup_session(&mut self) {
        self.prompt.render_notice(&format!(
            "Chatting with {} (temperature {}). Type /? for help, \"exit\" to end the session.",
            self.chat.settings.model, self.chat.settings.temperature
        ));
        if !self.chat.has_credential() {
            self.prompt.render_warning(
                "Please provide your OpenAI API Key (--api-key or OPENAI_API_KEY) to use the application.",
            );
        }
        for attachment in &self.pending {
            self.prompt
                .render_notice(&format!("{} will be sent with your first message", attachment.name));
        }
    }

    async fn submit(&mut self, text: String) {
        let attachments = std::mem::take(&mut self.pending);

        self.prompt.show_busy();
        let report = self
            .orchestrator
            .submit(
                &mut self.chat,
                Submission {
                    text,
                    attachments: attachments.clone(),
                },
            )
            .await;
        self.prompt.hide_busy();

        for warning in &report.warnings {
            self.prompt.render_warning(warning);
        }
        match report.outcome {
            Ok(reply) => self.prompt.render(&reply.message),
            Err(e) => {
                // nothing was ingested, so the files are still waiting for a message
                if e.kind() == ErrorKind::InvalidRequest {
                    self.pending = attachments;
                }
                self.prompt.render_error(&e.to_string());
            }
        }
    }

    fn run_command(&mut self, command: Command) {
        match command {
            Command::Help => self.prompt.render_notice(HELP),
            Command::Attach(path) => match load_attachment(&path) {
                Ok(attachment) => {
                    self.prompt
                        .render_notice(&format!("Attached {}", attachment.name));
                    self.pending.push(attachment);
                }
                Err(e) => self.prompt.render_error(&e.to_string()),
            },
            Command::History => {
                if self.chat.log.is_empty() {
                    self.prompt.render_notice("No messages yet");
                } else {
                    let transcript = self.chat.log.render();
                    self.prompt.render_markdown(&transcript);
                }
            }
            Command::Models => {
                let lines: Vec<String> = self
                    .orchestrator
                    .catalog()
                    .profiles()
                    .iter()
                    .map(|p| {
                        let marker = if p.identifier == self.chat.settings.model {
                            "*"
                        } else {
                            " "
                        };
                        format!(
                            "{} {:<12} context {:>6}  max output {:>6}  {}",
                            marker,
                            p.identifier,
                            p.context_window_tokens,
                            p.max_output_tokens,
                            p.label
                        )
                    })
                    .collect();
                self.prompt.render_notice(&lines.join("\n"));
            }
            Command::Model(id) => {
                match self.chat.set_model(self.orchestrator.catalog(), &id) {
                    Ok(()) => self.prompt.render_notice(&format!("Switched to {}", id)),
                    Err(e) => self.prompt.render_error(&e.to_string()),
                }
            }
            Command::Temperature(value) => match self.chat.set_temperature(value) {
                Ok(()) => self
                    .prompt
                    .render_notice(&format!("Temperature set to {}", value)),
                Err(e) => self.prompt.render_error(&e.to_string()),
            },
            Command::Budget => match self.orchestrator.budget(&self.chat) {
                Ok(report) => {
                    let text = format!(
                        "{} input + {} reserved output = {} of {} tokens ({} to spare)",
                        report.estimated_tokens,
                        report.reserved_output_tokens,
                        report.projected(),
                        report.context_window_tokens,
                        report.remaining()
                    );
                    if report.fits() {
                        self.prompt.render_notice(&text);
                    } else {
                        self.prompt.render_warning(&text);
                    }
                }
                Err(e) => self.prompt.render_error(&e.to_string()),
            },
            Command::Message(_) | Command::Exit | Command::AskAgain => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chatguard::budget::TokenBudgetGuard;
    use chatguard::errors::{ChatError, ChatResult};
    use chatguard::models::message::Message;
    use chatguard::models::profile::ModelCatalog;
    use chatguard::providers::base::{CompletionRequest, Credential, Provider, Usage};
    use chatguard::session::SessionSettings;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::sync::Arc;

    struct EchoProvider;

    #[async_trait]
    impl Provider for EchoProvider {
        async fn complete(
            &self,
            _credential: &Credential,
            request: &CompletionRequest<'_>,
        ) -> ChatResult<(Message, Usage)> {
            let last = request
                .messages
                .last()
                .ok_or_else(|| ChatError::Unclassified("no messages".into()))?;
            Ok((
                Message::assistant().with_text(format!("echo: {}", last.content)),
                Usage::default(),
            ))
        }
    }

    /// Feeds scripted input lines and records everything shown
    struct ScriptedPrompt {
        inputs: VecDeque<String>,
        output: Rc<RefCell<Vec<String>>>,
    }

    impl ScriptedPrompt {
        fn new(inputs: &[&str]) -> (Self, Rc<RefCell<Vec<String>>>) {
            let output = Rc::new(RefCell::new(Vec::new()));
            let prompt = ScriptedPrompt {
                inputs: inputs.iter().map(|s| s.to_string()).collect(),
                output: output.clone(),
            };
            (prompt, output)
        }

        fn record(&self, kind: &str, text: &str) {
            self.output.borrow_mut().push(format!("{}: {}", kind, text));
        }
    }

    impl Prompt for ScriptedPrompt {
        fn render(&mut self, message: &Message) {
            self.record(message.role.as_str(), &message.content);
        }
        fn render_markdown(&mut self, text: &str) {
            self.record("markdown", text);
        }
        fn render_notice(&mut self, text: &str) {
            self.record("notice", text);
        }
        fn render_warning(&mut self, text: &str) {
            self.record("warning", text);
        }
        fn render_error(&mut self, text: &str) {
            self.record("error", text);
        }
        fn get_input(&mut self) -> Result<String> {
            Ok(self.inputs.pop_front().unwrap_or_else(|| "exit".to_string()))
        }
        fn show_busy(&mut self) {}
        fn hide_busy(&mut self) {}
        fn close(&self) {}
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(
            Arc::new(EchoProvider),
            TokenBudgetGuard::new().unwrap(),
            ModelCatalog::builtin(),
        )
    }

    fn keyed_chat() -> ChatSession {
        ChatSession::new(SessionSettings::default()).with_credential(Credential::new("sk-test"))
    }

    #[tokio::test]
    async fn test_message_round_trip() -> Result<()> {
        let orchestrator = orchestrator();
        let (prompt, output) = ScriptedPrompt::new(&["hello", "/history"]);
        let mut session = Session::new(&orchestrator, keyed_chat(), Box::new(prompt), vec![]);

        session.start().await?;

        let output = output.borrow();
        assert!(output.contains(&"assistant: echo: hello".to_string()));
        assert!(output.contains(&"markdown: > hello\n\n**Assistant:** echo: hello".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_slash_messages_are_sent_as_typed() -> Result<()> {
        let orchestrator = orchestrator();
        let (prompt, output) = ScriptedPrompt::new(&["//etc/hosts is broken? "]);
        let mut session = Session::new(&orchestrator, keyed_chat(), Box::new(prompt), vec![]);

        session.start().await?;

        assert_eq!(session.chat.log.messages()[0].content, "/etc/hosts is broken? ");
        let output = output.borrow();
        assert!(output.contains(&"assistant: echo: /etc/hosts is broken? ".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_key_keeps_pending_files() -> Result<()> {
        let orchestrator = orchestrator();
        let (prompt, output) = ScriptedPrompt::new(&["hello"]);
        let pending = vec![Attachment::new("a.csv", "text/csv", b"A\n1\n".to_vec())];
        let chat = ChatSession::new(SessionSettings::default());
        let mut session = Session::new(&orchestrator, chat, Box::new(prompt), pending);

        session.start().await?;

        assert_eq!(session.pending.len(), 1);
        assert!(session.chat.log.is_empty());
        let output = output.borrow();
        assert!(output.iter().any(|line| line.starts_with("warning: Please provide")));
        assert!(output
            .iter()
            .any(|line| line == "error: No API key configured for this session"));
        Ok(())
    }

    #[tokio::test]
    async fn test_rejection_on_zero_margin_model() -> Result<()> {
        let orchestrator = orchestrator();
        let (prompt, output) = ScriptedPrompt::new(&["/model gpt-4", "hello", "/budget"]);
        let mut session = Session::new(&orchestrator, keyed_chat(), Box::new(prompt), vec![]);

        session.start().await?;

        // the user's message stays in the log even though nothing was sent
        assert_eq!(session.chat.log.len(), 1);
        let output = output.borrow();
        assert!(output.contains(&"notice: Switched to gpt-4".to_string()));
        assert!(output
            .iter()
            .any(|line| line.starts_with("error: The total tokens")));
        assert!(output
            .iter()
            .any(|line| line.starts_with("warning: ") && line.contains("of 8192 tokens")));
        Ok(())
    }

    #[tokio::test]
    async fn test_unsupported_attachment_warns() -> Result<()> {
        let orchestrator = orchestrator();
        let (prompt, output) = ScriptedPrompt::new(&["look at this"]);
        let pending = vec![
            Attachment::new("a.csv", "text/csv", b"A,B\n1,2\n".to_vec()),
            Attachment::new("a.txt", "application/octet-stream", b"hi".to_vec()),
        ];
        let mut session = Session::new(&orchestrator, keyed_chat(), Box::new(prompt), pending);

        session.start().await?;

        assert!(session.pending.is_empty());
        assert_eq!(session.chat.log.len(), 3);
        let output = output.borrow();
        assert!(output.contains(
            &"warning: Unsupported file type: application/octet-stream".to_string()
        ));
        assert!(output.contains(&"assistant: echo: File data:\n   A  B\n0  1  2".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_settings_commands() -> Result<()> {
        let orchestrator = orchestrator();
        let (prompt, output) =
            ScriptedPrompt::new(&["/temperature 3", "/temperature 0.1", "/model nope", "/models"]);
        let mut session = Session::new(&orchestrator, keyed_chat(), Box::new(prompt), vec![]);

        session.start().await?;

        assert_eq!(session.chat.settings.temperature, 0.1);
        assert_eq!(session.chat.settings.model, "gpt-4o");
        let output = output.borrow();
        assert!(output
            .iter()
            .any(|line| line.starts_with("error: Temperature must be between")));
        assert!(output.contains(&"error: Unknown model: nope".to_string()));
        assert!(output
            .iter()
            .any(|line| line.starts_with("notice: * gpt-4o ")));
        Ok(())
    }
}
