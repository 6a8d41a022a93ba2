use serde::Serialize;

use crate::models::message::Message;
use crate::models::role::Role;

pub const FILE_DIGEST_PREFIX: &str = "File data:\n";

/// Ordered, append-only message history of one session
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_user_message<S: AsRef<str>>(&mut self, text: S) -> &Message {
        self.push(Message::user().with_text(text))
    }

    pub fn append_assistant_message<S: AsRef<str>>(&mut self, text: S) -> &Message {
        self.push(Message::assistant().with_text(text))
    }

    /// Uploaded file contents go in as an ordinary user message so they are counted and
    /// seen by the model like anything else the user typed.
    pub fn append_file_digest<S: AsRef<str>>(&mut self, flattened_text: S) -> &Message {
        self.push(
            Message::user()
                .with_text(FILE_DIGEST_PREFIX)
                .with_text(flattened_text),
        )
    }

    fn push(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Markdown transcript: user turns as quoted blocks, assistant turns labelled.
    pub fn render(&self) -> String {
        self.messages
            .iter()
            .map(|message| match message.role {
                Role::User => message
                    .content
                    .lines()
                    .map(|line| format!("> {}", line))
                    .collect::<Vec<_>>()
                    .join("\n"),
                Role::Assistant => format!("**Assistant:** {}", message.content),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
