use std::time::Duration;

pub const OPENAI_HOST: &str = "https://api.openai.com";

#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiProviderConfig {
    pub host: String,
    /// `None` waits on the provider indefinitely
    pub timeout: Option<Duration>,
}

impl Default for OpenAiProviderConfig {
    fn default() -> Self {
        Self {
            host: OPENAI_HOST.to_string(),
            timeout: None,
        }
    }
}

impl OpenAiProviderConfig {
    pub fn new<S: Into<String>>(host: S) -> Self {
        Self {
            host: host.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
