use serde::{Deserialize, Serialize};

use crate::conversation::Conversation;
use crate::errors::{ChatError, ChatResult};
use crate::models::profile::{ModelCatalog, ModelProfile};
use crate::providers::base::Credential;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub model: String,
    pub temperature: f32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl SessionSettings {
    pub fn validate_temperature(temperature: f32) -> ChatResult<f32> {
        if (0.0..=1.0).contains(&temperature) {
            Ok(temperature)
        } else {
            Err(ChatError::InvalidTemperature(temperature))
        }
    }

    /// Resolve the selected model and check the temperature range
    pub fn resolve<'a>(&self, catalog: &'a ModelCatalog) -> ChatResult<&'a ModelProfile> {
        Self::validate_temperature(self.temperature)?;
        catalog.require(&self.model)
    }
}

/// State owned by one interactive session. Dropping it discards the conversation.
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: String,
    credential: Option<Credential>,
    pub settings: SessionSettings,
    pub log: Conversation,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}

impl ChatSession {
    pub fn new(settings: SessionSettings) -> Self {
        ChatSession {
            id: uuid::Uuid::new_v4().to_string(),
            credential: None,
            settings,
            log: Conversation::new(),
        }
    }

    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn set_credential(&mut self, credential: Option<Credential>) {
        self.credential = credential;
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    pub fn set_model(&mut self, catalog: &ModelCatalog, identifier: &str) -> ChatResult<()> {
        catalog.require(identifier)?;
        self.settings.model = identifier.to_string();
        Ok(())
    }

    pub fn set_temperature(&mut self, temperature: f32) -> ChatResult<()> {
        self.settings.temperature = SessionSettings::validate_temperature(temperature)?;
        Ok(())
    }
}
