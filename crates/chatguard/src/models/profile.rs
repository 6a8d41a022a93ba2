use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::errors::{ChatError, ChatResult};

/// BPE encoding family a model tokenizes with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Encoding {
    O200kBase,
    Cl100kBase,
}

impl Encoding {
    /// Best guess for identifiers that are not in the catalog
    pub fn for_identifier(identifier: &str) -> Self {
        let identifier = identifier.to_lowercase();
        if identifier.starts_with("gpt-4o")
            || identifier.starts_with("o1")
            || identifier.starts_with("o3")
        {
            Encoding::O200kBase
        } else {
            Encoding::Cl100kBase
        }
    }
}

/// Tokens the chat protocol spends on framing, outside of the message text itself.
///
/// `per_message` covers the role delimiters around every message and `reply_priming`
/// the tokens that open the assistant's reply. `approximate` marks constants that were
/// measured on a different model family and have not been verified for this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramingCosts {
    pub per_message: usize,
    pub reply_priming: usize,
    pub approximate: bool,
}

impl FramingCosts {
    pub const CHAT: FramingCosts = FramingCosts {
        per_message: 4,
        reply_priming: 2,
        approximate: false,
    };

    pub const REASONING: FramingCosts = FramingCosts {
        per_message: 4,
        reply_priming: 2,
        approximate: true,
    };

    pub fn for_identifier(identifier: &str) -> Self {
        let identifier = identifier.to_lowercase();
        if identifier.starts_with("o1") || identifier.starts_with("o3") {
            Self::REASONING
        } else {
            Self::CHAT
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub identifier: String,
    pub label: String,
    pub context_window_tokens: usize,
    pub max_output_tokens: usize,
    pub encoding: Encoding,
    pub framing: FramingCosts,
}

impl ModelProfile {
    pub fn new<S: Into<String>, L: Into<String>>(
        identifier: S,
        label: L,
        context_window_tokens: usize,
        max_output_tokens: usize,
    ) -> Self {
        let identifier = identifier.into();
        ModelProfile {
            encoding: Encoding::for_identifier(&identifier),
            framing: FramingCosts::for_identifier(&identifier),
            identifier,
            label: label.into(),
            context_window_tokens,
            max_output_tokens,
        }
    }

    /// Tokens left for the conversation once the output reservation is taken out
    pub fn input_budget(&self) -> usize {
        self.context_window_tokens
            .saturating_sub(self.max_output_tokens)
    }
}

lazy_static! {
    static ref BUILTIN_PROFILES: Vec<ModelProfile> = vec![
        ModelProfile::new(
            "gpt-4o",
            "GPT-4o - High-intelligence model for complex tasks",
            128_000,
            4_096,
        ),
        ModelProfile::new(
            "gpt-4o-mini",
            "GPT-4o mini - Affordable model for lightweight tasks",
            128_000,
            16_384,
        ),
        ModelProfile::new("o1-preview", "o1-preview - Beta reasoning model", 128_000, 32_768),
        ModelProfile::new("o1-mini", "o1-mini - Fast reasoning model", 128_000, 65_536),
        ModelProfile::new(
            "gpt-4-turbo",
            "GPT-4 Turbo - Previous high-intelligence model",
            128_000,
            4_096,
        ),
        ModelProfile::new(
            "gpt-4",
            "GPT-4 - Previous high-intelligence model",
            8_192,
            8_192,
        ),
    ];
}

/// Read-only lookup table from model identifier to its provider-published limits
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    profiles: Vec<ModelProfile>,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ModelCatalog {
    pub fn builtin() -> Self {
        ModelCatalog {
            profiles: BUILTIN_PROFILES.clone(),
        }
    }

    pub fn from_profiles(profiles: Vec<ModelProfile>) -> Self {
        ModelCatalog { profiles }
    }

    pub fn get(&self, identifier: &str) -> Option<&ModelProfile> {
        self.profiles.iter().find(|p| p.identifier == identifier)
    }

    pub fn require(&self, identifier: &str) -> ChatResult<&ModelProfile> {
        self.get(identifier)
            .ok_or_else(|| ChatError::UnknownModel(identifier.to_string()))
    }

    /// The first profile in the catalog
    pub fn default_profile(&self) -> Option<&ModelProfile> {
        self.profiles.first()
    }

    pub fn profiles(&self) -> &[ModelProfile] {
        &self.profiles
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.identifier.as_str())
    }
}
