use std::collections::HashMap;

use strum::IntoEnumIterator;
use tiktoken_rs::CoreBPE;

use crate::errors::{ChatError, ChatResult};
use crate::models::profile::Encoding;

pub struct TokenCounter {
    encoders: HashMap<Encoding, CoreBPE>,
}

impl TokenCounter {
    fn load_encoder(encoding: Encoding) -> ChatResult<CoreBPE> {
        let encoder = match encoding {
            Encoding::O200kBase => tiktoken_rs::o200k_base(),
            Encoding::Cl100kBase => tiktoken_rs::cl100k_base(),
        };
        encoder.map_err(|e| ChatError::Tokenizer(format!("failed to load {}: {}", encoding, e)))
    }

    /// Load every known encoding up front so counting never touches the vocab files again
    pub fn new() -> ChatResult<Self> {
        let mut encoders = HashMap::new();
        for encoding in Encoding::iter() {
            encoders.insert(encoding, Self::load_encoder(encoding)?);
        }
        Ok(TokenCounter { encoders })
    }

    /// Tokens billed for `text` sent as message content. Special-token markup such as
    /// `<|endoftext|>` is plain text to the provider, so it is encoded as ordinary text.
    pub fn count_tokens(&self, text: &str, encoding: Encoding) -> usize {
        match self.encoders.get(&encoding) {
            Some(encoder) => encoder.encode_ordinary(text).len(),
            // new() loads every variant, so this is unreachable in practice; fall back to
            // one token per byte which can only over-count
            None => text.len(),
        }
    }

    pub fn count_tokens_for_model(&self, text: &str, model_identifier: &str) -> usize {
        self.count_tokens(text, Encoding::for_identifier(model_identifier))
    }
}
