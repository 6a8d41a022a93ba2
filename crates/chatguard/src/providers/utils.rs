use serde_json::{json, Value};

use crate::errors::{ChatError, ChatResult};
use crate::models::message::Message;
use crate::providers::base::Usage;

/// Convert internal Message format to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            json!({
                "role": message.role,
                "content": message.content,
            })
        })
        .collect()
}

/// Convert OpenAI's API response to internal Message format
pub fn openai_response_to_message(response: &Value) -> ChatResult<Message> {
    let text = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ChatError::Unclassified("response did not contain choices[0].message.content".into())
        })?;

    Ok(Message::assistant().with_text(text))
}

pub fn get_usage(data: &Value) -> Usage {
    let usage = match data.get("usage") {
        Some(usage) => usage,
        None => return Usage::default(),
    };

    let input_tokens = usage
        .get("prompt_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let output_tokens = usage
        .get("completion_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let total_tokens = usage
        .get("total_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32)
        .or_else(|| match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input + output),
            _ => None,
        });

    Usage::new(input_tokens, output_tokens, total_tokens)
}

/// Human readable text of an OpenAI `error` object
pub fn openai_error_message(error: &Value) -> String {
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    match error.get("code").and_then(Value::as_str) {
        Some(code) => format!("{} ({})", message, code),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::Role;

    #[test]
    fn test_messages_to_openai_spec() {
        let messages = vec![
            Message::user().with_text("hello"),
            Message::assistant().with_text("hi"),
        ];
        let spec = messages_to_openai_spec(&messages);
        assert_eq!(
            spec,
            vec![
                json!({"role": "user", "content": "hello"}),
                json!({"role": "assistant", "content": "hi"}),
            ]
        );
    }

    #[test]
    fn test_response_to_message() {
        let response = json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello!"}}]
        });
        let message = openai_response_to_message(&response).unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.content, "Hello!");
    }

    #[test]
    fn test_response_without_choices_is_unclassified() {
        let err = openai_response_to_message(&json!({"choices": []})).unwrap_err();
        assert!(matches!(err, ChatError::Unclassified(_)));
    }

    #[test]
    fn test_usage_total_falls_back_to_sum() {
        let usage = get_usage(&json!({"usage": {"prompt_tokens": 5, "completion_tokens": 7}}));
        assert_eq!(usage.total_tokens, Some(12));
        assert_eq!(get_usage(&json!({})), Usage::default());
    }

    #[test]
    fn test_error_message() {
        let error = json!({"message": "Rate limit reached", "code": "rate_limit_exceeded"});
        assert_eq!(
            openai_error_message(&error),
            "Rate limit reached (rate_limit_exceeded)"
        );
    }
}
