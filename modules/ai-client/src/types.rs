use serde::{Deserialize, Serialize};

// --- Chat-completions wire types ---

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    pub content: Option<String>,
}

// --- Legacy single-string completion wire types ---

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub inputs: String,
    pub parameters: CompletionParameters,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionParameters {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub return_full_text: bool,
}

/// The endpoint returns either a bare object or a single-element array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CompletionResponse {
    Many(Vec<GeneratedText>),
    One(GeneratedText),
}

#[derive(Debug, Deserialize)]
pub struct GeneratedText {
    pub generated_text: Option<String>,
}

impl CompletionResponse {
    pub fn into_text(self) -> Option<String> {
        match self {
            CompletionResponse::One(g) => g.generated_text,
            CompletionResponse::Many(items) => {
                items.into_iter().next().and_then(|g| g.generated_text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_omits_absent_max_tokens() {
        let req = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage::user("hi")],
            temperature: 0.7,
            max_tokens: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert!(value.get("max_tokens").is_none());
    }

    #[test]
    fn completion_response_array_shape() {
        let json = r#"[{"generated_text": "<p>out</p>"}]"#;
        let resp: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.into_text().as_deref(), Some("<p>out</p>"));
    }

    #[test]
    fn completion_response_object_shape() {
        let json = r#"{"generated_text": "out"}"#;
        let resp: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.into_text().as_deref(), Some("out"));
    }
}
