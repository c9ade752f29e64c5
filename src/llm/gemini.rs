//! Gemini `generateContent` client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ConversationEntry, LlmClient, ModelReply, TokenUsage};
use crate::tools::{FunctionDeclaration, ToolCallRequest, ToolResult};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// HTTP client for the Gemini API.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(
        &self,
        system_prompt: &str,
        transcript: &[ConversationEntry],
        tools: &[FunctionDeclaration],
    ) -> anyhow::Result<ModelReply> {
        let url = format!("{API_BASE}/{}:generateContent?key={}", self.model, self.api_key);
        let body = json!({
            "systemInstruction": { "parts": [{ "text": system_prompt }] },
            "contents": contents(transcript),
            "tools": [{ "functionDeclarations": tools }],
        });

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!(
                "Gemini API error ({status}): {}",
                response.text().await.unwrap_or_default()
            );
        }
        let parsed: GenerateContentResponse = response.json().await?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for part in parsed
            .candidates
            .into_iter()
            .flatten()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts.unwrap_or_default())
        {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(call) = part.function_call {
                tool_calls.push(ToolCallRequest {
                    name: call.name,
                    arguments: call.args.unwrap_or_else(|| json!({})),
                });
            }
        }

        Ok(ModelReply {
            text: (!text.is_empty()).then_some(text),
            tool_calls,
            usage: parsed.usage_metadata.map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                response_tokens: u.candidates_token_count,
            }),
        })
    }
}

/// Serialize the transcript into the Gemini `contents` array.
fn contents(transcript: &[ConversationEntry]) -> Vec<Value> {
    transcript
        .iter()
        .map(|entry| match entry {
            ConversationEntry::User(text) => json!({
                "role": "user",
                "parts": [{ "text": text }],
            }),
            ConversationEntry::Model { text, tool_calls } => {
                let mut parts = Vec::new();
                if let Some(text) = text {
                    parts.push(json!({ "text": text }));
                }
                for call in tool_calls {
                    parts.push(json!({
                        "functionCall": { "name": call.name, "args": call.arguments },
                    }));
                }
                json!({ "role": "model", "parts": parts })
            }
            ConversationEntry::Tool { name, result } => {
                let response = match result {
                    ToolResult::Success(output) => json!({ "result": output }),
                    ToolResult::Failure(message) => json!({ "error": message }),
                };
                json!({
                    "role": "tool",
                    "parts": [{
                        "functionResponse": { "name": name, "response": response },
                    }],
                })
            }
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    args: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct UsageMetadata {
    prompt_token_count: u64,
    candidates_token_count: u64,
}
