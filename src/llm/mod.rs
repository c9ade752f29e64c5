//! Model collaborator boundary.
//!
//! The agent loop only knows the [`LlmClient`] trait; the Gemini
//! implementation lives in [`gemini`]. Tests drive the loop with scripted
//! clients instead of the network.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::tools::{FunctionDeclaration, ToolCallRequest, ToolResult};

/// One turn of the conversation. The transcript is append-only and replayed
/// to the model verbatim each iteration.
#[derive(Debug, Clone)]
pub enum ConversationEntry {
    /// The user's prompt.
    User(String),
    /// A model reply: free text, tool-call requests, or both.
    Model {
        text: Option<String>,
        tool_calls: Vec<ToolCallRequest>,
    },
    /// The result of one dispatched tool call.
    Tool { name: String, result: ToolResult },
}

/// Token counts reported by the provider for one request.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub response_tokens: u64,
}

/// What the model produced for one iteration.
#[derive(Debug, Clone)]
pub struct ModelReply {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
    pub usage: Option<TokenUsage>,
}

/// The "ask the model for the next step" capability.
///
/// Transport failures propagate as errors and abort the run; everything the
/// model *says* (including requests for tools that will fail) flows back
/// through the transcript instead.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        transcript: &[ConversationEntry],
        tools: &[FunctionDeclaration],
    ) -> anyhow::Result<ModelReply>;
}
