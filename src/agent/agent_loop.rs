//! Core agent loop implementation.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::llm::{ConversationEntry, GeminiClient, LlmClient, TokenUsage};
use crate::sandbox::WorkingRoot;
use crate::tools::ToolRegistry;

use super::prompt::build_system_prompt;

/// How a run ended. Exhausting the iteration budget is a reported outcome,
/// not an error; only transport and internal-consistency faults surface as
/// `Err` from [`Agent::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The model replied with plain text and no tool calls.
    Done(String),
    /// The iteration budget ran out before a final answer.
    Exhausted,
}

/// The outcome plus the full transcript and per-iteration token usage.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub transcript: Vec<ConversationEntry>,
    pub usage: Vec<TokenUsage>,
}

/// The tool-calling agent.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    root: WorkingRoot,
    max_iterations: usize,
    iteration_delay: Duration,
}

impl Agent {
    /// Create an agent backed by the Gemini API.
    pub fn new(config: &Config, root: WorkingRoot) -> Self {
        let llm = Arc::new(GeminiClient::new(
            config.api_key.clone(),
            config.model.clone(),
        ));
        Self::with_client(llm, root, config.max_iterations, config.iteration_delay)
    }

    /// Create an agent with an explicit model client (tests use scripted
    /// clients) and the default tool set.
    pub fn with_client(
        llm: Arc<dyn LlmClient>,
        root: WorkingRoot,
        max_iterations: usize,
        iteration_delay: Duration,
    ) -> Self {
        Self {
            llm,
            tools: ToolRegistry::new(),
            root,
            max_iterations,
            iteration_delay,
        }
    }

    /// Run a task to completion or exhaustion.
    ///
    /// The transcript starts with exactly one user turn; each iteration
    /// appends one model turn and, if tools were requested, one tool turn
    /// per call, dispatched sequentially in the order received.
    pub async fn run(&self, task: &str) -> anyhow::Result<RunReport> {
        let system_prompt =
            build_system_prompt(&self.root.path().to_string_lossy(), &self.tools);
        let declarations = self.tools.function_declarations();

        let mut transcript = vec![ConversationEntry::User(task.to_string())];
        let mut usage = Vec::new();

        for iteration in 0..self.max_iterations {
            if iteration > 0 && !self.iteration_delay.is_zero() {
                // Pacing only; ordering is unaffected.
                tokio::time::sleep(self.iteration_delay).await;
            }
            tracing::debug!("Agent iteration {}", iteration + 1);

            let reply = self
                .llm
                .generate(&system_prompt, &transcript, &declarations)
                .await?;
            if let Some(u) = reply.usage {
                usage.push(u);
            }

            if reply.tool_calls.is_empty() {
                // A reply with neither text nor tool calls violates the
                // collaborator contract; abort instead of looping blind.
                let Some(text) = reply.text else {
                    anyhow::bail!("model returned a reply with no text and no tool calls");
                };
                transcript.push(ConversationEntry::Model {
                    text: Some(text.clone()),
                    tool_calls: Vec::new(),
                });
                return Ok(RunReport {
                    outcome: RunOutcome::Done(text),
                    transcript,
                    usage,
                });
            }

            transcript.push(ConversationEntry::Model {
                text: reply.text,
                tool_calls: reply.tool_calls.clone(),
            });

            for call in &reply.tool_calls {
                let result = self.tools.dispatch(call, &self.root).await;
                transcript.push(ConversationEntry::Tool {
                    name: call.name.clone(),
                    result,
                });
            }
        }

        tracing::warn!(
            "maximum iterations ({}) reached without a final answer",
            self.max_iterations
        );
        Ok(RunReport {
            outcome: RunOutcome::Exhausted,
            transcript,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    use crate::llm::ModelReply;
    use crate::tools::{FunctionDeclaration, ToolCallRequest, ToolResult};

    /// Replays a fixed sequence of replies; repeats the last one forever.
    struct ScriptedClient {
        replies: Mutex<Vec<ModelReply>>,
        last: ModelReply,
    }

    impl ScriptedClient {
        fn new(mut replies: Vec<ModelReply>) -> Self {
            let last = replies.last().cloned().unwrap();
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                last,
            }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn generate(
            &self,
            _system_prompt: &str,
            _transcript: &[ConversationEntry],
            _tools: &[FunctionDeclaration],
        ) -> anyhow::Result<ModelReply> {
            Ok(self
                .replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| self.last.clone()))
        }
    }

    fn list_call() -> ModelReply {
        ModelReply {
            text: None,
            tool_calls: vec![ToolCallRequest {
                name: "get_files_info".to_string(),
                arguments: json!({}),
            }],
            usage: None,
        }
    }

    fn final_text(text: &str) -> ModelReply {
        ModelReply {
            text: Some(text.to_string()),
            tool_calls: Vec::new(),
            usage: None,
        }
    }

    fn agent_with(replies: Vec<ModelReply>, max_iterations: usize) -> (tempfile::TempDir, Agent) {
        let dir = tempfile::tempdir().unwrap();
        let root = WorkingRoot::new(dir.path()).unwrap();
        let agent = Agent::with_client(
            Arc::new(ScriptedClient::new(replies)),
            root,
            max_iterations,
            Duration::ZERO,
        );
        (dir, agent)
    }

    #[tokio::test]
    async fn finishes_when_model_stops_requesting_tools() {
        let (_dir, agent) = agent_with(vec![list_call(), final_text("all done")], 10);

        let report = agent.run("look around").await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Done("all done".to_string()));
        // user + (model + tool) + model
        assert_eq!(report.transcript.len(), 4);
        assert!(matches!(
            report.transcript[2],
            ConversationEntry::Tool { ref result, .. } if !result.is_failure()
        ));
    }

    #[tokio::test]
    async fn exhausts_budget_when_model_never_finishes() {
        let max = 3;
        let (_dir, agent) = agent_with(vec![list_call()], max);

        let report = agent.run("loop forever").await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Exhausted);
        // 1 user turn, then one model turn and one tool turn per iteration.
        assert_eq!(report.transcript.len(), 1 + 2 * max);
    }

    #[tokio::test]
    async fn transcript_starts_with_the_user_turn() {
        let (_dir, agent) = agent_with(vec![final_text("ok")], 5);

        let report = agent.run("just answer").await.unwrap();

        assert!(matches!(
            report.transcript[0],
            ConversationEntry::User(ref t) if t == "just answer"
        ));
        assert_eq!(report.transcript.len(), 2);
    }

    #[tokio::test]
    async fn failed_tool_calls_flow_back_as_failures_not_errors() {
        let bad_call = ModelReply {
            text: None,
            tool_calls: vec![ToolCallRequest {
                name: "get_file_content".to_string(),
                arguments: json!({ "file_path": "../etc/passwd" }),
            }],
            usage: None,
        };
        let (_dir, agent) = agent_with(vec![bad_call, final_text("gave up")], 10);

        let report = agent.run("read something forbidden").await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Done("gave up".to_string()));
        let ConversationEntry::Tool { result, .. } = &report.transcript[2] else {
            panic!("expected a tool turn");
        };
        assert!(result.is_failure());
        assert!(result.text().contains("outside the permitted working directory"));
    }

    #[tokio::test]
    async fn empty_model_reply_is_fatal() {
        let empty = ModelReply {
            text: None,
            tool_calls: Vec::new(),
            usage: None,
        };
        let (_dir, agent) = agent_with(vec![empty], 5);

        let err = agent.run("anything").await.unwrap_err();
        assert!(err.to_string().contains("no text and no tool calls"));
    }

    #[tokio::test]
    async fn multiple_calls_in_one_reply_append_in_order() {
        let two_calls = ModelReply {
            text: None,
            tool_calls: vec![
                ToolCallRequest {
                    name: "write_file".to_string(),
                    arguments: json!({ "file_path": "a.txt", "content": "A" }),
                },
                ToolCallRequest {
                    name: "get_file_content".to_string(),
                    arguments: json!({ "file_path": "a.txt" }),
                },
            ],
            usage: None,
        };
        let (_dir, agent) = agent_with(vec![two_calls, final_text("done")], 10);

        let report = agent.run("write then read").await.unwrap();

        let names: Vec<_> = report
            .transcript
            .iter()
            .filter_map(|e| match e {
                ConversationEntry::Tool { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["write_file", "get_file_content"]);

        // The second call observes the first call's write.
        let ConversationEntry::Tool { result, .. } = &report.transcript[3] else {
            panic!("expected a tool turn");
        };
        assert_eq!(*result, ToolResult::Success("A".to_string()));
    }
}
