//! Agent module - the core tool-calling loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Build context with system prompt and user task
//! 2. Call the model with the tool manifest
//! 3. If the model requests tool calls, execute them and feed results back
//! 4. Repeat until the model produces a final answer or the iteration
//!    budget runs out

mod agent_loop;
mod prompt;

pub use agent_loop::{Agent, RunOutcome, RunReport};
pub use prompt::build_system_prompt;
