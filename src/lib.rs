//! # Sandbox Agent
//!
//! A minimal tool-calling coding agent confined to a single working
//! directory.
//!
//! This library provides:
//! - A sandboxed tool set (list, read, write, run script) that can never
//!   touch a path outside the working directory
//! - A tool-based agent loop that feeds results back to the model until it
//!   produces a final answer or the iteration budget runs out
//! - Integration with the Gemini API for model access
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Receive a task from the CLI
//! 2. Build context with system prompt and available tools
//! 3. Call the model, parse the response, execute any tool calls
//! 4. Feed results back to the model, repeat until the task is complete
//!
//! ## Example
//!
//! ```rust,ignore
//! use sandbox_agent::{agent::Agent, config::Config, sandbox::WorkingRoot};
//!
//! let config = Config::from_env()?;
//! let root = WorkingRoot::new(&config.working_dir)?;
//! let report = Agent::new(&config, root).run("list the files here").await?;
//! ```

pub mod agent;
pub mod config;
pub mod llm;
pub mod sandbox;
pub mod tools;

pub use config::Config;
