//! System prompt template for the agent.

use crate::tools::ToolRegistry;

/// Build the system prompt with tool definitions.
pub fn build_system_prompt(working_dir: &str, tools: &ToolRegistry) -> String {
    let tool_descriptions = tools
        .descriptions()
        .iter()
        .map(|(name, description)| format!("- **{name}**: {description}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a coding agent working inside a sandboxed directory: {working_dir}

## Your Capabilities

You have access to the following tools:
{tool_descriptions}

## Rules and Guidelines

1. **All paths are relative** - Every file and directory path you supply is resolved against the working directory. Paths that escape it are rejected.

2. **Always use tools** - Don't guess or make assumptions. Use tools to list files, read contents, and verify your work.

3. **Read before edit** - Always read a file's contents before modifying it, unless you're creating a new file.

4. **Iterate on errors** - A failed tool call comes back as an error message in the conversation. Analyze it and adjust; the system never retries for you.

5. **Stay focused** - Only make changes directly related to the task.

When the task is complete, reply with plain text (no tool calls) summarizing what you did and what you found."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_every_tool_and_the_working_dir() {
        let prompt = build_system_prompt("/tmp/sandbox", &ToolRegistry::new());

        assert!(prompt.contains("/tmp/sandbox"));
        for name in [
            "get_files_info",
            "get_file_content",
            "write_file",
            "run_python_file",
        ] {
            assert!(prompt.contains(name), "missing {name}");
        }
    }
}
