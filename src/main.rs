//! Sandbox Agent - CLI entry point.
//!
//! Usage: `sandbox-agent [--verbose] <prompt...>`

use sandbox_agent::agent::{Agent, RunOutcome};
use sandbox_agent::config::Config;
use sandbox_agent::sandbox::WorkingRoot;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Split argv into prompt words and flags, like the usage line says.
fn parse_args() -> (Option<String>, bool) {
    let mut prompt_parts = Vec::new();
    let mut verbose = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--verbose" | "-v" => verbose = true,
            _ => prompt_parts.push(arg),
        }
    }
    let prompt = (!prompt_parts.is_empty()).then(|| prompt_parts.join(" "));
    (prompt, verbose)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (prompt, verbose) = parse_args();
    let Some(prompt) = prompt else {
        eprintln!("Error: Please provide a prompt as a command line argument.");
        std::process::exit(1);
    };

    // Initialize logging; --verbose lowers the filter to debug.
    let default_filter = if verbose {
        "sandbox_agent=debug"
    } else {
        "sandbox_agent=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    let root = WorkingRoot::new(&config.working_dir)?;
    info!(
        "model={} working_dir={} max_iterations={}",
        config.model,
        root.path().display(),
        config.max_iterations
    );

    if verbose {
        println!("User prompt: {prompt}");
    }

    let agent = Agent::new(&config, root);
    let report = agent.run(&prompt).await?;

    match report.outcome {
        RunOutcome::Done(answer) => println!("{answer}"),
        RunOutcome::Exhausted => println!(
            "maximum iterations reached ({}) without a final answer",
            config.max_iterations
        ),
    }

    if verbose {
        for (i, usage) in report.usage.iter().enumerate() {
            println!(
                "Iteration {}: prompt tokens: {}, response tokens: {}",
                i + 1,
                usage.prompt_tokens,
                usage.response_tokens
            );
        }
    }

    Ok(())
}
