use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::StreamExt;
use specsmith_agents::create_code_agent;
use specsmith_llm::{OpenAiClient, RetryingBackend};
use specsmith_types::AgentOutput;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod output;
mod specs;

use config::AppConfig;
use output::OutputWriter;
use specs::{find_example, EXAMPLES};

/// Run name used when the specification is not a built-in example
const CUSTOM_RUN_NAME: &str = "custom";

#[derive(Parser, Debug)]
#[command(name = "specsmith")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Turn a specification into code with an architect, a reviewer and a coder",
    long_about = None
)]
struct Cli {
    /// Specification text
    #[arg(long, conflicts_with_all = ["spec_file", "example"])]
    spec: Option<String>,

    /// Read the specification from a file
    #[arg(long, value_name = "PATH", conflicts_with = "example")]
    spec_file: Option<PathBuf>,

    /// Use a built-in example specification (see --list-examples)
    #[arg(short, long)]
    example: Option<String>,

    /// List the built-in example specifications and exit
    #[arg(long)]
    list_examples: bool,

    /// Run name, used in the output path
    #[arg(short, long)]
    name: Option<String>,

    /// Model for the architect, coder and reviewer
    #[arg(short, long)]
    model: Option<String>,

    /// Root directory for generated files
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Configuration file (defaults to ./specsmith.toml when present)
    #[arg(long, value_name = "PATH", env = "SPECSMITH_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Run name and specification text for this invocation
    fn resolve_spec(&self) -> Result<(String, String)> {
        let (default_name, spec) = if let Some(spec) = &self.spec {
            (CUSTOM_RUN_NAME.to_string(), spec.clone())
        } else if let Some(path) = &self.spec_file {
            let spec = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read specification from {}", path.display()))?;
            (CUSTOM_RUN_NAME.to_string(), spec)
        } else {
            let name = self.example.as_deref().unwrap_or(EXAMPLES[0].name);
            let Some(example) = find_example(name) else {
                bail!("Unknown example '{}', run with --list-examples to see the choices", name);
            };
            (example.name.to_string(), example.specification.to_string())
        };

        if spec.trim().is_empty() {
            bail!("The specification is empty");
        }
        Ok((self.name.clone().unwrap_or(default_name), spec))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.list_examples {
        for example in EXAMPLES {
            println!("{}", example.name);
        }
        return Ok(());
    }

    let (name, spec) = cli.resolve_spec()?;

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        config.llm.model = model;
    }
    if let Some(output) = cli.output {
        config.output_dir = output;
    }

    let llm = OpenAiClient::new(config.llm.clone()).context("Invalid model backend configuration")?;
    let packager = OpenAiClient::new(config.packager.clone())
        .context("Invalid packager backend configuration")?;
    let agent = create_code_agent(
        Arc::new(RetryingBackend::new(llm, config.retry.clone())),
        Arc::new(RetryingBackend::new(packager, config.retry.clone())),
        config.agent.clone(),
    )?;

    tracing::info!(run = %name, model = %config.llm.model, "Starting code agent");
    let mut run = agent.run(spec);
    if let Some(mut notifications) = run.stream_events() {
        while let Some(event) = notifications.next().await {
            println!("{}\n", event.msg);
        }
    }
    let result = run.await.context("Code agent run failed")?;

    let writer = OutputWriter::for_today(&config.output_dir, &name, &config.llm.model);
    let written = writer.write(&result)?;
    match &result {
        AgentOutput::Packaged(package) => {
            for path in &written {
                println!("{}", path.display());
            }
            println!("Wrote {} files to {}", package.len(), writer.dir().display());
        }
        AgentOutput::Unpackaged(code) => {
            println!("Final code:\n{}", code);
            println!("Review limit reached, raw code saved to {}", writer.dir().display());
        }
    }

    Ok(())
}
