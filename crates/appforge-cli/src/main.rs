//! AppForge - AI application generator gateway
//!
//! Runs the HTTP gateway, or drives the same dispatcher and planner from the
//! command line for one-off generations.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use appforge_core::ai::types::FrameworkHint;
use appforge_core::{normalize, server, AppState, GatewayConfig, GenerationRequest, Mode};

/// AppForge - AI application generator gateway
#[derive(Parser)]
#[command(name = "appforge")]
#[command(about = "Generate web apps from prompts through hosted AI models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.appforge/config.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Address to bind, overrides the config file
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Generate an app and print or write the result
    Generate {
        #[arg(short, long, default_value = "anthropic")]
        provider: String,

        /// builder or tutor
        #[arg(short, long, default_value = "builder")]
        mode: Mode,

        /// Target framework (html, react, nextjs, vue, svelte)
        #[arg(short, long)]
        framework: Option<FrameworkHint>,

        /// Write the generated files into this directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        prompt: String,
    },

    /// Break a build request into tasks
    Plan {
        #[arg(short, long, default_value = "anthropic")]
        provider: String,

        prompt: String,
    },

    /// List providers and whether they are configured
    Providers,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries command output; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = GatewayConfig::load(cli.config.as_deref()).context("failed to load config")?;
    let state = AppState::from_config(&config);

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.bind.clone());
            server::serve(state, &bind).await?;
        }
        Commands::Generate {
            provider,
            mode,
            framework,
            out,
            prompt,
        } => {
            let mut request = GenerationRequest::new(provider, prompt).with_mode(mode);
            request.framework_hint = framework;
            request.validate()?;

            let result = state.dispatcher.generate(&request).await;
            if let Some(payload) = &result.error_payload {
                bail!("{} ({}): {}", payload.error, payload.kind, payload.detail);
            }
            let artifact = normalize(result.content.as_deref().unwrap_or_default())?;

            match out {
                Some(dir) => {
                    let written = artifact.write_to(&dir)?;
                    for path in &written {
                        println!("{}", path.display());
                    }
                    tracing::info!("Wrote {} file(s) to {}", written.len(), dir.display());
                }
                None => println!("{}", artifact.entry_content()),
            }
        }
        Commands::Plan { provider, prompt } => {
            if prompt.trim().is_empty() {
                bail!("prompt must not be empty");
            }
            let outcome = state.decomposer.decompose(&prompt, &provider).await;
            println!("{}", serde_json::to_string_pretty(&outcome.plan)?);
        }
        Commands::Providers => {
            for provider in state.dispatcher.registry().providers() {
                let marker = if provider.configured { "✓" } else { " " };
                println!(
                    "  {} {:<12} {} ({}s timeout){}",
                    marker,
                    provider.id.to_string(),
                    provider.model,
                    provider.timeout_ms / 1000,
                    if provider.supports_images { " (images)" } else { "" }
                );
            }
        }
    }

    Ok(())
}
