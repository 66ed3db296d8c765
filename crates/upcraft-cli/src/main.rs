mod local_actions;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use upcraft_agent::{Agent, SyncClient, ToolCallTranslator, UpcraftConfig};
use upcraft_core::ToolCall;
use upcraft_skills::ActionRegistry;

#[derive(Parser)]
#[command(name = "upcraft", about = "UpCraft: LLM-driven device automation")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "upcraft.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the tool definitions handed to an LLM provider
    Tools,
    /// Print the skill definitions published to the sync service
    Skills,
    /// Dispatch one action as if the model had called it
    Dispatch {
        /// Function name, `skill.action`
        name: String,
        /// Arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
        /// Dispatch deadline in milliseconds (overrides config)
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Resolve a screen tree into a CLICK or NOOP intent
    Resolve {
        /// Screen JSON; read from stdin when omitted
        screen: Option<String>,
        /// Dispatch the click action when the intent is a CLICK
        #[arg(long)]
        act: bool,
    },
    /// Fetch the skill list from the sync service
    Sync,
    /// Publish the local skill definitions to the sync service
    Publish,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = UpcraftConfig::load(&cli.config).await?;

    let registry = ActionRegistry::new();
    let count = local_actions::register_local_actions(&registry)?;
    info!(count, "Local actions registered");
    let registry = Arc::new(registry);

    match cli.command {
        Commands::Tools => {
            println!(
                "{}",
                serde_json::to_string_pretty(&registry.tool_definitions())?
            );
        }
        Commands::Skills => {
            println!(
                "{}",
                serde_json::to_string_pretty(&registry.skill_definitions())?
            );
        }
        Commands::Dispatch {
            name,
            args,
            timeout_ms,
        } => {
            let arguments = args.map(serde_json::Value::String).unwrap_or_default();
            let call = ToolCall::new("cli", name, arguments);
            let deadline = timeout_ms
                .map(Duration::from_millis)
                .or_else(|| config.agent.dispatch_timeout());

            let cancel = cancel_on_ctrl_c();
            let result = ToolCallTranslator::new(registry)
                .dispatch(&call, cancel, deadline)
                .await;

            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                anyhow::bail!("{} failed: {}", call.name, result.message);
            }
        }
        Commands::Resolve { screen, act } => {
            let raw = match screen {
                Some(raw) => raw,
                None => {
                    let mut raw = String::new();
                    tokio::io::stdin().read_to_string(&mut raw).await?;
                    raw
                }
            };

            let mut config = config;
            config.sync.enabled = false;
            let agent = Agent::new(registry, config)?;

            if act {
                let outcome = agent.act_on_screen(&raw, cancel_on_ctrl_c()).await;
                println!("{}", outcome.intent.to_json());
                if let Some(result) = outcome.result {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
            } else {
                println!("{}", agent.handle_screen_input(&raw));
            }
        }
        Commands::Sync => {
            let client = SyncClient::new(&config.sync)?;
            let skills = client.fetch_skills().await?;
            if skills.is_empty() {
                println!("No skills stored at {}", client.base_url());
            } else {
                println!("Remote skills:");
                for skill in &skills {
                    println!("  {}: {}", skill.name, skill.description);
                }
                println!("\nTotal: {} skill(s)", skills.len());
            }
        }
        Commands::Publish => {
            let client = SyncClient::new(&config.sync)?;
            if !client.health().await {
                warn!(url = %client.base_url(), "Sync service did not report healthy");
            }
            let published = client.publish_registry(&registry).await?;
            println!("Published {published} skill(s) to {}", client.base_url());
        }
    }

    Ok(())
}

/// A token cancelled when the process receives Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling dispatch");
            trigger.cancel();
        }
    });
    cancel
}
