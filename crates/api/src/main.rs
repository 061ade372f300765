use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bsm_api::config::ManagerConfig;
use bsm_api::orchestrator::ScriptOrchestrator;

#[derive(Parser, Debug)]
#[command(name = "bsm")]
#[command(about = "Store and run scripts in a headless Blender.", long_about = None)]
struct Cli {
    /// Repository root (overrides SCRIPTS_DIR).
    #[arg(long, global = true)]
    scripts_dir: Option<PathBuf>,
    /// Host executable (overrides BLENDER_PATH).
    #[arg(long, global = true)]
    blender_path: Option<PathBuf>,
    /// Execution timeout in seconds (overrides EXECUTION_TIMEOUT_SECS).
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List stored scripts with their metadata as JSON.
    List,
    /// Print the body of a script.
    Get { name: String },
    /// Print the latest execution result of a script.
    Result { name: String },
    /// Store a new script. CONTENT is a file path, or `-` for stdin.
    Add { name: String, content: PathBuf },
    /// Replace the body of a script. CONTENT is a file path, or `-` for stdin.
    Edit { name: String, content: PathBuf },
    /// Delete a script and its result.
    Remove { name: String },
    /// Run a script in the host application.
    Exec {
        name: String,
        /// Existing .blend file to load before running the script.
        #[arg(long)]
        blend_file: Option<PathBuf>,
    },
    /// Install the built-in example scripts.
    Examples,
    /// Check that the host application can be launched.
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing (stderr; stdout carries command output) ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bsm_api=info,bsm_core=info,bsm_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // --- Configuration ---
    let mut config = ManagerConfig::from_env()?;
    if let Some(dir) = cli.scripts_dir {
        config.scripts_dir = dir;
    }
    if let Some(path) = cli.blender_path {
        config.blender_path = Some(path);
    }
    if let Some(secs) = cli.timeout_secs {
        config.execution_timeout = Duration::from_secs(secs);
    }
    tracing::debug!(scripts_dir = %config.scripts_dir.display(), "Loaded manager configuration");

    let orchestrator = ScriptOrchestrator::from_config(&config)
        .await
        .with_context(|| format!("open script repository {}", config.scripts_dir.display()))?;

    match cli.command {
        Command::List => println!("{}", orchestrator.list_scripts_json().await?),
        Command::Get { name } => print!("{}", orchestrator.get_script(&name).await?),
        Command::Result { name } => print!("{}", orchestrator.get_result(&name).await?),
        Command::Add { name, content } => {
            let content = read_content(&content)?;
            println!("{}", orchestrator.add_script(&name, &content).await);
        }
        Command::Edit { name, content } => {
            let content = read_content(&content)?;
            println!("{}", orchestrator.edit_script(&name, &content).await);
        }
        Command::Remove { name } => println!("{}", orchestrator.remove_script(&name).await),
        Command::Exec { name, blend_file } => {
            println!(
                "{}",
                orchestrator
                    .execute_script(&name, blend_file.as_deref())
                    .await
            );
        }
        Command::Examples => {
            for (example, line) in orchestrator.install_examples().await {
                println!("{line}");
                println!("    {}", example.description);
            }
        }
        Command::Doctor => {
            let status = orchestrator.host_status().await;
            println!("host: {}", orchestrator.harness().host().path().display());
            println!("{}", status.detail);
            if !status.installed {
                anyhow::bail!("host application is not available");
            }
        }
    }

    Ok(())
}

/// Read script content from `path`, or from stdin when `path` is `-`.
fn read_content(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("read script content from stdin")?;
        return Ok(content);
    }
    std::fs::read_to_string(path).with_context(|| format!("read script content: {}", path.display()))
}
