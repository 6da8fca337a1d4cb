mod chat;
mod config;
mod llm;
mod project;
mod prompts;
mod shortcuts;
mod storage;
mod ui;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::chat::SendOutcome;
use crate::config::AppConfig;
use crate::llm::gemini::GeminiClient;
use crate::prompts::PromptManager;
use crate::storage::{FileStore, Storage};
use crate::ui::{Command, TeacherMindApp, TerminalConsole};

#[derive(Parser, Debug)]
#[command(name = "teachermind", version)]
#[command(about = "AI assistant for lesson design, backed by Gemini")]
struct Cli {
    /// Directory holding the project and settings records
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// List the built-in lesson-design templates
    Shortcuts,
    /// List saved projects
    Projects,
    /// Create a project, blank or from a template
    New {
        /// Template number or id
        #[arg(long)]
        shortcut: Option<String>,
    },
    /// Send one message to a project and print the reply
    Send { project: String, text: String },
    /// Write a saved work to the export directory as markdown
    Export { project: String, work: String },
    /// Show or change the API key and model
    Settings {
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"))
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;

    if cli.config.is_none() {
        let path = AppConfig::config_file_path();
        if !path.exists() {
            match config.save(&path) {
                Ok(()) => info!("Wrote default config to {}", path.display()),
                Err(e) => warn!("Could not write default config to {}: {}", path.display(), e),
            }
        }
    }

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    info!("🚀 Starting TeacherMind, data in {}", config.data_dir.display());

    let storage = Storage::new(Arc::new(FileStore::new(config.data_dir.clone())?));
    let client = Arc::new(GeminiClient::new(config.endpoint.clone()));
    let prompts = PromptManager::load_from_config(&config.prompts);
    let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();

    let mut app = TeacherMindApp::new(storage, client, prompts, config.export_dir.clone()).with_color(color);
    let mut console = TerminalConsole::new();

    let Some(command) = cli.command else {
        return app.run(&mut console).await;
    };

    match command {
        CliCommand::Shortcuts => {
            app.update(Command::ShowShortcuts, &mut console).await?;
        }
        CliCommand::Projects => {
            app.update(Command::ShowProjects, &mut console).await?;
        }
        CliCommand::New { shortcut } => {
            let command = shortcut.map(Command::UseShortcut).unwrap_or(Command::NewProject);
            app.update(command, &mut console).await?;
            if let Some(id) = app.router().active_project_id() {
                println!("\nid: {}", id);
            }
        }
        CliCommand::Send { project, text } => {
            app.open_project(&project)
                .ok_or_else(|| anyhow!("No project matches '{}'", project))?;
            if let SendOutcome::Failed(_) = app.send(&text, &mut console).await? {
                bail!("The request failed");
            }
        }
        CliCommand::Export { project, work } => {
            app.open_project(&project)
                .ok_or_else(|| anyhow!("No project matches '{}'", project))?;
            app.update(Command::ExportWork(work), &mut console).await?;
        }
        CliCommand::Settings { api_key, model } => {
            let mut commands = Vec::new();
            commands.extend(api_key.map(Command::SetApiKey));
            commands.extend(model.map(Command::SetModel));
            if commands.is_empty() {
                commands.push(Command::ShowSettings);
            }
            for command in commands {
                app.update(command, &mut console).await?;
            }
        }
    }
    Ok(())
}
