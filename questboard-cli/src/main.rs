use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod draft_chat;
mod llm;
mod quests_cmd;
mod state;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("QUESTBOARD_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "questboard", version = VERSION, about = "Quest marketplace CLI: browse quests and draft new ones")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter and sort a quest list
    Quests(quests_cmd::QuestsArgs),

    /// Draft a quest with the assistant (interactive)
    Draft(draft_chat::DraftArgs),

    /// Manage ~/.questboard/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Store provider API keys in ~/.questboard/auth.json
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Paste an OpenAI (or compatible) API key
    PasteOpenaiApiKey,
    /// Paste an Anthropic API key
    PasteAnthropicApiKey,
}

/// `QUESTBOARD_LOG` wins; otherwise `[log] level` from config. Output goes to stderr.
fn init_tracing(config_level: Option<&str>) {
    let filter = EnvFilter::try_from_env("QUESTBOARD_LOG")
        .or_else(|_| EnvFilter::try_new(config_level.unwrap_or("warn")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config();
    init_tracing(cfg.as_ref().ok().map(|c| c.log.level.as_str()));

    match cli.command {
        Command::Quests(args) => {
            quests_cmd::run(args)?;
        }

        Command::Draft(args) => {
            let cfg = cfg?;
            let auth = auth::load_auth()?;
            let model = llm::HttpQuestModel::from_config(&cfg.llm, &auth)?;
            tracing::info!(model = %model.describe(), "draft session");
            draft_chat::run(args, &model).await?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },

        Command::Auth { command } => match command {
            AuthCommand::PasteOpenaiApiKey => auth::openai_paste_api_key()?,
            AuthCommand::PasteAnthropicApiKey => auth::anthropic_paste_api_key()?,
        },
    }

    Ok(())
}
