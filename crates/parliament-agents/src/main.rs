use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use debate::{
    Conversation, ConversationStore, DebateConfig, DebateScheduler, JsonFileStore, Message,
    StreamEvent, TranscriptState,
};
use parliament_agents::{AppConfig, OpenRouterAgent, ToolRegistry};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Three-role LLM debate engine", long_about = None)]
struct Cli {
    /// Path to a TOML config file (overrides environment defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Conversation data directory (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a debate on a motion, streaming the transcript to stdout
    Debate {
        /// The motion to debate
        motion: String,

        /// Proponent+Critic rounds (1-10)
        #[arg(long)]
        rounds: Option<u32>,

        /// Disable tool use (speakers argue from general knowledge)
        #[arg(long, default_value_t = false)]
        no_tools: bool,

        /// Model for the Proponent
        #[arg(long)]
        pro_model: Option<String>,

        /// Model for the Critic
        #[arg(long)]
        con_model: Option<String>,

        /// Model for the Moderator
        #[arg(long)]
        moderator_model: Option<String>,

        /// Continue an existing conversation instead of starting fresh
        #[arg(long)]
        conversation: Option<String>,
    },
    /// List stored conversations, newest first
    List,
    /// Print a stored conversation
    Show {
        /// Conversation id
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut app_config = AppConfig::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        app_config.data_dir = data_dir;
    }
    let store = Arc::new(JsonFileStore::new(&app_config.data_dir)?);

    match cli.command {
        Command::Debate {
            motion,
            rounds,
            no_tools,
            pro_model,
            con_model,
            moderator_model,
            conversation,
        } => {
            let mut session_config = DebateConfig::default();
            if let Some(rounds) = rounds {
                session_config.max_rounds = rounds;
            }
            session_config.enable_tools = !no_tools;
            if let Some(model) = pro_model {
                session_config.pro_model = model;
            }
            if let Some(model) = con_model {
                session_config.con_model = model;
            }
            if let Some(model) = moderator_model {
                session_config.moderator_model = model;
            }
            run_debate(&app_config, session_config, store, motion, conversation).await
        }
        Command::List => list_conversations(store.as_ref()).await,
        Command::Show { id } => show_conversation(store.as_ref(), &id).await,
    }
}

async fn run_debate(
    app_config: &AppConfig,
    session_config: DebateConfig,
    store: Arc<JsonFileStore>,
    motion: String,
    conversation: Option<String>,
) -> Result<()> {
    if app_config.api_key.is_empty() {
        bail!("OPENROUTER_API_KEY is not set; cannot run a debate");
    }

    let agent = Arc::new(OpenRouterAgent::new(app_config)?);
    let tools = Arc::new(ToolRegistry::new(app_config)?);
    let scheduler = Arc::new(DebateScheduler::new(agent, tools, store, session_config)?);

    let (id, mut rx) = scheduler.spawn(motion, conversation);
    info!(conversation = %id, "debate started");

    let mut transcript = TranscriptState::new();
    while let Some(event) = rx.recv().await {
        let terminal = event.is_terminal();
        print_event(&event);
        transcript = transcript.apply(&event);
        if terminal {
            break;
        }
    }

    if let Some(error) = transcript.error {
        bail!("debate failed: {error}");
    }
    println!("\nConversation saved as {id}");
    Ok(())
}

fn print_event(event: &StreamEvent) {
    match event {
        StreamEvent::Message { name, content, .. } => {
            let who = name.map(|s| s.label()).unwrap_or("User");
            println!("\n## {who}\n{content}");
        }
        StreamEvent::ToolCall { name, calls } => {
            for call in calls {
                println!("  [{name} calls {}({})]", call.name, call.args);
            }
        }
        StreamEvent::ToolOutput { content, .. } => {
            println!("  [tool] {}", first_line(content));
        }
        StreamEvent::Status { detail } => println!("  -- {detail}"),
        StreamEvent::Title { title } => println!("# {title}"),
        StreamEvent::Complete => println!("\n[debate complete]"),
        StreamEvent::Error { message } => eprintln!("\n[debate failed: {message}]"),
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

async fn list_conversations(store: &dyn ConversationStore) -> Result<()> {
    let summaries = store.list().await?;
    if summaries.is_empty() {
        println!("No conversations yet.");
        return Ok(());
    }
    for summary in summaries {
        println!(
            "{}  {}  {:>3} messages  {}",
            summary.id,
            summary.created_at.format("%Y-%m-%d %H:%M"),
            summary.message_count,
            summary.title.as_deref().unwrap_or("(untitled)"),
        );
    }
    Ok(())
}

async fn show_conversation(store: &dyn ConversationStore, id: &str) -> Result<()> {
    let conversation = store.get(id).await?;
    print_conversation(&conversation);
    Ok(())
}

fn print_conversation(conversation: &Conversation) {
    if let Some(title) = &conversation.title {
        println!("# {title}");
    }
    for message in &conversation.messages {
        print_message(message);
    }
}

fn print_message(message: &Message) {
    let who = message
        .name
        .map(|s| s.label().to_string())
        .unwrap_or_else(|| message.role.to_string());
    println!("\n## {who}");
    for call in &message.tool_calls {
        println!("  [called {}({})]", call.name, call.args);
    }
    println!("{}", message.content);
}
