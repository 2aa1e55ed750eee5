use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::*;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use ragchat_cli::{
    display_banner, handle_input_with_history, logging, parse_command, print_error,
    print_fragment, print_help, print_notice, print_outcome, print_sources, print_transcript,
    Command,
};
use ragchat_core::{
    ChatModelProvider, ChunkingConfig, EmbeddingProvider, NoopNotifier, Notifier, RagConfig,
    ReusePolicy,
};
use ragchat_nvidia::{NvidiaChatClient, NvidiaConfig, NvidiaEmbeddings};
use ragchat_rag::{HashingEmbedder, Providers, Reply, Session, NO_KNOWLEDGE_BASE_NOTICE};
use ragchat_telegram::TelegramNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EmbedderKind {
    /// NVIDIA AI endpoints (passage/query embeddings)
    Nvidia,
    /// Offline feature hashing, no API key needed
    Hashing,
}

#[derive(Parser)]
#[command(name = "ragchat", version)]
#[command(about = "Chat with a folder of local documents", long_about = None)]
struct Cli {
    /// Directory holding the documents to index
    #[arg(long, env = "RAGCHAT_DOCS_DIR", default_value = "./uploaded_docs")]
    docs_dir: PathBuf,

    /// Where the vector index snapshot is stored
    #[arg(long, env = "RAGCHAT_SNAPSHOT", default_value = "./vectorstore.json")]
    snapshot: PathBuf,

    /// Rebuild the index even if a snapshot exists
    #[arg(long)]
    rebuild: bool,

    /// Only read files directly inside the document directory
    #[arg(long)]
    no_recursive: bool,

    /// Chunk size in characters
    #[arg(long, env = "RAGCHAT_CHUNK_SIZE", default_value_t = 2000)]
    chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, env = "RAGCHAT_CHUNK_OVERLAP", default_value_t = 200)]
    chunk_overlap: usize,

    /// Number of chunks retrieved per question
    #[arg(long, env = "RAGCHAT_TOP_K", default_value_t = ragchat_core::DEFAULT_TOP_K)]
    top_k: usize,

    /// Name attached to forwarded questions
    #[arg(long, env = "RAGCHAT_USER_NAME", default_value = "Anon")]
    name: String,

    #[arg(long, value_enum, env = "RAGCHAT_EMBEDDER", default_value = "nvidia")]
    embedder: EmbedderKind,

    /// Ask a single question and exit
    #[arg(short, long)]
    question: Option<String>,

    /// File whose contents replace the default system prompt
    #[arg(long)]
    system_prompt_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = RagConfig {
        docs_dir: cli.docs_dir.clone(),
        snapshot_path: cli.snapshot.clone(),
        reuse: ReusePolicy::from_rebuild_flag(cli.rebuild),
        recursive: !cli.no_recursive,
        chunking: ChunkingConfig::new(cli.chunk_size, cli.chunk_overlap)?,
        top_k: cli.top_k,
    };

    // Providers are built once and shared by every question
    let nvidia = NvidiaConfig::from_env()?;
    let embedder: Arc<dyn EmbeddingProvider> = match cli.embedder {
        EmbedderKind::Nvidia => Arc::new(NvidiaEmbeddings::new(nvidia.clone())?),
        EmbedderKind::Hashing => Arc::new(HashingEmbedder::default()),
    };
    let chat_model = Arc::new(NvidiaChatClient::new(nvidia)?);
    let model_id = chat_model.model_id().to_string();
    let notifier: Arc<dyn Notifier> = match TelegramNotifier::from_env() {
        Ok(telegram) => Arc::new(telegram),
        Err(e) => {
            info!(reason = %e, "Telegram notifications disabled");
            Arc::new(NoopNotifier)
        }
    };
    info!(embedder = embedder.model_id(), chat_model = %model_id, "providers ready");

    let system_prompt = match &cli.system_prompt_file {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read system prompt from {}", path.display()))?,
        ),
        None => None,
    };

    println!("{} Preparing knowledge base...", "⏳".blue());
    let providers = Providers {
        embedder,
        chat_model,
        notifier,
    };
    let mut session = match Session::start(config, providers).await {
        Ok(session) => session.with_user_name(cli.name.clone()),
        Err(e) => {
            print_error(&format!("Startup failed: {}", e));
            return Err(e.into());
        }
    };
    if let Some(prompt) = system_prompt {
        session = session.with_system_prompt(prompt);
    }
    if let Some(outcome) = session.outcome() {
        print_outcome(outcome);
    }

    if let Some(question) = cli.question {
        return answer(&mut session, &question).await.map_err(Into::into);
    }

    display_banner(&cli.docs_dir, &model_id);

    let mut history = Vec::new();
    while let Some(line) = handle_input_with_history(&mut history).await? {
        match parse_command(&line) {
            Command::Empty => continue,
            Command::Exit => break,
            Command::Help => print_help(),
            Command::History => print_transcript(session.transcript()),
            Command::Ask(question) => {
                if let Err(e) = answer(&mut session, &question).await {
                    print_error(&format!("Answer failed: {}", e));
                }
            }
        }
    }

    println!("{}", "👋 Goodbye!".green());
    Ok(())
}

/// Stream one answer to stdout
async fn answer(session: &mut Session, question: &str) -> ragchat_core::Result<()> {
    print!("{} ", "Assistant:".cyan().bold());
    let result = session.ask(question, print_fragment).await;
    println!();
    match result? {
        Reply::Answered(_) => {
            print_sources(session.last_sources());
            println!();
        }
        Reply::NoKnowledgeBase => print_notice(NO_KNOWLEDGE_BASE_NOTICE),
        Reply::Ignored => {}
    }
    Ok(())
}
