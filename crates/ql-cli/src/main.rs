mod server;
mod ticker;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ql_core::{
    Category, ContentTables, DEFAULT_LIST_LIMIT, Engine, EngineConfig, Memory, Poem,
    SystemClock,
};
use ql_store::{CONFIG_FILE, DualStore};
use rmcp::{ServiceExt, transport::stdio};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "ql", about = "Quantum Love state engine CLI and MCP server")]
struct Cli {
    /// Replace the built-in content tables with a TOML file
    #[arg(long, global = true)]
    content: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server on stdio transport
    Serve,

    /// Show the dashboard
    Status,

    /// Show today's word hint
    Word {
        /// Draw the word again for the current hour
        #[arg(long)]
        regenerate: bool,
    },

    /// Guess today's word
    Unlock {
        guess: String,
    },

    /// Reveal every hint for today's word
    Hint,

    /// Add, list or search memories
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Generate, favorite or browse poems
    Poem {
        #[command(subcommand)]
        action: PoemAction,
    },

    /// Talk to the companion
    Chat {
        message: String,

        /// Answer immediately instead of simulating thought
        #[arg(long)]
        no_delay: bool,
    },

    /// Generate predictions for the coming week
    Predict,

    /// Classify text into emotion categories
    Classify {
        text: String,
    },

    /// Nudge the classifier toward the expected category
    Train {
        text: String,
        /// romantic, intellectual, emotional, creative or spiritual
        category: String,
    },

    /// Flush state to both stores
    Save,

    /// Export the state document to a JSON file
    Export {
        /// Output file path
        path: PathBuf,
    },

    /// Discard all state and start over
    Reset,
}

#[derive(Subcommand)]
enum MemoryAction {
    /// Store a new memory
    Add {
        #[arg(id = "memory_content", value_name = "CONTENT")]
        content: String,
        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Most recent memories first
    List {
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
        #[arg(long)]
        tag: Option<String>,
    },
    /// Case-insensitive search over content and tags
    Search {
        query: String,
    },
}

#[derive(Subcommand)]
enum PoemAction {
    /// Compose a poem from the templates
    Generate {
        #[arg(long, default_value = ql_core::poetry::DEFAULT_EMOTION)]
        emotion: String,
    },
    /// Favorite a generated poem by index (0 = newest)
    Favorite {
        index: usize,
    },
    /// One classical poem per matrix category
    Matrix,
    /// Keep a verse as a memory
    Keep {
        verse: String,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Serve => cmd_serve(&cli).await,
        Commands::Status => cmd_status(&cli),
        Commands::Word { regenerate } => cmd_word(&cli, *regenerate),
        Commands::Unlock { guess } => cmd_unlock(&cli, guess),
        Commands::Hint => cmd_hint(&cli),
        Commands::Memory { action } => cmd_memory(&cli, action),
        Commands::Poem { action } => cmd_poem(&cli, action),
        Commands::Chat { message, no_delay } => cmd_chat(&cli, message, *no_delay).await,
        Commands::Predict => cmd_predict(&cli),
        Commands::Classify { text } => cmd_classify(&cli, text),
        Commands::Train { text, category } => cmd_train(&cli, text, category),
        Commands::Save => cmd_save(&cli),
        Commands::Export { path } => cmd_export(&cli, path),
        Commands::Reset => cmd_reset(&cli),
    }
}

fn load_config(dir: &Path) -> Result<EngineConfig> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(EngineConfig::default());
    }
    let src = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    EngineConfig::from_toml(&src).with_context(|| format!("invalid config {}", path.display()))
}

fn load_content(path: Option<&Path>) -> Result<ContentTables> {
    let Some(path) = path else {
        return Ok(ContentTables::builtin());
    };
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    ContentTables::from_toml(&src).with_context(|| format!("invalid content {}", path.display()))
}

fn open_engine(cli: &Cli) -> Result<Engine> {
    let dir = ql_store::data_dir_from_env();
    let config = load_config(&dir)?;
    let content = load_content(cli.content.as_deref())?;
    let store = DualStore::open(&dir, &config.storage_key, config.cookie_expiry_days)
        .with_context(|| format!("failed to open state store in {}", dir.display()))?;
    tracing::debug!("data dir: {}", dir.display());
    Ok(Engine::new(config, content, Box::new(store), Box::new(SystemClock)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    {
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(error) => {
                    tracing::error!(%error, "failed to install SIGTERM handler");
                }
            }
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}

async fn cmd_serve(cli: &Cli) -> Result<()> {
    let engine = open_engine(cli)?;
    tracing::info!("starting MCP server");

    let server = server::QlServer::new(engine);
    let token = CancellationToken::new();
    let ticker = ticker::spawn(server.engine(), server.status(), token.clone());

    let mut signalled = false;
    // a client that hangs up before the handshake is a normal exit
    match server.clone().serve(stdio()).await {
        Ok(service) => {
            tokio::select! {
                quit = service.waiting() => {
                    if let Err(e) = quit {
                        tracing::error!("MCP session failed: {e}");
                    }
                }
                _ = shutdown_signal() => {
                    tracing::info!("shutdown signal received");
                    signalled = true;
                }
            }
        }
        Err(e) => tracing::warn!("MCP session ended before initialization: {e}"),
    }

    token.cancel();
    if let Err(e) = ticker.await {
        tracing::warn!("ticker task failed: {e}");
    }
    if !server.engine().lock().await.save() {
        tracing::warn!("final save failed; state may be stale on next start");
    }
    if signalled {
        // the blocking stdin reader would hold runtime shutdown open
        std::process::exit(0);
    }
    Ok(())
}

fn cmd_status(cli: &Cli) -> Result<()> {
    let mut engine = open_engine(cli)?;
    // the visit counted on load only sticks once written
    engine.save();

    let status = engine.status_line();
    let d = engine.dashboard();
    let doc = engine.snapshot();

    println!("{status}");
    println!("days together: {}", d.days_together);
    println!("memory bank:   {}TB", d.memory_bank_tb);
    println!("ai intimacy:   {}%", d.ai_intimacy);
    println!("entanglement:  {}%", d.entanglement);
    println!("coherence:     {}", d.coherence);
    println!("superposition: {}", d.superposition);
    println!("attempts left: {}", d.attempts_remaining);
    println!("unlock streak: {}", d.unlock_streak);
    println!("density:       {}%", d.memory_density);
    println!("moon:          {} {}", d.moon.emoji, d.moon.name);
    println!("visits:        {}", doc.system.total_visits);
    println!("memories:      {}", doc.memories.storage.len());
    Ok(())
}

fn cmd_word(cli: &Cli, regenerate: bool) -> Result<()> {
    let mut engine = open_engine(cli)?;
    if regenerate {
        engine.generate_todays_word();
    }
    let lock = &engine.snapshot().quantum_lock;
    println!("hint:     {}", lock.todays_hint);
    println!("attempts: {}/{}", lock.attempts, lock.max_attempts);
    Ok(())
}

fn cmd_unlock(cli: &Cli, guess: &str) -> Result<()> {
    let mut engine = open_engine(cli)?;
    let outcome = engine.attempt_unlock(guess);
    println!("{}", outcome.message());
    if outcome.success() {
        let chamber = engine.chamber();
        println!();
        println!("{}", chamber.message);
        if let Some(poem) = &chamber.poem {
            print_poem(poem);
        }
        println!(
            "emotion match {}% | {} | entanglement {}",
            chamber.emotion_match, chamber.temporal_alignment, chamber.entanglement
        );
    }
    Ok(())
}

fn cmd_hint(cli: &Cli) -> Result<()> {
    let engine = open_engine(cli)?;
    println!("{}", engine.reveal_hint());
    Ok(())
}

fn print_memory(m: &Memory) {
    let tags = if m.tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", m.tags.join(", "))
    };
    println!(
        "{}  {}{}  ({}, amplitude {:.2})",
        m.timestamp.format("%Y-%m-%d %H:%M"),
        m.content,
        tags,
        m.quantum_state.as_str(),
        m.emotional_amplitude
    );
}

fn cmd_memory(cli: &Cli, action: &MemoryAction) -> Result<()> {
    let mut engine = open_engine(cli)?;
    match action {
        MemoryAction::Add { content, tags } => {
            if content.trim().is_empty() {
                anyhow::bail!("memory content must not be empty");
            }
            let m = engine.add_memory(content, tags);
            println!("stored {}", m.id);
            print_memory(&m);
        }
        MemoryAction::List { limit, tag } => {
            let found = engine.list_memories(*limit, tag.as_deref());
            if found.is_empty() {
                println!("(no memories)");
            }
            for m in found {
                print_memory(m);
            }
        }
        MemoryAction::Search { query } => {
            let found = engine.search_memories(query);
            if found.is_empty() {
                println!("(no memories found)");
            }
            for m in found {
                print_memory(m);
            }
        }
    }
    Ok(())
}

fn print_poem(poem: &Poem) {
    println!("{}", poem.verse);
    if !poem.translation.is_empty() {
        println!("  {}", poem.translation);
    }
    println!("  -- {}", poem.era);
}

fn cmd_poem(cli: &Cli, action: &PoemAction) -> Result<()> {
    let mut engine = open_engine(cli)?;
    match action {
        PoemAction::Generate { emotion } => {
            let poem = engine.generate_ai_poem(emotion);
            print_poem(&poem);
            println!("(favorite with: ql poem favorite 0)");
        }
        PoemAction::Favorite { index } => match engine.favorite_generated(*index) {
            Some(true) => println!("added to favorites"),
            Some(false) => println!("already a favorite"),
            None => anyhow::bail!("no generated poem at index {index}"),
        },
        PoemAction::Matrix => {
            for poem in engine.poetry_matrix() {
                print_poem(&poem);
                println!();
            }
        }
        PoemAction::Keep { verse } => {
            let m = engine.save_verse_to_memory(verse);
            println!("stored {}", m.id);
        }
    }
    Ok(())
}

async fn cmd_chat(cli: &Cli, message: &str, no_delay: bool) -> Result<()> {
    let mut engine = open_engine(cli)?;
    if !engine.begin_chat(message) {
        anyhow::bail!("message must not be empty");
    }
    if !no_delay {
        let delay = engine.chat_delay();
        eprintln!("thinking...");
        tokio::time::sleep(delay).await;
    }
    println!("{}", engine.complete_chat(message));
    Ok(())
}

fn cmd_predict(cli: &Cli) -> Result<()> {
    let mut engine = open_engine(cli)?;
    for p in engine.generate_predictions() {
        println!("{}  {} {} ({}%)", p.date, p.emoji, p.text, p.confidence);
    }
    Ok(())
}

fn cmd_classify(cli: &Cli, text: &str) -> Result<()> {
    let engine = open_engine(cli)?;
    let resonance = engine.resonance(text);
    let prediction = engine.predict_emotion(text);

    println!("{} {}", resonance.emoji, resonance.label);
    println!("prediction: {} ({:.2})", prediction.label(), prediction.confidence);
    for (category, score) in resonance.breakdown.iter() {
        println!("  {category:<12} {:>5.1}%", score * 100.0);
    }
    Ok(())
}

fn cmd_train(cli: &Cli, text: &str, category: &str) -> Result<()> {
    let mut engine = open_engine(cli)?;
    let expected: Category = category.parse().map_err(anyhow::Error::msg)?;
    let before = engine.train(text, expected);
    println!(
        "predicted {} (expected {expected}); {expected} weight now {:.2}",
        before.label(),
        engine.classifier().weight(expected)
    );
    Ok(())
}

fn cmd_save(cli: &Cli) -> Result<()> {
    let mut engine = open_engine(cli)?;
    if !engine.save() {
        anyhow::bail!("state could not be written to the primary store");
    }
    println!("saved");
    Ok(())
}

fn cmd_export(cli: &Cli, path: &Path) -> Result<()> {
    let engine = open_engine(cli)?;
    let json = engine
        .snapshot()
        .to_json_pretty()
        .context("failed to serialize state")?;
    std::fs::write(path, &json).with_context(|| format!("failed to write {}", path.display()))?;
    println!("exported to {}", path.display());
    Ok(())
}

fn cmd_reset(cli: &Cli) -> Result<()> {
    let mut engine = open_engine(cli)?;
    if !engine.reset() {
        anyhow::bail!("reset state could not be written");
    }
    println!("state reset");
    Ok(())
}
