use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use recall_core::{
    ContextAssembler, ContextBudget, ContextResult, Document, NoteRead, NoteSource,
    SharedVectorizer, assistant_for, import_snapshot,
};
use recall_store::{RecallHome, Vault};

/// Metadata key recording the vault last indexed.
const LAST_VAULT_KEY: &str = "last_vault";

#[derive(Parser)]
#[command(name = "recall", about = "Local note recall: embeddings, similarity and context assembly")]
struct Cli {
    /// Data directory holding recall.toml and recall.db
    #[arg(long, global = true, env = "RECALL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory of .md / .txt notes
    #[arg(long, global = true, env = "RECALL_VAULT")]
    vault: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Learn IDF weights from every note in the vault
    Index,

    /// Print the embedding of a text as a JSON array
    Embed {
        /// Text to embed
        text: String,
    },

    /// Rank vault notes by similarity to a query
    Similar {
        /// Query text
        query: String,

        /// Number of results (defaults to config top_k)
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Assemble a budgeted context block for a query
    Context {
        /// Query text
        query: String,

        /// Note id to pin (repeatable)
        #[arg(long = "pin")]
        pins: Vec<String>,

        /// Total character budget (defaults to config budget)
        #[arg(long)]
        budget: Option<usize>,

        /// Print the full result with metrics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Answer a question from the notes most relevant to it
    Ask {
        /// Question text
        question: String,

        /// Note id to pin (repeatable)
        #[arg(long = "pin")]
        pins: Vec<String>,
    },

    /// Summarize a single note
    Summarize {
        /// Note id (path relative to the vault)
        id: String,

        /// Maximum summary length in characters
        #[arg(long, default_value_t = 500)]
        max_chars: usize,
    },

    /// Show vectorizer and store statistics
    Stats,

    /// Export the vectorizer snapshot to a JSON file
    Export {
        /// Output file path
        path: PathBuf,
    },

    /// Import a vectorizer snapshot from a JSON file
    Import {
        /// Input file path
        path: PathBuf,
    },
}

fn open_home(cli: &Cli) -> Result<RecallHome> {
    RecallHome::open(cli.data_dir.as_deref()).context("failed to open data directory")
}

fn open_vault(cli: &Cli) -> Result<Vault> {
    let Some(root) = cli.vault.as_deref() else {
        bail!("no vault given: pass --vault or set RECALL_VAULT");
    };
    Vault::open(root).with_context(|| format!("failed to open vault {}", root.display()))
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
        Commands::Index => cmd_index(&cli).await,
        Commands::Embed { text } => cmd_embed(&cli, text),
        Commands::Similar { query, top_k } => cmd_similar(&cli, query, *top_k).await,
        Commands::Context {
            query,
            pins,
            budget,
            json,
        } => cmd_context(&cli, query, pins, *budget, *json).await,
        Commands::Ask { question, pins } => cmd_ask(&cli, question, pins).await,
        Commands::Summarize { id, max_chars } => cmd_summarize(&cli, id, *max_chars),
        Commands::Stats => cmd_stats(&cli),
        Commands::Export { path } => cmd_export(&cli, path),
        Commands::Import { path } => cmd_import(&cli, path),
    }
}

/// Read notes on the blocking pool, preserving input order.
async fn read_notes(vault: &Vault, ids: Vec<String>) -> Result<Vec<NoteRead>> {
    let mut handles = Vec::with_capacity(ids.len());
    for id in ids {
        let vault = vault.clone();
        handles.push(tokio::task::spawn_blocking(move || vault.read_note(&id)));
    }

    let mut notes = Vec::with_capacity(handles.len());
    for handle in handles {
        notes.push(handle.await.context("note reader task failed")?);
    }
    Ok(notes)
}

async fn read_vault(vault: &Vault) -> Result<Vec<NoteRead>> {
    read_notes(vault, vault.scan()).await
}

/// Assemble context for `query` over the whole vault. Also returns every
/// note read, pinned first.
async fn assemble(
    cli: &Cli,
    home: &RecallHome,
    query: &str,
    pins: &[String],
    budget: Option<usize>,
) -> Result<(ContextResult, Vec<NoteRead>)> {
    let vault = open_vault(cli)?;
    let pinned = read_notes(&vault, pins.to_vec()).await?;
    let candidates = read_vault(&vault).await?;

    let budget = match budget {
        Some(total) => ContextBudget {
            total_chars: total,
            ..home.config().budget.clone()
        },
        None => home.config().budget.clone(),
    };
    let result = ContextAssembler::new(budget).build(query, &pinned, &candidates);
    let mut notes = pinned;
    notes.extend(candidates);
    Ok((result, notes))
}

/// Bodies of the notes in `ids`, in order, without markdown heading lines.
fn source_passages(ids: &[String], notes: &[NoteRead]) -> String {
    ids.iter()
        .filter_map(|id| notes.iter().flatten().find(|note| &note.id == id))
        .map(|note| {
            note.body
                .lines()
                .filter(|line| !line.trim_start().starts_with('#'))
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

async fn cmd_index(cli: &Cli) -> Result<()> {
    let home = open_home(cli)?;
    let vault = open_vault(cli)?;
    let mut vectorizer = home.load_vectorizer().context("failed to load vectorizer")?;

    let reads = read_vault(&vault).await?;
    let mut texts = Vec::with_capacity(reads.len());
    let mut skipped = 0;
    for read in reads {
        match read {
            Ok(note) => texts.push(Document::from(&note).text),
            Err(e) => {
                tracing::warn!("skipping note: {e}");
                skipped += 1;
            }
        }
    }

    vectorizer.update_idf(&texts);
    home.save_vectorizer(&vectorizer)
        .context("failed to save vectorizer")?;
    home.store()
        .set_metadata(LAST_VAULT_KEY, &vault.root().display().to_string())
        .context("failed to record vault")?;
    tracing::info!("indexed {} notes from {}", texts.len(), vault.root().display());

    println!(
        "indexed {} notes ({} skipped). corpus={}, terms={}",
        texts.len(),
        skipped,
        vectorizer.idf().corpus_size(),
        vectorizer.idf().len()
    );
    Ok(())
}

fn cmd_embed(cli: &Cli, text: &str) -> Result<()> {
    let home = open_home(cli)?;
    let mut vectorizer = home.load_vectorizer().context("failed to load vectorizer")?;

    let embedding = vectorizer.embed(text);
    let json = serde_json::to_string(&embedding).context("failed to serialize embedding")?;
    println!("{json}");
    Ok(())
}

async fn cmd_similar(cli: &Cli, query: &str, top_k: Option<usize>) -> Result<()> {
    let home = open_home(cli)?;
    let vault = open_vault(cli)?;
    let mut vectorizer = home.load_vectorizer().context("failed to load vectorizer")?;

    let documents: Vec<Document> = read_vault(&vault)
        .await?
        .into_iter()
        .filter_map(|read| match read {
            Ok(note) => Some(Document::from(&note)),
            Err(e) => {
                tracing::warn!("skipping note: {e}");
                None
            }
        })
        .collect();

    let top_k = top_k.unwrap_or(home.config().top_k);
    let results = vectorizer
        .find_similar(query, &documents, top_k)
        .context("failed to rank notes")?;

    if results.is_empty() {
        println!("(no notes found)");
    }
    for item in &results {
        println!("{:.4}  {}", item.score, item.id);
    }
    Ok(())
}

async fn cmd_context(
    cli: &Cli,
    query: &str,
    pins: &[String],
    budget: Option<usize>,
    json: bool,
) -> Result<()> {
    let home = open_home(cli)?;
    let (result, _) = assemble(cli, &home, query, pins, budget).await?;

    if json {
        let out = serde_json::to_string_pretty(&result).context("failed to serialize context")?;
        println!("{out}");
        return Ok(());
    }

    if result.context.is_empty() {
        println!("(no context)");
    } else {
        println!("{}", result.context);
    }

    if cli.verbose {
        let m = &result.metrics;
        eprintln!(
            "--- metrics: pinned={}, relevant={}, metadata={}, skipped={}, chars={}/{} ---",
            m.pinned, m.relevant, m.metadata, m.skipped, m.chars_used, m.budget
        );
    }
    Ok(())
}

async fn cmd_ask(cli: &Cli, question: &str, pins: &[String]) -> Result<()> {
    let home = open_home(cli)?;
    let (result, notes) = assemble(cli, &home, question, pins, None).await?;
    let passages = source_passages(&result.included_ids, &notes);

    let vectorizer = home.load_vectorizer().context("failed to load vectorizer")?;
    let assistant = assistant_for(home.config().assistant, SharedVectorizer::from(vectorizer));
    let answer = assistant
        .answer_question(question, &passages)
        .context("assistant failed to answer")?;

    if answer.is_empty() {
        println!("(no answer found)");
    } else {
        println!("{answer}");
    }

    if cli.verbose {
        eprintln!(
            "--- assistant={}, sources: {} ---",
            assistant.name(),
            result.included_ids.join(", ")
        );
    }
    Ok(())
}

fn cmd_summarize(cli: &Cli, id: &str, max_chars: usize) -> Result<()> {
    let home = open_home(cli)?;
    let vault = open_vault(cli)?;
    let note = vault
        .read_note(id)
        .with_context(|| format!("failed to read note {id}"))?;

    let vectorizer = home.load_vectorizer().context("failed to load vectorizer")?;
    let assistant = assistant_for(home.config().assistant, SharedVectorizer::from(vectorizer));
    let summary = assistant
        .summarize(&note.body, max_chars)
        .context("assistant failed to summarize")?;

    println!("{}", note.title);
    println!("{summary}");
    Ok(())
}

fn cmd_stats(cli: &Cli) -> Result<()> {
    let home = open_home(cli)?;
    let vectorizer = home.load_vectorizer().context("failed to load vectorizer")?;
    let snapshots = home
        .store()
        .list_snapshots()
        .context("failed to list snapshots")?;

    println!("dimension:  {}", vectorizer.dimension());
    println!("words:      {}", vectorizer.word_cache().len());
    println!("terms:      {}", vectorizer.idf().len());
    println!("corpus:     {}", vectorizer.idf().corpus_size());
    if let Some(vault) = home
        .store()
        .get_metadata(LAST_VAULT_KEY)
        .context("failed to read metadata")?
    {
        println!("vault:      {vault}");
    }
    println!("snapshots:  {}", snapshots.len());
    for info in &snapshots {
        println!(
            "  {} (dim={}, words={}, saved_at={})",
            info.name, info.dimension, info.words, info.saved_at
        );
    }
    Ok(())
}

fn cmd_export(cli: &Cli, path: &Path) -> Result<()> {
    let home = open_home(cli)?;
    let vectorizer = home.load_vectorizer().context("failed to load vectorizer")?;

    let json = vectorizer.serialize().context("failed to serialize vectorizer")?;
    std::fs::write(path, &json).with_context(|| format!("failed to write {}", path.display()))?;

    println!("exported to {}", path.display());
    Ok(())
}

fn cmd_import(cli: &Cli, path: &Path) -> Result<()> {
    let home = open_home(cli)?;
    let payload = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let vectorizer = import_snapshot(&payload).context("failed to import snapshot")?;
    home.save_vectorizer(&vectorizer)
        .context("failed to save vectorizer")?;

    println!(
        "imported from {}. dimension={}, words={}, corpus={}",
        path.display(),
        vectorizer.dimension(),
        vectorizer.word_cache().len(),
        vectorizer.idf().corpus_size()
    );
    Ok(())
}
