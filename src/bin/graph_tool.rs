use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use editgraph::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "graph-tool")]
#[command(about = "Developer tooling for editgraph collections")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Runs a scripted edit-and-save session against the in-memory portal.
    Demo {
        #[arg(long)]
        out: Option<PathBuf>,
        /// Record key the portal should reject during the save.
        #[arg(long)]
        fail_on: Option<String>,
    },
    /// Summarizes a serialized note collection.
    Inspect {
        #[arg(long)]
        file: PathBuf,
    },
    FormatVersion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Note {
    slug: String,
    body: String,
    state: ChildState,
}

impl Note {
    fn fetched(slug: &str, body: &str) -> Self {
        Self {
            slug: slug.to_string(),
            body: body.to_string(),
            state: ChildState::fetched_child(),
        }
    }

    fn set_body(&mut self, body: &str) {
        self.body = body.to_string();
        self.state.mark_dirty();
    }
}

impl_editable_child!(Note, state);

impl PortalRecord for Note {
    fn record_key(&self) -> String {
        self.slug.clone()
    }

    fn blank() -> Self {
        Self {
            slug: format!("note-{}", uuid::Uuid::new_v4().simple()),
            body: String::new(),
            state: ChildState::new(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Demo { out, fail_on } => run_demo(out.as_deref(), fail_on).await,
        Command::Inspect { file } => inspect(&file),
        Command::FormatVersion => {
            println!(
                "Collection format version: {}",
                editgraph::COLLECTION_WIRE_FORMAT_VERSION
            );
            Ok(())
        }
    }
}

async fn run_demo(out: Option<&Path>, fail_on: Option<String>) -> Result<()> {
    let portal = InMemoryDataPortal::<Note>::new();
    for (slug, body) in [
        ("groceries", "milk, eggs"),
        ("standup", "ship the release"),
        ("ideas", "rewrite the parser"),
    ] {
        portal.seed(&Note::fetched(slug, body)).await?;
    }
    if let Some(key) = fail_on {
        portal.fail_on(key).await;
    }

    let mut notes = portal.fetch("notes").await?;
    notes.on_change(|change| {
        println!(
            "  change: {:?} index={:?} identity={}",
            change.action, change.index, change.identity
        );
    });
    notes.on_saved(|event| match event.error {
        None => println!("  saved at {}", event.saved_at.to_rfc3339()),
        Some(err) => println!("  save failed at {}: {}", event.saved_at.to_rfc3339(), err),
    });

    println!("Editing '{}' ({} notes)", notes.name(), notes.len());
    notes.edit(0, |note| note.set_body("milk, eggs, bread"))?;
    notes.remove(1)?;
    let created = notes.add_new(&portal).await?;
    created.set_body("call the landlord");

    println!(
        "Before save: dirty={} valid={} pending deletes={}",
        notes.is_dirty(),
        notes.is_valid(),
        notes.deleted_count()
    );

    portal.clear_operations().await;
    let outcome = notes.save(&portal).await;

    println!("Portal journal:");
    for operation in portal.operations().await {
        println!("  {:?} {}", operation.kind, operation.key);
    }
    outcome.context("Save failed")?;

    println!(
        "After save: dirty={} pending deletes={} stored records={}",
        notes.is_dirty(),
        notes.deleted_count(),
        portal.record_count().await
    );

    let json = notes.to_json()?;
    match out {
        Some(path) => {
            ensure_parent_dir(path)?;
            fs::write(path, serde_json::to_string_pretty(&json)?)
                .with_context(|| format!("Failed to write collection to '{}'", path.display()))?;
            println!("Wrote collection: {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&json)?),
    }
    Ok(())
}

fn inspect(file: &Path) -> Result<()> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("Failed to read collection file '{}'", file.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid JSON in '{}'", file.display()))?;
    let notes = EditableCollection::<Note>::from_json(value)
        .map_err(|err| anyhow!("Invalid collection in '{}': {}", file.display(), err))?;

    println!("Collection '{}' (identity {})", notes.name(), notes.identity());
    println!(
        "  child={} dirty={} valid={} busy={}",
        notes.is_child(),
        notes.is_dirty(),
        notes.is_valid(),
        notes.is_busy()
    );
    for note in &notes {
        println!(
            "  #{} {} new={} dirty={}",
            note.identity(),
            note.slug,
            note.is_new(),
            note.is_dirty()
        );
    }
    for note in notes.deleted_items() {
        println!("  deleted #{} {}", note.identity(), note.slug);
    }
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create parent directory '{}'", parent.display()))?;
    }
    Ok(())
}
