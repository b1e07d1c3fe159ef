use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use avatar_catalog::{
    config::AppConfig,
    engine::{
        batch::{RunHandle, SyncEngine},
        outcome::{SyncOutcome, SyncProgress},
        summary::SyncSummary,
    },
    export::{self, ExportFormat},
    ordering::SortMode,
    parser::InputParser,
    persist::sqlite::SqliteDocumentSink,
    remote::http::HttpGateway,
    runtime::handle::open_catalog,
};

#[derive(Debug, Parser)]
#[command(
    name = "avatar-catalog",
    version,
    about = "Local avatar catalog synced with the remote avatar API"
)]
struct Cli {
    /// JSON config file; missing keys fall back to defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// SQLite database holding the catalog document.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import ids, links or CSV rows from a file (`-` for stdin).
    Import { input: PathBuf },
    /// Re-check avatars against the remote API.
    Verify {
        ids: Vec<String>,
        #[arg(long, conflicts_with = "ids")]
        all: bool,
        /// Write `id,name` of avatars found unavailable to this file.
        #[arg(long)]
        unavailable_out: Option<PathBuf>,
    },
    /// Remove avatars from the catalog.
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Print the catalog in display order.
    List {
        #[arg(long, default_value = "newest")]
        sort: SortMode,
        #[arg(long)]
        search: Option<String>,
    },
    /// Export the catalog.
    Export {
        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Switch into an avatar.
    Select { id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Txt,
}

impl From<Format> for ExportFormat {
    fn from(value: Format) -> Self {
        match value {
            Format::Csv => ExportFormat::Csv,
            Format::Txt => ExportFormat::Text,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("avatar_catalog=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = match &cli.config {
        Some(path) => AppConfig::from_json_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(db) = cli.db {
        cfg.database_path = db;
    }
    if let Ok(cookie) = std::env::var("VRC_AUTH_COOKIE") {
        cfg.gateway.auth_cookie = Some(cookie);
    }

    let sink = SqliteDocumentSink::open(&cfg.database_path)
        .with_context(|| format!("opening {}", cfg.database_path.display()))?;
    let catalog = open_catalog(Box::new(sink), cfg.runtime.clone()).await?;
    let gateway = Arc::new(HttpGateway::new(&cfg.gateway)?);
    let engine = SyncEngine::new(catalog.clone(), gateway, cfg.sync.clone());
    let parser = InputParser::default();

    let result = run_command(cli.command, &engine, &parser).await;
    catalog.shutdown().await?;
    result
}

async fn run_command(
    cmd: Command,
    engine: &SyncEngine,
    parser: &InputParser,
) -> anyhow::Result<()> {
    match cmd {
        Command::Import { input } => {
            let text = read_input(&input).await?;
            let ids = parser.parse(&text);
            if ids.is_empty() {
                bail!("no valid avatar ids found in {}", input.display());
            }
            let summary = drive(engine.start_import(ids)).await?;
            print_summary(&summary);
        }
        Command::Verify {
            ids,
            all,
            unavailable_out,
        } => {
            let run = if all {
                engine.verify_all().await?
            } else {
                let ids = parser.parse(&ids.join("\n"));
                if ids.is_empty() {
                    bail!("pass avatar ids or --all");
                }
                engine.start_verify(ids)
            };
            let summary = drive(run).await?;
            print_summary(&summary);
            if let Some(path) = unavailable_out {
                if !summary.unavailable_export.is_empty() {
                    let body = export::unavailable_to_text(&summary.unavailable_export);
                    tokio::fs::write(&path, body)
                        .await
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("unavailable list written to {}", path.display());
                }
            }
        }
        Command::Delete { ids } => {
            let ids = parser.parse(&ids.join("\n"));
            let summary = drive(engine.start_delete(ids)).await?;
            print_summary(&summary);
        }
        Command::List { sort, search } => {
            let avatars = engine
                .catalog()
                .search(search.unwrap_or_default(), sort)
                .await?;
            for a in &avatars {
                println!("{}\t{}\t{}", a.id, a.name, a.author_name);
            }
            println!("{} avatars", avatars.len());
        }
        Command::Export { format, out } => {
            let body = match ExportFormat::from(format) {
                ExportFormat::Csv => engine.catalog().to_csv().await?,
                ExportFormat::Text => engine.catalog().to_text().await?,
            };
            match out {
                Some(path) => tokio::fs::write(&path, body)
                    .await
                    .with_context(|| format!("writing {}", path.display()))?,
                None => println!("{body}"),
            }
        }
        Command::Select { id } => {
            engine
                .select(&id)
                .await
                .map_err(|failure| anyhow::anyhow!("switching to {id}: {failure}"))?;
            println!("switched to {id}");
        }
    }
    Ok(())
}

async fn read_input(input: &Path) -> anyhow::Result<String> {
    if input.as_os_str() == "-" {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        return Ok(text);
    }
    tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("reading {}", input.display()))
}

/// Renders progress to stderr until the run completes. Ctrl-C cancels.
async fn drive(run: RunHandle) -> anyhow::Result<SyncSummary> {
    let cancel = run.cancel_token();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("cancelling after the current item...");
            cancel.cancel();
        }
    });

    let summary = run.drive(render_progress).await;
    watcher.abort();
    Ok(summary?)
}

fn render_progress(p: &SyncProgress) {
    let status = match &p.item.outcome {
        SyncOutcome::Resolved { .. } => "ok".to_string(),
        SyncOutcome::Duplicate => "duplicate".to_string(),
        SyncOutcome::Unavailable { .. } => "unavailable".to_string(),
        SyncOutcome::Failed(failure) => format!("failed: {failure}"),
    };
    eprintln!(
        "[{:>3}%] {}/{} {} {}",
        p.percent,
        p.index + 1,
        p.total,
        p.item.id,
        status
    );
}

fn print_summary(s: &SyncSummary) {
    let cancelled = if s.cancelled { " (cancelled)" } else { "" };
    println!(
        "{} run: {}/{} processed{cancelled}",
        s.kind,
        s.processed(),
        s.requested
    );
    if s.resolved > 0 {
        println!("  succeeded: {}", s.resolved);
    }
    if s.duplicates > 0 {
        println!("  skipped duplicates: {}", s.duplicates);
        for id in &s.duplicate_ids {
            println!("    {id}");
        }
    }
    if s.unavailable > 0 {
        println!("  unavailable and removed: {}", s.unavailable);
        for (id, name) in &s.unavailable_export {
            println!("    {id} {name}");
        }
    }
    if s.failed > 0 {
        println!("  failed: {}", s.failed);
        for (reason, ids) in s.failures_by_reason() {
            println!("    {reason}:");
            for id in ids {
                println!("      {id}");
            }
        }
    }
}
