use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use pastedb_sdk::{DatabaseConfig, Document, Files, FsBlobStore, PasteDb, Revision, SetOptions};
use serde_json::{json, Value};
use tracing::debug;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    let format = cli.format;
    let data_dir = cli.data_dir.clone();

    match cli.command {
        Command::Create(args) => cmd_create(config, &data_dir, args, format).await,
        Command::Destroy(args) => cmd_destroy(config, &data_dir, args, format).await,
        Command::Get(args) => {
            let db = open(config, &data_dir).await?;
            cmd_get(&db, args, format).await
        }
        Command::Set(args) => {
            let db = open(config, &data_dir).await?;
            cmd_set(&db, args, format).await
        }
        Command::Delete(args) => {
            let db = open(config, &data_dir).await?;
            cmd_delete(&db, args, format).await
        }
        Command::Keys => {
            let db = open(config, &data_dir).await?;
            cmd_keys(&db, format).await
        }
        Command::Purge => {
            let db = open(config, &data_dir).await?;
            cmd_purge(&db, format).await
        }
    }
}

/// Config file, then environment, then command-line flags.
fn resolve_config(cli: &Cli) -> anyhow::Result<DatabaseConfig> {
    let base = match &cli.config {
        Some(path) => DatabaseConfig::load(path)?,
        None => DatabaseConfig::default(),
    };
    let mut config = base.apply_env()?;
    if let Some(root) = &cli.root {
        config = config.with_root(root.as_str());
    }
    if let Some(mode) = cli.compression {
        config = config.with_compression(mode);
    }
    Ok(config)
}

async fn store_at(data_dir: &Path) -> anyhow::Result<Arc<FsBlobStore>> {
    let store = FsBlobStore::open(data_dir)
        .await
        .with_context(|| format!("opening blob store at {}", data_dir.display()))?;
    Ok(Arc::new(store))
}

async fn open(config: DatabaseConfig, data_dir: &Path) -> anyhow::Result<PasteDb> {
    if config.root_id.is_none() {
        bail!("no database selected: pass --root or set PASTEDB_ROOT_ID");
    }
    let store = store_at(data_dir).await?;
    Ok(PasteDb::init(config, store).await?)
}

async fn cmd_create(
    config: DatabaseConfig,
    data_dir: &Path,
    args: CreateArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut config = config.with_public(args.public);
    config.root_id = None;
    if let Some(description) = args.description {
        config = config.with_description(description);
    }
    let public = config.public;
    let description = config.description.clone();

    let store = store_at(data_dir).await?;
    let db = PasteDb::init(config, store).await?;
    let root = db.root();

    match format {
        OutputFormat::Json => print_json(&json!({
            "id": root.id,
            "url": root.url,
            "public": public,
            "description": description,
        }))?,
        OutputFormat::Text => {
            println!("{} Database created", "✓".green().bold());
            println!("  Root: {}", root.id.to_string().yellow().bold());
            println!("  URL:  {}", root.url.blue());
            if let Some(description) = description {
                println!("  Description: {description}");
            }
        }
    }
    Ok(())
}

async fn cmd_destroy(
    config: DatabaseConfig,
    data_dir: &Path,
    args: DestroyArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let config = config.with_root(args.root_id.as_str());
    let store = store_at(data_dir).await?;
    let db = PasteDb::init(config, store).await?;
    let report = db.destroy().await?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "root": args.root_id,
            "documentsRemoved": report.documents_removed,
            "failures": report.failures,
        }))?,
        OutputFormat::Text => {
            println!(
                "{} Database {} destroyed",
                "✓".green().bold(),
                args.root_id.yellow()
            );
            println!("  Documents removed: {}", report.documents_removed);
            if report.failures > 0 {
                println!("  {} {}", "Failures:".red(), report.failures);
            }
        }
    }
    Ok(())
}

async fn cmd_get(db: &PasteDb, args: GetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let found = match &args.rev {
        Some(rev) => db.get_at_revision(args.key.as_str(), &Revision::new(rev.as_str())).await?,
        None => db.get(args.key.as_str()).await?,
    };
    let Some(doc) = found else {
        match format {
            OutputFormat::Json => print_json(&Value::Null)?,
            OutputFormat::Text => println!("{} {}", "not found:".red(), args.key),
        }
        return Ok(());
    };
    match format {
        OutputFormat::Json => print_json(&doc)?,
        OutputFormat::Text => print_document(&doc)?,
    }
    Ok(())
}

async fn cmd_set(db: &PasteDb, args: SetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let value: Value = serde_json::from_str(&args.value).context("value is not valid JSON")?;
    let mut opts = SetOptions::new(value);
    if let Some(ms) = args.ttl_ms {
        opts = opts.with_ttl(Duration::from_millis(ms));
    }
    if let Some(rev) = args.rev {
        opts = opts.with_rev(rev);
    }
    if let Some(description) = args.description {
        opts = opts.with_description(description);
    }
    if !args.files.is_empty() {
        opts = opts.with_files(read_files(&args.files).await?);
    }

    let doc = db.set(args.key.as_str(), opts).await?;
    match format {
        OutputFormat::Json => print_json(&doc)?,
        OutputFormat::Text => {
            println!("{} Stored {}", "✓".green().bold(), doc.key.to_string().bold());
            println!("  Blob: {}", doc.id.to_string().cyan());
            println!("  Rev:  {}", doc.rev.to_string().yellow());
            if let Some(expires) = doc.ttl.expires_at() {
                println!("  Expires: {}", format_ms(expires));
            }
        }
    }
    Ok(())
}

async fn cmd_delete(db: &PasteDb, args: DeleteArgs, format: OutputFormat) -> anyhow::Result<()> {
    let results = db.delete_many(args.keys.iter().map(String::as_str)).await;

    let mut failed = 0;
    let mut rows = Vec::new();
    for (key, result) in args.keys.iter().zip(results) {
        match result {
            Ok(removed) => {
                if format == OutputFormat::Text {
                    if removed {
                        println!("  {} {}", "deleted:".green(), key);
                    } else {
                        println!("  {} {}", "absent:".dimmed(), key);
                    }
                }
                rows.push(json!({"key": key, "deleted": removed}));
            }
            Err(e) => {
                failed += 1;
                if format == OutputFormat::Text {
                    println!("  {} {}: {}", "failed:".red(), key, e);
                }
                rows.push(json!({"key": key, "error": e.to_string()}));
            }
        }
    }
    if format == OutputFormat::Json {
        print_json(&Value::Array(rows))?;
    }
    if failed > 0 {
        bail!("{failed} deletion(s) failed");
    }
    Ok(())
}

async fn cmd_keys(db: &PasteDb, format: OutputFormat) -> anyhow::Result<()> {
    let keys = db.keys().await?;
    match format {
        OutputFormat::Json => print_json(&keys)?,
        OutputFormat::Text if keys.is_empty() => println!("No keys."),
        OutputFormat::Text => {
            for key in keys {
                println!("{key}");
            }
        }
    }
    Ok(())
}

async fn cmd_purge(db: &PasteDb, format: OutputFormat) -> anyhow::Result<()> {
    let evicted = db.purge_expired().await?;
    match format {
        OutputFormat::Json => print_json(&evicted)?,
        OutputFormat::Text => {
            println!("{} Purged {} expired document(s)", "✓".green(), evicted.len());
            for key in evicted {
                println!("  {} {}", "evicted:".dimmed(), key);
            }
        }
    }
    Ok(())
}

fn print_document(doc: &Document) -> anyhow::Result<()> {
    println!("{}  {}", doc.key.to_string().bold(), doc.rev.to_string().yellow());
    println!("  Blob:    {}", doc.id.to_string().cyan());
    println!("  Created: {}", format_ms(doc.ttl.created_at));
    if let Some(expires) = doc.ttl.expires_at() {
        println!("  Expires: {}", format_ms(expires));
    }
    if let Some(files) = &doc.files {
        for (name, content) in files {
            println!("  File:    {} ({} bytes)", name.blue(), content.len());
        }
    }
    println!("{}", serde_json::to_string_pretty(&doc.value)?);
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_ms(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}

/// Parse a `NAME=PATH` attachment argument.
fn parse_file_arg(arg: &str) -> anyhow::Result<(&str, &str)> {
    let (name, path) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=PATH, got {arg:?}"))?;
    if name.is_empty() || path.is_empty() {
        bail!("expected NAME=PATH, got {arg:?}");
    }
    Ok((name, path))
}

async fn read_files(args: &[String]) -> anyhow::Result<Files> {
    let mut files = Files::new();
    for arg in args {
        let (name, path) = parse_file_arg(arg)?;
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading attachment {path}"))?;
        debug!(name, path, bytes = content.len(), "read attachment");
        files.insert(name.to_string(), content);
    }
    Ok(files)
}
