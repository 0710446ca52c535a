//! denest: Normalize nested JSON records into per-entity tables
//!
//! Usage:
//!   # Schema from a config document, result JSON to stdout
//!   denest --schema schema.json articles.json
//!
//!   # Schema from flags, NDJSON on stdin
//!   cat articles.jsonl | denest --root articles --nested users=author --nested addresses=address
//!
//!   # Explicit order, one .jsonl file per entity table
//!   denest --root articles --nested users=author --nested addresses=address \
//!       --order addresses,users --output-dir ./tables articles.json
//!
//! Set RUST_LOG=denest=debug to see the processing order and per-batch summary.

// Use MiMalloc allocator for better performance
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use denest::schema::{NestedConfig, RootConfig, SchemaConfig};
use denest::{normalize_json, NormalizedResult, TableWriter};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "denest")]
#[command(about = "Normalize nested JSON records into per-entity tables", long_about = None)]
struct Args {
    /// Input file: a JSON array, a single object, or NDJSON (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Schema configuration document (JSON)
    #[arg(long, short = 's', conflicts_with_all = ["root", "nested"])]
    schema: Option<String>,

    /// Root entity as NAME[:ID_FIELD]
    #[arg(long, required_unless_present = "schema")]
    root: Option<String>,

    /// Nested entity as NAME=KEY[:ID_FIELD] (repeatable)
    #[arg(long)]
    nested: Vec<String>,

    /// Comma-separated processing order, deepest entity first
    /// If omitted, the order is inferred from the first record
    #[arg(long, value_delimiter = ',')]
    order: Option<Vec<String>>,

    /// Output directory for separate .jsonl files per entity table
    /// If omitted, writes the normalized result as one JSON document to stdout
    #[arg(long, short = 'o')]
    output_dir: Option<String>,

    /// Compact output (no pretty-printing)
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut normalizer = build_config(&args)?.into_normalizer()?;

    let reader = if let Some(file_path) = &args.input {
        Box::new(BufReader::new(
            File::open(file_path).with_context(|| format!("Failed to open input: {}", file_path))?,
        )) as Box<dyn Read>
    } else {
        Box::new(std::io::stdin()) as Box<dyn Read>
    };

    let Some(result) = normalize_json(reader, &mut normalizer)? else {
        eprintln!("Warning: No JSON records found in input");
        return Ok(());
    };

    if let Some(output_dir) = args.output_dir {
        let mut writer = TableWriter::new(&output_dir)?;
        writer.write_result(&result)?;
        writer.flush()?;
    } else {
        warn_on_key_collisions(&result);
        let output = if args.compact {
            serde_json::to_string(&result)?
        } else {
            serde_json::to_string_pretty(&result)?
        };
        let mut stdout = std::io::stdout();
        writeln!(stdout, "{}", output)?;
    }

    Ok(())
}

/// Warn about identifiers that share JSON text within a table (`1` and `"1"`),
/// since they end up under one duplicated object key on stdout
fn warn_on_key_collisions(result: &NormalizedResult) {
    for (entity, table) in &result.entities {
        let mut seen = HashSet::with_capacity(table.len());
        for id in table.keys() {
            if !seen.insert(id.to_string()) {
                tracing::warn!(
                    entity = %entity,
                    id = %id,
                    "identifiers with the same text share one JSON key; use --output-dir to keep both records"
                );
            }
        }
    }
}

/// Build the schema configuration from either the config document or the flags
fn build_config(args: &Args) -> Result<SchemaConfig> {
    let mut config = if let Some(path) = &args.schema {
        SchemaConfig::from_path(path)?
    } else {
        let Some(root) = &args.root else {
            bail!("either --schema or --root is required");
        };
        SchemaConfig {
            root: RootConfig::parse_flag(root)?,
            nested: args
                .nested
                .iter()
                .map(|s| NestedConfig::parse_flag(s))
                .collect::<Result<Vec<_>, _>>()?,
            order: None,
        }
    };

    if let Some(order) = &args.order {
        config.order = Some(order.iter().map(|s| s.trim().to_string()).collect());
    }
    Ok(config)
}
