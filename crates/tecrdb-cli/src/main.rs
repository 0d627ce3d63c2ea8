use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::info;

use tecrdb_core::storage::{load_curation, load_master, load_source, save_json};
use tecrdb_core::{AppConfig, SourceKind};
use tecrdb_merge::{CurationAction, MergePass, classify};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "tecrdb",
    about = "Consolidate thermodynamic reaction data into one TECRDB master table",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting TECRDB_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Log every candidate rejection, not only the summary.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a new source table into the master table.
    Merge {
        /// Master table CSV (scraped baseline or a previous merge).
        #[arg(long)]
        master: PathBuf,
        /// New source table CSV.
        #[arg(long)]
        new: PathBuf,
        /// Source of the new table (noor or du); inferred from the file name if omitted.
        #[arg(long)]
        source: Option<SourceKind>,
        /// Manual curation CSV applied after matching.
        #[arg(long)]
        curation: Option<PathBuf>,
        /// Directory for the merged table and diagnostics.
        #[arg(long)]
        output_dir: Option<String>,
    },

    /// Parse a manual curation sheet and show how each row would be applied.
    CheckCuration { path: PathBuf },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

// ─── Config Actions ──────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all config values.
    Show,
    /// Print the config file path.
    Path,
    /// Write the default config file if none exists.
    Init,
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "tecrdb=debug" } else { "tecrdb=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json || std::env::var("TECRDB_JSON").as_deref() == Ok("1");
    let mut config = AppConfig::load()?;

    match cli.command {
        // ── Merge ──────────────────────────────────────────────────────────

        Commands::Merge {
            master,
            new,
            source,
            curation,
            output_dir,
        } => {
            if let Some(dir) = output_dir {
                config.merge.output_dir = dir;
            }
            config.merge.verbose |= cli.verbose;

            let source = match source {
                Some(source) => source,
                None => SourceKind::from_file_name(&new.to_string_lossy()).ok_or_else(|| {
                    anyhow!("cannot tell the source of {}; pass --source", new.display())
                })?,
            };

            let mut table = load_master(&master)
                .with_context(|| format!("loading master table {}", master.display()))?;
            let records = load_source(&new, source)
                .with_context(|| format!("loading {source} table {}", new.display()))?;
            let curation_rows = match &curation {
                Some(path) => load_curation(path)
                    .with_context(|| format!("loading curation sheet {}", path.display()))?,
                None => Vec::new(),
            };

            let merged_path = config.merged_path();
            let unmatched_path = config.unmatched_path(source);
            let report_path = config.report_path(source);

            let mut pass = MergePass::new(&mut table, source, &records, &config.merge)?;
            pass.run(&curation_rows)?;
            pass.export(&merged_path, &unmatched_path)?;
            let report = pass.into_report();
            save_json(&report_path, &report)?;
            info!("Report written to {}", report_path.display());

            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": {
                        "report": report,
                        "merged": merged_path,
                        "unmatched": unmatched_path,
                    },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("{report}");
                println!();
                println!("Merged table:  {}", merged_path.display());
                println!("Unmatched:     {}", unmatched_path.display());
                println!("Report:        {}", report_path.display());
            }
        }

        // ── Curation ───────────────────────────────────────────────────────

        Commands::CheckCuration { path } => {
            let rows = load_curation(&path)?;
            let mut entries = Vec::with_capacity(rows.len());
            let mut invalid = 0;

            for (line, row) in rows.iter().enumerate() {
                let (kind, detail) = match classify(row) {
                    Ok(action) => describe(&action),
                    Err(e) => {
                        invalid += 1;
                        ("invalid", e.to_string())
                    }
                };
                entries.push(serde_json::json!({
                    "row": line,
                    "action": kind,
                    "detail": detail,
                    "resolution": row.resolution,
                }));
                if !json_output {
                    println!("{line:>4}  {kind:<15}  {detail}");
                }
            }

            if json_output {
                let status = if invalid == 0 { "ok" } else { "error" };
                print_json(&serde_json::json!({
                    "status": status,
                    "data": { "items": entries, "invalid": invalid },
                    "meta": { "duration_ms": start.elapsed().as_millis() }
                }))?;
            } else {
                println!("\n{} rows, {invalid} invalid", rows.len());
            }
            if invalid > 0 {
                std::process::exit(1);
            }
        }

        // ── Config ─────────────────────────────────────────────────────────

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":config}))?;
                } else {
                    println!("verbose             = {}", config.merge.verbose);
                    println!("output_dir          = {}", config.merge.output_dir);
                    println!("merged_file_name    = {}", config.merge.merged_file_name);
                    println!("max_charge_rewrites = {}", config.merge.max_charge_rewrites);
                }
            }
            ConfigAction::Path => {
                println!("{}", AppConfig::config_path().display());
            }
            ConfigAction::Init => {
                let path = AppConfig::config_path();
                if path.exists() {
                    println!("Config already exists: {}", path.display());
                } else {
                    AppConfig::default().save_to(&path)?;
                    println!("Wrote default config: {}", path.display());
                }
            }
        },
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn describe(action: &CurationAction) -> (&'static str, String) {
    match action {
        CurationAction::Insert { new_ids } => ("insert", format!("append new {new_ids:?}")),
        CurationAction::Merge {
            master_ids,
            new_ids,
        } => {
            let detail = format!("merge new {new_ids:?} into master {master_ids:?}");
            if master_ids.len() == new_ids.len() {
                ("merge", detail)
            } else {
                ("merge-mismatch", detail)
            }
        }
        CurationAction::Duplicate { new_ids } => ("duplicate", format!("{new_ids:?}")),
        CurationAction::AlreadyMatched { new_ids } => ("already-matched", format!("{new_ids:?}")),
        CurationAction::Unresolved { new_ids } => ("unresolved", format!("{new_ids:?}")),
    }
}
