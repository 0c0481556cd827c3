use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use regqa_core::config::RagConfig;
use regqa_core::error::{codes, AppError, ErrorCategory};
use regqa_core::telemetry::init_tracing;
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "regqa", version, about = "Grounded question answering over regulatory documents")]
struct Cli {
    /// Configuration file (defaults to ./regqa.toml when present).
    #[arg(long, global = true, env = "REGQA_CONFIG")]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Split pages.jsonl into overlapping chunks.
    Chunk,
    /// Embed every chunk and publish a new index generation.
    Index,
    /// Print the ranked evidence for a query.
    Retrieve {
        query: String,
        #[arg(long, short = 'k')]
        top_k: Option<usize>,
    },
    /// Answer a question from retrieved evidence.
    Answer {
        query: String,
        #[arg(long, short = 'k')]
        top_k: Option<usize>,
    },
    /// Show which artifacts exist and the live index build.
    Status,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = %e.code, retryable = e.retryable, "{}", e.message);
            eprintln!("error: {e}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn exit_code(e: &AppError) -> u8 {
    match e.category() {
        ErrorCategory::Configuration => 2,
        ErrorCategory::RemoteUnavailable => 3,
        ErrorCategory::Input => 4,
        ErrorCategory::Storage => 1,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let s = serde_json::to_string_pretty(value).map_err(|e| {
        AppError::new(codes::DATA_ENCODE_FAILED, "Failed to encode output").with_details(e.to_string())
    })?;
    println!("{s}");
    Ok(())
}

fn run(cli: Cli) -> Result<(), AppError> {
    let cfg = match cli.config.as_deref() {
        Some(path) => RagConfig::load_from(path)?,
        None => RagConfig::load()?,
    };

    match cli.command {
        Commands::Chunk => {
            let report = regqa_cli::chunk(&cfg)?;
            if cli.json {
                return print_json(&report);
            }
            println!(
                "pages kept: {} (dropped {}), chunks: {}",
                report.pages_kept, report.pages_dropped, report.chunks
            );
            println!("wrote {}", cfg.chunks_path().display());
        }
        Commands::Index => {
            let st = regqa_cli::index(&cfg)?;
            if cli.json {
                return print_json(&st);
            }
            println!(
                "index ready: {} vectors, dims {}, build {}",
                st.count,
                st.dims.unwrap_or(0),
                st.build_id.as_deref().unwrap_or("-")
            );
        }
        Commands::Retrieve { query, top_k } => {
            let evidence = regqa_cli::retrieve(&cfg, &query, top_k)?;
            if cli.json {
                return print_json(&evidence);
            }
            for (i, e) in evidence.iter().enumerate() {
                println!("{}. {} | page {} | {}", i + 1, e.source, e.page, e.chunk_id);
            }
        }
        Commands::Answer { query, top_k } => {
            let out = regqa_cli::answer(&cfg, &query, top_k)?;
            if cli.json {
                return print_json(&out);
            }
            println!("{}", out.answer);
            println!();
            println!("Sources retrieved:");
            for e in &out.evidence {
                println!("- {} p.{} ({})", e.source, e.page, e.chunk_id);
            }
        }
        Commands::Status => {
            let st = regqa_cli::status(&cfg)?;
            if cli.json {
                return print_json(&st);
            }
            println!("data dir: {}", st.data_dir);
            println!("pages.jsonl: {}", if st.pages_present { "present" } else { "missing" });
            match st.chunks {
                Some(n) => println!("chunks: {n}"),
                None => println!("chunks: missing"),
            }
            if st.index.ready {
                println!(
                    "index: ready ({} vectors, model {}, build {}, built {})",
                    st.index.count,
                    st.index.model.as_deref().unwrap_or("-"),
                    st.index.build_id.as_deref().unwrap_or("-"),
                    st.index.built_at.as_deref().unwrap_or("-")
                );
            } else {
                println!("index: not built");
            }
        }
    }
    Ok(())
}
