//! modstack CLI
//!
//! Entry point for the `modstack` command-line tool.

use clap::{Parser, Subcommand};
use modstack::{Dataset, LayerLoader, ResolvedRecord, StackConfig};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "modstack")]
#[command(about = "Resolve layered game data records", version)]
struct Cli {
    /// Path to the stack manifest
    #[arg(long, short = 'm', global = true, default_value = "modstack.toml")]
    manifest: PathBuf,

    /// Active overlay id, in priority order (repeatable; default: all)
    #[arg(long = "overlay", short = 'o', global = true)]
    overlays: Vec<String>,

    /// Extra field treated as a set by `extend` (repeatable)
    #[arg(long = "set-field", global = true)]
    set_fields: Vec<String>,

    /// Log resolution details to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a resolved record
    Show {
        /// Record type or family (e.g. GUN, item)
        record_type: String,
        id: String,
    },

    /// Print a resolved abstract template
    Abstract { record_type: String, name: String },

    /// Print every resolved record of a type
    List {
        record_type: String,

        /// Print ids only
        #[arg(long)]
        ids: bool,
    },

    /// Show which overlays shaped a record
    Provenance {
        record_type: String,
        id: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List active layers with record counts
    Layers,

    /// Resolve everything and report diagnostics
    Check,
}

#[derive(Serialize)]
struct ProvenanceReport {
    direct_contributors: Vec<String>,
    contributing_chain: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let dataset = load_dataset(&cli);

    match &cli.command {
        Commands::Show { record_type, id } => match dataset.by_id(record_type, id) {
            Ok(record) => print_json(record.as_ref()),
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        },
        Commands::Abstract { record_type, name } => {
            match dataset.abstract_by_id(record_type, name) {
                Some(record) => print_json(record.as_ref()),
                None => {
                    eprintln!("no abstract {} '{}'", record_type, name);
                    process::exit(1);
                }
            }
        }
        Commands::List { record_type, ids } => run_list(&dataset, record_type, *ids),
        Commands::Provenance {
            record_type,
            id,
            json,
        } => run_provenance(&dataset, record_type, id, *json),
        Commands::Layers => {
            for (id, count) in dataset.layer_record_counts() {
                println!("{:<24} {:>8}", id.as_str(), count);
            }
        }
        Commands::Check => run_check(&dataset),
    }
}

fn setup_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_dataset(cli: &Cli) -> Dataset {
    let overrides = (!cli.set_fields.is_empty())
        .then(|| serde_json::json!({"rules": {"set_fields": cli.set_fields}}));

    let config = match StackConfig::build(Some(&cli.manifest), overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let overlays = match config.select_overlays(&cli.overlays) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let loaded = LayerLoader::new(&config.load).and_then(|loader| loader.load_stack(&config, &overlays));
    let (layers, load_diagnostics) = match loaded {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error loading layers: {}", e);
            process::exit(1);
        }
    };

    let dataset = Dataset::with_options(layers, config.options());
    dataset.record_diagnostics(load_diagnostics);
    dataset
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn run_list(dataset: &Dataset, record_type: &str, ids: bool) {
    let records: Vec<Arc<ResolvedRecord>> = dataset.by_type(record_type);
    if ids {
        for record in &records {
            println!("{}", record.id().unwrap_or("<anonymous>"));
        }
    } else {
        let values: Vec<_> = records.iter().map(|r| r.to_value()).collect();
        print_json(&values);
    }
}

fn run_provenance(dataset: &Dataset, record_type: &str, id: &str, json: bool) {
    if dataset.by_id_maybe(record_type, id).is_none() {
        eprintln!("no {} with id '{}'", record_type, id);
        process::exit(1);
    }

    let names = |layers: Vec<modstack::LayerId>| -> Vec<String> {
        layers.into_iter().map(|l| l.to_string()).collect()
    };
    let report = ProvenanceReport {
        direct_contributors: names(dataset.direct_contributors(record_type, id)),
        contributing_chain: names(dataset.contributing_chain(record_type, id)),
    };

    if json {
        print_json(&report);
        return;
    }

    let show = |layers: &[String]| {
        if layers.is_empty() {
            "(base only)".to_string()
        } else {
            layers.join(", ")
        }
    };
    println!("direct:  {}", show(&report.direct_contributors));
    println!("chain:   {}", show(&report.contributing_chain));
}

fn run_check(dataset: &Dataset) {
    let resolved = dataset.resolve_all();
    let diagnostics = dataset.diagnostics();

    for diagnostic in &diagnostics {
        println!("{}", diagnostic);
    }
    println!(
        "{} records resolved, {} diagnostics",
        resolved,
        diagnostics.len()
    );

    if !diagnostics.is_empty() {
        process::exit(1);
    }
}
