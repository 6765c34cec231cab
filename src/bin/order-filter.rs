//! order-filter CLI - evaluate order filter slots against order JSON files
//!
//! Loads a filter configuration (YAML file, overridable through environment
//! variables) and reports, per slot, whether an order passes.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;

use order_filter::{
    ConfigStore, DiagnosticsSink, EnvConfig, IdSet, LayeredConfig, OrderAccess, RecordingSink,
    SlotConfig, SlotEvaluator, SlotNumber, StaticConfig, TracingSink,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "order-filter")]
#[command(version, about = "Slot-based allow/deny filters for order records", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate filter slots for an order
    Evaluate {
        /// Path to the filter configuration (YAML)
        #[arg(short, long, default_value = "filters.yaml")]
        config: PathBuf,

        /// Path to the order record (JSON)
        #[arg(short, long)]
        order: PathBuf,

        /// Only evaluate this slot (1-6)
        #[arg(short, long)]
        slot: Option<u8>,

        /// Force diagnostics on and print trace events as JSON lines
        #[arg(short, long)]
        trace: bool,

        /// Prefix for environment overrides
        #[arg(long, default_value = EnvConfig::DEFAULT_PREFIX)]
        env_prefix: String,
    },

    /// Parse an id list the way slot configuration does
    ParseIds {
        /// Raw id list (comma or newline separated)
        text: String,
    },

    /// Resolve and summarize all slots of a configuration
    Validate {
        /// Path to the filter configuration (YAML)
        #[arg(short, long, default_value = "filters.yaml")]
        config: PathBuf,

        /// Prefix for environment overrides
        #[arg(long, default_value = EnvConfig::DEFAULT_PREFIX)]
        env_prefix: String,
    },
}

fn main() {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Evaluate { config, order, slot, trace, env_prefix } => {
            evaluate(&config, &order, slot, trace, &env_prefix)
        }
        Commands::ParseIds { text } => {
            parse_ids(&text);
            Ok(())
        }
        Commands::Validate { config, env_prefix } => {
            validate(&config, &env_prefix)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Environment overrides on top of the YAML file.
fn load_config(path: &Path, env_prefix: &str) -> Result<LayeredConfig, String> {
    let file = StaticConfig::load_from_file(path)
        .map_err(|e| format!("Failed to load config: {}", e))?;
    tracing::info!("Loaded {} config keys from {}", file.len(), path.display());

    Ok(LayeredConfig::new()
        .with_layer(EnvConfig::new(env_prefix))
        .with_layer(file))
}

fn parse_slot(slot: u8) -> Result<SlotNumber, String> {
    SlotNumber::new(slot).ok_or_else(|| {
        format!(
            "Slot {} out of range, expected {}-{}",
            slot,
            SlotNumber::MIN,
            SlotNumber::MAX
        )
    })
}

/// Evaluate one or all slots for an order
fn evaluate(
    config: &Path,
    order: &Path,
    slot: Option<u8>,
    trace: bool,
    env_prefix: &str,
) -> Result<(), String> {
    let slots: Vec<SlotNumber> = match slot {
        Some(n) => vec![parse_slot(n)?],
        None => SlotNumber::all().collect(),
    };

    let layered = load_config(config, env_prefix)?;
    let store: Box<dyn ConfigStore> = if trace {
        Box::new(
            LayeredConfig::new()
                .with_layer(StaticConfig::new().with_value("debug", 1))
                .with_layer(layered),
        )
    } else {
        Box::new(layered)
    };

    let contents = std::fs::read_to_string(order)
        .map_err(|e| format!("Failed to read order file {}: {}", order.display(), e))?;
    let record: serde_json::Value = serde_json::from_str(&contents)
        .map_err(|e| format!("Invalid order JSON: {}", e))?;
    let record = (!record.is_null()).then_some(record);

    let recording = RecordingSink::new();
    let sink: &dyn DiagnosticsSink = if trace { &recording } else { &TracingSink };
    let evaluator = SlotEvaluator::new(store.as_ref(), sink);

    for slot in slots {
        let outcome = evaluator.explain_slot(record.as_ref().map(|r| r as &dyn OrderAccess), slot);
        println!("slot {}: {} ({})", slot, outcome.passed(), outcome);
    }

    if trace {
        for event in recording.drain() {
            let line = serde_json::to_string(&event)
                .map_err(|e| format!("Failed to render trace event: {}", e))?;
            println!("{}", line);
        }
    }

    Ok(())
}

/// Print the parsed id list, one id per line
fn parse_ids(text: &str) {
    let ids = IdSet::parse(text);
    if ids.is_empty() {
        println!("(no ids)");
        return;
    }
    for id in ids.iter() {
        println!("{}", id);
    }
}

/// Resolve all slots and flag suspicious ones
fn validate(config: &Path, env_prefix: &str) -> Result<(), String> {
    let store = load_config(config, env_prefix)?;
    let mut warnings = 0;

    for slot in SlotNumber::all() {
        let resolved = SlotConfig::resolve(&store, slot);
        let state = if resolved.enabled { "enabled" } else { "disabled" };
        println!(
            "slot {}: {} type={} mode={} ids=[{}] hint={:?}",
            slot,
            state,
            resolved.extraction_type,
            resolved.mode,
            resolved.ids,
            resolved.hint
        );

        if !resolved.enabled {
            continue;
        }
        if resolved.ids.is_empty() {
            println!("  ⚠ slot {} is enabled but has no ids; it never passes", slot);
            warnings += 1;
        }
        if !resolved.extraction_type.is_known() {
            println!(
                "  ⚠ slot {} has unknown type '{}'; it never passes",
                slot, resolved.extraction_type
            );
            warnings += 1;
        }
    }

    if warnings == 0 {
        println!("✓ Configuration OK");
    } else {
        println!("✓ Configuration loaded with {} warning(s)", warnings);
    }

    Ok(())
}
