//! ontoposet CLI tool
//!
//! Command-line interface over the ontoposet diagnostics.
//!
//! ## Commands
//!
//! - `presets`: list the preset library
//! - `export`: write a dataset as JSON
//! - `check`: poset rule checks under a mode (exit status 2 when strict mode refuses)
//! - `closure`, `reduce`, `tightness`: order-theoretic views of the envelops relation
//! - `repair`: list ranked repairs and optionally apply one
//! - `diff <left> <right>`: compare two datasets
//! - `layout`: node positions, drawn from the relations the config's `[filters]` keep
//!
//! Every dataset argument is either a JSON file or, with `--preset`, a registered preset key.
//! `--json` switches any command to machine-readable output.

use clap::{Args, Parser, Subcommand};
use ontoposet::{
    config::{get_content, set_content, AnalysisConfig, ConfigProvider, TomlConfigProvider},
    dataset::{parse_dataset_from_json, to_json_pretty},
    diff::compute_snapshot_diff_with_epsilon,
    layout::{build_layout, LayoutMode},
    poset::{
        compute_envelope_tightness, compute_transitive_closure_pairs,
        compute_transitive_reduction_edges, OntologyMode,
    },
    presets::{OntologyPreset, PRESETS},
    properties::OntologyDataset,
    repair::{apply_repair_actions, RepairAction},
    session::OntologySession,
    OntologyError,
};
use std::{
    path::{Path, PathBuf},
    process::exit,
    sync::mpsc::channel,
};

mod render;

#[derive(Parser)]
#[command(name = "ontoposet")]
#[command(author, version, about = "Order-theoretic diagnostics for small ontologies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of plain text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Args, Debug)]
struct Source {
    /// Dataset JSON file
    path: Option<PathBuf>,

    /// Registered preset key (default: the first preset)
    #[arg(short, long, conflicts_with = "path")]
    preset: Option<String>,
}

impl Source {
    fn load(&self) -> Result<OntologyDataset, OntologyError> {
        match (&self.path, &self.preset) {
            (Some(path), _) => read_dataset(path),
            (None, Some(key)) => Ok(PRESETS.require(key)?.data.clone()),
            (None, None) => PRESETS
                .default_preset()
                .map(|preset| preset.data.clone())
                .ok_or_else(|| OntologyError::NotFound("default preset".to_string())),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List registered presets
    Presets,

    /// Write a dataset as JSON
    Export {
        #[command(flatten)]
        source: Source,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the poset rule checks
    Check {
        #[command(flatten)]
        source: Source,

        /// Mode to validate against (default: from config)
        #[arg(short, long)]
        mode: Option<OntologyMode>,
    },

    /// List containments implied by transitivity
    Closure {
        #[command(flatten)]
        source: Source,
    },

    /// List the essential envelops relations
    Reduce {
        #[command(flatten)]
        source: Source,

        /// Write the dataset without its redundant envelops relations
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Envelope tightness, loosest first
    Tightness {
        #[command(flatten)]
        source: Source,
    },

    /// Suggest repairs for rule failures
    Repair {
        #[command(flatten)]
        source: Source,

        /// Maximum number of suggestions (default: from config)
        #[arg(long)]
        max: Option<usize>,

        /// Apply the Nth suggestion (1-based)
        #[arg(long)]
        apply: Option<usize>,

        /// Where to write the repaired dataset (default: stdout)
        #[arg(short, long, requires = "apply")]
        output: Option<PathBuf>,
    },

    /// Compare two datasets; each side is a JSON file or a preset key
    Diff { left: String, right: String },

    /// Compute node positions
    Layout {
        #[command(flatten)]
        source: Source,

        /// Layout algorithm (default: from config)
        #[arg(short, long)]
        mode: Option<LayoutMode>,
    },
}

fn read_dataset(path: &Path) -> Result<OntologyDataset, OntologyError> {
    let text = get_content(path)?;
    parse_dataset_from_json(&text).map_err(|err| match err {
        OntologyError::InvalidDataset(msg) => {
            OntologyError::InvalidDataset(format!("{}: {msg}", path.display()))
        }
        other => other,
    })
}

/// A diff side: a registered preset key, else a file path.
fn resolve_side(side: &str) -> Result<OntologyDataset, OntologyError> {
    match PRESETS.get(side) {
        Some(preset) => Ok(preset.data.clone()),
        None => read_dataset(Path::new(side)),
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, OntologyError> {
    let config = match path {
        Some(path) => TomlConfigProvider::new(path.to_path_buf()).get_config()?,
        None => AnalysisConfig::default(),
    };
    for dir in &config.preset_dirs {
        PRESETS.load_dir(dir)?;
    }
    Ok(config)
}

fn write_or_print(output: Option<&Path>, text: String) -> Result<(), OntologyError> {
    match output {
        Some(path) => {
            set_content(path, text)?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let json = cli.json;

    match cli.command {
        Commands::Presets => {
            let presets = PRESETS.list();
            if json {
                let presets: Vec<&OntologyPreset> = presets.iter().map(|p| p.as_ref()).collect();
                render::print_json(&presets)?;
            } else {
                render::print_presets(&presets);
            }
        }

        Commands::Export { source, output } => {
            let dataset = source.load()?;
            write_or_print(output.as_deref(), to_json_pretty(&dataset)?)?;
        }

        Commands::Check { source, mode } => {
            let session = OntologySession::new(source.load()?).with_config(&AnalysisConfig {
                mode: mode.unwrap_or(config.mode),
                ..config.clone()
            });
            let validation = session.validation();
            if json {
                render::print_json(&validation)?;
            } else {
                render::print_validation(&validation);
            }
            if !validation.allowed {
                exit(2);
            }
        }

        Commands::Closure { source } => {
            let dataset = source.load()?;
            let pairs = compute_transitive_closure_pairs(&dataset);
            if json {
                render::print_json(&pairs)?;
            } else {
                render::print_implied_pairs(&pairs);
            }
        }

        Commands::Reduce { source, output } => {
            let dataset = source.load()?;
            let kept = compute_transitive_reduction_edges(&dataset);
            let redundant: Vec<RepairAction> = dataset
                .envelops_edges()
                .filter(|edge| !kept.iter().any(|k| k.id == edge.id))
                .map(|edge| RepairAction::RemoveEdge {
                    edge_id: edge.id.clone(),
                })
                .collect();

            if let Some(path) = output {
                let reduced = apply_repair_actions(&dataset, &redundant);
                write_or_print(Some(&path), to_json_pretty(&reduced)?)?;
            } else if json {
                render::print_json(&kept)?;
            } else {
                render::print_reduction(&dataset, &kept, redundant.len());
            }
        }

        Commands::Tightness { source } => {
            let dataset = source.load()?;
            let rows = compute_envelope_tightness(&dataset);
            if json {
                render::print_json(&rows)?;
            } else {
                render::print_tightness(&rows);
            }
        }

        Commands::Repair {
            source,
            max,
            apply,
            output,
        } => {
            let (tx, rx) = channel();
            let mut session = OntologySession::new(source.load()?)
                .with_config(&AnalysisConfig {
                    max_repairs: max.unwrap_or(config.max_repairs),
                    ..config.clone()
                })
                .with_events(tx);
            let suggestions = session.repair_suggestions();

            match apply {
                None if json => render::print_json(&suggestions)?,
                None => render::print_repairs(&suggestions),
                Some(n) => {
                    let suggestion = n
                        .checked_sub(1)
                        .and_then(|i| suggestions.get(i))
                        .ok_or_else(|| {
                            OntologyError::NotFound(format!(
                                "repair #{n} (there are {})",
                                suggestions.len()
                            ))
                        })?;
                    session.apply_repair(&suggestion.id)?;
                    for event in rx.try_iter() {
                        tracing::debug!("[Event] {event}");
                    }
                    tracing::info!("Applied: {}", suggestion.title);
                    write_or_print(output.as_deref(), session.export_json()?)?;
                }
            }
        }

        Commands::Diff { left, right } => {
            let left = resolve_side(&left)?;
            let right = resolve_side(&right)?;
            let diff = compute_snapshot_diff_with_epsilon(&left, &right, config.strength_epsilon);
            if json {
                render::print_json(&diff)?;
            } else {
                render::print_diff(&diff);
            }
        }

        Commands::Layout { source, mode } => {
            let session = OntologySession::new(source.load()?).with_config(&config);
            let dataset = session.visible_dataset();
            let layout = build_layout(&dataset, mode.unwrap_or(config.layout));
            if json {
                render::print_json(&layout)?;
            } else {
                render::print_layout(&dataset, &layout);
            }
        }
    }

    Ok(())
}
