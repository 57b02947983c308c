use clap::{Parser, Subcommand};
use midi2matrix::config::{self, Config};
use midi2matrix::progress::LogProgress;
use midi2matrix::{export, qa, BatchProcessor, MidiInput};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// MIDI-to-Matrix Preprocessor
#[derive(Parser)]
#[command(name = "midi2matrix")]
#[command(about = "Convert MIDI files into fixed-size piano-roll matrices for model training")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preprocess MIDI files into training matrices
    Process {
        /// MIDI files or directories (searched recursively for .mid/.midi)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory for results
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Custom configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write PNG previews for the first N matrices
        #[arg(long, default_value_t = 0)]
        previews: usize,

        /// Worker threads (overrides the configuration)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Quiet output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config: PathBuf,
    },
    /// Show default configuration
    ShowConfig,
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn is_midi_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mid") || ext.eq_ignore_ascii_case("midi"))
}

/// Expand directories into the MIDI files they contain, sorted for a stable order
fn collect_midi_paths(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .follow_links(true)
                .into_iter()
                .flatten()
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|path| is_midi_file(path))
                .collect();
            found.sort();
            paths.extend(found);
        } else {
            paths.push(input.clone());
        }
    }
    paths
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            inputs,
            output,
            config,
            previews,
            workers,
            verbose,
            quiet,
        } => {
            if verbose && quiet {
                anyhow::bail!("Cannot specify both --verbose and --quiet");
            }
            init_logging(verbose, quiet);

            // Load configuration
            let mut config = if let Some(config_path) = config {
                config::load_config(config_path)?
            } else {
                Config::default()
            };
            if let Some(workers) = workers {
                config.batch.workers = workers;
            }
            config::validate_config(&config)?;

            let paths = collect_midi_paths(&inputs);
            if paths.is_empty() {
                anyhow::bail!("No MIDI files found in the given inputs");
            }

            // Unreadable files are reported like undecodable ones
            let midi_inputs: Vec<MidiInput> = paths
                .iter()
                .map(|path| {
                    MidiInput::from_path(path).unwrap_or_else(|err| {
                        log::warn!("{}", err);
                        MidiInput::new(path.display().to_string(), Vec::new())
                    })
                })
                .collect();

            let max_intensity = config.velocity.max_intensity;
            let processor = BatchProcessor::new(config).with_progress(LogProgress);
            let result = processor.run(&midi_inputs)?;

            export::write_matrices(output.join("matrices.json"), &result.matrices)?;
            export::write_report(output.join("report.json"), &result.report)?;
            qa::write_previews(&output.join("qa"), &result.matrices, previews, max_intensity)?;

            if !quiet {
                println!("{}", result.report.summary());
                println!("Results saved to {}", output.display());
            }
        }
        Commands::ValidateConfig { config } => {
            let config = config::load_config(config)?;
            println!("Configuration is valid");
            if let Ok(json) = serde_json::to_string_pretty(&config) {
                println!("{}", json);
            }
        }
        Commands::ShowConfig => {
            let config = Config::default();
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
    }

    Ok(())
}
