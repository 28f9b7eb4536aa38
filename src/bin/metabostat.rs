//! metabostat - metabolomics group-comparison CLI
//!
//! Command-line interface for the metabolite analysis pipeline and the
//! sequence statistics helpers.

use clap::{Parser, Subcommand};
use metabostat::error::Result;
use metabostat::kegg::{self, KeggClient, PathwayLookup};
use metabostat::pipeline::{run_analysis, AnalysisConfig};
use metabostat::seq::DnaSequence;
use std::path::PathBuf;
use std::time::Duration;

/// Metabolomics group-comparison statistics with KEGG pathway context
#[derive(Parser)]
#[command(name = "metabostat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the metabolomics analysis with flags
    Analyze {
        /// Path to the metabolite table (CSV or TSV)
        #[arg(short, long)]
        data: PathBuf,

        /// First experimental condition to contrast
        #[arg(short = '1', long, default_value = "asp")]
        condition1: String,

        /// Second experimental condition to contrast
        #[arg(short = '2', long, default_value = "glu")]
        condition2: String,

        /// Column label identifying the water controls
        #[arg(long, default_value = "h2o")]
        water: String,

        /// Write the pathway frequency chart to this PNG file
        #[arg(long)]
        chart: Option<PathBuf>,

        /// Skip pathway lookups entirely
        #[arg(long)]
        offline: bool,

        /// Limit the number of compounds resolved against the database
        #[arg(long)]
        max_compounds: Option<usize>,

        /// Base URL of the KEGG REST service
        #[arg(long, default_value = kegg::DEFAULT_BASE_URL)]
        kegg_url: String,

        /// HTTP timeout in seconds for lookup requests
        #[arg(long, default_value = "10")]
        timeout: u64,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Run an analysis described by a YAML configuration file
    Run {
        /// Path to the configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Skip pathway lookups entirely
        #[arg(long)]
        offline: bool,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Write a starter configuration file
    Example {
        /// Output path for the example YAML
        #[arg(short, long, default_value = "analysis.yaml")]
        output: PathBuf,
    },

    /// Report statistics for a DNA sequence
    Seq {
        /// Sequence given directly on the command line
        #[arg(short, long, conflicts_with = "fasta", required_unless_present = "fasta")]
        sequence: Option<String>,

        /// Read the sequence from a FASTA file
        #[arg(short, long)]
        fasta: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            data,
            condition1,
            condition2,
            water,
            chart,
            offline,
            max_compounds,
            kegg_url,
            timeout,
            format,
        } => {
            let mut config = AnalysisConfig::new(data);
            config.condition1 = condition1;
            config.condition2 = condition2;
            config.water_label = water;
            config.chart_path = chart;
            config.max_compounds = max_compounds;
            config.kegg_base_url = kegg_url;
            config.kegg_timeout_secs = timeout;
            cmd_analyze(&config, offline, &format)
        }

        Commands::Run {
            config,
            offline,
            format,
        } => cmd_run(&config, offline, &format),

        Commands::Example { output } => cmd_example(&output),

        Commands::Seq { sequence, fasta } => cmd_seq(sequence.as_deref(), fasta.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Run the pipeline and print the report.
fn cmd_analyze(config: &AnalysisConfig, offline: bool, format: &str) -> Result<()> {
    let client;
    let lookup: Option<&dyn PathwayLookup> = if offline {
        None
    } else {
        client = KeggClient::with_config(
            &config.kegg_base_url,
            Duration::from_secs(config.kegg_timeout_secs),
        )?;
        Some(&client)
    };

    eprintln!(
        "Analyzing {} ({} vs {})...",
        config.data_path.display(),
        config.condition1,
        config.condition2
    );
    let report = run_analysis(config, lookup)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => println!("{}", report),
    }

    if !report.stage_errors.is_empty() {
        eprintln!("Completed with {} stage error(s)", report.stage_errors.len());
    }
    Ok(())
}

/// Run from a YAML configuration file.
fn cmd_run(config_path: &PathBuf, offline: bool, format: &str) -> Result<()> {
    eprintln!("Loading configuration from {}...", config_path.display());
    let config_str = std::fs::read_to_string(config_path)?;
    let config = AnalysisConfig::from_yaml(&config_str)?;
    cmd_analyze(&config, offline, format)
}

/// Write a starter configuration.
fn cmd_example(output_path: &PathBuf) -> Result<()> {
    let mut config = AnalysisConfig::new("metabolites.csv");
    config.chart_path = Some(PathBuf::from("pathways.png"));

    let yaml = config.to_yaml()?;
    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote example configuration to {}", output_path.display());
    println!("{}", yaml);
    Ok(())
}

/// Print statistics for one DNA sequence.
fn cmd_seq(sequence: Option<&str>, fasta: Option<&std::path::Path>) -> Result<()> {
    let seq = match (sequence, fasta) {
        (Some(s), _) => DnaSequence::new(s)?,
        (None, Some(path)) => DnaSequence::from_fasta(path)?,
        (None, None) => unreachable!("clap enforces one of --sequence/--fasta"),
    };

    println!("Length: {} bases", seq.len());
    println!("Nucleotides: {}", seq.nucleotide_counts());

    let codons = seq.codon_frequency();
    println!("Codons ({} complete):", codons.total());
    for (codon, count) in codons.iter() {
        println!("  {}: {} ({:.1}%)", codon, count, codons.fraction(codon) * 100.0);
    }

    println!("Transcript: {}", seq.transcribe());
    match seq.translate() {
        Ok(protein) => println!("Protein: {}", protein),
        Err(e) => println!("Protein: not translated ({})", e),
    }
    Ok(())
}
