use anyhow::Context;
use clap::{Parser, Subcommand};
use compcut_lib::parse::{count_kmers, load_sequences, CountOptions};
use compcut_lib::serialization::write_component_stats;
use compcut_lib::splitter::sort_and_number;
use compcut_lib::{
    export_fasta, load_components, save_components_as, split, Adjacency, ComponentFileFormat,
    DegreeCensus, SplitConfiguration, SplitStrategy, VertexIndex,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "compcut")]
#[command(version = "0.1.0")]
#[command(about = "Cut a k-mer de Bruijn graph into size-bounded components", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// K-mer counting options shared by `cut` and `census`
#[derive(clap::Args)]
struct CountArgs {
    /// Input FASTA/FASTQ files (may be gzipped)
    #[arg(short, long, num_args = 1.., required = true)]
    input: Vec<PathBuf>,

    /// K-mer length
    #[arg(short, long)]
    k: usize,

    /// Minimum read length to be counted
    #[arg(short = 'l', long = "min-seq-len", default_value = "100")]
    min_seq_len: usize,

    /// Drop k-mers seen fewer times than this
    #[arg(long, default_value = "1")]
    min_count: u64,

    /// Store canonical k-mers (k-mer or reverse complement, whichever is smaller)
    #[arg(long, default_value = "false")]
    canonical: bool,

    /// Number of threads (0 = all available cores)
    #[arg(short = 't', long, default_value = "0")]
    threads: usize,
}

impl CountArgs {
    fn adjacency(&self) -> Adjacency {
        if self.canonical {
            Adjacency::Canonical
        } else {
            Adjacency::Directed
        }
    }

    fn count(&self) -> anyhow::Result<VertexIndex> {
        let mut options = CountOptions::new(self.k);
        options.adjacency = self.adjacency();
        options.min_read_length = self.min_seq_len;
        options.min_count = self.min_count;
        options.num_threads = self.threads;
        info!("Loading reads from {} files...", self.input.len());
        count_kmers(&self.input, &options)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Split the k-mer graph of the input reads into components
    Cut {
        #[command(flatten)]
        count: CountArgs,

        /// Minimum component size (in k-mers)
        #[arg(long = "min-component-size", visible_alias = "b1", default_value = "1000")]
        min_size: u64,

        /// Maximum component size (in k-mers)
        #[arg(long = "max-component-size", visible_alias = "b2", default_value = "10000")]
        max_size: u64,

        /// Splitting algorithm (0 = recursive threshold, 1-4 = randomized, 5 = sequence-seeded)
        #[arg(short, long, default_value = "0")]
        alg: u8,

        /// Sequences seeding the components (FASTA/FASTQ, algorithm 5 only)
        #[arg(long)]
        seeds: Option<PathBuf>,

        /// RNG seed for the randomized algorithms
        #[arg(long)]
        seed: Option<u64>,

        /// Output component file
        #[arg(short, long, default_value = "components.bin")]
        output: PathBuf,

        /// Directory for the statistics table and FASTA export
        #[arg(short = 'w', long, default_value = ".")]
        work_dir: PathBuf,

        /// Persist frequency thresholds in the component file
        #[arg(long, default_value = "false")]
        with_thresholds: bool,

        /// Write each component as FASTA under <work-dir>/fasta
        #[arg(long, default_value = "false")]
        fasta: bool,

        /// Sort components of the randomized algorithms by significance
        #[arg(long, default_value = "false")]
        sort: bool,

        /// Log the degree census before splitting
        #[arg(long, default_value = "false")]
        census: bool,
    },

    /// Summarize a component file
    Inspect {
        /// Component file
        #[arg(short, long)]
        components: PathBuf,

        /// Print the per-component table to stdout
        #[arg(long, default_value = "false")]
        table: bool,
    },

    /// Count vertices of the k-mer graph by degree
    Census {
        #[command(flatten)]
        count: CountArgs,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing: use RUST_LOG if set, otherwise default to info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Cut {
            count,
            min_size,
            max_size,
            alg,
            seeds,
            seed,
            output,
            work_dir,
            with_thresholds,
            fasta,
            sort,
            census,
        } => {
            let strategy = SplitStrategy::from_alg(alg)
                .ok_or_else(|| anyhow::anyhow!("Unknown algorithm {} (expected 0-5)", alg))?;
            let mut config = SplitConfiguration::new(count.k, min_size, max_size)
                .map_err(|e| anyhow::anyhow!("{}", e))?
                .with_strategy(strategy)
                .with_threads(count.threads)
                .with_adjacency(count.adjacency());
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }
            let options = CutOptions {
                seeds,
                output,
                work_dir,
                with_thresholds,
                fasta,
                sort,
                census,
            };
            cut_command(&count, config, options)?;
        }
        Commands::Inspect { components, table } => {
            inspect_command(&components, table)?;
        }
        Commands::Census { count } => {
            census_command(&count)?;
        }
    }

    Ok(())
}

/// Output options of the `cut` subcommand
struct CutOptions {
    seeds: Option<PathBuf>,
    output: PathBuf,
    work_dir: PathBuf,
    with_thresholds: bool,
    fasta: bool,
    sort: bool,
    census: bool,
}

/// Count reads, split the graph and save the components
fn cut_command(
    count: &CountArgs,
    mut config: SplitConfiguration,
    options: CutOptions,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let index = count.count()?;
    if index.is_empty() {
        anyhow::bail!("No k-mers were found in the input files; nothing to split");
    }

    if options.census {
        DegreeCensus::compute(&index, config.k, config.adjacency).print_summary();
    }

    let sequences = match &options.seeds {
        Some(path) => Some(
            load_sequences(path)
                .with_context(|| format!("Failed to load seed sequences from {}", path.display()))?,
        ),
        None => None,
    };

    std::fs::create_dir_all(&options.work_dir)
        .with_context(|| format!("Failed to create {}", options.work_dir.display()))?;
    if config.strategy == SplitStrategy::RecursiveThreshold {
        let path = stats_path(&options.work_dir, &config);
        config = config.with_stats_path(path);
    }

    info!("Searching for components...");
    let mut components = split(index, sequences.as_deref(), &config)?;
    if options.sort && config.strategy.is_randomized() {
        sort_and_number(&mut components);
    }

    info!("Total {} components were found", components.len());
    if components.is_empty() {
        warn!("No components were extracted! Perhaps you should decrease --min-component-size");
    } else {
        let total: u64 = components.iter().map(|c| c.size).sum();
        info!(
            "Average component size {}",
            (total as f64 / components.len() as f64).round()
        );
    }

    let format = if options.with_thresholds {
        ComponentFileFormat::WithThresholds
    } else {
        ComponentFileFormat::Plain
    };
    save_components_as(&components, &options.output, format)?;
    info!("Components saved to {}", options.output.display());

    if options.fasta {
        export_fasta(&components, config.k, config.adjacency, &options.work_dir)
            .context("Failed to export components as FASTA")?;
    }

    debug!("Component cutting finished in {:.2?}", start.elapsed());
    Ok(())
}

/// Default location of the statistics table
fn stats_path(work_dir: &Path, config: &SplitConfiguration) -> PathBuf {
    work_dir.join(format!(
        "components-stat-{}-{}.txt",
        config.min_size, config.max_size
    ))
}

/// Load a component file and print its summary
fn inspect_command(path: &Path, table: bool) -> anyhow::Result<()> {
    info!("Loading components from {}...", path.display());
    let components = load_components(path)?;

    let total: u64 = components.iter().map(|c| c.size).sum();
    let largest = components.iter().map(|c| c.size).max().unwrap_or(0);
    let smallest = components.iter().map(|c| c.size).min().unwrap_or(0);
    info!("Components: {}", components.len());
    info!("  total kmers: {}", total);
    info!("  size range: [{}, {}]", smallest, largest);
    if !components.is_empty() {
        info!(
            "  average size: {:.1}",
            total as f64 / components.len() as f64
        );
    }

    if table {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        write_component_stats(&mut out, &components)?;
        out.flush()?;
    }
    Ok(())
}

/// Count reads and print the degree census
fn census_command(count: &CountArgs) -> anyhow::Result<()> {
    let index = count.count()?;
    if index.is_empty() {
        anyhow::bail!("No k-mers were found in the input files");
    }
    let census = DegreeCensus::compute(&index, count.k, count.adjacency());
    census.print_summary();
    info!("Total: {} kmers", census.total());
    Ok(())
}
