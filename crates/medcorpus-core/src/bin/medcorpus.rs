//! `medcorpus` command line: initialise a graph database, generate a corpus,
//! inspect written shards.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use medcorpus_core::sampler::{generate, list_shards};
use medcorpus_core::models::NodeLabel;
use medcorpus_core::store::database::GraphStore;
use medcorpus_core::GeneratorConfig;

#[derive(Parser)]
#[command(name = "medcorpus")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Synthesize a labeled sentence corpus from a medical knowledge graph")]
#[command(propagate_version = true)]
struct Cli {
    /// Log filter (overrides RUST_LOG), e.g. `info` or `medcorpus_core=debug`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the graph schema
    InitDb {
        #[arg(long)]
        db: PathBuf,
    },
    /// Sample the graph and write sentence shards
    Generate(GenerateArgs),
    /// List shards in an output directory
    Inspect {
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        prefix: Option<String>,
    },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// JSON config file; MEDCORPUS_* variables and flags override it
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    db: Option<PathBuf>,
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long)]
    prefix: Option<String>,
    #[arg(long)]
    workers: Option<usize>,
    /// Fix the seed order and shard shuffles
    #[arg(long)]
    seed: Option<u64>,
    /// Total sentence target across hop classes
    #[arg(long)]
    total: Option<u64>,
    #[arg(long)]
    per_file: Option<usize>,
}

impl GenerateArgs {
    fn apply(self, config: &mut GeneratorConfig) {
        if let Some(db) = self.db {
            config.graph_db_path = db;
        }
        if let Some(out) = self.out {
            config.output_dir = out;
        }
        if let Some(prefix) = self.prefix {
            config.output_prefix = prefix;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(seed) = self.seed {
            config.rng_seed = Some(seed);
        }
        if let Some(total) = self.total {
            config.total_target = total;
        }
        if let Some(per_file) = self.per_file {
            config.sentences_per_file = per_file;
        }
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_init_db(db: &Path) -> anyhow::Result<()> {
    let store = GraphStore::create(db)
        .with_context(|| format!("initialising {}", db.display()))?;
    println!(
        "{} ready ({} disease nodes)",
        db.display(),
        store.count_nodes(NodeLabel::Disease)?
    );
    Ok(())
}

fn run_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mut config = GeneratorConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let store = GraphStore::open(
        &config.graph_db_path,
        config.workers as u32,
        config.query_timeout_ms,
    )?;
    let summary = generate(&store, &config)?;

    let summary_json = serde_json::to_string_pretty(&summary)?;
    let summary_path = config
        .output_dir
        .join(format!("{}_summary.json", config.output_prefix));
    std::fs::write(&summary_path, &summary_json)
        .with_context(|| format!("writing {}", summary_path.display()))?;
    println!("{summary_json}");
    Ok(())
}

fn run_inspect(out: Option<PathBuf>, prefix: Option<String>) -> anyhow::Result<()> {
    let defaults = GeneratorConfig::load(None)?;
    let out = out.unwrap_or(defaults.output_dir);
    let prefix = prefix.unwrap_or(defaults.output_prefix);
    let shards = list_shards(&out, &prefix)
        .with_context(|| format!("reading shards in {}", out.display()))?;
    let mut total = 0usize;
    for shard in &shards {
        total += shard.rows;
        println!(
            "{:>4}  {:>6} rows  {}  {}",
            shard.seq,
            shard.rows,
            &shard.sha256[..12],
            shard.path.display()
        );
    }
    println!("{} shard(s), {} rows", shards.len(), total);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match cli.command {
        Commands::InitDb { db } => run_init_db(&db),
        Commands::Generate(args) => run_generate(args),
        Commands::Inspect { out, prefix } => run_inspect(out, prefix),
    }
}
