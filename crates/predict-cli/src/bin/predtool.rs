use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use predict_cli::commands::{build_ops, data_ops, query_ops};

#[derive(Parser)]
#[command(name = "predtool", about = "Prediction database build tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a predict db from `key text weight` triples
    Build {
        /// Input file (default: stdin)
        #[arg(long)]
        input: Option<String>,
        /// Output file
        #[arg(default_value = "predict.db")]
        output: String,
    },
    /// Turn an n-gram frequency list into build input
    MakeData {
        /// Drop n-grams weighing less than this
        #[arg(long)]
        filter_weight: Option<u32>,
        /// Keep at most this many candidates per key
        #[arg(long)]
        max_candidates: Option<usize>,
        /// Files of `ngram<TAB>weight` lines
        input_files: Vec<String>,
    },
    /// Look up a key (exact match)
    Lookup {
        /// Predict db file
        db_file: String,
        /// Key to look up
        query: String,
    },
    /// Show header and image sizes of a predict db
    Info {
        /// Predict db file
        db_file: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Build { input, output } => build_ops::build(input.as_deref(), &output),
        Command::MakeData {
            filter_weight,
            max_candidates,
            input_files,
        } => data_ops::make_data(&input_files, filter_weight, max_candidates),
        Command::Lookup { db_file, query } => query_ops::lookup(&db_file, &query),
        Command::Info { db_file } => query_ops::info(&db_file),
    }
}
