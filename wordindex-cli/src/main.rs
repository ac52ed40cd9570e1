use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wordindex::{
    build_index,
    config::{DEFAULT_INDEX_OUTPUT, DEFAULT_RESULTS_OUTPUT},
    run_queries, IndexConfig, ResultTable, ThreadCount,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory (or single .txt file) to index
    #[arg(short = 'd', long = "dir")]
    root: Option<PathBuf>,

    /// Build and search on a worker pool (1-5 threads, default 5)
    #[arg(
        short = 't',
        long,
        num_args = 0..=1,
        default_missing_value = "5",
        allow_negative_numbers = true
    )]
    threads: Option<String>,

    /// Write the index dump (default: index.txt)
    #[arg(short = 'i', long, num_args = 0..=1, default_missing_value = DEFAULT_INDEX_OUTPUT)]
    index: Option<PathBuf>,

    /// Query file, one query per line
    #[arg(short = 'q', long)]
    query: Option<PathBuf>,

    /// Write the query results (default: results.txt)
    #[arg(short = 'r', long, num_args = 0..=1, default_missing_value = DEFAULT_RESULTS_OUTPUT)]
    results: Option<PathBuf>,

    /// Additional configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Save the effective configuration as YAML before running
    #[arg(long, value_name = "PATH")]
    save_config: Option<PathBuf>,
}

impl Cli {
    fn to_config(&self) -> IndexConfig {
        let mut config = IndexConfig {
            root_path: self.root.clone(),
            threads: self.threads.as_deref().map(ThreadCount::parse),
            query_path: self.query.clone(),
            index_output: self.index.clone(),
            results_output: self.results.clone(),
            ..IndexConfig::default()
        };
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        config
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = match cli.config.as_deref() {
        Some(path) => IndexConfig::load_from(Some(path)),
        None => IndexConfig::load(),
    };
    let config = loaded
        .context("Failed to load configuration")?
        .merge_with_cli(cli.to_config());
    init_logging(&config.log_level);

    if let Some(path) = &cli.save_config {
        config
            .save(path)
            .with_context(|| format!("Unable to save configuration to {}", path.display()))?;
        println!("Configuration saved to {}", path.display().to_string().blue());
    }
    run(config)
}

fn run(config: IndexConfig) -> Result<()> {
    let Some(root) = config.root_path.as_deref() else {
        bail!("No directory to index; pass one with -d <PATH>");
    };

    let start = Instant::now();
    let (index, build_stats) = build_index(root, config.threads)
        .with_context(|| format!("Unable to index {}", root.display()))?;
    info!("Built index of {} words", index.word_count());

    if let Some(output) = &config.index_output {
        match index.write_to_file(output) {
            Ok(()) => println!("Index written to {}", output.display().to_string().blue()),
            Err(e) => {
                error!("Unable to write index to {}: {}", output.display(), e);
                eprintln!("{} {}", "Unable to write index:".red(), e);
            }
        }
    }

    let mut queries = 0;
    let mut table = ResultTable::new();
    if let Some(query_path) = &config.query_path {
        match run_queries(&index, query_path, config.threads) {
            Ok((searched, query_stats)) => {
                queries = query_stats.queries_searched;
                table = searched;
            }
            Err(e) => {
                error!("Unable to search {}: {}", query_path.display(), e);
                eprintln!("{} {}", "Unable to search queries:".red(), e);
            }
        }
    }

    // Written whenever requested, empty when no query ran
    if let Some(output) = &config.results_output {
        match table.write_to_file(output) {
            Ok(()) => println!("Results written to {}", output.display().to_string().blue()),
            Err(e) => {
                error!("Unable to write results to {}: {}", output.display(), e);
                eprintln!("{} {}", "Unable to write results:".red(), e);
            }
        }
    }

    let mode = match config.threads {
        Some(threads) => format!("{} threads", threads),
        None => "sequential".to_string(),
    };
    println!(
        "{} words from {} files, {} queries ({}) in {:.2}s",
        index.word_count().to_string().green(),
        build_stats.files_indexed.to_string().green(),
        queries.to_string().green(),
        mode,
        start.elapsed().as_secs_f64()
    );
    if build_stats.files_failed > 0 {
        println!(
            "{}",
            format!("{} files could not be read", build_stats.files_failed).yellow()
        );
    }
    Ok(())
}
