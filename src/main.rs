use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use stats::PValueMethod;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bondcmp::schema::Schema;
use bondcmp::{DEMO_DATASET, analysis, extract, report};

#[derive(Parser)]
#[command(name = "bondcmp", about = "Compare wire-bond measurements between two tool groups")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Welch t-test and five-number summary for every metric
    Compare {
        /// Comma-separated export to analyze
        #[arg(required_unless_present = "demo", conflicts_with = "demo")]
        file: Option<PathBuf>,

        /// Analyze the bundled demo dataset instead of a file
        #[arg(long)]
        demo: bool,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,

        /// Use the exact Student-t tail instead of the approximate p-value
        #[arg(long)]
        exact_p: bool,

        /// JSON file describing preamble rows and metric columns
        #[arg(long)]
        schema: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compare {
            file,
            demo,
            json,
            exact_p,
            schema,
        } => {
            let start = Instant::now();

            let schema = match schema {
                Some(path) => Schema::load(&path).unwrap_or_else(|e| {
                    eprintln!("error: schema '{}': {e}", path.display());
                    std::process::exit(1);
                }),
                None => Schema::default(),
            };

            let (source, raw) = match file {
                Some(path) if !demo => {
                    let raw = std::fs::read(&path).unwrap_or_else(|e| {
                        eprintln!("error: cannot read '{}': {e}", path.display());
                        std::process::exit(1);
                    });
                    (path.display().to_string(), raw)
                }
                _ => ("demo".to_string(), DEMO_DATASET.as_bytes().to_vec()),
            };

            let (groups, counts) = extract::extract_with_stats(&raw, &schema).unwrap_or_else(|e| {
                eprintln!("error: cannot parse '{source}': {e}");
                std::process::exit(1);
            });
            eprintln!(
                "Loaded {} rows ({} skipped) from {source} in {:.1}ms",
                counts.rows_seen - counts.rows_skipped,
                counts.rows_skipped,
                start.elapsed().as_secs_f64() * 1000.0
            );

            let method = if exact_p {
                PValueMethod::Exact
            } else {
                PValueMethod::Approximate
            };
            let reports = analysis::analyze(&groups, method);

            if json {
                match report::render_json(&reports, &source, method) {
                    Ok(out) => println!("{out}"),
                    Err(e) => {
                        eprintln!("error: cannot serialize report: {e}");
                        std::process::exit(1);
                    }
                }
            } else {
                report::print_table(&reports);
            }
        }
    }
}
