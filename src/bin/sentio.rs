#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use sentio_harness::browser::{self, RecordFilter};
use sentio_harness::harness::{Harness, ProgressObserver};
use sentio_harness::prompts::PromptSet;
use sentio_harness::registry::ModelRegistry;
use sentio_harness::secrets::Secrets;
use sentio_harness::store::firestore::DEFAULT_COLLECTION;
use sentio_harness::store::{CsvResultStore, FirestoreStore, LocalSink, RemoteStore};

#[derive(Parser)]
#[command(name = "sentio", version, about = "Sentio batch LLM comparison harness")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List models available with the current credentials
    Models,
    /// Validate configured credentials and report missing fields
    Validate,
    /// Run the prompt set across the selected models
    Run {
        /// Prompt CSV (requires a 'Prompt' column)
        #[arg(long, default_value = "data/prompts.csv")]
        prompts: PathBuf,

        /// Comma-separated model names (default: every configured model)
        #[arg(long, value_delimiter = ',')]
        models: Option<Vec<String>>,

        /// Number of runs per prompt
        #[arg(long, default_value_t = 1)]
        repeat: usize,

        /// Local results CSV
        #[arg(long, default_value = "data/results.csv")]
        results: PathBuf,

        /// Remote collection name
        #[arg(long, default_value = DEFAULT_COLLECTION)]
        collection: String,
    },
    /// Browse or export accumulated results
    Results {
        /// Where to read from
        #[arg(long, value_enum, default_value = "local")]
        source: ResultSource,

        /// Local results CSV
        #[arg(long, default_value = "data/results.csv")]
        results: PathBuf,

        /// Remote collection name
        #[arg(long, default_value = DEFAULT_COLLECTION)]
        collection: String,

        /// Keep only rows with this exact date (repeatable)
        #[arg(long)]
        date: Vec<String>,

        /// Keep only rows from this model (repeatable)
        #[arg(long)]
        model: Vec<String>,

        /// Write the filtered set to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete the local results file
    Clear {
        #[arg(long, default_value = "data/results.csv")]
        results: PathBuf,

        /// Required confirmation; clearing cannot be undone
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ResultSource {
    Local,
    Remote,
    Both,
}

/// Writes a progress line to stderr after each cell.
struct StderrProgress;

impl ProgressObserver for StderrProgress {
    fn on_progress(&self, completed: usize, total: usize) {
        let fraction = Self::fraction(completed, total);
        eprintln!("[run] {completed}/{total} ({:.0}%)", fraction * 100.0);
    }
}

fn build_remote(
    secrets: &Secrets,
    collection: &str,
) -> Result<RemoteStore, Box<dyn std::error::Error>> {
    match secrets.firebase()? {
        Some(firebase) => {
            let store = FirestoreStore::from_secrets(&firebase, collection)?;
            eprintln!("[sentio] remote store connected");
            Ok(RemoteStore::new(Arc::new(store)))
        }
        None => {
            eprintln!("[sentio] remote store not configured; uploads disabled");
            Ok(RemoteStore::disabled())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentio_harness=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Models => {
            let secrets = Secrets::from_env();
            let registry = ModelRegistry::from_secrets(&secrets)?;
            if registry.is_empty() {
                eprintln!("no models configured; set vendor API keys first");
            } else {
                for name in registry.names() {
                    println!("{name}");
                }
            }
        }
        Commands::Validate => {
            let secrets = Secrets::from_env();
            match secrets.require_all_vendors() {
                Ok(()) => println!("vendor keys: ok"),
                Err(err) => println!("vendor keys: {err}"),
            }
            match secrets.firebase() {
                Ok(Some(_)) => println!("firestore: ok"),
                Ok(None) => println!("firestore: not configured (uploads disabled)"),
                Err(err) => println!("firestore: {err}"),
            }
        }
        Commands::Run {
            prompts,
            models,
            repeat,
            results,
            collection,
        } => {
            if repeat < 1 {
                return Err("--repeat must be >= 1".into());
            }

            let secrets = Secrets::from_env();
            let registry = ModelRegistry::from_secrets(&secrets)?;
            if registry.is_empty() {
                return Err("no models configured; set vendor API keys first".into());
            }

            let prompt_set = PromptSet::from_csv_path(&prompts)?;
            eprintln!("[sentio] {} prompts loaded", prompt_set.len());

            let selection = match &models {
                Some(names) => registry.select(names)?,
                None => registry.select_all(),
            };

            let local = CsvResultStore::new(&results);
            let remote = build_remote(&secrets, &collection)?;
            let harness = Harness::new(Arc::new(local), remote);

            let records = harness
                .run(&prompt_set, &selection, repeat, &StderrProgress)
                .await?;

            let failures = records.iter().filter(|r| r.is_error()).count();
            println!(
                "completed {} records ({} failed) -> {}",
                records.len(),
                failures,
                results.display()
            );
        }
        Commands::Results {
            source,
            results,
            collection,
            date,
            model,
            out,
        } => {
            let filter = RecordFilter {
                dates: date,
                models: model,
            };

            // A local-only export keeps the historical local schema; combined
            // or remote sources use the unified row with doc ids.
            let csv = match source {
                ResultSource::Local => {
                    let store = CsvResultStore::new(&results);
                    let records = store.load_all()?.unwrap_or_default();
                    if records.is_empty() {
                        eprintln!("no results available; run some models first");
                        return Ok(());
                    }
                    let records = if filter.is_empty() {
                        records
                    } else {
                        browser::filter_records(&records, &filter)
                    };
                    eprintln!("[sentio] {} rows selected", records.len());
                    browser::to_local_csv(&records)?
                }
                ResultSource::Remote | ResultSource::Both => {
                    let local_rows = if matches!(source, ResultSource::Both) {
                        let store = CsvResultStore::new(&results);
                        store.load_all()?.unwrap_or_default()
                    } else {
                        Vec::new()
                    };
                    let secrets = Secrets::from_env();
                    let remote = build_remote(&secrets, &collection)?;
                    let remote_rows = remote.scan_all().await?;

                    if local_rows.is_empty() && remote_rows.is_empty() {
                        eprintln!("no results available; run some models first");
                        return Ok(());
                    }

                    let merged = browser::merge(&local_rows, &remote_rows);
                    let rows = if filter.is_empty() {
                        merged
                    } else {
                        browser::filter_rows(&merged, &filter)
                    };
                    eprintln!("[sentio] {} rows selected", rows.len());
                    browser::to_csv(&rows)?
                }
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, csv)?;
                    println!("written to {}", path.display());
                }
                None => print!("{csv}"),
            }
        }
        Commands::Clear { results, yes } => {
            if !yes {
                return Err("refusing to clear without --yes; this cannot be undone".into());
            }
            let store = CsvResultStore::new(&results);
            store.clear()?;
            println!("cleared {}", results.display());
        }
    }

    Ok(())
}
