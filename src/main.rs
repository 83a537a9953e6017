use anyhow::{Context, Result};
use clap::Parser;
use kwhquery::{
    config::{Config, Credentials, NarrativeBackend},
    input::{FixedQuery, InteractivePrompt, QuerySource},
    Orchestrator, QueryOutcome, Table,
};
use std::{fs::File, io, path::PathBuf};
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "kwhquery")]
#[command(about = "Ask natural-language questions about an energy consumption table")]
struct Args {
    /// CSV file to load (overrides DATA_PATH)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Answer this one query and exit instead of prompting
    #[arg(short, long)]
    query: Option<String>,

    /// Narrative backend: none, completion or gemini (overrides NARRATIVE_BACKEND)
    #[arg(short, long)]
    narrative: Option<NarrativeBackend>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    // ─── 2) configuration ────────────────────────────────────────────
    if let Err(e) = dotenv::dotenv() {
        debug!("no .env loaded: {}", e);
    }
    let args = Args::parse();
    let mut config = Config::from_env().context("reading configuration")?;
    if let Some(path) = args.data {
        config.data_path = path;
    }
    if let Some(backend) = args.narrative {
        config.narrative = backend;
    }

    // ─── 3) load table once ──────────────────────────────────────────
    let file = File::open(&config.data_path)
        .with_context(|| format!("opening {}", config.data_path.display()))?;
    let table = Table::from_reader(file)
        .with_context(|| format!("parsing {}", config.data_path.display()))?;
    info!(
        columns = table.num_columns(),
        rows = table.num_rows(),
        "loaded {}",
        config.data_path.display()
    );

    let orchestrator = Orchestrator::from_config(&config)?;

    // ─── 4) answer queries ───────────────────────────────────────────
    let mut source: Box<dyn QuerySource> = match args.query {
        Some(q) => Box::new(FixedQuery::new(q)),
        None => Box::new(InteractivePrompt::new(
            io::stdin().lock(),
            io::stdout(),
            "Please enter your query: ",
        )),
    };

    answer_all(source.as_mut(), &orchestrator, &table, &config.credentials).await
}

/// Answer every query `source` yields. Stops at the first failure and returns it.
async fn answer_all(
    source: &mut dyn QuerySource,
    orchestrator: &Orchestrator,
    table: &Table,
    credentials: &Credentials,
) -> Result<()> {
    while let Some(query) = source.next_query()? {
        match orchestrator.answer_query(table, &query, credentials).await {
            Ok(outcome) => report(&outcome),
            Err(e) => {
                error!("query failed: {}", e);
                return Err(e).context("query failed");
            }
        }
    }
    Ok(())
}

fn report(outcome: &QueryOutcome) {
    println!("AnswerConverted: {}", outcome.quantity);
    println!("Answer: {}", outcome.answer.answer);
    println!("Coordinates: {:?}", outcome.answer.coordinates);
    println!("Cells: {:?}", outcome.answer.cells);
    println!("Aggregator: {}", outcome.answer.aggregator);
    if let Some(text) = &outcome.narrative {
        println!("Recommendation: {}", text);
    }
}
