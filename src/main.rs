use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use llm_gateway::{LlmServiceProfiles, Profile, telemetry};
use mail_qa::{AskOptions, IndicatifProgress, MailQa, NoopProgress, QaAnswer, QaConfig, QaParts};
use mail_store::embed::gateway::GatewayEmbedder;
use mail_store::{ContentStore, EmbeddingPolicy, EmbeddingsProvider, StoreConfig};
use tabular_engine::{
    HttpBlobFetcher, LoaderConfig, ReasonerConfig, TabularCache, TabularLoader, TabularReasoner,
};
use tracing::{Level, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Ask questions over ingested mail bodies and attachments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSONL files of pre-chunked records to ingest before asking
    #[arg(short, long, num_args = 1..)]
    ingest: Vec<PathBuf>,

    /// Re-embed every record even when it carries a precomputed vector
    #[arg(long)]
    reembed: bool,

    /// Number of chunks to retrieve (defaults to RAG_TOP_K)
    #[arg(short = 'k', long, default_value_t = 0)]
    top_k: usize,

    /// Print only the route decision
    #[arg(long)]
    route_only: bool,

    /// Print the answer as JSON
    #[arg(long)]
    json: bool,

    /// Debug logging for the workspace crates
    #[arg(short, long)]
    verbose: bool,

    /// Question to answer
    question: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the process environment still applies.
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("warn", level))
        .with(telemetry::layer())
        .init();

    let svc = Arc::new(LlmServiceProfiles::from_env().context("model gateway config")?);
    let store_cfg = StoreConfig::from_env();
    let embedder: Arc<dyn EmbeddingsProvider> =
        Arc::new(GatewayEmbedder::new(svc.clone(), store_cfg.embedding_dim));
    let store = Arc::new(ContentStore::new(store_cfg).context("content store config")?);

    for path in &args.ingest {
        let policy = if args.reembed {
            EmbeddingPolicy::ProviderOnly(embedder.as_ref())
        } else {
            EmbeddingPolicy::PrecomputedOr(embedder.as_ref())
        };
        let report = store
            .ingest_file(path, policy)
            .await
            .with_context(|| format!("ingesting {}", path.display()))?;
        println!(
            "{} {} read={} inserted={} duplicates={} empty={}",
            "ingested".green().bold(),
            path.display(),
            report.read,
            report.inserted,
            report.skipped_duplicates,
            report.dropped_empty
        );
    }
    for (kind, len) in store.stats().await {
        info!(collection = %kind, chunks = len, "collection size");
    }

    let Some(question) = args.question.as_deref() else {
        return Ok(());
    };

    let loader_cfg = LoaderConfig::from_env();
    let fetcher = Arc::new(HttpBlobFetcher::new(&loader_cfg).context("blob fetcher")?);
    let loader = Arc::new(TabularLoader::new(fetcher, Arc::new(TabularCache::new()), &loader_cfg));
    let reasoner = TabularReasoner::new(
        Some(svc.generator(Profile::Slow)),
        ReasonerConfig::from_env(),
    )
    .context("tabular reasoner config")?;

    let qa = MailQa::new(
        QaConfig::from_env(),
        QaParts {
            store,
            embedder,
            router_generator: Some(svc.generator(Profile::Fast)),
            answer_generator: svc.generator(Profile::Slow),
            loader,
            reasoner,
        },
    )
    .context("qa config")?;

    if args.route_only {
        let d = qa.classify_intent(question).await;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&d)?);
        } else {
            println!(
                "{} {} ({:.2}, {:?}): {}",
                "route".cyan().bold(),
                d.route,
                d.confidence,
                d.classifier,
                d.reason
            );
        }
        return Ok(());
    }

    let opts = AskOptions { top_k: args.top_k };
    let answer = if args.json {
        qa.ask_with_progress(question, opts, &NoopProgress).await
    } else {
        qa.ask_with_progress(question, opts, &IndicatifProgress::spinner())
            .await
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        print_answer(&answer);
    }
    Ok(())
}

fn print_answer(a: &QaAnswer) {
    println!(
        "{} {} ({:.2}) {} {:?}",
        "route".cyan().bold(),
        a.route,
        a.confidence,
        "analysis".cyan().bold(),
        a.analysis_type
    );
    println!("\n{}\n", a.answer);

    if !a.sources.is_empty() {
        println!("{}", "sources".yellow().bold());
        for (i, s) in a.sources.iter().enumerate() {
            let label = s
                .filename
                .as_deref()
                .or(s.subject.as_deref())
                .unwrap_or("source");
            let mut line = format!("  [{}] {label}", i + 1);
            if let Some(p) = s.page {
                line.push_str(&format!(" (page {p})"));
            } else if let Some(sheet) = &s.sheet {
                line.push_str(&format!(" (sheet {sheet})"));
            }
            if let Some(sender) = &s.sender {
                line.push_str(&format!(" from {sender}"));
            }
            println!("{line}");
        }
    }
    for p in &a.previews {
        println!("\n{}\n{}", "preview".yellow().bold(), p.dimmed());
    }
    if let Some(d) = &a.diagnostic {
        println!("\n{} {}", "diagnostic".red().bold(), d);
    }
}
