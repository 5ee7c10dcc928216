use parallax_cluster::committee::signer::Committee;
use parallax_cluster::models::catalog::{ModelCatalog, ModelInfo};
use parallax_cluster::node::client::NodeClient;
use parallax_cluster::node::runtime::{NodeRuntime, NodeRuntimeConfig};
use parallax_cluster::registry::handlers::build_app;
use parallax_cluster::registry::service::{RegistryConfig, SequencerRegistry};
use parallax_cluster::router::policy::RoundRobin;
use parallax_cluster::router::service::{RouterConfig, TaskRouter};
use parallax_cluster::scheduler::scheduler::TaskScheduler;
use parallax_cluster::scheduler::submitter::{RetryingSubmitter, SubmitterConfig};
use parallax_cluster::scheduler::types::{InferenceFn, SchedulerConfig};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DEFAULT_MODELS: [&str; 3] = ["parallax-llm-v1", "quant-forecast-lite", "vision-encoder-v2"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} --listen <addr:port> [--with-node]", args[0]);
        eprintln!("Example: {} --listen 127.0.0.1:5050", args[0]);
        eprintln!("Example: {} --listen 127.0.0.1:5050 --with-node", args[0]);
        std::process::exit(1);
    }

    let mut listen_addr: Option<SocketAddr> = None;
    let mut with_node = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--listen" => {
                listen_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--with-node" => {
                with_node = true;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    let listen_addr = match listen_addr {
        Some(addr) => addr,
        None => anyhow::bail!("--listen is required"),
    };
    let shutdown = CancellationToken::new();

    tracing::info!("Starting PARALLAX sequencer on {}", listen_addr);

    // 1. Validator committee (3-of-5 quorum):
    let committee = Committee::new(5, 3);
    tracing::info!(
        "Committee initialized: {} members, quorum {}",
        committee.size(),
        committee.quorum()
    );

    // 2. Registry, router, and the stale-assignment sweeper:
    let registry = SequencerRegistry::new(committee.clone(), RegistryConfig::default());
    let router = TaskRouter::new(
        registry.clone(),
        Box::new(RoundRobin::new()),
        RouterConfig::default(),
    );
    router.clone().spawn_sweeper(shutdown.clone());

    // 3. Model catalog:
    let catalog = seed_catalog();
    tracing::info!("Model catalog seeded with {} models", catalog.len());

    // 4. Optional embedded worker node for single-process demos:
    if with_node {
        spawn_embedded_node(committee.clone(), listen_addr, shutdown.clone());
    }

    // 5. HTTP server:
    let app = build_app(registry, router, catalog);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    tracing::info!("Sequencer listening on {}", listen_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
            server_shutdown.cancel();
        })
        .await?;

    shutdown.cancel();
    Ok(())
}

fn seed_catalog() -> Arc<ModelCatalog> {
    let catalog = ModelCatalog::new();
    catalog.register(ModelInfo {
        model_id: "parallax-llm-v1".to_string(),
        name: "Parallax LLM".to_string(),
        description: "Sentiment classification over short text prompts".to_string(),
        task: "text-classification".to_string(),
        source: "huggingface.co/distilbert-base-uncased".to_string(),
        size_mb: 420,
        license: "Apache-2.0".to_string(),
        status: "available".to_string(),
    });
    catalog.register(ModelInfo {
        model_id: "quant-forecast-lite".to_string(),
        name: "Quant Forecast Lite".to_string(),
        description: "Trend prediction from financial news snippets".to_string(),
        task: "text-forecasting".to_string(),
        source: "huggingface.co/ProsusAI/finbert".to_string(),
        size_mb: 275,
        license: "MIT".to_string(),
        status: "available".to_string(),
    });
    catalog.register(ModelInfo {
        model_id: "vision-encoder-v2".to_string(),
        name: "Vision Encoder".to_string(),
        description: "Image captioning for charts and logos".to_string(),
        task: "image-captioning".to_string(),
        source: "huggingface.co/nlpconnect/vit-gpt2-image-captioning".to_string(),
        size_mb: 680,
        license: "CC-BY-SA-4.0".to_string(),
        status: "available".to_string(),
    });
    catalog
}

/// Runs a worker node inside the sequencer process, talking to it over
/// loopback HTTP exactly like an external node would.
fn spawn_embedded_node(
    committee: Arc<Committee>,
    sequencer_addr: SocketAddr,
    shutdown: CancellationToken,
) {
    let node_id = format!("node-{}", uuid::Uuid::new_v4());
    let base_url = format!("http://{}", sequencer_addr);

    // Stand-in for a real inference backend: classifies everything as
    // positive after a short simulated model latency.
    let inference: InferenceFn = Arc::new(|model_id, _input| {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(serde_json::json!({
                "label": "POSITIVE",
                "score": 0.93,
                "model_id": model_id,
            }))
        })
    });

    let submitter =
        RetryingSubmitter::over_http(reqwest::Client::new(), SubmitterConfig::default());
    let scheduler = TaskScheduler::new(
        &node_id,
        inference,
        committee,
        submitter,
        &format!("{}/submit_result", base_url),
        SchedulerConfig::default(),
        shutdown.clone(),
    );
    let runtime = NodeRuntime::new(
        &node_id,
        DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        "embedded-node-pubkey",
        NodeClient::new(&base_url),
        scheduler,
        NodeRuntimeConfig::default(),
        shutdown,
    );

    tracing::info!("Spawning embedded worker node {}", node_id);
    runtime.spawn();
}
