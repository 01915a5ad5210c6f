use std::sync::Arc;

use crate::modules::gossip::{GossipSubscriber, HttpNotifier, NotificationQueue};
use crate::modules::network::config::NetworkConfig;
use crate::{
    api::{
        node::Node,
        servers::{app_state::AppState, rest},
    },
    bootstrap::{self, config::Config},
};
use errors::AppError;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub async fn run() -> Result<(), AppError> {
    init_tracing();

    let config = Config::from_env()?;
    info!("Configuration loaded. Initializing node...");

    let keypair = bootstrap::init::initialize(&config)?;
    let node = Node::assemble(keypair, &config)?;
    let app_state = AppState::new(node);

    run_servers(app_state, config).await
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}

/// Bring the swarm up, join the gossip topic and spawn the loops that live
/// as long as the process: notifier worker, subscriber, republish sweep.
///
/// With GossipSub disabled only the swarm starts; ingest still stores and
/// its broadcast reports the topic as not joined.
async fn start_background_tasks(
    node: &Node,
    config: &Config,
    network_config: &NetworkConfig,
) -> Result<Vec<JoinHandle<()>>, AppError> {
    node.network_manager.start(network_config).await?;
    info!("Network manager started");

    if !network_config.gossipsub.enabled {
        warn!("GossipSub disabled, expertise will not be gossiped or received");
        return Ok(Vec::new());
    }

    let subscription = node
        .network_manager
        .subscribe(config.gossip.topic.clone())
        .await?;

    let mut tasks = Vec::new();

    let notifications = match &config.client_api.url {
        Some(url) => {
            let notifier = HttpNotifier::new(url, config.client_api.queue.timeout)
                .map_err(|e| AppError::Config(format!("Failed to build notifier client: {}", e)))?;
            info!(endpoint = %notifier.endpoint(), "Gossip notifications enabled");

            let (queue, worker) =
                NotificationQueue::spawn(Arc::new(notifier), &config.client_api.queue);
            tasks.push(worker);
            Some(queue)
        }
        None => {
            info!("CLIENT_API_URL not set, gossip notifications disabled");
            None
        }
    };

    tasks.push(GossipSubscriber::new(subscription, notifications).spawn());
    tasks.push(Arc::clone(&node.publisher).spawn_sweep(config.gossip.republish_interval));

    Ok(tasks)
}

async fn run_servers(app_state: AppState, config: Config) -> Result<(), AppError> {
    info!("Starting servers...");

    let tasks = {
        let node = app_state.node.read().await;
        start_background_tasks(&node, &config, &NetworkConfig::from_env()).await?
    };

    let result = tokio::select! {
        result = rest::start(&app_state, &config) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            Ok(())
        },
    };

    for task in &tasks {
        task.abort();
    }

    let node = app_state.node.read().await;
    if let Err(e) = node.network_manager.stop().await {
        error!("Failed to stop network manager: {}", e);
    }

    info!("Application shutdown complete.");
    result
}
