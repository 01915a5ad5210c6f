use crate::bootstrap::init::{
    StaticSearch, create_network_config, create_test_config, eventually, loopback_addr,
};
use libp2p::identity::Keypair;
use node::bootstrap::init::initialize;
use node::modules::gossip::GossipError;
use node::modules::network::manager::NetworkManager;
use node::modules::query::PeerHost;
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;

fn new_manager() -> NetworkManager {
    NetworkManager::new(Keypair::generate_ed25519(), Arc::new(StaticSearch::new(false)))
}

#[tokio::test]
#[serial]
async fn test_manager_lifecycle() {
    let manager = new_manager();
    let config = create_network_config();

    assert!(!manager.is_running().await);
    assert_eq!(<NetworkManager as PeerHost>::local_peer_id(&manager).await, None);

    manager.start(&config).await.unwrap();
    assert!(manager.is_running().await);
    assert_eq!(
        <NetworkManager as PeerHost>::local_peer_id(&manager).await,
        Some(*manager.local_peer_id())
    );

    assert!(manager.start(&config).await.is_err(), "Second start must fail");

    manager.stop().await.unwrap();
    assert!(!manager.is_running().await);
}

#[tokio::test]
#[serial]
async fn test_stop_without_start_is_noop() {
    let manager = new_manager();
    assert!(manager.stop().await.is_ok());
}

#[tokio::test]
#[serial]
async fn test_publish_before_start_is_not_joined() {
    let manager = new_manager();

    let err = manager.publish("/rag-topics", b"{}".to_vec()).await.unwrap_err();

    assert!(matches!(err, GossipError::NotJoined { .. }));
    assert!(err.is_unheard());
}

#[tokio::test]
#[serial]
async fn test_subscribe_before_start_fails() {
    let manager = new_manager();
    assert!(manager.subscribe("/rag-topics").await.is_err());
}

#[tokio::test]
#[serial]
async fn test_publish_unjoined_topic_is_not_joined() {
    let manager = new_manager();
    manager.start(&create_network_config()).await.unwrap();

    let err = manager.publish("/rag-topics", b"{}".to_vec()).await.unwrap_err();
    assert!(matches!(err, GossipError::NotJoined { .. }));

    manager.stop().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_publish_without_peers() {
    let manager = new_manager();
    manager.start(&create_network_config()).await.unwrap();
    let _subscription = manager.subscribe("/rag-topics").await.unwrap();

    let err = manager.publish("/rag-topics", b"{}".to_vec()).await.unwrap_err();
    assert!(matches!(err, GossipError::NoPeers { ref topic } if topic == "/rag-topics"));

    manager.stop().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_listen_addrs_include_loopback() {
    let manager = new_manager();
    manager.start(&create_network_config()).await.unwrap();

    let addr = loopback_addr(&manager).await;
    assert!(addr.to_string().contains("/tcp/"));
    assert!(addr.to_string().ends_with(&manager.local_peer_id().to_string()));

    manager.stop().await.unwrap();
}

#[test]
fn test_identity_from_configured_key() {
    let mut config = create_test_config();
    config.node_private_key = Some(
        "CAESQBEx8bKxlGKCzcfxsR94EEqCE+8bBm/fBaAXOBEkXiU9uGjKXsoDUJJuGugLJFVvbwvbqeZzP0IR23M45C0mkRY="
            .to_string(),
    );

    let first = initialize(&config).unwrap();
    let second = initialize(&config).unwrap();
    assert_eq!(first.public().to_peer_id(), second.public().to_peer_id());

    config.node_private_key = None;
    let generated = initialize(&config).unwrap();
    assert_ne!(generated.public().to_peer_id(), first.public().to_peer_id());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_rendezvous_connects_peers_sharing_only_a_hub() {
    let config = create_network_config();
    let hub = Arc::new(new_manager());
    let left = Arc::new(new_manager());
    let right = Arc::new(new_manager());

    for manager in [&hub, &left, &right] {
        manager.start(&config).await.unwrap();
    }

    let hub_addr = loopback_addr(&hub).await;
    left.dial_peer(hub_addr.clone()).await.unwrap();
    right.dial_peer(hub_addr).await.unwrap();

    // No mDNS and no direct dial: only the DHT can introduce left and right
    let right_id = *right.local_peer_id();
    let left_ref = Arc::clone(&left);
    let connected = eventually(Duration::from_secs(20), move || {
        let left = Arc::clone(&left_ref);
        async move { left.connected_peers().await.unwrap().contains(&right_id) }
    })
    .await;
    assert!(connected, "Peers behind a shared hub never found each other");

    for manager in [&hub, &left, &right] {
        manager.stop().await.unwrap();
    }
}
