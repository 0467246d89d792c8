//! End-to-end exchange over the in-process bus: session creation through the
//! key store, encrypted request/acknowledge roundtrip, and challenge scoring
//! on the side.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use wardwire_core::{KeyStore, Role, Session, SessionManager};
use wardwire_score::{
    generate_secret, ChallengeRecord, RecallOracle, ScorerConfig, SessionHistory, ThreatLabel,
    NORMAL_RETENTION, SECRET_LEN,
};
use wardwire_transport::{ChannelEvent, MemoryBus, MessageBus, SecureChannel, TopicPair};

async fn expect_event(channel: &mut SecureChannel) -> ChannelEvent {
    tokio::time::timeout(Duration::from_secs(2), channel.recv())
        .await
        .expect("recv timed out")
        .expect("recv failed")
}

/// Full lifecycle: create a session against the key store, open both sides
/// of the channel, run one request/acknowledge exchange, score a challenge
/// for the session, and tear it down with an authenticated kill.
#[tokio::test]
async fn test_full_session_e2e() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manager = SessionManager::new(KeyStore::open(dir.path()).expect("store"));

    // Client side creates the session; the responder rebinds the same id
    // and key from the store, as the server would.
    let client_session = manager.create().expect("create session");
    let session_id = client_session.id();
    let server_session = manager.lookup(&session_id).expect("lookup session");
    assert_eq!(server_session.role(), Role::Responder);

    let bus = Arc::new(MemoryBus::new());
    let mut client = SecureChannel::open(
        Arc::clone(&bus) as Arc<dyn MessageBus>,
        client_session,
        TopicPair::client(),
    )
    .await
    .expect("open client");
    let mut server = SecureChannel::open(
        Arc::clone(&bus) as Arc<dyn MessageBus>,
        server_session,
        TopicPair::server(),
    )
    .await
    .expect("open server");

    // Encrypted request/acknowledge roundtrip.
    client.send_text("AUTH_REQUEST").await.expect("send");
    match expect_event(&mut server).await {
        ChannelEvent::Acknowledged(message) => assert_eq!(message, "AUTH_REQUEST"),
        other => panic!("expected acknowledge, got {:?}", other),
    }
    match expect_event(&mut client).await {
        ChannelEvent::Message(text) => assert_eq!(text, "ACK:AUTH_REQUEST"),
        other => panic!("expected ack message, got {:?}", other),
    }

    // Challenge scoring rides alongside the encrypted exchange.
    let mut rng = StdRng::seed_from_u64(0xE2E);
    let secret = generate_secret(&mut rng, SECRET_LEN);
    let noisy = wardwire_score::corrupt(&secret, NORMAL_RETENTION, &mut rng).expect("corrupt");
    let oracle = RecallOracle::perfect(secret.clone());
    let record = ChallengeRecord::evaluate(&secret, &noisy, &oracle, &ScorerConfig::default())
        .expect("evaluate");

    assert!(record.auth_success());
    assert_eq!(record.drift(), 0.0);
    assert_eq!(record.threat(), ThreatLabel::None);

    let mut history = SessionHistory::new();
    history.push(session_id.to_string(), record);
    assert_eq!(history.summary().auth_successes, 1);

    // Authenticated kill tears the session down on both sides.
    client.send_kill().await.expect("kill");
    assert!(matches!(expect_event(&mut server).await, ChannelEvent::Killed));
    assert!(!server.is_active());
    assert!(!client.is_active());
}

/// A validly-encrypted frame for a foreign session never disturbs the local
/// exchange, even when it lands first.
#[tokio::test]
async fn test_e2e_foreign_frame_does_not_disturb_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manager = SessionManager::new(KeyStore::open(dir.path()).expect("store"));

    let client_session = manager.create().expect("create");
    let server_session = manager.lookup(&client_session.id()).expect("lookup");

    let bus = Arc::new(MemoryBus::new());
    let mut client = SecureChannel::open(
        Arc::clone(&bus) as Arc<dyn MessageBus>,
        client_session,
        TopicPair::client(),
    )
    .await
    .expect("open client");
    let mut server = SecureChannel::open(
        Arc::clone(&bus) as Arc<dyn MessageBus>,
        server_session,
        TopicPair::server(),
    )
    .await
    .expect("open server");

    // An unrelated session publishes onto the shared request topic while the
    // server is already waiting.
    let mut stranger = manager.create().expect("stranger");
    let foreign_wire = stranger.seal_message("foreign noise").expect("seal").to_wire();

    let (event, _) = tokio::join!(expect_event(&mut server), async {
        bus.publish("wardwire/server", foreign_wire)
            .await
            .expect("publish");
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.send_text("mine").await.expect("send");
    });

    match event {
        ChannelEvent::Acknowledged(message) => assert_eq!(message, "mine"),
        other => panic!("expected acknowledge, got {:?}", other),
    }
}

/// Sessions created through the manager can always be rebound from disk —
/// the key record outlives the in-memory session.
#[tokio::test]
async fn test_key_record_survives_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manager = SessionManager::new(KeyStore::open(dir.path()).expect("store"));

    let mut session = manager.create().expect("create");
    let id = session.id();
    manager.destroy(&mut session);
    drop(session);

    // Rebinding after destruction still works; only the in-memory key was
    // released.
    let rebound: Session = manager.lookup(&id).expect("rebind");
    assert_eq!(rebound.id(), id);
}
