//! Classroom relay walkthrough
//!
//! Run with: cargo run --example classroom_relay
//!
//! Simulates one lesson end to end without any network transport:
//! a teacher goes live, two students join and trade negotiation messages
//! with the teacher, recorded chunks arrive out of order, one student
//! leaves, and the teacher ends the stream. Every event the core would
//! push to a real client is printed from the per-connection channels.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc::UnboundedReceiver;

use classcast::{
    ConnectionHandle, ConnectionId, Coordinator, CoordinatorConfig, Identity, IdentityProvider,
    MemorySink, OutboundEvent, Role, SessionKey, SignalKind, StaticIdentityProvider,
};

/// Print every event pushed to one client
fn spawn_client_printer(name: &'static str, mut events: UnboundedReceiver<OutboundEvent>) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!("[{name}] {event:?}");
        }
        println!("[{name}] channel closed");
    });
}

async fn connect(
    coordinator: &Coordinator,
    provider: &dyn IdentityProvider,
    token: &str,
    name: &'static str,
) -> ConnectionId {
    let identity = provider.authenticate(token).expect("token registered");
    let (handle, events) = ConnectionHandle::channel();
    let id = coordinator.connect(identity, handle).await;
    spawn_client_printer(name, events);
    id
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "classcast=info".into()),
        )
        .init();

    let provider = StaticIdentityProvider::new()
        .with_token("tok-teacher", Identity::new("ms-rivera", Role::Broadcaster))
        .with_token("tok-alice", Identity::new("alice", Role::Viewer))
        .with_token("tok-bob", Identity::new("bob", Role::Viewer));

    let sink = Arc::new(MemorySink::new());
    let coordinator = Coordinator::new(
        CoordinatorConfig::default(),
        Arc::clone(&sink) as Arc<dyn classcast::StorageSink>,
    );

    let key = SessionKey::new("ms-rivera", "algebra-101");

    let teacher = connect(&coordinator, &provider, "tok-teacher", "teacher").await;
    coordinator.broadcaster_register(teacher, &key).await?;

    let alice = connect(&coordinator, &provider, "tok-alice", "alice").await;
    let bob = connect(&coordinator, &provider, "tok-bob", "bob").await;
    coordinator.watcher_join(alice, &key).await?;
    coordinator.watcher_join(bob, &key).await?;

    // Negotiation: the teacher offers to each student, students answer
    coordinator
        .signal(&key, teacher, alice, SignalKind::Offer, Bytes::from_static(b"<sdp offer>"))
        .await?;
    coordinator
        .signal(&key, alice, teacher, SignalKind::Answer, Bytes::from_static(b"<sdp answer>"))
        .await?;
    coordinator
        .signal(&key, teacher, bob, SignalKind::Offer, Bytes::from_static(b"<sdp offer>"))
        .await?;
    coordinator
        .signal(&key, bob, teacher, SignalKind::Answer, Bytes::from_static(b"<sdp answer>"))
        .await?;

    // Recording chunks arrive slightly out of order and still land ordered
    for index in [0u64, 1, 3, 2, 4] {
        coordinator
            .media_chunk(teacher, &key, index, Bytes::from_static(b"<media>"))
            .await?;
    }

    coordinator.disconnect(bob).await;

    if let Some(snapshot) = coordinator.session_snapshot(&key).await {
        println!(
            "session {key}: viewers={} recorded_chunks={}",
            snapshot.viewer_count, snapshot.recorded_chunks
        );
    }

    coordinator.stream_stop(teacher, &key).await?;

    println!("stored indices: {:?}", sink.stored_indices(&key));
    println!("finalized: {:?}", sink.finalized());

    // Give the printer tasks a moment to drain
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    Ok(())
}
