//! Secure channel: a core session driven over the bus.
//!
//! # Security Invariants
//!
//! - `SecureChannel` does not implement `Clone`
//! - The background receive task only ever touches the mailbox
//! - A tampered frame yields a per-message [`ChannelEvent::AuthFailure`];
//!   the channel keeps running
//! - Only an authenticated kill sentinel (or local `close()`) terminates

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use wardwire_core::session::{ReceiveOutcome, Session, KILL_SENTINEL};
use wardwire_core::ProtocolError;

use crate::bus::MessageBus;
use crate::config::TopicPair;
use crate::error::TransportError;
use crate::mailbox::Mailbox;

/// Display marker for a payload that failed authentication, distinguishable
/// from any genuine decrypted message.
pub const AUTH_FAILURE_MARKER: &str = "[decryption failed]";

/// What a call to [`SecureChannel::recv`] produced.
#[derive(Debug)]
pub enum ChannelEvent {
    /// Decrypted reply text (initiator side).
    Message(String),
    /// Decrypted request; the `ACK:` reply has already been published
    /// (responder side).
    Acknowledged(String),
    /// A frame for this session failed authentication. The session is still
    /// active; display with [`AUTH_FAILURE_MARKER`].
    AuthFailure,
    /// Authenticated kill sentinel received; the channel is terminated.
    Killed,
}

/// One session bound to a topic pair on the bus.
///
/// This type does not implement `Clone` to prevent state duplication.
pub struct SecureChannel {
    session: Session,
    bus: Arc<dyn MessageBus>,
    topics: TopicPair,
    inbox: Arc<Mailbox>,
    pump: JoinHandle<()>,
}

impl SecureChannel {
    /// Subscribe to the inbound topic and start the background receive task.
    ///
    /// # Errors
    ///
    /// Returns the bus error if the subscription fails.
    pub async fn open(
        bus: Arc<dyn MessageBus>,
        session: Session,
        topics: TopicPair,
    ) -> Result<Self, TransportError> {
        let mut sub = bus.subscribe(&topics.inbound).await?;
        let inbox = Arc::new(Mailbox::new());

        let pump_inbox = Arc::clone(&inbox);
        let pump = tokio::spawn(async move {
            while let Some(payload) = sub.next().await {
                pump_inbox.post(payload);
            }
        });

        Ok(Self {
            session,
            bus,
            topics,
            inbox,
            pump,
        })
    }

    /// Seal and publish a text message on the outbound topic.
    ///
    /// # Errors
    ///
    /// Returns `SessionClosed` once terminated, or the bus publish error.
    pub async fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        let frame = self.session.seal_message(text)?;
        self.bus
            .publish(&self.topics.outbound, frame.to_wire())
            .await
    }

    /// Publish the authenticated kill sentinel, then terminate locally.
    ///
    /// # Errors
    ///
    /// Returns `SessionClosed` once terminated, or the bus publish error.
    pub async fn send_kill(&mut self) -> Result<(), TransportError> {
        let frame = self.session.seal_message(KILL_SENTINEL)?;
        self.bus
            .publish(&self.topics.outbound, frame.to_wire())
            .await?;
        self.session.terminate();
        Ok(())
    }

    /// Wait for the next event on this channel.
    ///
    /// Malformed frames are logged and dropped; foreign frames are dropped
    /// silently; neither ends the wait. Authentication failures return as
    /// events so the caller can display the failure marker and keep going.
    ///
    /// # Errors
    ///
    /// Returns `SessionClosed` once the session is terminated.
    pub async fn recv(&mut self) -> Result<ChannelEvent, TransportError> {
        loop {
            if self.session.is_terminated() {
                return Err(TransportError::SessionClosed);
            }

            let payload = self.inbox.recv().await;
            match self.session.on_frame(&payload) {
                Ok(ReceiveOutcome::Foreign) => {
                    trace!(len = payload.len(), "foreign frame dropped");
                    continue;
                }
                Ok(ReceiveOutcome::Message(text)) => return Ok(ChannelEvent::Message(text)),
                Ok(ReceiveOutcome::Acknowledge { message, reply }) => {
                    self.bus
                        .publish(&self.topics.outbound, reply.to_wire())
                        .await?;
                    debug!(session = %self.session.id(), "acknowledgement published");
                    return Ok(ChannelEvent::Acknowledged(message));
                }
                Ok(ReceiveOutcome::Killed) => {
                    debug!(session = %self.session.id(), "kill sentinel honored");
                    return Ok(ChannelEvent::Killed);
                }
                Err(ProtocolError::MalformedFrame) => {
                    warn!(len = payload.len(), "malformed frame dropped");
                    continue;
                }
                Err(ProtocolError::AuthenticationFailed) | Err(ProtocolError::InvalidUtf8) => {
                    warn!(session = %self.session.id(), "frame failed authentication");
                    return Ok(ChannelEvent::AuthFailure);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// The underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// True while the session accepts traffic.
    pub fn is_active(&self) -> bool {
        !self.session.is_terminated()
    }

    /// Terminate the session and stop the receive task.
    ///
    /// Idempotent. After closing, `send_text`/`recv` fail with
    /// `SessionClosed`.
    pub fn close(&mut self) {
        self.session.terminate();
        self.pump.abort();
    }
}

impl Drop for SecureChannel {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MemoryBus;
    use crate::config::REQUEST_TOPIC;
    use std::time::Duration;
    use wardwire_core::{Role, SessionId, SessionKey};

    fn session_pair() -> (Session, Session) {
        let id = SessionId::generate();
        let key = SessionKey::generate();
        let copy = SessionKey::from_bytes(*key.as_bytes());
        (
            Session::new(id, key, Role::Initiator),
            Session::new(id, copy, Role::Responder),
        )
    }

    async fn channel_pair(bus: &Arc<MemoryBus>) -> (SecureChannel, SecureChannel) {
        let (client_session, server_session) = session_pair();
        let client = SecureChannel::open(
            Arc::clone(bus) as Arc<dyn MessageBus>,
            client_session,
            TopicPair::client(),
        )
        .await
        .unwrap();
        let server = SecureChannel::open(
            Arc::clone(bus) as Arc<dyn MessageBus>,
            server_session,
            TopicPair::server(),
        )
        .await
        .unwrap();
        (client, server)
    }

    async fn recv(channel: &mut SecureChannel) -> ChannelEvent {
        tokio::time::timeout(Duration::from_secs(2), channel.recv())
            .await
            .expect("recv timed out")
            .expect("recv failed")
    }

    #[tokio::test]
    async fn test_request_ack_roundtrip() {
        let bus = Arc::new(MemoryBus::new());
        let (mut client, mut server) = channel_pair(&bus).await;

        client.send_text("AUTH_REQUEST").await.unwrap();
        match recv(&mut server).await {
            ChannelEvent::Acknowledged(message) => assert_eq!(message, "AUTH_REQUEST"),
            other => panic!("expected acknowledge, got {:?}", other),
        }
        match recv(&mut client).await {
            ChannelEvent::Message(text) => assert_eq!(text, "ACK:AUTH_REQUEST"),
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tampered_frame_is_per_message_failure() {
        let bus = Arc::new(MemoryBus::new());
        let (mut client, mut server) = channel_pair(&bus).await;

        // Hand-tampered frame straight onto the server's inbound topic.
        let mut forger = {
            let id = client.session().id();
            let key = SessionKey::from_bytes(*client.session().key().as_bytes());
            Session::new(id, key, Role::Initiator)
        };
        let mut wire = forger.seal_message("evil").unwrap().to_wire();
        *wire.last_mut().unwrap() ^= 0x01;
        bus.publish(REQUEST_TOPIC, wire).await.unwrap();

        assert!(matches!(recv(&mut server).await, ChannelEvent::AuthFailure));
        assert!(server.is_active());

        // The channel still works afterwards.
        client.send_text("legit").await.unwrap();
        assert!(matches!(
            recv(&mut server).await,
            ChannelEvent::Acknowledged(_)
        ));
    }

    #[tokio::test]
    async fn test_kill_roundtrip() {
        let bus = Arc::new(MemoryBus::new());
        let (mut client, mut server) = channel_pair(&bus).await;

        client.send_kill().await.unwrap();
        assert!(matches!(recv(&mut server).await, ChannelEvent::Killed));
        assert!(!server.is_active());

        assert!(matches!(
            server.recv().await.unwrap_err(),
            TransportError::SessionClosed
        ));
        assert!(matches!(
            client.send_text("after kill").await.unwrap_err(),
            TransportError::SessionClosed
        ));
    }

    #[tokio::test]
    async fn test_cross_session_traffic_on_shared_topics() {
        let bus = Arc::new(MemoryBus::new());
        let (mut client_a, mut server_a) = channel_pair(&bus).await;
        let (mut client_b, mut server_b) = channel_pair(&bus).await;

        // Both sessions share the same two topics. One in-flight exchange at
        // a time per session; each side must answer only its own peer and
        // shrug off the cross-traffic (either dropped as foreign or
        // overwritten in the single-slot mailbox).
        client_a.send_text("from a").await.unwrap();
        match recv(&mut server_a).await {
            ChannelEvent::Acknowledged(m) => assert_eq!(m, "from a"),
            other => panic!("unexpected {:?}", other),
        }
        match recv(&mut client_a).await {
            ChannelEvent::Message(m) => assert_eq!(m, "ACK:from a"),
            other => panic!("unexpected {:?}", other),
        }

        client_b.send_text("from b").await.unwrap();
        match recv(&mut server_b).await {
            ChannelEvent::Acknowledged(m) => assert_eq!(m, "from b"),
            other => panic!("unexpected {:?}", other),
        }
        match recv(&mut client_b).await {
            ChannelEvent::Message(m) => assert_eq!(m, "ACK:from b"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_foreign_frame_dropped_mid_wait() {
        let bus = Arc::new(MemoryBus::new());
        let (mut client, mut server) = channel_pair(&bus).await;

        // A validly-encrypted frame for a different session arrives while
        // the server is waiting; it must be consumed silently, and the
        // genuine request that follows must still come through.
        let mut stranger = Session::new(
            SessionId::generate(),
            SessionKey::generate(),
            Role::Initiator,
        );
        let foreign = stranger.seal_message("not yours").unwrap().to_wire();

        let (event, _) = tokio::join!(recv(&mut server), async {
            bus.publish(REQUEST_TOPIC, foreign).await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            client.send_text("real one").await.unwrap();
        });

        match event {
            ChannelEvent::Acknowledged(m) => assert_eq!(m, "real one"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_frame_skipped() {
        let bus = Arc::new(MemoryBus::new());
        let (mut client, mut server) = channel_pair(&bus).await;

        // 63 bytes: one short of the frame floor. Dropped without surfacing.
        let (event, _) = tokio::join!(recv(&mut server), async {
            bus.publish(REQUEST_TOPIC, vec![0u8; 63]).await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            client.send_text("real one").await.unwrap();
        });

        match event {
            ChannelEvent::Acknowledged(m) => assert_eq!(m, "real one"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let bus = Arc::new(MemoryBus::new());
        let (mut client, _server) = channel_pair(&bus).await;
        client.close();
        client.close();
        assert!(!client.is_active());
    }
}
