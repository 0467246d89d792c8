//! WardWire responder service.
//!
//! Subscribes to the request topic, binds responder sessions on demand from
//! the key store, and answers each authenticated request with an `ACK:`
//! reply on the reply topic. One malformed or tampered frame never takes the
//! service down: framing and cryptographic failures are logged and recovered
//! per message. The only per-session teardown path is an authenticated
//! `KILL_SERVER` plaintext; frames for a killed session are discarded.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use wardwire_core::session::ReceiveOutcome;
use wardwire_core::{Frame, KeyStoreError, ProtocolError, Session, SessionId, SessionManager};
use wardwire_transport::{MessageBus, TopicPair, TransportError};

/// Run the responder service until the bus closes the subscription.
///
/// Sessions are bound lazily: the first frame carrying a known session id
/// pulls the key from the store and registers a responder session. Unknown
/// ids, malformed frames, and authentication failures are logged and
/// dropped without affecting other sessions.
pub async fn run_server(
    bus: Arc<dyn MessageBus>,
    manager: SessionManager,
    topics: TopicPair,
) -> Result<(), TransportError> {
    let mut sub = bus.subscribe(&topics.inbound).await?;
    let mut sessions: HashMap<SessionId, Session> = HashMap::new();

    info!(topic = %topics.inbound, "service listening");

    while let Some(payload) = sub.next().await {
        handle_payload(&bus, &manager, &mut sessions, &topics, &payload).await;
    }

    info!("bus subscription closed; service stopped");
    Ok(())
}

async fn handle_payload(
    bus: &Arc<dyn MessageBus>,
    manager: &SessionManager,
    sessions: &mut HashMap<SessionId, Session>,
    topics: &TopicPair,
    payload: &[u8],
) {
    debug!(len = payload.len(), payload = %hex::encode(payload), "frame received");

    let frame = match Frame::parse(payload) {
        Ok(frame) => frame,
        Err(_) => {
            warn!(len = payload.len(), "malformed frame dropped");
            return;
        }
    };

    // The id field of a foreign frame can be arbitrary bytes.
    let Some(id) = SessionId::from_wire(frame.session_id()) else {
        debug!("frame with unparseable session id dropped");
        return;
    };

    let session = match sessions.entry(id) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(slot) => match manager.lookup(&id) {
            Ok(session) => {
                info!(session = %id, "responder session bound");
                slot.insert(session)
            }
            Err(KeyStoreError::NotFound) => {
                warn!(session = %id, "no key record; frame dropped");
                return;
            }
            Err(e) => {
                warn!(session = %id, error = %e, "key store failure; frame dropped");
                return;
            }
        },
    };

    if session.is_terminated() {
        debug!(session = %id, "frame for killed session discarded");
        return;
    }

    match session.receive(frame) {
        Ok(ReceiveOutcome::Acknowledge { message, reply }) => {
            match bus.publish(&topics.outbound, reply.to_wire()).await {
                Ok(()) => info!(session = %id, request = %message, "acknowledgement sent"),
                Err(e) => warn!(session = %id, error = %e, "acknowledgement publish failed"),
            }
        }
        Ok(ReceiveOutcome::Killed) => {
            info!(session = %id, "authenticated kill honored; session terminated");
        }
        // A responder session never yields these for a frame that matched
        // its own id.
        Ok(ReceiveOutcome::Foreign) | Ok(ReceiveOutcome::Message(_)) => {}
        Err(ProtocolError::AuthenticationFailed) => {
            warn!(session = %id, "frame failed authentication; session stays active");
        }
        Err(ProtocolError::InvalidUtf8) => {
            warn!(session = %id, "authenticated frame held non-utf8 plaintext; dropped");
        }
        Err(e) => {
            warn!(session = %id, error = %e, "frame dropped");
        }
    }
}
