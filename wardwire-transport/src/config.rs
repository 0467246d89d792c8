//! Transport configuration.

/// Default topic the server listens on (client requests go here).
pub const REQUEST_TOPIC: &str = "wardwire/server";

/// Default topic the client listens on (server replies go here).
pub const REPLY_TOPIC: &str = "wardwire/client";

/// Outbound/inbound topic binding for one side of an exchange.
///
/// Both sides of a session share the same two topics with the directions
/// flipped; multiple sessions sharing them is expected and handled by the
/// foreign-frame drop rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPair {
    /// Topic this side publishes to.
    pub outbound: String,
    /// Topic this side subscribes to.
    pub inbound: String,
}

impl TopicPair {
    /// Explicit topic binding.
    pub fn new(outbound: impl Into<String>, inbound: impl Into<String>) -> Self {
        Self {
            outbound: outbound.into(),
            inbound: inbound.into(),
        }
    }

    /// Client-side binding over the default topics.
    pub fn client() -> Self {
        Self::new(REQUEST_TOPIC, REPLY_TOPIC)
    }

    /// Server-side binding over the default topics.
    pub fn server() -> Self {
        Self::new(REPLY_TOPIC, REQUEST_TOPIC)
    }

    /// The same topics with directions swapped.
    pub fn flipped(&self) -> Self {
        Self::new(self.inbound.clone(), self.outbound.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_server_are_mirrored() {
        assert_eq!(TopicPair::client().flipped(), TopicPair::server());
        assert_eq!(TopicPair::server().flipped(), TopicPair::client());
    }
}
