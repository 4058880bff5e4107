//! Message relay (MQTT broker) access.
//!
//! The bridge talks to the relay through the [`Relay`] trait so the game
//! core can be exercised without a broker. [`client::MqttRelay`] is the
//! MQTT 3.1.1 QoS 0 implementation over any `embedded-io-async` byte pipe.

pub mod client;
pub mod packet;

use crate::error::Error;

pub use client::{MqttOptions, MqttRelay};

/// One inbound publish, borrowed from the relay's receive buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelayMessage<'a> {
    pub topic: &'a str,
    pub payload: &'a [u8],
}

/// Publish/subscribe session with the relay.
#[allow(async_fn_in_trait)]
pub trait Relay {
    /// Open a session (CONNECT / CONNACK).
    async fn connect(&mut self) -> Result<(), Error>;

    async fn subscribe(&mut self, topic: &str) -> Result<(), Error>;

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Error>;

    /// Wait for the next publish on a subscribed topic.
    ///
    /// Must be cancel-safe: dropping the future loses no buffered data.
    async fn receive(&mut self) -> Result<RelayMessage<'_>, Error>;

    /// Keep the session alive.
    async fn ping(&mut self) -> Result<(), Error>;
}
