//! Network Bridge: relay session, inbound routing, outbound publishing.
//!
//! Inbound deliveries go into two bounded queues read by the Turn
//! Controller. Full queues drop the newest delivery instead of applying
//! backpressure to the network task. Completed local plays travel the
//! other way through a third queue drained by the network task.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use crate::config::{
    MOVE_QUEUE_DEPTH, OUTBOUND_QUEUE_DEPTH, RECONNECT_BASE_MS, RECONNECT_MAX_MS, STATUS_QUEUE_DEPTH, TOPIC_P1_GAME,
    TOPIC_P2_GAME, TOPIC_STATUS,
};
use crate::control::MovePublisher;
use crate::error::Error;
use crate::game::{BoardRole, MoveSequence};
use crate::relay::Relay;

// Queues

/// The three bounded queues between the network task and the Turn Controller.
pub struct BridgeQueues<M: RawMutex> {
    moves_in: Channel<M, MoveSequence, MOVE_QUEUE_DEPTH>,
    status: Channel<M, u8, STATUS_QUEUE_DEPTH>,
    moves_out: Channel<M, MoveSequence, OUTBOUND_QUEUE_DEPTH>,
}

impl<M: RawMutex> BridgeQueues<M> {
    pub const fn new() -> Self {
        Self {
            moves_in: Channel::new(),
            status: Channel::new(),
            moves_out: Channel::new(),
        }
    }

    /// Non-blocking; the code is dropped if the queue is full.
    pub fn enqueue_status(&self, code: u8) -> Result<(), Error> {
        self.status.try_send(code).map_err(|_| Error::QueueFull)
    }

    /// Non-blocking; the sequence is dropped if the queue is full.
    pub fn enqueue_move(&self, seq: MoveSequence) -> Result<(), Error> {
        self.moves_in.try_send(seq).map_err(|_| Error::QueueFull)
    }

    pub fn try_next_status(&self) -> Option<u8> {
        self.status.try_receive().ok()
    }

    pub fn try_next_move(&self) -> Option<MoveSequence> {
        self.moves_in.try_receive().ok()
    }

    /// Wait for a completed local play to publish.
    pub async fn next_outgoing(&self) -> MoveSequence {
        self.moves_out.receive().await
    }
}

impl<M: RawMutex> Default for BridgeQueues<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> MovePublisher for &BridgeQueues<M> {
    fn publish_outgoing_move(&mut self, seq: &MoveSequence) -> Result<(), Error> {
        self.moves_out.try_send(*seq).map_err(|_| Error::QueueFull)
    }
}

// Topics

/// Topic triple for one board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Topics {
    /// Opponent's moves arrive here.
    pub move_in: &'static str,
    /// Our moves are published here.
    pub move_out: &'static str,
    /// Shared turn/result status.
    pub status: &'static str,
}

impl Topics {
    pub const fn for_role(role: BoardRole) -> Self {
        match role {
            BoardRole::First => Self {
                move_in: TOPIC_P1_GAME,
                move_out: TOPIC_P2_GAME,
                status: TOPIC_STATUS,
            },
            BoardRole::Second => Self {
                move_in: TOPIC_P2_GAME,
                move_out: TOPIC_P1_GAME,
                status: TOPIC_STATUS,
            },
        }
    }
}

/// A decoded inbound publish.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Inbound {
    Move(MoveSequence),
    Status(u8),
}

/// Decode a publish by topic.
pub fn decode_inbound(topics: &Topics, topic: &str, payload: &[u8]) -> Result<Inbound, Error> {
    if topic == topics.move_in {
        MoveSequence::from_wire(payload)
            .map(Inbound::Move)
            .ok_or(Error::MalformedPayload)
    } else if topic == topics.status {
        payload
            .first()
            .copied()
            .map(Inbound::Status)
            .ok_or(Error::MalformedPayload)
    } else {
        Err(Error::UnknownTopic)
    }
}

fn route<M: RawMutex>(queues: &BridgeQueues<M>, topics: &Topics, topic: &str, payload: &[u8]) {
    let result = decode_inbound(topics, topic, payload).and_then(|inbound| match inbound {
        Inbound::Move(seq) => {
            debug!("Bridge: move with {} keys", seq.len());
            queues.enqueue_move(seq)
        }
        Inbound::Status(code) => {
            debug!("Bridge: status {}", code);
            queues.enqueue_status(code)
        }
    });
    if let Err(e) = result {
        warn!("Bridge: dropped delivery ({}): {}", e, topic);
    }
}

// Session

/// Owns the relay connection and the network side of the queues.
pub struct NetworkBridge<'a, M: RawMutex, R: Relay> {
    relay: R,
    queues: &'a BridgeQueues<M>,
    topics: Topics,
}

impl<'a, M: RawMutex, R: Relay> NetworkBridge<'a, M, R> {
    pub fn new(relay: R, queues: &'a BridgeQueues<M>, topics: Topics) -> Self {
        Self { relay, queues, topics }
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    pub fn relay(&mut self) -> &mut R {
        &mut self.relay
    }

    /// Connect and subscribe to the inbound move and status topics.
    pub async fn open_session(&mut self) -> Result<(), Error> {
        self.relay.connect().await?;
        self.relay.subscribe(self.topics.move_in).await?;
        self.relay.subscribe(self.topics.status).await?;
        info!("Bridge: session open ({}, {})", self.topics.move_in, self.topics.status);
        Ok(())
    }

    /// Decode and enqueue one publish. Bad or surplus deliveries are
    /// logged and dropped; the session is never failed.
    pub fn deliver(&self, topic: &str, payload: &[u8]) {
        route(self.queues, &self.topics, topic, payload);
    }

    /// Wait for an inbound publish or an outgoing move, whichever comes
    /// first. Inbound publishes are routed here and yield `Ok(None)`.
    ///
    /// A bad frame from the relay is logged and dropped like any other bad
    /// delivery; only a network error ends the session.
    pub async fn next_event(&mut self) -> Result<Option<MoveSequence>, Error> {
        let queues = self.queues;
        match select(self.relay.receive(), queues.next_outgoing()).await {
            Either::First(Ok(msg)) => {
                route(queues, &self.topics, msg.topic, msg.payload);
                Ok(None)
            }
            Either::First(Err(e @ (Error::MalformedPacket | Error::BufferOverflow))) => {
                warn!("Bridge: dropped inbound frame: {}", e);
                Ok(None)
            }
            Either::First(Err(e)) => Err(e),
            Either::Second(seq) => Ok(Some(seq)),
        }
    }

    /// Publish a completed play on the move-out topic. Not retried.
    pub async fn publish_outgoing_move(&mut self, seq: &MoveSequence) -> Result<(), Error> {
        self.relay.publish(self.topics.move_out, seq.as_bytes()).await?;
        info!("Bridge: published {} moves", seq.len());
        Ok(())
    }

    pub async fn keep_alive(&mut self) -> Result<(), Error> {
        self.relay.ping().await
    }
}

/// Delay before reconnect attempt `attempt` (1-based): doubles from
/// `RECONNECT_BASE_MS` up to `RECONNECT_MAX_MS`.
pub fn reconnect_delay_ms(attempt: u32) -> u64 {
    if attempt == 0 {
        return 0;
    }
    let shift = attempt.saturating_sub(1).min(30);
    RECONNECT_BASE_MS.saturating_mul(1 << shift).min(RECONNECT_MAX_MS)
}
