//! Unified error type for trellis-duel.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (with the `defmt` feature) for on-target logging.

/// Top-level error type used across the game core and the board drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Queues
    /// A bounded queue was full; the newest item was dropped.
    QueueFull,

    // Relay
    /// The relay connection failed.
    Network(RelayError),

    /// An MQTT frame could not be parsed.
    MalformedPacket,

    /// A publish arrived on a topic this board did not subscribe to.
    UnknownTopic,

    /// A publish payload did not match the expected record layout.
    MalformedPayload,

    // Peripherals
    /// Keypad / NeoPixel transaction failed.
    Keypad,

    /// I²C transaction to the display failed.
    Display,

    /// Ambient-light sensor transaction failed.
    LightSensor,

    // Generic
    /// Buffer too small for the requested operation.
    BufferOverflow,
}

/// Relay failures we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RelayError {
    /// The byte transport returned an I/O error.
    Transport,
    /// The transport reached end-of-stream.
    Closed,
    /// CONNACK carried a non-zero return code.
    Refused(u8),
    /// The broker answered with a packet we did not expect.
    UnexpectedPacket,
}

// Convenience conversions

impl From<RelayError> for Error {
    fn from(e: RelayError) -> Self {
        Error::Network(e)
    }
}
