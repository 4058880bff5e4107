//! Application-wide constants and compile-time configuration.
//!
//! Game geometry, task pacing, relay/session parameters and hardware
//! addresses live here so they can be tuned in one place.

use crate::game::{BoardRole, LedColor};

// Game

/// Number of move slots in a sequence packet.
pub const GAME_SIZE: usize = 20;

/// Slot value marking "no more moves".
pub const SENTINEL: u8 = 0xFF;

/// Keys on the NeoTrellis 4x4 pad.
pub const KEY_COUNT: u8 = 16;

/// Role of this board, chosen at build time with the `player-one` feature.
#[cfg(feature = "player-one")]
pub const BOARD_ROLE: BoardRole = BoardRole::First;
#[cfg(not(feature = "player-one"))]
pub const BOARD_ROLE: BoardRole = BoardRole::Second;

// Queues

/// Inbound move deliveries buffered for the Turn Controller.
pub const MOVE_QUEUE_DEPTH: usize = 2;

/// Inbound status bytes buffered for the Turn Controller.
pub const STATUS_QUEUE_DEPTH: usize = 5;

/// Completed local plays waiting for the network task.
pub const OUTBOUND_QUEUE_DEPTH: usize = 2;

// Task pacing (ms)

pub const CONTROL_TICK_MS: u64 = 5;
pub const UI_TICK_MS: u64 = 50;
pub const LIGHT_SAMPLE_MS: u64 = 4000;

/// How long each replayed key stays lit.
pub const SHOW_MOVE_MS: u32 = 2000;

/// Dark gap between replayed keys so repeats stay distinguishable.
pub const SHOW_MOVE_GAP_MS: u32 = 250;

/// Maximum keypad FIFO events consumed per read.
pub const KEYPAD_EVENTS_MAX: usize = 16;

/// LED colour used until the light task produces its first sample.
pub const DEFAULT_LED_COLOR: LedColor = LedColor::new(0, 100, 50);

// Relay / MQTT

pub const TOPIC_P1_GAME: &str = "trellis-duel/p1/game";
pub const TOPIC_P2_GAME: &str = "trellis-duel/p2/game";
pub const TOPIC_STATUS: &str = "trellis-duel/status";

#[cfg(feature = "player-one")]
pub const MQTT_CLIENT_ID: &str = "trellis-duel-p1";
#[cfg(not(feature = "player-one"))]
pub const MQTT_CLIENT_ID: &str = "trellis-duel-p2";

/// Broker credentials; `None` for anonymous brokers.
pub const MQTT_USERNAME: Option<&str> = None;
pub const MQTT_PASSWORD: Option<&str> = None;

/// Keep-alive advertised in CONNECT (seconds).
pub const MQTT_KEEP_ALIVE_SECS: u16 = 60;

/// PINGREQ cadence; must stay below the keep-alive.
pub const PING_INTERVAL_SECS: u64 = 30;

/// Receive buffer for inbound MQTT frames.
pub const MQTT_RX_BUFFER: usize = 256;

/// Transmit buffer for outbound MQTT frames.
pub const MQTT_TX_BUFFER: usize = 128;

/// Reconnect backoff: first delay and ceiling (ms).
pub const RECONNECT_BASE_MS: u64 = 500;
pub const RECONNECT_MAX_MS: u64 = 30_000;

// Hardware
//
//   I²C SDA (TWIM0)   → P0.26
//   I²C SCL (TWIM0)   → P0.27
//   Wi-Fi bridge TX   → P0.06  (nRF RXD)
//   Wi-Fi bridge RX   → P0.08  (nRF TXD)
//   Reset button      → P0.11  (active-low)

/// Seesaw (NeoTrellis) I²C address.
pub const SEESAW_ADDRESS: u8 = 0x2E;

/// MicroOLED I²C address (SA0 high).
pub const OLED_ADDRESS: u8 = 0x3D;

/// VEML6030 I²C address (ADDR pin high).
pub const VEML6030_ADDRESS: u8 = 0x48;

/// Settle time between a seesaw register select and its read (µs).
pub const SEESAW_READ_DELAY_US: u32 = 500;

/// Debounce for the round-reset button (ms).
pub const RESET_DEBOUNCE_MS: u64 = 50;
