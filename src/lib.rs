//! trellis-duel: two-board memory game over a message relay.
//!
//! Each board replays the opponent's key sequence on a NeoTrellis keypad,
//! records the local player's copy plus one new key, and publishes the
//! result. Everything here is hardware-independent and runs on the host:
//!
//! - `cargo test` exercises the game core with mocks
//! - the firmware binary (`src/main.rs`, `embedded` feature) supplies the
//!   board drivers and Embassy tasks
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main].

#![cfg_attr(not(test), no_std)]

// Must come first: the logging macros are used by every module below.
mod fmt;

// ═══════════════════════════════════════════════════════════════════════════
// Data model and configuration
// ═══════════════════════════════════════════════════════════════════════════

pub mod config;
pub mod error;
pub mod game;

// ═══════════════════════════════════════════════════════════════════════════
// Relay and bridge
// ═══════════════════════════════════════════════════════════════════════════

pub mod bridge;
pub mod relay;

// ═══════════════════════════════════════════════════════════════════════════
// State machines
// ═══════════════════════════════════════════════════════════════════════════

pub mod control;
pub mod light;
pub mod ui;

pub use error::{Error, RelayError};
pub use game::{BoardRole, LedColor, MoveSequence, TurnSignal};
