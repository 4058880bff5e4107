//! Player input / LED subsystem - the Input/Display FSM.
//!
//! The UI task replays the opponent's sequence on the NeoTrellis LEDs,
//! then records the local player's key releases until the sequence is
//! one move longer. It is driven by the Turn Controller through a
//! [`PlayHandoff`].
//!
//! ## Components
//!
//! - **Keypad**: seesaw 4x4 keypad with per-key NeoPixels ([`Keypad`])
//! - **Machine**: the IgnorePresses / ShowMoves / HandleButtons FSM

pub mod input_logic;
pub mod machine;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

use crate::error::Error;
use crate::game::{LedColor, MoveSequence};

pub use input_logic::{KeyAction, KeyEvent};
pub use machine::UiMachine;

/// States of the Input/Display FSM.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UiState {
    /// Inert until ordered to show a sequence.
    IgnorePresses,
    /// Replaying the inbound sequence on the LEDs.
    ShowMoves,
    /// Recording the player's key releases.
    HandleButtons,
}

/// Keypad + per-key LED collaborator.
pub trait Keypad {
    /// Number of events waiting in the keypad FIFO.
    fn poll_count(&mut self) -> Result<u8, Error>;

    /// Read `buf.len()` raw FIFO events (see [`KeyEvent::from_raw`]).
    fn read_events(&mut self, buf: &mut [u8]) -> Result<(), Error>;

    /// Stage a colour for `key`; shown on the next flush.
    fn set_led(&mut self, key: u8, color: LedColor) -> Result<(), Error>;

    /// Latch staged LED colours.
    fn flush_led_update(&mut self) -> Result<(), Error>;
}

/// Single-owner handoff between the Turn Controller and the UI task.
///
/// Sequences move by value: the controller gives up the inbound
/// sequence when it orders a replay, and takes the outbound sequence
/// back once the UI completes it, so neither side ever reads a buffer
/// the other is writing.
pub struct PlayHandoff<M: RawMutex> {
    order: Signal<M, MoveSequence>,
    done: Signal<M, MoveSequence>,
}

impl<M: RawMutex> PlayHandoff<M> {
    pub const fn new() -> Self {
        Self {
            order: Signal::new(),
            done: Signal::new(),
        }
    }

    /// Ask the UI to replay `seq` and collect the answer.
    ///
    /// Always accepted: a pending order is replaced and any finished but
    /// uncollected play is discarded.
    pub fn order_show_moves(&self, seq: MoveSequence) {
        self.done.reset();
        self.order.signal(seq);
    }

    pub fn is_play_done(&self) -> bool {
        self.done.signaled()
    }

    /// Take the completed outbound sequence, if the play is done.
    pub fn get_outbound(&self) -> Option<MoveSequence> {
        self.done.try_take()
    }

    pub(crate) fn has_pending_order(&self) -> bool {
        self.order.signaled()
    }

    pub(crate) fn take_order(&self) -> Option<MoveSequence> {
        self.order.try_take()
    }

    pub(crate) fn complete(&self, outbound: MoveSequence) {
        self.done.signal(outbound);
    }
}

impl<M: RawMutex> Default for PlayHandoff<M> {
    fn default() -> Self {
        Self::new()
    }
}
