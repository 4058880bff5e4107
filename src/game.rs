//! Game data model shared by every task.
//!
//! Layout of a [`MoveSequence`] on the wire (20 bytes):
//! ```text
//! Byte 0..n-1: key indices (0..15) in the order they were played
//! Byte n..19 : 0xFF sentinel ("no more moves")
//! ```
//! A status record is a single [`TurnSignal`] byte.

use crate::config::{GAME_SIZE, SENTINEL};

/// One player's cumulative key sequence for a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveSequence {
    moves: [u8; GAME_SIZE],
}

impl MoveSequence {
    /// All-sentinel sequence (zero moves played).
    pub const fn empty() -> Self {
        Self {
            moves: [SENTINEL; GAME_SIZE],
        }
    }

    /// Build a sequence from played keys. `None` if it would not fit.
    pub fn from_moves(keys: &[u8]) -> Option<Self> {
        if keys.len() > GAME_SIZE {
            return None;
        }
        let mut seq = Self::empty();
        seq.moves[..keys.len()].copy_from_slice(keys);
        Some(seq)
    }

    /// Parse a relay payload.
    ///
    /// Short payloads are padded with the sentinel; empty or oversize
    /// payloads are rejected.
    pub fn from_wire(data: &[u8]) -> Option<Self> {
        if data.is_empty() {
            return None;
        }
        Self::from_moves(data)
    }

    /// Raw wire representation.
    pub fn as_bytes(&self) -> &[u8; GAME_SIZE] {
        &self.moves
    }

    /// Number of moves before the first sentinel.
    pub fn len(&self) -> usize {
        self.moves
            .iter()
            .position(|&m| m == SENTINEL)
            .unwrap_or(GAME_SIZE)
    }

    pub fn is_empty(&self) -> bool {
        self.moves[0] == SENTINEL
    }

    /// The played moves, without the sentinel tail.
    pub fn moves(&self) -> &[u8] {
        &self.moves[..self.len()]
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.moves.get(index).copied()
    }

    /// Write `key` into `index`. Returns `false` if the slot is out of range.
    pub fn set(&mut self, index: usize, key: u8) -> bool {
        match self.moves.get_mut(index) {
            Some(slot) => {
                *slot = key;
                true
            }
            None => false,
        }
    }

    /// Erase back to all-sentinel.
    pub fn reset(&mut self) {
        self.moves = [SENTINEL; GAME_SIZE];
    }
}

impl Default for MoveSequence {
    fn default() -> Self {
        Self::empty()
    }
}

/// Status codes published on the shared status topic.
///
/// Named from the first mover's point of view; each board interprets
/// them through its [`BoardRole`]. Byte `0` is the relay's "initialise"
/// code and, like every other unlisted value, is not a signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TurnSignal {
    OpponentTurn = 1,
    MyTurn = 2,
    ILost = 3,
    OpponentLost = 4,
}

impl TurnSignal {
    pub fn from_byte(code: u8) -> Option<Self> {
        match code {
            1 => Some(TurnSignal::OpponentTurn),
            2 => Some(TurnSignal::MyTurn),
            3 => Some(TurnSignal::ILost),
            4 => Some(TurnSignal::OpponentLost),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Which side of the pairing this board plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BoardRole {
    /// Player 1.
    First,
    /// Player 2.
    Second,
}

/// What a status signal means for this board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusVerdict {
    /// The other board is playing; keep listening for status.
    KeepWaiting,
    /// Our turn is next; wait for the opponent's sequence.
    AwaitMove,
    Won,
    Lost,
}

impl BoardRole {
    pub fn interpret(self, signal: TurnSignal) -> StatusVerdict {
        match (self, signal) {
            (BoardRole::First, TurnSignal::MyTurn) => StatusVerdict::AwaitMove,
            (BoardRole::First, TurnSignal::OpponentTurn) => StatusVerdict::KeepWaiting,
            (BoardRole::First, TurnSignal::ILost) => StatusVerdict::Lost,
            (BoardRole::First, TurnSignal::OpponentLost) => StatusVerdict::Won,
            (BoardRole::Second, TurnSignal::OpponentTurn) => StatusVerdict::AwaitMove,
            (BoardRole::Second, TurnSignal::MyTurn) => StatusVerdict::KeepWaiting,
            (BoardRole::Second, TurnSignal::ILost) => StatusVerdict::Won,
            (BoardRole::Second, TurnSignal::OpponentLost) => StatusVerdict::Lost,
        }
    }
}

/// RGB colour for one NeoTrellis key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LedColor {
    pub const OFF: LedColor = LedColor::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pack as `0x00RRGGBB`.
    pub const fn pack(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub const fn unpack(raw: u32) -> Self {
        Self {
            r: (raw >> 16) as u8,
            g: (raw >> 8) as u8,
            b: raw as u8,
        }
    }
}
