//! Decoding of NeoTrellis keypad FIFO bytes.
//!
//! Layout (1 byte per event):
//! ```text
//! Bit 7..2: seesaw key number (rows of 8 on the seesaw matrix)
//! Bit 1..0: edge (0 = high, 1 = low, 2 = falling, 3 = rising)
//! ```

const EDGE_MASK: u8 = 0x03;
const EDGE_FALLING: u8 = 0x02;
const EDGE_RISING: u8 = 0x03;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyAction {
    Pressed,
    Released,
}

/// A decoded key transition; `key` is the 0..15 trellis index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    pub key: u8,
    pub action: KeyAction,
}

impl KeyEvent {
    pub const fn new(key: u8, action: KeyAction) -> Self {
        Self { key, action }
    }

    /// Decode a raw FIFO byte. Only a rising edge counts as a press;
    /// every other edge is treated as a release.
    pub fn from_raw(raw: u8) -> Self {
        let action = if raw & EDGE_MASK == EDGE_RISING {
            KeyAction::Pressed
        } else {
            KeyAction::Released
        };
        Self {
            key: seesaw_to_trellis(raw >> 2),
            action,
        }
    }

    /// Encode back into the FIFO byte a seesaw would report.
    pub fn to_raw(self) -> u8 {
        let edge = match self.action {
            KeyAction::Pressed => EDGE_RISING,
            KeyAction::Released => EDGE_FALLING,
        };
        (trellis_to_seesaw(self.key) << 2) | edge
    }
}

/// Seesaw matrix number → trellis key index.
pub fn seesaw_to_trellis(seesaw_key: u8) -> u8 {
    (seesaw_key / 8) * 4 + seesaw_key % 8
}

/// Trellis key index → seesaw matrix number.
///
/// Only meaningful for `key < KEY_COUNT`; larger values wrap instead of
/// overflowing.
pub fn trellis_to_seesaw(key: u8) -> u8 {
    (key / 4).wrapping_mul(8).wrapping_add(key % 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_numbering_maps_rows_of_four() {
        assert_eq!(trellis_to_seesaw(0), 0);
        assert_eq!(trellis_to_seesaw(3), 3);
        assert_eq!(trellis_to_seesaw(4), 8);
        assert_eq!(trellis_to_seesaw(15), 27);
        for key in 0..16 {
            assert_eq!(seesaw_to_trellis(trellis_to_seesaw(key)), key);
        }
    }

    #[test]
    fn rising_edge_is_press() {
        // seesaw key 9 (trellis 5), rising
        let ev = KeyEvent::from_raw((9 << 2) | 0x03);
        assert_eq!(ev, KeyEvent::new(5, KeyAction::Pressed));
    }

    #[test]
    fn falling_edge_is_release() {
        let ev = KeyEvent::from_raw((27 << 2) | 0x02);
        assert_eq!(ev, KeyEvent::new(15, KeyAction::Released));
    }

    #[test]
    fn level_edges_fall_back_to_release() {
        assert_eq!(KeyEvent::from_raw(0x00).action, KeyAction::Released);
        assert_eq!(KeyEvent::from_raw(0x01).action, KeyAction::Released);
    }

    #[test]
    fn out_of_range_keys_encode_without_overflow() {
        for key in 16..=u8::MAX {
            let _ = trellis_to_seesaw(key);
            let _ = KeyEvent::new(key, KeyAction::Pressed).to_raw();
        }
        assert_eq!(trellis_to_seesaw(128), 0);
    }

    #[test]
    fn raw_encoding_matches_seesaw_layout() {
        let ev = KeyEvent::new(12, KeyAction::Released);
        assert_eq!(ev.to_raw(), (24 << 2) | 0x02);
        assert_eq!(KeyEvent::from_raw(ev.to_raw()), ev);
    }
}
