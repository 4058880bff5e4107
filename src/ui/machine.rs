//! Input/Display state machine.
//!
//! ```text
//!   order ──► ShowMoves ──► HandleButtons ──► IgnorePresses
//!     ▲          │ (new order aborts replay)       │
//!     └──────────┴─────────────────────────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;

use super::input_logic::{KeyAction, KeyEvent};
use super::{Keypad, PlayHandoff, UiState};
use crate::config::{GAME_SIZE, KEYPAD_EVENTS_MAX, KEY_COUNT, SHOW_MOVE_GAP_MS, SHOW_MOVE_MS};
use crate::game::{LedColor, MoveSequence};
use crate::light::SharedColor;

pub struct UiMachine<'a, M: RawMutex, K: Keypad, D: DelayNs> {
    state: UiState,
    handoff: &'a PlayHandoff<M>,
    color: &'a SharedColor,
    keypad: K,
    delay: D,
    inbound: MoveSequence,
    outbound: MoveSequence,
    pressed: usize,
    required: usize,
}

impl<'a, M: RawMutex, K: Keypad, D: DelayNs> UiMachine<'a, M, K, D> {
    pub fn new(handoff: &'a PlayHandoff<M>, color: &'a SharedColor, keypad: K, delay: D) -> Self {
        Self {
            state: UiState::IgnorePresses,
            handoff,
            color,
            keypad,
            delay,
            inbound: MoveSequence::empty(),
            outbound: MoveSequence::empty(),
            pressed: 0,
            required: 0,
        }
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    /// Releases needed to finish the current play (inbound length + 1).
    pub fn required_presses(&self) -> usize {
        self.required
    }

    pub fn press_count(&self) -> usize {
        self.pressed
    }

    pub fn outbound(&self) -> &MoveSequence {
        &self.outbound
    }

    pub fn keypad(&mut self) -> &mut K {
        &mut self.keypad
    }

    /// Run one unit of work and return the resulting state.
    pub async fn step(&mut self) -> UiState {
        if let Some(seq) = self.handoff.take_order() {
            self.begin(seq);
            return self.state;
        }

        match self.state {
            UiState::IgnorePresses => {}
            UiState::ShowMoves => self.show_moves().await,
            UiState::HandleButtons => self.handle_buttons(),
        }
        self.state
    }

    fn begin(&mut self, seq: MoveSequence) {
        debug!("UI: order for {} moves", seq.len());
        self.inbound = seq;
        self.outbound.reset();
        self.pressed = 0;
        self.required = 0;
        self.state = UiState::ShowMoves;
    }

    async fn show_moves(&mut self) {
        self.drain_stale_events();

        let inbound = self.inbound;
        for &key in inbound.moves() {
            if self.handoff.has_pending_order() {
                info!("UI: replay interrupted by a new order");
                return;
            }
            self.light(key, self.color.load());
            self.flush();
            self.delay.delay_ms(SHOW_MOVE_MS).await;
            self.light(key, LedColor::OFF);
            self.flush();
            self.delay.delay_ms(SHOW_MOVE_GAP_MS).await;
        }

        self.required = inbound.len() + 1;
        self.state = UiState::HandleButtons;
        debug!("UI: replay done, waiting for {} presses", self.required);
    }

    fn handle_buttons(&mut self) {
        let target = self.required.min(GAME_SIZE);
        let mut raw = [0u8; KEYPAD_EVENTS_MAX];

        let n = match self.keypad.poll_count() {
            Ok(n) => (n as usize).min(KEYPAD_EVENTS_MAX),
            Err(e) => {
                warn!("UI: keypad poll failed: {}", e);
                return;
            }
        };
        if n == 0 {
            return;
        }
        if let Err(e) = self.keypad.read_events(&mut raw[..n]) {
            warn!("UI: keypad read failed: {}", e);
            return;
        }

        let color = self.color.load();
        for &byte in &raw[..n] {
            let event = KeyEvent::from_raw(byte);
            if event.key >= KEY_COUNT {
                debug!("UI: ignoring key {}", event.key);
                continue;
            }
            match event.action {
                KeyAction::Pressed => self.light(event.key, color),
                KeyAction::Released => {
                    self.light(event.key, LedColor::OFF);
                    if self.pressed < target {
                        self.outbound.set(self.pressed, event.key);
                        self.pressed += 1;
                    }
                }
            }
        }
        self.flush();

        if self.pressed >= target {
            info!("UI: play complete ({} moves)", self.pressed);
            self.handoff.complete(self.outbound);
            self.state = UiState::IgnorePresses;
        }
    }

    fn drain_stale_events(&mut self) {
        let mut scratch = [0u8; KEYPAD_EVENTS_MAX];
        match self.keypad.poll_count() {
            Ok(0) => {}
            Ok(n) => {
                let n = (n as usize).min(KEYPAD_EVENTS_MAX);
                if let Err(e) = self.keypad.read_events(&mut scratch[..n]) {
                    warn!("UI: keypad drain failed: {}", e);
                }
            }
            Err(e) => warn!("UI: keypad poll failed: {}", e),
        }
    }

    fn light(&mut self, key: u8, color: LedColor) {
        if let Err(e) = self.keypad.set_led(key, color) {
            warn!("UI: LED {} update failed: {}", key, e);
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.keypad.flush_led_update() {
            warn!("UI: LED flush failed: {}", e);
        }
    }
}
