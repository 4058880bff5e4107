//! Turn Controller - the top-level game FSM.
//!
//! Consumes status codes and opponent moves from the bridge queues, hands
//! each move to the UI for replay, and returns the completed play to the
//! network task. One non-blocking unit of work per [`ControlMachine::step`].

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::bridge::BridgeQueues;
use crate::error::Error;
use crate::game::{BoardRole, MoveSequence, StatusVerdict, TurnSignal};
use crate::ui::PlayHandoff;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlState {
    WaitForStatus,
    WaitForGame,
    PlayingMove,
    /// Terminal until [`ControlMachine::reset`].
    EndGame,
}

/// Feedback screens on the OLED.
pub trait GameDisplay {
    fn draw_wait(&mut self) -> Result<(), Error>;
    fn draw_turn_prompt(&mut self) -> Result<(), Error>;
    fn draw_winner(&mut self) -> Result<(), Error>;
    fn draw_loser(&mut self) -> Result<(), Error>;
}

/// Sink for completed local plays.
pub trait MovePublisher {
    fn publish_outgoing_move(&mut self, seq: &MoveSequence) -> Result<(), Error>;
}

pub struct ControlMachine<'a, M: RawMutex, D: GameDisplay, P: MovePublisher> {
    state: ControlState,
    role: BoardRole,
    queues: &'a BridgeQueues<M>,
    handoff: &'a PlayHandoff<M>,
    display: D,
    publisher: P,
}

impl<'a, M: RawMutex, D: GameDisplay, P: MovePublisher> ControlMachine<'a, M, D, P> {
    pub fn new(
        role: BoardRole,
        queues: &'a BridgeQueues<M>,
        handoff: &'a PlayHandoff<M>,
        display: D,
        publisher: P,
    ) -> Self {
        Self {
            state: ControlState::WaitForStatus,
            role,
            queues,
            handoff,
            display,
            publisher,
        }
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn role(&self) -> BoardRole {
        self.role
    }

    pub fn display(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn publisher(&mut self) -> &mut P {
        &mut self.publisher
    }

    /// Run one unit of work and return the resulting state.
    pub fn step(&mut self) -> ControlState {
        let next = match self.state {
            ControlState::WaitForStatus => self.wait_for_status(),
            ControlState::WaitForGame => self.wait_for_game(),
            ControlState::PlayingMove => self.playing_move(),
            ControlState::EndGame => ControlState::EndGame,
        };
        if next != self.state {
            info!("Control: {} -> {}", self.state, next);
            self.state = next;
        }
        next
    }

    /// External reset: leave EndGame (or any state) for a new round.
    pub fn reset(&mut self) {
        info!("Control: reset from {}", self.state);
        self.state = ControlState::WaitForStatus;
    }

    fn wait_for_status(&mut self) -> ControlState {
        let Some(code) = self.queues.try_next_status() else {
            return ControlState::WaitForStatus;
        };
        let Some(signal) = TurnSignal::from_byte(code) else {
            debug!("Control: ignoring status {}", code);
            return ControlState::WaitForStatus;
        };

        match self.role.interpret(signal) {
            StatusVerdict::KeepWaiting => {
                self.show(D::draw_wait);
                ControlState::WaitForStatus
            }
            StatusVerdict::AwaitMove => {
                self.show(D::draw_wait);
                ControlState::WaitForGame
            }
            StatusVerdict::Won => {
                self.show(D::draw_winner);
                ControlState::EndGame
            }
            StatusVerdict::Lost => {
                self.show(D::draw_loser);
                ControlState::EndGame
            }
        }
    }

    fn wait_for_game(&mut self) -> ControlState {
        match self.queues.try_next_move() {
            Some(seq) => {
                debug!("Control: consumed move with {} keys", seq.len());
                self.show(D::draw_turn_prompt);
                self.handoff.order_show_moves(seq);
                ControlState::PlayingMove
            }
            None => ControlState::WaitForGame,
        }
    }

    fn playing_move(&mut self) -> ControlState {
        let Some(outbound) = self.handoff.get_outbound() else {
            return ControlState::PlayingMove;
        };
        if let Err(e) = self.publisher.publish_outgoing_move(&outbound) {
            warn!("Control: could not send move: {}", e);
        }
        ControlState::WaitForStatus
    }

    fn show(&mut self, draw: fn(&mut D) -> Result<(), Error>) {
        if let Err(e) = draw(&mut self.display) {
            warn!("Control: display failed: {}", e);
        }
    }
}
