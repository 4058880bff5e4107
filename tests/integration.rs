//! Integration tests: full game rounds through the public API, with the
//! relay, display, keypad and delay mocked on the host.

use std::collections::VecDeque;

use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embedded_hal_async::delay::DelayNs;

use trellis_duel::bridge::{BridgeQueues, NetworkBridge, Topics};
use trellis_duel::config::{DEFAULT_LED_COLOR, GAME_SIZE, SENTINEL};
use trellis_duel::control::{ControlMachine, ControlState, GameDisplay};
use trellis_duel::light::SharedColor;
use trellis_duel::relay::{Relay, RelayMessage};
use trellis_duel::ui::{KeyAction, KeyEvent, Keypad, PlayHandoff, UiMachine, UiState};
use trellis_duel::{BoardRole, Error, LedColor, MoveSequence, TurnSignal};

// ═══════════════════════════════════════════════════════════════════════════
// Mocks
// ═══════════════════════════════════════════════════════════════════════════

/// Relay that records publishes and never delivers anything itself.
#[derive(Default)]
struct RecordingRelay {
    published: Vec<(String, Vec<u8>)>,
}

impl Relay for RecordingRelay {
    async fn connect(&mut self) -> Result<(), Error> {
        Ok(())
    }

    async fn subscribe(&mut self, _topic: &str) -> Result<(), Error> {
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Error> {
        self.published.push((topic.to_string(), payload.to_vec()));
        Ok(())
    }

    async fn receive(&mut self) -> Result<RelayMessage<'_>, Error> {
        core::future::pending().await
    }

    async fn ping(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

#[derive(Default)]
struct ScreenLog {
    last: Option<&'static str>,
}

impl GameDisplay for ScreenLog {
    fn draw_wait(&mut self) -> Result<(), Error> {
        self.last = Some("wait");
        Ok(())
    }
    fn draw_turn_prompt(&mut self) -> Result<(), Error> {
        self.last = Some("turn");
        Ok(())
    }
    fn draw_winner(&mut self) -> Result<(), Error> {
        self.last = Some("winner");
        Ok(())
    }
    fn draw_loser(&mut self) -> Result<(), Error> {
        self.last = Some("loser");
        Ok(())
    }
}

#[derive(Default)]
struct FakeTrellis {
    fifo: VecDeque<u8>,
}

impl FakeTrellis {
    fn play(&mut self, keys: &[u8]) {
        for &key in keys {
            self.fifo.push_back(KeyEvent::new(key, KeyAction::Pressed).to_raw());
            self.fifo.push_back(KeyEvent::new(key, KeyAction::Released).to_raw());
        }
    }
}

impl Keypad for FakeTrellis {
    fn poll_count(&mut self) -> Result<u8, Error> {
        Ok(self.fifo.len().min(255) as u8)
    }

    fn read_events(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        for slot in buf {
            *slot = self.fifo.pop_front().ok_or(Error::Keypad)?;
        }
        Ok(())
    }

    fn set_led(&mut self, _key: u8, _color: LedColor) -> Result<(), Error> {
        Ok(())
    }

    fn flush_led_update(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

// ═══════════════════════════════════════════════════════════════════════════
// One board, wired the way the firmware wires it
// ═══════════════════════════════════════════════════════════════════════════

struct Shared {
    queues: BridgeQueues<NoopRawMutex>,
    handoff: PlayHandoff<NoopRawMutex>,
    color: SharedColor,
}

impl Shared {
    fn new() -> Self {
        Self {
            queues: BridgeQueues::new(),
            handoff: PlayHandoff::new(),
            color: SharedColor::new(DEFAULT_LED_COLOR),
        }
    }
}

struct Board<'a> {
    bridge: NetworkBridge<'a, NoopRawMutex, RecordingRelay>,
    control: ControlMachine<'a, NoopRawMutex, ScreenLog, &'a BridgeQueues<NoopRawMutex>>,
    ui: UiMachine<'a, NoopRawMutex, FakeTrellis, NoDelay>,
}

impl<'a> Board<'a> {
    fn new(role: BoardRole, shared: &'a Shared) -> Self {
        Self {
            bridge: NetworkBridge::new(RecordingRelay::default(), &shared.queues, Topics::for_role(role)),
            control: ControlMachine::new(role, &shared.queues, &shared.handoff, ScreenLog::default(), &shared.queues),
            ui: UiMachine::new(&shared.handoff, &shared.color, FakeTrellis::default(), NoDelay),
        }
    }

    /// Step both machines a few times, then flush any finished play to the relay.
    fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.control.step();
            block_on(self.ui.step());
        }
    }

    fn pump_outgoing(&mut self) -> Option<(String, Vec<u8>)> {
        let seq = block_on(self.bridge.next_event()).unwrap()?;
        block_on(self.bridge.publish_outgoing_move(&seq)).unwrap();
        self.bridge.relay().published.pop()
    }
}

fn status(signal: TurnSignal) -> [u8; 1] {
    [signal.to_byte()]
}

// ═══════════════════════════════════════════════════════════════════════════
// Scenarios
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn replayed_sequence_plus_one_is_published_byte_identical() {
    let shared = Shared::new();
    let mut board = Board::new(BoardRole::First, &shared);
    let topics = Topics::for_role(BoardRole::First);

    board.bridge.deliver(topics.status, &status(TurnSignal::MyTurn));
    board.bridge.deliver(topics.move_in, &[3, 7, 11]);
    board.run(4);
    assert_eq!(board.control.state(), ControlState::PlayingMove);
    assert_eq!(board.ui.state(), UiState::HandleButtons);
    assert_eq!(board.ui.required_presses(), 4);

    board.ui.keypad().play(&[5, 5, 9, 12]);
    board.run(2);
    assert_eq!(board.control.state(), ControlState::WaitForStatus);

    let (topic, payload) = board.pump_outgoing().expect("a published move");
    assert_eq!(topic, topics.move_out);
    let mut expected = [SENTINEL; GAME_SIZE];
    expected[..4].copy_from_slice(&[5, 5, 9, 12]);
    assert_eq!(payload, expected);
}

#[test]
fn two_boards_play_a_round_and_finish() {
    let shared_one = Shared::new();
    let shared_two = Shared::new();
    let mut one = Board::new(BoardRole::First, &shared_one);
    let mut two = Board::new(BoardRole::Second, &shared_two);

    // Opening: player 1 moves against an empty sequence.
    let signal = status(TurnSignal::MyTurn);
    one.bridge.deliver("trellis-duel/status", &signal);
    two.bridge.deliver("trellis-duel/status", &signal);
    one.bridge.deliver("trellis-duel/p1/game", MoveSequence::empty().as_bytes());
    one.run(3);
    two.run(3);
    assert_eq!(one.ui.required_presses(), 1);
    assert_eq!(two.control.state(), ControlState::WaitForStatus);

    one.ui.keypad().play(&[6]);
    one.run(2);
    let (topic, payload) = one.pump_outgoing().unwrap();
    assert_eq!(topic, "trellis-duel/p2/game");

    // Player 2 copies [6] and adds 1.
    let signal = status(TurnSignal::OpponentTurn);
    one.bridge.deliver("trellis-duel/status", &signal);
    two.bridge.deliver("trellis-duel/status", &signal);
    two.bridge.deliver(&topic, &payload);
    one.run(2);
    two.run(4);
    assert_eq!(one.control.state(), ControlState::WaitForStatus);
    assert_eq!(two.control.state(), ControlState::PlayingMove);
    assert_eq!(two.ui.required_presses(), 2);

    two.ui.keypad().play(&[6, 1]);
    two.run(2);
    let (topic, payload) = two.pump_outgoing().unwrap();
    assert_eq!(topic, "trellis-duel/p1/game");
    assert_eq!(&payload[..3], &[6, 1, SENTINEL]);

    // Player 1 fumbled; the relay declares the result.
    let signal = status(TurnSignal::ILost);
    one.bridge.deliver("trellis-duel/status", &signal);
    two.bridge.deliver("trellis-duel/status", &signal);
    one.run(1);
    two.run(1);
    assert_eq!(one.control.state(), ControlState::EndGame);
    assert_eq!(two.control.state(), ControlState::EndGame);
    assert_eq!(one.control.display().last, Some("loser"));
    assert_eq!(two.control.display().last, Some("winner"));
}

#[test]
fn surplus_move_delivery_is_dropped() {
    let shared = Shared::new();
    let board = Board::new(BoardRole::Second, &shared);
    let topics = Topics::for_role(BoardRole::Second);

    board.bridge.deliver(topics.move_in, &[1]);
    board.bridge.deliver(topics.move_in, &[2]);
    board.bridge.deliver(topics.move_in, &[3]);

    assert_eq!(shared.queues.try_next_move().unwrap().moves(), &[1]);
    assert_eq!(shared.queues.try_next_move().unwrap().moves(), &[2]);
    assert!(shared.queues.try_next_move().is_none());
}

#[test]
fn garbage_status_never_moves_the_controller() {
    let shared = Shared::new();
    let mut board = Board::new(BoardRole::First, &shared);

    for code in [0u8, 5, 0x7F, 0xFF] {
        board.bridge.deliver("trellis-duel/status", &[code]);
        board.run(1);
        assert_eq!(board.control.state(), ControlState::WaitForStatus);
    }
    assert_eq!(board.control.display().last, None);
}

#[test]
fn reset_starts_a_new_game_after_the_end() {
    let shared = Shared::new();
    let mut board = Board::new(BoardRole::First, &shared);

    board.bridge.deliver("trellis-duel/status", &status(TurnSignal::OpponentLost));
    board.run(1);
    assert_eq!(board.control.state(), ControlState::EndGame);
    assert_eq!(board.control.display().last, Some("winner"));

    board.control.reset();
    board.bridge.deliver("trellis-duel/status", &status(TurnSignal::MyTurn));
    board.run(1);
    assert_eq!(board.control.state(), ControlState::WaitForGame);
}
