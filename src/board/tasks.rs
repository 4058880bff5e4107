//! Embassy tasks and the state they share.
//!
//! Each loop does one bounded unit of work, then yields on a timer:
//!
//! | task    | period           | owns                         |
//! |---------|------------------|------------------------------|
//! | network | relay I/O        | UART, MQTT session           |
//! | control | `CONTROL_TICK_MS`| OLED, Turn Controller        |
//! | ui      | `UI_TICK_MS`     | NeoTrellis, Input/Display FSM|
//! | light   | `LIGHT_SAMPLE_MS`| VEML6030                     |

use defmt::{info, warn};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Delay, Duration, Instant, Timer};

use trellis_duel::bridge::{reconnect_delay_ms, BridgeQueues, NetworkBridge, Topics};
use trellis_duel::config::{
    BOARD_ROLE, CONTROL_TICK_MS, DEFAULT_LED_COLOR, LIGHT_SAMPLE_MS, PING_INTERVAL_SECS, UI_TICK_MS,
};
use trellis_duel::control::ControlMachine;
use trellis_duel::light::{sample_into, SharedColor};
use trellis_duel::relay::{MqttOptions, MqttRelay};
use trellis_duel::ui::{PlayHandoff, UiMachine};
use trellis_duel::Error;

use super::{LightSensor, Screen, Trellis, WifiUart};

pub static QUEUES: BridgeQueues<CriticalSectionRawMutex> = BridgeQueues::new();
pub static HANDOFF: PlayHandoff<CriticalSectionRawMutex> = PlayHandoff::new();
pub static LED_COLOR: SharedColor = SharedColor::new(DEFAULT_LED_COLOR);
pub static RESET: Signal<CriticalSectionRawMutex, ()> = Signal::new();

type Bridge = NetworkBridge<'static, CriticalSectionRawMutex, MqttRelay<WifiUart>>;

#[embassy_executor::task]
pub async fn network_task(uart: WifiUart) -> ! {
    let relay = MqttRelay::new(uart, MqttOptions::from_config());
    let mut bridge = NetworkBridge::new(relay, &QUEUES, Topics::for_role(BOARD_ROLE));
    let mut attempt: u32 = 0;

    loop {
        if attempt > 0 {
            let backoff = reconnect_delay_ms(attempt);
            info!("Network: reconnecting in {} ms (attempt {})", backoff, attempt);
            Timer::after(Duration::from_millis(backoff)).await;
        }

        if let Err(e) = bridge.open_session().await {
            warn!("Network: session failed: {}", e);
            attempt = attempt.saturating_add(1);
            continue;
        }

        let e = serve(&mut bridge).await;
        warn!("Network: session lost: {}", e);
        attempt = 1;
    }
}

/// Route traffic until the session fails. PINGREQ goes out whenever
/// nothing has been sent for `PING_INTERVAL_SECS`.
async fn serve(bridge: &mut Bridge) -> Error {
    let ping_interval = Duration::from_secs(PING_INTERVAL_SECS);
    let mut next_ping = Instant::now() + ping_interval;

    loop {
        let result = match select(bridge.next_event(), Timer::at(next_ping)).await {
            Either::First(Ok(None)) => Ok(()),
            Either::First(Ok(Some(seq))) => {
                next_ping = Instant::now() + ping_interval;
                bridge.publish_outgoing_move(&seq).await
            }
            Either::First(Err(e)) => Err(e),
            Either::Second(()) => {
                next_ping = Instant::now() + ping_interval;
                bridge.keep_alive().await
            }
        };
        if let Err(e) = result {
            return e;
        }
    }
}

#[embassy_executor::task]
pub async fn control_task(screen: Screen) -> ! {
    let mut control = ControlMachine::new(BOARD_ROLE, &QUEUES, &HANDOFF, screen, &QUEUES);

    loop {
        if RESET.try_take().is_some() {
            control.reset();
        }
        control.step();
        Timer::after(Duration::from_millis(CONTROL_TICK_MS)).await;
    }
}

#[embassy_executor::task]
pub async fn ui_task(trellis: Trellis) -> ! {
    let mut ui = UiMachine::new(&HANDOFF, &LED_COLOR, trellis, Delay);

    loop {
        ui.step().await;
        Timer::after(Duration::from_millis(UI_TICK_MS)).await;
    }
}

#[embassy_executor::task]
pub async fn light_task(mut sensor: LightSensor) -> ! {
    loop {
        if let Err(e) = sample_into(&mut sensor, &LED_COLOR) {
            warn!("Light: sample failed: {}", e);
        }
        Timer::after(Duration::from_millis(LIGHT_SAMPLE_MS)).await;
    }
}
