//! Round-reset button with async debouncing.
//!
//! Active-low with internal pull-up. A debounced press signals the
//! control task, which takes the Turn Controller back to WaitForStatus.

use defmt::info;
use embassy_nrf::gpio::{AnyPin, Input, Pull};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use trellis_duel::config::RESET_DEBOUNCE_MS;

/// Waits for the pin to go low, debounces, signals, then waits for
/// release before repeating.
#[embassy_executor::task]
pub async fn reset_button_task(pin: AnyPin, reset: &'static Signal<CriticalSectionRawMutex, ()>) -> ! {
    let mut btn = Input::new(pin, Pull::Up);

    loop {
        btn.wait_for_falling_edge().await;
        Timer::after(Duration::from_millis(RESET_DEBOUNCE_MS)).await;

        if btn.is_low() {
            info!("Reset button pressed");
            reset.signal(());

            btn.wait_for_rising_edge().await;
            Timer::after(Duration::from_millis(RESET_DEBOUNCE_MS)).await;
        }
    }
}
