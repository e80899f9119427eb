//! Control the vibration motor

use embassy_nrf::{gpio::Output, peripherals::P0_16};
use embassy_time::Timer;

use pinetime_weatherface::Alert;

/// Pulse length in milliseconds
#[allow(unused)]
#[derive(Clone, Copy)]
pub enum PulseLength {
    Short = 200,
    Long = 400,
}

/// Pause between two pulses in milliseconds
const PULSE_GAP_MS: u64 = 150;

pub struct Vibrator<'a> {
    /// Motor enable pin (inverted)
    pin_enable: Output<'a, P0_16>,
}

impl<'a> Vibrator<'a> {
    /// The motor starts switched off.
    pub fn init(mut pin_enable: Output<'a, P0_16>) -> Self {
        pin_enable.set_high();
        Self { pin_enable }
    }

    /// Pulse the motor `times` times.
    pub async fn pulse(&mut self, length: PulseLength, times: u8) {
        for i in 0..times {
            if i > 0 {
                Timer::after_millis(PULSE_GAP_MS).await;
            }
            self.pin_enable.set_low();
            Timer::after_millis(length as u64).await;
            self.pin_enable.set_high();
        }
    }

    pub async fn play(&mut self, alert: Alert) {
        match alert {
            Alert::DoublePulse => self.pulse(PulseLength::Short, 2).await,
        }
    }
}
