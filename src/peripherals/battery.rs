//! Battery status check
//!
//! Implementation based upon https://github.com/dbrgn/pinetime-rtic/blob/master/pinetime-rtic/src/battery.rs
//! and https://wiki.pine64.org/wiki/PineTime.

use embassy_nrf::{gpio::Input, peripherals::P0_12, saadc::Saadc};

pub struct Battery<'a> {
    /// ADC instance for battery voltage measurement
    adc: Saadc<'a, 1>,
    /// High = battery, low = charging
    pin_charge_indication: Input<'a, P0_12>,
}

impl<'a> Battery<'a> {
    pub fn init(adc: Saadc<'a, 1>, charge_pin: Input<'a, P0_12>) -> Self {
        Self {
            adc,
            pin_charge_indication: charge_pin,
        }
    }

    pub fn is_charging(&self) -> bool {
        self.pin_charge_indication.is_low()
    }

    /// Battery charge in percent (0–100)
    pub async fn percent(&mut self) -> u8 {
        percent_from_millivolts(self.millivolts().await)
    }

    async fn millivolts(&mut self) -> u16 {
        let mut buf = [0; 1];
        self.adc.sample(&mut buf).await;
        // Half the battery voltage against a 3.3 V reference at 12 bit
        (buf[0].max(0) as u32 * 2000 / 1241) as u16
    }
}

/// Piecewise linear discharge curve of the PineTime cell
fn percent_from_millivolts(voltage: u16) -> u8 {
    (match voltage {
        0..=3449 => 0,
        3450..=3699 => (voltage - 3450) / 5,
        3700..=4199 => 50 + (voltage - 3700) / 10,
        _ => 100,
    }) as u8
}
