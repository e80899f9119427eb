//! Display control module for PineTime

use display_interface_spi::SPIInterface;
use embassy_nrf::{
    gpio::Output,
    peripherals::{P0_14, P0_18, P0_22, P0_23, P0_25, P0_26},
    spim::{self, Spim},
};
use embassy_time::Delay;
use mipidsi::{models::ST7789, Builder, Orientation};

use pinetime_weatherface::{
    config::{LCD_H, LCD_W},
    ui::{painter, FaceLayers},
};

type Lcd<'a, SPI> = mipidsi::Display<
    SPIInterface<Spim<'a, SPI>, Output<'a, P0_18>, Output<'a, P0_25>>,
    ST7789,
    Output<'a, P0_26>,
>;

#[derive(Debug, Clone, Copy, defmt::Format)]
pub enum Error {
    /// The controller did not accept the init sequence
    Init,
    /// Writing pixels failed
    Draw,
    /// Brightness above 7
    OutOfBounds,
}

/// Control the backlight.
///
/// There are three active-low backlight pins, each connected to a FET that
/// toggles backlight power through a resistor.
///
/// - Low: 2.2 kΩ
/// - Mid: 100 Ω
/// - High: 30 Ω
///
/// Through combinations of these pins, 7 brightness levels (+ off) can be
/// configured.
pub struct Backlight<'a> {
    low: Output<'a, P0_14>,
    mid: Output<'a, P0_22>,
    high: Output<'a, P0_23>,
    brightness: u8,
}

impl<'a> Backlight<'a> {
    pub fn init(low: Output<'a, P0_14>, mid: Output<'a, P0_22>, high: Output<'a, P0_23>) -> Self {
        let mut backlight = Self {
            low,
            mid,
            high,
            brightness: 0,
        };
        backlight.off();
        backlight
    }

    /// Set the brightness level between 0 (off) and 7 (max brightness).
    pub fn set(&mut self, brightness: u8) -> Result<(), Error> {
        if brightness > 7 {
            return Err(Error::OutOfBounds);
        }
        defmt::debug!("Setting backlight brightness to {}", brightness);

        set_active_low(&mut self.low, brightness & 0x01 != 0);
        set_active_low(&mut self.mid, brightness & 0x02 != 0);
        set_active_low(&mut self.high, brightness & 0x04 != 0);
        self.brightness = brightness;
        Ok(())
    }

    pub fn off(&mut self) {
        self.low.set_high();
        self.mid.set_high();
        self.high.set_high();
        self.brightness = 0;
    }

    #[allow(unused)]
    pub fn brightness(&self) -> u8 {
        self.brightness
    }
}

fn set_active_low<T: embassy_nrf::gpio::Pin>(pin: &mut Output<'_, T>, on: bool) {
    if on {
        pin.set_low();
    } else {
        pin.set_high();
    }
}

/// ST7789 panel showing the watchface layers
pub struct Display<'a, SPI>
where
    SPI: spim::Instance,
{
    lcd: Lcd<'a, SPI>,
    backlight: Backlight<'a>,
}

impl<'a, SPI> Display<'a, SPI>
where
    SPI: spim::Instance,
{
    /// Configure display settings on boot
    pub fn init(
        spim: Spim<'a, SPI>,
        cs_pin: Output<'a, P0_25>,
        dc_pin: Output<'a, P0_18>,
        rst_pin: Output<'a, P0_26>,
        backlight: Backlight<'a>,
    ) -> Result<Self, Error> {
        let lcd = Builder::st7789(SPIInterface::new(spim, dc_pin, cs_pin))
            .with_display_size(LCD_W, LCD_H)
            .with_orientation(Orientation::Portrait(false))
            .init(&mut Delay, Some(rst_pin))
            .map_err(|_| Error::Init)?;

        Ok(Self { lcd, backlight })
    }

    /// Draw the layers changed since the last call.
    pub fn draw(&mut self, layers: &mut FaceLayers) -> Result<(), Error> {
        painter::paint(layers, &mut self.lcd).map_err(|_| Error::Draw)
    }

    pub fn backlight(&mut self) -> &mut Backlight<'a> {
        &mut self.backlight
    }
}
