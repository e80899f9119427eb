//! Dual-timezone weather watchface for the PineTime.
//!
//! This library holds the watchface logic: the clock engine, the battery and
//! Bluetooth monitors, the weather session and its host message protocol, and
//! the display composer that routes events between them and a retained layer
//! tree. The firmware binary (`main.rs`) adds the nRF52832 specific parts.
//!
//! # Testing
//!
//! Run tests on the host with:
//! ```bash
//! cargo test --lib
//! ```
//!
//! The firmware is built with:
//! ```bash
//! cargo build --release --features firmware --target thumbv7em-none-eabihf
//! ```

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible in the other modules
#[macro_use]
mod fmt;

pub mod clock;
pub mod composer;
pub mod config;
pub mod message;
pub mod meter;
pub mod status;
pub mod ui;
pub mod weather;

pub use clock::{ClockEngine, ClockSnapshot, ClockText, Settings};
pub use composer::{Dispatch, DisplayComposer, Event, StartupProbe};
pub use message::{Dictionary, Outbox, OutboxError, Value};
pub use meter::MeterView;
pub use status::{Alert, BatteryMonitor, BatteryState, ConnectionMonitor, ConnectionState, Haptics};
pub use ui::{FaceLayers, LayerId, Surface};
pub use weather::{RequestThrottle, WeatherIcon, WeatherSession, WeatherState, WeatherUpdate};
