//! UI definitions module
//!
//! The composer writes to a [`Surface`]. [`FaceLayers`] is the retained
//! layer tree implementing it, and [`painter`] draws that tree with
//! embedded-graphics.

use crate::config::layout::{self, Bounds};
use crate::weather::WeatherIcon;

mod layers;
pub mod painter;

pub use layers::{DirtyLayers, FaceLayers};

/// Passive rendering layer the composer pushes state into
pub trait Surface {
    /// Replace the text of a text layer.
    fn set_text(&mut self, layer: LayerId, text: &str);

    /// Show or hide a layer.
    fn set_hidden(&mut self, layer: LayerId, hidden: bool);

    /// Width of the filled part of the battery meter in pixels.
    fn set_battery_bar(&mut self, width: u32);

    /// Replace the weather line and icon in one step.
    fn set_weather(&mut self, text: &str, icon: WeatherIcon);

    /// Release every visual resource. Nothing is drawn afterwards.
    fn release(&mut self);
}

/// Layers of the watchface, in drawing order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayerId {
    Background = 0,
    Connection,
    BatteryMeter,
    Alert,
    Time,
    Weekday,
    DayMonth,
    Utc,
    Secondary,
    TimezoneNotice,
    Weather,
    WeatherIcon,
}

/// Resource category a layer is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resource {
    BackgroundImage,
    ConnectionImage,
    /// Filled rectangle, no resource needed
    Meter,
    TimeFont,
    DateFont,
    AlertFont,
    WeatherImages,
}

impl LayerId {
    pub const COUNT: usize = 12;

    pub const ALL: [LayerId; Self::COUNT] = [
        LayerId::Background,
        LayerId::Connection,
        LayerId::BatteryMeter,
        LayerId::Alert,
        LayerId::Time,
        LayerId::Weekday,
        LayerId::DayMonth,
        LayerId::Utc,
        LayerId::Secondary,
        LayerId::TimezoneNotice,
        LayerId::Weather,
        LayerId::WeatherIcon,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Position and size on the panel
    pub const fn bounds(self) -> Bounds {
        match self {
            LayerId::Background => (0, 0, crate::config::LCD_W as u32, crate::config::LCD_H as u32),
            LayerId::Connection => layout::CONNECTION,
            LayerId::BatteryMeter => layout::BATTERY_METER,
            LayerId::Alert => layout::ALERT,
            LayerId::Time => layout::TIME,
            LayerId::Weekday => layout::WEEKDAY,
            LayerId::DayMonth => layout::DAY_MONTH,
            LayerId::Utc => layout::UTC,
            LayerId::Secondary => layout::SECONDARY,
            LayerId::TimezoneNotice => layout::TIMEZONE_NOTICE,
            LayerId::Weather => layout::WEATHER,
            LayerId::WeatherIcon => layout::WEATHER_ICON,
        }
    }

    pub const fn resource(self) -> Resource {
        match self {
            LayerId::Background => Resource::BackgroundImage,
            LayerId::Connection => Resource::ConnectionImage,
            LayerId::BatteryMeter => Resource::Meter,
            LayerId::Alert | LayerId::TimezoneNotice => Resource::AlertFont,
            LayerId::Time => Resource::TimeFont,
            LayerId::Weekday
            | LayerId::DayMonth
            | LayerId::Utc
            | LayerId::Secondary
            | LayerId::Weather => Resource::DateFont,
            LayerId::WeatherIcon => Resource::WeatherImages,
        }
    }

    /// Whether the layer sits on the status bar
    pub const fn in_status_bar(self) -> bool {
        matches!(
            self,
            LayerId::Connection | LayerId::BatteryMeter | LayerId::Alert
        )
    }
}
