//! Clock engine
//!
//! Turns the local wall-clock time of a tick into the primary clock, a GMT
//! clock, a clock for the secondary timezone and the date lines.

use core::fmt::Write;

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike, Weekday};
use heapless::String;

use crate::config::{
    DEFAULT_LOCAL_OFFSET_SECS, SECONDARY_TZ_LABEL, SECONDARY_TZ_SHIFT_HOURS, TEXT_LEN, UTC_LABEL,
};

/// Text of a single display field
pub type Text = String<TEXT_LEN>;

/// Largest offset to UTC accepted in seconds (just under a day)
const MAX_OFFSET_SECS: i32 = 86_399;

/// Runtime display settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    /// Show the primary and GMT clocks in 24 hour style
    pub is_24h: bool,
    /// Seconds the local time is ahead of UTC
    pub local_offset_secs: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            is_24h: true,
            local_offset_secs: DEFAULT_LOCAL_OFFSET_SECS,
        }
    }
}

/// All clock values derived from one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSnapshot {
    pub local_time: NaiveDateTime,
    pub utc_time: NaiveDateTime,
    /// Wall-clock time of the secondary timezone, without a date
    pub secondary_tz_time: NaiveTime,
    pub is_24h: bool,
}

/// Display text for every clock field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockText {
    /// `HH:MM` or `hh:MM`
    pub time: Text,
    /// `GMT HH:MM` or `GMT hh:MM PM`
    pub utc: Text,
    /// `EST hh:MM PM`, always 12 hour style
    pub secondary: Text,
    /// `Mon`
    pub weekday: Text,
    /// `05 Mar`
    pub day_month: Text,
}

pub struct ClockEngine {
    settings: Settings,
}

impl ClockEngine {
    pub fn new(settings: Settings) -> Self {
        let mut engine = Self {
            settings: Settings::default(),
        };
        engine.set_settings(settings);
        engine
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Replace the settings. Offsets beyond a day are clamped.
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = Settings {
            is_24h: settings.is_24h,
            local_offset_secs: settings
                .local_offset_secs
                .clamp(-MAX_OFFSET_SECS, MAX_OFFSET_SECS),
        };
    }

    /// Derive every clock value from the local time of a tick.
    pub fn recompute(&self, local_time: NaiveDateTime) -> ClockSnapshot {
        let utc_time = local_time
            .checked_sub_signed(Duration::seconds(self.settings.local_offset_secs as i64))
            .unwrap_or(local_time);

        // NaiveTime arithmetic wraps at midnight
        let secondary_tz_time = utc_time.time() + Duration::hours(SECONDARY_TZ_SHIFT_HOURS);

        ClockSnapshot {
            local_time,
            utc_time,
            secondary_tz_time,
            is_24h: self.settings.is_24h,
        }
    }
}

impl ClockSnapshot {
    /// Format all clock fields into fresh strings.
    pub fn text(&self) -> ClockText {
        let mut time = Text::new();
        write_clock(&mut time, None, &self.local_time, self.is_24h, false);

        let mut utc = Text::new();
        write_clock(&mut utc, Some(UTC_LABEL), &self.utc_time, self.is_24h, true);

        let mut secondary = Text::new();
        write_clock(
            &mut secondary,
            Some(SECONDARY_TZ_LABEL),
            &self.secondary_tz_time,
            false,
            true,
        );

        let mut weekday = Text::new();
        let _ = weekday.push_str(weekday_abbrev(self.local_time.weekday()));

        let mut day_month = Text::new();
        let _ = write!(
            day_month,
            "{:02} {}",
            self.local_time.day(),
            month_abbrev(self.local_time.month0())
        );

        ClockText {
            time,
            utc,
            secondary,
            weekday,
            day_month,
        }
    }
}

/// Write `[label ]HH:MM` or `[label ]hh:MM[ AM|PM]` into `out`.
fn write_clock<T: Timelike>(
    out: &mut Text,
    label: Option<&str>,
    time: &T,
    is_24h: bool,
    with_suffix: bool,
) {
    out.clear();
    if let Some(label) = label {
        let _ = write!(out, "{} ", label);
    }

    if is_24h {
        let _ = write!(out, "{:02}:{:02}", time.hour(), time.minute());
    } else {
        let (is_pm, hour) = time.hour12();
        let _ = write!(out, "{:02}:{:02}", hour, time.minute());
        if with_suffix {
            let _ = out.push_str(if is_pm { " PM" } else { " AM" });
        }
    }
}

fn weekday_abbrev(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

fn month_abbrev(month0: u32) -> &'static str {
    match month0 {
        0 => "Jan",
        1 => "Feb",
        2 => "Mar",
        3 => "Apr",
        4 => "May",
        5 => "Jun",
        6 => "Jul",
        7 => "Aug",
        8 => "Sep",
        9 => "Oct",
        10 => "Nov",
        _ => "Dec",
    }
}
