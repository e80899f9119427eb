//! Watchface configuration
//!
//! Compile-time constants shared by the engines, the layer tree and the
//! firmware. Layout values are for the 240x240 ST7789 panel.

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Hours added to UTC (modulo 24) for the secondary timezone.
///
/// 20 hours ahead is the same wall-clock hour as 4 hours behind UTC.
pub const SECONDARY_TZ_SHIFT_HOURS: i64 = 20;

/// Prefix for the UTC clock line
pub const UTC_LABEL: &str = "GMT";

/// Prefix for the secondary timezone clock line
pub const SECONDARY_TZ_LABEL: &str = "EST";

/// Local offset to UTC in seconds, used until the host provides a timezone.
pub const DEFAULT_LOCAL_OFFSET_SECS: i32 = 0;

// ---------------------------------------------------------------------------
// Battery
// ---------------------------------------------------------------------------

/// The low battery alert is shown at or below this charge.
pub const LOW_BATTERY_THRESHOLD: u8 = 25;

/// Width of the battery meter bar at 100% charge in pixels.
pub const METER_FULL_WIDTH: u32 = 12;

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// Minutes between weather requests. A request is due when the minute of
/// the hour is a multiple of this value.
pub const WEATHER_REQUEST_INTERVAL_MIN: u32 = 60;

/// Message key of the outbound weather request
pub const KEY_REQUEST: u32 = 0;

/// Sentinel value carried by the weather request
pub const REQUEST_SENTINEL: u8 = 0;

/// Message key of the temperature in a weather reply
pub const KEY_TEMPERATURE: u32 = 10_000;

/// Message key of the conditions in a weather reply
pub const KEY_CONDITIONS: u32 = 10_001;

/// Capacity of the conditions text, longer strings are cut.
pub const CONDITIONS_LEN: usize = 31;

/// Capacity of the weather line, longer text is cut.
pub const WEATHER_TEXT_LEN: usize = 31;

// ---------------------------------------------------------------------------
// Host messages
// ---------------------------------------------------------------------------

/// Inbox and outbox size in bytes
pub const MAX_MESSAGE_SIZE: usize = 128;

/// Maximum number of tuples in one dictionary
pub const MAX_TUPLES: usize = 4;

/// Maximum value length of a single tuple
pub const MAX_VALUE_LEN: usize = MAX_MESSAGE_SIZE - 1 - 7;

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Capacity of every text layer
pub const TEXT_LEN: usize = 32;

/// Time shown before the first tick
pub const PLACEHOLDER_TIME: &str = "00:00";

/// Weather line shown before the first reply
pub const PLACEHOLDER_WEATHER: &str = "Loading...";

/// Low battery alert text
pub const ALERT_TEXT: &str = "Charge me!";

/// Notice shown when the runtime knows the local timezone
pub const TIMEZONE_SET_TEXT: &str = "Timezone is set!";

/// Notice shown when local time is used as GMT
pub const TIMEZONE_UNSET_TEXT: &str = "GMT set to Local time";

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

pub const LCD_W: u16 = 240;
pub const LCD_H: u16 = 240;

/// Layer bounds as `(x, y, width, height)`
pub mod layout {
    pub type Bounds = (i32, i32, u32, u32);

    pub const STATUS_BAR: Bounds = (0, 0, 240, 20);
    pub const CONNECTION: Bounds = (8, 2, 16, 16);
    pub const BATTERY_METER: Bounds = (186, 5, 12, 8);
    pub const ALERT: Bounds = (64, 2, 110, 16);
    pub const TIME: Bounds = (8, 28, 112, 40);
    pub const WEEKDAY: Bounds = (130, 28, 100, 20);
    pub const DAY_MONTH: Bounds = (130, 50, 100, 20);
    pub const UTC: Bounds = (10, 78, 220, 24);
    pub const SECONDARY: Bounds = (10, 104, 220, 24);
    pub const TIMEZONE_NOTICE: Bounds = (10, 140, 220, 16);
    pub const WEATHER: Bounds = (10, 180, 180, 24);
    pub const WEATHER_ICON: Bounds = (196, 176, 32, 32);
}
