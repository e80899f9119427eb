//! Battery and Bluetooth connection monitors

/// Charge state last reported by the battery service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryState {
    /// Battery charge in percent (0–100)
    pub charge_percent: u8,
}

/// Tracks the battery charge.
#[derive(Debug, Default)]
pub struct BatteryMonitor {
    state: BatteryState,
}

impl BatteryMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new charge value. Values above 100 are clamped.
    pub fn on_battery_change(&mut self, percent: u8) -> BatteryState {
        self.state = BatteryState {
            charge_percent: percent.min(100),
        };
        self.state
    }

    pub fn state(&self) -> BatteryState {
        self.state
    }
}

/// Connection to the companion app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionState {
    /// `None` until the first probe or event
    pub connected: Option<bool>,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        self.connected == Some(true)
    }
}

/// Haptic feedback requested by a monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alert {
    /// Two short vibration pulses
    DoublePulse,
}

/// Vibration motor
pub trait Haptics {
    fn alert(&mut self, alert: Alert);
}

/// Tracks the Bluetooth connection and decides when to alert.
#[derive(Debug, Default)]
pub struct ConnectionMonitor {
    state: ConnectionState,
}

impl ConnectionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a connection change.
    ///
    /// Losing the connection alerts once. An unknown previous state counts as
    /// connected so that a watch booting without a phone alerts too.
    pub fn on_connection_change(&mut self, connected: bool) -> (ConnectionState, Option<Alert>) {
        let previous = self.state.connected;
        self.state = ConnectionState {
            connected: Some(connected),
        };

        let alert = match (previous, connected) {
            (Some(true) | None, false) => Some(Alert::DoublePulse),
            _ => None,
        };

        (self.state, alert)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }
}
