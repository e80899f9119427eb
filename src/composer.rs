//! Display composer
//!
//! Routes every watchface event to the component that owns it and pushes the
//! result into the [`Surface`]. Handlers run to completion, one event at a
//! time, in arrival order.

use chrono::NaiveDateTime;

use crate::clock::{ClockEngine, Settings};
use crate::config::{
    ALERT_TEXT, PLACEHOLDER_TIME, PLACEHOLDER_WEATHER, TIMEZONE_SET_TEXT, TIMEZONE_UNSET_TEXT,
};
use crate::message::{Dictionary, DropReason, Outbox, OutboxError};
use crate::meter;
use crate::status::{BatteryMonitor, ConnectionMonitor, Haptics};
use crate::ui::{LayerId, Surface};
use crate::weather::{WeatherIcon, WeatherSession};

/// Everything the watchface reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Minute tick with the current local time
    Tick(NaiveDateTime),
    /// Battery charge in percent
    BatteryChanged(u8),
    ConnectionChanged(bool),
    /// Decoded message from the companion app
    InboxReceived(Dictionary),
    /// The transport dropped an inbound message
    InboxDropped(DropReason),
    /// The companion app acknowledged an outbound message
    OutboxSent,
    OutboxFailed(OutboxError),
}

/// What `dispatch` did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    /// The event was applied (or logged, for transport reports)
    Handled,
    /// The event carried nothing usable and state is unchanged
    Discarded,
    /// The composer was torn down
    Ignored,
}

/// State of the watch read synchronously at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupProbe {
    pub now: NaiveDateTime,
    pub battery_percent: u8,
    pub connected: bool,
    /// Whether the local timezone is known. When it is not, local time is
    /// GMT.
    pub timezone_set: bool,
}

pub struct DisplayComposer<S, O, H> {
    surface: S,
    outbox: O,
    haptics: H,
    clock: ClockEngine,
    battery: BatteryMonitor,
    connection: ConnectionMonitor,
    weather: WeatherSession,
    torn_down: bool,
}

impl<S, O, H> DisplayComposer<S, O, H>
where
    S: Surface,
    O: Outbox,
    H: Haptics,
{
    /// Paint the placeholders and apply the startup probes.
    pub fn start(surface: S, outbox: O, haptics: H, settings: Settings, probe: StartupProbe) -> Self {
        let mut composer = Self {
            surface,
            outbox,
            haptics,
            clock: ClockEngine::new(settings),
            battery: BatteryMonitor::new(),
            connection: ConnectionMonitor::new(),
            weather: WeatherSession::new(),
            torn_down: false,
        };

        composer.surface.set_text(LayerId::Time, PLACEHOLDER_TIME);
        composer.surface.set_text(LayerId::Utc, PLACEHOLDER_TIME);
        composer.surface.set_text(LayerId::Secondary, PLACEHOLDER_TIME);
        composer.surface.set_text(LayerId::Alert, ALERT_TEXT);
        composer
            .surface
            .set_weather(PLACEHOLDER_WEATHER, WeatherIcon::Clear);

        composer.apply_connection(probe.connected);
        composer.apply_battery(probe.battery_percent);
        composer.apply_clock(probe.now);

        let notice = if probe.timezone_set {
            TIMEZONE_SET_TEXT
        } else {
            TIMEZONE_UNSET_TEXT
        };
        composer.surface.set_text(LayerId::TimezoneNotice, notice);

        info!("Watchface started");
        composer
    }

    /// Handle one event to completion.
    pub fn dispatch(&mut self, event: Event) -> Dispatch {
        if self.torn_down {
            return Dispatch::Ignored;
        }

        match event {
            Event::Tick(local_time) => {
                self.apply_clock(local_time);
                self.weather.on_tick(local_time, &mut self.outbox);
                Dispatch::Handled
            }
            Event::BatteryChanged(percent) => {
                self.apply_battery(percent);
                Dispatch::Handled
            }
            Event::ConnectionChanged(connected) => {
                self.apply_connection(connected);
                Dispatch::Handled
            }
            Event::InboxReceived(reply) => match self.weather.on_reply(&reply) {
                Some(update) => {
                    self.surface.set_weather(&update.text, update.icon);
                    Dispatch::Handled
                }
                None => Dispatch::Discarded,
            },
            Event::InboxDropped(reason) => {
                error!("Inbox message dropped: {}", reason);
                Dispatch::Handled
            }
            Event::OutboxSent => {
                info!("Outbox message delivered");
                Dispatch::Handled
            }
            Event::OutboxFailed(reason) => {
                error!("Outbox message failed: {}", reason);
                Dispatch::Handled
            }
        }
    }

    /// Release the surface. Later events are ignored.
    pub fn teardown(&mut self) {
        if !self.torn_down {
            self.surface.release();
            self.torn_down = true;
            debug!("Watchface torn down");
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn clock(&self) -> &ClockEngine {
        &self.clock
    }

    /// Change the display settings and redraw the clock for `local_time`.
    pub fn apply_settings(&mut self, settings: Settings, local_time: NaiveDateTime) {
        if self.torn_down {
            return;
        }
        self.clock.set_settings(settings);
        self.apply_clock(local_time);
    }

    pub fn battery(&self) -> &BatteryMonitor {
        &self.battery
    }

    pub fn connection(&self) -> &ConnectionMonitor {
        &self.connection
    }

    pub fn weather(&self) -> &WeatherSession {
        &self.weather
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access for drawing the surface.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn outbox(&self) -> &O {
        &self.outbox
    }

    pub fn haptics(&self) -> &H {
        &self.haptics
    }

    fn apply_clock(&mut self, local_time: NaiveDateTime) {
        let text = self.clock.recompute(local_time).text();
        self.surface.set_text(LayerId::Time, &text.time);
        self.surface.set_text(LayerId::Utc, &text.utc);
        self.surface.set_text(LayerId::Secondary, &text.secondary);
        self.surface.set_text(LayerId::Weekday, &text.weekday);
        self.surface.set_text(LayerId::DayMonth, &text.day_month);
    }

    fn apply_battery(&mut self, percent: u8) {
        let view = meter::render(self.battery.on_battery_change(percent));
        self.surface.set_battery_bar(view.bar_width);
        self.surface.set_hidden(LayerId::Alert, !view.alert_visible);
    }

    fn apply_connection(&mut self, connected: bool) {
        let (state, alert) = self.connection.on_connection_change(connected);
        self.surface
            .set_hidden(LayerId::Connection, !state.is_connected());
        if let Some(alert) = alert {
            info!("Connection lost");
            self.haptics.alert(alert);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KEY_CONDITIONS, KEY_TEMPERATURE};
    use crate::message::Value;
    use crate::status::Alert;
    use crate::ui::FaceLayers;
    use chrono::NaiveDate;
    use heapless::String;

    #[derive(Default)]
    struct FakeOutbox {
        sent: Vec<Dictionary>,
        fail_with: Option<OutboxError>,
    }

    impl Outbox for FakeOutbox {
        fn send(&mut self, message: &Dictionary) -> Result<(), OutboxError> {
            if let Some(e) = self.fail_with {
                return Err(e);
            }
            self.sent.push(message.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeHaptics {
        alerts: Vec<Alert>,
    }

    impl Haptics for FakeHaptics {
        fn alert(&mut self, alert: Alert) {
            self.alerts.push(alert);
        }
    }

    type Composer = DisplayComposer<FaceLayers, FakeOutbox, FakeHaptics>;

    fn at(h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn probe(now: NaiveDateTime, battery_percent: u8, connected: bool) -> StartupProbe {
        StartupProbe {
            now,
            battery_percent,
            connected,
            timezone_set: true,
        }
    }

    fn start(probe: StartupProbe) -> Composer {
        DisplayComposer::start(
            FaceLayers::new(),
            FakeOutbox::default(),
            FakeHaptics::default(),
            Settings::default(),
            probe,
        )
    }

    fn weather_reply(temperature: i32, conditions: &str) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.insert(KEY_TEMPERATURE, Value::Int32(temperature))
            .unwrap();
        dict.insert(
            KEY_CONDITIONS,
            Value::CString(String::try_from(conditions).unwrap()),
        )
        .unwrap();
        dict
    }

    #[test]
    fn test_startup_paints_probes() {
        let composer = start(probe(at(14, 5), 80, true));
        let layers = composer.surface();

        assert_eq!(layers.text(LayerId::Time), "14:05");
        assert_eq!(layers.text(LayerId::Utc), "GMT 14:05");
        assert_eq!(layers.text(LayerId::Secondary), "EST 10:05 AM");
        assert_eq!(layers.text(LayerId::Weekday), "Tue");
        assert_eq!(layers.text(LayerId::DayMonth), "05 Mar");
        assert_eq!(layers.text(LayerId::Weather), "Loading...");
        assert_eq!(layers.icon(), WeatherIcon::Clear);
        assert_eq!(layers.text(LayerId::TimezoneNotice), "Timezone is set!");
        assert_eq!(layers.bar_width(), 9);
        assert!(layers.is_hidden(LayerId::Alert));
        assert!(!layers.is_hidden(LayerId::Connection));
        assert!(composer.haptics().alerts.is_empty());
    }

    #[test]
    fn test_startup_disconnected_alerts() {
        let mut p = probe(at(8, 0), 20, false);
        p.timezone_set = false;
        let composer = start(p);
        let layers = composer.surface();

        assert!(layers.is_hidden(LayerId::Connection));
        assert!(!layers.is_hidden(LayerId::Alert));
        assert_eq!(layers.text(LayerId::TimezoneNotice), "GMT set to Local time");
        assert_eq!(composer.haptics().alerts, vec![Alert::DoublePulse]);
    }

    #[test]
    fn test_startup_does_not_request_weather() {
        let composer = start(probe(at(10, 0), 50, true));
        assert!(composer.outbox().sent.is_empty());
    }

    #[test]
    fn test_tick_updates_clock_and_requests_weather() {
        let mut composer = start(probe(at(9, 59), 50, true));

        assert_eq!(composer.dispatch(Event::Tick(at(10, 0))), Dispatch::Handled);
        assert_eq!(composer.surface().text(LayerId::Time), "10:00");
        assert_eq!(composer.outbox().sent.len(), 1);

        composer.dispatch(Event::Tick(at(10, 0)));
        composer.dispatch(Event::Tick(at(10, 1)));
        assert_eq!(composer.outbox().sent.len(), 1);
    }

    #[test]
    fn test_failed_request_still_updates_clock() {
        let mut composer = DisplayComposer::start(
            FaceLayers::new(),
            FakeOutbox {
                fail_with: Some(OutboxError::NotConnected),
                ..Default::default()
            },
            FakeHaptics::default(),
            Settings::default(),
            probe(at(9, 59), 50, false),
        );

        assert_eq!(composer.dispatch(Event::Tick(at(10, 0))), Dispatch::Handled);
        assert_eq!(composer.surface().text(LayerId::Time), "10:00");
        assert_eq!(
            composer.weather().throttle().last_request_minute(),
            Some(at(10, 0).and_utc().timestamp() / 60)
        );
    }

    #[test]
    fn test_battery_threshold() {
        let mut composer = start(probe(at(12, 0), 100, true));
        assert_eq!(composer.surface().bar_width(), 12);

        composer.dispatch(Event::BatteryChanged(26));
        assert!(composer.surface().is_hidden(LayerId::Alert));

        composer.dispatch(Event::BatteryChanged(25));
        assert!(!composer.surface().is_hidden(LayerId::Alert));
        assert_eq!(composer.surface().bar_width(), 3);
        assert_eq!(composer.battery().state().charge_percent, 25);
    }

    #[test]
    fn test_connection_loss_alerts_once() {
        let mut composer = start(probe(at(12, 0), 100, true));

        composer.dispatch(Event::ConnectionChanged(false));
        composer.dispatch(Event::ConnectionChanged(false));
        assert_eq!(composer.haptics().alerts, vec![Alert::DoublePulse]);
        assert!(composer.surface().is_hidden(LayerId::Connection));

        composer.dispatch(Event::ConnectionChanged(true));
        assert!(!composer.surface().is_hidden(LayerId::Connection));
        assert_eq!(composer.haptics().alerts.len(), 1);
    }

    #[test]
    fn test_reply_updates_weather_together() {
        let mut composer = start(probe(at(12, 0), 100, true));

        assert_eq!(
            composer.dispatch(Event::InboxReceived(weather_reply(17, "Thunderstorm"))),
            Dispatch::Handled
        );
        assert_eq!(composer.surface().text(LayerId::Weather), "17C, Thunderstorm");
        assert_eq!(composer.surface().icon(), WeatherIcon::Thunderstorm);
    }

    #[test]
    fn test_incomplete_reply_is_discarded() {
        let mut composer = start(probe(at(12, 0), 100, true));
        composer.dispatch(Event::InboxReceived(weather_reply(4, "Rain")));

        let mut partial = Dictionary::new();
        partial.insert(KEY_TEMPERATURE, Value::Int32(30)).unwrap();
        assert_eq!(
            composer.dispatch(Event::InboxReceived(partial)),
            Dispatch::Discarded
        );
        assert_eq!(composer.surface().text(LayerId::Weather), "4C, Rain");
        assert_eq!(composer.surface().icon(), WeatherIcon::Rain);
    }

    #[test]
    fn test_late_replies_last_write_wins() {
        let mut composer = start(probe(at(12, 0), 100, true));
        composer.dispatch(Event::InboxReceived(weather_reply(4, "Rain")));
        composer.dispatch(Event::InboxReceived(weather_reply(9, "Clear")));
        assert_eq!(composer.surface().text(LayerId::Weather), "9C, Clear");
        assert_eq!(composer.surface().icon(), WeatherIcon::Clear);
    }

    #[test]
    fn test_shorter_reply_leaves_no_stale_tail() {
        let mut composer = start(probe(at(12, 0), 100, true));
        composer.dispatch(Event::InboxReceived(weather_reply(-40, "Thunderstorm")));
        assert_eq!(composer.surface().text(LayerId::Weather), "-40C, Thunderstorm");

        composer.dispatch(Event::InboxReceived(weather_reply(5, "Rain")));
        assert_eq!(composer.surface().text(LayerId::Weather), "5C, Rain");
        assert_eq!(composer.surface().icon(), WeatherIcon::Rain);
    }

    #[test]
    fn test_transport_reports_change_nothing() {
        let mut composer = start(probe(at(12, 0), 100, true));
        let before = composer.surface().text(LayerId::Weather).len();

        assert_eq!(
            composer.dispatch(Event::InboxDropped(DropReason::InboxFull)),
            Dispatch::Handled
        );
        assert_eq!(composer.dispatch(Event::OutboxSent), Dispatch::Handled);
        assert_eq!(
            composer.dispatch(Event::OutboxFailed(OutboxError::Nack)),
            Dispatch::Handled
        );
        assert_eq!(composer.surface().text(LayerId::Weather).len(), before);
        assert!(composer.outbox().sent.is_empty());
    }

    #[test]
    fn test_settings_change_redraws_clock() {
        let mut composer = start(probe(at(21, 30), 100, true));
        composer.apply_settings(
            Settings {
                is_24h: false,
                local_offset_secs: 3600,
            },
            at(21, 30),
        );
        assert_eq!(composer.surface().text(LayerId::Time), "09:30");
        assert_eq!(composer.surface().text(LayerId::Utc), "GMT 08:30 PM");
    }

    #[test]
    fn test_teardown_ignores_events() {
        let mut composer = start(probe(at(12, 0), 100, true));
        composer.teardown();
        assert!(composer.surface().is_released());
        assert!(composer.is_torn_down());

        assert_eq!(composer.dispatch(Event::Tick(at(13, 0))), Dispatch::Ignored);
        assert_eq!(
            composer.dispatch(Event::ConnectionChanged(false)),
            Dispatch::Ignored
        );
        assert!(composer.outbox().sent.is_empty());
        assert!(composer.haptics().alerts.is_empty());
        assert_eq!(composer.surface().text(LayerId::Time), "12:00");
    }
}
