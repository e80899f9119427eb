//! Weather session
//!
//! Asks the companion app for fresh weather once per hour and turns its
//! replies into the weather line and icon.

use core::fmt::{self, Write};

use chrono::{NaiveDateTime, Timelike};
use heapless::String;

use crate::config::{
    CONDITIONS_LEN, KEY_CONDITIONS, KEY_TEMPERATURE, WEATHER_REQUEST_INTERVAL_MIN,
    WEATHER_TEXT_LEN,
};
use crate::message::{self, Dictionary, Outbox, OutboxError, Value};

/// Weather icon categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WeatherIcon {
    #[default]
    Clear,
    Rain,
    Thunderstorm,
    /// Any other conditions
    Clouds,
}

impl WeatherIcon {
    /// Map a conditions name to its icon. Matching is case-sensitive.
    pub fn from_conditions(conditions: &str) -> Self {
        match conditions {
            "Clear" => WeatherIcon::Clear,
            "Rain" => WeatherIcon::Rain,
            "Thunderstorm" => WeatherIcon::Thunderstorm,
            _ => WeatherIcon::Clouds,
        }
    }
}

/// Last weather received from the companion app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherState {
    pub temperature_celsius: i32,
    pub conditions: String<CONDITIONS_LEN>,
    pub icon: WeatherIcon,
}

/// Text and icon to show together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherUpdate {
    /// `<temperature>C, <conditions>`
    pub text: String<WEATHER_TEXT_LEN>,
    pub icon: WeatherIcon,
}

/// Result of the outbound check on a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestOutcome {
    /// Not a request minute, or already requested this minute
    NotDue,
    Sent,
    /// Retried at the next request minute
    Failed(OutboxError),
}

/// Allows one weather request per request minute.
#[derive(Debug, Default)]
pub struct RequestThrottle {
    /// Minutes since the epoch (local time) of the last request
    last_request_minute: Option<i64>,
}

impl RequestThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a request is due at `local_time`. A due minute is claimed, so
    /// further ticks within the same minute are refused.
    pub fn claim(&mut self, local_time: NaiveDateTime) -> bool {
        if local_time.minute() % WEATHER_REQUEST_INTERVAL_MIN != 0 {
            return false;
        }

        let minute = local_time.and_utc().timestamp().div_euclid(60);
        if self.last_request_minute == Some(minute) {
            return false;
        }

        self.last_request_minute = Some(minute);
        true
    }

    pub fn last_request_minute(&self) -> Option<i64> {
        self.last_request_minute
    }
}

/// Weather request throttling and reply handling
#[derive(Debug, Default)]
pub struct WeatherSession {
    throttle: RequestThrottle,
    state: Option<WeatherState>,
}

impl WeatherSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send a weather request if one is due at `local_time`.
    pub fn on_tick<O: Outbox>(&mut self, local_time: NaiveDateTime, outbox: &mut O) -> RequestOutcome {
        if !self.throttle.claim(local_time) {
            return RequestOutcome::NotDue;
        }

        let sent = message::weather_request()
            .map_err(OutboxError::from)
            .and_then(|request| outbox.send(&request));

        match sent {
            Ok(()) => {
                info!("Weather request sent");
                RequestOutcome::Sent
            }
            Err(e) => {
                warn!("Weather request failed: {}", e);
                RequestOutcome::Failed(e)
            }
        }
    }

    /// Apply a reply from the companion app.
    ///
    /// Returns `None` and keeps the previous weather when the temperature or
    /// the conditions are missing.
    pub fn on_reply(&mut self, reply: &Dictionary) -> Option<WeatherUpdate> {
        let temperature = reply.find(KEY_TEMPERATURE).and_then(Value::as_i32);
        let conditions = reply.find(KEY_CONDITIONS).and_then(Value::as_str);

        let (Some(temperature), Some(conditions)) = (temperature, conditions) else {
            debug!("Incomplete weather reply discarded");
            return None;
        };

        let mut stored = String::<CONDITIONS_LEN>::new();
        let _ = Truncating(&mut stored).write_str(conditions);
        let icon = WeatherIcon::from_conditions(&stored);

        let mut text = String::new();
        let _ = write!(Truncating(&mut text), "{}C, {}", temperature, stored);

        self.state = Some(WeatherState {
            temperature_celsius: temperature,
            conditions: stored,
            icon,
        });

        Some(WeatherUpdate { text, icon })
    }

    pub fn state(&self) -> Option<&WeatherState> {
        self.state.as_ref()
    }

    pub fn throttle(&self) -> &RequestThrottle {
        &self.throttle
    }
}

/// Writer that silently drops whatever does not fit.
struct Truncating<'a, const N: usize>(&'a mut String<N>);

impl<const N: usize> Write for Truncating<'_, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    #[derive(Default)]
    struct RecordingOutbox {
        sent: usize,
        fail_with: Option<OutboxError>,
    }

    impl Outbox for RecordingOutbox {
        fn send(&mut self, message: &Dictionary) -> Result<(), OutboxError> {
            assert_eq!(message.find(0), Some(&Value::UInt8(0)));
            match self.fail_with {
                Some(e) => Err(e),
                None => {
                    self.sent += 1;
                    Ok(())
                }
            }
        }
    }

    fn at(h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn reply(temperature: Option<Value>, conditions: Option<&str>) -> Dictionary {
        let mut dict = Dictionary::new();
        if let Some(t) = temperature {
            dict.insert(KEY_TEMPERATURE, t).unwrap();
        }
        if let Some(c) = conditions {
            dict.insert(KEY_CONDITIONS, Value::CString(String::try_from(c).unwrap()))
                .unwrap();
        }
        dict
    }

    #[test]
    fn test_icon_mapping() {
        assert_eq!(WeatherIcon::from_conditions("Clear"), WeatherIcon::Clear);
        assert_eq!(WeatherIcon::from_conditions("Rain"), WeatherIcon::Rain);
        assert_eq!(
            WeatherIcon::from_conditions("Thunderstorm"),
            WeatherIcon::Thunderstorm
        );
        assert_eq!(WeatherIcon::from_conditions("Fog"), WeatherIcon::Clouds);
        assert_eq!(WeatherIcon::from_conditions("rain"), WeatherIcon::Clouds);
        assert_eq!(WeatherIcon::from_conditions(""), WeatherIcon::Clouds);
    }

    #[test]
    fn test_reply_formats_text_and_icon() {
        let mut session = WeatherSession::new();
        let update = session
            .on_reply(&reply(Some(Value::Int32(-3)), Some("Rain")))
            .unwrap();
        assert_eq!(update.text.as_str(), "-3C, Rain");
        assert_eq!(update.icon, WeatherIcon::Rain);

        let state = session.state().unwrap();
        assert_eq!(state.temperature_celsius, -3);
        assert_eq!(state.conditions.as_str(), "Rain");
    }

    #[test]
    fn test_incomplete_reply_keeps_state() {
        let mut session = WeatherSession::new();
        session
            .on_reply(&reply(Some(Value::Int32(21)), Some("Clear")))
            .unwrap();
        let before = session.state().cloned();

        assert_eq!(session.on_reply(&reply(None, Some("Rain"))), None);
        assert_eq!(session.on_reply(&reply(Some(Value::Int32(5)), None)), None);
        assert_eq!(session.on_reply(&reply(None, None)), None);
        assert_eq!(session.state().cloned(), before);
    }

    #[test]
    fn test_wrongly_typed_fields_are_missing() {
        let mut session = WeatherSession::new();
        let mut dict = Dictionary::new();
        dict.insert(KEY_TEMPERATURE, Value::CString(String::try_from("12").unwrap()))
            .unwrap();
        dict.insert(KEY_CONDITIONS, Value::Int32(1)).unwrap();
        assert_eq!(session.on_reply(&dict), None);
        assert!(session.state().is_none());
    }

    #[test]
    fn test_long_conditions_truncated() {
        let mut session = WeatherSession::new();
        let long = "Thunderstorm with heavy rain and hail";
        let update = session
            .on_reply(&reply(Some(Value::Int32(-40)), Some(long)))
            .unwrap();

        let state = session.state().unwrap();
        assert_eq!(state.conditions.len(), CONDITIONS_LEN);
        assert!(long.starts_with(state.conditions.as_str()));
        assert_eq!(update.icon, WeatherIcon::Clouds);
        assert_eq!(update.text.len(), WEATHER_TEXT_LEN);
        assert!(update.text.starts_with("-40C, Thunderstorm"));
    }

    #[test]
    fn test_request_only_on_the_hour() {
        let mut session = WeatherSession::new();
        let mut outbox = RecordingOutbox::default();

        assert_eq!(session.on_tick(at(9, 59), &mut outbox), RequestOutcome::NotDue);
        assert_eq!(session.on_tick(at(10, 0), &mut outbox), RequestOutcome::Sent);
        assert_eq!(session.on_tick(at(10, 1), &mut outbox), RequestOutcome::NotDue);
        assert_eq!(session.on_tick(at(10, 30), &mut outbox), RequestOutcome::NotDue);
        assert_eq!(session.on_tick(at(11, 0), &mut outbox), RequestOutcome::Sent);
        assert_eq!(outbox.sent, 2);
    }

    #[test]
    fn test_repeated_tick_same_minute_sends_once() {
        let mut session = WeatherSession::new();
        let mut outbox = RecordingOutbox::default();

        assert_eq!(session.on_tick(at(10, 0), &mut outbox), RequestOutcome::Sent);
        assert_eq!(session.on_tick(at(10, 0), &mut outbox), RequestOutcome::NotDue);
        assert_eq!(outbox.sent, 1);
    }

    #[test]
    fn test_failed_request_waits_for_next_hour() {
        let mut session = WeatherSession::new();
        let mut outbox = RecordingOutbox {
            fail_with: Some(OutboxError::NotConnected),
            ..Default::default()
        };

        assert_eq!(
            session.on_tick(at(10, 0), &mut outbox),
            RequestOutcome::Failed(OutboxError::NotConnected)
        );
        outbox.fail_with = None;
        assert_eq!(session.on_tick(at(10, 0), &mut outbox), RequestOutcome::NotDue);
        assert_eq!(session.on_tick(at(11, 0), &mut outbox), RequestOutcome::Sent);
    }

    #[test]
    fn test_same_minute_next_day_is_due() {
        let mut throttle = RequestThrottle::new();
        assert!(throttle.claim(at(0, 0)));
        let next_day = at(0, 0) + chrono::Duration::days(1);
        assert!(throttle.claim(next_day));
    }

    proptest! {
        #[test]
        fn prop_requests_only_on_due_minutes(hour in 0u32..24, minute in 0u32..60, repeats in 1usize..4) {
            let mut session = WeatherSession::new();
            let mut outbox = RecordingOutbox::default();
            for _ in 0..repeats {
                session.on_tick(at(hour, minute), &mut outbox);
            }
            let expected = usize::from(minute % WEATHER_REQUEST_INTERVAL_MIN == 0);
            prop_assert_eq!(outbox.sent, expected);
        }
    }
}
