//! Battery meter renderer

use crate::config::{LOW_BATTERY_THRESHOLD, METER_FULL_WIDTH};
use crate::status::BatteryState;

/// What the battery meter shows for a charge value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MeterView {
    /// Width of the filled bar in pixels
    pub bar_width: u32,
    /// Whether the low battery alert is visible
    pub alert_visible: bool,
}

/// Compute the bar width and alert visibility for a battery state.
pub fn render(state: BatteryState) -> MeterView {
    let percent = u32::from(state.charge_percent.min(100));
    MeterView {
        bar_width: percent * METER_FULL_WIDTH / 100,
        alert_visible: state.charge_percent <= LOW_BATTERY_THRESHOLD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn view(percent: u8) -> MeterView {
        render(BatteryState {
            charge_percent: percent,
        })
    }

    #[test]
    fn test_alert_boundary() {
        assert!(view(0).alert_visible);
        assert!(view(25).alert_visible);
        assert!(!view(26).alert_visible);
        assert!(!view(100).alert_visible);
    }

    #[test]
    fn test_bar_width() {
        assert_eq!(view(0).bar_width, 0);
        assert_eq!(view(8).bar_width, 0);
        assert_eq!(view(9).bar_width, 1);
        assert_eq!(view(50).bar_width, 6);
        assert_eq!(view(99).bar_width, 11);
        assert_eq!(view(100).bar_width, METER_FULL_WIDTH);
    }

    proptest! {
        #[test]
        fn prop_bar_width_monotonic(p in 0u8..100) {
            prop_assert!(view(p).bar_width <= view(p + 1).bar_width);
            prop_assert!(view(p + 1).bar_width <= METER_FULL_WIDTH);
        }

        #[test]
        fn prop_alert_matches_threshold(p in 0u8..=100) {
            prop_assert_eq!(view(p).alert_visible, p <= 25);
        }
    }
}
