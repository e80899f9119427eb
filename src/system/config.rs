//! General system configuration

use embassy_nrf::{
    config::{Config, Debug, HfclkSource, LfclkSource},
    interrupt::Priority,
};

pub struct SystemConfig;

impl SystemConfig {
    /// embassy-nrf configuration that leaves room for the SoftDevice
    pub fn new() -> Config {
        // Config is `non_exhaustive`
        let mut config = Config::default();

        config.hfclk_source = HfclkSource::ExternalXtal;
        config.lfclk_source = LfclkSource::ExternalXtal;

        // DC/DC regulator massively reduces runtime current consumption
        config.dcdc.reg1 = true;

        // Priorities 0, 1 and 4 are reserved for the SoftDevice
        config.gpiote_interrupt_priority = Priority::P2;
        config.time_interrupt_priority = Priority::P2;

        config.debug = Debug::Allowed;

        config
    }
}
