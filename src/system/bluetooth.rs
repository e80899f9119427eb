//! Bluetooth module
//!
//! GATT services for the companion app: the weather message inbox and outbox,
//! Current Time for setting the clock, and the battery level.

use core::mem;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::{blocking_mutex::raw::ThreadModeRawMutex, channel::Channel};
use heapless::Vec;
use nrf_softdevice::{
    self,
    ble::advertisement_builder::{
        Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList, ServiceUuid16,
    },
    raw, Config,
};

use pinetime_weatherface::{
    config::MAX_MESSAGE_SIZE,
    message::{Dictionary, Outbox, OutboxError},
};

/// Encoded message as carried by the inbox and outbox characteristics
pub type Frame = Vec<u8, MAX_MESSAGE_SIZE>;

pub static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .services_16(ServiceList::Incomplete, &[ServiceUuid16::BATTERY])
    .full_name("PineTime")
    .build();

pub static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .services_16(ServiceList::Incomplete, &[ServiceUuid16::BATTERY])
    .build();

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub bas: BatteryService,
    pub cts: CurrentTimeService,
    pub weather: WeatherService,
}

#[nrf_softdevice::gatt_service(uuid = "180f")]
pub struct BatteryService {
    #[characteristic(uuid = "2a19", read, notify)]
    pub battery_level: u8,
}

#[nrf_softdevice::gatt_service(uuid = "1805")]
pub struct CurrentTimeService {
    #[characteristic(uuid = "2a2b", read, write)]
    pub current_time: [u8; 10],
}

#[nrf_softdevice::gatt_service(uuid = "8f1b0000-6d3a-4b2e-9c61-2f5a3e7b1c40")]
pub struct WeatherService {
    /// Messages from the companion app
    #[characteristic(uuid = "8f1b0001-6d3a-4b2e-9c61-2f5a3e7b1c40", write)]
    pub inbox: Frame,
    /// Messages to the companion app
    #[characteristic(uuid = "8f1b0002-6d3a-4b2e-9c61-2f5a3e7b1c40", read, notify)]
    pub outbox: Frame,
}

/// Whether a central is connected
pub static CONNECTED: AtomicBool = AtomicBool::new(false);

/// Encoded messages waiting to be notified on the outbox characteristic
pub static OUTBOX: Channel<ThreadModeRawMutex, Frame, 2> = Channel::new();

/// Outbox handed to the composer
pub struct BleOutbox;

impl Outbox for BleOutbox {
    fn send(&mut self, message: &Dictionary) -> Result<(), OutboxError> {
        if !CONNECTED.load(Ordering::Relaxed) {
            return Err(OutboxError::NotConnected);
        }

        let frame = message.encode_to_vec()?;
        OUTBOX.try_send(frame).map_err(|_| OutboxError::Busy)
    }
}

pub fn generate_config() -> Config {
    Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 256 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: b"PineTime" as *const u8 as _,
            current_len: 8,
            max_len: 8,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}
