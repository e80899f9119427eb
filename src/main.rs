#![no_std]
#![no_main]

mod peripherals;
mod system;

use core::sync::atomic::{AtomicBool, Ordering};

// Panic handler and debugging
use defmt::{info, unwrap, warn};
use defmt_rtt as _;
use panic_probe as _;

// Device
use embassy_executor::Spawner;
use embassy_futures::select::select;
use embassy_nrf::{
    bind_interrupts,
    gpio::{Input, Level, Output, OutputDrive, Pull},
    interrupt::{self, InterruptExt, Priority},
    peripherals::SPI2,
    saadc::{self, ChannelConfig, Resolution, Saadc},
    spim,
};
use embassy_sync::{blocking_mutex::raw::ThreadModeRawMutex, channel::Channel, signal::Signal};
use embassy_time::{Duration, Ticker, Timer};
use nrf_softdevice::{
    ble::{gatt_server, peripheral, Connection},
    Softdevice,
};
use static_cell::StaticCell;

bind_interrupts!(struct Irqs {
    SAADC => saadc::InterruptHandler;
    SPIM2_SPIS2_SPI2 => spim::InterruptHandler<SPI2>;
});

// Crate
use peripherals::{
    battery::Battery,
    display::{Backlight, Display},
    vibrator::Vibrator,
};
use pinetime_weatherface::{
    message::{Dictionary, DropReason, OutboxError},
    Alert, DisplayComposer, Event, FaceLayers, Haptics, Settings, StartupProbe,
};
use system::{
    bluetooth::{
        self, BatteryServiceEvent, BleOutbox, CurrentTimeServiceEvent, Server, ServerEvent,
        WeatherServiceEvent, ADV_DATA, CONNECTED, OUTBOX, SCAN_DATA,
    },
    config::SystemConfig,
    time::{TimeManager, TimeReference},
};

// Current UTC epoch at compile time
include!(concat!(env!("OUT_DIR"), "/build_epoch.rs"));

/// Offset of local time to UTC, `None` when the timezone is unknown
const TIMEZONE: Option<i32> = Some(1 * 3_600);

/// Brightness level (0–7) while the watchface is shown
const BRIGHTNESS: u8 = 3;

/// Events for the watchface, consumed by the display task only
static EVENTS: Channel<ThreadModeRawMutex, Event, 4> = Channel::new();
/// An inbox message was dropped because `EVENTS` was full
static INBOX_DROPPED: AtomicBool = AtomicBool::new(false);
static NOTIFY: Signal<ThreadModeRawMutex, Alert> = Signal::new();
static TIME_SYNC: Signal<ThreadModeRawMutex, TimeReference> = Signal::new();

/// Haptic alerts are played by the `notify` task.
struct MotorHaptics;

impl Haptics for MotorHaptics {
    fn alert(&mut self, alert: Alert) {
        NOTIFY.signal(alert);
    }
}

type Composer = DisplayComposer<FaceLayers, BleOutbox, MotorHaptics>;

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

/// Play haptic alerts
#[embassy_executor::task(pool_size = 1)]
async fn notify(mut vibrator: Vibrator<'static>) {
    loop {
        let alert = NOTIFY.wait().await;
        vibrator.play(alert).await;
    }
}

/// Poll the battery charge every minute.
#[embassy_executor::task(pool_size = 1)]
async fn update_battery_status(mut battery: Battery<'static>, server: &'static Server, mut last: u8) {
    loop {
        Timer::after(Duration::from_secs(60)).await;

        let percent = battery.percent().await;
        if percent != last {
            info!(
                "Battery status: {}% ({})",
                percent,
                if battery.is_charging() {
                    "charging"
                } else {
                    "discharging"
                }
            );
            last = percent;
            if server.bas.battery_level_set(&percent).is_err() {
                warn!("Battery level not updated");
            }
            EVENTS.send(Event::BatteryChanged(percent)).await;
        }
    }
}

/// Emit a tick whenever the local minute changes.
#[embassy_executor::task(pool_size = 1)]
async fn update_time(mut clock: TimeManager, offset_secs: i32) {
    let mut tick = Ticker::every(Duration::from_secs(1));
    let mut last_minute = None;
    loop {
        if let Some(reference) = TIME_SYNC.try_take() {
            clock.set_time(reference);
            info!("Clock set by companion app");
        }

        let now = clock.local_now(offset_secs);
        let minute = now.and_utc().timestamp().div_euclid(60);
        if last_minute != Some(minute) {
            last_minute = Some(minute);
            EVENTS.send(Event::Tick(now)).await;
        }

        tick.next().await;
    }
}

/// Own the watchface and redraw after every event.
#[embassy_executor::task(pool_size = 1)]
async fn update_lcd(mut composer: Composer, mut display: Display<'static, SPI2>) {
    loop {
        if let Err(e) = display.draw(composer.surface_mut()) {
            warn!("Drawing failed: {}", e);
        }

        let event = EVENTS.receive().await;
        composer.dispatch(event);

        if INBOX_DROPPED.swap(false, Ordering::Relaxed) {
            composer.dispatch(Event::InboxDropped(DropReason::InboxFull));
        }
    }
}

/// Advertise, serve the GATT services and forward outbox messages.
#[embassy_executor::task(pool_size = 1)]
async fn bluetooth_task(sd: &'static Softdevice, server: &'static Server) {
    loop {
        let config = peripheral::Config::default();
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };
        let conn = match peripheral::advertise_connectable(sd, adv, &config).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Advertising failed: {}", e);
                Timer::after(Duration::from_secs(1)).await;
                continue;
            }
        };

        info!("Companion app connected");
        CONNECTED.store(true, Ordering::Relaxed);
        EVENTS.send(Event::ConnectionChanged(true)).await;

        let serve = gatt_server::run(&conn, server, on_gatt_event);
        select(serve, forward_outbox(&conn, server)).await;

        info!("Companion app disconnected");
        CONNECTED.store(false, Ordering::Relaxed);
        EVENTS.send(Event::ConnectionChanged(false)).await;
    }
}

fn on_gatt_event(event: ServerEvent) {
    match event {
        ServerEvent::Weather(WeatherServiceEvent::InboxWrite(frame)) => {
            let event = match Dictionary::decode(&frame) {
                Ok(message) => Event::InboxReceived(message),
                Err(e) => Event::InboxDropped(DropReason::Malformed(e)),
            };
            if EVENTS.try_send(event).is_err() {
                INBOX_DROPPED.store(true, Ordering::Relaxed);
            }
        }
        ServerEvent::Weather(WeatherServiceEvent::OutboxCccdWrite { notifications }) => {
            info!("Outbox notifications: {}", notifications);
        }
        ServerEvent::Cts(CurrentTimeServiceEvent::CurrentTimeWrite(bytes)) => {
            match TimeReference::from_cts_bytes(&bytes) {
                Some(reference) => TIME_SYNC.signal(reference),
                None => warn!("Invalid current time ignored"),
            }
        }
        ServerEvent::Bas(BatteryServiceEvent::BatteryLevelCccdWrite { notifications }) => {
            info!("Battery notifications: {}", notifications);
        }
    }
}

/// Notify queued outbox messages until the connection drops.
async fn forward_outbox(conn: &Connection, server: &Server) {
    loop {
        let frame = OUTBOX.receive().await;
        let event = match server.weather.outbox_notify(conn, &frame) {
            Ok(()) => Event::OutboxSent,
            Err(e) => {
                warn!("Outbox notify failed: {}", e);
                Event::OutboxFailed(OutboxError::Nack)
            }
        };
        EVENTS.send(event).await;
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(SystemConfig::new());
    info!("Initializing");

    // Priorities 0, 1 and 4 are reserved for the SoftDevice
    interrupt::SAADC.set_priority(Priority::P3);
    interrupt::SPIM2_SPIS2_SPI2.set_priority(Priority::P3);

    // Initialize Bluetooth
    let sd = Softdevice::enable(&bluetooth::generate_config());
    static SERVER: StaticCell<Server> = StaticCell::new();
    let server: &'static Server = SERVER.init(unwrap!(Server::new(sd)));
    unwrap!(spawner.spawn(softdevice_task(sd)));

    // Initialize SAADC
    let mut saadc_config = saadc::Config::default();
    // 12 bit resolution is needed for the battery voltage conversion
    saadc_config.resolution = Resolution::_12BIT;
    let channel = ChannelConfig::single_ended(p.P0_31);
    let saadc = Saadc::new(p.SAADC, Irqs, saadc_config, [channel]);
    saadc.calibrate().await;

    // Initialize Battery
    let mut battery = Battery::init(saadc, Input::new(p.P0_12, Pull::None));
    let battery_percent = battery.percent().await;
    if server.bas.battery_level_set(&battery_percent).is_err() {
        warn!("Battery level not updated");
    }

    // Initialize vibration motor
    let vibrator = Vibrator::init(Output::new(p.P0_16, Level::High, OutputDrive::Standard));

    // Initialize SPI
    let mut spim_config = spim::Config::default();
    // Use SPI at 8MHz (the fastest clock available on the nRF52832),
    // otherwise refreshing will be super slow.
    spim_config.frequency = spim::Frequency::M8;
    // SPI must be used in mode 3. Mode 0 (the default) won't work.
    spim_config.mode = spim::MODE_3;
    let spim = spim::Spim::new(p.SPI2, Irqs, p.P0_02, p.P0_04, p.P0_03, spim_config);

    // Initialize LCD
    let backlight = Backlight::init(
        Output::new(p.P0_14, Level::High, OutputDrive::Standard),
        Output::new(p.P0_22, Level::High, OutputDrive::Standard),
        Output::new(p.P0_23, Level::High, OutputDrive::Standard),
    );
    let mut display = unwrap!(Display::init(
        spim,
        Output::new(p.P0_25, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_18, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_26, Level::Low, OutputDrive::Standard),
        backlight,
    ));
    unwrap!(display.backlight().set(BRIGHTNESS));

    // Start the watchface
    let offset_secs = TIMEZONE.unwrap_or(0);
    let clock = TimeManager::init(BUILD_EPOCH);
    let settings = Settings {
        is_24h: true,
        local_offset_secs: offset_secs,
    };
    let probe = StartupProbe {
        now: clock.local_now(offset_secs),
        battery_percent,
        connected: CONNECTED.load(Ordering::Relaxed),
        timezone_set: TIMEZONE.is_some(),
    };
    let composer = DisplayComposer::start(FaceLayers::new(), BleOutbox, MotorHaptics, settings, probe);

    info!("Initialization finished");

    // Schedule tasks
    unwrap!(spawner.spawn(update_lcd(composer, display)));
    unwrap!(spawner.spawn(update_time(clock, offset_secs)));
    unwrap!(spawner.spawn(update_battery_status(battery, server, battery_percent)));
    unwrap!(spawner.spawn(notify(vibrator)));
    unwrap!(spawner.spawn(bluetooth_task(sd, server)));
}
