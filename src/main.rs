//! FieldLogger firmware entry point
//!
//! Hexagonal architecture with alarm-driven wake and light sleep.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  Ds3231 (Clock)   FsMedium (SD)   WifiModem   TcpByteStream    │
//! │  LightSleep       OneshotAdc      LogEventSink                 │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Orchestrator (pure logic)                 │    │
//! │  │  Schedule · DataLogger · Connectivity · Upload         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::fs::fatfs::Fatfs;
use esp_idf_svc::hal::gpio::{AnyIOPin, AnyInputPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::prelude::*;
use esp_idf_svc::hal::sd::{spi::SdSpiHostDriver, SdCardConfiguration, SdCardDriver};
use esp_idf_svc::hal::spi::{config::DriverConfig, Dma, SpiDriver};
use esp_idf_svc::io::vfs::MountedFatfs;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use fieldlogger::adapters::adc::OneshotAdc;
use fieldlogger::adapters::fs_medium::{FsMedium, SD_MOUNT_POINT};
use fieldlogger::adapters::log_sink::LogEventSink;
use fieldlogger::adapters::sleep::LightSleep;
use fieldlogger::adapters::tcp_stream::TcpByteStream;
use fieldlogger::adapters::time::MonotonicTimer;
use fieldlogger::adapters::wifi::WifiModem;
use fieldlogger::app::ports::StoragePort;
use fieldlogger::app::service::Orchestrator;
use fieldlogger::clock::ClockSource;
use fieldlogger::config::{LinkConfig, LoggerConfig};
use fieldlogger::datalog::DataLogger;
use fieldlogger::drivers::ds3231::Ds3231;
use fieldlogger::modem::ConnectivityEngine;
use fieldlogger::pins;
use fieldlogger::power::PowerSequencer;
use fieldlogger::scheduler::ScheduleEngine;
use fieldlogger::sensors::battery::BatteryVoltage;
use fieldlogger::sensors::board_temp::BoardTemperature;
use fieldlogger::sensors::free_heap::FreeHeap;
use fieldlogger::sensors::modem_signal::{ModemRssi, ModemSignalPercent, SignalStore};
use fieldlogger::sensors::SensorArray;
use fieldlogger::upload::UploadClient;

/// Configuration file at the root of the SD card.
const CONFIG_FILE: &str = "logger.json";

type OutPin = PinDriver<'static, AnyOutputPin, Output>;
type InPin = PinDriver<'static, AnyInputPin, Input>;
type Uplink = ConnectivityEngine<WifiModem, TcpByteStream, PowerSequencer<OutPin, InPin, MonotonicTimer>, MonotonicTimer>;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  FieldLogger v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // ── 2. SD card ────────────────────────────────────────────
    // A failed mount is not fatal: the medium reads as absent and every
    // append reports it until the card is fixed.
    let spi = SpiDriver::new(
        peripherals.spi2,
        peripherals.pins.gpio14,
        peripherals.pins.gpio11,
        Some(peripherals.pins.gpio13),
        &DriverConfig::default().dma(Dma::Auto(4096)),
    )?;
    let _sd_mount = SdSpiHostDriver::new(
        spi,
        Some(peripherals.pins.gpio12),
        AnyIOPin::none(),
        AnyIOPin::none(),
        AnyIOPin::none(),
        None,
    )
    .and_then(|host| SdCardDriver::new_spi(host, &SdCardConfiguration::new()))
    .and_then(|card| Fatfs::new_sdcard(0, card))
    .and_then(|fatfs| MountedFatfs::mount(fatfs, SD_MOUNT_POINT, 4))
    .inspect_err(|e| warn!("SD card mount failed: {:?}", e))
    .ok();

    // ── 3. Load config from the card (or defaults) ────────────
    let mut medium = FsMedium::new(SD_MOUNT_POINT);
    let config = match medium.read_to_string(CONFIG_FILE) {
        Ok(text) => match LoggerConfig::from_json(&text) {
            Ok(cfg) => {
                info!("Config loaded from {}", CONFIG_FILE);
                cfg
            }
            Err(e) => {
                warn!("{} rejected ({}), using defaults", CONFIG_FILE, e);
                LoggerConfig::default()
            }
        },
        Err(e) => {
            warn!("{} not readable ({}), using defaults", CONFIG_FILE, e);
            LoggerConfig::default()
        }
    };
    if config.sd_select_pin != pins::SD_SELECT_GPIO {
        warn!("Config: SD select is fixed at GPIO{} on this board", pins::SD_SELECT_GPIO);
    }

    // ── 4. RTC and wake line ──────────────────────────────────
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio2,
        peripherals.pins.gpio3,
        &I2cConfig::new().baudrate(100.kHz().into()),
    )?;
    let rtc = Rc::new(RefCell::new(Ds3231::new(i2c)));

    let _wake_line = match config.wake_pin {
        Some(gpio) => {
            // SAFETY: the pin number comes from the board config and is not
            // claimed by any other driver.
            let mut pin = PinDriver::input(unsafe { AnyIOPin::new(gpio) })?;
            pin.set_pull(Pull::Up)?;
            Some(pin)
        }
        None => {
            warn!("No wake line configured: the logger will not sleep");
            None
        }
    };
    let sleeper = LightSleep::new(config.wake_pin.unwrap_or(pins::RTC_INT_GPIO));
    let clock = ClockSource::new(rtc.clone(), config.timezone_hours);
    let schedule = ScheduleEngine::new(clock, sleeper, config.interval_minutes, config.wake_pin.is_some());

    // ── 5. Sensors ────────────────────────────────────────────
    let mut sensors = SensorArray::new();
    sensors.push(Box::new(BoardTemperature::new(rtc.clone())));
    sensors.push(Box::new(BatteryVoltage::new(OneshotAdc::new(pins::BATTERY_ADC_CHANNEL)?, config.board)));
    sensors.push(Box::new(FreeHeap::new()));
    let signal = SignalStore::new();
    if config.modem.is_some() && config.upload.is_some() {
        sensors.push(Box::new(ModemRssi::new(signal.clone())));
        sensors.push(Box::new(ModemSignalPercent::new(signal.clone())));
    }

    // ── 6. Data logger ────────────────────────────────────────
    let columns = sensors.columns(&config.variable_uuids);
    let logger = DataLogger::new(medium, &config.logger_id, &config.sampling_feature, columns);

    // ── 7. Orchestrator + uplink ──────────────────────────────
    let modem_cfg = config.modem.clone();
    let upload_cfg = config.upload.clone();
    let alert_pin = config.alert_led_pin;
    let mut app: Orchestrator<_, _, _, Uplink> = Orchestrator::new(config, schedule, logger)?;

    if let (Some(modem_cfg), Some(upload_cfg)) = (modem_cfg, upload_cfg) {
        if matches!(modem_cfg.link, LinkConfig::Cellular { .. }) {
            warn!("Config: cellular link requested but this board only has WiFi");
        }
        let wifi = BlockingWifi::wrap(EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?, sysloop)?;
        let timer = MonotonicTimer::new();
        let mut power = PowerSequencer::new(modem_cfg.power_scheme, timer);
        // SAFETY (all three): pin numbers come from the board config and
        // are not claimed by any other driver.
        if let Some(gpio) = modem_cfg.vcc_pin {
            power = power.with_vcc(PinDriver::output(unsafe { AnyOutputPin::new(gpio) })?);
        }
        if let Some(gpio) = modem_cfg.on_off_pin {
            power = power.with_control(PinDriver::output(unsafe { AnyOutputPin::new(gpio) })?);
        }
        if let Some(gpio) = modem_cfg.status_pin {
            power = power.with_status(PinDriver::input(unsafe { AnyInputPin::new(gpio) })?);
        }
        let engine = ConnectivityEngine::new(WifiModem::new(wifi), TcpByteStream::new(), power, timer, &modem_cfg);
        app = app.with_uplink(engine, UploadClient::new(&upload_cfg)).with_signal_store(signal);
    } else {
        info!("Upload disabled: logging to card only");
    }

    if let Some(gpio) = alert_pin {
        // SAFETY: see above.
        let led: OutPin = PinDriver::output(unsafe { AnyOutputPin::new(gpio) })?;
        app = app.with_alert_led(Box::new(led));
    }

    // ── 8. Run ────────────────────────────────────────────────
    let mut log_sink = LogEventSink::new();
    app.start(&mut log_sink);
    info!("System ready. Entering cycle loop.");

    loop {
        let report = app.run_cycle(&mut sensors, &mut log_sink);
        if report.ticked && !report.logged {
            warn!("Tick {} was not logged", app.ticks_handled());
        }
    }
}
