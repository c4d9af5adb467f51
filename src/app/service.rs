//! Application service: the hexagonal core.
//!
//! [`Orchestrator`] owns the schedule engine, the data logger, and the
//! optional uplink.  Sensors and the event sink are injected at call sites,
//! making the whole cycle testable with mock adapters.
//!
//! ```text
//!  SensorArray ──▶ ┌────────────────────────────────┐ ──▶ EventSink
//!                  │          Orchestrator          │
//!        RTC ◀───▶ │ Schedule · DataLogger · Uplink │ ──▶ storage / modem
//!                  └────────────────────────────────┘
//! ```
//!
//! Per wake: refresh the clock; if this is a tick, sample, log, then (if an
//! uplink is configured) attach, upload and detach; then sleep.  The
//! record is on the medium before the modem is touched, and every failure
//! past that point is reported without stopping the cycle.

use log::{info, warn};

use crate::config::LoggerConfig;
use crate::datalog::DataLogger;
use crate::error::Error;
use crate::fsm::{CyclePhase, PhaseTracker};
use crate::modem::Connectivity;
use crate::modem::signal::SignalQuality;
use crate::scheduler::ScheduleEngine;
use crate::sensors::modem_signal::SignalStore;
use crate::sensors::{SensorArray, SensorReading};
use crate::upload::{UploadClient, UploadStatus};

use super::events::AppEvent;
use super::ports::{ClockPort, EventSink, IndicatorPort, SleepPort, StoragePort};

/// Re-sync the RTC on every this-many-th tick, counted from boot.
/// At a 5-minute interval this is once a day.
pub const RESYNC_EVERY_TICKS: u64 = 288;

/// What one call to [`Orchestrator::run_cycle`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// The wake was a tick.
    pub ticked: bool,
    /// The record reached the medium.
    pub logged: bool,
    pub signal: Option<SignalQuality>,
    /// HTTP status of the upload, if one was attempted.
    pub upload_status: Option<u16>,
    /// UTC epoch written to the RTC, if the clock was corrected.
    pub clock_synced: Option<i64>,
}

// ───────────────────────────────────────────────────────────────
// Orchestrator
// ───────────────────────────────────────────────────────────────

pub struct Orchestrator<C, Z, F, L>
where
    C: ClockPort,
    Z: SleepPort,
    F: StoragePort,
    L: Connectivity,
{
    config: LoggerConfig,
    schedule: ScheduleEngine<C, Z>,
    logger: DataLogger<F>,
    uplink: Option<(L, UploadClient)>,
    led: Option<Box<dyn IndicatorPort>>,
    signal_store: Option<SignalStore>,
    phases: PhaseTracker,
    /// Ticks fully handled since boot.
    ticks_handled: u64,
}

impl<C, Z, F, L> Orchestrator<C, Z, F, L>
where
    C: ClockPort,
    Z: SleepPort,
    F: StoragePort,
    L: Connectivity,
{
    /// Columns pair with the configured variable UUIDs by position.  A
    /// column without a UUID is still logged but never uploaded, and
    /// surplus UUIDs are ignored.
    pub fn new(config: LoggerConfig, schedule: ScheduleEngine<C, Z>, logger: DataLogger<F>) -> Result<Self, Error> {
        config.validate()?;
        let columns = logger.columns().len();
        let uuids = config.variable_uuids.len();
        if columns != uuids {
            warn!("Orchestrator: {columns} sensors but {uuids} variable UUIDs, unmatched columns are not uploaded");
        }
        Ok(Self {
            config,
            schedule,
            logger,
            uplink: None,
            led: None,
            signal_store: None,
            phases: PhaseTracker::new(),
            ticks_handled: 0,
        })
    }

    /// Attach a modem and upload client.
    pub fn with_uplink(mut self, link: L, client: UploadClient) -> Self {
        self.uplink = Some((link, client));
        self
    }

    /// Where each attach's signal reading is kept for the modem columns.
    pub fn with_signal_store(mut self, store: SignalStore) -> Self {
        self.signal_store = Some(store);
        self
    }

    /// LED lit while a tick is being handled.
    pub fn with_alert_led(mut self, led: Box<dyn IndicatorPort>) -> Self {
        self.led = Some(led);
        self
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Arm the alarm, read the clock, open the log file, and bring the
    /// modem up once.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        info!(
            "Orchestrator: logger '{}', {} variables, interval {} min",
            self.config.logger_id,
            self.logger.columns().len(),
            self.config.interval_minutes
        );
        if let Err(e) = self.schedule.setup_sleep() {
            fault(sink, e.into());
        }
        match self.schedule.refresh() {
            Ok(_) => info!("Orchestrator: RTC reads {}", self.schedule.timestamp()),
            Err(e) => fault(sink, e.into()),
        }
        if let Err(e) = self.logger.create_file(&self.schedule.date()) {
            fault(sink, e.into());
        }
        if let Some((link, _)) = self.uplink.as_mut() {
            link.init();
        }
        sink.emit(&AppEvent::Started {
            logger_id: self.config.logger_id.clone(),
            file: self.logger.file_name().map(str::to_string),
        });
    }

    // ── Per-wake orchestration ────────────────────────────────

    /// Handle one wake, then sleep until the next.
    pub fn run_cycle(&mut self, sensors: &mut SensorArray, sink: &mut impl EventSink) -> CycleReport {
        let mut report = CycleReport::default();

        if let Err(e) = self.schedule.refresh() {
            fault(sink, e.into());
        }
        if !self.schedule.take_tick() {
            self.step(CyclePhase::Sleeping, sink);
            self.schedule.enter_low_power();
            self.step(CyclePhase::Idle, sink);
            return report;
        }
        report.ticked = true;
        self.set_led(true);

        // Sampling.  The modem stays off until the record is on the medium.
        self.step(CyclePhase::Sampling, sink);
        let timestamp = self.schedule.timestamp();
        sensors.wake_all();
        let readings = sensors.read_all();
        sensors.sleep_all();

        // Logging.  Always, and before any network traffic.
        self.step(CyclePhase::Logging, sink);
        let line = DataLogger::<F>::format_record(&timestamp, &readings);
        match self.logger.append(&line, &self.schedule.date()) {
            Ok(()) => {
                report.logged = true;
                sink.emit(&AppEvent::RecordLogged { line });
            }
            Err(e) => fault(sink, e.into()),
        }

        // Uploading.
        if self.uplink.is_some() {
            self.step(CyclePhase::Uploading, sink);
            self.upload(&timestamp, &readings, &mut report, sink);
        }

        self.step(CyclePhase::Sleeping, sink);
        self.ticks_handled += 1;
        self.set_led(false);
        self.schedule.enter_low_power();
        self.step(CyclePhase::Idle, sink);
        report
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn phase(&self) -> CyclePhase {
        self.phases.current()
    }

    pub fn ticks_handled(&self) -> u64 {
        self.ticks_handled
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn log_file(&self) -> Option<&str> {
        self.logger.file_name()
    }

    // ── Internal ──────────────────────────────────────────────

    fn upload(
        &mut self,
        timestamp: &str,
        readings: &[SensorReading],
        report: &mut CycleReport,
        sink: &mut impl EventSink,
    ) {
        let Some((link, client)) = self.uplink.as_mut() else {
            return;
        };

        match link.attach() {
            Ok(()) => {
                let signal = link.signal_quality();
                info!("Orchestrator: signal {} dBm, {}%", signal.rssi, signal.percent);
                report.signal = Some(signal);
                if let Some(store) = &self.signal_store {
                    store.record(signal);
                }
                sink.emit(&AppEvent::Signal(signal));

                let payload = UploadClient::build_payload(
                    &self.config.sampling_feature,
                    timestamp,
                    &self.config.variable_uuids,
                    readings,
                );
                let status = client.post(link, &payload);
                report.upload_status = Some(status);
                sink.emit(&AppEvent::UploadResult { status });
                if let UploadStatus::Failed(e) = UploadStatus::from_code(status) {
                    fault(sink, e.into());
                }

                if self.ticks_handled % RESYNC_EVERY_TICKS == 0 {
                    match link.try_sync_time() {
                        Ok(utc) => {
                            let utc = i64::from(utc);
                            match self.schedule.apply_correction(utc) {
                                Ok(()) => {
                                    report.clock_synced = Some(utc);
                                    sink.emit(&AppEvent::ClockSynced { utc_epoch: utc });
                                }
                                Err(e) => fault(sink, e.into()),
                            }
                        }
                        Err(e) => fault(sink, e),
                    }
                }

                link.detach();
            }
            Err(e) => {
                if let Some(store) = &self.signal_store {
                    store.clear();
                }
                fault(sink, e.into());
            }
        }

        if !link.power_off() {
            warn!("Orchestrator: modem did not power off");
        }
    }

    fn step(&mut self, next: CyclePhase, sink: &mut impl EventSink) {
        let from = self.phases.transition(next);
        sink.emit(&AppEvent::PhaseChanged { from, to: next });
    }

    fn set_led(&mut self, on: bool) {
        if let Some(led) = self.led.as_mut() {
            led.set(on);
        }
    }
}

fn fault(sink: &mut impl EventSink, e: Error) {
    warn!("Orchestrator: {e}");
    sink.emit(&AppEvent::Fault(e));
}
