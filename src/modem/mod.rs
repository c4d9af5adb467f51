//! Connectivity engine: modem power, network attach, and the byte stream.
//!
//! ```text
//!                 attach()                    ok
//!  Disconnected ───────────▶ Attaching ───────────▶ Attached
//!       ▲                        │ fail                 │
//!       └────────────────────────┘                      │
//!       ▲   detach() / power_off() / send failure       │
//!       └───────────────────────────────────────────────┘
//! ```
//!
//! Every wait is a bounded poll on the [`TimerPort`].  There are no hidden
//! retries: each step is attempted once and its failure is reported.

pub mod signal;
pub mod time_sync;
pub mod transport;

use log::{debug, info, warn};

use crate::app::ports::{ModemPort, TimerPort};
use crate::config::{LinkConfig, ModemConfig};
use crate::error::{Error, ModemError, SyncError};
use crate::power::PowerControl;
use signal::{SignalFormat, SignalQuality};
use transport::ByteStream;

/// Liveness probe (`AT` → `OK`) timeout.
pub const AT_TIMEOUT_MS: u32 = 5_000;
/// WiFi: how long to wait for the module to rejoin on its own.
pub const WIFI_REASSOCIATE_MS: u32 = 2_000;
/// WiFi: how long to wait after resending credentials.
pub const WIFI_CONNECT_MS: u32 = 30_000;
/// Cellular: how long to wait for network registration.
pub const CELL_REGISTER_MS: u32 = 45_000;
/// Residue drain step.
pub const DUMP_STEP_MS: u32 = 5;
/// Residue drain upper bound.
pub const DUMP_TIMEOUT_MS: u32 = 5_000;
/// Poll step while waiting for response bytes.
pub const READ_POLL_STEP_MS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Attaching,
    Attached,
}

/// What the upload client needs from an attached network path.
///
/// All calls except [`stop`](Self::stop) and [`dump`](Self::dump) require
/// the link to be attached.
pub trait NetworkLink {
    fn connect(&mut self, host: &str, port: u16) -> Result<(), ModemError>;

    /// Write all of `data` and flush.  A failure drops the link.
    fn send(&mut self, data: &[u8]) -> Result<(), ModemError>;

    fn available(&mut self) -> usize;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ModemError>;

    /// Wait until at least `n` bytes are available.  Returns false on timeout.
    fn wait_available(&mut self, n: usize, timeout_ms: u32) -> bool;

    fn stop(&mut self);

    /// Discard whatever is left in the receive buffer.  Returns the byte count.
    fn dump(&mut self) -> usize;
}

/// Modem lifecycle as the orchestrator drives it.
pub trait Connectivity: NetworkLink {
    fn init(&mut self) -> bool;

    fn power_off(&mut self) -> bool;

    fn attach(&mut self) -> Result<(), ModemError>;

    fn detach(&mut self);

    fn signal_quality(&mut self) -> SignalQuality;

    fn try_sync_time(&mut self) -> Result<u32, Error>;
}

/// Owns the modem driver, its socket, and its power sequencer.
pub struct ConnectivityEngine<M, S, P, T>
where
    M: ModemPort,
    S: ByteStream,
    P: PowerControl,
    T: TimerPort,
{
    modem: M,
    stream: S,
    power: P,
    timer: T,
    link: LinkConfig,
    signal_format: SignalFormat,
    state: ConnectionState,
}

impl<M, S, P, T> ConnectivityEngine<M, S, P, T>
where
    M: ModemPort,
    S: ByteStream,
    P: PowerControl,
    T: TimerPort,
{
    pub fn new(modem: M, stream: S, power: P, timer: T, config: &ModemConfig) -> Self {
        Self {
            modem,
            stream,
            power,
            timer,
            link: config.link.clone(),
            signal_format: config.signal_format,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_attached(&self) -> bool {
        self.state == ConnectionState::Attached
    }

    pub fn is_powered(&mut self) -> bool {
        self.power.is_on()
    }

    /// Boot-time bring-up: power on, run the driver's `begin()` if the
    /// modem came up, then power back off.  Returns whether `begin()` ran
    /// and succeeded.
    pub fn init(&mut self) -> bool {
        info!("Modem: initialising");
        let began = if self.power.on() {
            let ok = self.modem.begin();
            if !ok {
                warn!("Modem: driver begin() failed");
            }
            ok
        } else {
            warn!("Modem: did not power up, skipping begin()");
            false
        };
        self.power_off();
        began
    }

    /// Flush, power down, drain residue, and drop any attach.
    pub fn power_off(&mut self) -> bool {
        if self.power.is_on() && self.stream.flush().is_err() {
            debug!("Modem: flush before power-off failed");
        }
        if self.state != ConnectionState::Disconnected {
            self.stream.stop();
            self.state = ConnectionState::Disconnected;
        }
        let off = self.power.off();
        self.drain();
        off
    }

    /// Power up (if needed), probe, and join the configured network.
    pub fn attach(&mut self) -> Result<(), ModemError> {
        if self.state == ConnectionState::Attached && self.power.is_on() {
            return Ok(());
        }
        self.state = ConnectionState::Attaching;

        if !self.power.on() {
            warn!("Modem: power-on failed");
            self.state = ConnectionState::Disconnected;
            return Err(ModemError::PowerFailure);
        }
        if !self.modem.test_at(AT_TIMEOUT_MS) {
            warn!("Modem: no answer to AT within {} ms", AT_TIMEOUT_MS);
            self.state = ConnectionState::Disconnected;
            return Err(ModemError::NotResponding);
        }

        let joined = match &self.link {
            LinkConfig::Wifi { ssid, password } => {
                if self.modem.wait_for_network(WIFI_REASSOCIATE_MS) {
                    true
                } else {
                    info!("Modem: sending WiFi credentials for '{}'", ssid);
                    self.modem.network_connect(ssid, password)
                        && self.modem.wait_for_network(WIFI_CONNECT_MS)
                }
            }
            LinkConfig::Cellular { apn } => {
                if self.modem.wait_for_network(CELL_REGISTER_MS) {
                    info!("Modem: registered, activating context on '{}'", apn);
                    self.modem.gprs_connect(apn)
                } else {
                    false
                }
            }
        };

        if joined {
            info!("Modem: attached");
            self.state = ConnectionState::Attached;
            Ok(())
        } else {
            warn!("Modem: network attach timed out");
            self.state = ConnectionState::Disconnected;
            Err(ModemError::AttachTimeout)
        }
    }

    /// Leave the network.  Power is left as it is.
    pub fn detach(&mut self) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        self.stream.stop();
        match &self.link {
            LinkConfig::Wifi { .. } => self.modem.network_disconnect(),
            LinkConfig::Cellular { .. } => self.modem.gprs_disconnect(),
        }
        self.state = ConnectionState::Disconnected;
        info!("Modem: detached");
    }

    pub fn signal_quality(&mut self) -> SignalQuality {
        let raw = self.modem.signal_quality();
        let q = SignalQuality::from_raw(raw, self.signal_format);
        debug!("Modem: signal raw={} rssi={} pct={}", raw, q.rssi, q.percent);
        q
    }

    /// Query the time service.  Returns the Unix epoch, or 0 on any failure.
    pub fn sync_time(&mut self) -> u32 {
        match self.try_sync_time() {
            Ok(t) => {
                info!("Modem: time service says {}", t);
                t
            }
            Err(e) => {
                warn!("Modem: time sync failed: {}", e);
                0
            }
        }
    }

    /// Query the time service, reporting why it failed.
    pub fn try_sync_time(&mut self) -> Result<u32, Error> {
        if !self.is_attached() {
            return Err(ModemError::NotAttached.into());
        }
        NetworkLink::connect(self, time_sync::TIME_HOST, time_sync::TIME_PORT)?;
        if !self.wait_available(4, time_sync::RESPONSE_TIMEOUT_MS) {
            self.stream.stop();
            return Err(SyncError::NoResponse.into());
        }
        let mut buf = [0u8; 4];
        let got = self.read_exact(&mut buf);
        self.stream.stop();
        if got < buf.len() {
            return Err(SyncError::NoResponse.into());
        }
        Ok(time_sync::decode(buf)?)
    }

    /// Read until `buf` is full or the stream has nothing more.
    fn read_exact(&mut self, buf: &mut [u8]) -> usize {
        let mut got = 0;
        while got < buf.len() {
            match self.stream.read(&mut buf[got..]) {
                Ok(0) | Err(_) => break,
                Ok(n) => got += n,
            }
        }
        got
    }

    fn require_attached(&mut self) -> Result<(), ModemError> {
        debug_assert!(self.is_attached(), "byte-stream call while not attached");
        if !self.is_attached() {
            return Err(ModemError::NotAttached);
        }
        if !self.power.is_on() {
            warn!("Modem: lost power while attached");
            self.state = ConnectionState::Disconnected;
            return Err(ModemError::NotAttached);
        }
        Ok(())
    }

    fn drain(&mut self) -> usize {
        let mut dumped = 0;
        let mut sink = [0u8; 64];
        self.timer.delay_ms(DUMP_STEP_MS);
        let start = self.timer.millis();
        while self.stream.available() > 0
            && self.timer.millis().saturating_sub(start) < u64::from(DUMP_TIMEOUT_MS)
        {
            match self.stream.read(&mut sink) {
                Ok(0) | Err(_) => break,
                Ok(n) => dumped += n,
            }
            self.timer.delay_ms(DUMP_STEP_MS);
        }
        if dumped > 0 {
            debug!("Modem: dumped {} stale bytes", dumped);
        }
        dumped
    }
}

impl<M, S, P, T> NetworkLink for ConnectivityEngine<M, S, P, T>
where
    M: ModemPort,
    S: ByteStream,
    P: PowerControl,
    T: TimerPort,
{
    fn connect(&mut self, host: &str, port: u16) -> Result<(), ModemError> {
        self.require_attached()?;
        self.stream.connect(host, port).map_err(|e| {
            warn!("Modem: connect to {}:{} failed: {:?}", host, port, e);
            ModemError::ConnectFailed
        })
    }

    fn send(&mut self, data: &[u8]) -> Result<(), ModemError> {
        self.require_attached()?;
        let mut sent = 0;
        while sent < data.len() {
            match self.stream.write(&data[sent..]) {
                Ok(0) | Err(_) => {
                    warn!("Modem: send failed after {} of {} bytes", sent, data.len());
                    self.stream.stop();
                    self.state = ConnectionState::Disconnected;
                    return Err(ModemError::SendFailed);
                }
                Ok(n) => sent += n,
            }
        }
        if self.stream.flush().is_err() {
            self.stream.stop();
            self.state = ConnectionState::Disconnected;
            return Err(ModemError::SendFailed);
        }
        Ok(())
    }

    fn available(&mut self) -> usize {
        if self.require_attached().is_err() {
            return 0;
        }
        self.stream.available()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ModemError> {
        self.require_attached()?;
        self.stream.read(buf).map_err(|_| ModemError::ReceiveFailed)
    }

    fn wait_available(&mut self, n: usize, timeout_ms: u32) -> bool {
        if self.require_attached().is_err() {
            return false;
        }
        let stream = &mut self.stream;
        self.timer.poll_until(timeout_ms, READ_POLL_STEP_MS, || stream.available() >= n)
    }

    fn stop(&mut self) {
        self.stream.stop();
    }

    fn dump(&mut self) -> usize {
        self.drain()
    }
}

impl<M, S, P, T> Connectivity for ConnectivityEngine<M, S, P, T>
where
    M: ModemPort,
    S: ByteStream,
    P: PowerControl,
    T: TimerPort,
{
    fn init(&mut self) -> bool {
        ConnectivityEngine::init(self)
    }

    fn power_off(&mut self) -> bool {
        ConnectivityEngine::power_off(self)
    }

    fn attach(&mut self) -> Result<(), ModemError> {
        ConnectivityEngine::attach(self)
    }

    fn detach(&mut self) {
        ConnectivityEngine::detach(self);
    }

    fn signal_quality(&mut self) -> SignalQuality {
        ConnectivityEngine::signal_quality(self)
    }

    fn try_sync_time(&mut self) -> Result<u32, Error> {
        ConnectivityEngine::try_sync_time(self)
    }
}

/// Stand-in uplink for loggers without a modem.  Cannot be constructed.
#[derive(Debug)]
pub enum Offline {}

impl NetworkLink for Offline {
    fn connect(&mut self, _host: &str, _port: u16) -> Result<(), ModemError> {
        match *self {}
    }

    fn send(&mut self, _data: &[u8]) -> Result<(), ModemError> {
        match *self {}
    }

    fn available(&mut self) -> usize {
        match *self {}
    }

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ModemError> {
        match *self {}
    }

    fn wait_available(&mut self, _n: usize, _timeout_ms: u32) -> bool {
        match *self {}
    }

    fn stop(&mut self) {
        match *self {}
    }

    fn dump(&mut self) -> usize {
        match *self {}
    }
}

impl Connectivity for Offline {
    fn init(&mut self) -> bool {
        match *self {}
    }

    fn power_off(&mut self) -> bool {
        match *self {}
    }

    fn attach(&mut self) -> Result<(), ModemError> {
        match *self {}
    }

    fn detach(&mut self) {
        match *self {}
    }

    fn signal_quality(&mut self) -> SignalQuality {
        match *self {}
    }

    fn try_sync_time(&mut self) -> Result<u32, Error> {
        match *self {}
    }
}
