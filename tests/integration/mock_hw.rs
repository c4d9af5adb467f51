//! Mock hardware adapters for integration tests.
//!
//! Every mock keeps its state behind `Rc<RefCell<_>>` so a test can hold a
//! clone while the component under test owns the other.  Calls that matter
//! for ordering are appended to a shared [`Trace`].

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use fieldlogger::app::events::AppEvent;
use fieldlogger::app::ports::{EventSink, ModemPort, OpenMode, Sensor, StoragePort};
use fieldlogger::error::{Error, MediumError, ModemError};
use fieldlogger::modem::signal::{SignalFormat, SignalQuality};
use fieldlogger::modem::transport::ByteStream;
use fieldlogger::modem::{Connectivity, NetworkLink};

// ── Shared call trace ─────────────────────────────────────────

#[derive(Clone, Default)]
pub struct Trace(Rc<RefCell<Vec<String>>>);

impl Trace {
    pub fn push(&self, what: impl Into<String>) {
        self.0.borrow_mut().push(what.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn position(&self, what: &str) -> Option<usize> {
        self.0.borrow().iter().position(|c| c == what)
    }

    pub fn count(&self, what: &str) -> usize {
        self.0.borrow().iter().filter(|c| *c == what).count()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

// ── MemMedium ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MediumState {
    pub files: HashMap<String, Vec<String>>,
    pub card_present: bool,
    pub append_opens: usize,
    /// Delete the file right before this append-mode open (1-based).
    pub lose_file_on_append: Option<usize>,
}

#[derive(Clone)]
pub struct MemMedium {
    pub state: Rc<RefCell<MediumState>>,
    trace: Trace,
}

impl MemMedium {
    pub fn new(trace: Trace) -> Self {
        let state = MediumState { card_present: true, ..MediumState::default() };
        Self { state: Rc::new(RefCell::new(state)), trace }
    }

    pub fn lines(&self, name: &str) -> Vec<String> {
        self.state.borrow().files.get(name).cloned().unwrap_or_default()
    }

    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.state.borrow().files.keys().cloned().collect();
        names.sort();
        names
    }
}

impl StoragePort for MemMedium {
    type File = String;

    fn begin(&mut self) -> Result<(), MediumError> {
        if self.state.borrow().card_present { Ok(()) } else { Err(MediumError::Absent) }
    }

    fn exists(&mut self, name: &str) -> bool {
        self.state.borrow().files.contains_key(name)
    }

    fn open(&mut self, name: &str, mode: OpenMode) -> Result<String, MediumError> {
        let mut s = self.state.borrow_mut();
        if !s.card_present {
            return Err(MediumError::Absent);
        }
        match mode {
            OpenMode::Create => {
                s.files.entry(name.to_string()).or_default();
            }
            OpenMode::Append => {
                s.append_opens += 1;
                if s.lose_file_on_append == Some(s.append_opens) {
                    s.files.remove(name);
                }
                if !s.files.contains_key(name) {
                    return Err(MediumError::Absent);
                }
            }
        }
        Ok(name.to_string())
    }

    fn append_line(&mut self, file: &mut String, line: &str) -> Result<(), MediumError> {
        self.trace.push("medium.append");
        self.state
            .borrow_mut()
            .files
            .get_mut(file.as_str())
            .ok_or(MediumError::Io)?
            .push(line.to_string());
        Ok(())
    }

    fn close(&mut self, _file: String) -> Result<(), MediumError> {
        Ok(())
    }

    fn read_to_string(&mut self, name: &str) -> Result<String, MediumError> {
        self.state
            .borrow()
            .files
            .get(name)
            .map(|lines| lines.iter().map(|l| format!("{l}\r\n")).collect())
            .ok_or(MediumError::Absent)
    }
}

// ── FixedSensor ───────────────────────────────────────────────

pub struct FixedSensor {
    pub name: &'static str,
    pub variable: &'static str,
    pub unit: &'static str,
    pub value: f32,
    trace: Trace,
}

impl FixedSensor {
    pub fn new(name: &'static str, variable: &'static str, unit: &'static str, value: f32, trace: Trace) -> Self {
        Self { name, variable, unit, value, trace }
    }
}

impl Sensor for FixedSensor {
    fn name(&self) -> &str {
        self.name
    }

    fn variable_name(&self) -> &str {
        self.variable
    }

    fn unit(&self) -> &str {
        self.unit
    }

    fn value(&mut self) -> f32 {
        self.trace.push(format!("sensor.read {}", self.name));
        self.value
    }

    fn wake(&mut self) {
        self.trace.push(format!("sensor.wake {}", self.name));
    }

    fn sleep(&mut self) {
        self.trace.push(format!("sensor.sleep {}", self.name));
    }
}

// ── MockLink (Connectivity) ───────────────────────────────────

pub struct LinkState {
    pub attach_ok: bool,
    pub connect_ok: bool,
    /// Bytes the far end answers with after a request is sent.
    pub response: Vec<u8>,
    pub sync_result: Result<u32, Error>,
    pub signal_raw: i32,
    pub rx: VecDeque<u8>,
    pub sent: Vec<Vec<u8>>,
    pub powered: bool,
}

impl Default for LinkState {
    fn default() -> Self {
        Self {
            attach_ok: true,
            connect_ok: true,
            response: b"HTTP/1.1 201 Created\r\n".to_vec(),
            sync_result: Ok(1_500_000_000),
            signal_raw: 15,
            rx: VecDeque::new(),
            sent: Vec::new(),
            powered: false,
        }
    }
}

#[derive(Clone)]
pub struct MockLink {
    pub state: Rc<RefCell<LinkState>>,
    trace: Trace,
}

impl MockLink {
    pub fn new(trace: Trace) -> Self {
        Self { state: Rc::default(), trace }
    }

    pub fn sent_requests(&self) -> Vec<String> {
        self.state.borrow().sent.iter().map(|b| String::from_utf8_lossy(b).into_owned()).collect()
    }
}

impl NetworkLink for MockLink {
    fn connect(&mut self, host: &str, port: u16) -> Result<(), ModemError> {
        self.trace.push(format!("link.connect {host}:{port}"));
        if self.state.borrow().connect_ok { Ok(()) } else { Err(ModemError::ConnectFailed) }
    }

    fn send(&mut self, data: &[u8]) -> Result<(), ModemError> {
        self.trace.push("link.send");
        let mut s = self.state.borrow_mut();
        s.sent.push(data.to_vec());
        let response = s.response.clone();
        s.rx.extend(response);
        Ok(())
    }

    fn available(&mut self) -> usize {
        self.state.borrow().rx.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ModemError> {
        let mut s = self.state.borrow_mut();
        let n = buf.len().min(s.rx.len());
        for (slot, b) in buf.iter_mut().zip(s.rx.drain(..n)) {
            *slot = b;
        }
        Ok(n)
    }

    fn wait_available(&mut self, n: usize, _timeout_ms: u32) -> bool {
        self.trace.push("link.wait");
        self.state.borrow().rx.len() >= n
    }

    fn stop(&mut self) {
        self.trace.push("link.stop");
    }

    fn dump(&mut self) -> usize {
        let mut s = self.state.borrow_mut();
        let n = s.rx.len();
        s.rx.clear();
        n
    }
}

impl Connectivity for MockLink {
    fn init(&mut self) -> bool {
        self.trace.push("link.init");
        true
    }

    fn power_off(&mut self) -> bool {
        self.trace.push("link.power_off");
        self.state.borrow_mut().powered = false;
        true
    }

    fn attach(&mut self) -> Result<(), ModemError> {
        if !self.state.borrow().powered {
            self.trace.push("link.power_on");
            self.state.borrow_mut().powered = true;
        }
        self.trace.push("link.attach");
        if self.state.borrow().attach_ok { Ok(()) } else { Err(ModemError::AttachTimeout) }
    }

    fn detach(&mut self) {
        self.trace.push("link.detach");
    }

    fn signal_quality(&mut self) -> SignalQuality {
        SignalQuality::from_raw(self.state.borrow().signal_raw, SignalFormat::Csq)
    }

    fn try_sync_time(&mut self) -> Result<u32, Error> {
        self.trace.push("link.sync");
        self.state.borrow().sync_result
    }
}

// ── ScriptModem (ModemPort) ───────────────────────────────────

pub struct ModemState {
    pub at_ok: bool,
    /// `wait_for_network` answers true before any credentials are sent.
    pub already_joined: bool,
    /// `network_connect` / `gprs_connect` succeed.
    pub join_ok: bool,
    pub joined: bool,
    pub signal_raw: i32,
    pub calls: Vec<String>,
}

impl Default for ModemState {
    fn default() -> Self {
        Self {
            at_ok: true,
            already_joined: false,
            join_ok: true,
            joined: false,
            signal_raw: -70,
            calls: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct ScriptModem {
    pub state: Rc<RefCell<ModemState>>,
}

impl ScriptModem {
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    fn log(&self, what: String) {
        self.state.borrow_mut().calls.push(what);
    }
}

impl ModemPort for ScriptModem {
    fn begin(&mut self) -> bool {
        self.log("begin".into());
        true
    }

    fn test_at(&mut self, timeout_ms: u32) -> bool {
        self.log(format!("at {timeout_ms}"));
        self.state.borrow().at_ok
    }

    fn wait_for_network(&mut self, timeout_ms: u32) -> bool {
        self.log(format!("wait {timeout_ms}"));
        let s = self.state.borrow();
        s.joined || s.already_joined
    }

    fn network_connect(&mut self, ssid: &str, password: &str) -> bool {
        self.log(format!("wifi {ssid} {password}"));
        let mut s = self.state.borrow_mut();
        s.joined = s.join_ok;
        s.join_ok
    }

    fn gprs_connect(&mut self, apn: &str) -> bool {
        self.log(format!("gprs {apn}"));
        let mut s = self.state.borrow_mut();
        s.joined = s.join_ok;
        s.join_ok
    }

    fn network_disconnect(&mut self) {
        self.log("wifi off".into());
        self.state.borrow_mut().joined = false;
    }

    fn gprs_disconnect(&mut self) {
        self.log("gprs off".into());
        self.state.borrow_mut().joined = false;
    }

    fn signal_quality(&mut self) -> i32 {
        self.state.borrow().signal_raw
    }
}

// ── ScriptStream (ByteStream) ─────────────────────────────────

#[derive(Default)]
pub struct StreamState {
    pub connect_ok: bool,
    pub connected: bool,
    pub connects: Vec<String>,
    /// Loaded into the receive buffer on connect.
    pub on_connect: Vec<u8>,
    /// Loaded into the receive buffer after the first write.
    pub on_write: Vec<u8>,
    /// Writes after this many bytes fail.
    pub write_limit: Option<usize>,
    pub written: Vec<u8>,
    pub rx: VecDeque<u8>,
    pub stops: usize,
}

#[derive(Clone)]
pub struct ScriptStream {
    pub state: Rc<RefCell<StreamState>>,
}

impl Default for ScriptStream {
    fn default() -> Self {
        let state = StreamState { connect_ok: true, ..StreamState::default() };
        Self { state: Rc::new(RefCell::new(state)) }
    }
}

impl ByteStream for ScriptStream {
    type Error = &'static str;

    fn connect(&mut self, host: &str, port: u16) -> Result<(), Self::Error> {
        let mut s = self.state.borrow_mut();
        s.connects.push(format!("{host}:{port}"));
        if !s.connect_ok {
            return Err("refused");
        }
        s.connected = true;
        let greeting = s.on_connect.clone();
        s.rx.extend(greeting);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        let mut s = self.state.borrow_mut();
        if !s.connected {
            return Err("not connected");
        }
        let n = match s.write_limit {
            Some(limit) if s.written.len() >= limit => return Err("broken pipe"),
            Some(limit) => data.len().min(limit - s.written.len()),
            None => data.len(),
        };
        let first = s.written.is_empty();
        s.written.extend_from_slice(&data[..n]);
        if first {
            let reply = s.on_write.clone();
            s.rx.extend(reply);
        }
        Ok(n)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn available(&mut self) -> usize {
        self.state.borrow().rx.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut s = self.state.borrow_mut();
        let n = buf.len().min(s.rx.len());
        for (slot, b) in buf.iter_mut().zip(s.rx.drain(..n)) {
            *slot = b;
        }
        Ok(n)
    }

    fn stop(&mut self) {
        let mut s = self.state.borrow_mut();
        s.connected = false;
        s.stops += 1;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn faults(&self) -> Vec<Error> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Fault(err) => Some(*err),
                _ => None,
            })
            .collect()
    }

    pub fn upload_statuses(&self) -> Vec<u16> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::UploadResult { status } => Some(*status),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
