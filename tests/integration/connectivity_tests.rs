//! Integration tests for the ConnectivityEngine driving scripted modem,
//! socket and power lines, plus the upload client on top of it.
//!
//! All waits run on a `ManualTimer`, so multi-second timeouts finish
//! instantly while still being measurable.

use fieldlogger::adapters::gpio::SimPin;
use fieldlogger::adapters::time::ManualTimer;
use fieldlogger::adapters::wifi::WifiModem;
use fieldlogger::app::ports::TimerPort;
use fieldlogger::config::{LinkConfig, ModemConfig, UploadConfig};
use fieldlogger::error::{Error, ModemError, SyncError};
use fieldlogger::modem::signal::SignalFormat;
use fieldlogger::modem::time_sync::{EPOCH_1900_OFFSET, MIN_PLAUSIBLE};
use fieldlogger::modem::{ConnectionState, Connectivity, ConnectivityEngine};
use fieldlogger::power::{PowerScheme, PowerSequencer};
use fieldlogger::upload::UploadClient;

use super::mock_hw::{ScriptModem, ScriptStream};

type Power = PowerSequencer<SimPin, SimPin, ManualTimer>;
type Engine<M> = ConnectivityEngine<M, ScriptStream, Power, ManualTimer>;

fn cellular() -> ModemConfig {
    ModemConfig {
        power_scheme: PowerScheme::Held,
        vcc_pin: Some(5),
        status_pin: None,
        on_off_pin: Some(7),
        signal_format: SignalFormat::Csq,
        link: LinkConfig::Cellular { apn: "hologram".into() },
    }
}

fn wifi() -> ModemConfig {
    ModemConfig {
        signal_format: SignalFormat::Rssi,
        link: LinkConfig::Wifi {
            ssid: heapless::String::try_from("FieldNet").unwrap(),
            password: heapless::String::try_from("secret123").unwrap(),
        },
        ..cellular()
    }
}

struct Lines {
    vcc: SimPin,
    control: SimPin,
}

fn engine<M: fieldlogger::app::ports::ModemPort>(
    modem: M,
    config: &ModemConfig,
) -> (Engine<M>, ScriptStream, Lines, ManualTimer) {
    let timer = ManualTimer::new();
    let lines = Lines { vcc: SimPin::default(), control: SimPin::default() };
    let power = Power::new(config.power_scheme, timer.clone())
        .with_vcc(lines.vcc.clone())
        .with_control(lines.control.clone());
    let stream = ScriptStream::default();
    let e = ConnectivityEngine::new(modem, stream.clone(), power, timer.clone(), config);
    (e, stream, lines, timer)
}

fn nist(unix: u32) -> Vec<u8> {
    (unix.wrapping_add(EPOCH_1900_OFFSET)).to_be_bytes().to_vec()
}

// ── Power and attach ──────────────────────────────────────────

#[test]
fn init_runs_begin_then_powers_down() {
    let modem = ScriptModem::default();
    let (mut e, _stream, lines, _timer) = engine(modem.clone(), &cellular());

    assert!(e.init());
    assert_eq!(modem.calls(), vec!["begin"]);
    assert!(!lines.vcc.level());
    assert!(!lines.control.level());
    assert!(!e.is_powered());
}

#[test]
fn cellular_attach_registers_then_opens_context() {
    let modem = ScriptModem::default();
    modem.state.borrow_mut().already_joined = true;
    let (mut e, _stream, lines, _timer) = engine(modem.clone(), &cellular());

    assert_eq!(e.attach(), Ok(()));
    assert_eq!(e.state(), ConnectionState::Attached);
    assert!(lines.vcc.level());
    assert!(lines.control.level());
    assert_eq!(modem.calls(), vec!["at 5000", "wait 45000", "gprs hologram"]);

    e.detach();
    assert_eq!(e.state(), ConnectionState::Disconnected);
    assert_eq!(modem.calls().last().map(String::as_str), Some("gprs off"));
    // Detach leaves power alone.
    assert!(e.is_powered());
}

#[test]
fn cellular_attach_times_out_without_registration() {
    let modem = ScriptModem::default();
    let (mut e, _stream, _lines, _timer) = engine(modem.clone(), &cellular());

    assert_eq!(e.attach(), Err(ModemError::AttachTimeout));
    assert_eq!(e.state(), ConnectionState::Disconnected);
    assert_eq!(modem.calls(), vec!["at 5000", "wait 45000"]);
}

#[test]
fn wifi_resends_credentials_when_not_associated() {
    let modem = ScriptModem::default();
    let (mut e, _stream, _lines, _timer) = engine(modem.clone(), &wifi());

    assert_eq!(e.attach(), Ok(()));
    assert_eq!(modem.calls(), vec!["at 5000", "wait 2000", "wifi FieldNet secret123", "wait 30000"]);
}

#[test]
fn wifi_already_associated_skips_credentials() {
    let modem = ScriptModem::default();
    modem.state.borrow_mut().already_joined = true;
    let (mut e, _stream, _lines, _timer) = engine(modem.clone(), &wifi());

    assert_eq!(e.attach(), Ok(()));
    assert_eq!(modem.calls(), vec!["at 5000", "wait 2000"]);
}

#[test]
fn silent_modem_is_not_responding() {
    let modem = ScriptModem::default();
    modem.state.borrow_mut().at_ok = false;
    let (mut e, _stream, _lines, _timer) = engine(modem, &cellular());

    assert_eq!(e.attach(), Err(ModemError::NotResponding));
    assert!(!e.is_attached());
}

#[test]
fn status_line_that_never_rises_is_a_power_failure() {
    let timer = ManualTimer::new();
    let status = SimPin::new(false);
    let power = Power::new(PowerScheme::Pulsed, timer.clone())
        .with_control(SimPin::default())
        .with_status(status);
    let mut config = cellular();
    config.power_scheme = PowerScheme::Pulsed;
    let mut e = ConnectivityEngine::new(ScriptModem::default(), ScriptStream::default(), power, timer.clone(), &config);

    assert_eq!(e.attach(), Err(ModemError::PowerFailure));
    // 2 s pulse plus the 5 s settle bound.
    assert!(timer.millis() >= 7_000);
}

#[test]
fn power_off_drops_attach_and_drains_residue() {
    let modem = ScriptModem::default();
    modem.state.borrow_mut().already_joined = true;
    let (mut e, stream, lines, _timer) = engine(modem, &cellular());
    e.attach().unwrap();
    stream.state.borrow_mut().rx.extend(b"+CSQ: 15,0\r\nOK\r\n".iter().copied());

    assert!(e.power_off());
    assert_eq!(e.state(), ConnectionState::Disconnected);
    assert!(stream.state.borrow().rx.is_empty());
    assert!(!lines.vcc.level());
}

#[test]
fn signal_is_normalised_per_format() {
    let modem = ScriptModem::default();
    modem.state.borrow_mut().signal_raw = -70;
    let (mut e, _stream, _lines, _timer) = engine(modem.clone(), &wifi());
    let q = e.signal_quality();
    assert_eq!((q.rssi, q.percent), (-70, 69));

    modem.state.borrow_mut().signal_raw = 15;
    let (mut e, _stream, _lines, _timer) = engine(modem, &cellular());
    let q = e.signal_quality();
    assert_eq!((q.rssi, q.percent), (83, 48));
}

// ── Time sync ─────────────────────────────────────────────────

fn attached(config: &ModemConfig) -> (Engine<ScriptModem>, ScriptStream, ManualTimer) {
    let modem = ScriptModem::default();
    modem.state.borrow_mut().already_joined = true;
    let (mut e, stream, _lines, timer) = engine(modem, config);
    e.attach().unwrap();
    (e, stream, timer)
}

#[test]
fn sync_time_reads_four_bytes_from_time_service() {
    let (mut e, stream, _timer) = attached(&cellular());
    stream.state.borrow_mut().on_connect = nist(MIN_PLAUSIBLE);

    assert_eq!(e.sync_time(), 1_483_228_800);
    let s = stream.state.borrow();
    assert_eq!(s.connects, vec!["time.nist.gov:37"]);
    assert!(s.written.is_empty());
    assert!(!s.connected);
}

#[test]
fn sync_time_rejects_implausible_answers() {
    let (mut e, stream, _timer) = attached(&cellular());
    stream.state.borrow_mut().on_connect = nist(MIN_PLAUSIBLE - 1);
    assert_eq!(e.sync_time(), 0);
    assert_eq!(e.try_sync_time(), Err(Error::Sync(SyncError::OutOfRange)));
}

#[test]
fn sync_time_gives_up_after_five_seconds() {
    let (mut e, stream, timer) = attached(&cellular());
    stream.state.borrow_mut().on_connect = vec![0x12, 0x34];
    let before = timer.millis();

    assert_eq!(e.try_sync_time(), Err(Error::Sync(SyncError::NoResponse)));
    assert!(timer.millis() - before >= 5_000);
}

#[test]
fn sync_time_needs_an_attach() {
    let modem = ScriptModem::default();
    let (mut e, stream, _lines, _timer) = engine(modem, &cellular());
    assert_eq!(e.sync_time(), 0);
    assert!(stream.state.borrow().connects.is_empty());
}

// ── Upload over the engine ────────────────────────────────────

fn client() -> UploadClient {
    UploadClient::new(&UploadConfig { registration_token: "tok".into(), ..UploadConfig::default() })
}

#[test]
fn post_returns_status_from_response_prefix() {
    let (mut e, stream, _timer) = attached(&cellular());
    stream.state.borrow_mut().on_write = b"HTTP/1.1 201 CREATED\r\n\r\n".to_vec();

    assert_eq!(client().post(&mut e, "{}"), 201);
    let s = stream.state.borrow();
    assert_eq!(s.connects, vec!["data.envirodiy.org:80"]);
    assert!(String::from_utf8_lossy(&s.written).starts_with("POST /api/data-stream/ HTTP/1.1\r\n"));
    assert_eq!(s.stops, 1);
}

#[test]
fn post_discards_stale_bytes_before_sending() {
    let (mut e, stream, _timer) = attached(&cellular());
    {
        let mut s = stream.state.borrow_mut();
        s.on_connect = b"garbage".to_vec();
        s.on_write = b"HTTP/1.1 202 Accepted".to_vec();
    }
    assert_eq!(client().post(&mut e, "{}"), 202);
}

#[test]
fn short_answer_within_ten_seconds_is_504() {
    let (mut e, stream, timer) = attached(&cellular());
    stream.state.borrow_mut().on_write = b"HTTP/1".to_vec();
    let before = timer.millis();

    assert_eq!(client().post(&mut e, "{}"), 504);
    assert!(timer.millis() - before >= 10_000);
    // One request, no retry.
    assert_eq!(stream.state.borrow().connects.len(), 1);
}

#[test]
fn refused_socket_is_status_zero() {
    let (mut e, stream, _timer) = attached(&cellular());
    stream.state.borrow_mut().connect_ok = false;
    assert_eq!(client().post(&mut e, "{}"), 0);
}

#[test]
fn broken_send_drops_the_link() {
    let (mut e, stream, _timer) = attached(&cellular());
    stream.state.borrow_mut().write_limit = Some(16);

    assert_eq!(client().post(&mut e, "{\"a\": 1}"), 504);
    assert_eq!(e.state(), ConnectionState::Disconnected);
    assert_eq!(stream.state.borrow().written.len(), 16);
    assert!(!stream.state.borrow().connected);
}

// ── On-chip WiFi adapter through the engine ───────────────────

#[test]
fn wifi_modem_attaches_with_credentials() {
    let mut config = wifi();
    config.power_scheme = PowerScheme::AlwaysOn;
    let timer = ManualTimer::new();
    let power = Power::new(PowerScheme::AlwaysOn, timer.clone());
    let mut e = ConnectivityEngine::new(WifiModem::new(), ScriptStream::default(), power, timer, &config);

    assert_eq!(Connectivity::attach(&mut e), Ok(()));
    let q = Connectivity::signal_quality(&mut e);
    assert!(q.rssi < 0);
    assert!(q.percent > 0);
    Connectivity::detach(&mut e);
    assert!(!e.is_attached());
}
