//! Upload client: one JSON record per tick, POSTed to the data portal.
//!
//! ```text
//! POST /api/data-stream/ HTTP/1.1
//! Host: data.envirodiy.org
//! TOKEN: <registration token>
//! Content-Length: <n>
//! Content-Type: application/json
//!
//! {"sampling_feature": "<uuid>", "timestamp": "<iso8601>", "<var-uuid>": <value>, ... }
//! ```
//!
//! Only the first 12 bytes of the response are read (`HTTP/1.1 201`); the
//! connection is closed right after to save airtime.

use log::{info, warn};

use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::modem::NetworkLink;
use crate::sensors::SensorReading;

/// Wait for the status line for at most this long.
pub const RESPONSE_TIMEOUT_MS: u32 = 10_000;
/// Bytes of response needed to see the status code.
pub const RESPONSE_PREFIX_LEN: usize = 12;
/// Reported when fewer than [`RESPONSE_PREFIX_LEN`] bytes arrived.
pub const STATUS_TIMEOUT: u16 = 504;
/// Reported when no connection could be opened.
pub const STATUS_NO_CONNECTION: u16 = 0;

/// Outcome of one POST, derived from the status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Accepted(u16),
    Failed(UploadError),
}

impl UploadStatus {
    pub fn from_code(code: u16) -> Self {
        match code {
            200..=299 => Self::Accepted(code),
            STATUS_TIMEOUT => Self::Failed(UploadError::Timeout),
            STATUS_NO_CONNECTION => Self::Failed(UploadError::Unreachable),
            other => Self::Failed(UploadError::Rejected(other)),
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

pub struct UploadClient {
    host: String,
    port: u16,
    path: String,
    token: String,
}

impl UploadClient {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            path: config.path.clone(),
            token: config.registration_token.clone(),
        }
    }

    /// JSON body.  Values are written raw, exactly as logged.  Readings
    /// without a UUID are left out.
    pub fn build_payload(
        sampling_feature: &str,
        timestamp: &str,
        uuids: &[String],
        readings: &[SensorReading],
    ) -> String {
        let mut body = format!("{{\"sampling_feature\": \"{sampling_feature}\", \"timestamp\": \"{timestamp}\"");
        for (uuid, r) in uuids.iter().zip(readings).filter(|(u, _)| !u.is_empty()) {
            body.push_str(", \"");
            body.push_str(uuid);
            body.push_str("\": ");
            body.push_str(&r.formatted);
        }
        body.push_str(" }");
        body
    }

    /// Request head plus body.
    pub fn request(&self, payload: &str) -> String {
        format!(
            "POST {} HTTP/1.1\r\nHost: {}\r\nTOKEN: {}\r\nContent-Length: {}\r\nContent-Type: application/json\r\n\r\n{}",
            self.path,
            self.host,
            self.token,
            payload.len(),
            payload
        )
    }

    /// POST `payload` and return the HTTP status: 0 if no connection could
    /// be made, 504 if the status line did not arrive in time.  No retry.
    pub fn post<L: NetworkLink>(&self, link: &mut L, payload: &str) -> u16 {
        if link.connect(&self.host, self.port).is_err() {
            warn!("Upload: unable to connect to {}:{}", self.host, self.port);
            return STATUS_NO_CONNECTION;
        }
        link.dump();

        if let Err(e) = link.send(self.request(payload).as_bytes()) {
            warn!("Upload: {e}");
            link.stop();
            return STATUS_TIMEOUT;
        }

        let mut head = [0u8; RESPONSE_PREFIX_LEN];
        let got = if link.wait_available(RESPONSE_PREFIX_LEN, RESPONSE_TIMEOUT_MS) {
            read_full(link, &mut head)
        } else {
            0
        };
        link.stop();

        let code = if got < RESPONSE_PREFIX_LEN {
            STATUS_TIMEOUT
        } else {
            parse_status(&head)
        };
        info!("Upload: response code {}", code);
        code
    }
}

fn read_full<L: NetworkLink>(link: &mut L, buf: &mut [u8]) -> usize {
    let mut got = 0;
    while got < buf.len() {
        match link.read(&mut buf[got..]) {
            Ok(0) | Err(_) => break,
            Ok(n) => got += n,
        }
    }
    got
}

/// Status code from bytes 9..12 of `HTTP/1.1 NNN`.  Unparsable → 0.
pub fn parse_status(head: &[u8]) -> u16 {
    head.get(9..12)
        .and_then(|digits| core::str::from_utf8(digits).ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(STATUS_NO_CONNECTION)
}
