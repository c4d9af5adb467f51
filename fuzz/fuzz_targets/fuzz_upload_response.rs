//! Fuzz target: `UploadClient::post` response handling
//!
//! Replays arbitrary collector answers through a scripted link.  The
//! client must never panic, must close the socket exactly once, and must
//! report 504 whenever fewer than 12 bytes came back.
//!
//! cargo fuzz run fuzz_upload_response

#![no_main]

use std::collections::VecDeque;

use fieldlogger::config::UploadConfig;
use fieldlogger::error::ModemError;
use fieldlogger::modem::NetworkLink;
use fieldlogger::upload::{RESPONSE_PREFIX_LEN, STATUS_TIMEOUT, UploadClient};
use libfuzzer_sys::fuzz_target;

struct Replay {
    answer: Vec<u8>,
    rx: VecDeque<u8>,
    stops: usize,
}

impl NetworkLink for Replay {
    fn connect(&mut self, _host: &str, _port: u16) -> Result<(), ModemError> {
        Ok(())
    }

    fn send(&mut self, _data: &[u8]) -> Result<(), ModemError> {
        self.rx.extend(self.answer.iter().copied());
        Ok(())
    }

    fn available(&mut self) -> usize {
        self.rx.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ModemError> {
        let n = buf.len().min(self.rx.len());
        for (slot, b) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = b;
        }
        Ok(n)
    }

    fn wait_available(&mut self, n: usize, _timeout_ms: u32) -> bool {
        self.rx.len() >= n
    }

    fn stop(&mut self) {
        self.stops += 1;
    }

    fn dump(&mut self) -> usize {
        let n = self.rx.len();
        self.rx.clear();
        n
    }
}

fuzz_target!(|data: &[u8]| {
    let client = UploadClient::new(&UploadConfig::default());
    let mut link = Replay { answer: data.to_vec(), rx: VecDeque::new(), stops: 0 };

    let status = client.post(&mut link, "{}");

    assert_eq!(link.stops, 1);
    if data.len() < RESPONSE_PREFIX_LEN {
        assert_eq!(status, STATUS_TIMEOUT);
    }
});
