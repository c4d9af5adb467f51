//! `ByteStream` over `std::net::TcpStream`.
//!
//! Works on ESP-IDF (lwIP sockets behind the on-chip WiFi) and on host.
//! `available()` peeks in non-blocking mode so the engine's bounded polls
//! never block on the socket.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;

use crate::modem::transport::ByteStream;

/// Per-address connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Largest count `available()` reports in one peek.
const PEEK_WINDOW: usize = 512;

#[derive(Default)]
pub struct TcpByteStream {
    stream: Option<TcpStream>,
}

impl TcpByteStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn socket(&mut self) -> io::Result<&mut TcpStream> {
        self.stream.as_mut().ok_or_else(|| io::Error::from(ErrorKind::NotConnected))
    }
}

impl ByteStream for TcpByteStream {
    type Error = io::Error;

    fn connect(&mut self, host: &str, port: u16) -> io::Result<()> {
        self.stop();
        let mut last = io::Error::from(ErrorKind::AddrNotAvailable);
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
                Ok(s) => {
                    s.set_nodelay(true)?;
                    debug!("Socket: connected to {}", addr);
                    self.stream = Some(s);
                    return Ok(());
                }
                Err(e) => last = e,
            }
        }
        Err(last)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.socket()?.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stream.as_mut() {
            Some(s) => s.flush(),
            None => Ok(()),
        }
    }

    fn available(&mut self) -> usize {
        let Some(s) = self.stream.as_mut() else {
            return 0;
        };
        let mut window = [0u8; PEEK_WINDOW];
        if s.set_nonblocking(true).is_err() {
            return 0;
        }
        let n = s.peek(&mut window).unwrap_or(0);
        // Restoring blocking mode only fails on a dead socket, which the
        // next read reports.
        let _ = s.set_nonblocking(false);
        n
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.available() == 0 {
            return Ok(0);
        }
        self.socket()?.read(buf)
    }

    fn stop(&mut self) {
        if let Some(s) = self.stream.take() {
            let _ = s.shutdown(std::net::Shutdown::Both);
            debug!("Socket: closed");
        }
    }
}
