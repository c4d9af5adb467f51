//! Byte-stream abstraction over the modem's TCP client.
//!
//! Concrete implementations:
//! - the modem's AT socket client (`AT+CIPSEND` and friends) on hardware
//! - `std::net::TcpStream` for host simulation ([`TcpByteStream`](crate::adapters::tcp_stream::TcpByteStream))
//!
//! The connectivity engine is generic over `ByteStream`, so the upload and
//! time-sync logic never see which one is underneath.

/// Client-side TCP channel.  One connection at a time.
pub trait ByteStream {
    /// Error type for this stream.
    type Error: core::fmt::Debug;

    /// Open a connection to `host:port`, closing any previous one.
    fn connect(&mut self, host: &str, port: u16) -> Result<(), Self::Error>;

    /// Write `data`.  Returns the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Bytes ready to read without blocking.
    fn available(&mut self) -> usize;

    /// Read up to `buf.len()` bytes.  Returns 0 if nothing is ready.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Close the connection.  Idempotent.
    fn stop(&mut self);
}
