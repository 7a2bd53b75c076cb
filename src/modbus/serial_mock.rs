//! Mock serial port implementation for testing
//!
//! [`MockSerialPort`] stands in for the console UART: queue AT lines on the
//! receive side, run a session, then inspect what was written back. Once the
//! receive queue drains, reads report end-of-stream. [`MockModbusLink`] records
//! baud-rate switches on the Modbus side.

use super::{ModbusError, ModbusLink};
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock serial port that simulates bidirectional communication
#[derive(Clone, Default)]
pub struct MockSerialPort {
    /// Data written to the port (outgoing)
    pub tx_buffer: Arc<Mutex<Vec<u8>>>,
    /// Data to be read from the port (incoming)
    pub rx_buffer: Arc<Mutex<VecDeque<u8>>>,
    /// Simulated errors
    pub next_error: Arc<Mutex<Option<io::Error>>>,
}

impl MockSerialPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue data to be read from the port
    pub fn queue_rx_data(&self, data: &[u8]) {
        lock(&self.rx_buffer).extend(data);
    }

    /// Queue one text line, terminated with CR LF as a terminal sends it
    pub fn queue_line(&self, line: &str) {
        let mut rx = lock(&self.rx_buffer);
        rx.extend(line.as_bytes());
        rx.extend(b"\r\n");
    }

    /// Get data that was written to the port
    pub fn get_tx_data(&self) -> Vec<u8> {
        lock(&self.tx_buffer).clone()
    }

    /// Written data split into lines, terminators removed
    pub fn tx_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.get_tx_data())
            .lines()
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect()
    }

    /// Clear all buffers
    pub fn clear(&self) {
        lock(&self.tx_buffer).clear();
        lock(&self.rx_buffer).clear();
    }

    /// Set an error to be returned on the next operation
    pub fn set_next_error(&self, error: io::Error) {
        *lock(&self.next_error) = Some(error);
    }
}

impl AsyncRead for MockSerialPort {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if let Some(error) = lock(&self.next_error).take() {
            return Poll::Ready(Err(error));
        }

        let mut rx = lock(&self.rx_buffer);
        let available = rx.len().min(buf.remaining());
        if available > 0 {
            let data: Vec<u8> = rx.drain(..available).collect();
            buf.put_slice(&data);
        }

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockSerialPort {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if let Some(error) = lock(&self.next_error).take() {
            return Poll::Ready(Err(error));
        }

        lock(&self.tx_buffer).extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Modbus link that records every baud switch and the last timing it was
/// given. Clones share state.
#[derive(Debug, Clone)]
pub struct MockModbusLink {
    baud: Arc<Mutex<u32>>,
    history: Arc<Mutex<Vec<u32>>>,
    timing: Arc<Mutex<Option<(Duration, Duration)>>>,
    fail: Arc<Mutex<bool>>,
}

impl MockModbusLink {
    pub fn new(baud: u32) -> Self {
        Self {
            baud: Arc::new(Mutex::new(baud)),
            history: Arc::new(Mutex::new(Vec::new())),
            timing: Arc::new(Mutex::new(None)),
            fail: Arc::new(Mutex::new(false)),
        }
    }

    /// Every rate passed to `set_baud_rate`, successful or not
    pub fn history(&self) -> Vec<u32> {
        lock(&self.history).clone()
    }

    /// Last `(timeout, inter_frame_delay)` passed to `set_timing`
    pub fn timing(&self) -> Option<(Duration, Duration)> {
        *lock(&self.timing)
    }

    pub fn set_failing(&self, fail: bool) {
        *lock(&self.fail) = fail;
    }
}

impl ModbusLink for MockModbusLink {
    fn baud_rate(&self) -> u32 {
        *lock(&self.baud)
    }

    fn set_baud_rate(&mut self, baud: u32) -> Result<(), ModbusError> {
        lock(&self.history).push(baud);
        if *lock(&self.fail) {
            return Err(ModbusError::SerialPort("mock failure".to_string()));
        }
        *lock(&self.baud) = baud;
        Ok(())
    }

    fn set_timing(
        &mut self,
        timeout: Duration,
        inter_frame_delay: Duration,
    ) -> Result<(), ModbusError> {
        *lock(&self.timing) = Some((timeout, inter_frame_delay));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    #[test]
    fn test_mock_serial_port_creation() {
        let port = MockSerialPort::new();
        assert_eq!(port.get_tx_data().len(), 0);
    }

    #[test]
    fn test_queue_line_appends_crlf() {
        let port = MockSerialPort::new();
        port.queue_line("AT+");
        let rx = port.rx_buffer.lock().unwrap();
        assert_eq!(rx.iter().copied().collect::<Vec<u8>>(), b"AT+\r\n".to_vec());
    }

    #[tokio::test]
    async fn test_read_lines_then_eof() {
        let port = MockSerialPort::new();
        port.queue_line("AT+VERSION");
        port.queue_line("AT+STATUS");
        let mut lines = BufReader::new(port.clone()).lines();
        let first = lines.next_line().await.unwrap().unwrap();
        let second = lines.next_line().await.unwrap().unwrap();
        assert_eq!(first.trim_end(), "AT+VERSION");
        assert_eq!(second.trim_end(), "AT+STATUS");
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_and_tx_lines() {
        let mut port = MockSerialPort::new();
        port.write_all(b"OK\r\nERROR: Invalid command\r\n").await.unwrap();
        assert_eq!(port.tx_lines(), vec!["OK", "ERROR: Invalid command"]);
    }

    #[tokio::test]
    async fn test_simulated_error() {
        let mut port = MockSerialPort::new();
        port.set_next_error(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(port.write_all(b"x").await.is_err());
        assert!(port.write_all(b"y").await.is_ok());
    }

    #[test]
    fn test_clear_buffers() {
        let port = MockSerialPort::new();
        port.queue_rx_data(&[1, 2, 3]);
        port.clear();
        assert_eq!(port.rx_buffer.lock().unwrap().len(), 0);
    }

    #[test]
    fn test_mock_modbus_link() {
        let mut link = MockModbusLink::new(9600);
        let observer = link.clone();
        link.set_baud_rate(19_200).unwrap();
        assert_eq!(observer.baud_rate(), 19_200);
        observer.set_failing(true);
        assert!(link.set_baud_rate(38_400).is_err());
        assert_eq!(link.baud_rate(), 19_200);
        assert_eq!(observer.history(), vec![19_200, 38_400]);
    }
}
