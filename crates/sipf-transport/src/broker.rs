use std::io::{ErrorKind, Read, Write};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender, TryRecvError};
use tracing::{debug, trace, warn};

use crate::channel::{ByteChannel, EchoFlag};
use crate::error::{Result, TransportError};

/// Default depth of each relay queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

const READ_CHUNK_SIZE: usize = 64;

/// Configuration for the UART relay.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Depth of the inbound and outbound queues. Default: 256.
    pub queue_capacity: usize,
    /// How long a write may wait for room in the outbound queue.
    pub write_timeout: Duration,
    /// Initial echo setting.
    pub echo: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            write_timeout: Duration::from_secs(1),
            echo: true,
        }
    }
}

/// Relays a serial stream through bounded queues.
///
/// The reader thread moves received bytes into the inbound queue, echoing
/// each one into the outbound queue while the echo flag is set. The writer
/// thread drains the outbound queue into the stream. When the inbound queue
/// is full the reader blocks, so bytes back up in the OS buffer instead of
/// being dropped.
pub struct UartBroker {
    inbound: Receiver<u8>,
    outbound: Sender<u8>,
    echo: EchoFlag,
    write_timeout: Duration,
}

impl UartBroker {
    /// Start the relay threads over separate read and write halves.
    pub fn spawn<R, W>(reader: R, writer: W, config: BrokerConfig) -> Result<Self>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let capacity = config.queue_capacity.max(1);
        let (inbound_tx, inbound_rx) = bounded(capacity);
        let (outbound_tx, outbound_rx) = bounded(capacity);
        let echo = EchoFlag::new(config.echo);

        let echo_tx = outbound_tx.clone();
        let relay_echo = echo.clone();
        thread::Builder::new()
            .name("uart-rx".into())
            .spawn(move || relay_inbound(reader, inbound_tx, echo_tx, relay_echo))?;

        thread::Builder::new()
            .name("uart-tx".into())
            .spawn(move || relay_outbound(writer, outbound_rx, capacity))?;

        debug!(capacity, echo = config.echo, "uart relay started");

        Ok(Self {
            inbound: inbound_rx,
            outbound: outbound_tx,
            echo,
            write_timeout: config.write_timeout,
        })
    }

    /// Handle to the shared echo flag.
    pub fn echo_flag(&self) -> EchoFlag {
        self.echo.clone()
    }

    /// Number of bytes waiting in the inbound queue.
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    /// Wait until the writer thread has taken every queued outbound byte.
    pub fn flush(&self, timeout: Duration) -> Result<()> {
        let deadline = std::time::Instant::now() + timeout;
        while !self.outbound.is_empty() {
            if std::time::Instant::now() >= deadline {
                return Err(TransportError::Timeout(timeout));
            }
            thread::sleep(Duration::from_millis(1));
        }
        Ok(())
    }
}

impl ByteChannel for UartBroker {
    fn get_byte(&mut self, timeout: Duration) -> Result<u8> {
        if timeout.is_zero() {
            return match self.inbound.try_recv() {
                Ok(byte) => Ok(byte),
                Err(TryRecvError::Empty) => Err(TransportError::Timeout(timeout)),
                Err(TryRecvError::Disconnected) => Err(TransportError::Closed),
            };
        }
        match self.inbound.recv_timeout(timeout) {
            Ok(byte) => Ok(byte),
            Err(RecvTimeoutError::Timeout) => Err(TransportError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::Closed),
        }
    }

    fn put_byte(&mut self, byte: u8) -> Result<()> {
        match self.outbound.send_timeout(byte, self.write_timeout) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => Err(TransportError::QueueFull),
            Err(SendTimeoutError::Disconnected(_)) => Err(TransportError::Closed),
        }
    }

    fn set_echo(&mut self, enabled: bool) {
        self.echo.set(enabled);
    }

    fn echo_enabled(&self) -> bool {
        self.echo.is_enabled()
    }

    fn clear_inbound(&mut self) {
        let mut dropped = 0usize;
        while self.inbound.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            trace!(dropped, "inbound queue cleared");
        }
    }
}

impl std::fmt::Debug for UartBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UartBroker")
            .field("pending", &self.inbound.len())
            .field("echo", &self.echo.is_enabled())
            .finish()
    }
}

fn relay_inbound<R: Read>(mut reader: R, inbound: Sender<u8>, echo_tx: Sender<u8>, echo: EchoFlag) {
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => {
                debug!("serial stream closed");
                return;
            }
            Ok(n) => n,
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut
                ) =>
            {
                continue
            }
            Err(err) => {
                warn!(error = %err, "serial read failed");
                return;
            }
        };

        for &byte in &chunk[..read] {
            if echo.is_enabled() && echo_tx.try_send(byte).is_err() {
                trace!(byte, "echo dropped");
            }
            if inbound.send(byte).is_err() {
                return;
            }
        }
    }
}

fn relay_outbound<W: Write>(mut writer: W, outbound: Receiver<u8>, capacity: usize) {
    let mut pending = Vec::with_capacity(capacity);
    while let Ok(byte) = outbound.recv() {
        pending.push(byte);
        while pending.len() < capacity {
            match outbound.try_recv() {
                Ok(byte) => pending.push(byte),
                Err(_) => break,
            }
        }
        if let Err(err) = writer.write_all(&pending).and_then(|()| writer.flush()) {
            warn!(error = %err, "serial write failed");
            return;
        }
        pending.clear();
    }
    debug!("uart writer stopped");
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn wait_for_output(sink: &SharedSink, len: usize) -> Vec<u8> {
        for _ in 0..200 {
            let out = sink.0.lock().unwrap().clone();
            if out.len() >= len {
                return out;
            }
            thread::sleep(Duration::from_millis(5));
        }
        sink.0.lock().unwrap().clone()
    }

    #[test]
    fn relays_inbound_bytes_in_order() {
        let sink = SharedSink::default();
        let config = BrokerConfig {
            echo: false,
            ..BrokerConfig::default()
        };
        let mut broker = UartBroker::spawn(Cursor::new(b"$R 00\r".to_vec()), sink, config).unwrap();

        let mut got = Vec::new();
        for _ in 0..6 {
            got.push(broker.get_byte(Duration::from_secs(1)).unwrap());
        }
        assert_eq!(got, b"$R 00\r");
    }

    #[test]
    fn echoes_received_bytes_when_enabled() {
        let sink = SharedSink::default();
        let mut broker =
            UartBroker::spawn(Cursor::new(b"abc".to_vec()), sink.clone(), BrokerConfig::default())
                .unwrap();

        for _ in 0..3 {
            broker.get_byte(Duration::from_secs(1)).unwrap();
        }
        assert_eq!(wait_for_output(&sink, 3), b"abc");
    }

    #[test]
    fn put_reaches_writer() {
        let sink = SharedSink::default();
        let mut broker =
            UartBroker::spawn(Cursor::new(Vec::new()), sink.clone(), BrokerConfig::default())
                .unwrap();

        broker.put(b"OK\r\n").unwrap();
        assert_eq!(wait_for_output(&sink, 4), b"OK\r\n");
    }

    #[test]
    fn flush_waits_for_outbound_queue() {
        let sink = SharedSink::default();
        let mut broker =
            UartBroker::spawn(Cursor::new(Vec::new()), sink.clone(), BrokerConfig::default())
                .unwrap();

        broker.put(b"RESET_REQ_DETECT\r\n").unwrap();
        broker.flush(Duration::from_secs(1)).unwrap();
        assert_eq!(wait_for_output(&sink, 18), b"RESET_REQ_DETECT\r\n");
    }

    #[test]
    fn closed_stream_reports_closed_after_drain() {
        let sink = SharedSink::default();
        let mut broker =
            UartBroker::spawn(Cursor::new(b"x".to_vec()), sink, BrokerConfig::default()).unwrap();

        assert_eq!(broker.get_byte(Duration::from_secs(1)).unwrap(), b'x');
        let err = broker.get_byte(Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }

    #[test]
    fn echo_flag_toggle_is_visible_to_relay() {
        let sink = SharedSink::default();
        let mut broker =
            UartBroker::spawn(Cursor::new(Vec::new()), sink, BrokerConfig::default()).unwrap();
        let flag = broker.echo_flag();

        broker.set_echo(false);
        assert!(!flag.is_enabled());
        assert!(!broker.echo_enabled());
    }
}
