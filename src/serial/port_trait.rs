//! Trait abstraction for serial port operations to enable testing

use async_trait::async_trait;
use std::io;

/// Trait for serial port I/O operations
#[async_trait]
pub trait SerialPortIO: Send {
    /// Read whatever bytes are available, waiting for at least one
    ///
    /// Returns 0 when the byte source has closed.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Discard bytes buffered by the driver but not yet read
    fn clear_input(&mut self) -> io::Result<()>;

    /// Close and reopen the underlying device
    fn reopen(&mut self) -> io::Result<()>;
}

/// Wrapper around tokio_serial::SerialStream that implements SerialPortIO
///
/// The stream is dropped before reopening so the exclusive lock on the
/// device is released.
pub struct TokioSerialPort {
    port: Option<tokio_serial::SerialStream>,
    path: String,
    baud_rate: u32,
}

impl TokioSerialPort {
    pub fn new(port: tokio_serial::SerialStream, path: &str, baud_rate: u32) -> Self {
        Self {
            port: Some(port),
            path: path.to_string(),
            baud_rate,
        }
    }

    fn stream(&mut self) -> io::Result<&mut tokio_serial::SerialStream> {
        self.port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "serial port is closed"))
    }
}

#[async_trait]
impl SerialPortIO for TokioSerialPort {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        use tokio::io::AsyncReadExt;
        self.stream()?.read(buf).await
    }

    fn clear_input(&mut self) -> io::Result<()> {
        use tokio_serial::SerialPort;
        self.stream()?.clear(tokio_serial::ClearBuffer::Input).map_err(io::Error::from)
    }

    fn reopen(&mut self) -> io::Result<()> {
        self.port = None;
        let port = super::open_port(&self.path, self.baud_rate)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        self.port = Some(port);
        Ok(())
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Mock serial port for testing
    ///
    /// Each queued chunk is returned by one `read` call. An empty queue
    /// behaves like a silent line: `read` never completes.
    #[derive(Clone, Default)]
    pub struct MockSerialPort {
        pub chunks: Arc<Mutex<VecDeque<io::Result<Vec<u8>>>>>,
        pub clear_count: Arc<Mutex<usize>>,
        pub reopen_count: Arc<Mutex<usize>>,
    }

    impl MockSerialPort {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_bytes(&self, bytes: &[u8]) {
            self.chunks.lock().unwrap().push_back(Ok(bytes.to_vec()));
        }

        pub fn push_error(&self, kind: io::ErrorKind) {
            self.chunks.lock().unwrap().push_back(Err(io::Error::new(kind, "Mock read error")));
        }

        /// A zero-length read: the byte source closed
        pub fn push_eof(&self) {
            self.chunks.lock().unwrap().push_back(Ok(Vec::new()));
        }

        pub fn clear_count(&self) -> usize {
            *self.clear_count.lock().unwrap()
        }

        pub fn reopen_count(&self) -> usize {
            *self.reopen_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl SerialPortIO for MockSerialPort {
        async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let next = self.chunks.lock().unwrap().pop_front();
            match next {
                Some(Ok(bytes)) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    if n < bytes.len() {
                        self.chunks.lock().unwrap().push_front(Ok(bytes[n..].to_vec()));
                    }
                    Ok(n)
                }
                Some(Err(e)) => Err(e),
                None => std::future::pending().await,
            }
        }

        fn clear_input(&mut self) -> io::Result<()> {
            *self.clear_count.lock().unwrap() += 1;
            Ok(())
        }

        fn reopen(&mut self) -> io::Result<()> {
            *self.reopen_count.lock().unwrap() += 1;
            Ok(())
        }
    }
}
