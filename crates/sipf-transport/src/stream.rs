use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{Result, TransportError};

/// A connected serial link: a character device or a simulated UART socket.
pub struct SerialStream {
    inner: SerialStreamInner,
}

enum SerialStreamInner {
    Device(File),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for SerialStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            SerialStreamInner::Device(file) => file.read(buf),
            #[cfg(unix)]
            SerialStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for SerialStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            SerialStreamInner::Device(file) => file.write(buf),
            #[cfg(unix)]
            SerialStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            SerialStreamInner::Device(file) => file.flush(),
            #[cfg(unix)]
            SerialStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl SerialStream {
    /// Open a serial character device for reading and writing.
    ///
    /// Terminals are switched to raw mode so control bytes (XMODEM SOH, EOT,
    /// CAN, backspace) pass through untouched.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| TransportError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        #[cfg(unix)]
        make_raw(&file).map_err(|source| TransportError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(?path, "serial device opened");
        Ok(Self {
            inner: SerialStreamInner::Device(file),
        })
    }

    /// Wrap a connected Unix stream (simulated UART).
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: SerialStreamInner::Unix(stream),
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    ///
    /// The relay needs separate read and write halves.
    pub fn try_clone(&self) -> Result<Self> {
        let inner = match &self.inner {
            SerialStreamInner::Device(file) => SerialStreamInner::Device(file.try_clone()?),
            #[cfg(unix)]
            SerialStreamInner::Unix(stream) => SerialStreamInner::Unix(stream.try_clone()?),
        };
        Ok(Self { inner })
    }

    /// Short name of the link type for diagnostics.
    pub fn kind(&self) -> &'static str {
        match &self.inner {
            SerialStreamInner::Device(_) => "device",
            #[cfg(unix)]
            SerialStreamInner::Unix(_) => "unix",
        }
    }
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("type", &self.kind())
            .finish()
    }
}

/// Put a terminal into raw mode. Non-terminals (pipes, fifos) are left alone.
#[cfg(unix)]
fn make_raw(file: &File) -> std::io::Result<()> {
    use std::os::fd::AsRawFd;

    let fd = file.as_raw_fd();

    // SAFETY: `fd` is an open descriptor owned by `file` for the duration of this call.
    if unsafe { libc::isatty(fd) } != 1 {
        return Ok(());
    }

    // SAFETY: `termios` is plain data; it is fully initialized by `tcgetattr`
    // before being read, and `fd` refers to an open terminal.
    unsafe {
        let mut termios: libc::termios = std::mem::zeroed();
        if libc::tcgetattr(fd, &mut termios) != 0 {
            return Err(std::io::Error::last_os_error());
        }
        libc::cfmakeraw(&mut termios);
        if libc::tcsetattr(fd, libc::TCSANOW, &termios) != 0 {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(())
}
