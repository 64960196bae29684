use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::SerialStream;

/// Unix socket endpoint standing in for a physical UART.
///
/// Lets a host-side simulator (or a test) play the MCU: it connects to the
/// socket and exchanges the same byte stream the gateway would see on a
/// serial line.
pub struct SerialListener {
    listener: UnixListener,
    path: PathBuf,
    created_inode: (u64, u64),
}

impl SerialListener {
    /// Default permission mode for created socket paths.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;
    /// `sockaddr_un.sun_path` is 108 bytes on Linux, 104 elsewhere.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// Bind the socket, replacing a stale socket file at `path`.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        Self::bind_with_mode(path, Self::DEFAULT_SOCKET_MODE)
    }

    /// Bind the socket with an explicit permission mode.
    pub fn bind_with_mode(path: impl AsRef<Path>, mode: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let len = path.as_os_str().len();
        if len >= Self::MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path,
                len,
                max: Self::MAX_PATH_LEN,
            });
        }

        let bind_err = |source: std::io::Error| TransportError::Bind {
            path: path.clone(),
            source,
        };

        if let Ok(metadata) = std::fs::symlink_metadata(&path) {
            if !metadata.file_type().is_socket() {
                return Err(bind_err(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "existing path is not a unix socket",
                )));
            }
            debug!(?path, "removing stale socket");
            std::fs::remove_file(&path).map_err(bind_err)?;
        }

        let listener = UnixListener::bind(&path).map_err(bind_err)?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).map_err(bind_err)?;
        let created = std::fs::symlink_metadata(&path).map_err(bind_err)?;

        info!(?path, "simulated uart listening");

        Ok(Self {
            created_inode: (created.dev(), created.ino()),
            listener,
            path,
        })
    }

    /// Wait for the MCU side to connect (blocking).
    pub fn accept(&self) -> Result<SerialStream> {
        let (stream, _addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(path = ?self.path, "uart peer connected");
        Ok(SerialStream::from_unix(stream))
    }

    /// Connect to a listening simulated UART (blocking).
    pub fn connect(path: impl AsRef<Path>) -> Result<SerialStream> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|source| TransportError::Connect {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(SerialStream::from_unix(stream))
    }

    /// The path this socket is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SerialListener {
    fn drop(&mut self) {
        let Ok(metadata) = std::fs::symlink_metadata(&self.path) else {
            return;
        };
        let (dev, ino) = self.created_inode;
        if metadata.file_type().is_socket() && metadata.dev() == dev && metadata.ino() == ino {
            debug!(path = ?self.path, "cleaning up socket file");
            let _ = std::fs::remove_file(&self.path);
        } else {
            debug!(path = ?self.path, "socket path replaced; skipping cleanup");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sipf-uds-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn accept_and_exchange_bytes() {
        let dir = temp_dir("accept");
        let sock_path = dir.join("uart.sock");

        let listener = SerialListener::bind(&sock_path).unwrap();
        let path_clone = sock_path.clone();
        let handle = std::thread::spawn(move || {
            let mut mcu = SerialListener::connect(&path_clone).unwrap();
            mcu.write_all(b"$R F0\r").unwrap();
        });

        let mut gateway = listener.accept().unwrap();
        let mut buf = [0u8; 6];
        gateway.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"$R F0\r");
        handle.join().unwrap();

        drop(listener);
        assert!(!sock_path.exists(), "socket file should be removed on drop");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rejects_overlong_path() {
        let long_path = "/tmp/".to_string() + &"u".repeat(200) + ".sock";
        let result = SerialListener::bind(&long_path);
        assert!(matches!(result, Err(TransportError::PathTooLong { .. })));
    }

    #[test]
    fn default_mode_is_owner_only() {
        let dir = temp_dir("perms");
        let sock_path = dir.join("uart.sock");

        let listener = SerialListener::bind(&sock_path).unwrap();
        let mode = std::fs::metadata(&sock_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);

        drop(listener);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn refuses_to_replace_regular_file() {
        let dir = temp_dir("file");
        let sock_path = dir.join("uart.sock");
        std::fs::write(&sock_path, b"not a socket").unwrap();

        let result = SerialListener::bind(&sock_path);
        assert!(matches!(result, Err(TransportError::Bind { .. })));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
