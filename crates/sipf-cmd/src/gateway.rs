use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use sipf_frame::CommandFramer;
use sipf_transport::{ByteChannel, Result, TransportError};
use tracing::{debug, info, trace};

use crate::registers::{REG_FW_TYPE, REG_VERSION_MAJOR, REG_VERSION_MINOR, REG_VERSION_RELEASE};
use crate::session::CommandSession;

/// Written after the banner once the gateway accepts commands.
pub const READY_LINE: &str = "+++ Ready +++\r\n";

/// Written when a reset request ends the loop.
pub const RESET_LINE: &str = "RESET_REQ_DETECT\r\n";

/// Control loop timing.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Wait for the first inbound byte of each iteration. Default: 10 ms.
    pub poll_interval: Duration,
    /// Period of the heartbeat log. Default: 500 ms.
    pub heartbeat_interval: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            heartbeat_interval: Duration::from_millis(500),
        }
    }
}

/// Single-threaded control loop: bytes in, framed commands dispatched,
/// responses out, housekeeping in between.
pub struct Gateway<C> {
    framer: CommandFramer,
    session: CommandSession<C>,
    config: GatewayConfig,
    next_heartbeat: Instant,
    heartbeats: u64,
}

impl<C: ByteChannel> Gateway<C> {
    pub fn new(session: CommandSession<C>, config: GatewayConfig) -> Self {
        Self {
            framer: CommandFramer::new(),
            session,
            next_heartbeat: Instant::now() + config.heartbeat_interval,
            config,
            heartbeats: 0,
        }
    }

    pub fn session(&self) -> &CommandSession<C> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut CommandSession<C> {
        &mut self.session
    }

    pub fn into_session(self) -> CommandSession<C> {
        self.session
    }

    /// `*** SIPF Client(Type<fw>) v.<major>.<minor>.<release> ***`
    pub fn banner(&self) -> String {
        let registers = self.session.registers();
        let read = |addr| registers.read(addr).unwrap_or(0);
        let release = u16::from_le_bytes([read(REG_VERSION_RELEASE), read(REG_VERSION_RELEASE + 1)]);
        format!(
            "*** SIPF Client(Type{:02x}) v.{}.{}.{} ***\r\n",
            read(REG_FW_TYPE),
            read(REG_VERSION_MAJOR),
            read(REG_VERSION_MINOR),
            release
        )
    }

    /// Write the banner and the ready line.
    pub fn announce(&mut self) -> Result<()> {
        let banner = self.banner();
        let channel = self.session.channel_mut();
        channel.put(banner.as_bytes())?;
        channel.put(READY_LINE.as_bytes())?;
        info!("gateway ready");
        Ok(())
    }

    /// One loop iteration. Returns the number of inbound bytes consumed.
    pub fn poll_once(&mut self) -> Result<usize> {
        let mut consumed = 0;
        let mut wait = self.config.poll_interval;
        loop {
            let byte = match self.session.channel_mut().get_byte(wait) {
                Ok(byte) => byte,
                Err(TransportError::Timeout(_)) => break,
                Err(err) => return Err(err),
            };
            consumed += 1;
            wait = Duration::ZERO;
            if let Some(response) = self.framer.push(byte, &mut self.session) {
                self.session.channel_mut().put(&response)?;
            }
        }

        self.housekeeping();
        Ok(consumed)
    }

    fn housekeeping(&mut self) {
        let now = Instant::now();
        if now >= self.next_heartbeat {
            self.heartbeats += 1;
            self.next_heartbeat = now + self.config.heartbeat_interval;
            trace!(beat = self.heartbeats, "heartbeat");
        }
        self.session.poll_auth();
    }

    /// Announce, then iterate until `reset` is raised or the channel closes.
    pub fn run(&mut self, reset: &AtomicBool) -> Result<()> {
        self.announce()?;
        loop {
            if reset.load(Ordering::SeqCst) {
                info!("reset requested");
                self.session.channel_mut().put(RESET_LINE.as_bytes())?;
                return Ok(());
            }
            match self.poll_once() {
                Ok(consumed) => {
                    if consumed > 0 {
                        debug!(consumed, "inbound bytes processed");
                    }
                }
                Err(TransportError::Closed) => {
                    info!("channel closed");
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }
    }
}
