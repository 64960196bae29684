use std::time::Duration;

use sipf_client::{ClientError, Credentials, FileTransfer, ObjectClient};
use sipf_frame::LineHandler;
use sipf_transport::ByteChannel;
use sipf_xmodem::XmodemConfig;
use tracing::{debug, info, warn};

use crate::dispatcher::CommandKind;
use crate::error::{CmdError, Result};
use crate::fota::{FirmwareUpdater, NoFirmwareUpdate};
use crate::gnss::{GnssReceiver, NoGnss};
use crate::registers::{AuthMode, RegisterStore};
use crate::response::NG;

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Block transfer timing used by FPUT and FGET.
    pub xmodem: XmodemConfig,
    /// Pause before and after a block transfer so the host can switch modes.
    /// Default: 10 ms.
    pub transfer_settle: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            xmodem: XmodemConfig::default(),
            transfer_settle: Duration::from_millis(10),
        }
    }
}

/// State of one command session on a UART.
///
/// Owns the byte channel and every collaborator the handlers call. The
/// `unlocked` flag gates `UPDATE`; any register or object command clears it.
pub struct CommandSession<C> {
    pub(crate) channel: C,
    pub(crate) registers: Box<dyn RegisterStore>,
    pub(crate) objects: Box<dyn ObjectClient>,
    pub(crate) files: Box<dyn FileTransfer>,
    pub(crate) gnss: Box<dyn GnssReceiver>,
    pub(crate) firmware: Box<dyn FirmwareUpdater>,
    pub(crate) unlocked: bool,
    pub(crate) config: SessionConfig,
    needs_reauth: bool,
    last_auth_mode: AuthMode,
}

impl<C: ByteChannel> CommandSession<C> {
    pub fn new(
        channel: C,
        registers: impl RegisterStore + 'static,
        objects: impl ObjectClient + 'static,
        files: impl FileTransfer + 'static,
    ) -> Self {
        let last_auth_mode = registers.auth_mode();
        Self {
            channel,
            registers: Box::new(registers),
            objects: Box::new(objects),
            files: Box::new(files),
            gnss: Box::new(NoGnss),
            firmware: Box::new(NoFirmwareUpdate),
            unlocked: false,
            config: SessionConfig::default(),
            needs_reauth: false,
            last_auth_mode,
        }
    }

    pub fn with_gnss(mut self, gnss: impl GnssReceiver + 'static) -> Self {
        self.gnss = Box::new(gnss);
        self
    }

    pub fn with_firmware(mut self, firmware: impl FirmwareUpdater + 'static) -> Self {
        self.firmware = Box::new(firmware);
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn into_channel(self) -> C {
        self.channel
    }

    pub fn registers(&self) -> &dyn RegisterStore {
        self.registers.as_ref()
    }

    pub fn registers_mut(&mut self) -> &mut dyn RegisterStore {
        self.registers.as_mut()
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// True after the backend answered Unauthorized and no new session key
    /// has been obtained yet.
    pub fn needs_reauth(&self) -> bool {
        self.needs_reauth
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run one command line and return the response text.
    pub fn dispatch(&mut self, line: &[u8]) -> Vec<u8> {
        let Some((kind, rest)) = CommandKind::lookup(line) else {
            debug!(line = %String::from_utf8_lossy(line), "unknown command");
            return NG.to_vec();
        };
        debug!(command = %kind, "dispatch");

        let result = match kind {
            CommandKind::WriteRegister => self.cmd_write_register(rest),
            CommandKind::ReadRegister => self.cmd_read_register(rest),
            CommandKind::TxRaw => self.cmd_tx_raw(rest),
            CommandKind::Tx => self.cmd_tx(rest),
            CommandKind::Rx => self.cmd_rx(rest),
            CommandKind::FilePut => self.cmd_file_put(rest),
            CommandKind::FileGet => self.cmd_file_get(rest),
            CommandKind::Unlock => self.cmd_unlock(rest),
            CommandKind::Update => self.cmd_update(rest),
            CommandKind::GnssEnable => self.cmd_gnss_enable(rest),
            CommandKind::GnssLocation => self.cmd_gnss_location(rest),
            CommandKind::GnssNmea => self.cmd_gnss_nmea(rest),
            CommandKind::GnssStatus => self.cmd_gnss_status(rest),
        };

        match result {
            Ok(response) => response,
            Err(err) => {
                warn!(command = %kind, error = %err, "command failed");
                if let CmdError::Client(client_err) = &err {
                    self.note_client_error(client_err);
                }
                err.response().to_vec()
            }
        }
    }

    /// Push register credentials to the backend clients in password mode.
    /// Session-key credentials stay in place until the next key request.
    pub(crate) fn refresh_credentials(&mut self) {
        if self.registers.auth_mode() == AuthMode::Password {
            let credentials = self.registers.credentials();
            self.install_credentials(credentials);
        }
    }

    pub(crate) fn note_client_error(&mut self, err: &ClientError) {
        if matches!(err, ClientError::Unauthorized) {
            warn!("backend rejected credentials");
            self.needs_reauth = true;
        }
    }

    fn install_credentials(&mut self, credentials: Option<Credentials>) {
        self.objects.set_credentials(credentials.clone());
        self.files.set_credentials(credentials);
    }

    /// Watch the auth-mode register. Entering session-key mode, or an
    /// Unauthorized answer while in it, requests a new session key; a failed
    /// request puts the register back to password mode.
    pub fn poll_auth(&mut self) {
        let mode = self.registers.auth_mode();
        let entered = mode == AuthMode::SessionKey && self.last_auth_mode != AuthMode::SessionKey;

        if entered || (mode == AuthMode::SessionKey && self.needs_reauth) {
            match self.objects.request_session_key() {
                Ok(credentials) => {
                    info!(user = credentials.user(), "session key installed");
                    self.install_credentials(Some(credentials));
                }
                Err(err) => {
                    warn!(error = %err, "session key request failed; reverting to password mode");
                    if let Err(err) = self.registers.set_auth_mode(AuthMode::Password) {
                        warn!(error = %err, "could not reset auth mode");
                    }
                }
            }
            self.needs_reauth = false;
        }

        self.last_auth_mode = self.registers.auth_mode();
    }
}

impl<C: ByteChannel> LineHandler for CommandSession<C> {
    fn handle_line(&mut self, line: &[u8]) -> Vec<u8> {
        self.dispatch(line)
    }
}
