use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgGroup, Args, Subcommand};
use sipf_client::config::{DEFAULT_AUTH_URL, DEFAULT_CONNECTOR_URL, DEFAULT_FILE_URL};
use sipf_client::{ClientConfig, HttpFileTransfer, ReqwestTransport, SipfClient};
use sipf_cmd::{BankedRegisters, CommandSession, RegisterStore};
use sipf_transport::ByteChannel;

use crate::exit::{client_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod exec;
pub mod run;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the gateway on a serial device or a simulated UART socket.
    Run(RunArgs),
    /// Dispatch a single command line and print the response.
    Exec(ExecArgs),
    /// Decode hex-encoded SIPF objects or an objects-down response.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args),
        Command::Exec(args) => exec::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Backend endpoints and the identity seeded into the registers.
#[derive(Args, Debug, Clone)]
pub struct BackendArgs {
    /// Objects up/down endpoint.
    #[arg(long, env = "SIPF_CONNECTOR_URL", default_value = DEFAULT_CONNECTOR_URL)]
    pub connector_url: String,
    /// Session-key endpoint.
    #[arg(long, env = "SIPF_AUTH_URL", default_value = DEFAULT_AUTH_URL)]
    pub auth_url: String,
    /// File URL endpoint; `{file_id}` is replaced with the file id.
    #[arg(long, env = "SIPF_FILE_URL", default_value = DEFAULT_FILE_URL)]
    pub file_url: String,
    /// User name written to the credential registers at startup.
    #[arg(long, env = "SIPF_USER")]
    pub user: Option<String>,
    /// Password written to the credential registers at startup.
    #[arg(long, env = "SIPF_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Timeout for backend requests (e.g. 3s, 500ms).
    #[arg(long, default_value = "3s")]
    pub timeout: String,
}

impl BackendArgs {
    pub fn client_config(&self) -> CliResult<ClientConfig> {
        if !self.file_url.contains("{file_id}") {
            return Err(CliError::new(
                USAGE,
                "file URL must contain a {file_id} placeholder",
            ));
        }
        Ok(ClientConfig {
            connector_url: self.connector_url.clone(),
            auth_url: self.auth_url.clone(),
            file_url: self.file_url.clone(),
            timeout: parse_duration(&self.timeout)?,
            ..ClientConfig::default()
        })
    }

    pub fn registers(&self) -> CliResult<BankedRegisters> {
        let mut registers = BankedRegisters::default();
        if let (Some(user), Some(password)) = (&self.user, &self.password) {
            registers
                .store_credentials(user, password)
                .map_err(|err| CliError::new(USAGE, format!("credentials rejected: {err}")))?;
        }
        Ok(registers)
    }

    /// Command session over `channel` wired to the HTTP backend.
    pub fn session<C: ByteChannel>(&self, channel: C) -> CliResult<CommandSession<C>> {
        let config = self.client_config()?;
        let transport = Arc::new(
            ReqwestTransport::new().map_err(|err| client_error("http client setup failed", err))?,
        );
        let objects = SipfClient::new(transport.clone(), config.clone());
        let files = HttpFileTransfer::new(transport, config);
        Ok(CommandSession::new(channel, self.registers()?, objects, files))
    }
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("link").required(true).args(["device", "listen"])))]
pub struct RunArgs {
    /// Serial device connected to the host MCU.
    #[arg(long, env = "SIPF_DEVICE", value_name = "PATH")]
    pub device: Option<PathBuf>,
    /// Unix socket to bind as a simulated UART.
    #[arg(long, env = "SIPF_LISTEN", value_name = "PATH")]
    pub listen: Option<PathBuf>,
    /// Heartbeat log interval (e.g. 500ms, 1s).
    #[arg(long, default_value = "500ms")]
    pub heartbeat: String,
    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Command line without the leading `$`, e.g. "R 00".
    pub line: String,
    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex-encoded bytes (whitespace is ignored).
    pub hex: String,
    /// Input is a full objects-down response frame.
    #[arg(long)]
    pub down: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
